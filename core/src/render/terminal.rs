use super::rows::{Dashboard, DashboardRow, RoundFailure};
use super::Renderer;
use crate::risk::RiskStatus;
use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{queue, QueueableCommand};
use std::io::{self, Stdout, Write};

/// Full-screen dashboard drawn with ANSI escapes.
///
/// Each frame erases the screen and redraws from the top-left. Layout and
/// color are the only things decided here.
pub struct TerminalRenderer<W: Write = Stdout> {
  out: W,
}

impl TerminalRenderer<Stdout> {
  pub fn stdout() -> Self {
    Self { out: io::stdout() }
  }
}

impl<W: Write> TerminalRenderer<W> {
  pub fn new(out: W) -> Self {
    Self { out }
  }

  pub fn into_inner(self) -> W {
    self.out
  }

  fn clear(&mut self) -> io::Result<()> {
    queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))
  }

  fn line(&mut self, text: &str) -> io::Result<()> {
    queue!(self.out, Print(text), Print("\r\n"))
  }

  fn row(&mut self, row: &DashboardRow) -> io::Result<()> {
    self.out.queue(Print(format!("{:<24} ", row.address)))?;
    queue!(
      self.out,
      SetForegroundColor(status_color(row.status)),
      Print(format!("{:<32}", row.status_label)),
      ResetColor
    )?;
    self.line(&format!(
      " replay {:>17} id\u{394} {:>6} seg\u{394} {:>8}   receive {:>17} id\u{394} {:>6} seg\u{394} {:>8}   backlog {:>12}",
      row.replayed_position,
      short(&row.replay_segment_id_delta),
      short(&row.replay_segment_count_delta),
      row.received_position,
      short(&row.receive_segment_id_delta),
      short(&row.receive_segment_count_delta),
      row.backlog,
    ))?;
    if let Some(note) = &row.note {
      queue!(
        self.out,
        SetAttribute(Attribute::Dim),
        Print(format!("    {}\r\n", note)),
        SetAttribute(Attribute::Reset)
      )?;
    }
    Ok(())
  }
}

// The receive deltas repeat the "no streaming data" marker already shown in
// the position column.
fn short(value: &str) -> &str {
  if value == super::rows::NO_STREAMING {
    "-"
  } else {
    value
  }
}

fn status_color(status: RiskStatus) -> Color {
  match status {
    RiskStatus::StreamingPossible => Color::Green,
    RiskStatus::RecoveryFromArchiveRequired => Color::Red,
    RiskStatus::NotAReplica => Color::Yellow,
    RiskStatus::Unknown => Color::Magenta,
  }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
  fn render_round(&mut self, dashboard: &Dashboard) -> anyhow::Result<()> {
    let header = &dashboard.header;
    self.clear()?;
    queue!(self.out, SetAttribute(Attribute::Bold))?;
    self.line(&format!("walwatch  round {}  {}", header.round, header.taken_at))?;
    queue!(self.out, SetAttribute(Attribute::Reset))?;
    self.line(&format!(
      "primary {}  position {}  segment {}  retention {}",
      header.primary_address, header.primary_position, header.segment_size, header.retention
    ))?;
    self.line("")?;
    if dashboard.rows.is_empty() {
      self.line("no replicas configured")?;
    }
    for row in &dashboard.rows {
      self.row(row)?;
    }
    self.out.flush()?;
    Ok(())
  }

  fn render_failure(&mut self, failure: &RoundFailure) -> anyhow::Result<()> {
    self.clear()?;
    queue!(self.out, SetAttribute(Attribute::Bold))?;
    self.line(&format!("walwatch  round {}  {}", failure.round, failure.taken_at))?;
    queue!(
      self.out,
      SetAttribute(Attribute::Reset),
      SetForegroundColor(Color::Red),
      Print(format!("round failed [{}]: {}\r\n", failure.label, failure.message)),
      ResetColor
    )?;
    self.out.flush()?;
    Ok(())
  }
}
