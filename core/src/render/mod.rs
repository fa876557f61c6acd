pub mod rows;
pub mod terminal;

pub use rows::{format_bytes, Dashboard, DashboardRow, HeaderRow, RoundFailure, NO_STREAMING};
pub use terminal::TerminalRenderer;

/// Output side of the monitor. Implementations lay out and color what they
/// are given; they never recompute a number.
pub trait Renderer: Send {
  fn render_round(&mut self, dashboard: &Dashboard) -> anyhow::Result<()>;

  fn render_failure(&mut self, failure: &RoundFailure) -> anyhow::Result<()>;
}
