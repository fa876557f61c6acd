use clap::Parser;
use shared::config::{self, ObservabilityConfig, PrimaryFailurePolicy, WatchConfig};
use shared::node::{NodeId, Topology};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use walwatch_core::daemon::{Lifecycle, LifecycleState, RuntimeConfig, ShutdownHandle};
use walwatch_core::lag::AddressingScheme;
use walwatch_core::metrics::MetricsRegistry;
use walwatch_core::monitor::MonitorLoop;
use walwatch_core::poll::PollRound;
use walwatch_core::render::TerminalRenderer;
use walwatch_pgsql::connector::resolve_target;
use walwatch_pgsql::PgSnapshotSource;

#[derive(Parser)]
#[command(name = "walwatch", about = "Live replication lag dashboard for PostgreSQL")]
struct Cli {
  /// Primary connection string
  primary: Option<String>,

  /// Replica connection strings, shown in this order
  replicas: Vec<String>,

  /// Seconds between poll rounds
  #[arg(short, long)]
  interval: Option<u64>,

  /// Seconds to wait for a single node before marking it unreachable
  #[arg(long)]
  fetch_timeout: Option<u64>,

  /// What to do when the primary cannot be polled: fatal or skip_round
  #[arg(long)]
  on_primary_failure: Option<PrimaryFailurePolicy>,

  /// Write Prometheus text metrics to this file after every round
  #[arg(long)]
  metrics_textfile: Option<String>,

  /// Directory holding default.toml and per-environment overlays
  #[arg(long, env = "WALWATCH_CONFIG_DIR", default_value = "config")]
  config_dir: PathBuf,

  /// Environment overlay to load
  #[arg(long, env = "WALWATCH_ENV", default_value = "development")]
  env: String,
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let cfg = build_config(cli)?;
  init_logging(&cfg.observability)?;

  info!(
    replicas = cfg.nodes.replicas.len(),
    interval_secs = cfg.monitor.poll_interval_secs,
    "walwatch starting"
  );

  let runtime_cfg = RuntimeConfig::default();
  let rt = runtime_cfg.build_runtime()?;

  rt.block_on(async move { run_monitor(cfg).await })
}

/// Config files and environment first, command line on top.
fn build_config(cli: Cli) -> anyhow::Result<WatchConfig> {
  let mut cfg = config::load_config(&cli.config_dir, &cli.env)?;

  // Positional targets replace the configured set as a whole.
  if let Some(primary) = cli.primary {
    cfg.nodes.primary = Some(primary);
    cfg.nodes.replicas = cli.replicas;
  }
  if let Some(interval) = cli.interval {
    cfg.monitor.poll_interval_secs = interval;
  }
  if let Some(timeout) = cli.fetch_timeout {
    cfg.monitor.fetch_timeout_secs = timeout;
  }
  if let Some(policy) = cli.on_primary_failure {
    cfg.monitor.on_primary_failure = policy;
  }
  if cli.metrics_textfile.is_some() {
    cfg.observability.metrics_textfile = cli.metrics_textfile;
  }

  cfg.validate()?;
  Ok(cfg)
}

fn build_topology(cfg: &WatchConfig) -> anyhow::Result<Topology> {
  let primary_dsn = cfg.nodes.primary.as_deref().unwrap_or_default();
  let primary = resolve_target(NodeId::Primary, primary_dsn)?;
  let replicas = cfg
    .nodes
    .replicas
    .iter()
    .enumerate()
    .map(|(i, dsn)| resolve_target(NodeId::Replica(i), dsn))
    .collect::<Result<Vec<_>, _>>()?;
  Ok(Topology::new(primary, replicas))
}

async fn run_monitor(cfg: WatchConfig) -> anyhow::Result<()> {
  // Phase 1: Initialize
  let mut lifecycle = Lifecycle::new();

  let topology = build_topology(&cfg)?;
  for target in std::iter::once(topology.primary()).chain(topology.replicas()) {
    info!(node = %target.id, address = %target.address(), "node configured");
  }

  let source = PgSnapshotSource::new(&topology, &cfg.nodes.application_name);
  let round = PollRound::new(
    source,
    AddressingScheme::from_config(&cfg.monitor),
    Duration::from_secs(cfg.monitor.fetch_timeout_secs),
  );
  let metrics = MetricsRegistry::new()?;
  let mut monitor = MonitorLoop::new(
    round,
    topology,
    TerminalRenderer::stdout(),
    Duration::from_secs(cfg.monitor.poll_interval_secs),
  )
  .with_failure_policy(cfg.monitor.on_primary_failure)
  .with_metrics(
    metrics,
    cfg.observability.metrics_textfile.as_ref().map(PathBuf::from),
  );

  let (shutdown, signal) = ShutdownHandle::channel();
  tokio::spawn(async move {
    Lifecycle::wait_for_shutdown().await;
    shutdown.trigger();
  });

  // Phase 2: Running
  lifecycle.transition(LifecycleState::Running);
  let result = monitor.run(signal).await;

  // Phase 3: Shutdown
  lifecycle.transition(LifecycleState::ShuttingDown);
  println!();
  lifecycle.transition(LifecycleState::Stopped);

  let summary = result?;
  info!(
    completed = summary.rounds_completed,
    failed = summary.rounds_failed,
    "walwatch stopped"
  );
  Ok(())
}

/// Logs go to stderr or a file; stdout belongs to the dashboard.
fn init_logging(cfg: &ObservabilityConfig) -> anyhow::Result<()> {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

  match &cfg.log_file {
    Some(path) => {
      let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    }
  }
  Ok(())
}
