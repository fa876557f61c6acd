use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// Manages the process lifecycle: startup → polling → shutdown.
pub struct Lifecycle {
  state: LifecycleState,
}

/// Current lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  /// Loading config, resolving node targets.
  Initializing,
  /// Poll loop is running.
  Running,
  /// Cancellation requested; waiting for the loop to return.
  ShuttingDown,
  Stopped,
}

impl Default for Lifecycle {
  fn default() -> Self {
    Self::new()
  }
}

impl Lifecycle {
  pub fn new() -> Self {
    Self {
      state: LifecycleState::Initializing,
    }
  }

  /// Transition to the next state. Returns false, and logs nothing, when
  /// already in `new_state`.
  pub fn transition(&mut self, new_state: LifecycleState) -> bool {
    if self.state == new_state {
      return false;
    }
    info!(
        from = ?self.state,
        to = ?new_state,
        "lifecycle state transition"
    );
    self.state = new_state;
    true
  }

  /// Current state.
  pub fn state(&self) -> LifecycleState {
    self.state
  }

  /// Wait for a shutdown signal (SIGINT or SIGTERM).
  pub async fn wait_for_shutdown() {
    let ctrl_c = async {
      if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
      }
    };

    #[cfg(unix)]
    let terminate = async {
      match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
          sigterm.recv().await;
        }
        Err(e) => {
          warn!(error = %e, "failed to install SIGTERM handler");
          std::future::pending::<()>().await;
        }
      }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
  }
}

/// Cooperative cancellation shared between the signal handler and the
/// poll loop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
  tx: watch::Sender<bool>,
}

impl ShutdownHandle {
  pub fn channel() -> (Self, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (Self { tx }, ShutdownSignal { rx })
  }

  pub fn trigger(&self) {
    self.tx.send_replace(true);
  }
}

/// Receiving side of a [`ShutdownHandle`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
  rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
  pub fn is_triggered(&self) -> bool {
    *self.rx.borrow()
  }

  /// Resolves once shutdown has been requested. Also resolves if every
  /// handle was dropped, since nothing can cancel the loop after that and
  /// waiting forever would hang the caller.
  pub async fn triggered(&mut self) {
    while !*self.rx.borrow_and_update() {
      if self.rx.changed().await.is_err() {
        return;
      }
    }
  }
}
