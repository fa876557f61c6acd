pub mod lifecycle;
pub mod runtime;

pub use lifecycle::{Lifecycle, LifecycleState, ShutdownHandle, ShutdownSignal};
pub use runtime::RuntimeConfig;
