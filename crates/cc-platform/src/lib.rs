//! Platform adapters: external process execution, the host-wide run lock and
//! service-account ownership changes.

pub mod lock;
pub mod ownership;
pub mod runner;

pub use lock::{HostLock, LockError};
pub use ownership::ServiceOwnership;
pub use runner::{RecordingCommandRunner, SystemCommandRunner};
