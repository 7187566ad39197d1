//! `CommandRunnerPort` implementations.
//!
//! `SystemCommandRunner` spawns real processes with a timeout.
//! `RecordingCommandRunner` records invocations and replays scripted results.

mod recording;
mod system;

pub use recording::RecordingCommandRunner;
pub use system::SystemCommandRunner;
