//! External process execution.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// One command-line argument. Secret arguments are passed to the process
/// as-is but render as `[REDACTED]` everywhere else.
#[derive(Clone, PartialEq, Eq)]
pub enum CommandArg {
    Plain(String),
    Secret(String),
}

impl CommandArg {
    /// The real value, for handing to the OS.
    pub fn value(&self) -> &str {
        match self {
            CommandArg::Plain(v) | CommandArg::Secret(v) => v,
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, CommandArg::Secret(_))
    }
}

impl fmt::Debug for CommandArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for CommandArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandArg::Plain(v) => f.write_str(v),
            CommandArg::Secret(_) => f.write_str("[REDACTED]"),
        }
    }
}

/// A fully described process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<CommandArg>,
    current_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    pub fn from_path(program: &Path) -> Self {
        Self::new(program.to_string_lossy().into_owned())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(CommandArg::Plain(arg.into()));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|a| CommandArg::Plain(a.into())));
        self
    }

    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(CommandArg::Secret(arg.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Overrides the runner's default timeout for this command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg_list(&self) -> &[CommandArg] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Renders as a shell-like line with secrets redacted. Safe to log.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("failed to spawn `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    #[error("`{command}` exited with status {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("`{command}` was terminated by a signal")]
    Terminated { command: String },

    #[error("`{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

impl CommandError {
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            CommandError::NonZeroExit { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Runs external commands. A non-zero exit status is an error.
#[async_trait]
pub trait CommandRunnerPort: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, CommandError>;
}
