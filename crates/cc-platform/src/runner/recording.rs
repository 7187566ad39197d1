use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use cc_core::ports::{CommandError, CommandOutput, CommandRunnerPort, CommandSpec};

type Effect = Box<dyn Fn(&CommandSpec) + Send + Sync>;

struct Script {
    prefix: String,
    result: Result<CommandOutput, CommandError>,
    remaining: Option<usize>,
}

/// Test double that records every command and answers from scripted results.
///
/// Commands are matched by prefix against their redacted rendering
/// (`program arg1 arg2 ...`). The first live script wins; unmatched commands
/// succeed with empty output. Effects run for every matching command, before
/// the result is returned, and let tests simulate files a tool would create.
pub struct RecordingCommandRunner {
    calls: Mutex<Vec<CommandSpec>>,
    scripts: Mutex<Vec<Script>>,
    effects: Mutex<Vec<(String, Effect)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RecordingCommandRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripts: Mutex::new(Vec::new()),
            effects: Mutex::new(Vec::new()),
        }
    }

    fn script(
        &self,
        prefix: &str,
        result: Result<CommandOutput, CommandError>,
        remaining: Option<usize>,
    ) -> &Self {
        lock(&self.scripts).push(Script {
            prefix: prefix.to_string(),
            result,
            remaining,
        });
        self
    }

    /// Answer every matching command with `result`.
    pub fn respond(&self, prefix: &str, result: Result<CommandOutput, CommandError>) -> &Self {
        self.script(prefix, result, None)
    }

    /// Answer only the next matching command with `result`.
    pub fn respond_once(&self, prefix: &str, result: Result<CommandOutput, CommandError>) -> &Self {
        self.script(prefix, result, Some(1))
    }

    pub fn stdout(&self, prefix: &str, stdout: &str) -> &Self {
        self.respond(
            prefix,
            Ok(CommandOutput {
                status: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        )
    }

    pub fn fail(&self, prefix: &str, status: i32) -> &Self {
        self.respond(prefix, Err(Self::exit_error(prefix, status)))
    }

    pub fn fail_once(&self, prefix: &str, status: i32) -> &Self {
        self.respond_once(prefix, Err(Self::exit_error(prefix, status)))
    }

    pub fn on_run<F>(&self, prefix: &str, effect: F) -> &Self
    where
        F: Fn(&CommandSpec) + Send + Sync + 'static,
    {
        lock(&self.effects).push((prefix.to_string(), Box::new(effect)));
        self
    }

    fn exit_error(prefix: &str, status: i32) -> CommandError {
        CommandError::NonZeroExit {
            command: prefix.to_string(),
            status,
            stderr: format!("scripted failure ({status})"),
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        lock(&self.calls).clone()
    }

    /// Redacted command lines in invocation order.
    pub fn commands(&self) -> Vec<String> {
        lock(&self.calls).iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn invoked(&self, prefix: &str) -> bool {
        self.count(prefix) > 0
    }
}

impl Default for RecordingCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunnerPort for RecordingCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let rendered = spec.to_string();
        lock(&self.calls).push(spec.clone());

        for (prefix, effect) in lock(&self.effects).iter() {
            if rendered.starts_with(prefix.as_str()) {
                effect(spec);
            }
        }

        let mut scripts = lock(&self.scripts);
        let live = scripts
            .iter_mut()
            .find(|s| s.remaining != Some(0) && rendered.starts_with(s.prefix.as_str()));
        match live {
            Some(script) => {
                if let Some(n) = script.remaining.as_mut() {
                    *n -= 1;
                }
                script.result.clone()
            }
            None => Ok(CommandOutput::default()),
        }
    }
}
