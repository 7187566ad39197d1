use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cc_core::ports::{CommandError, CommandRunnerPort, CommandSpec, OwnershipPort};
use tracing::debug;

/// `OwnershipPort` backed by the `chown` binary.
#[derive(Clone)]
pub struct ServiceOwnership {
    runner: Arc<dyn CommandRunnerPort>,
    owner: String,
}

impl ServiceOwnership {
    /// `owner` is passed to `chown` verbatim, e.g. `cycle_server:`.
    pub fn new(runner: Arc<dyn CommandRunnerPort>, owner: impl Into<String>) -> Self {
        Self {
            runner,
            owner: owner.into(),
        }
    }
}

#[async_trait]
impl OwnershipPort for ServiceOwnership {
    fn owner(&self) -> &str {
        &self.owner
    }

    async fn assign(&self, path: &Path, recursive: bool) -> Result<(), CommandError> {
        debug!(path = %path.display(), owner = %self.owner, recursive, "Assigning ownership");
        let mut spec = CommandSpec::new("chown");
        if recursive {
            spec = spec.arg("-R");
        }
        let spec = spec.arg(self.owner.clone()).path_arg(path);
        self.runner.run(&spec).await.map(|_| ())
    }
}
