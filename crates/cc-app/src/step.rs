use async_trait::async_trait;
use cc_core::{Milestone, ProvisionError, ProvisioningContext};

/// One mutating unit of the provisioning sequence.
#[async_trait]
pub trait ProvisioningStep: Send + Sync {
    /// Stable kebab-case identifier, used in logs, plans and failures.
    fn name(&self) -> &'static str;

    /// Milestone reached once this step is applied or found satisfied.
    /// Optional steps reach none.
    fn milestone(&self) -> Option<Milestone> {
        None
    }

    /// Names of steps that must appear earlier in the plan.
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    /// Idempotency predicate. `true` means the effect is already in place and
    /// [`ProvisioningStep::run`] is skipped.
    async fn is_satisfied(&self, ctx: &ProvisioningContext) -> bool;

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError>;
}
