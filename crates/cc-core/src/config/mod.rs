pub mod bootstrap_config;
pub mod properties;

pub use bootstrap_config::BootstrapConfig;
pub use properties::{server_patch_rules, PatchRule, PatchRules, PatchedContent};
