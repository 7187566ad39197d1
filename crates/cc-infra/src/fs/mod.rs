mod local;
mod properties_patcher;

pub use local::LocalFileSystem;
pub use properties_patcher::{PropertiesFilePatcher, StagedRewrite};
