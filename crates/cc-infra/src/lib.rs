pub mod fs;
pub mod http;

pub use fs::{LocalFileSystem, PropertiesFilePatcher, StagedRewrite};
pub use http::{ImdsMetadataClient, ReqwestArtifactFetcher};
