mod artifact;
mod metadata;

pub use artifact::ReqwestArtifactFetcher;
pub use metadata::ImdsMetadataClient;
