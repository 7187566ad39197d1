pub mod generator;
pub mod secret;

pub use generator::*;
pub use secret::*;
