pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ServerConfig;

pub use adapters::{LocalArtifactStore, MemoryArtifactStore};
pub use core::pipeline::ServingContext;
pub use server::build_router;
pub use utils::error::{PredictorError, Result};
