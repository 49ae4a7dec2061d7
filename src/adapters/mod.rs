// Adapters layer: concrete implementations for external systems (artifact storage).

pub mod storage;

pub use storage::{LocalArtifactStore, MemoryArtifactStore};
