//! Reference store adapters - job records and artifact blobs

mod artifacts;
mod memory;

pub use artifacts::FsArtifactStore;
pub use memory::MemoryJobStore;
