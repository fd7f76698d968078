// Application layer - Pipeline orchestration

pub mod orchestrator;

pub use orchestrator::JobOrchestrator;
