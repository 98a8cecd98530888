pub mod artifact;
pub mod orchestrator;
