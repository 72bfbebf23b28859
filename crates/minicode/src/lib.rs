pub mod agents;
pub mod code_engine;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod providers;
