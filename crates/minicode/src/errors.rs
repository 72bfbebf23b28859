use thiserror::Error;

/// Failures surfaced by the streaming client, the agent registry and the orchestrator.
///
/// Malformed individual stream lines never show up here; the provider drops them.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MinicodeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown agent role: {0}")]
    UnknownAgent(String),

    /// A workflow or pipeline step failed. `step` is 1-based.
    #[error("Step {step} failed: {source}")]
    StepFailure {
        step: usize,
        #[source]
        source: Box<MinicodeError>,
    },

    #[error("Execution failed: {0}")]
    Execution(String),
}

impl MinicodeError {
    pub fn step_failure(step: usize, source: MinicodeError) -> Self {
        MinicodeError::StepFailure {
            step,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, MinicodeError>;
