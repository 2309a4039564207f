use thiserror::Error;

/// Structural failures of the inference core.
///
/// Heuristic misses (an undetermined dialect, a value that will not parse)
/// are not errors; they degrade to sentinel dialects or wider column kinds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InferenceError {
    #[error("cannot infer a schema from zero rows")]
    InvalidInput,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type InferenceResult<T> = std::result::Result<T, InferenceError>;
