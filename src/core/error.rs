use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
    #[error("Alignment violation: {0}")]
    AlignmentViolation(String),
    #[error("Execution failure: {0}")]
    ExecutionFailure(String),
    #[error("Non-determinism: {0}")]
    NonDeterministic(String),
    #[error("Performance regression: {0}")]
    Regression(String),
    #[error("Not found: {0}")]
    NotFound(String),
}
