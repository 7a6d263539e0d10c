//! Error types for the opsloop domain, one enum per bounded context.
//!
//! Only [`ProviderError`] is fatal to a run; every other error is rendered
//! into an observation and handed back to the model.

use thiserror::Error;

/// Failures of the model call itself. These terminate a run.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures while resolving, validating or running a single action.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action already registered: {0}")]
    DuplicateAction(String),

    #[error("Invalid arguments for {action}: {reason}")]
    InvalidArguments { action: String, reason: String },

    #[error("Action {action} failed: {reason}")]
    ExecutionFailed { action: String, reason: String },

    #[error("Action {action} exited with status {status}:\n{output}")]
    ProcessFailed {
        action: String,
        status: i32,
        output: String,
    },

    #[error("Action {action} rejected path: {source}")]
    PathRejected {
        action: String,
        #[source]
        source: PathError,
    },
}

/// Malformed or inconsistent action requests coming from the model.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    #[error("Duplicate correlation id in batch: {0}")]
    DuplicateCorrelationId(String),

    #[error("Action request for {action} is missing a correlation id")]
    MissingCorrelationId { action: String },

    #[error("Arguments for {action} are not a JSON object: {reason}")]
    MalformedArguments { action: String, reason: String },
}

/// Failures talking to the human operator (or its stand-in).
#[derive(Debug, Clone, Error)]
pub enum OperatorError {
    #[error("No operator available: {0}")]
    Unavailable(String),

    #[error("Operator I/O failed: {0}")]
    Io(String),
}

/// Failures resolving a path against the path context.
#[derive(Debug, Clone, Error)]
pub enum PathError {
    #[error("Path '{path}' matches forbidden pattern '{pattern}'")]
    Forbidden { path: String, pattern: String },

    #[error("Path '{path}' does not exist")]
    NotFound { path: String },

    #[error("Path '{path}' is not a directory")]
    NotADirectory { path: String },

    #[error("Empty path")]
    Empty,
}
