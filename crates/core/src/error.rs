#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
