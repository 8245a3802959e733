use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Process exit code for the command-line front end.
    pub fn exit_code(&self) -> i32 {
        let code = match self {
            AppError::NotFound(_) => 3,
            AppError::BadRequest(_) => 2,
            AppError::ValidationError(_) => 4,
            AppError::Conflict(_) => 5,
            AppError::Config(_) => 78,
            AppError::Internal(_) => 1,
        };

        tracing::error!("Error: {} (exit code {})", self, code);
        code
    }
}
