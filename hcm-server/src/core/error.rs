use thiserror::Error;

/// Startup and server lifecycle errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<shared::error::AppError> for ServerError {
    fn from(err: shared::error::AppError) -> Self {
        ServerError::Database(err.message)
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
