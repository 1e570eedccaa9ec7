use thiserror::Error;

#[derive(Error, Debug)]
pub enum LtaError {
    #[error("database error: {0}")]
    Database(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<sqlx::Error> for LtaError {
    fn from(e: sqlx::Error) -> Self {
        LtaError::Database(e.to_string())
    }
}
