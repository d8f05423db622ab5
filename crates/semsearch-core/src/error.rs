use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid template: {0}")]
    Template(#[from] serde_json::Error),

    #[error("{0} is not supported.")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, Error>;
