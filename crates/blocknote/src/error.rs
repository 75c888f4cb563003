use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<confique::Error> for NoteError {
    fn from(err: confique::Error) -> Self {
        NoteError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NoteError>;
