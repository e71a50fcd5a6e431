use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Login required: {0}")]
    AuthRequired(String),
    #[error("Post `{0}` not found")]
    NotFound(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Remote store failure: {0}")]
    RemoteFailure(String),
}

impl Error {
    /// Wrap any error raised while talking to the remote store.
    pub fn remote(err: impl std::fmt::Display) -> Self {
        Self::RemoteFailure(err.to_string())
    }
}
