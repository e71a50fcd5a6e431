use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use rakorean_core::Error as ForumError;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug)]
pub struct ServerError(anyhow::Error);

impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        let status = self.status_code();
        (status, self.to_string()).into_response()
    }
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        for cause in self.0.chain() {
            if let Some(err) = cause.downcast_ref::<ForumError>() {
                return match err {
                    ForumError::Validation(_) => StatusCode::BAD_REQUEST,
                    ForumError::InvalidCategory(_) => StatusCode::BAD_REQUEST,
                    ForumError::AuthRequired(_) => StatusCode::UNAUTHORIZED,
                    ForumError::NotFound(_) => StatusCode::NOT_FOUND,
                    ForumError::RemoteFailure(_) => StatusCode::BAD_GATEWAY,
                };
            }
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
