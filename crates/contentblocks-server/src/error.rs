use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contentblocks_core::{ContentError, ErrorBody};
use std::any::Any;

/// HTTP face of [`ContentError`]: every failure is `{"error": <message>}`.
#[derive(Debug)]
pub struct ApiError(pub ContentError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ContentError::NoRecords => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(e: ContentError) -> Self {
        ApiError(e)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        ApiError(ContentError::Invalid(r.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(r: PathRejection) -> Self {
        ApiError(ContentError::Invalid(r.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.0.to_string()))).into_response()
    }
}

/// Turns a handler panic into the usual error body.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unexpected failure".to_string()
    };
    tracing::error!(%message, "handler panicked");
    ApiError(ContentError::Provider(message)).into_response()
}
