use serde_json::{json, Value};
use thiserror::Error;

/// Classified failure raised anywhere between route validation and a
/// business handler. Each kind carries the HTTP status it renders as; the
/// dispatcher turns any of these into a `{"success": false, "message"}`
/// body with that status.
///
/// Panics inside handlers are *unclassified* failures: they never become
/// an `HttpError`, the dispatcher's recovery stage maps them straight to a
/// generic 500.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// A request stage failed schema validation. Raised only by the
    /// schema validator; always 400. The message begins with the stage
    /// name ("Query", "Params" or "Body").
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist. Always 404.
    #[error("{0}")]
    NotFound(String),

    /// Unrecoverable server-side failure. Always 500.
    #[error("{0}")]
    Internal(String),

    /// Any other classified failure with an explicit status code.
    #[error("{message}")]
    Status { status: u16, message: String },
}

impl HttpError {
    pub fn validation(message: impl Into<String>) -> Self {
        HttpError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        HttpError::Internal(message.into())
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        HttpError::Status {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status this failure renders as.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            HttpError::Validation(_) => 400,
            HttpError::NotFound(_) => 404,
            HttpError::Internal(_) => 500,
            HttpError::Status { status, .. } => *status,
        }
    }

    /// The uniform failure body written for this error.
    #[must_use]
    pub fn to_body(&self) -> Value {
        json!({ "success": false, "message": self.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(HttpError::validation("Query bad").status_code(), 400);
        assert_eq!(HttpError::not_found("gone").status_code(), 404);
        assert_eq!(HttpError::internal("boom").status_code(), 500);
        assert_eq!(HttpError::with_status(409, "conflict").status_code(), 409);
    }

    #[test]
    fn test_failure_body_shape() {
        let body = HttpError::not_found("User not found").to_body();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User not found");
    }
}
