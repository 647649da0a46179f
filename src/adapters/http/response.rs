use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;

use crate::utils::error::{ErrorKind, InviteError};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An error response: `{"error": "<details>: <cause>"}` with a status derived from the cause.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn from_error(details: &str, err: &InviteError) -> Self {
        let message = if details.is_empty() {
            err.to_string()
        } else {
            format!("{}: {}", details, err)
        };
        Self::new(status_for(err), message)
    }

    pub fn bad_request(details: &str, cause: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("{}: {}", details, cause))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

pub fn status_for(err: &InviteError) -> StatusCode {
    match err.kind() {
        ErrorKind::InvalidArgument => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Canceled => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Serialization => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Config | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.message, "Request failed");
        } else {
            tracing::warn!(status = self.status.as_u16(), error = %self.message, "Request rejected");
        }

        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// A pre-encoded JSON body, sent as-is so cached and fresh responses stay byte-identical.
pub fn json_bytes(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&InviteError::invalid_argument("invalid latitude", "bad")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&InviteError::canceled("parsing").context("error to parse input file")),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&InviteError::BadRequest {
                message: "missing file".to_string()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&InviteError::internal("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let serialization = serde_json::from_str::<u8>("x").unwrap_err();
        assert_eq!(
            status_for(&InviteError::from(serialization)),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_message_chains_details() {
        let err = HttpError::from_error(
            "error to filter customers",
            &InviteError::UnexpectedOrdering {
                value: "55".to_string(),
            },
        );

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "error to filter customers: unexpected order by: '55'");
    }
}
