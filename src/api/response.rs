//! JSON response envelope and error → status mapping.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

const INTERNAL_ERROR: &str = "Internal server error";

/// Body of every API response.
#[derive(Debug, Default, Serialize)]
pub struct Envelope {
    /// Whether the request succeeded
    pub success: bool,
    /// Result payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw server error, when exposed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Envelope {
    /// Success carrying `data`.
    #[must_use]
    pub fn data(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Self::default()
        }
    }

    /// Success carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Failure with an error message.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// An [`Envelope`] with its status code.
#[derive(Debug)]
pub struct Reply {
    /// HTTP status
    pub status: StatusCode,
    /// JSON body
    pub body: Envelope,
}

impl Reply {
    /// 200 with `body`.
    #[must_use]
    pub const fn ok(body: Envelope) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// 201 with `body`.
    #[must_use]
    pub const fn created(body: Envelope) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }

    /// 405 for verbs a route does not serve.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            body: Envelope::failure("Method not allowed"),
        }
    }

    /// Maps an error onto its status. Server errors hide their message
    /// unless `expose_details` is set.
    #[must_use]
    pub fn from_error(err: &Error, expose_details: bool) -> Self {
        let status = status_for(err);
        let body = if status.is_server_error() {
            error!("Request failed: {}", err);
            Envelope {
                details: expose_details.then(|| err.to_string()),
                ..Envelope::failure(INTERNAL_ERROR)
            }
        } else {
            Envelope::failure(err.to_string())
        };
        Self { status, body }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for an error.
#[must_use]
pub const fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::MissingFields { .. } | Error::MissingId | Error::InvalidBody { .. } => {
            StatusCode::BAD_REQUEST
        }
        Error::TenantMismatch { .. } => StatusCode::FORBIDDEN,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_message() {
        let reply = Reply::from_error(&Error::MissingId, false);
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body.error.as_deref(), Some("Missing document id"));
        assert!(reply.body.details.is_none());
    }

    #[test]
    fn test_server_errors_hide_details_when_disabled() {
        let err = Error::Database(sea_orm::DbErr::Custom("disk full".to_string()));

        let hidden = Reply::from_error(&err, false);
        assert_eq!(hidden.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hidden.body.error.as_deref(), Some(INTERNAL_ERROR));
        assert!(hidden.body.details.is_none());

        let exposed = Reply::from_error(&err, true);
        assert!(exposed.body.details.unwrap_or_default().contains("disk full"));
    }

    #[test]
    fn test_status_mapping() {
        let mismatch = Error::TenantMismatch {
            field: "negocioId".to_string(),
            scope: "n1".to_string(),
            requested: "n2".to_string(),
        };
        let missing = Error::NotFound {
            collection: "categorias".to_string(),
            id: "x".to_string(),
        };
        assert_eq!(status_for(&mismatch), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&missing), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let json = serde_json::to_value(Envelope::message("ok")).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"success": true, "message": "ok"}));
    }
}
