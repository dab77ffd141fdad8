//! Domain error to HTTP response translation

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::shared::DomainError;

/// Handler error: wraps a [`DomainError`] and renders the JSON error envelope.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::IdentityAlreadyAssigned
            | DomainError::IdentityMissing
            | DomainError::Validation(_)
            | DomainError::NotFound { .. } => StatusCode::BAD_REQUEST,
            DomainError::LoginConflict | DomainError::EmailConflict => StatusCode::CONFLICT,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (DomainError::IdentityAlreadyAssigned, StatusCode::BAD_REQUEST),
            (DomainError::IdentityMissing, StatusCode::BAD_REQUEST),
            (DomainError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                DomainError::NotFound {
                    entity: "Account",
                    field: "login",
                    value: "ghost".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::LoginConflict, StatusCode::CONFLICT),
            (DomainError::EmailConflict, StatusCode::CONFLICT),
            (DomainError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (DomainError::Storage("db".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn storage_details_are_not_leaked() {
        let response = ApiError(DomainError::Storage("disk on fire".into())).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["error"], "Internal server error");
    }
}
