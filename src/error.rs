/*
 * Responsibility
 * - アプリ共通の AppError 定義 (handler 用)
 * - 認証/認可パイプラインの拒否理由 (AuthenticationError / AuthorizationError)
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - 内部エラーの詳細はログにのみ出し、レスポンスには含めない
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::api::v1::dto::api_response::ApiResponse;
use crate::repos::error::RepoError;
use crate::services::auth::password::PasswordError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponse::<()>::error(None, self.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::Conflict("conflict".into()),
            RepoError::Db(err) => {
                tracing::error!(error = %err, "database error");
                AppError::Internal
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        tracing::error!(error = %e, "password hashing error");
        AppError::Internal
    }
}

/// Why the authentication stage refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    #[error("Authorization header must be provided")]
    MissingCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Internal Server Error")]
    Internal,
}

impl AuthenticationError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn at(self, path: impl Into<String>) -> AuthenticationRejection {
        AuthenticationRejection {
            error: self,
            path: path.into(),
        }
    }
}

/// Authentication failure plus the request path, rendered in the `ApiResponse` envelope.
#[derive(Debug)]
pub struct AuthenticationRejection {
    pub error: AuthenticationError,
    pub path: String,
}

impl IntoResponse for AuthenticationRejection {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let data = json!({
            "path": self.path,
            "code": status.as_u16(),
        });
        let body = ApiResponse::error(Some(data), self.error.to_string());
        (status, Json(body)).into_response()
    }
}

/// Why the authorization stage refused a request. Always 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("You are not authorized to access this resource.")]
    NotOwned,
    #[error("Unable to verify ownership. Access denied.")]
    UnverifiableOwnership,
    #[error("Unable to verify ownership. Access denied.")]
    MissingIdentity,
}

impl IntoResponse for AuthorizationError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn authentication_rejection_uses_envelope() {
        let resp = AuthenticationError::InvalidToken
            .at("/api/v1/aquariums")
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Invalid token");
        assert_eq!(body["data"]["path"], "/api/v1/aquariums");
        assert_eq!(body["data"]["code"], 401);
    }

    #[tokio::test]
    async fn internal_authentication_failure_hides_details() {
        let resp = AuthenticationError::Internal.at("/x").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(resp).await;
        assert_eq!(body["message"], "Internal Server Error");
        assert_eq!(body["data"]["code"], 500);
    }

    #[tokio::test]
    async fn authorization_rejection_is_plain_error_object() {
        let resp = AuthorizationError::NotOwned.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(resp).await,
            json!({"error": "You are not authorized to access this resource."})
        );
    }

    #[tokio::test]
    async fn repo_conflict_maps_to_409() {
        let resp = AppError::from(RepoError::Conflict).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
