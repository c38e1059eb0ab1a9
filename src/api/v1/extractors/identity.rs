/*
 * Responsibility
 * - 認証済みリクエストに付与される Identity の型
 * - middleware が検証して request extensions に格納し、handler は CurrentOwner だけを受け取る
 *
 * Notes
 * - トークン検証は middleware/services 側の責務。ここは「型（契約）」のみ
 */
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::token::VerifiedToken;

/// The authenticated caller, valid for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    owner_id: i64,
    username: String,
}

impl Identity {
    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl From<VerifiedToken> for Identity {
    fn from(token: VerifiedToken) -> Self {
        Self {
            owner_id: token.owner_id,
            username: token.username,
        }
    }
}

/// Handler で Identity を受け取るための extractor
/// 見つからない場合は 401 (AppError の envelope)。認証がかかっていないルート、またはミドルウェア未設定
pub struct CurrentOwner(pub Identity);

impl<S> FromRequestParts<S> for CurrentOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentOwner)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}
