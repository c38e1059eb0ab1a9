use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::error::AppError;

/// Errors returned by access-token verification.
///
/// Every variant except the key/configuration faults (see [`TokenError::is_internal`])
/// is reported to clients as the same "Invalid token", so callers never learn which
/// check failed.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
    #[error("invalid 'sub' (expected owner id)")]
    InvalidSubject,
}

impl TokenError {
    /// True when the failure says something about our key setup rather than the token.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Jwt(e) => matches!(
                e.kind(),
                ErrorKind::InvalidKeyFormat | ErrorKind::MissingAlgorithm
            ),
            _ => false,
        }
    }
}

/// Access token (JWT) claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub username: String,
}

/// 検証済み・アプリ側で使う型
///
/// - `sub` は owner id (i64) に昇格させる
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub owner_id: i64,
    pub username: String,
}

/// HS256 access-token issuer and verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenService {
    issuer: String,
    ttl_seconds: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenService {
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        ttl_seconds: u64,
        leeway_seconds: u64,
    ) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = leeway_seconds;

        Self {
            issuer,
            ttl_seconds,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue an access token valid for `ttl_seconds` from now.
    pub fn issue(&self, owner_id: i64, username: &str) -> Result<String, AppError> {
        self.issue_at(owner_id, username, Utc::now())
    }

    pub fn issue_at(
        &self,
        owner_id: i64,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let expires_at = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or_else(|| {
                error!(ttl_seconds = self.ttl_seconds, "token expiry out of range");
                AppError::Internal
            })?;

        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: owner_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            username: username.to_string(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, owner_id, "failed to sign JWT");
            AppError::Internal
        })?;

        info!(owner_id, username, "issued access token");
        Ok(token)
    }

    /// Verify signature, issuer and expiry, then convert claims into a [`VerifiedToken`].
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = jsonwebtoken::decode::<AccessTokenClaims>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::EmptyClaim("sub"));
        }
        let owner_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidSubject)?;

        debug!(owner_id, "verified access token");

        Ok(VerifiedToken {
            owner_id,
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-aquarium-api";

    fn service() -> TokenService {
        TokenService::new(SECRET, "aquarium-api", 86_400, 0)
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let tokens = service();
        for (owner_id, username) in [(1, "a@example.com"), (123, "alice"), (i64::MAX, "")] {
            let token = tokens.issue(owner_id, username).unwrap();
            let verified = tokens.verify(&token).unwrap();
            assert_eq!(verified.owner_id, owner_id);
            assert_eq!(verified.username, username);
        }
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let issued_at = Utc::now() - TimeDelta::hours(48);
        let token = tokens.issue_at(123, "alice", issued_at).unwrap();

        let err = tokens.verify(&token).unwrap_err();
        assert!(matches!(&err, TokenError::Jwt(e) if matches!(e.kind(), ErrorKind::ExpiredSignature)));
        assert!(!err.is_internal());
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let other = TokenService::new(b"another-secret", "aquarium-api", 86_400, 0);
        let token = other.issue(123, "alice").unwrap();

        let err = service().verify(&token).unwrap_err();
        assert!(matches!(&err, TokenError::Jwt(e) if matches!(e.kind(), ErrorKind::InvalidSignature)));
        assert!(!err.is_internal());
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let other = TokenService::new(SECRET, "someone-else", 86_400, 0);
        let token = other.issue(123, "alice").unwrap();

        let err = service().verify(&token).unwrap_err();
        assert!(matches!(&err, TokenError::Jwt(e) if matches!(e.kind(), ErrorKind::InvalidIssuer)));
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            iss: "aquarium-api".to_string(),
            sub: "not-a-number".to_string(),
            iat: now,
            exp: now + 600,
            username: "alice".to_string(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let err = service().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSubject));
    }

    #[test]
    fn garbage_is_rejected_as_token_fault() {
        let err = service().verify("not.a.jwt").unwrap_err();
        assert!(!err.is_internal());
    }

    #[test]
    fn out_of_range_ttl_is_an_internal_error() {
        for ttl in [10_000_000_000_000_000, u64::MAX] {
            let tokens = TokenService::new(SECRET, "aquarium-api", ttl, 0);
            assert!(matches!(tokens.issue(1, "a"), Err(AppError::Internal)));
        }
    }

    #[test]
    fn key_format_fault_is_internal() {
        let err = TokenError::Jwt(ErrorKind::InvalidKeyFormat.into());
        assert!(err.is_internal());
    }
}
