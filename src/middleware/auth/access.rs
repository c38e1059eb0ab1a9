//! Authentication stage: bearer token → `Identity` in request extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use super::AuthPipeline;
use crate::api::v1::extractors::Identity;
use crate::error::{AuthenticationError, AuthenticationRejection};

pub(super) async fn access_middleware(
    State(pipeline): State<Arc<AuthPipeline>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthenticationRejection> {
    let path = req.uri().path().to_owned();

    if pipeline.is_public_path(&path) {
        return Ok(next.run(req).await);
    }

    if !pipeline.policy_for(&req).requires_authentication() {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| {
            tracing::debug!(path = %path, "missing or malformed authorization header");
            AuthenticationError::MissingCredentials.at(path.as_str())
        })?;

    let verified = match pipeline.tokens.verify(token) {
        Ok(verified) => verified,
        Err(err) if err.is_internal() => {
            tracing::error!(path = %path, error = %err, "token verification fault");
            return Err(AuthenticationError::Internal.at(path));
        }
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "access token verification failed");
            return Err(AuthenticationError::InvalidToken.at(path));
        }
    };

    let identity = Identity::from(verified);
    tracing::debug!(
        path = %path,
        owner_id = identity.owner_id(),
        "request authenticated"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// `Bearer <token>`, scheme matched case-insensitively, token trimmed.
fn bearer_token(value: &str) -> Option<&str> {
    const SCHEME: &str = "bearer ";

    let scheme = value.get(..SCHEME.len())?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    let token = value[SCHEME.len()..].trim();
    (!token.is_empty()).then_some(token)
}
