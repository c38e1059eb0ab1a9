//! Authorization stage: the authenticated owner must own the resource named by
//! the route's declared path parameter.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};

use super::AuthPipeline;
use super::policy::OwnershipRequirement;
use crate::api::v1::extractors::Identity;
use crate::error::AuthorizationError;

pub(super) async fn ownership_middleware(
    State(pipeline): State<Arc<AuthPipeline>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthorizationError> {
    let Some(requirement) = pipeline.policy_for(&req).ownership() else {
        return Ok(next.run(req).await);
    };

    let Some(owner_id) = req.extensions().get::<Identity>().map(Identity::owner_id) else {
        // authentication stage must run first on owned routes
        tracing::error!(
            path = %req.uri().path(),
            resource_kind = %requirement.kind,
            "ownership check reached without an identity"
        );
        return Err(AuthorizationError::MissingIdentity);
    };

    let (mut parts, body) = req.into_parts();
    let resource_id = resource_id(&mut parts, requirement).await.ok_or_else(|| {
        tracing::warn!(
            path = %parts.uri.path(),
            owner_id,
            resource_kind = %requirement.kind,
            param = requirement.param,
            "resource id missing or not numeric"
        );
        AuthorizationError::UnverifiableOwnership
    })?;

    if !pipeline
        .ownership
        .is_owned_by(requirement.kind, resource_id, owner_id)
        .await
    {
        tracing::warn!(
            path = %parts.uri.path(),
            owner_id,
            resource_kind = %requirement.kind,
            resource_id,
            "ownership denied"
        );
        return Err(AuthorizationError::NotOwned);
    }

    tracing::debug!(
        owner_id,
        resource_kind = %requirement.kind,
        resource_id,
        "ownership verified"
    );

    Ok(next.run(Request::from_parts(parts, body)).await)
}

async fn resource_id(
    parts: &mut Parts,
    requirement: OwnershipRequirement,
) -> Option<i64> {
    let params = RawPathParams::from_request_parts(parts, &()).await.ok()?;
    params
        .iter()
        .find(|(name, _)| *name == requirement.param)
        .and_then(|(_, value)| value.parse::<i64>().ok())
}
