//! Two-stage request pipeline: authentication, then ownership authorization.
//!
//! ```ignore
//! let pipeline = Arc::new(AuthPipeline::new(tokens, ownership, api::v1::route_table(), public));
//! let router = middleware::auth::apply(api::v1::routes(), pipeline);
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::from_fn_with_state,
};

use crate::services::auth::{OwnershipService, TokenService};

mod access;
mod ownership;
pub mod policy;


pub use policy::{EndpointPolicy, RouteTable};

/// Everything both stages read at request time. Built once, shared behind an `Arc`.
#[derive(Debug)]
pub struct AuthPipeline {
    tokens: Arc<TokenService>,
    ownership: Arc<OwnershipService>,
    routes: RouteTable,
    public_endpoints: Vec<String>,
}

impl AuthPipeline {
    pub fn new(
        tokens: Arc<TokenService>,
        ownership: Arc<OwnershipService>,
        routes: RouteTable,
        public_endpoints: Vec<String>,
    ) -> Self {
        Self {
            tokens,
            ownership,
            routes,
            public_endpoints,
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        self.public_endpoints
            .iter()
            .any(|suffix| path.ends_with(suffix.as_str()))
    }

    fn policy_for(&self, req: &Request<Body>) -> EndpointPolicy {
        match req.extensions().get::<MatchedPath>() {
            Some(matched) => self.routes.policy_for(req.method(), matched.as_str()),
            None => EndpointPolicy::open(),
        }
    }
}

/// Layer both stages onto `router`.
///
/// The route table is keyed by `MatchedPath`, so routes must be registered with
/// their full paths (no `nest`).
pub fn apply<S>(router: Router<S>, pipeline: Arc<AuthPipeline>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // last layer added runs first
    router
        .layer(from_fn_with_state(
            pipeline.clone(),
            ownership::ownership_middleware,
        ))
        .layer(from_fn_with_state(pipeline, access::access_middleware))
}
