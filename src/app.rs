/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (PgPool, TokenService, OwnershipService) → Router 組み立て
 * - Middleware の適用 (認証パイプライン / CORS / HTTP)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::{self, v1::handlers::health::health},
    config::Config,
    middleware::{self, auth::AuthPipeline},
    repos::resource_repo::PgResourceLookup,
    services::auth::{OwnershipLookups, OwnershipService, ResourceKind, TokenService},
    state::AppState,
};

fn init_tracing() {
    // RUST_LOG=info,aquarium_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast. production: default hook, keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting aquarium-api in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect_lazy(&config.database_url)
        .context("invalid DATABASE_URL")?;

    let tokens = Arc::new(TokenService::new(
        config.jwt_secret.as_bytes(),
        config.auth_issuer.clone(),
        config.access_token_ttl_seconds,
        config.access_token_leeway_seconds,
    ));
    let ownership = Arc::new(OwnershipService::new(ownership_lookups(&db)));

    let route_table = api::v1::route_table();
    tracing::info!(
        policies = route_table.len(),
        public_endpoints = ?config.public_endpoints,
        "auth pipeline configured"
    );
    let pipeline = Arc::new(AuthPipeline::new(
        tokens.clone(),
        ownership,
        route_table,
        config.public_endpoints.clone(),
    ));

    let state = AppState::new(db, tokens);
    let app = build_router(state, pipeline, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn ownership_lookups(db: &PgPool) -> OwnershipLookups {
    let lookup = |kind| Arc::new(PgResourceLookup::new(db.clone(), kind));

    OwnershipLookups {
        aquariums: lookup(ResourceKind::Aquarium),
        inhabitants: lookup(ResourceKind::Inhabitant),
        accessories: lookup(ResourceKind::Accessory),
        ornaments: lookup(ResourceKind::Ornament),
    }
}

fn build_router(state: AppState, pipeline: Arc<AuthPipeline>, config: &Config) -> Router {
    let v1 = middleware::auth::apply(api::v1::routes(), pipeline);

    let router = Router::new()
        .route("/health", get(health))
        .merge(v1)
        .with_state(state);

    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
