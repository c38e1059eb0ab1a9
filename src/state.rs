/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, tokens: TokenService
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - 認証パイプラインの状態は AuthPipeline 側に持つ (handler からは見えない)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::auth::TokenService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: PgPool, tokens: Arc<TokenService>) -> Self {
        Self { db, tokens }
    }
}
