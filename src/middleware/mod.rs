/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 認証 → 所有者確認の 2 段パイプライン
 * - cors / http: 横断的な transport 設定
 */
pub mod auth;
pub mod cors;
pub mod http;
