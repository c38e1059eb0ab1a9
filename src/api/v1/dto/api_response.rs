/*
 * Responsibility
 * - 全レスポンス共通のエンベロープ {status, data, timestamp, message}
 * - handler と認証ミドルウェアの両方から使う
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: Option<T>,
    // epoch millis
    pub timestamp: i64,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            data: Some(data),
            timestamp: chrono::Utc::now().timestamp_millis(),
            message: Some(message.into()),
        }
    }

    pub fn error(data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
            message: Some(message.into()),
        }
    }
}
