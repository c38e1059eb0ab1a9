/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、JWT 署名鍵、公開エンドポイントなど)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_ISSUER: &str = "aquarium-api";
// 10 years
pub const MAX_ACCESS_TOKEN_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;
pub const DEFAULT_PUBLIC_ENDPOINTS: &str = "/api/v1/auth/register,/api/v1/auth/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_issuer: String,
    // HS256 signing key; shared by issuance and verification
    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,
    pub access_token_leeway_seconds: u64,
    // Path suffixes that never require a token
    pub public_endpoints: Vec<String>,

    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the signing key or the database credentials
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("auth_issuer", &self.auth_issuer)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("public_endpoints", &self.public_endpoints)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port =
            u16::try_from(env_u64("PORT", 3000)?).map_err(|_| ConfigError::Invalid("PORT"))?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins =
            parse_list(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let auth_issuer =
            std::env::var("AUTH_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());
        if auth_issuer.trim().is_empty() {
            return Err(ConfigError::Invalid("AUTH_ISSUER"));
        }

        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let access_token_ttl_seconds =
            check_ttl(env_u64("ACCESS_TOKEN_TTL_SECONDS", 86_400)?)?; // 24h
        let access_token_leeway_seconds = env_u64("ACCESS_TOKEN_LEEWAY_SECONDS", 0)?;

        let public_endpoints = parse_list(
            &std::env::var("PUBLIC_ENDPOINTS")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_ENDPOINTS.to_string()),
        );

        let request_timeout_seconds = env_u64("REQUEST_TIMEOUT_SECONDS", 30)?;
        let request_body_limit_bytes =
            usize::try_from(env_u64("REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?)
                .map_err(|_| ConfigError::Invalid("REQUEST_BODY_LIMIT_BYTES"))?;

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            auth_issuer,
            jwt_secret,
            access_token_ttl_seconds,
            access_token_leeway_seconds,
            public_endpoints,
            request_timeout_seconds,
            request_body_limit_bytes,
        })
    }
}

fn env_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    parse_u64(key, std::env::var(key).ok().as_deref(), default)
}

/// Unset or blank means `default`; anything else must parse.
fn parse_u64(key: &'static str, raw: Option<&str>, default: u64) -> Result<u64, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse::<u64>().map_err(|_| ConfigError::Invalid(key)),
    }
}

fn check_ttl(ttl_seconds: u64) -> Result<u64, ConfigError> {
    if ttl_seconds == 0 || ttl_seconds > MAX_ACCESS_TOKEN_TTL_SECONDS {
        return Err(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"));
    }
    Ok(ttl_seconds)
}

/// Split a comma-separated env value, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
