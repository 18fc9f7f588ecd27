/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, CORS 許可、service key、認可ポリシーなど)
 * - 設定値のバリデーション (不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
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

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    /// base64 Ed25519 secret. Takes precedence over `service_key_path`.
    pub service_secret_key: Option<String>,
    pub service_key_path: PathBuf,

    pub blocked_issuers: Vec<String>,
    pub auth_token_ttl_seconds: i64,
    pub max_chain_depth: usize,
    pub default_storage_limit: f64,

    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            app_env: AppEnv::Development,
            cors_allowed_origins: Vec::new(),
            service_secret_key: None,
            service_key_path: PathBuf::from("service.key"),
            blocked_issuers: Vec::new(),
            auth_token_ttl_seconds: 24 * 60 * 60,
            max_chain_depth: 32,
            default_storage_limit: 32.0 * 1.1e12,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unset keys fall back to defaults;
    /// set but unparsable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port: u16 = parse_or(&lookup, "PORT", defaults.addr.port())?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let service_secret_key = lookup("SERVICE_SECRET_KEY").filter(|s| !s.trim().is_empty());
        let service_key_path = lookup("SERVICE_KEY_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.service_key_path);
        if service_key_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing("SERVICE_KEY_PATH"));
        }

        let auth_token_ttl_seconds: i64 = parse_or(
            &lookup,
            "AUTH_TOKEN_TTL_SECONDS",
            defaults.auth_token_ttl_seconds,
        )?;
        if auth_token_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("AUTH_TOKEN_TTL_SECONDS"));
        }

        let max_chain_depth: usize = parse_or(&lookup, "MAX_CHAIN_DEPTH", defaults.max_chain_depth)?;
        if max_chain_depth == 0 {
            return Err(ConfigError::Invalid("MAX_CHAIN_DEPTH"));
        }

        let default_storage_limit: f64 = parse_or(
            &lookup,
            "DEFAULT_STORAGE_LIMIT",
            defaults.default_storage_limit,
        )?;
        if default_storage_limit.is_nan() || default_storage_limit < 0.0 {
            return Err(ConfigError::Invalid("DEFAULT_STORAGE_LIMIT"));
        }

        let max_upload_bytes: usize =
            parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins: comma_list(lookup("CORS_ALLOWED_ORIGINS")),
            service_secret_key,
            service_key_path,
            blocked_issuers: comma_list(lookup("BLOCKED_ISSUERS")),
            auth_token_ttl_seconds,
            max_chain_depth,
            default_storage_limit,
            max_upload_bytes,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        _ => Ok(default),
    }
}

fn comma_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
}
