use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub limits: UploadLimits,
    pub max_body_size: usize,
    pub rate_limit: RateLimitConfig,
    pub request_timeout: Duration,
    pub db_connect_timeout: Duration,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub max_files: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024,
            max_files: 10,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| "Missing required environment variable: DATABASE_URL".to_string())?;

        let host: IpAddr = env_or("FORMDROP_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMDROP_HOST: {e}"))?;

        let port: u16 = parse_var("FORMDROP_PORT", &env_or("FORMDROP_PORT", "5000"))?;

        let upload_dir = PathBuf::from(env_or("FORMDROP_UPLOAD_DIR", "uploads"));

        let limits = UploadLimits {
            max_file_size: parse_var(
                "FORMDROP_MAX_FILE_SIZE",
                &env_or("FORMDROP_MAX_FILE_SIZE", "5242880"),
            )?,
            max_files: parse_var("FORMDROP_MAX_FILES", &env_or("FORMDROP_MAX_FILES", "10"))?,
        };
        if limits.max_files == 0 {
            return Err("Invalid FORMDROP_MAX_FILES: must be at least 1".to_string());
        }

        let max_body_size: usize = parse_var(
            "FORMDROP_MAX_BODY_SIZE",
            &env_or("FORMDROP_MAX_BODY_SIZE", "10485760"),
        )?;

        let rate_limit = RateLimitConfig {
            max_requests: parse_var("FORMDROP_RATE_LIMIT", &env_or("FORMDROP_RATE_LIMIT", "100"))?,
            window: Duration::from_secs(parse_var(
                "FORMDROP_RATE_LIMIT_WINDOW_SECS",
                &env_or("FORMDROP_RATE_LIMIT_WINDOW_SECS", "900"),
            )?),
        };

        let request_timeout = Duration::from_secs(parse_var(
            "FORMDROP_REQUEST_TIMEOUT_SECS",
            &env_or("FORMDROP_REQUEST_TIMEOUT_SECS", "30"),
        )?);

        let db_connect_timeout = Duration::from_secs(parse_var(
            "FORMDROP_DB_CONNECT_TIMEOUT_SECS",
            &env_or("FORMDROP_DB_CONNECT_TIMEOUT_SECS", "10"),
        )?);

        let cors_origins: Vec<String> = env_or("FORMDROP_CORS_ORIGINS", "")
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        let trusted_proxies: Vec<IpNet> = env_or("FORMDROP_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid FORMDROP_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("FORMDROP_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            host,
            port,
            upload_dir,
            limits,
            max_body_size,
            rate_limit,
            request_timeout,
            db_connect_timeout,
            cors_origins,
            trusted_proxies,
            log_level,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| format!("Invalid {key}: {e}"))
}
