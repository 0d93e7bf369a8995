//! Configuration module for the helpdesk backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! Only `JWT_SECRET` is mandatory.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/helpdesk.sqlite";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MIN_JWT_SECRET_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Credentials and location of the S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Base URL objects are publicly reachable under (without trailing slash)
    pub public_url: String,
}

/// Gemini assistant settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// HMAC secret for signing JWTs
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_ttl_hours: i64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Directory for local file storage (used when S3 is not configured)
    pub upload_dir: PathBuf,
    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    pub gemini: Option<GeminiConfig>,
    pub s3: Option<S3Config>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = database_path(
            &env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
        );

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
            });
        }

        let jwt_ttl_hours: i64 = parse_var("JWT_TTL_HOURS", 8)?;
        if jwt_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_TTL_HOURS",
                reason: "must be positive".to_string(),
            });
        }

        let bcrypt_cost: u32 = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                reason: "must be between 4 and 31".to_string(),
            });
        }

        let bind_addr = parse_var("HELPDESK_BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 4000)))?;

        let index_path = env::var("HELPDESK_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let upload_dir = env::var("HELPDESK_UPLOAD_DIR")
            .unwrap_or_else(|_| "./data/uploads".to_string())
            .into();

        let max_upload_bytes = parse_var("HELPDESK_MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?;

        let log_level = env::var("HELPDESK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("HELPDESK_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let gemini = non_empty_var("GEMINI_API_KEY").map(|api_key| GeminiConfig {
            api_key,
            model: non_empty_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_base: non_empty_var("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
        });

        let s3 = s3_from_env()?;

        Ok(Self {
            db_path,
            jwt_secret,
            jwt_ttl_hours,
            bcrypt_cost,
            bind_addr,
            index_path,
            upload_dir,
            max_upload_bytes,
            log_level,
            log_format,
            gemini,
            s3,
        })
    }
}

/// Strip the optional `sqlite:` / `sqlite://` scheme and any query string.
fn database_path(url: &str) -> PathBuf {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = rest.split('?').next().unwrap_or(rest);
    PathBuf::from(path)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn s3_from_env() -> Result<Option<S3Config>, ConfigError> {
    let endpoint = non_empty_var("SUPABASE_S3_ENDPOINT");
    let access_key_id = non_empty_var("SUPABASE_S3_ACCESS_KEY_ID");
    let secret_access_key = non_empty_var("SUPABASE_S3_SECRET_ACCESS_KEY");
    let bucket = non_empty_var("SUPABASE_S3_BUCKET");

    match (endpoint, access_key_id, secret_access_key, bucket) {
        (None, None, None, None) => Ok(None),
        (Some(endpoint), Some(access_key_id), Some(secret_access_key), Some(bucket)) => {
            let endpoint = endpoint.trim_end_matches('/').to_string();
            let public_url = non_empty_var("SUPABASE_S3_PUBLIC_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("{}/{}", endpoint, bucket));
            Ok(Some(S3Config {
                endpoint,
                region: non_empty_var("SUPABASE_S3_REGION")
                    .unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id,
                secret_access_key,
                bucket,
                public_url,
            }))
        }
        _ => Err(ConfigError::Invalid {
            name: "SUPABASE_S3_*",
            reason: "endpoint, access key, secret key and bucket must be set together"
                .to_string(),
        }),
    }
}
