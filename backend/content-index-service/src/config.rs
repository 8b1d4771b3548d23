/// Configuration management for the content index service
///
/// All settings come from environment variables. Defaults target local
/// development; production refuses to start on unsafe values.
use content_index::IndexConfig;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Index store configuration
    pub store: StoreConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Index behaviour handed to the core
    pub index: IndexConfig,
    /// Base URL the navigation widget calls back to
    pub api_url: String,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    /// Process-local; only valid for a single instance
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Redis URL
    pub redis_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// RS256 public key used to validate bearer tokens
    pub jwt_public_key_pem: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let host = std::env::var("CONTENT_INDEX_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("CONTENT_INDEX_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8090);

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if is_production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if is_production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let store = {
            let backend = match std::env::var("CONTENT_INDEX_STORE")
                .unwrap_or_else(|_| "redis".to_string())
                .to_ascii_lowercase()
                .as_str()
            {
                "redis" => StoreBackend::Redis,
                "memory" => StoreBackend::Memory,
                other => return Err(format!("Unknown CONTENT_INDEX_STORE '{}'", other)),
            };

            if is_production && backend == StoreBackend::Memory {
                return Err("CONTENT_INDEX_STORE=memory is not allowed in production".to_string());
            }

            StoreConfig {
                backend,
                redis_url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            }
        };

        let auth = AuthConfig {
            jwt_public_key_pem: std::env::var("JWT_PUBLIC_KEY_PEM")
                .ok()
                .filter(|pem| !pem.trim().is_empty()),
        };
        if is_production && auth.jwt_public_key_pem.is_none() {
            return Err("JWT_PUBLIC_KEY_PEM must be set in production".to_string());
        }

        let index = load_index_config()?;

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host,
                port,
            },
            cors,
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/content".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            store,
            auth,
            index,
            api_url: std::env::var("CONTENT_INDEX_API_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/api/v1/content-index/", port)),
        })
    }
}

fn load_index_config() -> Result<IndexConfig, String> {
    let mut index = IndexConfig::default();

    if let Ok(raw) = std::env::var("CONTENT_INDEX_RESULTS_LIMIT") {
        index.results_limit = raw
            .parse()
            .map_err(|e| format!("Failed to parse CONTENT_INDEX_RESULTS_LIMIT='{}': {}", raw, e))?;
    }
    if let Ok(raw) = std::env::var("CONTENT_INDEX_SHORTCUTS") {
        index = index.with_shortcuts_json(&raw).map_err(|e| e.to_string())?;
    }
    if let Ok(status) = std::env::var("CONTENT_INDEX_PLACEHOLDER_STATUS") {
        index.placeholder_status = status;
    }
    if let Ok(template) = std::env::var("CONTENT_INDEX_EDIT_URL_TEMPLATE") {
        index.edit_url_template = template;
    }

    index.validate().map_err(|e| e.to_string())?;
    Ok(index)
}
