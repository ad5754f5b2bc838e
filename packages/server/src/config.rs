use catalog_common::config::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Catalog behaviour knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Age after which a browse context is ignored. Default: 1800 (30 minutes).
    #[serde(default = "default_browse_context_ttl_secs")]
    pub browse_context_ttl_secs: i64,
    /// Files accepted per image upload request. Default: 10.
    #[serde(default = "default_max_images_per_upload")]
    pub max_images_per_upload: usize,
    /// Files accepted per document upload request. Default: 5.
    #[serde(default = "default_max_documents_per_upload")]
    pub max_documents_per_upload: usize,
}

fn default_browse_context_ttl_secs() -> i64 {
    30 * 60
}
fn default_max_images_per_upload() -> usize {
    10
}
fn default_max_documents_per_upload() -> usize {
    5
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            browse_context_ttl_secs: default_browse_context_ttl_secs(),
            max_images_per_upload: default_max_images_per_upload(),
            max_documents_per_upload: default_max_documents_per_upload(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., CATALOG__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("CATALOG").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
