//! Runtime configuration: defaults, then an optional TOML file, then environment.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    errors::RepoError,
    media::{CloudinaryConfig, CloudinaryMediaStore, LocalMediaStore, MediaError, MediaStore},
    store::{DocumentStore, MemoryStore, RedisStore},
};

/// Environment variable naming the optional TOML file.
pub const CONFIG_PATH_VAR: &str = "LAGERFIELD_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: `{value}`")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub media: MediaSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_service")]
    pub service: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: default_redis_url(),
            prefix: default_prefix(),
            service: default_service(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_prefix() -> String {
    "lagerfield".to_string()
}

fn default_service() -> String {
    "content".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

pub const DEVELOPMENT_JWT_SECRET: &str = "lagerfield-development-secret";

fn default_jwt_secret() -> String {
    DEVELOPMENT_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    #[default]
    Local,
    Cloudinary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSettings {
    #[serde(default)]
    pub backend: MediaBackend,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default)]
    pub cloud_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_folder_root")]
    pub folder_root: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            backend: MediaBackend::default(),
            upload_dir: default_upload_dir(),
            cloud_name: None,
            api_key: None,
            api_secret: None,
            api_base: None,
            folder_root: default_folder_root(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_folder_root() -> String {
    "lagerfield".to_string()
}

impl AppConfig {
    /// Load from `path` (or `LAGERFIELD_CONFIG`) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_PATH_VAR).map(PathBuf::from));
        let mut config = match file {
            Some(file) => Self::from_file(&file)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = var("REDIS_URL") {
            self.store.redis_url = value;
        }
        if let Some(value) = var("LAGERFIELD_PREFIX") {
            self.store.prefix = value;
        }
        if let Some(value) = var("STORE_BACKEND") {
            self.store.backend = match value.to_ascii_lowercase().as_str() {
                "redis" => StoreBackend::Redis,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::InvalidValue { key: "STORE_BACKEND", value }),
            };
        }
        if let Some(value) = var("PORT") {
            self.server.port = parse("PORT", value)?;
        }
        if let Some(value) = var("BIND_ADDR") {
            self.server.bind_addr = value;
        }
        if let Some(value) = var("CORS_ORIGIN") {
            self.server.cors_origin = value;
        }
        if let Some(value) = var("MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = parse("MAX_UPLOAD_BYTES", value)?;
        }
        if let Some(value) = var("JWT_SECRET") {
            self.auth.jwt_secret = value;
        }
        if let Some(value) = var("TOKEN_TTL_HOURS") {
            self.auth.token_ttl_hours = parse("TOKEN_TTL_HOURS", value)?;
        }
        if let Some(value) = var("BCRYPT_COST") {
            self.auth.bcrypt_cost = parse("BCRYPT_COST", value)?;
        }
        if let Some(value) = var("MEDIA_BACKEND") {
            self.media.backend = match value.to_ascii_lowercase().as_str() {
                "local" => MediaBackend::Local,
                "cloudinary" => MediaBackend::Cloudinary,
                _ => return Err(ConfigError::InvalidValue { key: "MEDIA_BACKEND", value }),
            };
        }
        if let Some(value) = var("UPLOAD_DIR") {
            self.media.upload_dir = PathBuf::from(value);
        }
        if let Some(value) = var("CLOUDINARY_CLOUD_NAME") {
            self.media.cloud_name = Some(value);
        }
        if let Some(value) = var("CLOUDINARY_API_KEY") {
            self.media.api_key = Some(value);
        }
        if let Some(value) = var("CLOUDINARY_API_SECRET") {
            self.media.api_secret = Some(value);
        }
        if let Some(value) = var("CLOUDINARY_API_BASE") {
            self.media.api_base = Some(value);
        }
        if let Some(value) = var("CLOUD_FOLDER_ROOT") {
            self.media.folder_root = value;
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.server.bind_addr, self.server.port);
        raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "BIND_ADDR",
            value: raw,
        })
    }

    /// Connect the configured document store.
    pub async fn connect_store(&self) -> Result<Arc<dyn DocumentStore>, RepoError> {
        match self.store.backend {
            StoreBackend::Redis => {
                let store = RedisStore::connect(&self.store.redis_url, &self.store.prefix, &self.store.service).await?;
                Ok(Arc::new(store))
            }
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        }
    }

    pub fn cloudinary(&self) -> Result<CloudinaryConfig, MediaError> {
        CloudinaryConfig::from_parts(
            self.media.cloud_name.clone(),
            self.media.api_key.clone(),
            self.media.api_secret.clone(),
            self.media.api_base.clone(),
        )
    }

    /// Media store used by HTTP uploads.
    pub fn media_store(&self) -> Result<Arc<dyn MediaStore>, MediaError> {
        match self.media.backend {
            MediaBackend::Local => Ok(Arc::new(LocalMediaStore::new(self.media.upload_dir.clone()))),
            MediaBackend::Cloudinary => Ok(Arc::new(CloudinaryMediaStore::new(self.cloudinary()?))),
        }
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value })
}
