//! Runtime configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `STOREFRONT_*` environment variables. The binary applies CLI flags last.

mod server;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

pub use server::ServerConfig;

use crate::error::{Error, Result};

const DEFAULT_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    /// Bearer token for the admin surface. Without one, admin routes reject every request.
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/storefront.db"),
            timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// Redis when `cache.url` is set, pass-through otherwise.
    #[default]
    Auto,
    None,
    Memory,
    Redis,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_ms: u64,
    /// Entry limit for the memory backend.
    pub capacity: usize,
    pub ttl: CacheTtl,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Auto,
            url: None,
            token: None,
            timeout_ms: 250,
            capacity: 10_000,
            ttl: CacheTtl::default(),
        }
    }
}

impl CacheConfig {
    /// The backend actually used once `Auto` is resolved.
    pub fn effective_backend(&self) -> CacheBackendKind {
        match (self.backend, &self.url) {
            (CacheBackendKind::Auto, Some(_)) => CacheBackendKind::Redis,
            (CacheBackendKind::Auto, None) => CacheBackendKind::None,
            (kind, _) => kind,
        }
    }
}

/// Default TTL per cache namespace, in seconds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CacheTtl {
    pub product: u64,
    pub collection: u64,
    pub all: u64,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            product: DEFAULT_TTL_SECS,
            collection: DEFAULT_TTL_SECS,
            all: DEFAULT_TTL_SECS,
        }
    }
}

impl CacheTtl {
    pub fn product(&self) -> Duration {
        Duration::from_secs(self.product)
    }

    pub fn collection(&self) -> Duration {
        Duration::from_secs(self.collection)
    }

    pub fn all(&self) -> Duration {
        Duration::from_secs(self.all)
    }
}

impl Config {
    /// Loads the file at `path` (if any), then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Overrides fields from `STOREFRONT_*` variables resolved through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("STOREFRONT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("STOREFRONT_PORT") {
            self.server.port = parse_var("STOREFRONT_PORT", &port)?;
        }
        if let Some(path) = lookup("STOREFRONT_DATABASE") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(ms) = lookup("STOREFRONT_STORE_TIMEOUT_MS") {
            self.store.timeout_ms = parse_var("STOREFRONT_STORE_TIMEOUT_MS", &ms)?;
        }
        if let Some(kind) = lookup("STOREFRONT_CACHE_BACKEND") {
            self.cache.backend = kind.parse().map_err(Error::Config)?;
        }
        if let Some(url) = lookup("STOREFRONT_CACHE_URL") {
            self.cache.url = Some(url);
        }
        if let Some(token) = lookup("STOREFRONT_CACHE_TOKEN") {
            self.cache.token = Some(token);
        }
        if let Some(ms) = lookup("STOREFRONT_CACHE_TIMEOUT_MS") {
            self.cache.timeout_ms = parse_var("STOREFRONT_CACHE_TIMEOUT_MS", &ms)?;
        }
        if let Some(token) = lookup("STOREFRONT_ADMIN_TOKEN") {
            self.admin_token = Some(token);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let ttl = &self.cache.ttl;
        if ttl.product == 0 || ttl.collection == 0 || ttl.all == 0 {
            return Err(Error::Config("cache TTLs must be at least 1 second".to_string()));
        }
        if self.store.timeout_ms == 0 {
            return Err(Error::Config("store.timeout_ms must be positive".to_string()));
        }
        if self.cache.backend == CacheBackendKind::Redis && self.cache.url.is_none() {
            return Err(Error::Config(
                "cache.backend = \"redis\" requires cache.url".to_string(),
            ));
        }
        if matches!(self.admin_token.as_deref(), Some("")) {
            return Err(Error::Config("admin_token cannot be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} has an invalid value '{value}'")))
}
