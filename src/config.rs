//! Application configuration.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. defaults (`AppConfig::default()` via `#[serde(default)]`)
//! 2. a TOML file, if one was given
//! 3. environment variables prefixed with `BRANCH_`, `__` separating nested
//!    keys (`BRANCH_SERVER__ADDR=127.0.0.1:8080`)

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use tracing::debug;

use crate::container::Container;
use crate::error::Result;
use crate::route::RouteSpec;
use crate::router::Router;
use crate::value::Value;

pub const DEFAULT_ENV_PREFIX: &str = "BRANCH_";

/// Request bodies larger than this are answered with `413`.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Container entries, classified like any other `set` value.
    pub definitions: BTreeMap<String, Value>,
    pub routes: Vec<RouteSpec>,
}

impl AppConfig {
    /// Stores every configured definition, replacing existing entries.
    ///
    /// Register classes first: strings naming a class are only classified as
    /// class definitions if the class is already known.
    pub fn apply_definitions(&self, container: &mut Container) {
        container.set_multiple(self.definitions.clone(), true);
    }

    pub fn router(&self) -> Result<Router> {
        Router::from_specs(self.routes.iter().cloned())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), json: false }
    }
}

/// Loads [`AppConfig`] from a file and the environment.
#[derive(Clone, Debug)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { path: None, env_prefix: DEFAULT_ENV_PREFIX.to_owned() }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new();
        if let Some(path) = &self.path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(&self.env_prefix).split("__"));

        let config: AppConfig = figment.extract()?;
        debug!(
            path = ?self.path,
            routes = config.routes.len(),
            definitions = config.definitions.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self { Self::new() }
}
