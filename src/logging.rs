//! Structured logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.level` when it is set. Fails if a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::Logging { message: e.to_string() })
}

fn filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Logging { message: format!("invalid level `{}`: {e}", config.level) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_builds_a_filter() {
        let config = LoggingConfig { level: "branch=debug,info".to_owned(), json: false };

        assert!(filter(&config).is_ok());
    }
}
