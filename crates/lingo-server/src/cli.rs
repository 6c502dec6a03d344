//! Command line arguments

use clap::Parser;
use lingo_config::{Config, ConfigError, ConfigLoader};
use std::path::PathBuf;

/// Localized entity service with asynchronous translation population
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path (YAML or TOML); defaults to `$LINGO_CONFIG_PATH`, then `./lingo.yaml`
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind, overrides `server.bind_address`
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Log filter, overrides `logging.level`
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Args {
    /// Loads the configuration and applies command line overrides.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = ConfigLoader::load(self.config.as_deref())?;
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        config.validate_all()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from(["lingo-server", "--bind", "0.0.0.0:9000", "-l", "debug", "--check-config"]);
        assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.check_config);
    }

    #[test]
    fn test_overrides_are_validated() {
        let dir = lingo_common::test_utils::create_temp_dir();
        let path = dir.path().join("lingo.yaml");
        std::fs::write(&path, lingo_common::test_utils::config_fixtures::minimal_config_yaml()).unwrap();

        let args = Args::parse_from(["lingo-server", "--config", path.to_str().unwrap(), "--bind", "nowhere"]);
        tokio_test::assert_err!(args.load_config());

        let args = Args::parse_from(["lingo-server", "--config", path.to_str().unwrap(), "--bind", "127.0.0.1:9100"]);
        let config = tokio_test::assert_ok!(args.load_config());
        assert_eq!(config.server.bind_address, "127.0.0.1:9100");
    }
}
