//! Runtime utilities
//!
//! This module is only used by the main binary and provides helper code
//! related to runtime configuration and logging.

mod config;
mod logging;

use std::path::Path;

pub use config::{Config, Endpoint, ListenConfig};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
pub use logging::{LogRotationKind, Logging, setup_logging};

/// Prefix for all configuration environment variables
const ENV_PREFIX: &str = "GRAPHQL_INTERCEPT_";

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// Read configuration from environment variables only (when no config file is provided)
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .extract()
}

/// Read in a config from a YAML file, filling in any missing values from the environment
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(Yaml::file(yaml_path))
        .extract()
}

#[cfg(test)]
mod test {
    use super::read_config;

    #[test]
    fn it_prioritizes_env_vars() {
        let config = r#"
            endpoint: http://from_file:4000
        "#;

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";
            let endpoint = "https://from_env:4000/";

            jail.create_file(path, config)?;
            jail.set_env("GRAPHQL_INTERCEPT_ENDPOINT", endpoint);

            let config = read_config(path)?;

            assert_eq!(config.endpoint.as_str(), endpoint);
            Ok(())
        });
    }

    #[test]
    fn it_extracts_nested_env() {
        let config = r#"
            intercept:
                path_suffix: /graphql
        "#;

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";

            jail.create_file(path, config)?;
            jail.set_env("GRAPHQL_INTERCEPT_INTERCEPT__PATH_SUFFIX", "/api/graphql");

            let config = read_config(path)?;

            assert_eq!(config.intercept.path_suffix, "/api/graphql");
            Ok(())
        });
    }

    #[test]
    fn it_merges_env_and_file() {
        let config = "
            endpoint: http://from_file:4000/
        ";

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";

            jail.create_file(path, config)?;
            jail.set_env("GRAPHQL_INTERCEPT_LISTEN__PORT", "9090");

            let config = read_config(path)?;

            assert_eq!(config.endpoint.as_str(), "http://from_file:4000/");
            assert_eq!(config.listen.port, 9090);
            Ok(())
        });
    }
}
