use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use utility_client::domain::UnrecognizedTypePolicy;

pub const CONFIG_PATH_VAR: &str = "UTILITY_MCP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "utility-mcp.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    /// Usually supplied through `MONGODB_URI` rather than the file.
    pub uri: Option<String>,
    /// Used when the URI names no default database.
    pub database: String,
    pub max_pool_size: u32,
    pub server_selection_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: "energy_meters_db".to_string(),
            max_pool_size: 20,
            server_selection_timeout_ms: 30_000,
            connect_timeout_ms: 30_000,
        }
    }
}

impl MongoConfig {
    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8085,
            name: "NRECA Utility MCP".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub unrecognized_customer_types: UnrecognizedTypePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub analytics: AnalyticsConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Reads `.env`, then the TOML file named by `UTILITY_MCP_CONFIG` (the
    /// default path may be absent), then applies `MONGODB_URI` and `PORT`.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let _ = dotenvy::dotenv();

        let explicit = env::var(CONFIG_PATH_VAR).ok();
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut cfg = if explicit.is_some() || Path::new(&path).exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            Self::from_toml(&contents).with_context(|| format!("parsing config file {path}"))?
        } else {
            Self::default()
        };

        cfg.apply_env(|key| env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(uri) = lookup("MONGODB_URI").filter(|v| !v.is_empty()) {
            self.mongodb.uri = Some(uri);
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.server.port = port
                .parse()
                .with_context(|| format!("invalid PORT value '{port}'"))?;
        }
        Ok(())
    }

    pub fn mongodb_uri(&self) -> anyhow::Result<&str> {
        self.mongodb
            .uri
            .as_deref()
            .context("MONGODB_URI is not set and [mongodb] uri is missing from the config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.server.port, 8085);
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:8085");
        assert_eq!(cfg.mongodb.database, "energy_meters_db");
        assert_eq!(cfg.mongodb.max_pool_size, 20);
        assert_eq!(cfg.mongodb.server_selection_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.analytics.unrecognized_customer_types, UnrecognizedTypePolicy::Include);
        assert!(cfg.metrics.is_none());
        assert!(cfg.mongodb_uri().is_err());
    }

    #[test]
    fn file_sections_override_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [mongodb]
            uri = "mongodb://db:27017/meters"
            max_pool_size = 5

            [server]
            port = 9000

            [analytics]
            unrecognized_customer_types = "exclude"

            [metrics]
            bind_addr = "127.0.0.1:9100"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.mongodb_uri().unwrap(), "mongodb://db:27017/meters");
        assert_eq!(cfg.mongodb.max_pool_size, 5);
        assert_eq!(cfg.mongodb.connect_timeout_ms, 30_000);
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.analytics.unrecognized_customer_types, UnrecognizedTypePolicy::Exclude);
        assert_eq!(cfg.metrics.unwrap().bind_addr, "127.0.0.1:9100");
    }

    #[test]
    fn environment_wins_over_file() {
        let mut cfg = AppConfig::from_toml("[server]\nport = 9000\n").unwrap();
        cfg.apply_env(env_of(&[("MONGODB_URI", "mongodb://env/x"), ("PORT", "7000")]))
            .unwrap();
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.mongodb_uri().unwrap(), "mongodb://env/x");
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut cfg = AppConfig::default();
        let err = cfg.apply_env(env_of(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn unknown_policy_value_fails_to_parse() {
        assert!(AppConfig::from_toml("[analytics]\nunrecognized_customer_types = \"drop\"\n").is_err());
    }
}
