use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Signing secret used when the operator supplies none. Local development only.
pub const DEVELOPMENT_JWT_SECRET: &str = "dev_secret_change_in_production";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub companion: CompanionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompanionConfig {
    pub sync_url: String,
    pub timeout_ms: u64,
}

impl CompanionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Legacy variables (JWT_SECRET, DB_PATH, AUTH_PORT)
    /// 2. Prefixed environment variables (IDENTITY__JWT__SECRET, IDENTITY__DATABASE__URL, etc.)
    /// 3. Environment-specific config file (config/{environment}.toml)
    /// 4. Default config file (config/default.toml)
    /// 5. Built-in development defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`Config::load`], reading the legacy variables through `lookup`.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let run_mode = lookup("RUN_MODE").unwrap_or_else(|| "development".to_string());
        let database_url = lookup("DB_PATH").map(|path| sqlite_url(&path));

        let configuration = ConfigBuilder::builder()
            .set_default("database.url", sqlite_url("./auth.db"))?
            .set_default("server.http_port", 8085)?
            .set_default("jwt.secret", DEVELOPMENT_JWT_SECRET)?
            .set_default("companion.sync_url", "http://localhost:8000/api/sync")?
            .set_default("companion.timeout_ms", 2000)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: IDENTITY__DATABASE__URL=sqlite://... overrides database.url
            .add_source(Environment::with_prefix("IDENTITY").separator("__"))
            .set_override_option("jwt.secret", lookup("JWT_SECRET"))?
            .set_override_option("database.url", database_url)?
            .set_override_option("server.http_port", lookup("AUTH_PORT"))?
            .build()?;

        configuration.try_deserialize()
    }

    /// Whether the built-in, publicly known signing secret is in effect.
    pub fn uses_development_secret(&self) -> bool {
        self.jwt.secret == DEVELOPMENT_JWT_SECRET
    }
}

fn sqlite_url(path: &str) -> String {
    format!("sqlite://{}?mode=rwc", path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_with(lookup_from(&[])).expect("Failed to load config");

        assert_eq!(config.server.http_port, 8085);
        assert_eq!(config.jwt.secret, DEVELOPMENT_JWT_SECRET);
        assert!(config.uses_development_secret());
        assert_eq!(config.companion.sync_url, "http://localhost:8000/api/sync");
        assert_eq!(config.companion.timeout(), Duration::from_millis(2000));
        assert!(config.database.url.starts_with("sqlite://"));
    }

    #[test]
    fn test_legacy_variables_override() {
        let config = Config::load_with(lookup_from(&[
            ("JWT_SECRET", "operator-supplied-secret"),
            ("DB_PATH", "/var/lib/identity/auth.db"),
            ("AUTH_PORT", "9090"),
        ]))
        .expect("Failed to load config");

        assert_eq!(config.jwt.secret, "operator-supplied-secret");
        assert!(!config.uses_development_secret());
        assert_eq!(
            config.database.url,
            "sqlite:///var/lib/identity/auth.db?mode=rwc"
        );
        assert_eq!(config.server.http_port, 9090);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig {
            secret: "super-secret".to_string(),
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
    }
}
