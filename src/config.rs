use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

/// Database connection settings. The effective password comes from
/// `password_file` when that file is readable, otherwise `password`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub name: String,
    pub user: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub password_file: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            name: "orphansweep".to_string(),
            user: "root".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            password: "password".to_string(),
            password_file: String::new(),
        }
    }
}

/// Immutable application configuration, built once at startup and passed
/// by reference into every component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base directory that hosts the UUID named file tree.
    pub base_path: String,
    pub database: DbConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_path: "./data".to_string(),
            database: DbConfig::default(),
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("ORPHANSWEEP").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let builder = Config::builder().build().unwrap();
        let config: AppConfig = builder.try_deserialize().unwrap();
        assert_eq!(config.base_path, "./data");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.database.user, "root");
        assert!(config.database.password_file.is_empty());
    }
}
