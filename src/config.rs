use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub omdb: OmdbSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Path of the SQLite database file.
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSettings {
    #[serde(default = "default_omdb_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_omdb_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "movieweb.db".to_string()
}

const fn default_max_connections() -> u32 {
    8
}

const fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_omdb_base_url() -> String {
    "http://www.omdbapi.com".to_string()
}

const fn default_omdb_timeout_secs() -> u64 {
    10
}

impl Settings {
    /// Layers `config/default.toml` (optional) under `MOVIEWEB__*` environment
    /// variables, e.g. `MOVIEWEB__OMDB__API_KEY`.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("MOVIEWEB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let settings: Settings = config::Config::builder()
            .set_override("omdb.api_key", "abc")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.url, "movieweb.db");
        assert_eq!(settings.omdb.api_key, "abc");
        assert_eq!(settings.omdb.timeout_secs, 10);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let result = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize::<Settings>();

        assert!(result.is_err());
    }
}
