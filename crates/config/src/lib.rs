use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub jwt: JwtSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub backend: StorageBackend,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            name: "burrow".to_string(),
            backend: StorageBackend::Mongo,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl_secs: u64,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            issuer: "burrow".to_string(),
            audience: "burrow".to_string(),
            // one day
            access_token_ttl_secs: 86_400,
        }
    }
}

/// Chat history paging and message bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub page_size: u64,
    pub message_min_len: usize,
    pub message_max_len: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            message_min_len: 1,
            message_max_len: 512,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            database: DatabaseSettings::default(),
            jwt: JwtSettings::default(),
            chat: ChatSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Layers `config/default`, `config/{BURROW_ENV}` and `BURROW__*`
    /// environment variables, in that order.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("BURROW_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                Environment::with_prefix("BURROW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}
