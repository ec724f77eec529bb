use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub kv: KvConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Apply the items and kv schema at startup.
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KvBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvConfig {
    pub backend: KvBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Origins echoed back in `Access-Control-Allow-Origin`.
    pub cors_origins: Vec<String>,
    /// Answer `*` for origins not in the list.
    pub cors_allow_any: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT").or_else(|| lookup("EDGE_API_PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_AUTO_MIGRATE") {
            self.database.auto_migrate = v.parse().unwrap_or(self.database.auto_migrate);
        }

        // KV overrides
        match lookup("KV_BACKEND").as_deref() {
            Some("memory") => self.kv.backend = KvBackend::Memory,
            Some("sqlite") => self.kv.backend = KvBackend::Sqlite,
            _ => {}
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("SECURITY_CORS_ALLOW_ANY") {
            self.security.cors_allow_any = v.parse().unwrap_or(self.security.cors_allow_any);
        }

        self
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8787,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 5,
                auto_migrate: true,
            },
            kv: KvConfig {
                backend: KvBackend::Memory,
            },
            security: SecurityConfig {
                cors_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:8787".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                    "http://127.0.0.1:8787".to_string(),
                ],
                cors_allow_any: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8787,
            },
            database: DatabaseConfig {
                url: "sqlite://data/edge-api.db?mode=rwc".to_string(),
                max_connections: 10,
                auto_migrate: true,
            },
            kv: KvConfig {
                backend: KvBackend::Sqlite,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.story-forge.your-domain.com".to_string()],
                cors_allow_any: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8787,
            },
            database: DatabaseConfig {
                url: "sqlite://data/edge-api.db?mode=rwc".to_string(),
                max_connections: 20,
                auto_migrate: false,
            },
            kv: KvConfig {
                backend: KvBackend::Sqlite,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://story-forge.your-domain.com".to_string()],
                cors_allow_any: false,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
