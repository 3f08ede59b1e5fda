//! Configuration management for the realm core.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identity store configuration.
    pub store: StoreConfig,
    /// Password hashing configuration.
    pub password: PasswordHashingConfig,
    /// Defaults applied to newly created realms.
    pub realm: RealmDefaults,
}

/// Identity store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Embedded in-memory store.
    #[default]
    Memory,
    /// `PostgreSQL` via `SQLx`.
    Postgres,
}

impl std::str::FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(Error::Config(format!("unknown store backend '{other}'"))),
        }
    }
}

/// Identity store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use.
    pub backend: StoreBackend,
    /// Database connection URL (ignored by the memory backend).
    pub url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    pub min_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: "postgres://localhost/keycloak".to_string(),
            max_connections: 10,
            min_connections: 1,
        }
    }
}

/// Argon2id cost parameters for secret credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHashingConfig {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length in bytes.
    pub hash_length: u32,
}

impl Default for PasswordHashingConfig {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }
}

/// Settings every new realm starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmDefaults {
    /// Access code lifespan in seconds.
    pub access_code_lifespan: i32,
    /// Token lifespan in seconds.
    pub token_lifespan: i32,
}

impl Default for RealmDefaults {
    fn default() -> Self {
        Self {
            access_code_lifespan: 60, // 1 minute
            token_lifespan: 300,      // 5 minutes
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory or its parents is read first;
    /// variables already set in the process take precedence over it. Unset
    /// or unparsable numeric variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `KC_STORE` names an unknown backend or a
    /// realm lifespan is negative.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        match dotenvy::dotenv() {
            Err(err) if !err.not_found() => {
                tracing::warn!(error = %err, "Ignoring unreadable .env file");
            }
            _ => {}
        }

        let defaults = Self::default();

        let backend = match std::env::var("KC_STORE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.store.backend,
        };

        let store = StoreConfig {
            backend,
            url: std::env::var("KC_DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .unwrap_or(defaults.store.url),
            max_connections: env_or("KC_DB_MAX_CONNECTIONS", defaults.store.max_connections),
            min_connections: env_or("KC_DB_MIN_CONNECTIONS", defaults.store.min_connections),
        };

        let password = PasswordHashingConfig {
            memory_cost: env_or("KC_PASSWORD_MEMORY_KIB", defaults.password.memory_cost),
            time_cost: env_or("KC_PASSWORD_ITERATIONS", defaults.password.time_cost),
            parallelism: env_or("KC_PASSWORD_PARALLELISM", defaults.password.parallelism),
            hash_length: defaults.password.hash_length,
        };

        let realm = RealmDefaults {
            access_code_lifespan: env_or(
                "KC_REALM_ACCESS_CODE_LIFESPAN",
                defaults.realm.access_code_lifespan,
            ),
            token_lifespan: env_or("KC_REALM_TOKEN_LIFESPAN", defaults.realm.token_lifespan),
        };

        let config = Self {
            store,
            password,
            realm,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants the rest of the workspace relies on.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        if self.realm.access_code_lifespan < 0 || self.realm.token_lifespan < 0 {
            return Err(Error::Config(
                "realm lifespans must be non-negative".to_string(),
            ));
        }
        if self.store.min_connections > self.store.max_connections {
            return Err(Error::Config(
                "min_connections exceeds max_connections".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
