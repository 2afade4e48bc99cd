use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Configuration
// ============================================================================
//
// Everything comes from environment variables (optionally seeded from a
// `.env` file). Unset variables fall back to defaults; set-but-invalid
// values fail startup.
//
// ============================================================================

/// Fallback signing secret, only accepted with the in-memory backend
const DEV_JWT_SECRET: &str = "commerce-dev-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Scylla,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "scylla" => Ok(StorageBackend::Scylla),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("expected `scylla` or `memory`, got `{}`", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub orders: OrdersConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prometheus `/metrics` and `/health` listener
    pub metrics_port: u16,
    /// Deadline applied to every API request
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub scylla_nodes: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u32,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct OrdersConfig {
    pub public_listing: bool,
    pub conflict_max_attempts: u32,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let backend: StorageBackend = env.parse_or("STORAGE_BACKEND", StorageBackend::Scylla)?;

        let jwt_secret = match (env.get("JWT_SECRET"), backend) {
            (Some(secret), _) => secret,
            (None, StorageBackend::Memory) => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            (None, StorageBackend::Scylla) => bail!("JWT_SECRET must be set"),
        };

        let scylla_nodes: Vec<String> = env
            .get("SCYLLA_NODES")
            .unwrap_or_else(|| "127.0.0.1:9042".to_string())
            .split(',')
            .map(|node| node.trim().to_string())
            .filter(|node| !node.is_empty())
            .collect();
        if scylla_nodes.is_empty() {
            bail!("SCYLLA_NODES must name at least one node");
        }

        let conflict_max_attempts: u32 = env.parse_or("CONFLICT_MAX_ATTEMPTS", 8)?;
        if conflict_max_attempts == 0 {
            bail!("CONFLICT_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            server: ServerConfig {
                host: env.get("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: env.parse_or("HTTP_PORT", 3000)?,
                metrics_port: env.parse_or("METRICS_PORT", 9090)?,
                request_timeout: Duration::from_millis(env.parse_or("REQUEST_TIMEOUT_MS", 5_000)?),
            },
            storage: StorageConfig {
                backend,
                scylla_nodes,
                keyspace: env.get("SCYLLA_KEYSPACE").unwrap_or_else(|| "commerce".to_string()),
                replication_factor: env.parse_or("SCYLLA_REPLICATION_FACTOR", 1)?,
            },
            auth: AuthConfig {
                jwt_secret,
                token_ttl: Duration::from_secs(env.parse_or("TOKEN_TTL_SECS", 900)?),
            },
            orders: OrdersConfig {
                public_listing: env.parse_or("PUBLIC_ORDER_LISTING", false)?,
                conflict_max_attempts,
            },
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Set and non-blank
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.metrics_port, 9090);
        assert_eq!(config.server.request_timeout, Duration::from_secs(5));
        assert_eq!(config.storage.backend, StorageBackend::Scylla);
        assert_eq!(config.storage.scylla_nodes, vec!["127.0.0.1:9042"]);
        assert_eq!(config.storage.keyspace, "commerce");
        assert_eq!(config.auth.token_ttl, Duration::from_secs(900));
        assert!(!config.orders.public_listing);
        assert_eq!(config.orders.conflict_max_attempts, 8);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("JWT_SECRET", "s3cret"),
            ("HTTP_PORT", "8080"),
            ("STORAGE_BACKEND", "Memory"),
            ("SCYLLA_NODES", "10.0.0.1:9042, 10.0.0.2:9042"),
            ("PUBLIC_ORDER_LISTING", "true"),
            ("REQUEST_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.scylla_nodes.len(), 2);
        assert!(config.orders.public_listing);
        assert_eq!(config.server.request_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config(&[("JWT_SECRET", "s"), ("HTTP_PORT", "eighty")]).is_err());
        assert!(config(&[("JWT_SECRET", "s"), ("STORAGE_BACKEND", "postgres")]).is_err());
        assert!(config(&[("JWT_SECRET", "s"), ("CONFLICT_MAX_ATTEMPTS", "0")]).is_err());
        assert!(config(&[("JWT_SECRET", "s"), ("PUBLIC_ORDER_LISTING", "yes")]).is_err());
        assert!(config(&[("JWT_SECRET", "s"), ("SCYLLA_NODES", " , ")]).is_err());
    }

    #[test]
    fn test_jwt_secret_required_outside_memory_backend() {
        assert!(config(&[]).is_err());

        let config = config(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.auth.jwt_secret, DEV_JWT_SECRET);
        assert!(!format!("{:?}", config.auth).contains(DEV_JWT_SECRET));
    }
}
