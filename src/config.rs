/// 환경 변수 설정
use crate::bidding::cooldown::DEFAULT_COOLDOWN_HOURS;
use crate::bidding::retry::RetryPolicy;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} 환경 변수가 필요합니다.")]
    Missing(&'static str),

    #[error("{key} 값이 올바르지 않습니다: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub status_sync_interval: Duration,
    pub cooldown_hours: i64,
    pub retry: RetryPolicy,
    pub kafka_brokers: Option<String>,
    pub kafka_topic: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let database_url = lookup("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        // tokio interval 은 0 주기를 허용하지 않는다
        let sync_secs: u64 = parse_or(&lookup, "STATUS_SYNC_INTERVAL_SECS", 1)?;
        if sync_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "STATUS_SYNC_INTERVAL_SECS",
                value: sync_secs.to_string(),
            });
        }

        Ok(Self {
            store_backend,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            status_sync_interval: Duration::from_secs(sync_secs),
            cooldown_hours: parse_or(&lookup, "COOLDOWN_HOURS", DEFAULT_COOLDOWN_HOURS)?,
            retry: RetryPolicy {
                max_attempts: parse_or(&lookup, "STORE_RETRY_ATTEMPTS", 3)?,
                base_delay: Duration::from_millis(parse_or(&lookup, "STORE_RETRY_BASE_MS", 50)?),
            },
            kafka_brokers: lookup("KAFKA_BROKERS"),
            kafka_topic: lookup("KAFKA_TOPIC").unwrap_or_else(|| "auction-events".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_database_url() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/auction")]))
                .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.cooldown_hours, 24);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.kafka_topic, "auction-events");
        assert_eq!(config.kafka_brokers, None);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert_eq!(
            AppConfig::from_lookup(lookup_from(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn test_memory_backend_and_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("COOLDOWN_HOURS", "12"),
            ("STORE_RETRY_ATTEMPTS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.cooldown_hours, 12);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]));
        assert_eq!(
            result,
            Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: "many".to_string()
            })
        );
    }

    #[test]
    fn test_zero_sync_interval_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("STATUS_SYNC_INTERVAL_SECS", "0"),
        ]));
        assert_eq!(
            result,
            Err(ConfigError::Invalid {
                key: "STATUS_SYNC_INTERVAL_SECS",
                value: "0".to_string()
            })
        );

        let config = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("STATUS_SYNC_INTERVAL_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.status_sync_interval, Duration::from_secs(5));
    }
}
