// galleria-market/src/config.rs

use crate::errors::{MarketError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = MarketError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(MarketError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  /// Required when `store_backend` is `Postgres`.
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub run_migrations: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_var("SERVER_PORT", &get_or("SERVER_PORT", "8080"))?;
    let store_backend: StoreBackend = get_or("STORE_BACKEND", "postgres").parse()?;
    let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
    let db_max_connections: u32 = parse_var("DB_MAX_CONNECTIONS", &get_or("DB_MAX_CONNECTIONS", "10"))?;
    let run_migrations = parse_var("RUN_MIGRATIONS", &get_or("RUN_MIGRATIONS", "true"))?;

    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(MarketError::Config(
        "Missing environment variable 'DATABASE_URL' (required for the postgres store)".to_string(),
      ));
    }
    if db_max_connections == 0 {
      return Err(MarketError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
    }

    tracing::info!(?store_backend, %server_host, server_port, "Application configuration loaded.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      db_max_connections,
      run_migrations,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| MarketError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| vars.get(name).cloned()
  }

  #[test]
  fn memory_backend_needs_no_database_url() {
    let config = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory")])).unwrap();
    assert_eq!(config.store_backend, StoreBackend::Memory);
    assert_eq!(config.bind_address(), "127.0.0.1:8080");
    assert_eq!(config.db_max_connections, 10);
    assert!(config.run_migrations);
  }

  #[test]
  fn postgres_backend_requires_database_url() {
    let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
    assert!(matches!(err, MarketError::Config(ref m) if m.contains("DATABASE_URL")));
  }

  #[test]
  fn invalid_values_are_config_errors() {
    let err = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory"), ("SERVER_PORT", "http")]))
      .unwrap_err();
    assert!(matches!(err, MarketError::Config(ref m) if m.contains("SERVER_PORT")));

    let err = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "redis")])).unwrap_err();
    assert!(matches!(err, MarketError::Config(ref m) if m.contains("redis")));

    let err = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory"), ("RUN_MIGRATIONS", "maybe")]))
      .unwrap_err();
    assert!(matches!(err, MarketError::Config(_)));
  }

  #[test]
  fn explicit_values_override_defaults() {
    let config = AppConfig::from_lookup(lookup_from(&[
      ("SERVER_HOST", "0.0.0.0"),
      ("SERVER_PORT", "9000"),
      ("DATABASE_URL", "postgres://localhost/galleria"),
      ("DB_MAX_CONNECTIONS", "4"),
      ("RUN_MIGRATIONS", "false"),
    ]))
    .unwrap();
    assert_eq!(config.store_backend, StoreBackend::Postgres);
    assert_eq!(config.bind_address(), "0.0.0.0:9000");
    assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/galleria"));
    assert_eq!(config.db_max_connections, 4);
    assert!(!config.run_migrations);
  }

  #[test]
  #[serial]
  fn from_env_reads_the_process_environment() {
    env::set_var("STORE_BACKEND", "memory");
    env::set_var("SERVER_PORT", "9191");
    let config = AppConfig::from_env();
    env::remove_var("STORE_BACKEND");
    env::remove_var("SERVER_PORT");

    let config = config.unwrap();
    assert_eq!(config.store_backend, StoreBackend::Memory);
    assert_eq!(config.server_port, 9191);
  }
}
