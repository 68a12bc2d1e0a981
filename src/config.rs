//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which order store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Which message stream feeds the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamBackend {
    /// NATS JetStream broker
    Nats,
    /// In-process topic; only orders created through the API are ingested
    Memory,
}

impl FromStr for StreamBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nats" | "jetstream" => Ok(StreamBackend::Nats),
            "memory" | "mem" => Ok(StreamBackend::Memory),
            other => Err(format!("unknown stream backend: {other}")),
        }
    }
}

/// PostgreSQL connection parameters.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// Maximum pool size
    pub pool_size: usize,
    /// Connection attempts before giving up at startup
    pub retries: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "orders_db".to_string(),
            pool_size: 16,
            retries: 3,
        }
    }
}

/// Message stream parameters.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub backend: StreamBackend,
    /// Subject orders are published to and consumed from
    pub topic: String,
    /// NATS server URL
    pub nats_url: String,
    /// JetStream stream holding the topic
    pub stream_name: String,
    /// Durable consumer name; restarts resume from its last ack
    pub consumer_name: String,
    /// In-process topic capacity (memory backend only)
    pub buffer: usize,
    /// How long the consumer waits for a message before re-checking for
    /// shutdown, and how long it backs off after a failed save
    pub poll_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            backend: StreamBackend::Nats,
            topic: "orders".to_string(),
            nats_url: "nats://localhost:4222".to_string(),
            stream_name: "ORDERS".to_string(),
            consumer_name: "order-tracker".to_string(),
            buffer: 1024,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Number of orders held by the recency cache
    pub cache_size: usize,
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Order store implementation
    pub store_backend: StoreBackend,
    /// Time given to in-flight HTTP requests on shutdown
    pub shutdown_grace: Duration,
    pub db: DbConfig,
    pub stream: StreamConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HTTP_PORT` - HTTP server port (default: 8000)
    /// - `CACHE_SIZE` - Recency cache capacity (default: 100)
    /// - `LOG_LEVEL` - Fallback log level (default: info)
    /// - `STORE_BACKEND` - `postgres` or `memory` (default: postgres)
    /// - `SHUTDOWN_GRACE_SECS` - Shutdown grace period (default: 5)
    /// - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`,
    ///   `DB_POOL_SIZE`, `DB_CONNECTION_RETRIES`
    /// - `STREAM_BACKEND` - `nats` or `memory` (default: nats)
    /// - `NATS_URL` - Broker URL (default: nats://localhost:4222)
    /// - `STREAM_TOPIC`, `STREAM_NAME`, `STREAM_CONSUMER`, `STREAM_BUFFER`,
    ///   `STREAM_POLL_INTERVAL_MS`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            http_port: parse_var("HTTP_PORT").unwrap_or(defaults.http_port),
            cache_size: parse_var("CACHE_SIZE").unwrap_or(defaults.cache_size),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            store_backend: parse_var("STORE_BACKEND").unwrap_or(defaults.store_backend),
            shutdown_grace: parse_var("SHUTDOWN_GRACE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_grace),
            db: DbConfig {
                host: env::var("DB_HOST").unwrap_or(defaults.db.host),
                port: parse_var("DB_PORT").unwrap_or(defaults.db.port),
                user: env::var("DB_USER").unwrap_or(defaults.db.user),
                password: env::var("DB_PASSWORD").unwrap_or(defaults.db.password),
                name: env::var("DB_NAME").unwrap_or(defaults.db.name),
                pool_size: parse_var("DB_POOL_SIZE").unwrap_or(defaults.db.pool_size),
                retries: parse_var("DB_CONNECTION_RETRIES").unwrap_or(defaults.db.retries),
            },
            stream: StreamConfig {
                backend: parse_var("STREAM_BACKEND").unwrap_or(defaults.stream.backend),
                topic: env::var("STREAM_TOPIC").unwrap_or(defaults.stream.topic),
                nats_url: env::var("NATS_URL").unwrap_or(defaults.stream.nats_url),
                stream_name: env::var("STREAM_NAME").unwrap_or(defaults.stream.stream_name),
                consumer_name: env::var("STREAM_CONSUMER")
                    .unwrap_or(defaults.stream.consumer_name),
                buffer: parse_var("STREAM_BUFFER").unwrap_or(defaults.stream.buffer),
                poll_interval: parse_var("STREAM_POLL_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.stream.poll_interval),
            },
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8000,
            cache_size: 100,
            log_level: "info".to_string(),
            store_backend: StoreBackend::Postgres,
            shutdown_grace: Duration::from_secs(5),
            db: DbConfig::default(),
            stream: StreamConfig::default(),
        }
    }
}
