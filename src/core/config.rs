//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (optionally via a `.env` file) or
//! defaults.

use super::session::DEFAULT_OUTBOUND_CAPACITY;
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Tool dispatch configuration.
    pub dispatch: DispatchConfig,

    /// Per-connection limits.
    pub sessions: SessionConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,

    /// Instructions returned to clients on `initialize`.
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Configuration for tool dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-call timeout for tool handlers, in milliseconds.
    pub call_timeout_ms: u64,
}

impl DispatchConfig {
    /// The per-call timeout as a `Duration`.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Per-connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Undelivered responses a connection may hold before it is dropped.
    pub outbound_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "Echo Server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instructions: Some(
                    "Text utilities: echo, reverse, uppercase and count_words.".to_string(),
                ),
            },
            dispatch: DispatchConfig {
                call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            },
            sessions: SessionConfig {
                outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`, `MCP_TOOL_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(raw) = std::env::var("MCP_TOOL_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => config.dispatch.call_timeout_ms = ms,
                _ => warn!(
                    "Ignoring MCP_TOOL_TIMEOUT_MS={:?}; using {}ms",
                    raw, config.dispatch.call_timeout_ms
                ),
            }
        }

        if let Ok(raw) = std::env::var("MCP_OUTBOUND_CAPACITY") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => config.sessions.outbound_capacity = n,
                _ => warn!(
                    "Ignoring MCP_OUTBOUND_CAPACITY={:?}; using {}",
                    raw, config.sessions.outbound_capacity
                ),
            }
        }

        config.transport = TransportConfig::from_env();

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.name, "Echo Server");
        assert_eq!(config.dispatch.call_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_timeout_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TOOL_TIMEOUT_MS", "1500");
        }
        let config = Config::from_env();
        assert_eq!(config.dispatch.call_timeout_ms, 1500);
        unsafe {
            std::env::remove_var("MCP_TOOL_TIMEOUT_MS");
        }
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TOOL_TIMEOUT_MS", "soon");
        }
        let config = Config::from_env();
        assert_eq!(config.dispatch.call_timeout_ms, DEFAULT_CALL_TIMEOUT_MS);
        unsafe {
            std::env::remove_var("MCP_TOOL_TIMEOUT_MS");
        }
    }

    #[test]
    fn test_outbound_capacity_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_OUTBOUND_CAPACITY", "8");
        }
        let config = Config::from_env();
        assert_eq!(config.sessions.outbound_capacity, 8);
        unsafe {
            std::env::remove_var("MCP_OUTBOUND_CAPACITY");
        }
    }

    #[test]
    fn test_server_name_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_SERVER_NAME", "renamed");
        }
        let config = Config::from_env();
        assert_eq!(config.server.name, "renamed");
        unsafe {
            std::env::remove_var("MCP_SERVER_NAME");
        }
    }
}
