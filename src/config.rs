//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;

/// Default base URL of the chat backend serving all three outbound endpoints
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:50505";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Upstream chat completion configuration
    pub upstream: UpstreamConfig,
    /// Side-effect notifier configuration
    pub notify: NotifyConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Upstream chat completion configuration
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Streaming chat endpoint
    pub chat_url: String,
    /// Timeout for establishing the connection (in seconds)
    pub connect_timeout_secs: u64,
    /// Maximum wait for the next line of the stream (in seconds)
    pub read_timeout_secs: u64,
}

/// Side-effect notifier configuration
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Whether completed turns are reported at all
    pub enabled: bool,
    /// Chat log storage endpoint
    pub chat_log_url: String,
    /// Ticket creation endpoint
    pub ticket_url: String,
    /// Request timeout for each notification (in seconds)
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let backend_url = env::var("BACKEND_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

        Self {
            server: ServerConfig {
                port: parse_var("PORT", 8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            upstream: UpstreamConfig {
                chat_url: env::var("CHAT_STREAM_URL")
                    .unwrap_or_else(|_| format!("{}/chat/stream", backend_url)),
                connect_timeout_secs: parse_var("UPSTREAM_CONNECT_TIMEOUT_SECS", 10),
                read_timeout_secs: parse_var("UPSTREAM_READ_TIMEOUT_SECS", 120),
            },
            notify: NotifyConfig {
                enabled: parse_var("NOTIFICATIONS_ENABLED", true),
                chat_log_url: env::var("CHAT_LOG_URL")
                    .unwrap_or_else(|_| format!("{}/store_chat", backend_url)),
                ticket_url: env::var("TICKET_URL")
                    .unwrap_or_else(|_| format!("{}/api/create", backend_url)),
                timeout_secs: parse_var("NOTIFY_TIMEOUT_SECS", 15),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
