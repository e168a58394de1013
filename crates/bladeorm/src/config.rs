//! Client configuration.

use std::time::Duration;

/// Configuration for [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum number of pooled connections (used by [`Client::connect`](crate::Client::connect)).
    pub max_pool_size: usize,
    /// How long to wait for a free pooled connection. `None` waits indefinitely.
    pub acquire_timeout: Option<Duration>,
    /// Whether to emit executed statements as `tracing` events.
    pub log_statements: bool,
    /// Truncate logged SQL to this many bytes.
    pub max_sql_log_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 16,
            acquire_timeout: None,
            log_statements: true,
            max_sql_log_length: 200,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Set the pool acquire timeout.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Enable or disable statement logging.
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = len;
        self
    }
}
