use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Application configuration, loaded once at startup.
///
/// Job periods and retention windows are read here and never re-read while the
/// server is running; changing them requires a restart.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// How often a stat point is sampled, in milliseconds.
    pub stats_interval_ms: u64,
    /// Stat points older than this are pruned, in milliseconds.
    pub stats_max_age_ms: u64,
    /// How often old aliases are purged, in milliseconds.
    pub alias_purge_interval_ms: u64,
    /// Aliases older than this are purged, in milliseconds.
    pub alias_max_age_ms: u64,
    /// Channel save sweep cycle length, in milliseconds. Configured in whole
    /// minutes (`CHANSYNC_CHANNEL_SAVE_INTERVAL_MINS`) and converted at load.
    pub channel_save_interval_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("stats_interval_ms", &self.stats_interval_ms)
            .field("stats_max_age_ms", &self.stats_max_age_ms)
            .field("alias_purge_interval_ms", &self.alias_purge_interval_ms)
            .field("alias_max_age_ms", &self.alias_max_age_ms)
            .field(
                "channel_save_interval_ms",
                &self.channel_save_interval_ms,
            )
            .finish()
    }
}
