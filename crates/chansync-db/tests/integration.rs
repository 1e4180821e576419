//! Offline unit tests for chansync-db pool configuration and row types.
//! These tests do not require a live database connection.

use chansync_core::{AppConfig, Environment};
use chansync_db::{PoolConfig, StatPointRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        stats_interval_ms: 3_600_000,
        stats_max_age_ms: 86_400_000,
        alias_purge_interval_ms: 3_600_000,
        alias_max_age_ms: 2_592_000_000,
        channel_save_interval_ms: 300_000,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`StatPointRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn stat_point_row_has_expected_fields() {
    use chrono::Utc;

    let row = StatPointRow {
        time: Utc::now(),
        usercount: 7_i32,
        chancount: 3_i32,
        mem: 128 * 1024 * 1024_i64,
    };

    assert_eq!(row.usercount, 7);
    assert_eq!(row.chancount, 3);
    assert!(row.mem > 0);
}
