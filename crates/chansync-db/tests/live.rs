//! Live integration tests for chansync-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/chansync-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chansync_db::{
    add_stat_point, delete_aliases_older_than, delete_expired_password_resets,
    list_stats_since, load_channel_state, prune_stats, save_channel_state,
};
use chrono::{Duration, Utc};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Insert an alias row with an explicit timestamp.
async fn insert_test_alias(pool: &sqlx::PgPool, ip: &str, name: &str, age: Duration) {
    sqlx::query("INSERT INTO aliases (ip, name, time) VALUES ($1, $2, $3)")
        .bind(ip)
        .bind(name)
        .bind(Utc::now() - age)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("insert_test_alias failed for '{name}': {e}"));
}

/// Insert a password-reset row expiring at `now + offset`.
async fn insert_test_reset(pool: &sqlx::PgPool, email: &str, offset: Duration) {
    sqlx::query("INSERT INTO password_resets (email, hash, expire) VALUES ($1, 'x', $2)")
        .bind(email)
        .bind(Utc::now() + offset)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("insert_test_reset failed for '{email}': {e}"));
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn stat_points_round_trip_and_prune_respects_cutoff(pool: sqlx::PgPool) {
    let now = Utc::now();

    add_stat_point(&pool, now - Duration::hours(48), 5, 2, 1_000)
        .await
        .expect("insert old point");
    add_stat_point(&pool, now, 7, 3, 2_000)
        .await
        .expect("insert fresh point");

    let pruned = prune_stats(&pool, now - Duration::hours(24))
        .await
        .expect("prune");
    assert_eq!(pruned, 1, "only the 48h-old point is past the cutoff");

    let rows = list_stats_since(&pool, now - Duration::hours(24), 100)
        .await
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].usercount, 7);
    assert_eq!(rows[0].chancount, 3);
    assert_eq!(rows[0].mem, 2_000);
}

#[sqlx::test(migrations = "../../migrations")]
async fn prune_on_empty_table_deletes_nothing(pool: sqlx::PgPool) {
    let pruned = prune_stats(&pool, Utc::now()).await.expect("prune");
    assert_eq!(pruned, 0);
}

// ---------------------------------------------------------------------------
// aliases
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn alias_cleanup_only_removes_rows_past_the_cutoff(pool: sqlx::PgPool) {
    insert_test_alias(&pool, "10.0.0.1", "old-nick", Duration::days(40)).await;
    insert_test_alias(&pool, "10.0.0.2", "fresh-nick", Duration::hours(1)).await;

    let deleted = delete_aliases_older_than(&pool, Utc::now() - Duration::days(30))
        .await
        .expect("delete");
    assert_eq!(deleted, 1);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM aliases")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(remaining, 1);
}

// ---------------------------------------------------------------------------
// password resets
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn reset_cleanup_keeps_records_inside_the_grace_window(pool: sqlx::PgPool) {
    // Expired two days ago — well past a 24h grace cutoff.
    insert_test_reset(&pool, "stale@example.com", -Duration::days(2)).await;
    // Expired an hour ago — still inside the grace window.
    insert_test_reset(&pool, "recent@example.com", -Duration::hours(1)).await;
    // Not yet expired.
    insert_test_reset(&pool, "pending@example.com", Duration::hours(1)).await;

    let deleted = delete_expired_password_resets(&pool, Utc::now() - Duration::hours(24))
        .await
        .expect("delete");
    assert_eq!(deleted, 1);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM password_resets")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(remaining, 2);
}

// ---------------------------------------------------------------------------
// channels
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn channel_state_upserts_and_loads(pool: sqlx::PgPool) {
    let first = serde_json::json!({ "playlist": ["a"], "locked": false });
    save_channel_state(&pool, "lobby", &first)
        .await
        .expect("first save");

    let second = serde_json::json!({ "playlist": ["a", "b"], "locked": true });
    save_channel_state(&pool, "lobby", &second)
        .await
        .expect("second save");

    let loaded = load_channel_state(&pool, "lobby")
        .await
        .expect("load")
        .expect("row exists");
    assert_eq!(loaded, second, "upsert replaces the previous document");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channels")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn loading_an_unknown_channel_returns_none(pool: sqlx::PgPool) {
    let loaded = load_channel_state(&pool, "nope").await.expect("load");
    assert!(loaded.is_none());
}
