#![cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};

use configs::DatabaseConfig;
use migration::MigratorTrait;
use models::db::{connect_with_config, DATABASE_URL};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database-backed tests run only with an explicit `DATABASE_URL` and no `SKIP_DB_TESTS`.
pub fn db_tests_disabled() -> bool {
    // Loads .env as a side effect.
    let _ = &*DATABASE_URL;
    std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err()
}

fn test_config(max_connections: u32) -> DatabaseConfig {
    DatabaseConfig {
        url: DATABASE_URL.clone(),
        max_connections,
        min_connections: 1,
        acquire_timeout_secs: 10,
        ..DatabaseConfig::default()
    }
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect_with_config(&test_config(2)).await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    // Return a fresh connection for the current test's runtime
    connect_with_config(&test_config(10)).await
}

/// Suffix for usernames, emails and entry numbers that must not collide across tests.
pub fn unique_suffix() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}_{}", nanos, COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Entry numbers in a range the seeded catalog never uses.
pub fn unique_number() -> i32 {
    let nanos = chrono::Utc::now().timestamp_subsec_nanos() as i64;
    let n = COUNTER.fetch_add(1, Ordering::Relaxed) as i64;
    (100_000 + (nanos / 1_000 + n * 7919) % 1_000_000_000) as i32
}
