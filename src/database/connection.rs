use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// 测试用内存 SQLite，已执行全部迁移
#[cfg(test)]
pub async fn connect_test_db() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);
    let pool = Database::connect(options)
        .await
        .expect("in-memory sqlite should open");
    run_migrations(&pool).await.expect("migrations should apply");
    pool
}

/// 测试用文件 SQLite，多个连接，用于真实并发场景；返回的 TempDir 需在测试期间保持存活
#[cfg(test)]
pub async fn connect_shared_test_db(max_connections: u32) -> (DbPool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_connections)
        .min_connections(max_connections)
        .sqlx_logging(false);
    let pool = Database::connect(options)
        .await
        .expect("file sqlite should open");
    run_migrations(&pool).await.expect("migrations should apply");
    (pool, dir)
}
