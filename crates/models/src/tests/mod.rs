/// Catalog table tests against a live Postgres (skipped without DATABASE_URL)
pub mod catalog_service_tests;

use sea_orm::DatabaseConnection;
use migration::MigratorTrait;

/// Connect and migrate, or `None` when no database is configured for tests.
pub(crate) async fn test_db() -> anyhow::Result<Option<DatabaseConnection>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(None);
    }
    if configs::DATABASE_URL_KEYS.iter().all(|k| std::env::var(k).is_err()) {
        eprintln!("DATABASE_URL missing; skip db tests");
        return Ok(None);
    }
    let db = crate::db::connect().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Some(db))
}
