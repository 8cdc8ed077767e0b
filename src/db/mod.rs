use crate::errors::{DbError, DbResult};
use chrono::Utc;
use log::{debug, info};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

// Embed migration SQL files at compile time
const MIGRATION_SCHEMA: &str = include_str!("../../migrations/20250601000000_schema.sql");

// List of migrations with their names and SQL content, applied in order
const MIGRATIONS: &[(&str, &str)] = &[
    ("20250601000000_schema.sql", MIGRATION_SCHEMA),
];

/// Open a connection pool for the given database URL and bring the schema
/// up to date. In-memory databases get a single connection so that every
/// query sees the same database.
pub async fn init_db(database_url: &str) -> DbResult<SqlitePool> {
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| DbError::ConnectionPool(e.to_string()))?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Apply any migrations that have not yet been recorded in the
/// migrations table.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    create_migrations_table(pool).await?;

    let applied = applied_migrations(pool).await?;

    for (name, sql) in MIGRATIONS {
        if applied.iter().any(|a| a == name) {
            debug!("migration {} already applied", name);
            continue;
        }

        info!("applying migration {}", name);
        apply_migration(pool, name, sql).await?;
    }

    Ok(())
}

async fn create_migrations_table(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(format!("failed to create migrations table: {}", e)))?;

    Ok(())
}

async fn applied_migrations(pool: &SqlitePool) -> DbResult<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>("SELECT name FROM migrations ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| DbError::Migration(format!("failed to read applied migrations: {}", e)))?;

    Ok(names)
}

async fn apply_migration(pool: &SqlitePool, name: &str, sql: &str) -> DbResult<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::Transaction(e.to_string()))?;

    // SQLite only executes one statement per call, so split on the
    // statement separator.
    for statement in sql.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;
    }

    sqlx::query("INSERT INTO migrations (name, applied_at) VALUES (?, ?)")
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::Migration(format!("failed to record migration {}: {}", name, e)))?;

    tx.commit()
        .await
        .map_err(|e| DbError::Transaction(e.to_string()))?;

    Ok(())
}
