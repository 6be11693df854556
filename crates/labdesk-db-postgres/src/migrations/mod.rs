//! Embedded database migrations.
//!
//! SQL files live in the crate's `migrations/` directory and are compiled
//! into the binary, so deployments need no migration tooling.

use sqlx_core::migrate::{Migration, MigrationType, Migrator};
use sqlx_postgres::PgPool;
use std::borrow::Cow;
use tracing::{info, instrument};

use crate::error::{PostgresError, Result};

/// Add new migrations here in chronological order: (version, description, sql).
macro_rules! embedded_migrations {
    () => {
        &[
            (
                20250101000001i64,
                "initial_schema",
                include_str!("../../migrations/20250101000001_initial_schema.sql"),
            ),
            (
                20250301000001i64,
                "patient_search",
                include_str!("../../migrations/20250301000001_patient_search.sql"),
            ),
        ]
    };
}

fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| Migration {
            version: *version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]),
            no_tx: false,
        })
        .collect()
}

/// Applies all pending migrations. Applied versions are tracked in
/// `_sqlx_migrations`.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> Result<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Running database migrations");

    let migrator = Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| PostgresError::Migration(format!("Migration failed: {e}")))?;

    info!("Database migrations completed successfully");
    Ok(())
}
