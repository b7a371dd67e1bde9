//! Embedded schema migrations.

use std::time::{Duration, Instant};

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Outcome of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Wall-clock time spent applying migrations.
    pub duration: Duration,
    /// Versions applied by this run, oldest first.
    pub applied: Vec<String>,
}

impl MigrationResult {
    /// Returns whether the schema was already up to date.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Applies every pending embedded migration.
///
/// Migrations run on a blocking thread through [`AsyncConnectionWrapper`]
/// because the migration harness is synchronous.
#[tracing::instrument(skip(pg), target = TRACING_TARGET_MIGRATION)]
pub async fn run_pending_migrations(pg: &PgClient) -> PgResult<MigrationResult> {
    let start = Instant::now();
    let conn = pg.get_connection().await?.into_pooled();
    let mut conn: AsyncConnectionWrapper<_> = conn.into();

    let applied = spawn_blocking(move || {
        conn.run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.into_iter().map(|v| v.to_string()).collect::<Vec<_>>())
    })
    .await
    .map_err(|err| {
        tracing::error!(target: TRACING_TARGET_MIGRATION, error = %err, "Migration task panicked");
        PgError::Migration(err.into())
    })?
    .map_err(|err| {
        tracing::error!(target: TRACING_TARGET_MIGRATION, error = %err, "Database migration failed");
        PgError::Migration(err)
    })?;

    let duration = start.elapsed();
    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        duration = ?duration,
        applied = applied.len(),
        "Database schema is up to date"
    );

    Ok(MigrationResult { duration, applied })
}

/// Adds migration support to [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies every pending migration. Safe to call on every startup.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationResult>> + Send;
}

impl PgClientMigrationExt for PgClient {
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationResult>> + Send {
        run_pending_migrations(self)
    }
}
