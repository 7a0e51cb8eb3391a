//! Database migration management.
//!
//! Applies the embedded migrations and reports migration status with
//! detailed error handling and observability.

use std::time::{Duration, Instant};

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel::migration::MigrationSource;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Migration status information.
///
/// Reports which embedded migrations have been applied to the database
/// and which are still pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// List of applied migration versions in chronological order
    pub applied_versions: Vec<String>,
    /// List of pending migration versions
    pub pending_versions: Vec<String>,
}

impl MigrationStatus {
    /// Creates a new migration status.
    pub fn new(
        applied_versions: impl Into<Vec<String>>,
        pending_versions: impl Into<Vec<String>>,
    ) -> Self {
        Self {
            applied_versions: applied_versions.into(),
            pending_versions: pending_versions.into(),
        }
    }

    /// Returns the number of applied migrations.
    #[inline]
    pub fn applied_migrations(&self) -> usize {
        self.applied_versions.len()
    }

    /// Returns the number of pending migrations.
    #[inline]
    pub fn pending_migrations(&self) -> usize {
        self.pending_versions.len()
    }

    /// Returns true if all migrations have been applied.
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_versions.is_empty()
    }
}

/// Migration operation result information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Total duration of the migration operation
    pub duration: Duration,
    /// List of migration versions that were processed
    pub processed_versions: Vec<String>,
}

impl MigrationResult {
    /// Creates a successful migration result.
    pub fn success(duration: Duration, processed_versions: Vec<String>) -> Self {
        Self {
            duration,
            processed_versions,
        }
    }

    /// Returns whether this result indicates a no-op (nothing was pending).
    pub fn is_no_op(&self) -> bool {
        self.processed_versions.is_empty()
    }
}

/// Gets the current migration status of the database.
///
/// A database where the migration bookkeeping table does not exist yet is
/// reported as having no applied migrations.
#[tracing::instrument(skip(conn), target = TRACING_TARGET_MIGRATION)]
pub async fn get_migration_status(conn: &mut AsyncPgConnection) -> PgResult<MigrationStatus> {
    tracing::debug!(
        target: TRACING_TARGET_MIGRATION,
        "Checking database migration status",
    );

    let applied_versions = get_applied_migrations(conn).await?;
    let all_versions = embedded_versions()?;

    let pending_versions: Vec<String> = all_versions
        .into_iter()
        .filter(|version| !applied_versions.contains(version))
        .collect();

    let status = MigrationStatus::new(applied_versions, pending_versions);

    tracing::debug!(
        target: TRACING_TARGET_MIGRATION,
        applied_count = status.applied_migrations(),
        pending_count = status.pending_migrations(),
        is_up_to_date = status.is_up_to_date(),
        "Migration status retrieved"
    );

    Ok(status)
}

/// Run all pending migrations on the database.
#[tracing::instrument(skip(pg), target = TRACING_TARGET_MIGRATION)]
pub async fn run_pending_migrations(pg: &PgClient) -> PgResult<MigrationResult> {
    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        "Starting database migration process",
    );

    let start_time = Instant::now();
    let mut conn = pg.get_pooled_connection().await?;
    let initial_status = get_migration_status(&mut conn).await?;

    if initial_status.is_up_to_date() {
        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            "Database schema is already up to date, no migrations to apply"
        );
        return Ok(MigrationResult::success(start_time.elapsed(), vec![]));
    }

    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        pending_migrations = initial_status.pending_migrations(),
        "Found pending migrations to apply"
    );

    // The migration harness is blocking, so run it on the blocking pool.
    let mut conn: AsyncConnectionWrapper<_> = conn.into();
    let results = spawn_blocking(move || match conn.run_pending_migrations(MIGRATIONS) {
        Ok(versions) => (
            Ok(versions
                .into_iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()),
            conn,
        ),
        Err(x) => (Err(x), conn),
    })
    .await;

    let duration = start_time.elapsed();
    let (results, _conn) = results.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?duration,
            error = %err,
            "Migration task panicked, join error occurred"
        );

        PgError::Migration(err.into())
    })?;

    let versions = results.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?duration,
            error = &err,
            "Database migration process failed"
        );

        PgError::Migration(err)
    })?;

    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        duration = ?duration,
        migrations_count = versions.len(),
        "Database migration process completed successfully"
    );

    Ok(MigrationResult::success(duration, versions))
}

/// Gets list of applied migration versions from the database.
async fn get_applied_migrations(conn: &mut AsyncPgConnection) -> PgResult<Vec<String>> {
    use diesel::sql_query;

    #[derive(diesel::QueryableByName)]
    struct MigrationVersion {
        #[diesel(sql_type = diesel::sql_types::Text)]
        version: String,
    }

    let result = sql_query("SELECT version FROM __diesel_schema_migrations ORDER BY version")
        .get_results::<MigrationVersion>(conn)
        .await;

    match result {
        Ok(rows) => Ok(rows.into_iter().map(|row| row.version).collect()),
        // A fresh database has no bookkeeping table yet.
        Err(err) if err.to_string().contains("__diesel_schema_migrations") => {
            tracing::debug!(
                target: TRACING_TARGET_MIGRATION,
                "Migration bookkeeping table does not exist, treating as uninitialized database"
            );
            Ok(vec![])
        }
        Err(err) => Err(PgError::Migration(
            format!("Failed to get applied migrations: {}", err).into(),
        )),
    }
}

/// Lists the versions of all embedded migrations.
fn embedded_versions() -> PgResult<Vec<String>> {
    let migrations = MigrationSource::<diesel::pg::Pg>::migrations(&MIGRATIONS)
        .map_err(PgError::Migration)?;

    Ok(migrations
        .iter()
        .map(|m| m.name().version().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_migrations_present() {
        let versions = embedded_versions().unwrap();
        assert!(!versions.is_empty());
    }

    #[test]
    fn migration_status_counts() {
        let status = MigrationStatus::new(
            vec!["001".to_string(), "002".to_string()],
            vec!["003".to_string()],
        );

        assert_eq!(status.applied_migrations(), 2);
        assert_eq!(status.pending_migrations(), 1);
        assert!(!status.is_up_to_date());

        let done = MigrationStatus::new(vec!["001".to_string()], vec![]);
        assert!(done.is_up_to_date());
    }

    #[test]
    fn migration_result_no_op() {
        let result = MigrationResult::success(Duration::from_millis(5), vec![]);
        assert!(result.is_no_op());

        let applied =
            MigrationResult::success(Duration::from_millis(5), vec!["001".to_string()]);
        assert!(!applied.is_no_op());
    }
}
