//! SQLite schema migrations

use sqlx::sqlite::SqliteConnection;

use crate::domain::DomainError;

/// A versioned schema change
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

/// Applies [`Migration`]s over one connection, tracking them in `_migrations`
#[derive(Debug)]
pub struct SqliteMigrator<'c> {
    connection: &'c mut SqliteConnection,
}

impl<'c> SqliteMigrator<'c> {
    pub fn new(connection: &'c mut SqliteConnection) -> Self {
        Self { connection }
    }

    async fn ensure_migrations_table(&mut self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut *self.connection)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&mut self, version: i64) -> Result<bool, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations WHERE version = ?")
            .bind(version)
            .fetch_one(&mut *self.connection)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))?;

        Ok(count > 0)
    }

    /// Runs a single migration; already-applied versions are skipped.
    /// Returns whether it ran.
    pub async fn run_migration(&mut self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(false);
        }

        sqlx::raw_sql(migration.up)
            .execute(&mut *self.connection)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *self.connection)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "Applied migration"
        );
        Ok(true)
    }

    /// Reverts a single migration if it is applied
    pub async fn revert_migration(&mut self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if !self.is_applied(migration.version).await? {
            return Ok(false);
        }

        sqlx::raw_sql(migration.down)
            .execute(&mut *self.connection)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = ?")
            .bind(migration.version)
            .execute(&mut *self.connection)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        Ok(true)
    }

    pub async fn current_version(&mut self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&mut *self.connection)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// Schema of the conversation store
pub fn conversation_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create application_logs table",
            up: r#"
            CREATE TABLE IF NOT EXISTS application_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_query TEXT NOT NULL,
                gpt_response TEXT NOT NULL,
                model TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_application_logs_session
                ON application_logs(session_id, created_at);
            "#,
            down: "DROP TABLE IF EXISTS application_logs;",
        },
        Migration {
            version: 2,
            description: "Create document_store table",
            up: r#"
            CREATE TABLE IF NOT EXISTS document_store (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                session_id TEXT,
                upload_timestamp TEXT NOT NULL
            );
            "#,
            down: "DROP TABLE IF EXISTS document_store;",
        },
    ]
}

/// Runs all pending conversation-store migrations, returning how many ran
pub async fn run_conversation_migrations(
    connection: &mut SqliteConnection,
) -> Result<usize, DomainError> {
    let mut migrator = SqliteMigrator::new(connection);
    let mut applied = 0;

    for migration in conversation_migrations() {
        if migrator.run_migration(&migration).await? {
            applied += 1;
        }
    }

    Ok(applied)
}
