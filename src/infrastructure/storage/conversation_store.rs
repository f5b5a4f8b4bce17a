//! Relational persistence of conversation turns and uploaded documents

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use crate::domain::conversation::{ApplicationLog, DocumentRecord, SessionId, Turn};
use crate::domain::DomainError;
use crate::infrastructure::cache::DistributedCache;
use crate::infrastructure::pool::{ConnectionPool, SqliteConnectionFactory};

use super::migrations::run_conversation_migrations;

/// `application_logs` and `document_store` over pooled SQLite connections,
/// with the distributed cache in front of history reads
#[derive(Debug, Clone)]
pub struct ConversationStore {
    pool: ConnectionPool<SqliteConnectionFactory>,
    cache: DistributedCache,
}

impl ConversationStore {
    pub fn new(pool: ConnectionPool<SqliteConnectionFactory>, cache: DistributedCache) -> Self {
        Self { pool, cache }
    }

    /// Creates missing tables; returns the number of migrations applied
    pub async fn ensure_schema(&self) -> Result<usize, DomainError> {
        let mut lease = self.pool.lease();
        run_conversation_migrations(lease.connection().await?).await
    }

    /// Persists one exchange and, when the session's history is cached,
    /// extends the cached copy
    pub async fn insert_application_log(
        &self,
        session: &SessionId,
        user_query: &str,
        gpt_response: &str,
        model: &str,
    ) -> Result<i64, DomainError> {
        let created_at = Utc::now();

        let id = {
            let mut lease = self.pool.lease();
            let connection = lease.connection().await?;

            sqlx::query(
                "INSERT INTO application_logs \
                 (session_id, user_query, gpt_response, model, created_at) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(session.as_str())
            .bind(user_query)
            .bind(gpt_response)
            .bind(model)
            .bind(created_at)
            .execute(&mut *connection)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to insert application log: {}", e)))?
            .last_insert_rowid()
        };

        // An uncached session is filled from the table on its next read
        if let Some(mut turns) = self.cache.get_history(session).await {
            turns.push(Turn::user(user_query).with_created_at(created_at));
            turns.push(Turn::assistant(gpt_response).with_created_at(created_at));
            self.cache
                .set_history(session, &turns, self.cache.config().chat_history_ttl)
                .await;
        }

        Ok(id)
    }

    /// Rows of one session in insertion order
    pub async fn list_application_logs(
        &self,
        session: &SessionId,
    ) -> Result<Vec<ApplicationLog>, DomainError> {
        let mut lease = self.pool.lease();
        let connection = lease.connection().await?;

        let rows = sqlx::query(
            "SELECT id, session_id, user_query, gpt_response, model, created_at \
             FROM application_logs WHERE session_id = ? ORDER BY created_at, id",
        )
        .bind(session.as_str())
        .fetch_all(&mut *connection)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to read application logs: {}", e)))?;

        rows.iter().map(application_log_from_row).collect()
    }

    /// Cache-aside history read
    ///
    /// A cached list is returned unchanged. Otherwise the table is read, each
    /// row becomes a user turn and an assistant turn, and a non-empty result
    /// is written back to the cache.
    pub async fn get_chat_history(&self, session: &SessionId) -> Result<Vec<Turn>, DomainError> {
        if let Some(turns) = self.cache.get_history(session).await {
            return Ok(turns);
        }

        let turns: Vec<Turn> = self
            .list_application_logs(session)
            .await?
            .into_iter()
            .flat_map(ApplicationLog::into_turns)
            .collect();

        if !turns.is_empty() {
            debug!(session = %session, turns = turns.len(), "Populating history cache");
            self.cache
                .set_history(session, &turns, self.cache.config().chat_history_ttl)
                .await;
        }

        Ok(turns)
    }

    pub async fn insert_document(
        &self,
        filename: &str,
        session: Option<&SessionId>,
    ) -> Result<i64, DomainError> {
        let mut lease = self.pool.lease();
        let connection = lease.connection().await?;

        let result = sqlx::query(
            "INSERT INTO document_store (filename, session_id, upload_timestamp) VALUES (?, ?, ?)",
        )
        .bind(filename)
        .bind(session.map(SessionId::as_str))
        .bind(Utc::now())
        .execute(&mut *connection)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to insert document record: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// Returns whether a row was removed
    pub async fn delete_document(&self, id: i64) -> Result<bool, DomainError> {
        let mut lease = self.pool.lease();
        let connection = lease.connection().await?;

        let result = sqlx::query("DELETE FROM document_store WHERE id = ?")
            .bind(id)
            .execute(&mut *connection)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete document record: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Newest first; all documents when `session` is `None`
    pub async fn list_documents(
        &self,
        session: Option<&SessionId>,
    ) -> Result<Vec<DocumentRecord>, DomainError> {
        let mut lease = self.pool.lease();
        let connection = lease.connection().await?;

        let query = match session {
            Some(session) => sqlx::query(
                "SELECT id, filename, session_id, upload_timestamp FROM document_store \
                 WHERE session_id = ? ORDER BY upload_timestamp DESC, id DESC",
            )
            .bind(session.as_str()),
            None => sqlx::query(
                "SELECT id, filename, session_id, upload_timestamp FROM document_store \
                 ORDER BY upload_timestamp DESC, id DESC",
            ),
        };

        let rows = query
            .fetch_all(&mut *connection)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list documents: {}", e)))?;

        rows.iter().map(document_from_row).collect()
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| DomainError::storage(format!("Failed to read column '{}': {}", name, e)))
}

fn application_log_from_row(row: &SqliteRow) -> Result<ApplicationLog, DomainError> {
    Ok(ApplicationLog {
        id: column(row, "id")?,
        session_id: SessionId::new(column::<String>(row, "session_id")?)?,
        user_query: column(row, "user_query")?,
        gpt_response: column(row, "gpt_response")?,
        model: column(row, "model")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn document_from_row(row: &SqliteRow) -> Result<DocumentRecord, DomainError> {
    let session_id = column::<Option<String>>(row, "session_id")?
        .map(SessionId::new)
        .transpose()?;

    Ok(DocumentRecord {
        id: column(row, "id")?,
        filename: column(row, "filename")?,
        session_id,
        upload_timestamp: column::<DateTime<Utc>>(row, "upload_timestamp")?,
    })
}
