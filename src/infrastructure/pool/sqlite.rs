//! SQLite connection factory

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;

use crate::domain::pool::ConnectionFactory;
use crate::domain::DomainError;

/// Opens standalone SQLite connections for [`ConnectionPool`](super::ConnectionPool)
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    url: String,
    options: SqliteConnectOptions,
}

impl SqliteConnectionFactory {
    /// Accepts `sqlite://path/to/file.db` or `sqlite::memory:`; the file is
    /// created if missing
    pub fn new(url: impl Into<String>) -> Result<Self, DomainError> {
        let url = url.into();

        if !url.starts_with("sqlite:") {
            return Err(DomainError::configuration(format!(
                "Unsupported database URL '{}': expected a sqlite: URL",
                url
            )));
        }

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| {
                DomainError::configuration(format!("Invalid database URL '{}': {}", url, e))
            })?
            .create_if_missing(true);

        Ok(Self { url, options })
    }
}

#[async_trait]
impl ConnectionFactory for SqliteConnectionFactory {
    type Connection = SqliteConnection;

    async fn connect(&self) -> Result<SqliteConnection, DomainError> {
        self.options
            .connect()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to open SQLite database: {}", e)))
    }

    fn target(&self) -> String {
        self.url.clone()
    }
}
