//! Metadata provider trait and factory for the two supported backends.
//!
//! A provider owns everything needed for one report run: the merged
//! exclusion set and the report shape. Connections are not held by the
//! provider; each fetch opens ephemeral, single-use connections and closes
//! them before returning.

use crate::models::{DatabaseKind, MetadataRow, ReportOptions};
use crate::Result;
use async_trait::async_trait;

/// Main trait for database metadata providers, object-safe so the CLI can
/// hold a `Box<dyn MetadataProvider>`.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetches table metadata for every non-excluded database/schema and
    /// normalizes it into [`MetadataRow`]s.
    ///
    /// Failure semantics differ per backend and are part of the contract:
    /// the MySQL provider treats any connection or query failure as fatal,
    /// while the PostgreSQL provider only fails outright when the bootstrap
    /// database listing fails; a failure on an individual database is
    /// logged and that database contributes zero rows.
    ///
    /// # Errors
    /// Returns [`crate::error::DbTallyError::EmptyResult`] when exclusions
    /// leave nothing to query, and connection/query errors per the policy
    /// above.
    async fn fetch_information(&self) -> Result<Vec<MetadataRow>>;

    /// Returns the backend this provider handles.
    fn database_kind(&self) -> DatabaseKind;
}

/// Factory function to create the provider for the selected backend.
///
/// # Errors
/// Returns a configuration error if support for the requested backend was
/// not compiled in.
pub fn create_provider(
    kind: DatabaseKind,
    options: &ReportOptions,
) -> Result<Box<dyn MetadataProvider>> {
    match kind {
        #[cfg(feature = "postgresql")]
        DatabaseKind::PostgreSql => Ok(Box::new(postgres::PostgresProvider::new(options))),
        #[cfg(not(feature = "postgresql"))]
        DatabaseKind::PostgreSql => Err(crate::error::DbTallyError::configuration(
            "PostgreSQL support not compiled in; build with --features postgresql",
        )),
        #[cfg(feature = "mysql")]
        DatabaseKind::MySql => Ok(Box::new(mysql::MySqlProvider::new(options))),
        #[cfg(not(feature = "mysql"))]
        DatabaseKind::MySql => Err(crate::error::DbTallyError::configuration(
            "MySQL support not compiled in; build with --features mysql",
        )),
    }
}

/// Closes a connection, logging instead of failing: by the time a
/// connection is being closed the interesting result (rows or the real
/// error) has already been captured.
#[cfg(any(feature = "postgresql", feature = "mysql"))]
pub(crate) async fn close_quietly<C: sqlx::Connection>(conn: C) {
    if let Err(e) = conn.close().await {
        tracing::warn!("error while closing connection: {}", e);
    }
}

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "postgresql")]
    #[test]
    fn test_create_postgres_provider() {
        let provider = create_provider(DatabaseKind::PostgreSql, &ReportOptions::new()).unwrap();
        assert_eq!(provider.database_kind(), DatabaseKind::PostgreSql);
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn test_create_mysql_provider() {
        let provider = create_provider(DatabaseKind::MySql, &ReportOptions::new()).unwrap();
        assert_eq!(provider.database_kind(), DatabaseKind::MySql);
    }
}
