//! Data model for the table-size report.

use serde::{Deserialize, Serialize};

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseKind {
    /// PostgreSQL-family servers.
    #[serde(rename = "postgresql")]
    PostgreSql,
    /// MySQL-family servers (including MariaDB).
    #[serde(rename = "mysql")]
    MySql,
}

impl std::fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostgreSql => write!(f, "postgresql"),
            Self::MySql => write!(f, "mysql"),
        }
    }
}

/// One table's worth of catalog metadata, in the uniform shape both
/// providers normalize into.
///
/// `row_count_estimate` comes from catalog statistics (`pg_class.reltuples`,
/// `information_schema.tables.table_rows`), not a live `COUNT(*)`; it can be
/// stale, zero for never-analyzed tables, or -1 on PostgreSQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    /// Database (PostgreSQL) or schema (MySQL) the table lives in.
    pub database_name: String,
    /// Table name.
    pub table_name: String,
    /// On-disk size of the table data in bytes.
    pub table_size_bytes: i64,
    /// On-disk size of the table's indexes in bytes. `None` when the report
    /// is configured without the index-size column.
    pub index_size_bytes: Option<i64>,
    /// Approximate row count from catalog statistics.
    pub row_count_estimate: i64,
}

/// Configuration for a report run.
///
/// This is the single parameterized shape that replaces the two
/// near-duplicate report variants (with and without table exclusions and
/// the index-size column).
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Database/schema names to exclude, on top of the built-in defaults.
    pub db_exclusions: Vec<String>,
    /// Table names to exclude from every database.
    pub table_exclusions: Vec<String>,
    /// Whether the report carries the index-size column.
    pub include_index_size: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            db_exclusions: Vec::new(),
            table_exclusions: Vec::new(),
            include_index_size: true,
        }
    }
}

impl ReportOptions {
    /// Creates options with no user exclusions and the index-size column on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds database/schema exclusions.
    #[must_use]
    pub fn with_db_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.db_exclusions = exclusions;
        self
    }

    /// Adds table exclusions.
    #[must_use]
    pub fn with_table_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.table_exclusions = exclusions;
        self
    }

    /// Sets whether the index-size column is reported.
    #[must_use]
    pub fn with_index_size(mut self, include: bool) -> Self {
        self.include_index_size = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_kind_display() {
        assert_eq!(DatabaseKind::PostgreSql.to_string(), "postgresql");
        assert_eq!(DatabaseKind::MySql.to_string(), "mysql");
    }

    #[test]
    fn test_report_options_builder() {
        let options = ReportOptions::new()
            .with_db_exclusions(vec!["analytics".to_string()])
            .with_table_exclusions(vec!["audit_log".to_string()])
            .with_index_size(false);

        assert_eq!(options.db_exclusions, vec!["analytics"]);
        assert_eq!(options.table_exclusions, vec!["audit_log"]);
        assert!(!options.include_index_size);
    }

    #[test]
    fn test_metadata_row_serialization() {
        let row = MetadataRow {
            database_name: "shop".to_string(),
            table_name: "orders".to_string(),
            table_size_bytes: 8192,
            index_size_bytes: Some(16384),
            row_count_estimate: 42,
        };

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"database_name\":\"shop\""));
        assert!(json.contains("\"index_size_bytes\":16384"));

        let deserialized: MetadataRow = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, row);
    }
}
