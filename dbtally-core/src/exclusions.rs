//! Exclusion sets for databases/schemas and tables.
//!
//! Each backend carries a built-in list of system objects that are never
//! worth reporting on; user-supplied exclusions are merged on top. The set
//! is immutable once constructed.

use crate::models::DatabaseKind;

/// PostgreSQL databases excluded by default: the two template databases and
/// the administrative `postgres` database.
pub const POSTGRES_SYSTEM_DATABASES: &[&str] = &["template0", "template1", "postgres"];

/// MySQL schemas excluded by default: the built-in system schemas.
pub const MYSQL_SYSTEM_SCHEMAS: &[&str] = &[
    "information_schema",
    "performance_schema",
    "sys",
    "mysql",
    "mysql_innodb_cluster_metadata",
];

/// Names of databases/schemas and tables to omit from the report.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    databases: Vec<String>,
    tables: Vec<String>,
}

impl ExclusionSet {
    /// Builds the exclusion set for a backend by merging its built-in
    /// defaults with user-supplied names. Duplicates are dropped while
    /// preserving first-seen order.
    pub fn for_kind(kind: DatabaseKind, user_dbs: &[String], user_tables: &[String]) -> Self {
        let defaults = match kind {
            DatabaseKind::PostgreSql => POSTGRES_SYSTEM_DATABASES,
            DatabaseKind::MySql => MYSQL_SYSTEM_SCHEMAS,
        };

        let mut databases: Vec<String> = defaults.iter().map(ToString::to_string).collect();
        for name in user_dbs {
            if !databases.iter().any(|d| d == name) {
                databases.push(name.clone());
            }
        }

        let mut tables = Vec::new();
        for name in user_tables {
            if !tables.iter().any(|t| t == name) {
                tables.push(name.clone());
            }
        }

        tracing::debug!("excluding databases: {:?}", databases);
        tracing::debug!("excluding tables: {:?}", tables);

        Self { databases, tables }
    }

    /// Excluded database/schema names (defaults plus user-supplied).
    pub fn databases(&self) -> &[String] {
        &self.databases
    }

    /// Excluded table names (user-supplied only; there are no defaults).
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Whether a database/schema name is excluded.
    pub fn excludes_database(&self, name: &str) -> bool {
        self.databases.iter().any(|d| d == name)
    }

    /// Removes excluded names from a database list, preserving the input's
    /// relative order.
    pub fn filter_databases(&self, names: Vec<String>) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| !self.excludes_database(name))
            .collect()
    }

    /// Renders the excluded database names as a quoted SQL literal list,
    /// e.g. `'information_schema', 'sys'`.
    pub fn sql_database_list(&self) -> String {
        sql_name_list(&self.databases)
    }

    /// Renders the excluded table names as a quoted SQL literal list.
    pub fn sql_table_list(&self) -> String {
        sql_name_list(&self.tables)
    }
}

/// Quotes each name as a SQL string literal and joins with `, `.
///
/// Embedded single quotes are doubled. The names still end up interpolated
/// into the query text (the catalog queries cannot bind an IN-list), so this
/// escaping is what keeps a hostile name from breaking out of the literal.
fn sql_name_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{}'", name.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}
