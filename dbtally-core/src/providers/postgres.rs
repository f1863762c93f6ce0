//! PostgreSQL metadata provider.
//!
//! Two-step collection: a bootstrap connection to the `postgres` database
//! lists every database via `pg_database`, then each surviving database
//! gets its own short-lived connection for one catalog query joining
//! `information_schema.tables` with `pg_class` for sizes and the row
//! estimate. Connections are opened strictly sequentially and closed before
//! the next one is opened.
//!
//! Authentication is delegated to the driver: the fixed local target is
//! `postgres://postgres@localhost`, relying on trust/peer auth the way the
//! stock client does.

use super::{close_quietly, MetadataProvider};
use crate::error::DbTallyError;
use crate::exclusions::ExclusionSet;
use crate::models::{DatabaseKind, MetadataRow, ReportOptions};
use crate::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Connection, PgConnection, Row};

/// Database used for the bootstrap listing query.
const BOOTSTRAP_DATABASE: &str = "postgres";

/// Catalog query listing every database on the server.
const LIST_DATABASES_QUERY: &str = "select datname from pg_database;";

/// PostgreSQL metadata provider.
#[derive(Debug)]
pub struct PostgresProvider {
    exclusions: ExclusionSet,
    include_index_size: bool,
}

impl PostgresProvider {
    /// Creates a provider from report options, merging the built-in
    /// PostgreSQL exclusions with the user-supplied ones.
    pub fn new(options: &ReportOptions) -> Self {
        Self {
            exclusions: ExclusionSet::for_kind(
                DatabaseKind::PostgreSql,
                &options.db_exclusions,
                &options.table_exclusions,
            ),
            include_index_size: options.include_index_size,
        }
    }

    /// Connection URL for one database on the fixed local server.
    ///
    /// The database name goes in as a path segment through [`url::Url`] so
    /// names containing `/`, `?`, `#`, or spaces are percent-encoded
    /// instead of producing a malformed URL.
    fn connection_url(database: &str) -> Result<String> {
        let mut url = url::Url::parse("postgres://postgres@localhost")
            .map_err(|e| DbTallyError::configuration(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| DbTallyError::configuration("postgres base URL cannot carry a path"))?
            .push(database);
        Ok(url.to_string())
    }

    /// Builds the per-database table metadata query.
    ///
    /// Sizes come from `pg_relation_size` / `pg_indexes_size`, the row
    /// estimate from `pg_class.reltuples`, restricted to the `public`
    /// schema, with an optional table-name exclusion clause. The index-size
    /// column is only selected when the report carries it.
    pub fn build_table_query(&self) -> String {
        let size_columns = if self.include_index_size {
            "pg_relation_size(quote_ident(table_name)) as table_size, \
             pg_indexes_size(quote_ident(table_name)) as index_size"
        } else {
            "pg_relation_size(quote_ident(table_name)) as table_size"
        };

        let table_filter = if self.exclusions.tables().is_empty() {
            String::new()
        } else {
            format!(
                " and table_name not in ({})",
                self.exclusions.sql_table_list()
            )
        };

        format!(
            "select current_database()::text as database_name, \
             table_name::text as table_name, \
             {size_columns}, \
             pg_class.reltuples::bigint as table_rows \
             from information_schema.tables \
             inner join pg_class on information_schema.tables.table_name = pg_class.relname \
             where table_schema = 'public'{table_filter};"
        )
    }

    /// Lists all database names from the bootstrap database.
    ///
    /// A failure here is fatal to the whole run: without the list there is
    /// nothing to iterate.
    async fn list_databases(&self) -> Result<Vec<String>> {
        let url = Self::connection_url(BOOTSTRAP_DATABASE)?;
        let mut conn = PgConnection::connect(&url).await.map_err(|e| {
            DbTallyError::connection_failed(
                format!("cannot connect to bootstrap database '{BOOTSTRAP_DATABASE}'"),
                e,
            )
        })?;

        tracing::debug!("executing '{}'", LIST_DATABASES_QUERY);
        let fetched = sqlx::query(LIST_DATABASES_QUERY).fetch_all(&mut conn).await;
        close_quietly(conn).await;

        let rows = fetched
            .map_err(|e| DbTallyError::query_failed("failed to list databases", e))?;

        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row
                .try_get("datname")
                .map_err(|e| DbTallyError::decode_field("datname", e))?;
            names.push(name);
        }

        tracing::info!("found {} databases on server", names.len());
        Ok(names)
    }

    /// Fetches metadata rows from a single database over a fresh
    /// connection, closed before returning.
    async fn fetch_database(&self, database: &str) -> Result<Vec<MetadataRow>> {
        let url = Self::connection_url(database)?;
        let mut conn = PgConnection::connect(&url).await.map_err(|e| {
            DbTallyError::connection_failed(format!("cannot connect to database '{database}'"), e)
        })?;

        let query = self.build_table_query();
        tracing::debug!("executing '{}' on '{}'", query, database);
        let fetched = sqlx::query(&query).fetch_all(&mut conn).await;
        close_quietly(conn).await;

        let rows = fetched.map_err(|e| {
            DbTallyError::query_failed(format!("table metadata query failed on '{database}'"), e)
        })?;

        rows.iter()
            .map(|row| self.decode_row(row))
            .collect::<Result<Vec<_>>>()
    }

    /// Normalizes one result row into the uniform report shape.
    fn decode_row(&self, row: &PgRow) -> Result<MetadataRow> {
        let database_name: String = row
            .try_get("database_name")
            .map_err(|e| DbTallyError::decode_field("database_name", e))?;
        let table_name: String = row
            .try_get("table_name")
            .map_err(|e| DbTallyError::decode_field("table_name", e))?;
        let table_size_bytes: i64 = row
            .try_get("table_size")
            .map_err(|e| DbTallyError::decode_field("table_size", e))?;
        let index_size_bytes = if self.include_index_size {
            let size: i64 = row
                .try_get("index_size")
                .map_err(|e| DbTallyError::decode_field("index_size", e))?;
            Some(size)
        } else {
            None
        };
        let row_count_estimate: i64 = row
            .try_get("table_rows")
            .map_err(|e| DbTallyError::decode_field("table_rows", e))?;

        Ok(MetadataRow {
            database_name,
            table_name,
            table_size_bytes,
            index_size_bytes,
            row_count_estimate,
        })
    }
}

/// Folds one database's fetch outcome into the accumulated report rows.
///
/// A failed database is logged at error level and contributes zero rows;
/// it never surfaces as an error, so the per-database loop keeps going and
/// the run still succeeds on the strength of the databases that worked.
fn append_outcome(results: &mut Vec<MetadataRow>, database: &str, outcome: Result<Vec<MetadataRow>>) {
    match outcome {
        Ok(mut rows) => {
            tracing::info!("collected {} tables from '{}'", rows.len(), database);
            results.append(&mut rows);
        }
        Err(e) => {
            tracing::error!("skipping database '{}': {}", database, e);
        }
    }
}

#[async_trait]
impl MetadataProvider for PostgresProvider {
    async fn fetch_information(&self) -> Result<Vec<MetadataRow>> {
        let all_databases = self.list_databases().await?;
        let targets = self.exclusions.filter_databases(all_databases);

        if targets.is_empty() {
            return Err(DbTallyError::empty_result(
                "the database list to report on is empty after exclusions",
            ));
        }

        let mut results = Vec::new();
        for database in &targets {
            let outcome = self.fetch_database(database).await;
            append_outcome(&mut results, database, outcome);
        }

        Ok(results)
    }

    fn database_kind(&self) -> DatabaseKind {
        DatabaseKind::PostgreSql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_query_with_table_exclusions_and_index_size() {
        let options = ReportOptions::new()
            .with_db_exclusions(strings(&["analytics"]))
            .with_table_exclusions(strings(&["audit_log"]));
        let provider = PostgresProvider::new(&options);

        let query = provider.build_table_query();
        assert!(query.contains("table_name not in ('audit_log')"));
        assert!(query.contains("where table_schema = 'public'"));
        assert!(query.contains("pg_indexes_size"));
        assert!(query.contains("pg_class.reltuples"));
    }

    #[test]
    fn test_query_without_table_exclusions() {
        let provider = PostgresProvider::new(&ReportOptions::new());

        let query = provider.build_table_query();
        assert!(!query.contains("not in"));
        assert!(query.ends_with("where table_schema = 'public';"));
    }

    #[test]
    fn test_query_without_index_size() {
        let provider = PostgresProvider::new(&ReportOptions::new().with_index_size(false));

        let query = provider.build_table_query();
        assert!(!query.contains("pg_indexes_size"));
        assert!(query.contains("pg_relation_size"));
    }

    #[test]
    fn test_exclusion_scenario_from_user_flags() {
        // -t postgresql --exclude-db analytics --exclude-table audit_log
        let options = ReportOptions::new()
            .with_db_exclusions(strings(&["analytics"]))
            .with_table_exclusions(strings(&["audit_log"]));
        let provider = PostgresProvider::new(&options);

        let listed = strings(&["shop", "analytics", "template0", "template1", "postgres"]);
        let targets = provider.exclusions.filter_databases(listed);
        assert_eq!(targets, strings(&["shop"]));
    }

    #[test]
    fn test_connection_url_shape() {
        assert_eq!(
            PostgresProvider::connection_url("shop").unwrap(),
            "postgres://postgres@localhost/shop"
        );
    }

    #[test]
    fn test_connection_url_encodes_awkward_names() {
        assert_eq!(
            PostgresProvider::connection_url("odd/db name").unwrap(),
            "postgres://postgres@localhost/odd%2Fdb%20name"
        );
        assert_eq!(
            PostgresProvider::connection_url("q?frag#").unwrap(),
            "postgres://postgres@localhost/q%3Ffrag%23"
        );
    }

    fn row(database: &str, table: &str) -> MetadataRow {
        MetadataRow {
            database_name: database.to_string(),
            table_name: table.to_string(),
            table_size_bytes: 8192,
            index_size_bytes: Some(0),
            row_count_estimate: 1,
        }
    }

    #[test]
    fn test_failed_database_contributes_zero_rows_and_loop_continues() {
        let mut results = Vec::new();

        append_outcome(&mut results, "shop", Ok(vec![row("shop", "orders")]));
        append_outcome(
            &mut results,
            "down",
            Err(DbTallyError::connection_failed(
                "cannot connect to database 'down'",
                std::io::Error::other("connection refused"),
            )),
        );
        append_outcome(&mut results, "crm", Ok(vec![row("crm", "leads")]));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].database_name, "shop");
        assert_eq!(results[1].database_name, "crm");
    }

    #[test]
    fn test_all_databases_failing_yields_empty_rows_not_an_error() {
        let mut results = Vec::new();
        append_outcome(
            &mut results,
            "down",
            Err(DbTallyError::query_failed(
                "table metadata query failed on 'down'",
                std::io::Error::other("terminated"),
            )),
        );
        assert!(results.is_empty());
    }
}
