//! MySQL metadata provider.
//!
//! Unlike PostgreSQL, one `information_schema.tables` query sees every
//! schema on the server, so collection is a single connection and a single
//! round trip. Credentials come from the per-user defaults file (see
//! [`crate::credentials`]). Any connect or query failure is fatal to the
//! run.

use super::{close_quietly, MetadataProvider};
use crate::credentials;
use crate::error::{redact_database_url, DbTallyError};
use crate::exclusions::ExclusionSet;
use crate::models::{DatabaseKind, MetadataRow, ReportOptions};
use crate::Result;
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{Connection, MySqlConnection, Row};

/// MySQL metadata provider.
#[derive(Debug)]
pub struct MySqlProvider {
    exclusions: ExclusionSet,
    include_index_size: bool,
}

impl MySqlProvider {
    /// Creates a provider from report options, merging the built-in system
    /// schemas with the user-supplied exclusions.
    pub fn new(options: &ReportOptions) -> Self {
        Self {
            exclusions: ExclusionSet::for_kind(
                DatabaseKind::MySql,
                &options.db_exclusions,
                &options.table_exclusions,
            ),
            include_index_size: options.include_index_size,
        }
    }

    /// Builds the single catalog query covering all schemas.
    ///
    /// Filters: `table_schema NOT IN (...)` with the merged schema
    /// exclusions always present, and `table_name not in (...)` only when
    /// table exclusions were supplied. The index-size column is only
    /// selected when the report carries it.
    pub fn build_table_query(&self) -> String {
        let columns = if self.include_index_size {
            "table_schema, table_name, data_length, index_length, table_rows"
        } else {
            "table_schema, table_name, data_length, table_rows"
        };

        let table_filter = if self.exclusions.tables().is_empty() {
            String::new()
        } else {
            format!(
                " table_name not in ({}) and",
                self.exclusions.sql_table_list()
            )
        };

        format!(
            "select {columns} FROM information_schema.tables WHERE{table_filter} \
             table_schema NOT IN ({});",
            self.exclusions.sql_database_list()
        )
    }

    /// Normalizes one result row into the uniform report shape.
    ///
    /// `data_length`, `index_length`, and `table_rows` are NULL for views
    /// and some storage engines; NULL is reported as zero.
    fn decode_row(&self, row: &MySqlRow) -> Result<MetadataRow> {
        let database_name: String = row
            .try_get("table_schema")
            .map_err(|e| DbTallyError::decode_field("table_schema", e))?;
        let table_name: String = row
            .try_get("table_name")
            .map_err(|e| DbTallyError::decode_field("table_name", e))?;
        let table_size_bytes: Option<u64> = row
            .try_get("data_length")
            .map_err(|e| DbTallyError::decode_field("data_length", e))?;
        let index_size_bytes = if self.include_index_size {
            let size: Option<u64> = row
                .try_get("index_length")
                .map_err(|e| DbTallyError::decode_field("index_length", e))?;
            Some(clamp_to_i64(size))
        } else {
            None
        };
        let row_count_estimate: Option<u64> = row
            .try_get("table_rows")
            .map_err(|e| DbTallyError::decode_field("table_rows", e))?;

        Ok(MetadataRow {
            database_name,
            table_name,
            table_size_bytes: clamp_to_i64(table_size_bytes),
            index_size_bytes,
            row_count_estimate: clamp_to_i64(row_count_estimate),
        })
    }
}

/// Maps a nullable unsigned catalog value into the report's signed shape.
fn clamp_to_i64(value: Option<u64>) -> i64 {
    value.map_or(0, |v| i64::try_from(v).unwrap_or(i64::MAX))
}

#[async_trait]
impl MetadataProvider for MySqlProvider {
    async fn fetch_information(&self) -> Result<Vec<MetadataRow>> {
        let creds = credentials::load_defaults_file()?;
        let url = creds.connection_url()?;

        tracing::debug!("connecting to {}", redact_database_url(&url));
        let mut conn = MySqlConnection::connect(&url).await.map_err(|e| {
            DbTallyError::connection_failed(
                format!("cannot connect to {}", redact_database_url(&url)),
                e,
            )
        })?;

        let query = self.build_table_query();
        tracing::debug!("executing '{}'", query);
        let fetched = sqlx::query(&query).fetch_all(&mut conn).await;
        close_quietly(conn).await;

        let rows =
            fetched.map_err(|e| DbTallyError::query_failed("table metadata query failed", e))?;

        rows.iter()
            .map(|row| self.decode_row(row))
            .collect::<Result<Vec<_>>>()
    }

    fn database_kind(&self) -> DatabaseKind {
        DatabaseKind::MySql
    }
}
