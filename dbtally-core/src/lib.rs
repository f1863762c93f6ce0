//! Core types, providers, and report writer for dbtally.
//!
//! dbtally connects to a PostgreSQL or MySQL server, enumerates the
//! databases/schemas that survive an exclusion list, pulls per-table size
//! and row-estimate metadata from the system catalogs, and emits one CSV
//! report on standard output.
//!
//! The crate is organized around a single seam: [`providers::MetadataProvider`]
//! with one implementation per backend, both normalizing into
//! [`models::MetadataRow`]. Everything around it (exclusions, credentials,
//! CSV output, error taxonomy) is shared.

pub mod credentials;
pub mod error;
pub mod exclusions;
pub mod logging;
pub mod models;
pub mod output;
pub mod providers;

// Re-export commonly used types
pub use error::{DbTallyError, Result};
pub use exclusions::ExclusionSet;
pub use logging::init_logging;
pub use models::{DatabaseKind, MetadataRow, ReportOptions};
pub use output::write_report;
pub use providers::{create_provider, MetadataProvider};
