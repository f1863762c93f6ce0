//! Table size and row-count reporting tool.
//!
//! Connects to a local PostgreSQL or MySQL server, enumerates the
//! databases/schemas that survive the exclusion list, and prints per-table
//! size, index-size, and row-estimate metadata as CSV on standard output.
//! Logs go to standard error so the report stays pipeable.

use clap::{ArgAction, Parser, ValueEnum};
use dbtally_core::{
    create_provider, init_logging, write_report, DatabaseKind, DbTallyError, ReportOptions, Result,
};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "dbtally")]
#[command(about = "Retrieves information about table sizes and their number of rows")]
#[command(version)]
#[command(long_about = "
dbtally - per-table size and row-estimate reporting

Connects to a local database server, skips system databases/schemas plus
anything excluded on the command line, and prints one CSV record per table
with its data size, index size, and approximate row count from the
catalog statistics.

CREDENTIALS:
- PostgreSQL: postgres@localhost with driver-default (trust/peer) auth
- MySQL: [client] section of ~/.my.cnf, falling back to root@localhost

EXAMPLES:
  dbtally -t postgresql
  dbtally -t postgresql --exclude-db analytics --exclude-table audit_log
  dbtally -t mysql --exclude-db staging > report.csv
")]
struct Cli {
    /// Database software to report on.
    #[arg(short = 't', long, value_enum)]
    software_type: SoftwareType,

    /// Exclude a database/schema from the report. Repeatable.
    #[arg(long = "exclude-db", value_name = "NAME", action = ArgAction::Append)]
    db_exclusions: Vec<String>,

    /// Exclude a table from the report. Repeatable.
    #[arg(long = "exclude-table", value_name = "NAME", action = ArgAction::Append)]
    table_exclusions: Vec<String>,

    /// Drop the index_size column (older four-column report shape).
    #[arg(long)]
    no_index_size: bool,

    /// Increase verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors. Wins over --verbose.
    #[arg(short, long)]
    quiet: bool,
}

/// CLI-facing backend selector, kept separate from the core enum so clap
/// stays out of the library crate.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SoftwareType {
    /// PostgreSQL-family server.
    Postgresql,
    /// MySQL-family server.
    Mysql,
}

impl From<SoftwareType> for DatabaseKind {
    fn from(software_type: SoftwareType) -> Self {
        match software_type {
            SoftwareType::Postgresql => Self::PostgreSql,
            SoftwareType::Mysql => Self::MySql,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("{e}");
        return ExitCode::from(1);
    }

    ExitCode::from(exit_code_for(run(&cli).await))
}

/// Maps the run outcome to a process exit code.
///
/// An empty result means the exclusions left nothing to query:
/// informational, not a failure. Everything else nonzero.
fn exit_code_for(result: Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(DbTallyError::EmptyResult { message }) => {
            warn!("{}", message);
            0
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}

/// Parses options into a provider, fetches, and writes the report.
async fn run(cli: &Cli) -> Result<()> {
    let options = ReportOptions::new()
        .with_db_exclusions(cli.db_exclusions.clone())
        .with_table_exclusions(cli.table_exclusions.clone())
        .with_index_size(!cli.no_index_size);

    let kind = DatabaseKind::from(cli.software_type);
    let provider = create_provider(kind, &options)?;
    info!("fetching table metadata from {} server", provider.database_kind());

    let rows = provider.fetch_information().await?;
    if rows.is_empty() {
        info!("no information returned, perhaps you should check your exclusion list");
        return Ok(());
    }

    write_report(std::io::stdout().lock(), &rows, options.include_index_size)
}
