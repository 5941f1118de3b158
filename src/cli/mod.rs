pub mod commands;
pub mod error;
pub mod handlers;
pub mod types;

pub use commands::{Cli, Command};
pub use error::CliError;
pub use handlers::{OutputFormat, execute};

use crate::adapters::sqlite::SqliteLibraryStore;
use crate::application::ServiceDependencies;
use crate::config::Config;
use std::io::Write;
use std::sync::Arc;

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Resolve configuration, open the database and run the parsed command
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<(), CliError> {
    let config = Config::from_env()?.with_database_url(cli.database_url.clone());
    run_with_config(cli, &config, out).await
}

pub async fn run_with_config<W: Write>(
    cli: Cli,
    config: &Config,
    out: &mut W,
) -> Result<(), CliError> {
    let format = cli.output_format();

    let store = SqliteLibraryStore::connect(&config.database_url, config.max_connections)
        .await
        .map_err(|e| CliError::Connect(e.to_string()))?;
    let deps = ServiceDependencies::new(Arc::new(store));

    execute(&deps, cli.command, format, out).await
}

/// Write an error the way the chosen output format expects
pub fn report_error<W: Write>(error: &CliError, format: OutputFormat, err_out: &mut W) {
    let written = match format {
        OutputFormat::Json => serde_json::to_string(&types::ErrorResponse::from(error))
            .map_err(std::io::Error::from)
            .and_then(|json| writeln!(err_out, "{}", json)),
        OutputFormat::Text => writeln!(err_out, "error: {}", error),
    };

    if let Err(e) = written {
        tracing::error!("Failed to report error: {}", e);
    }
}
