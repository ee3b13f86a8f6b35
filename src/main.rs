//! sqlbridge - execute a templated SQL query and print the result as JSON.

use anyhow::Context;
use sqlbridge::cli::Cli;
use sqlbridge::config::{Config, ConnectionConfig};
use sqlbridge::driver::PostgresDriver;
use sqlbridge::{execute, QueryDefinition, StatementMode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries only the result JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    let config = Config::load_from_file(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let connection = resolve_connection(&cli, &config)?;
    let url = connection.to_connection_string()?;
    info!("Connecting to {}", connection.display_string());

    let driver = PostgresDriver::connect(&url).await?;

    let definition = QueryDefinition::template(cli.query.clone());
    let params = cli.request_params()?;
    let mode = if cli.literal {
        StatementMode::Literal
    } else {
        StatementMode::Prepared
    };

    let result = execute(Box::new(driver), &definition, &params, mode).await?;

    for hint in &result.hint_messages {
        warn!("{}: {}", hint.kind.as_str(), hint.detail);
    }
    println!("{}", serde_json::to_string_pretty(&result.data)?);

    Ok(())
}

/// Builds the effective connection config with precedence:
/// 1. CLI arguments (highest)
/// 2. Named connection from config
/// 3. Default connection from config
/// 4. Environment variables
fn resolve_connection(cli: &Cli, config: &Config) -> anyhow::Result<ConnectionConfig> {
    let mut connection = config
        .get_connection(cli.connection_name())
        .cloned()
        .unwrap_or_default();

    if let Some(cli_connection) = cli.to_connection_config()? {
        connection.merge(&cli_connection);
    }

    connection.apply_env_defaults();
    Ok(connection)
}
