use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, error};
use xeroq::auth::Credentials;
use xeroq::config::Config;
use xeroq::gateway::HttpGateway;
use xeroq::present::{export_csv, export_filename, TableView};
use xeroq::scenario::Catalog;
use xeroq::server::ApiServer;
use xeroq::session::SessionState;

/// Query the Xero API with Custom Connection credentials
#[derive(Parser)]
#[command(name = "xeroq")]
#[command(about = "Scenario-driven Xero API queries with table and CSV output", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the scenario catalog
    #[arg(long, default_value = "scenarios.json", global = true)]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scenarios in the catalog
    Scenarios,
    /// Execute a scenario and render or export the result
    Query {
        /// Scenario id from the catalog
        #[arg(short, long)]
        scenario: String,

        /// Custom Connection client ID (or XERO_CLIENT_ID)
        #[arg(long)]
        client_id: Option<String>,

        /// Custom Connection client secret (or XERO_CLIENT_SECRET)
        #[arg(long)]
        client_secret: Option<String>,

        /// Scenario parameter as name=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Sort by column, e.g. "Total" or "Total:desc"
        #[arg(long)]
        sort: Option<String>,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("xeroq started with verbosity level: {}", cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let catalog = Catalog::load(&cli.catalog)
        .with_context(|| format!("failed to load scenario catalog {}", cli.catalog.display()))?;

    match cli.command {
        Commands::Scenarios => {
            for scenario in catalog.scenarios() {
                println!("{:<24} {}", scenario.id, scenario.name);
                if !scenario.description.is_empty() {
                    println!("{:<24} {}", "", scenario.description);
                }
            }
            Ok(())
        }
        Commands::Query {
            scenario,
            client_id,
            client_secret,
            params,
            format,
            sort,
            output,
        } => {
            run_query(
                catalog,
                scenario,
                client_id,
                client_secret,
                params,
                format,
                sort,
                output,
            )
            .await
        }
        Commands::Serve { port } => {
            let config = Config::from_env();
            let gateway = HttpGateway::new(config.timeout_secs)?;
            ApiServer::new(Box::new(gateway), config, catalog, port)
                .start()
                .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_query(
    catalog: Catalog,
    scenario_id: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    params: Vec<String>,
    format: OutputFormat,
    sort: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let scenario = catalog.find(&scenario_id).ok_or_else(|| {
        let available: Vec<&str> = catalog.scenarios().iter().map(|s| s.id.as_str()).collect();
        anyhow!(
            "unknown scenario '{scenario_id}'; available: {}",
            available.join(", ")
        )
    })?;

    let credentials = Credentials::new(
        client_id
            .or_else(|| std::env::var("XERO_CLIENT_ID").ok())
            .unwrap_or_default(),
        client_secret
            .or_else(|| std::env::var("XERO_CLIENT_SECRET").ok())
            .unwrap_or_default(),
    );

    let values = parse_params(&params)?;
    let config = Config::from_env();
    let gateway = HttpGateway::new(config.timeout_secs)?;

    let state = SessionState::default().with_scenario(scenario.clone());
    let state = state.execute(&gateway, &config, &credentials, &values).await?;
    let rows = state.rows.unwrap_or_default();
    println!(
        "{} {} returned",
        rows.len(),
        if rows.len() == 1 { "row" } else { "rows" }
    );

    let mut view = TableView::new(rows);
    if let Some(fields) = &scenario.display_fields {
        view = view.with_columns(fields.clone());
    }
    if let Some(sort) = sort {
        let (column, descending) = match sort.rsplit_once(':') {
            Some((column, "desc")) => (column, true),
            Some((column, "asc")) => (column, false),
            _ => (sort.as_str(), false),
        };
        view.cycle_sort(column);
        if descending {
            view.cycle_sort(column);
        }
    }

    let rendered = match format {
        OutputFormat::Table => view.to_text(),
        OutputFormat::Csv => export_csv(view.sorted_rows())?,
        OutputFormat::Json => {
            serde_json::to_string_pretty(&view.sorted_rows())? + "\n"
        }
    };

    let destination = match (&output, format) {
        (Some(path), _) => Some(path.clone()),
        // CSV defaults to the download-style filename when no path is given.
        (None, OutputFormat::Csv) => Some(PathBuf::from(export_filename(
            Some(&scenario.name),
            chrono::Utc::now().date_naive(),
        ))),
        _ => None,
    };

    match destination {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn parse_params(params: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for param in params {
        match param.split_once('=') {
            Some((name, value)) => {
                values.insert(name.to_string(), value.to_string());
            }
            None => bail!("invalid --param '{param}', expected name=value"),
        }
    }
    Ok(values)
}
