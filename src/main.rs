use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::sync::Arc;

use reportview_cli::api::{ReportClient, ReportTransport};
use reportview_cli::config::Config;
use reportview_cli::init_runtime_config;
use reportview_cli::realtime;
use reportview_cli::route::{PREPARED_REPORT_OPTION, Route};
use reportview_cli::tui::apps::report_view::{Params, ReportViewApp};
use reportview_cli::tui::{Runtime, RuntimeConfig, event_bus};

#[derive(Parser)]
#[command(name = "reportview-cli")]
#[command(about = "A terminal client for viewing server-defined query reports")]
struct Cli {
    /// Override the configured server URL
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a report in the viewer
    View {
        /// Report name; omit to open the empty report page
        report: Option<String>,

        /// Filter value as `key=value`; repeatable
        #[arg(long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,

        /// Open a specific prepared-report artifact by name
        #[arg(long)]
        prepared: Option<String>,
    },

    /// List the reports visible to the current user
    List,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("invalid filter `{raw}`: expected key=value"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a file (truncate on each run); the terminal belongs to
    // the TUI.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("reportview-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting reportview-cli");

    let mut config = Config::load()?;
    if let Some(server) = cli.server {
        config.server.host = server;
    }
    init_runtime_config(RuntimeConfig::from_config(&config));

    let client = Arc::new(ReportClient::new(&config.server));

    match cli.command {
        Commands::List => list_command(client).await,

        Commands::View {
            report,
            filters,
            prepared,
        } => {
            let mut segments = vec![config.ui.default_page.clone()];
            if let Some(report) = report {
                segments.push(report);
            }
            let mut options = filters;
            if let Some(prepared) = prepared {
                options.push((PREPARED_REPORT_OPTION.to_string(), prepared));
            }
            let route = Route::new(segments).with_options(options);

            let _listener =
                realtime::spawn_listener(client.clone(), event_bus().clone(), "report".to_string());

            let transport: Arc<dyn ReportTransport> = client;
            Runtime::<ReportViewApp>::new(Params { route, transport })
                .run()
                .await
        }
    }
}

async fn list_command(client: Arc<ReportClient>) -> Result<()> {
    let reports = client.list_reports().await?;
    if reports.is_empty() {
        println!("No reports available.");
        return Ok(());
    }

    let width = reports.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for report in reports {
        println!(
            "{:width$}  {:24}  {}",
            report.name,
            report.report_type,
            report.ref_doctype,
            width = width
        );
    }
    Ok(())
}
