// Linkfolio CLI - serves the portfolio API and scrapes page metadata
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use linkfolio::{
    init_logging_with_level, log_operation, start_server, AppState, LinkfolioConfig,
    MetadataService, Operation, OperationContext,
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Linkfolio - curated shop and service links with scraped metadata",
    long_about = None,
    after_help = "EXAMPLES:
  # Start the HTTP API on port 8080, persisting to ./data/portfolio.json
  linkfolio serve --port 8080 --data-file ./data/portfolio.json

  # Preview what the admin console would scrape for a page
  linkfolio scrape https://example.com/"
)]
struct Cli {
    /// Enable verbose logging (DEBUG level). Default is WARN level.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "LINKFOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON file the portfolio is persisted to
        #[arg(short, long)]
        data_file: Option<PathBuf>,
    },

    /// Fetch a page and print its scraped metadata as JSON
    Scrape {
        /// Page URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = LinkfolioConfig::load(cli.config.as_deref())?;

    let quiet = cli.quiet || (config.logging.quiet && !cli.verbose);
    let verbose = !quiet && (cli.verbose || config.logging.verbose);
    init_logging_with_level(verbose, quiet)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_file,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data_file) = data_file {
                config.storage.data_file = data_file;
            }

            log_operation(
                &OperationContext::new("startup"),
                &Operation::Startup {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                &Ok::<(), anyhow::Error>(()),
            );

            let state = AppState::from_config(&config).await?;
            if !quiet {
                println!(
                    "Serving on http://{} (data: {})",
                    config.bind_address(),
                    config.storage.data_file.display()
                );
            }
            start_server(state, &config.bind_address()).await?;
        }
        Commands::Scrape { url } => {
            let service = MetadataService::http(&config.scraper)?;
            let metadata = service.fetch_metadata(url.trim()).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }

    Ok(())
}
