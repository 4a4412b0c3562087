//! Storygate - Feedback and Story Intake Gate
//!
//! Command-line entry point: runs the HTTP server, submits stories, prints
//! analytics, exports the submission log and redeems reward codes.

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storygate_core::error::Result;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "storygate")]
#[command(about = "Feedback and story intake gate with tiered rewards", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long, env = "STORYGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Document path (overrides storage.path)
    #[arg(long)]
    data: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address (overrides server.addr)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Submit feedback or a story
    Submit {
        /// User identifier
        #[arg(short, long)]
        user: String,

        /// E-mail address for the reward code
        #[arg(long)]
        contact: Option<String>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,

        /// Submission text ("-" reads stdin)
        text: String,
    },

    /// Show analytics
    Summary {
        /// Print the summary as JSON instead of the text report
        #[arg(long)]
        json: bool,
    },

    /// Export the submission log
    Export {
        /// Output file (format from extension: .json, .jsonl, .csv, .md); stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format when writing to stdout
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Redeem a reward code
    Redeem {
        /// Reward code
        code: String,

        /// Vendor redeeming the code
        #[arg(long)]
        vendor: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: cli::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Use the requested level for storygate, keep request tracing quieter
    let filter = EnvFilter::new(format!(
        "storygate={level},storygate_core={level},tower_http=warn",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Storygate v{} starting...", env!("CARGO_PKG_VERSION"));

    let options = cli::helpers::GlobalOptions {
        config: cli.config,
        data: cli.data,
    };

    match cli.command {
        Commands::Serve { addr } => cli::serve::handle(&options, addr).await,
        Commands::Submit {
            user,
            contact,
            json,
            text,
        } => cli::submit::handle(&options, user, contact, text, json).await,
        Commands::Summary { json } => cli::summary::handle(&options, json).await,
        Commands::Export { output, format } => cli::export::handle(&options, output, format).await,
        Commands::Redeem { code, vendor } => cli::redeem::handle(&options, code, vendor).await,
        Commands::Config { action } => cli::config::handle(&options, action).await,
    }
}
