mod commands;
mod config;
mod logging;
mod serve;
mod wiring;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Deforestation map bot.
#[derive(Parser)]
#[command(name = "deforest", version, about = "Deforestation map bot")]
struct Cli {
    /// Path to the configuration file (default: ./deforest.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one measurement-render-publish cycle and exit with its status
    Run {
        /// Write the status log as JSON to this file when the cycle ends
        #[arg(long)]
        save_log: Option<PathBuf>,
    },

    /// Run one cycle at startup, then serve the status log over HTTP
    Serve {
        /// Port to listen on (default: [server] port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show the latest progress record and recent fetch logs
    History {
        /// Number of fetch logs to show (0 = all)
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&format!("configuration error: {}", e), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    logging::init(&config.log_level);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let msg = format!("failed to create tokio runtime: {}", e);
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Run { save_log } => {
            rt.block_on(commands::run::cmd_run(
                &config,
                save_log.as_deref(),
                cli.output,
                cli.quiet,
            ));
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            if let Err(e) = rt.block_on(serve::start_server(config, port)) {
                report_error(&format!("server error: {}", e), cli.output, cli.quiet);
                process::exit(1);
            }
        }
        Commands::History { limit } => {
            rt.block_on(commands::history::cmd_history(
                &config, limit, cli.output, cli.quiet,
            ));
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
