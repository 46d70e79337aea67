//! # DETECT
//!
//! Command-line entry point.
//!
//! - `detect` / `detect run`: classify the model's stored selection, print
//!   the size banner and write the CSV files
//! - `detect inputs`: list the input fields and their weighted options
//! - `detect serve`: start the web mode

use clap::{Parser, Subcommand};
use detect::cli::{cmd_inputs, cmd_run, cmd_serve, render_inputs};
use detect::config::{
    DEFAULT_DOCS_FILE, DEFAULT_HOST, DEFAULT_MODEL_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_PORT,
    DEFAULT_THEME, ServerConfig, THEME_ENV,
};
use detect::error::AppResult;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "detect", version, about = "DETECT system size classifier")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the system size and write the CSV files (default)
    Run(RunArgs),

    /// List the available input fields and their options
    Inputs {
        #[arg(long, default_value = DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Serve the web form
    Serve {
        #[arg(long, default_value_t = DEFAULT_HOST)]
        host: IpAddr,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        #[arg(long, default_value = DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,

        /// Markdown file shown on the landing page
        #[arg(long, default_value = DEFAULT_DOCS_FILE)]
        docs: PathBuf,

        /// Theme color of the pages
        #[arg(long, env = THEME_ENV, default_value = DEFAULT_THEME)]
        theme: String,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "detect failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Option<Command>) -> AppResult<()> {
    match command {
        None => {
            let args = RunArgs {
                model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
                output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            };
            cmd_run(&args.model_dir, &args.output_dir).map(|_| ())
        }
        Some(Command::Run(args)) => cmd_run(&args.model_dir, &args.output_dir).map(|_| ()),
        Some(Command::Inputs { model_dir, json }) => {
            let inputs = cmd_inputs(&model_dir)?;
            print!("{}", render_inputs(&inputs, json)?);
            Ok(())
        }
        Some(Command::Serve {
            host,
            port,
            model_dir,
            docs,
            theme,
        }) => {
            cmd_serve(ServerConfig {
                host,
                port,
                model_dir,
                docs,
                theme,
            })
            .await
        }
    }
}
