//! skillfuzz CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use skillfuzz_core::pipeline::Variant;

mod commands;

#[derive(Parser)]
#[command(name = "skillfuzz", version, about = "Fuzzy-logic skill-level scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP scoring service
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Score request JSON files offline
    Score {
        /// Request file or directory of request files
        #[arg(long)]
        input: PathBuf,

        /// Pipeline variant: topic or quiz
        #[arg(long)]
        variant: Variant,

        /// Pipeline definition overriding the configured one
        #[arg(long)]
        pipeline: Option<PathBuf>,

        /// Directory to save a JSON report in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Max concurrent requests (defaults to the configured value)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a pipeline definition
    Validate {
        /// Pipeline TOML file
        #[arg(long)]
        pipeline: PathBuf,

        /// Pipeline variant: topic or quiz
        #[arg(long)]
        variant: Variant,
    },

    /// Create a starter config and the built-in pipeline definitions
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "skillfuzz=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, host, port } => commands::serve::execute(config, host, port).await,
        Commands::Score {
            input,
            variant,
            pipeline,
            output,
            parallelism,
            config,
        } => commands::score::execute(input, variant, pipeline, output, parallelism, config).await,
        Commands::Validate { pipeline, variant } => commands::validate::execute(pipeline, variant),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
