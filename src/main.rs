//! Command-line interface for patgen
//!
//! # Usage Examples
//!
//! ```bash
//! # Serials persisted across runs
//! patgen generate 'INV-<+dddd>' --count 3 --counter-file .patgen/invoice.json
//!
//! # Grouped counter formatting
//! patgen generate 'serial: [A-Z]{3}_<+d>' --counter-init 5000 --step 100 --number-format en-US
//!
//! # Argument override for a built-in replacer
//! patgen generate '<?upper>' --arg 'upper="done"'
//!
//! # Everything from a config file
//! patgen generate --config generator.yaml --count 10
//! ```
//!
//! Set `RUST_LOG=pattern_generator=debug` to trace each generation step.

use clap::{Parser, Subcommand};
use patgen::GenerateOpts;

#[derive(Parser)]
#[command(name = "patgen")]
#[command(about = "Generate realistic strings from annotated regular expressions")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate strings from a pattern, one per line
    Generate {
        #[command(flatten)]
        opts: GenerateOpts,
    },

    /// Show the plain pattern and placeholder table of a pattern
    Inspect {
        /// Pattern to compile
        pattern: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { opts } => {
            for line in patgen::run_generate(&opts).await? {
                println!("{line}");
            }
        }
        Commands::Inspect { pattern } => {
            println!("{}", patgen::inspect(&pattern)?);
        }
    }
    Ok(())
}
