use anyhow::Context;
use clap::Parser;
use sales_predictor::core::ConfigProvider;
use sales_predictor::utils::{logger, validation::Validate};
use sales_predictor::{CliConfig, LocalArtifactStore, ServingContext};
use std::io::Read;

#[derive(Parser)]
#[command(name = "predict-once")]
#[command(about = "Run a single prediction through the serving pipeline and print the result")]
struct Args {
    /// Request JSON; read from stdin when omitted
    request: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding the model and encoder artifacts
    #[arg(long)]
    artifacts_dir: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_stderr_logger(args.verbose);

    let cli = CliConfig {
        config: args.config.clone(),
        artifacts_dir: args.artifacts_dir.clone(),
        verbose: args.verbose,
        ..CliConfig::default()
    };
    let config = cli.resolve().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let store = LocalArtifactStore::new(config.artifacts_dir());
    let context = ServingContext::load_core(&store, &config)
        .await
        .context("Failed to load model artifacts")?;

    let raw = match args.request {
        Some(raw) => raw,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read request from stdin")?;
            buffer
        }
    };

    let outcome = context.predict_once(&raw);
    println!("{}", outcome.body);
    if outcome.exit_code != 0 {
        std::process::exit(outcome.exit_code);
    }
    Ok(())
}
