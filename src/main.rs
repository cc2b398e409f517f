use std::{io, process::ExitCode};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Args, Config};
use pipeline::Pipeline;

mod config;
mod downloader;
mod filter;
mod format;
mod location;
mod parser;
mod pipeline;
mod resolver;

/// Diagnostics go to stderr so they never mix with the extracted links.
/// `RUST_LOG` takes precedence over `--debug`.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::try_from(args)?;
    let pipeline = Pipeline::new(config)?;

    let stdout = io::stdout();
    let count = pipeline.run(&mut stdout.lock()).await?;
    tracing::info!("{} entries written", count);

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
