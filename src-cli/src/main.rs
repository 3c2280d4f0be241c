mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use fold::{merge_documents_async, FoldOptions};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run(Cli::parse()).await {
        error!(error = %err, "merge failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut options = match &cli.config {
        Some(path) => FoldOptions::load(path)?,
        None => FoldOptions::default(),
    };
    if cli.no_prefetch {
        options.prefetch = false;
    }

    let output = cli.output.display().to_string();
    let report = merge_documents_async(cli.template, cli.sources, cli.output, options)
        .await
        .with_context(|| format!("merge into {} failed", output))?;

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
