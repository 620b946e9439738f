//! skycp - copy files to and from S3 and Google Cloud Storage
//!
//! Remote paths use the short notations `s3:<region>:<bucket>:<key>` and
//! `gs://<bucket>/<key>`; everything else is a local path.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod exit_code;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}

/// RUST_LOG wins; otherwise --verbose switches from warn to debug
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
