use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use client_core::{HttpIntakeFormsClient, QuestionCatalog, ScreenFlow};
use tracing_subscriber::EnvFilter;

mod screens;

#[derive(Parser, Debug)]
#[command(about = "Answer the therapy intake questionnaire from a terminal")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3005")]
    server_url: String,
    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let client = HttpIntakeFormsClient::with_timeout(
        &args.server_url,
        Duration::from_secs(args.timeout_secs),
    )?;
    let catalog = Arc::new(QuestionCatalog::standard()?);
    let mut flow = ScreenFlow::new(Arc::new(client), catalog);

    screens::run(&mut flow).await
}
