//! Evaluate one article from the command line and print the result as JSON.
//!
//! Usage: `evaluate <url> <query...>`

use anyhow::{bail, Context};
use article_credibility::{bootstrap::Runtime, EvaluationRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        bail!("usage: evaluate <url> <query...>");
    };
    let query = args.collect::<Vec<_>>().join(" ");

    let rt = Runtime::from_default_path().context("loading credibility config")?;
    let result = rt
        .evaluator
        .evaluate(&EvaluationRequest::new(url, query))
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
