//! Snippet ingest
//!
//! Reads a JSON Lines corpus and feeds it to a running retrieval service in
//! fixed-size batches through `/v1/upsert`.

use std::path::PathBuf;

use clap::Parser;
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_retrieval::client::{DEFAULT_BASE_URL, RagClient, RagClientConfig};
use eyre::{Result, WrapErr};

mod ingest;

use ingest::Ingest;

/// Upload timeout; batches of several hundred snippets take a while to embed
const UPLOAD_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(name = "rag-upsert")]
#[command(about = "Upsert JSON Lines snippets into the retrieval service")]
struct Cli {
    /// JSON Lines file, one snippet object per line
    #[arg(default_value = "corpus/snippets.jsonl")]
    file: PathBuf,

    /// Snippets per upsert request
    #[arg(default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    /// Base URL of the retrieval service
    #[arg(long, env = "RAG_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Target collection; the service default when omitted
    #[arg(short, long)]
    collection: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();
    init_tracing(&Environment::from_env());

    let cli = Cli::parse();

    let contents = tokio::fs::read_to_string(&cli.file)
        .await
        .wrap_err_with(|| format!("File not found: {}", cli.file.display()))?;

    let client = RagClient::new(
        RagClientConfig::new(cli.base_url.clone()).with_timeout(UPLOAD_TIMEOUT_SECS),
    )?;

    let ingest = Ingest::new(client, cli.batch_size as usize, cli.collection);
    let total = ingest.run(&contents).await?;

    println!("Done. Upserted {} snippets to {}", total, cli.base_url);
    Ok(())
}
