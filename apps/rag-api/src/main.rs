//! Retrieval API - Entry Point
//!
//! Minimal entry point that delegates to the server module.

use core_config::tracing::install_color_eyre;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();
    rag_api::run().await
}
