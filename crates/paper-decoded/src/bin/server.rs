//! Paper summary server binary
//!
//! Run with: cargo run -p paper-decoded --bin paper-decoded-server

use paper_decoded::{config::RagConfig, server::PaperServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_decoded=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                      Paper Decoded                        ║
║         Research papers, explained as blog posts          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration ($PAPER_DECODED_CONFIG, then defaults)
    let config = RagConfig::load(None)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Chunk size: {} (overlap {})", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - Retrieval k: {}", config.retrieval.top_k);

    let server = PaperServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/upload   - Upload a PDF (field 'file')");
    println!("  POST /api/summary  - Generate the blog summary");
    println!("  GET  /api/session  - Session state and summary so far");
    println!("  DELETE /api/session - Drop the current paper and start over");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
