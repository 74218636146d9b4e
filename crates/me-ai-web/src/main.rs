//! Run the `/ask` chat API.
//!
//! # Usage
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run -p me-ai-web
//! OPENAI_API_KEY=sk-... cargo run -p me-ai-web -- --port 8080 --data-dir ./data
//! ```
//!
//! Then:
//!
//! ```bash
//! curl -s localhost:3000/ask -H 'content-type: application/json' \
//!   -d '{"message": "What are you working on?"}'
//! ```

use clap::Parser;
use me_ai_web::ServeConfig;
use me_ai_web::config::DEFAULT_LOG_FILTER;
use me_ai_web::server::{build_router, serve};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = ServeConfig::parse();
    info!(
        data_dir = %config.data_dir.display(),
        model = %config.model,
        api_base = %config.api_base,
        "starting me-ai-web"
    );

    let state = config.app_state()?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "API running on port {}", addr.port());

    serve(listener, build_router(state), shutdown_signal()).await?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
