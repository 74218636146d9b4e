//! HTTP front door for `me-ai`.
//!
//! One endpoint, `POST /ask`, takes `{"message": "..."}` and answers
//! `{"reply": "..."}` using the Layton knowledge base and a chat completions
//! API. Errors come back as `{"error": "..."}`: 400 for a missing message,
//! 500 with a generic text for anything else.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use me_ai::OpenAiClient;
//! use me_ai::knowledge::{FsKnowledgeSource, KnowledgeStore};
//! use me_ai_web::{AppState, spawn_web};
//!
//! let knowledge = KnowledgeStore::new(Arc::new(FsKnowledgeSource::new("data")));
//! let client = OpenAiClient::new(std::env::var("OPENAI_API_KEY")?)?;
//! let addr = spawn_web(AppState::new(knowledge, client), ([127, 0, 0, 1], 3000).into()).await?;
//! println!("listening on http://{addr}");
//! ```
//!
//! # Request flow
//!
//! ```text
//! POST /ask ─▶ validate ─▶ KnowledgeStore::get ─▶ build_prompt ─▶ CompletionBackend::complete ─▶ {"reply"}
//!                 │                 │                                         │
//!                 └─ 400            └─ 500                                    └─ 500
//! ```

mod api;
pub mod config;
pub mod error;
pub mod server;

pub use api::{AppState, AskReply, AskRequest};
pub use config::ServeConfig;
pub use error::{AppError, ErrorBody};

use std::io;
use std::net::SocketAddr;

/// Spawn the web server on a Tokio task and return the bound address.
///
/// Bind to port 0 to let the OS pick one. The server runs until the Tokio
/// runtime shuts down.
pub async fn spawn_web(state: AppState, bind_addr: SocketAddr) -> io::Result<SocketAddr> {
    let router = server::build_router(state);
    server::start_server(router, bind_addr).await
}
