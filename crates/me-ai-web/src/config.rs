//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable, and `main` loads a
//! `.env` file before parsing, so a plain `PORT=8080 me-ai-web` works.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use me_ai::knowledge::{DEFAULT_DATA_DIR, FsKnowledgeSource, KnowledgeStore};
use me_ai::{CompletionError, DEFAULT_MODEL, OPENAI_API_BASE, OpenAiClient};

use crate::api::AppState;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,me_ai=debug,me_ai_web=debug";

/// Chat API that answers questions about Layton.
#[derive(Parser, Clone)]
#[command(name = "me-ai-web", about = "Chat API that answers questions about Layton")]
pub struct ServeConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Directory containing general.json and projects.json.
    #[arg(long, env = "KNOWLEDGE_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Completion model.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = OPENAI_API_BASE)]
    pub api_base: String,

    /// API key for the completion provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,
}

impl ServeConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Wire the filesystem knowledge store and the OpenAI client into an
    /// [`AppState`].
    pub fn app_state(&self) -> Result<AppState, CompletionError> {
        let client = OpenAiClient::new(&self.api_key)?
            .with_api_base(&self.api_base)
            .with_model(&self.model);
        let knowledge = KnowledgeStore::new(Arc::new(FsKnowledgeSource::new(&self.data_dir)));
        Ok(AppState::new(knowledge, client))
    }
}

impl std::fmt::Debug for ServeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("data_dir", &self.data_dir)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
