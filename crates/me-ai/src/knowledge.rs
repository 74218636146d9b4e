//! The knowledge base: two opaque JSON documents loaded once per process.
//!
//! [`KnowledgeStore`] is a memoizing accessor over an injected
//! [`KnowledgeSource`]. The first successful [`get`](KnowledgeStore::get)
//! reads and parses both documents; every later call returns the same
//! [`Arc`] without touching the source. A failed load is not remembered, so
//! the next call tries again.
//!
//! The documents are never inspected. They are held as [`serde_json::Value`]
//! and re-serialized verbatim into the prompt.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Default directory holding the knowledge documents.
pub const DEFAULT_DATA_DIR: &str = "data";

/// One of the two knowledge documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnowledgeFile {
    /// General biographical facts.
    General,
    /// The list of projects.
    Projects,
}

impl KnowledgeFile {
    pub const ALL: [KnowledgeFile; 2] = [KnowledgeFile::General, KnowledgeFile::Projects];

    /// File name relative to the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            KnowledgeFile::General => "general.json",
            KnowledgeFile::Projects => "projects.json",
        }
    }
}

impl fmt::Display for KnowledgeFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Failure loading the knowledge base.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("failed to read {file}: {source}")]
    Read {
        file: KnowledgeFile,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} is not valid JSON: {source}")]
    Parse {
        file: KnowledgeFile,
        #[source]
        source: serde_json::Error,
    },
}

/// The combined knowledge documents.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct KnowledgeBase {
    pub general: serde_json::Value,
    pub projects: serde_json::Value,
}

// ── Sources ────────────────────────────────────────────────────────

/// Boxed future returned by [`KnowledgeSource::read`].
pub type SourceFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, KnowledgeError>> + Send + 'a>>;

/// Where the raw document text comes from.
pub trait KnowledgeSource: Send + Sync {
    /// Return the raw text of `file`.
    fn read(&self, file: KnowledgeFile) -> SourceFuture<'_>;
}

/// Reads `general.json` and `projects.json` from a directory.
#[derive(Debug, Clone)]
pub struct FsKnowledgeSource {
    dir: PathBuf,
}

impl FsKnowledgeSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, file: KnowledgeFile) -> PathBuf {
        self.dir.join(file.file_name())
    }
}

impl Default for FsKnowledgeSource {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl KnowledgeSource for FsKnowledgeSource {
    fn read(&self, file: KnowledgeFile) -> SourceFuture<'_> {
        let path = self.path_for(file);
        Box::pin(async move {
            debug!(path = %path.display(), "reading knowledge file");
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| KnowledgeError::Read { file, source })
        })
    }
}

/// In-memory documents. Useful for fixtures and for embedding the knowledge
/// in the binary.
#[derive(Debug, Clone)]
pub struct StaticKnowledgeSource {
    general: String,
    projects: String,
}

impl StaticKnowledgeSource {
    pub fn new(general: impl Into<String>, projects: impl Into<String>) -> Self {
        Self {
            general: general.into(),
            projects: projects.into(),
        }
    }
}

impl KnowledgeSource for StaticKnowledgeSource {
    fn read(&self, file: KnowledgeFile) -> SourceFuture<'_> {
        let text = match file {
            KnowledgeFile::General => self.general.clone(),
            KnowledgeFile::Projects => self.projects.clone(),
        };
        Box::pin(async move { Ok(text) })
    }
}

// ── Store ──────────────────────────────────────────────────────────

/// Load-once cache over a [`KnowledgeSource`].
///
/// Concurrent first calls wait on a single loader, so the source sees at most
/// one read per document for the lifetime of the store.
pub struct KnowledgeStore {
    source: Arc<dyn KnowledgeSource>,
    cache: OnceCell<Arc<KnowledgeBase>>,
}

impl KnowledgeStore {
    pub fn new(source: Arc<dyn KnowledgeSource>) -> Self {
        Self {
            source,
            cache: OnceCell::new(),
        }
    }

    /// Return the knowledge base, loading it on first use.
    pub async fn get(&self) -> Result<Arc<KnowledgeBase>, KnowledgeError> {
        self.cache.get_or_try_init(|| self.load()).await.cloned()
    }

    /// Whether a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.cache.initialized()
    }

    async fn load(&self) -> Result<Arc<KnowledgeBase>, KnowledgeError> {
        info!("Loading knowledge...");
        let general = self.read_json(KnowledgeFile::General).await?;
        let projects = self.read_json(KnowledgeFile::Projects).await?;
        Ok(Arc::new(KnowledgeBase { general, projects }))
    }

    async fn read_json(&self, file: KnowledgeFile) -> Result<serde_json::Value, KnowledgeError> {
        let text = self.source.read(file).await?;
        let value = serde_json::from_str(&text)
            .map_err(|source| KnowledgeError::Parse { file, source })?;
        debug!(%file, bytes = text.len(), "parsed knowledge file");
        Ok(value)
    }
}

impl fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
