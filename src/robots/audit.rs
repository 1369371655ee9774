// src/robots/audit.rs
// =============================================================================
// The refusal log: an append-only text file of domains we refused to crawl,
// one per line. A domain lands here when its robots.txt addresses a specific
// agent instead of `*`.
//
// The event is always logged through tracing; the file is optional.
// =============================================================================

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Default file name, relative to the working directory
pub const DEFAULT_REFUSAL_LOG: &str = "not_allowed_to_query.txt";

#[derive(Debug, Clone, Default)]
pub struct RefusalLog {
    path: Option<PathBuf>,
}

impl RefusalLog {
    /// Appends to the file at `path`, creating it on first use.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Logs refusals through tracing only.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// The file refusals go to, or None when only tracing sees them.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records that `domain` was refused.
    ///
    /// Failing to write the file is logged and otherwise ignored; the crawl
    /// already knows what to do with the domain.
    pub async fn record(&self, domain: &str) {
        warn!(domain = %domain, "robots.txt restricts named agents, refusing the whole domain");

        let Some(path) = &self.path else {
            return;
        };

        if let Err(e) = append_line(path, domain).await {
            warn!(path = %path.display(), error = %e, "could not append to refusal log");
        }
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{}\n", line).as_bytes()).await?;
    file.flush().await
}
