//! On-failure page snapshots.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use shelfscan_core::StoreContext;

use crate::surface::RenderingSurface;

/// What the page looked like when a harvest failed. Either half may be
/// missing if the surface could not produce it.
#[derive(Debug, Clone)]
pub struct DebugSnapshot {
    pub taken_at: DateTime<Utc>,
    pub screenshot: Option<Vec<u8>>,
    pub html: Option<String>,
}

impl DebugSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screenshot.is_none() && self.html.is_none()
    }
}

/// Grab a best-effort snapshot. Never fails: each half that errors is logged
/// and left out.
pub async fn capture<S: RenderingSurface>(surface: &S) -> DebugSnapshot {
    let screenshot = match surface.screenshot().await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!(error = %e, "debug screenshot unavailable");
            None
        }
    };
    let html = match surface.content().await {
        Ok(html) => Some(html),
        Err(e) => {
            tracing::debug!(error = %e, "debug DOM snapshot unavailable");
            None
        }
    };
    DebugSnapshot {
        taken_at: Utc::now(),
        screenshot,
        html,
    }
}

/// Where debug snapshots go.
pub trait DebugSink {
    /// Persist `snapshot` for `store`, returning the files written.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the snapshot cannot be written.
    fn persist(
        &self,
        store: &StoreContext,
        snapshot: &DebugSnapshot,
    ) -> Result<Vec<PathBuf>, std::io::Error>;
}

/// Writes `debug-<timestamp>.png` / `.html` into `<root>/<slug>/`, next to the
/// store's data files.
#[derive(Debug, Clone)]
pub struct FsDebugSink {
    root: PathBuf,
}

impl FsDebugSink {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DebugSink for FsDebugSink {
    fn persist(
        &self,
        store: &StoreContext,
        snapshot: &DebugSnapshot,
    ) -> Result<Vec<PathBuf>, std::io::Error> {
        let dir = self.root.join(&store.slug);
        std::fs::create_dir_all(&dir)?;

        let stamp = snapshot.taken_at.format("%Y-%m-%dT%H-%M-%S-%3fZ");
        let mut written = Vec::new();

        if let Some(bytes) = &snapshot.screenshot {
            let path = dir.join(format!("debug-{stamp}.png"));
            std::fs::write(&path, bytes)?;
            written.push(path);
        }
        if let Some(html) = &snapshot.html {
            let path = dir.join(format!("debug-{stamp}.html"));
            std::fs::write(&path, html)?;
            written.push(path);
        }

        Ok(written)
    }
}

/// Discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDebugSink;

impl DebugSink for NoDebugSink {
    fn persist(
        &self,
        _store: &StoreContext,
        _snapshot: &DebugSnapshot,
    ) -> Result<Vec<PathBuf>, std::io::Error> {
        Ok(Vec::new())
    }
}
