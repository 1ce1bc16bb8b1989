//! The rendering-surface boundary.
//!
//! Everything the harvester knows about a live page goes through
//! [`RenderingSurface`]. Two implementations ship: [`chromium`] drives a
//! headless Chromium over CDP, [`static_page`] answers the same calls from a
//! saved HTML document.

pub mod chromium;
pub mod static_page;

use std::time::Duration;

use serde_json::Value;

use crate::error::SurfaceError;

pub use chromium::{ChromiumLauncher, ChromiumSurface};
pub use static_page::{StaticLauncher, StaticPage};

/// When `navigate` may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    DomContentLoaded,
    Load,
    /// The load event fired and the network has been quiet for a moment.
    NetworkIdle,
}

/// One exclusive page session.
///
/// Handles returned by [`query_all`](Self::query_all) are only meaningful for
/// the session and page load that produced them.
#[allow(async_fn_in_trait)]
pub trait RenderingSurface {
    type Handle;

    /// # Errors
    ///
    /// Returns `SurfaceError` if the page cannot be loaded.
    async fn navigate(&self, url: &str, wait: WaitCondition) -> Result<(), SurfaceError>;

    /// All elements currently matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError` if the selector is invalid or the page is gone.
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Handle>, SurfaceError>;

    /// How many elements currently match `selector`. Cheaper than
    /// [`query_all`](Self::query_all) when no handle is needed.
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError` if the selector is invalid or the page is gone.
    async fn count(&self, selector: &str) -> Result<usize, SurfaceError>;

    /// Call the in-page function `script` with `args` as its single argument.
    ///
    /// `script` is one of the sources in [`crate::scripts`].
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError` if the script throws or cannot run.
    async fn evaluate(&self, script: &str, args: Value) -> Result<Value, SurfaceError>;

    /// # Errors
    ///
    /// Returns `SurfaceError` if the element is detached or not clickable.
    async fn click(&self, handle: &Self::Handle) -> Result<(), SurfaceError>;

    /// `Ok(false)` when nothing matched before `timeout` elapsed.
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError` if the page cannot be queried.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<bool, SurfaceError>;

    async fn wait_for_timeout(&self, duration: Duration);

    /// # Errors
    ///
    /// Returns `SurfaceError` if the document cannot be serialized.
    async fn content(&self) -> Result<String, SurfaceError>;

    /// Full-page PNG.
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError` if the surface cannot render.
    async fn screenshot(&self) -> Result<Vec<u8>, SurfaceError>;

    /// Release the session and everything it holds.
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError` if teardown reports a failure.
    async fn close(self) -> Result<(), SurfaceError>;
}

/// Opens a fresh [`RenderingSurface`] for each pipeline run.
#[allow(async_fn_in_trait)]
pub trait SurfaceLauncher {
    type Surface: RenderingSurface;

    /// # Errors
    ///
    /// Returns `SurfaceError` if no session could be started.
    async fn launch(&self) -> Result<Self::Surface, SurfaceError>;
}
