use thiserror::Error;

/// Failures reported by a rendering surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    #[error("invalid CSS selector '{selector}'")]
    InvalidSelector { selector: String },

    #[error("in-page script failed: {0}")]
    Script(String),

    #[error("{0} is not supported by this surface")]
    Unsupported(&'static str),
}

/// Per-store harvest failures. The pipeline converts every one of these into
/// a failed `HarvestResult`; none escape to the scheduler.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("could not open a rendering session: {0}")]
    Session(#[source] SurfaceError),

    #[error("invalid base URL \"{url}\": {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: SurfaceError,
    },

    #[error("no items matching '{selector}' appeared within {timeout_secs}s")]
    LoadTimeout { selector: String, timeout_secs: u64 },

    #[error("extraction failed: {0}")]
    Extraction(#[source] SurfaceError),

    #[error("store harvest exceeded {secs}s")]
    TargetTimeout { secs: u64 },

    #[error("no store records found on {url}")]
    NoLocations { url: String },
}
