//! Ordered-fallback resolution.

use crate::error::SurfaceError;
use crate::surface::RenderingSurface;

/// The item-container selector chosen for one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeMatch {
    pub selector: String,
    pub count: usize,
}

impl CascadeMatch {
    /// `false` means no candidate matched and `selector` is the last
    /// candidate, kept as the "site changed" fallback.
    #[must_use]
    pub fn has_coverage(&self) -> bool {
        self.count > 0
    }
}

/// Returns the first candidate whose reader yields a value.
///
/// Candidates are tried in order and reading stops at the first hit.
pub fn first_non_empty<C, T, F>(candidates: C, read: F) -> Option<T>
where
    C: IntoIterator,
    F: FnMut(C::Item) -> Option<T>,
{
    candidates.into_iter().find_map(read)
}

/// Picks the first selector in `candidates` that matches anything on the
/// page, with its match count.
///
/// When nothing matches, the last candidate comes back with a count of zero
/// rather than an error.
///
/// # Errors
///
/// Returns `SurfaceError` if `candidates` is empty or the page cannot be
/// queried.
pub async fn resolve_item_selector<S: RenderingSurface>(
    surface: &S,
    candidates: &[String],
) -> Result<CascadeMatch, SurfaceError> {
    let Some(last) = candidates.last() else {
        return Err(SurfaceError::InvalidSelector {
            selector: String::new(),
        });
    };

    for selector in candidates {
        let count = surface.count(selector).await?;
        if count > 0 {
            tracing::debug!(selector = %selector, count, "item selector resolved");
            return Ok(CascadeMatch {
                selector: selector.clone(),
                count,
            });
        }
    }

    Ok(CascadeMatch {
        selector: last.clone(),
        count: 0,
    })
}
