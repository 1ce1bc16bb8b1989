//! Load-completion detection.
//!
//! Drives an incrementally loading listing (infinite scroll and/or a "load
//! more" control) until the item count stops growing.
//!
//! ```text
//! Scrolling --load action--> AwaitingGrowth --count--> Scrolling
//!                                           \--> Stable     (non-growth streak hit threshold)
//!                                           \--> Exhausted  (round cap hit first)
//! ```

use std::time::Duration;

use serde_json::json;
use shelfscan_core::{LoadMoreConfig, LoadState};

use crate::error::{HarvestError, SurfaceError};
use crate::scripts;
use crate::surface::RenderingSurface;

/// Tuning for [`load_to_completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    /// Bound on waiting for the first item to appear.
    pub first_item_timeout: Duration,
    /// Consecutive non-growth rounds that mean the listing is complete.
    pub stability_threshold: u32,
    /// Hard cap on load rounds.
    pub max_rounds: u32,
    pub scroll_settle: Duration,
    pub click_settle: Duration,
    pub idle_settle: Duration,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            first_item_timeout: Duration::from_secs(30),
            stability_threshold: 5,
            max_rounds: 200,
            scroll_settle: Duration::from_secs(1),
            click_settle: Duration::from_secs(3),
            idle_settle: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Scrolling,
    AwaitingGrowth,
    Stable,
    Exhausted,
}

impl DetectorState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stable | Self::Exhausted)
    }
}

/// The detector's bookkeeping, separated from any page.
#[derive(Debug, Clone)]
pub struct GrowthTracker {
    threshold: u32,
    max_rounds: u32,
    rounds: u32,
    non_growth: u32,
    state: DetectorState,
}

impl GrowthTracker {
    /// `threshold` and `max_rounds` are clamped to at least 1.
    #[must_use]
    pub fn new(threshold: u32, max_rounds: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            max_rounds: max_rounds.max(1),
            rounds: 0,
            non_growth: 0,
            state: DetectorState::Scrolling,
        }
    }

    /// A load action was performed; the count is pending.
    pub fn action_taken(&mut self) {
        self.state = DetectorState::AwaitingGrowth;
    }

    /// Record one round's before/after item counts and advance.
    ///
    /// The non-growth counter is consecutive: any growth resets it.
    pub fn record(&mut self, before: usize, after: usize) -> DetectorState {
        self.rounds += 1;
        if after > before {
            self.non_growth = 0;
        } else {
            self.non_growth += 1;
        }

        self.state = if self.non_growth >= self.threshold {
            DetectorState::Stable
        } else if self.rounds >= self.max_rounds {
            DetectorState::Exhausted
        } else {
            DetectorState::Scrolling
        };
        self.state
    }

    #[must_use]
    pub fn state(&self) -> DetectorState {
        self.state
    }

    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    #[must_use]
    pub fn non_growth(&self) -> u32 {
        self.non_growth
    }
}

/// How loading ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub state: LoadState,
    pub rounds: u32,
    pub item_count: usize,
    pub load_more_clicks: u32,
}

/// Wait for the first item, then scroll and click "load more" until the
/// count of `item_selector` matches settles.
///
/// # Errors
///
/// - [`HarvestError::LoadTimeout`] if no item appears within
///   `settings.first_item_timeout`.
/// - [`HarvestError::Extraction`] if the page cannot be queried mid-loop.
pub async fn load_to_completion<S: RenderingSurface>(
    surface: &S,
    item_selector: &str,
    load_more: Option<&LoadMoreConfig>,
    settings: &LoadSettings,
) -> Result<LoadReport, HarvestError> {
    let appeared = surface
        .wait_for_selector(item_selector, settings.first_item_timeout)
        .await
        .map_err(HarvestError::Extraction)?;
    if !appeared {
        return Err(HarvestError::LoadTimeout {
            selector: item_selector.to_string(),
            timeout_secs: settings.first_item_timeout.as_secs(),
        });
    }

    let mut tracker = GrowthTracker::new(settings.stability_threshold, settings.max_rounds);
    let mut clicks = 0u32;
    let mut count = count_items(surface, item_selector).await?;

    while !tracker.state().is_terminal() {
        let before = count;

        surface
            .evaluate(scripts::SCROLL_TO_BOTTOM, serde_json::Value::Null)
            .await
            .map_err(HarvestError::Extraction)?;
        tracker.action_taken();
        surface.wait_for_timeout(settings.scroll_settle).await;

        if activate_load_more(surface, load_more).await {
            clicks += 1;
            surface.wait_for_timeout(settings.click_settle).await;
        } else {
            surface.wait_for_timeout(settings.idle_settle).await;
        }

        count = count_items(surface, item_selector).await?;
        let state = tracker.record(before, count);
        tracing::debug!(
            round = tracker.rounds(),
            before,
            after = count,
            non_growth = tracker.non_growth(),
            ?state,
            "load round"
        );
    }

    let state = match tracker.state() {
        DetectorState::Exhausted => LoadState::Exhausted,
        _ => LoadState::Stable,
    };

    Ok(LoadReport {
        state,
        rounds: tracker.rounds(),
        item_count: count,
        load_more_clicks: clicks,
    })
}

async fn count_items<S: RenderingSurface>(
    surface: &S,
    item_selector: &str,
) -> Result<usize, HarvestError> {
    surface
        .count(item_selector)
        .await
        .map_err(HarvestError::Extraction)
}

/// Click the first actionable "load more" control. `false` when there is
/// none or the click did not go through; either way the round just counts
/// toward stability.
async fn activate_load_more<S: RenderingSurface>(
    surface: &S,
    load_more: Option<&LoadMoreConfig>,
) -> bool {
    let Some(config) = load_more else {
        return false;
    };

    match find_load_more(surface, config).await {
        Ok(Some(handle)) => match surface.click(&handle).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "load-more click failed");
                false
            }
        },
        Ok(None) => false,
        Err(e) => {
            tracing::debug!(error = %e, "load-more lookup failed");
            false
        }
    }
}

async fn find_load_more<S: RenderingSurface>(
    surface: &S,
    config: &LoadMoreConfig,
) -> Result<Option<S::Handle>, SurfaceError> {
    let selector = config.selectors.join(", ");
    let index = surface
        .evaluate(
            scripts::FIND_LOAD_MORE,
            json!({ "selector": selector, "text": config.text }),
        )
        .await?
        .as_i64()
        .unwrap_or(-1);

    let Ok(index) = usize::try_from(index) else {
        return Ok(None);
    };
    Ok(surface.query_all(&selector).await?.into_iter().nth(index))
}
