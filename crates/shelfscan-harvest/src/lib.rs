pub mod cascade;
pub mod debug;
pub mod dedup;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod load;
pub mod locator;
pub mod pipeline;
pub mod price;
pub(crate) mod retry;
pub mod schedule;
pub mod scripts;
pub mod surface;

pub use cascade::{first_non_empty, resolve_item_selector, CascadeMatch};
pub use debug::{capture, DebugSink, DebugSnapshot, FsDebugSink, NoDebugSink};
pub use dedup::{canonical_url, dedup_products, DedupStore};
pub use descriptor::{ExtractionDescriptor, FieldRule, ReadMode};
pub use error::{HarvestError, SurfaceError};
pub use extract::{draft_product, read_items, ProductDraft, RawItemFields};
pub use load::{load_to_completion, DetectorState, GrowthTracker, LoadReport, LoadSettings};
pub use locator::{discover_store_locations, extract_store_locations};
pub use pipeline::{harvest_store, HarvestOptions};
pub use price::{parse_prices, PriceQuote};
pub use schedule::{partition, run_shard, shard_stores, ShardPlan};
pub use surface::{
    ChromiumLauncher, ChromiumSurface, RenderingSurface, StaticLauncher, StaticPage,
    SurfaceLauncher, WaitCondition,
};
