//! Scripted rendering surface shared by the integration suites.
//!
//! Item counts advance on each scroll from a fixed schedule, so load
//! detection can be driven deterministically without a browser.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Map, Value};
use shelfscan_core::{parse_target_site, StoreContext, TargetSite};
use shelfscan_harvest::{scripts, RenderingSurface, SurfaceError, SurfaceLauncher, WaitCondition};

pub const ITEMS: &str = "li.tile";
pub const LOAD_MORE: &str = "button.more";
pub const CONSENT: &str = "button.accept";

/// Handle of the consent button; item and load-more handles are indices.
const CONSENT_HANDLE: usize = usize::MAX;

/// Counters the test inspects after the surface has been consumed.
#[derive(Debug, Default)]
pub struct Counters {
    pub launches: AtomicU32,
    pub navigations: AtomicU32,
    pub scrolls: AtomicU32,
    pub clicks: AtomicU32,
    pub consent_clicks: AtomicU32,
    /// `query_all` calls against the item selector; counting should not need them.
    pub item_handle_queries: AtomicU32,
    pub closed: AtomicU32,
}

impl Counters {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct Script {
    /// Items present right after navigation.
    pub initial: usize,
    /// Item count after each scroll; the last value holds once it runs out.
    pub after_scroll: Vec<usize>,
    pub first_item_appears: bool,
    pub load_more_visible: bool,
    /// A cookie banner matching [`CONSENT`] covers the page until clicked.
    pub consent_visible: bool,
    pub click_fails: bool,
    /// Navigations that fail with a transient error before one succeeds.
    pub failing_navigations: u32,
    pub navigation_delay: Duration,
    pub launch_fails: bool,
    /// What the extraction script returns.
    pub items: Value,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            initial: 1,
            after_scroll: Vec::new(),
            first_item_appears: true,
            load_more_visible: false,
            consent_visible: false,
            click_fails: false,
            failing_navigations: 0,
            navigation_delay: Duration::ZERO,
            launch_fails: false,
            items: json!([]),
        }
    }
}

impl Script {
    /// One more item per scroll for `growth` scrolls, then flat.
    pub fn growing(initial: usize, growth: usize) -> Self {
        Self {
            initial,
            after_scroll: (1..=growth).map(|n| initial + n).collect(),
            ..Self::default()
        }
    }
}

pub struct ScriptedPage {
    script: Script,
    counters: Arc<Counters>,
    count: AtomicUsize,
    pending: Mutex<VecDeque<usize>>,
    navigation_failures_left: AtomicU32,
    consent_open: AtomicBool,
    closed: AtomicBool,
}

impl ScriptedPage {
    pub fn new(script: Script, counters: Arc<Counters>) -> Self {
        Self {
            count: AtomicUsize::new(script.initial),
            pending: Mutex::new(script.after_scroll.iter().copied().collect()),
            navigation_failures_left: AtomicU32::new(script.failing_navigations),
            consent_open: AtomicBool::new(script.consent_visible),
            closed: AtomicBool::new(false),
            script,
            counters,
        }
    }

    fn scroll(&self) {
        self.counters.scrolls.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.pending.lock().unwrap().pop_front() {
            self.count.store(next, Ordering::SeqCst);
        }
    }
}

impl RenderingSurface for ScriptedPage {
    type Handle = usize;

    async fn navigate(&self, _url: &str, _wait: WaitCondition) -> Result<(), SurfaceError> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        if !self.script.navigation_delay.is_zero() {
            tokio::time::sleep(self.script.navigation_delay).await;
        }
        let left = self.navigation_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.navigation_failures_left.store(left - 1, Ordering::SeqCst);
            return Err(SurfaceError::Protocol("net::ERR_CONNECTION_RESET".to_string()));
        }
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<usize>, SurfaceError> {
        if selector == LOAD_MORE {
            return Ok(if self.script.load_more_visible { vec![0] } else { Vec::new() });
        }
        if selector == CONSENT {
            let open = self.consent_open.load(Ordering::SeqCst);
            return Ok(if open { vec![CONSENT_HANDLE] } else { Vec::new() });
        }
        if selector == ITEMS {
            self.counters.item_handle_queries.fetch_add(1, Ordering::SeqCst);
            return Ok((0..self.count.load(Ordering::SeqCst)).collect());
        }
        Ok(Vec::new())
    }

    async fn count(&self, selector: &str) -> Result<usize, SurfaceError> {
        if selector == ITEMS {
            return Ok(self.count.load(Ordering::SeqCst));
        }
        if selector == LOAD_MORE {
            return Ok(usize::from(self.script.load_more_visible));
        }
        if selector == CONSENT {
            return Ok(usize::from(self.consent_open.load(Ordering::SeqCst)));
        }
        Ok(0)
    }

    async fn evaluate(&self, script: &str, _args: Value) -> Result<Value, SurfaceError> {
        match script {
            scripts::SCROLL_TO_BOTTOM => {
                self.scroll();
                Ok(Value::Null)
            }
            scripts::FIND_LOAD_MORE => Ok(json!(if self.script.load_more_visible { 0 } else { -1 })),
            scripts::EXTRACT_ITEMS => Ok(self.script.items.clone()),
            _ => Err(SurfaceError::Unsupported("unknown script")),
        }
    }

    async fn click(&self, handle: &usize) -> Result<(), SurfaceError> {
        if *handle == CONSENT_HANDLE {
            self.consent_open.store(false, Ordering::SeqCst);
            self.counters.consent_clicks.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }
        if self.script.click_fails {
            return Err(SurfaceError::Protocol("element is not clickable".to_string()));
        }
        self.counters.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<bool, SurfaceError> {
        Ok(self.script.first_item_appears)
    }

    async fn wait_for_timeout(&self, _duration: Duration) {}

    async fn content(&self) -> Result<String, SurfaceError> {
        Ok("<html><body><ul></ul></body></html>".to_string())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SurfaceError> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn close(self) -> Result<(), SurfaceError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub struct ScriptedLauncher {
    pub script: Script,
    pub counters: Arc<Counters>,
}

impl ScriptedLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            counters: Arc::new(Counters::default()),
        }
    }
}

impl SurfaceLauncher for ScriptedLauncher {
    type Surface = ScriptedPage;

    async fn launch(&self) -> Result<ScriptedPage, SurfaceError> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.script.launch_fails {
            return Err(SurfaceError::Launch("chrome not found".to_string()));
        }
        Ok(ScriptedPage::new(self.script.clone(), Arc::clone(&self.counters)))
    }
}

/// A target site whose selectors line up with [`ScriptedPage`] and with the
/// tile markup used by static-page tests.
pub fn site() -> TargetSite {
    parse_target_site(
        r"
base_url: https://shop.example.com
category_url: https://shop.example.com/en-CA/clearance/
item_container_selectors: [li.product-grid__item, li.tile]
consent_selectors: ['#onetrust-accept-btn-handler', button.accept]
load_more:
  selectors: [button.more]
  text: show more
default_badge: Clearance
fields:
  title: [h3]
  link: [a]
  brand: [.brand]
  image: [img]
  price: ['[class*=price]']
  badge: [.badge]
",
    )
    .unwrap()
}

pub fn store(name: &str) -> StoreContext {
    StoreContext {
        name: name.to_string(),
        slug: shelfscan_core::slugify(name),
        city: None,
        metadata: Map::new(),
    }
}
