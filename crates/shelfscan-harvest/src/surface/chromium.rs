//! Headless Chromium over the DevTools protocol.
//!
//! Each [`ChromiumSurface`] owns its own browser process, so pipelines never
//! share a session.

use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::{json, Value};
use shelfscan_core::AppConfig;
use tokio::task::JoinHandle;

use crate::error::SurfaceError;
use crate::scripts;
use crate::surface::{RenderingSurface, SurfaceLauncher, WaitCondition};

/// Poll interval for [`RenderingSurface::wait_for_selector`].
const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// Quiet period after the load event before `NetworkIdle` navigation returns.
const NETWORK_IDLE_GRACE: Duration = Duration::from_millis(1500);

impl From<CdpError> for SurfaceError {
    fn from(err: CdpError) -> Self {
        match err {
            CdpError::Timeout => SurfaceError::Timeout {
                what: "browser response".to_string(),
                secs: 0,
            },
            other => SurfaceError::Protocol(other.to_string()),
        }
    }
}

/// Launch settings for one Chromium session.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    pub headless: bool,
    /// Sent as `--lang` so localized storefronts render the expected locale.
    pub locale: String,
    pub navigation_timeout: Duration,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            headless: config.headless,
            locale: config.locale.clone(),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        }
    }
}

impl SurfaceLauncher for ChromiumLauncher {
    type Surface = ChromiumSurface;

    async fn launch(&self) -> Result<ChromiumSurface, SurfaceError> {
        let mut builder = BrowserConfig::builder()
            .arg(format!("--lang={}", self.locale))
            .request_timeout(self.navigation_timeout);
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(SurfaceError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SurfaceError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        match browser.new_page("about:blank").await {
            Ok(page) => Ok(ChromiumSurface {
                browser,
                page,
                handler_task,
                navigation_timeout: self.navigation_timeout,
            }),
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::debug!(error = %close_err, "browser close after failed launch");
                }
                handler_task.abort();
                Err(SurfaceError::Launch(e.to_string()))
            }
        }
    }
}

pub struct ChromiumSurface {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl RenderingSurface for ChromiumSurface {
    type Handle = Element;

    async fn navigate(&self, url: &str, wait: WaitCondition) -> Result<(), SurfaceError> {
        let secs = self.navigation_timeout.as_secs();
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| SurfaceError::Timeout {
                what: format!("navigation to {url}"),
                secs,
            })??;

        if wait == WaitCondition::NetworkIdle {
            tokio::time::sleep(NETWORK_IDLE_GRACE).await;
        }
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>, SurfaceError> {
        Ok(self.page.find_elements(selector).await?)
    }

    async fn count(&self, selector: &str) -> Result<usize, SurfaceError> {
        let value = self
            .evaluate(scripts::COUNT_MATCHES, json!({ "selector": selector }))
            .await?;
        value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| SurfaceError::Script(format!("non-numeric match count: {value}")))
    }

    async fn evaluate(&self, script: &str, args: Value) -> Result<Value, SurfaceError> {
        let expression = format!("({script})({args})");
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(SurfaceError::Script)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| SurfaceError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn click(&self, handle: &Element) -> Result<(), SurfaceError> {
        handle.click().await?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, SurfaceError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.count(selector).await? > 0 {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }

    async fn wait_for_timeout(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn content(&self) -> Result<String, SurfaceError> {
        Ok(self.page.content().await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SurfaceError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn close(mut self) -> Result<(), SurfaceError> {
        if let Err(e) = self.page.close().await {
            tracing::debug!(error = %e, "page close failed, closing browser anyway");
        }
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "browser process did not exit cleanly");
        }
        self.handler_task.abort();
        closed.map(|_| ()).map_err(SurfaceError::from)
    }
}
