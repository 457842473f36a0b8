use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Readiness, WebClient};

/// Candidate containers scanned by `locate_by_text`. Kept small: scanning
/// every node on script-heavy marketing pages is too slow.
const TEXT_SCOPES: &str = "h1, h2, h3, h4, h5, p, span, li, div";
const TEXT_SCAN_CAP: usize = 400;

/// Headless Chrome over CDP. One browser, one tab, reused for every
/// navigation in a run.
pub struct ChromeClient {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeClient {
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| anyhow!("browser config: {}", e))?;
        let (browser, mut events) = Browser::launch(config)
            .await
            .context("failed to launch headless Chrome")?;

        // The CDP event stream must be drained or the connection stalls.
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!("cdp handler: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl WebClient for ChromeClient {
    type Handle = Element;

    async fn navigate(&self, url: &str, readiness: Readiness, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            anyhow::Ok(())
        })
        .await
        .map_err(|_| anyhow!("navigation to {} timed out after {:?}", url, timeout))??;

        // CDP has no first-class network-idle signal; a short grace period
        // after load is the closest equivalent.
        if readiness == Readiness::NetworkIdle {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn query_all(
        &self,
        scope: Option<&Self::Handle>,
        selector: &str,
    ) -> Result<Vec<Self::Handle>> {
        // chromiumoxide errors on zero matches; the pipeline treats that as
        // an empty result, not a failure.
        let found = match scope {
            Some(el) => el.find_elements(selector).await,
            None => self.page.find_elements(selector).await,
        };
        Ok(found.unwrap_or_default())
    }

    async fn attribute(&self, handle: &Self::Handle, name: &str) -> Result<Option<String>> {
        Ok(handle.attribute(name).await?)
    }

    async fn inner_text(&self, scope: Option<&Self::Handle>) -> Result<String> {
        match scope {
            Some(el) => Ok(el.inner_text().await?.unwrap_or_default()),
            None => {
                let text: String = self
                    .page
                    .evaluate("document.body ? document.body.innerText : ''")
                    .await?
                    .into_value()?;
                Ok(text)
            }
        }
    }

    async fn locate_by_text(&self, literal: &str) -> Result<Option<Self::Handle>> {
        let candidates = self.query_all(None, TEXT_SCOPES).await?;
        let mut best: Option<(usize, Element)> = None;
        for el in candidates.into_iter().take(TEXT_SCAN_CAP) {
            let Ok(Some(text)) = el.inner_text().await else {
                continue;
            };
            if text.contains(literal) {
                let len = text.len();
                if best.as_ref().is_none_or(|(l, _)| len < *l) {
                    best = Some((len, el));
                }
            }
        }
        Ok(best.map(|(_, el)| el))
    }

    async fn click(&self, handle: &Self::Handle) -> Result<()> {
        handle.click().await?;
        Ok(())
    }

    async fn is_enabled(&self, handle: &Self::Handle) -> Result<bool> {
        let disabled = handle.attribute("disabled").await?.is_some();
        let aria = handle
            .attribute("aria-disabled")
            .await?
            .is_some_and(|v| v == "true");
        Ok(!disabled && !aria)
    }

    async fn enclosing_text(
        &self,
        handle: &Self::Handle,
        min_len: usize,
        max_hops: usize,
    ) -> Result<Option<String>> {
        let js = format!(
            "function() {{
                let p = this.parentElement;
                for (let i = 0; i < {max_hops}; i++) {{
                    if (p && p.innerText && p.innerText.length >= {min_len}) {{
                        return p.innerText;
                    }}
                    if (p) p = p.parentElement;
                }}
                return null;
            }}"
        );
        let result = handle.call_js_fn(js, false).await?;
        let text = result
            .result
            .value
            .and_then(|v| v.as_str().map(str::to_string));
        Ok(text)
    }
}
