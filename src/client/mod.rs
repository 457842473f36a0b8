pub mod chrome;

#[cfg(test)]
pub mod fake;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// How long to wait for a navigation before giving up on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// DOM parsed; scripts may still be fetching content.
    DomContentLoaded,
    /// No in-flight requests; safest for listings rendered client-side.
    NetworkIdle,
}

/// The capability surface the pipeline needs from a controllable web client.
///
/// The collectors depend only on this trait, never on a concrete browser.
/// Scoped queries take `Some(handle)`; `None` means the whole page. The
/// scraped sites expose no reliable load-complete signal, so callers follow
/// navigations and page transitions with a fixed settle `wait`.
#[async_trait]
pub trait WebClient: Send + Sync {
    type Handle: Send + Sync;

    async fn navigate(&self, url: &str, readiness: Readiness, timeout: Duration) -> Result<()>;

    async fn wait(&self, duration: Duration);

    async fn query_all(
        &self,
        scope: Option<&Self::Handle>,
        selector: &str,
    ) -> Result<Vec<Self::Handle>>;

    async fn attribute(&self, handle: &Self::Handle, name: &str) -> Result<Option<String>>;

    /// Visible text of an element, or of the whole page for `None`.
    async fn inner_text(&self, scope: Option<&Self::Handle>) -> Result<String>;

    /// First element whose visible text contains `literal`, smallest match
    /// preferred. Used to anchor date extraction on detail pages.
    async fn locate_by_text(&self, literal: &str) -> Result<Option<Self::Handle>>;

    async fn click(&self, handle: &Self::Handle) -> Result<()>;

    async fn is_enabled(&self, handle: &Self::Handle) -> Result<bool>;

    /// Bounded ancestor walk: text of the nearest enclosing block whose
    /// visible text is at least `min_len` chars, giving up after `max_hops`
    /// parents. Recovers a card's full text when the matched element is a
    /// bare button or anchor.
    async fn enclosing_text(
        &self,
        handle: &Self::Handle,
        min_len: usize,
        max_hops: usize,
    ) -> Result<Option<String>>;
}
