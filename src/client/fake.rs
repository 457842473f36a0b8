//! Scripted in-memory client. Pages are either registered by URL or queued
//! as a click-through sequence behind a listing URL.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{Readiness, WebClient};

#[derive(Debug, Clone, Default)]
pub struct FakeItem {
    pub href: Option<String>,
    pub text: String,
    pub heading: Option<String>,
    pub enclosing: Option<String>,
    /// When set, any read of this item errors.
    pub broken: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub items: Vec<FakeItem>,
    pub body: String,
    pub next_present: bool,
    pub next_enabled: bool,
}

#[derive(Debug, Clone)]
pub enum FakeHandle {
    Item(usize),
    Heading(usize),
    Next,
    Body,
}

#[derive(Default)]
struct State {
    pages: HashMap<String, FakePage>,
    sequence: Vec<FakePage>,
    sequence_url: Option<String>,
    seq_pos: usize,
    current: FakePage,
    navigations: Vec<String>,
    clicks: usize,
    fail_urls: HashSet<String>,
}

#[derive(Default)]
pub struct FakeClient {
    state: Mutex<State>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a detail (or standalone) page under its URL.
    pub fn add_page(&self, url: &str, page: FakePage) {
        self.state.lock().unwrap().pages.insert(url.into(), page);
    }

    /// Register a listing whose next-control clicks step through `pages`.
    pub fn add_sequence(&self, url: &str, pages: Vec<FakePage>) {
        let mut state = self.state.lock().unwrap();
        state.sequence_url = Some(url.into());
        state.sequence = pages;
    }

    pub fn fail_navigation(&self, url: &str) {
        self.state.lock().unwrap().fail_urls.insert(url.into());
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn clicks(&self) -> usize {
        self.state.lock().unwrap().clicks
    }

    fn item(state: &State, idx: usize) -> Result<FakeItem> {
        let item = state
            .current
            .items
            .get(idx)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("stale handle {}", idx))?;
        if item.broken {
            bail!("element read failed");
        }
        Ok(item)
    }
}

#[async_trait]
impl WebClient for FakeClient {
    type Handle = FakeHandle;

    async fn navigate(&self, url: &str, _readiness: Readiness, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if state.fail_urls.contains(url) {
            bail!("navigation to {} failed", url);
        }
        if state.sequence_url.as_deref() == Some(url) {
            state.seq_pos = 0;
            state.current = state.sequence.first().cloned().unwrap_or_default();
        } else if let Some(page) = state.pages.get(url).cloned() {
            state.current = page;
        } else {
            state.current = FakePage::default();
        }
        Ok(())
    }

    async fn wait(&self, _duration: Duration) {}

    async fn query_all(
        &self,
        scope: Option<&Self::Handle>,
        selector: &str,
    ) -> Result<Vec<Self::Handle>> {
        let state = self.state.lock().unwrap();
        match scope {
            None => {
                if selector.starts_with("button") {
                    if state.current.next_present {
                        return Ok(vec![FakeHandle::Next]);
                    }
                    return Ok(Vec::new());
                }
                Ok((0..state.current.items.len()).map(FakeHandle::Item).collect())
            }
            Some(FakeHandle::Item(idx)) => {
                let has_heading = state
                    .current
                    .items
                    .get(*idx)
                    .is_some_and(|i| i.heading.is_some());
                if has_heading {
                    Ok(vec![FakeHandle::Heading(*idx)])
                } else {
                    Ok(Vec::new())
                }
            }
            Some(_) => Ok(Vec::new()),
        }
    }

    async fn attribute(&self, handle: &Self::Handle, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        match handle {
            FakeHandle::Item(idx) => {
                let item = Self::item(&state, *idx)?;
                Ok(match name {
                    "href" => item.href,
                    _ => None,
                })
            }
            _ => Ok(None),
        }
    }

    async fn inner_text(&self, scope: Option<&Self::Handle>) -> Result<String> {
        let state = self.state.lock().unwrap();
        match scope {
            None | Some(FakeHandle::Body) => Ok(state.current.body.clone()),
            Some(FakeHandle::Item(idx)) => Ok(Self::item(&state, *idx)?.text),
            Some(FakeHandle::Heading(idx)) => {
                Ok(Self::item(&state, *idx)?.heading.unwrap_or_default())
            }
            Some(FakeHandle::Next) => Ok("Next".into()),
        }
    }

    async fn locate_by_text(&self, literal: &str) -> Result<Option<Self::Handle>> {
        let state = self.state.lock().unwrap();
        if state.current.body.contains(literal) {
            Ok(Some(FakeHandle::Body))
        } else {
            Ok(None)
        }
    }

    async fn click(&self, handle: &Self::Handle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let FakeHandle::Next = handle {
            state.clicks += 1;
            if state.current.next_enabled && state.seq_pos + 1 < state.sequence.len() {
                state.seq_pos += 1;
                state.current = state.sequence[state.seq_pos].clone();
            }
            // A stuck control leaves the page unchanged.
        }
        Ok(())
    }

    async fn is_enabled(&self, handle: &Self::Handle) -> Result<bool> {
        let state = self.state.lock().unwrap();
        match handle {
            FakeHandle::Next => Ok(state.current.next_enabled),
            _ => Ok(true),
        }
    }

    async fn enclosing_text(
        &self,
        handle: &Self::Handle,
        min_len: usize,
        _max_hops: usize,
    ) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        match handle {
            FakeHandle::Item(idx) => Ok(Self::item(&state, *idx)?
                .enclosing
                .filter(|t| t.len() >= min_len)),
            _ => Ok(None),
        }
    }
}
