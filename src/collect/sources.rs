use std::time::Duration;

use crate::client::Readiness;

/// How a listing advances to its next page.
#[derive(Debug, Clone, Copy)]
pub enum Pagination {
    /// Single page, nothing to advance.
    None,
    /// Click a next control until it disappears or disables.
    NextButton { selector: &'static str },
    /// Re-navigate with a page-number query parameter.
    PageParam { param: &'static str },
}

/// Everything source-specific, as data. The collector engine is shared;
/// when a site changes markup, the fix is here, not in code. Selector and
/// pattern sets are ordered by specificity and tried until one matches.
pub struct SourceSpec {
    pub name: &'static str,
    pub url: &'static str,
    /// Origin for resolving relative hrefs.
    pub base: &'static str,
    pub readiness: Readiness,
    pub nav_timeout: Duration,
    /// Fixed wait after navigation and page transitions; the sites render
    /// client-side and expose no load-complete signal.
    pub settle: Duration,
    pub item_selectors: &'static [&'static str],
    pub title_selectors: &'static [&'static str],
    /// Phrases that mark a text line as a label or button, never a title.
    pub boilerplate: &'static [&'static str],
    pub min_title_len: usize,
    /// Literal prefixes tried before the bare calendar-date fallback.
    pub date_prefixes: &'static [&'static str],
    /// When false, the air date only appears on each item's detail page.
    pub date_on_listing: bool,
    pub pagination: Pagination,
    pub max_pages: usize,
}

pub const SOURCES: &[SourceSpec] = &[
    SourceSpec {
        name: "Syndio",
        url: "https://synd.io/resources/?_type=webinar",
        base: "https://synd.io",
        readiness: Readiness::DomContentLoaded,
        nav_timeout: Duration::from_secs(60),
        settle: Duration::from_secs(3),
        item_selectors: &[
            "a[href*='synd.io/webinar']",
            "a[href*='/resources/webinar']",
            ".resource-card a[href]",
        ],
        title_selectors: &["h3", ".card-title"],
        boilerplate: &["WEBINAR", "Watch now", "Aired on"],
        min_title_len: 20,
        date_prefixes: &["Aired on:"],
        date_on_listing: true,
        pagination: Pagination::PageParam { param: "_page" },
        max_pages: 5,
    },
    SourceSpec {
        name: "WorldatWork",
        url: "https://worldatwork.org/webinars?delivery=ondemand",
        base: "https://worldatwork.org",
        readiness: Readiness::NetworkIdle,
        nav_timeout: Duration::from_secs(30),
        settle: Duration::from_secs(3),
        item_selectors: &["a[href*='/product/redirect/']"],
        title_selectors: &[],
        boilerplate: &[
            "Featured",
            "On Demand",
            "Gain Recertification Credits",
            "Register",
            "Member Only Access",
            "Exclusive",
        ],
        min_title_len: 15,
        date_prefixes: &["On Demand until"],
        date_on_listing: false,
        pagination: Pagination::NextButton {
            selector: "nav button[aria-label*='Next']",
        },
        max_pages: 10,
    },
    SourceSpec {
        name: "Pave",
        url: "https://www.pave.com/insights/events-and-webinars",
        base: "https://www.pave.com",
        readiness: Readiness::NetworkIdle,
        nav_timeout: Duration::from_secs(30),
        settle: Duration::from_secs(2),
        item_selectors: &["a[href*='explore.pave.com']"],
        title_selectors: &["h1", "h3", ".heading-style-h5", ".heading-style-h3"],
        boilerplate: &["Aired on", "Watch now", "Learn more"],
        min_title_len: 10,
        date_prefixes: &["Aired on:"],
        date_on_listing: true,
        pagination: Pagination::None,
        max_pages: 1,
    },
];
