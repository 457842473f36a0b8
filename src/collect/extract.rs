use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use url::Url;

use crate::client::WebClient;
use crate::collect::sources::SourceSpec;
use crate::collect::Candidate;

pub const MAX_TITLE_LEN: usize = 200;

/// Item text shorter than this is probably a bare button or anchor; the
/// card's real text is recovered with a bounded ancestor walk.
const CARD_TEXT_MIN: usize = 50;
const ANCESTOR_HOPS: usize = 10;

const MONTHS: &str = "January|February|March|April|May|June|July\
|August|September|October|November|December";

static BARE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"({MONTHS})\s+(\d{{1,2}})\s*,?\s*(\d{{4}})")).unwrap()
});

/// Collapse runs of whitespace (including newlines) to single spaces.
/// Listing markup splits date parts across sibling text nodes, so raw
/// innerText arrives as "Aired on:\nNovember\n \n20\n, \n2025".
pub fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Date strategy chain: each literal prefix in order, then a bare
/// `<Month> <day>, <year>` anywhere in the text. Never guesses; a miss is
/// `None`, not an error.
pub fn extract_date(text: &str, prefixes: &[&str]) -> Option<String> {
    let clean = normalize_ws(text);

    for prefix in prefixes {
        let re = Regex::new(&format!(
            r"{}\s*({MONTHS})\s+(\d{{1,2}})\s*,?\s*(\d{{4}})",
            regex::escape(prefix)
        ))
        .unwrap();
        if let Some(caps) = re.captures(&clean) {
            return Some(format!("{} {}, {}", &caps[1], &caps[2], &caps[3]));
        }
    }

    BARE_DATE_RE
        .captures(&clean)
        .map(|caps| format!("{} {}, {}", &caps[1], &caps[2], &caps[3]))
}

/// Semantic title fallback: the first normalized line that is long enough
/// to be a real title and is not a known label or button caption.
pub fn title_from_text(text: &str, boilerplate: &[&str], min_len: usize) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| line.chars().count() >= min_len && !is_boilerplate(line, boilerplate))
        .map(truncate_title)
}

fn is_boilerplate(line: &str, phrases: &[&str]) -> bool {
    phrases
        .iter()
        .any(|p| line.eq_ignore_ascii_case(p) || line.contains(p))
}

pub fn truncate_title(s: &str) -> String {
    if s.chars().count() <= MAX_TITLE_LEN {
        s.to_string()
    } else {
        s.chars().take(MAX_TITLE_LEN).collect()
    }
}

/// Resolve an href to an absolute http(s) URL, joining relative paths
/// against the source's base origin. Anything else is rejected.
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let url = match Url::parse(href) {
        Ok(u) => u,
        Err(_) => Url::parse(base).ok()?.join(href).ok()?,
    };
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

/// Run the field strategies against one listing item. `Ok(None)` means the
/// item is noise (no usable link or title); `Err` means a page read failed
/// and the caller should skip just this item.
pub async fn candidate_from_item<C: WebClient>(
    client: &C,
    spec: &SourceSpec,
    item: &C::Handle,
) -> Result<Option<Candidate>> {
    let href = match client.attribute(item, "href").await? {
        Some(h) => Some(h),
        None => match client.query_all(Some(item), "a[href]").await?.first() {
            Some(anchor) => client.attribute(anchor, "href").await?,
            None => None,
        },
    };
    let Some(link) = href.and_then(|h| absolutize(spec.base, &h)) else {
        return Ok(None);
    };

    let mut text = client.inner_text(Some(item)).await?;
    if text.trim().len() < CARD_TEXT_MIN {
        if let Some(card) = client
            .enclosing_text(item, CARD_TEXT_MIN, ANCESTOR_HOPS)
            .await?
        {
            text = card;
        }
    }

    let mut title = None;
    for selector in spec.title_selectors {
        if let Some(heading) = client.query_all(Some(item), selector).await?.first() {
            let heading_text = client.inner_text(Some(heading)).await?;
            let trimmed = heading_text.trim();
            if trimmed.chars().count() >= spec.min_title_len {
                title = Some(truncate_title(trimmed));
                break;
            }
        }
    }
    let Some(title) =
        title.or_else(|| title_from_text(&text, spec.boilerplate, spec.min_title_len))
    else {
        return Ok(None);
    };

    let air_date = if spec.date_on_listing {
        extract_date(&text, spec.date_prefixes)
    } else {
        None
    };

    Ok(Some(Candidate {
        title,
        air_date,
        link,
    }))
}
