use std::collections::HashSet;

use tracing::{debug, info, warn};
use url::Url;

use crate::client::WebClient;
use crate::collect::extract;
use crate::collect::sources::{Pagination, SourceSpec};
use crate::collect::Candidate;

/// Drive a navigated listing through its pages and return the union of
/// candidates found. Stops when the next control is missing or disabled,
/// the page cap is reached, or a page yields zero previously-unseen links
/// (a stuck control would otherwise loop forever). Failures to advance end
/// pagination without discarding what was already collected.
pub async fn collect_candidates<C: WebClient>(client: &C, spec: &SourceSpec) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for page_num in 1..=spec.max_pages {
        let items = query_items(client, spec).await;
        let mut new_on_page = 0;

        for item in &items {
            match extract::candidate_from_item(client, spec, item).await {
                Ok(Some(candidate)) => {
                    if seen.insert(candidate.link.clone()) {
                        out.push(candidate);
                        new_on_page += 1;
                    }
                }
                Ok(None) => {}
                // One malformed card never aborts the batch.
                Err(e) => debug!("skipping unreadable item on page {}: {}", page_num, e),
            }
        }

        info!(
            "{}: page {} had {} items, {} new (total {})",
            spec.name,
            page_num,
            items.len(),
            new_on_page,
            out.len()
        );

        if new_on_page == 0 {
            break;
        }
        if page_num == spec.max_pages {
            break;
        }
        if !advance(client, spec, page_num).await {
            break;
        }
        client.wait(spec.settle).await;
    }

    out
}

/// First item selector that matches anything wins; the sets exist because
/// these sites reshuffle their markup between visits.
async fn query_items<C: WebClient>(client: &C, spec: &SourceSpec) -> Vec<C::Handle> {
    for selector in spec.item_selectors {
        match client.query_all(None, selector).await {
            Ok(items) if !items.is_empty() => return items,
            Ok(_) => {}
            Err(e) => debug!("{}: selector {:?} failed: {}", spec.name, selector, e),
        }
    }
    Vec::new()
}

async fn advance<C: WebClient>(client: &C, spec: &SourceSpec, page_num: usize) -> bool {
    match spec.pagination {
        Pagination::None => false,
        Pagination::NextButton { selector } => {
            let buttons = client.query_all(None, selector).await.unwrap_or_default();
            let Some(button) = buttons.first() else {
                return false;
            };
            if !client.is_enabled(button).await.unwrap_or(false) {
                return false;
            }
            match client.click(button).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("{}: next click failed on page {}: {}", spec.name, page_num, e);
                    false
                }
            }
        }
        Pagination::PageParam { param } => {
            let next_url = page_url(spec.url, param, page_num + 1);
            match client
                .navigate(&next_url, spec.readiness, spec.nav_timeout)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    warn!("{}: failed to open page {}: {}", spec.name, page_num + 1, e);
                    false
                }
            }
        }
    }
}

fn page_url(base: &str, param: &str, page: usize) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair(param, &page.to_string());
            url.to_string()
        }
        Err(_) => format!("{}&{}={}", base, param, page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_appends_param() {
        assert_eq!(
            page_url("https://synd.io/resources/?_type=webinar", "_page", 2),
            "https://synd.io/resources/?_type=webinar&_page=2"
        );
    }
}
