use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::client::{Readiness, WebClient};
use crate::collect::extract;
use crate::collect::sources::SourceSpec;
use crate::collect::Candidate;

const DETAIL_TIMEOUT: Duration = Duration::from_secs(20);
const DETAIL_SETTLE: Duration = Duration::from_millis(1500);

/// Visit each candidate's detail page and fill in its air date. Strictly
/// sequential: the target is a single site and politeness beats throughput.
/// A failed visit leaves that one record's date as `None` and moves on.
pub async fn fill_dates<C: WebClient>(client: &C, spec: &SourceSpec, candidates: &mut [Candidate]) {
    if candidates.is_empty() {
        return;
    }

    let pb = ProgressBar::new(candidates.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    for candidate in candidates.iter_mut() {
        pb.set_message(extract::truncate_title(&candidate.title));
        candidate.air_date = match fetch_one(client, spec, &candidate.link).await {
            Ok(date) => date,
            Err(e) => {
                debug!("detail fetch failed for {}: {}", candidate.link, e);
                None
            }
        };
        pb.inc(1);
    }
    pb.finish_and_clear();
}

async fn fetch_one<C: WebClient>(
    client: &C,
    spec: &SourceSpec,
    link: &str,
) -> Result<Option<String>> {
    client
        .navigate(link, Readiness::DomContentLoaded, DETAIL_TIMEOUT)
        .await?;
    client.wait(DETAIL_SETTLE).await;

    // Structural locator first: the smallest block containing the literal
    // prefix, so an unrelated date elsewhere on the page cannot win.
    for prefix in spec.date_prefixes {
        if let Some(block) = client.locate_by_text(prefix).await? {
            let text = client.inner_text(Some(&block)).await.unwrap_or_default();
            if let Some(date) = extract::extract_date(&text, spec.date_prefixes) {
                return Ok(Some(date));
            }
        }
    }

    let body = client.inner_text(None).await?;
    Ok(extract::extract_date(&body, spec.date_prefixes))
}
