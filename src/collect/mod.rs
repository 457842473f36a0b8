pub mod dedup;
pub mod detail;
pub mod extract;
pub mod paginate;
pub mod sources;

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::info;

use crate::client::WebClient;
use crate::db::WebinarRecord;
use sources::SourceSpec;

/// A listing item that survived field extraction but is not yet persisted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    pub air_date: Option<String>,
    pub link: String,
}

pub struct SourceOutcome {
    pub records: Vec<WebinarRecord>,
    /// Candidates found across all listing pages.
    pub discovered: usize,
    /// Already-known links dropped before their detail visit.
    pub skipped: usize,
}

/// Run one source end to end: navigate, paginate, extract, filter against
/// the store's known links, then detail-fetch dates where the listing does
/// not carry them. An error here means the listing itself was unreachable;
/// everything past that point degrades per item instead of failing.
pub async fn run_source<C: WebClient>(
    client: &C,
    spec: &SourceSpec,
    existing: &HashSet<String>,
) -> Result<SourceOutcome> {
    info!("{}: opening {}", spec.name, spec.url);
    client
        .navigate(spec.url, spec.readiness, spec.nav_timeout)
        .await
        .with_context(|| format!("{}: listing unreachable", spec.name))?;
    client.wait(spec.settle).await;

    let candidates = paginate::collect_candidates(client, spec).await;
    let discovered = candidates.len();

    let (records, skipped) = if spec.date_on_listing {
        // Dates came with the listing; re-affirming known rows costs nothing,
        // so everything goes to the store.
        let records = candidates
            .into_iter()
            .map(|c| into_record(spec, c))
            .collect();
        (records, 0)
    } else {
        let part = dedup::partition_known(candidates, existing);
        let skipped = part.known.len();
        let mut fresh = part.fresh;
        detail::fill_dates(client, spec, &mut fresh).await;
        let records = fresh.into_iter().map(|c| into_record(spec, c)).collect();
        (records, skipped)
    };

    info!(
        "{}: {} discovered, {} skipped as known",
        spec.name, discovered, skipped
    );
    Ok(SourceOutcome {
        records,
        discovered,
        skipped,
    })
}

fn into_record(spec: &SourceSpec, candidate: Candidate) -> WebinarRecord {
    WebinarRecord {
        source: spec.name.to_string(),
        title: extract::truncate_title(&candidate.title),
        air_date: candidate.air_date,
        link: candidate.link,
    }
}
