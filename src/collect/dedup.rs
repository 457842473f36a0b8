use std::collections::HashSet;

use crate::collect::Candidate;

pub struct Partition {
    /// Links the store has never seen; these earn a detail visit.
    pub fresh: Vec<Candidate>,
    /// Already-known links, dropped before any network cost is spent.
    pub known: Vec<Candidate>,
}

/// Split candidates against the store's existing-link set for the source.
/// Filtering happens before any detail fetch, so per-run network cost is
/// bounded by the number of genuinely new items, not catalog size.
pub fn partition_known(candidates: Vec<Candidate>, existing: &HashSet<String>) -> Partition {
    let (known, fresh) = candidates
        .into_iter()
        .partition(|c| existing.contains(&c.link));
    Partition { fresh, known }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(link: &str) -> Candidate {
        Candidate {
            title: "Some webinar title".into(),
            air_date: None,
            link: link.into(),
        }
    }

    #[test]
    fn splits_known_from_fresh() {
        let existing: HashSet<String> =
            ["https://w.org/1".to_string(), "https://w.org/2".to_string()].into();
        let candidates = vec![
            candidate("https://w.org/1"),
            candidate("https://w.org/2"),
            candidate("https://w.org/3"),
        ];

        let part = partition_known(candidates, &existing);
        assert_eq!(part.known.len(), 2);
        assert_eq!(part.fresh.len(), 1);
        assert_eq!(part.fresh[0].link, "https://w.org/3");
    }

    #[test]
    fn empty_store_keeps_everything() {
        let part = partition_known(vec![candidate("https://w.org/1")], &HashSet::new());
        assert!(part.known.is_empty());
        assert_eq!(part.fresh.len(), 1);
    }

    #[test]
    fn known_link_with_changed_title_is_still_skipped() {
        let existing: HashSet<String> = [String::from("https://w.org/1")].into();
        let mut cand = candidate("https://w.org/1");
        cand.title = "Retitled since last run".into();
        let part = partition_known(vec![cand], &existing);
        assert_eq!(part.known.len(), 1);
        assert!(part.fresh.is_empty());
    }
}
