use std::cmp::Ordering;

use aggregator::{GlobalStats, HashtagCounts};
use cell::CellId;

pub const DEFAULT_TOP_K: usize = 5;

/// One line of the ranking: a cell, its post count and its top hashtags.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellReport {
    pub cell_id: CellId,
    pub post_count: u64,
    pub top_hashtags: Vec<(String, u64)>,
}

/// `RankedReport` is the final output of a run.
///
/// Cells are ordered by post count, highest first, with ties broken by ascending cell id.
/// Cells without posts are left out.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RankedReport {
    pub cells: Vec<CellReport>,
}

impl RankedReport {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, cell_id: &CellId) -> Option<&CellReport> {
        self.cells.iter().find(|cell| &cell.cell_id == cell_id)
    }
}

fn by_count_then_key<K: Ord>(a: (&K, u64), b: (&K, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Selects the top `k` hashtags, keeping every hashtag tied with the k-th one.
///
/// Hashtags are ordered by count, highest first, then alphabetically. The first `k` are taken and
/// the cut-off is then extended over any following entries with the same count as the k-th.
pub fn top_hashtags(counts: &HashtagCounts, k: usize) -> Vec<(String, u64)> {
    if k == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(&String, u64)> = counts.iter().map(|(tag, &count)| (tag, count)).collect();
    ranked.sort_by(|a, b| by_count_then_key(*a, *b));

    let mut cutoff = k.min(ranked.len());
    if cutoff > 0 {
        let boundary = ranked[cutoff - 1].1;
        while cutoff < ranked.len() && ranked[cutoff].1 == boundary {
            cutoff += 1;
        }
    }

    ranked
        .into_iter()
        .take(cutoff)
        .map(|(tag, count)| (tag.clone(), count))
        .collect()
}

/// Builds the ranked report from merged statistics.
pub fn report(global: &GlobalStats, k: usize) -> RankedReport {
    let mut ranked: Vec<(&CellId, u64)> = global
        .post_count()
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(cell_id, &count)| (cell_id, count))
        .collect();
    ranked.sort_by(|a, b| by_count_then_key(*a, *b));

    let cells = ranked
        .into_iter()
        .map(|(cell_id, post_count)| {
            let top_hashtags = match global.hashtags_in(cell_id) {
                Some(counts) => top_hashtags(counts, k),
                None => Vec::new(),
            };
            CellReport {
                cell_id: cell_id.clone(),
                post_count,
                top_hashtags,
            }
        })
        .collect();

    RankedReport { cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregator::LocalAggregator;
    use cell::{Cell, CellIndex};
    use classifier::ClassifiedRecord;
    use merger::merge;

    fn counts(pairs: &[(&str, u64)]) -> HashtagCounts {
        pairs
            .iter()
            .map(|&(tag, count)| (tag.to_owned(), count))
            .collect()
    }

    fn tags(selected: &[(String, u64)]) -> Vec<&str> {
        selected.iter().map(|&(ref tag, _)| tag.as_str()).collect()
    }

    #[test]
    fn top_k_cuts_below_boundary_value() {
        let counts = counts(&[("a", 5), ("b", 4), ("c", 3), ("d", 3), ("e", 3), ("f", 2)]);

        let selected = top_hashtags(&counts, 5);

        assert_eq!(vec!["a", "b", "c", "d", "e"], tags(&selected));
    }

    #[test]
    fn top_k_includes_every_tie_at_boundary() {
        let counts = counts(&[("a", 5), ("b", 4), ("c", 3), ("d", 3), ("e", 2), ("f", 2)]);

        let selected = top_hashtags(&counts, 5);

        assert_eq!(vec!["a", "b", "c", "d", "e", "f"], tags(&selected));
        assert_eq!(("f".to_owned(), 2), selected[5]);
    }

    #[test]
    fn top_k_extends_past_k_for_ties() {
        let counts = counts(&[("a", 5), ("b", 4), ("c", 3), ("d", 3), ("e", 3), ("f", 3), ("g", 1)]);

        let selected = top_hashtags(&counts, 3);

        assert_eq!(vec!["a", "b", "c", "d", "e", "f"], tags(&selected));
    }

    #[test]
    fn top_k_with_fewer_hashtags_than_k() {
        let counts = counts(&[("b", 1), ("a", 1)]);

        assert_eq!(vec!["a", "b"], tags(&top_hashtags(&counts, 5)));
        assert!(top_hashtags(&HashtagCounts::new(), 5).is_empty());
        assert!(top_hashtags(&counts, 0).is_empty());
    }

    fn global(records: &[(&str, &[&str])]) -> GlobalStats {
        let index = CellIndex::new(vec![
            Cell::new("C", 20.0, 30.0, 0.0, 10.0),
            Cell::new("A", 0.0, 10.0, 0.0, 10.0),
            Cell::new("B", 10.0, 20.0, 0.0, 10.0),
        ]).unwrap();
        let mut aggregator = LocalAggregator::new(&index);
        for &(cell, tags) in records {
            aggregator.accumulate(ClassifiedRecord {
                cell_id: CellId::from(cell),
                hashtags: tags.iter().map(|tag| tag.to_string()).collect(),
            });
        }
        merge(vec![aggregator.snapshot()]).unwrap()
    }

    #[test]
    fn cells_ranked_by_count_then_id() {
        let global = global(&[("C", &[]), ("B", &[]), ("A", &[]), ("B", &[])]);

        let report = report(&global, DEFAULT_TOP_K);
        let order: Vec<(&str, u64)> = report
            .cells
            .iter()
            .map(|cell| (cell.cell_id.as_str(), cell.post_count))
            .collect();

        assert_eq!(vec![("B", 2), ("A", 1), ("C", 1)], order);
    }

    #[test]
    fn zero_post_cells_are_excluded_but_kept_in_stats() {
        let global = global(&[("A", &["#x"])]);

        let report = report(&global, DEFAULT_TOP_K);

        assert_eq!(1, report.cells.len());
        assert!(report.get(&CellId::from("C")).is_none());
        assert_eq!(0, global.posts_in(&CellId::from("C")));
        assert_eq!(vec![("#x".to_owned(), 1)], report.cells[0].top_hashtags);
    }

    #[test]
    fn empty_stats_give_empty_report() {
        let global = global(&[]);

        assert!(report(&global, DEFAULT_TOP_K).is_empty());
    }
}
