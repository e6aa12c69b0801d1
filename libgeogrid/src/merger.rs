use aggregator::{GlobalStats, LocalStats};
use cell::CellId;
use errors::*;

/// `merge` combines the `LocalStats` of every worker into one `GlobalStats`.
///
/// Post counts and hashtag counts are summed element-wise, with an absent hashtag counting as
/// zero. Addition is commutative and associative, so the result does not depend on the order of
/// `stats_list` or on how the input was partitioned.
///
/// # Errors
///
/// * `NoWorkerStats` if `stats_list` is empty.
/// * `SchemaMismatch` if the inputs do not all cover the same set of cell ids.
pub fn merge(stats_list: Vec<LocalStats>) -> Result<GlobalStats> {
    let mut inputs = stats_list.into_iter();
    let first = match inputs.next() {
        Some(stats) => stats,
        None => return Err(ErrorKind::NoWorkerStats.into()),
    };

    let expected: Vec<CellId> = first.cell_ids();
    let (mut post_count, mut hashtag_count) = first.into_parts();

    for stats in inputs {
        let found = stats.cell_ids();
        if found != expected {
            return Err(
                ErrorKind::SchemaMismatch(id_strings(&expected), id_strings(&found)).into(),
            );
        }

        let (posts, hashtags) = stats.into_parts();
        for (cell_id, count) in posts {
            *post_count.entry(cell_id).or_insert(0) += count;
        }
        for (cell_id, table) in hashtags {
            let merged = hashtag_count.entry(cell_id).or_insert_with(Default::default);
            for (hashtag, count) in table {
                *merged.entry(hashtag).or_insert(0) += count;
            }
        }
    }

    Ok(GlobalStats::from_parts(post_count, hashtag_count))
}

fn id_strings(ids: &[CellId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_owned()).collect()
}
