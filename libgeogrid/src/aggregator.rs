use std::collections::BTreeMap;
use std::ops::AddAssign;

use cell::{CellId, CellIndex};
use classifier::{Classification, ClassifiedRecord};

pub type HashtagCounts = BTreeMap<String, u64>;

/// `LocalStats` are the per-cell counters of one worker.
///
/// Every cell of the index is present from construction, with a zero post count and an empty
/// hashtag table, so that peers can be checked for covering the same cells before merging.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocalStats {
    post_count: BTreeMap<CellId, u64>,
    hashtag_count: BTreeMap<CellId, HashtagCounts>,
}

impl LocalStats {
    pub fn new(index: &CellIndex) -> Self {
        let mut post_count = BTreeMap::new();
        let mut hashtag_count = BTreeMap::new();
        for cell in index.iter() {
            post_count.insert(cell.id.clone(), 0);
            hashtag_count.insert(cell.id.clone(), HashtagCounts::new());
        }

        LocalStats {
            post_count,
            hashtag_count,
        }
    }

    pub fn post_count(&self) -> &BTreeMap<CellId, u64> {
        &self.post_count
    }

    pub fn hashtag_count(&self) -> &BTreeMap<CellId, HashtagCounts> {
        &self.hashtag_count
    }

    pub fn cell_ids(&self) -> Vec<CellId> {
        self.post_count.keys().cloned().collect()
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<CellId, u64>, BTreeMap<CellId, HashtagCounts>) {
        (self.post_count, self.hashtag_count)
    }
}

/// `GlobalStats` is the coordinator's combined view of every worker's `LocalStats`.
///
/// It can only be produced by `merger::merge` and has no mutating methods.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlobalStats {
    post_count: BTreeMap<CellId, u64>,
    hashtag_count: BTreeMap<CellId, HashtagCounts>,
}

impl GlobalStats {
    pub(crate) fn from_parts(
        post_count: BTreeMap<CellId, u64>,
        hashtag_count: BTreeMap<CellId, HashtagCounts>,
    ) -> Self {
        GlobalStats {
            post_count,
            hashtag_count,
        }
    }

    pub fn post_count(&self) -> &BTreeMap<CellId, u64> {
        &self.post_count
    }

    pub fn hashtag_count(&self) -> &BTreeMap<CellId, HashtagCounts> {
        &self.hashtag_count
    }

    pub fn posts_in(&self, cell_id: &CellId) -> u64 {
        self.post_count.get(cell_id).cloned().unwrap_or(0)
    }

    pub fn hashtags_in(&self, cell_id: &CellId) -> Option<&HashtagCounts> {
        self.hashtag_count.get(cell_id)
    }

    pub fn total_posts(&self) -> u64 {
        self.post_count.values().sum()
    }
}

/// `RecordTally` counts how a worker disposed of its input lines.
///
/// Skipped lines never reach the statistics; the tally only feeds logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecordTally {
    pub seen: u64,
    pub accepted: u64,
    pub unparseable: u64,
    pub missing_coordinates: u64,
    pub outside_grid: u64,
}

impl RecordTally {
    pub fn skipped(&self) -> u64 {
        self.unparseable + self.missing_coordinates + self.outside_grid
    }
}

impl AddAssign for RecordTally {
    fn add_assign(&mut self, other: RecordTally) {
        self.seen += other.seen;
        self.accepted += other.accepted;
        self.unparseable += other.unparseable;
        self.missing_coordinates += other.missing_coordinates;
        self.outside_grid += other.outside_grid;
    }
}

/// `LocalAggregator` accumulates the classified records of a single shard.
///
/// It is owned by exactly one worker. `snapshot` consumes it, so its statistics are handed on
/// exactly once.
#[derive(Debug)]
pub struct LocalAggregator {
    stats: LocalStats,
    tally: RecordTally,
}

impl LocalAggregator {
    pub fn new(index: &CellIndex) -> Self {
        LocalAggregator {
            stats: LocalStats::new(index),
            tally: RecordTally::default(),
        }
    }

    /// Counts one accepted record against its cell and each of its hashtags.
    ///
    /// Records for a cell the aggregator was not initialised with are ignored; a classifier built
    /// over the same index never produces them.
    pub fn accumulate(&mut self, record: ClassifiedRecord) {
        let ClassifiedRecord { cell_id, hashtags } = record;

        match self.stats.post_count.get_mut(&cell_id) {
            Some(count) => *count += 1,
            None => {
                warn!("Ignoring record for unknown cell {}", cell_id);
                return;
            }
        }

        let table = self.stats
            .hashtag_count
            .entry(cell_id)
            .or_insert_with(HashtagCounts::new);
        for hashtag in hashtags {
            *table.entry(hashtag).or_insert(0) += 1;
        }
    }

    /// Records the outcome of one classified line, accumulating it when accepted.
    pub fn observe(&mut self, classification: Classification) {
        self.tally.seen += 1;
        match classification {
            Classification::Accepted(record) => {
                self.tally.accepted += 1;
                self.accumulate(record);
            }
            Classification::MissingCoordinates => self.tally.missing_coordinates += 1,
            Classification::OutsideGrid => self.tally.outside_grid += 1,
        }
    }

    /// Records a line that could not be parsed.
    pub fn observe_unparseable(&mut self) {
        self.tally.seen += 1;
        self.tally.unparseable += 1;
    }

    pub fn tally(&self) -> RecordTally {
        self.tally
    }

    pub fn snapshot(self) -> LocalStats {
        self.stats
    }
}
