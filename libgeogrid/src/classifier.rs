use std::collections::BTreeSet;

use serde_json;
use serde_json::Value;

use cell::{CellId, CellIndex};
use errors::*;
use record::{extract_point, HashtagExtractor, HashtagSource};

/// A record that resolved to a cell, ready for aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedRecord {
    pub cell_id: CellId,
    pub hashtags: BTreeSet<String>,
}

/// The outcome of classifying a single parsed record.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    Accepted(ClassifiedRecord),
    /// No extraction strategy produced a well-formed point.
    MissingCoordinates,
    /// The point lies outside every cell.
    OutsideGrid,
}

/// `Classifier` turns a raw record into an optional `(cell, hashtags)` pair.
///
/// It borrows the shared, read-only `CellIndex`, so one classifier per worker is cheap.
pub struct Classifier<'a> {
    index: &'a CellIndex,
    hashtags: HashtagExtractor,
}

impl<'a> Classifier<'a> {
    pub fn new(index: &'a CellIndex, source: HashtagSource) -> Self {
        Classifier {
            index,
            hashtags: HashtagExtractor::new(source),
        }
    }

    pub fn index(&self) -> &'a CellIndex {
        self.index
    }

    pub fn classify(&self, record: &Value) -> Classification {
        let point = match extract_point(record) {
            Some(point) => point,
            None => return Classification::MissingCoordinates,
        };

        match self.index.locate(&point) {
            Some(cell_id) => {
                Classification::Accepted(ClassifiedRecord {
                    cell_id: cell_id.clone(),
                    hashtags: self.hashtags.extract(record),
                })
            }
            None => Classification::OutsideGrid,
        }
    }

    /// Parses one cleaned record line and classifies it.
    ///
    /// Fails with `RecordParse` when the line is not a JSON object. Callers are expected to skip
    /// such lines rather than abort.
    pub fn classify_line(&self, line: &str) -> Result<Classification> {
        let record: Value = serde_json::from_str(line).map_err(|err| {
            Error::from(ErrorKind::RecordParse(err.to_string()))
        })?;
        if !record.is_object() {
            return Err(ErrorKind::RecordParse("record is not an object".to_owned()).into());
        }

        Ok(self.classify(&record))
    }
}
