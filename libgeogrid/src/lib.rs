#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[cfg_attr(test, macro_use)]
extern crate serde_json;

pub mod errors {
    error_chain! {
        foreign_links {
            Io(::std::io::Error);
            Json(::serde_json::Error);
        }

        errors {
            SchemaMismatch(expected: Vec<String>, found: Vec<String>) {
                description("local statistics cover different cell ids")
                display("local statistics cover cells {:?}, expected {:?}", found, expected)
            }
            NoWorkerStats {
                description("no local statistics to merge")
                display("no local statistics to merge")
            }
            RecordParse(reason: String) {
                description("malformed record")
                display("malformed record: {}", reason)
            }
            InvalidGrid(reason: String) {
                description("invalid grid definition")
                display("invalid grid definition: {}", reason)
            }
            InvalidPartition(worker: u64, worker_count: u64) {
                description("partition assigned a record to an unknown worker")
                display("partition assigned worker {} but only {} workers exist", worker, worker_count)
            }
        }
    }
}

pub mod aggregator;
pub mod cell;
pub mod classifier;
pub mod coordinator;
pub mod io;
pub mod merger;
pub mod partition;
pub mod record;
pub mod reporter;

pub use aggregator::{GlobalStats, LocalAggregator, LocalStats, RecordTally};
pub use cell::{Cell, CellId, CellIndex, Point};
pub use classifier::{Classification, ClassifiedRecord, Classifier};
pub use coordinator::{Coordinator, RecordLines, RunOutput};
pub use errors::*;
pub use io::{clean_record_line, load_cells};
pub use merger::merge;
pub use partition::{Partition, RoundRobinPartitioner};
pub use record::HashtagSource;
pub use reporter::{report, CellReport, RankedReport, DEFAULT_TOP_K};
