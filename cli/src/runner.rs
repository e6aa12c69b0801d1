use std::fs::File;
use std::io::{stdout, BufReader, Write};
use std::sync::Arc;
use std::thread;

use clap::ArgMatches;
use serde_json;

use errors::*;
use geogrid::{load_cells, CellIndex, Coordinator, HashtagSource, RankedReport,
              RoundRobinPartitioner, RunOutput};

/// `RunConfig` holds the validated command line arguments.
#[derive(Debug, PartialEq)]
pub struct RunConfig {
    pub tweets_path: String,
    pub grid_path: String,
    pub workers: u64,
    pub top_k: usize,
    pub hashtag_source: HashtagSource,
    pub json: bool,
}

fn default_workers() -> u64 {
    thread::available_parallelism()
        .map(|count| count.get() as u64)
        .unwrap_or(1)
}

impl RunConfig {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let tweets_path = matches.value_of("tweets").chain_err(
            || "Tweet file must be specified",
        )?;
        let grid_path = matches.value_of("grid").chain_err(
            || "Grid file must be specified",
        )?;

        let workers = match matches.value_of("workers") {
            Some(workers) => {
                workers.parse::<u64>().chain_err(
                    || "Workers must be a positive integer",
                )?
            }
            None => default_workers(),
        };
        if workers == 0 {
            return Err("Workers must be a positive integer".into());
        }

        let top_k = matches
            .value_of("top")
            .unwrap_or("5")
            .parse::<usize>()
            .chain_err(|| "Top must be a non-negative integer")?;

        let hashtag_source = matches
            .value_of("hashtag-source")
            .unwrap_or("entities")
            .parse::<HashtagSource>()
            .chain_err(|| "Invalid hashtag source")?;

        Ok(RunConfig {
            tweets_path: tweets_path.to_owned(),
            grid_path: grid_path.to_owned(),
            workers,
            top_k,
            hashtag_source,
            json: matches.is_present("json"),
        })
    }
}

fn hashtag_list(hashtags: &[(String, u64)]) -> String {
    let pairs: Vec<String> = hashtags
        .iter()
        .map(|&(ref tag, count)| format!("('{}', {})", tag, count))
        .collect();
    format!("[{}]", pairs.join(", "))
}

/// Writes the two report sections: post counts per cell, then top hashtags per cell.
pub fn write_report<W: Write>(sink: &mut W, report: &RankedReport) -> Result<()> {
    writeln!(sink, "TASK - 1")?;
    for cell in &report.cells {
        writeln!(sink, "{}: {} posts", cell.cell_id, cell.post_count)?;
    }

    writeln!(sink, "TASK - 2")?;
    for cell in &report.cells {
        writeln!(sink, "{}: {}", cell.cell_id, hashtag_list(&cell.top_hashtags))?;
    }
    Ok(())
}

pub fn write_json_report<W: Write>(sink: &mut W, report: &RankedReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *sink, report)?;
    writeln!(sink)?;
    Ok(())
}

fn execute(config: &RunConfig) -> Result<RunOutput> {
    let grid_file = File::open(&config.grid_path).chain_err(|| {
        format!("Error opening grid file {}", config.grid_path)
    })?;
    let tweets_file = File::open(&config.tweets_path).chain_err(|| {
        format!("Error opening tweet file {}", config.tweets_path)
    })?;

    let cells = load_cells(BufReader::new(grid_file)).chain_err(|| {
        format!("Error loading grid from {}", config.grid_path)
    })?;
    let index = CellIndex::new(cells).chain_err(|| "Error building cell index")?;
    info!("Loaded {} cells from {}", index.size(), config.grid_path);

    let coordinator = Coordinator::new(Arc::new(index), config.hashtag_source, config.top_k);
    let input = BufReader::new(tweets_file);
    let output = if config.workers == 1 {
        coordinator.run_sequential(input)
    } else {
        let partitioner = RoundRobinPartitioner::new(config.workers).chain_err(
            || "Error creating partitioner",
        )?;
        coordinator.run(input, &partitioner)
    };

    output.chain_err(|| format!("Error processing tweets from {}", config.tweets_path))
}

pub fn run(config: &RunConfig) -> Result<()> {
    let output = execute(config)?;

    let out = stdout();
    let mut sink = out.lock();
    if config.json {
        write_json_report(&mut sink, &output.report)
    } else {
        write_report(&mut sink, &output.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogrid::{CellId, CellReport};

    fn report() -> RankedReport {
        RankedReport {
            cells: vec![
                CellReport {
                    cell_id: CellId::from("B"),
                    post_count: 2,
                    top_hashtags: vec![("#y".to_owned(), 2), ("#z".to_owned(), 1)],
                },
                CellReport {
                    cell_id: CellId::from("A"),
                    post_count: 1,
                    top_hashtags: vec![],
                },
            ],
        }
    }

    #[test]
    fn text_report_format() {
        let mut sink = Vec::new();

        write_report(&mut sink, &report()).unwrap();

        let expected = "TASK - 1\nB: 2 posts\nA: 1 posts\nTASK - 2\nB: [('#y', 2), ('#z', 1)]\nA: []\n";
        assert_eq!(expected, String::from_utf8(sink).unwrap());
    }

    #[test]
    fn empty_text_report_keeps_headings() {
        let mut sink = Vec::new();

        write_report(&mut sink, &RankedReport::default()).unwrap();

        assert_eq!("TASK - 1\nTASK - 2\n", String::from_utf8(sink).unwrap());
    }

    #[test]
    fn json_report_format() {
        let mut sink = Vec::new();

        write_json_report(&mut sink, &report()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&sink).unwrap();
        assert_eq!("B", value["cells"][0]["cell_id"]);
        assert_eq!(2u64, value["cells"][0]["post_count"]);
        assert_eq!("#y", value["cells"][0]["top_hashtags"][0][0]);
        assert_eq!(1u64, value["cells"][1]["post_count"]);
    }

    #[test]
    fn missing_grid_file_is_reported() {
        let config = RunConfig {
            tweets_path: "/nonexistent/tweets.json".to_owned(),
            grid_path: "/nonexistent/grid.json".to_owned(),
            workers: 2,
            top_k: 5,
            hashtag_source: HashtagSource::Entities,
            json: false,
        };

        let err = execute(&config).unwrap_err();

        assert_eq!("Error opening grid file /nonexistent/grid.json", err.to_string());
    }
}
