use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread;

use aggregator::{GlobalStats, LocalAggregator, LocalStats, RecordTally};
use cell::CellIndex;
use classifier::{Classification, Classifier};
use errors::*;
use io::clean_record_line;
use merger::merge;
use partition::{assign, Partition, RoundRobinPartitioner};
use record::HashtagSource;
use reporter::{report, RankedReport};

/// The rank of the worker that also gathers, merges and reports.
const COORDINATOR_RANK: usize = 0;
/// Record lines buffered per worker before the reader blocks.
const SHARD_QUEUE_DEPTH: usize = 1024;

/// `RunOutput` is everything a run produces.
#[derive(Debug)]
pub struct RunOutput {
    pub report: RankedReport,
    pub global: GlobalStats,
    pub tally: RecordTally,
}

/// What a worker hands to the coordinator once its shard is exhausted.
#[derive(Debug)]
struct WorkerSnapshot {
    rank: usize,
    stats: LocalStats,
    tally: RecordTally,
}

impl WorkerSnapshot {
    fn from_aggregator(rank: usize, aggregator: LocalAggregator) -> Self {
        let tally = aggregator.tally();
        if tally.seen == 0 {
            warn!("Worker {} received no records.", rank);
        }
        WorkerSnapshot {
            rank,
            stats: aggregator.snapshot(),
            tally,
        }
    }
}

/// `RecordLines` yields the record lines of an input stream with their record index.
///
/// Lines that hold no record (headers, array punctuation, blanks) are skipped and do not consume
/// an index. Bytes that are not valid UTF-8 are replaced, leaving the record to fail parsing.
pub struct RecordLines<R: BufRead> {
    input: R,
    buffer: Vec<u8>,
    line_number: u64,
    next_index: u64,
}

impl<R: BufRead> RecordLines<R> {
    pub fn new(input: R) -> Self {
        RecordLines {
            input,
            buffer: Vec::new(),
            line_number: 0,
            next_index: 0,
        }
    }
}

impl<R: BufRead> Iterator for RecordLines<R> {
    type Item = Result<(u64, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            self.line_number += 1;
            match self.input.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    let line_number = self.line_number;
                    return Some(Err(Error::with_chain(
                        err,
                        format!("Error reading input line {}.", line_number),
                    )));
                }
            }

            let line = String::from_utf8_lossy(&self.buffer);
            if let Some(record) = clean_record_line(&line) {
                let index = self.next_index;
                self.next_index += 1;
                return Some(Ok((index, record.to_owned())));
            }
        }
    }
}

fn process_line(classifier: &Classifier, aggregator: &mut LocalAggregator, line: &str) {
    match classifier.classify_line(line) {
        Ok(classification) => {
            match classification {
                Classification::MissingCoordinates => debug!("Skipping record without coordinates."),
                Classification::OutsideGrid => debug!("Skipping record outside the grid."),
                Classification::Accepted(_) => {}
            }
            aggregator.observe(classification);
        }
        Err(err) => {
            debug!("Skipping record: {}", err);
            aggregator.observe_unparseable();
        }
    }
}

fn run_worker(
    rank: usize,
    index: &CellIndex,
    source: HashtagSource,
    lines: Receiver<String>,
) -> WorkerSnapshot {
    let classifier = Classifier::new(index, source);
    let mut aggregator = LocalAggregator::new(index);
    for line in lines {
        process_line(&classifier, &mut aggregator, &line);
    }
    WorkerSnapshot::from_aggregator(rank, aggregator)
}

/// Waits until every worker's snapshot has arrived. Nothing is merged before that.
fn gather(
    own: WorkerSnapshot,
    snapshots: &Receiver<WorkerSnapshot>,
    worker_count: usize,
) -> Result<Vec<WorkerSnapshot>> {
    let mut gathered = Vec::with_capacity(worker_count);
    gathered.push(own);
    while gathered.len() < worker_count {
        let snapshot = snapshots.recv().chain_err(|| {
            format!(
                "Only {} of {} workers handed over their statistics.",
                gathered.len(),
                worker_count
            )
        })?;
        gathered.push(snapshot);
    }
    gathered.sort_by_key(|snapshot| snapshot.rank);
    Ok(gathered)
}

fn reduce(snapshots: Vec<WorkerSnapshot>, top_k: usize) -> Result<RunOutput> {
    let mut tally = RecordTally::default();
    let mut stats_list = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        info!(
            "Worker {}: {} records, {} accepted, {} unparseable, {} without coordinates, {} outside the grid",
            snapshot.rank,
            snapshot.tally.seen,
            snapshot.tally.accepted,
            snapshot.tally.unparseable,
            snapshot.tally.missing_coordinates,
            snapshot.tally.outside_grid
        );
        tally += snapshot.tally;
        stats_list.push(snapshot.stats);
    }

    let global = merge(stats_list).chain_err(|| "Error merging worker statistics.")?;
    let report = report(&global, top_k);
    Ok(RunOutput {
        report,
        global,
        tally,
    })
}

fn dispatch<R, P>(input: R, partitioner: &P, shards: &[SyncSender<String>]) -> Result<u64>
where
    R: BufRead,
    P: Partition + ?Sized,
{
    let mut dispatched = 0;
    for record in RecordLines::new(input) {
        let (index, line) = record?;
        let worker = assign(partitioner, index)?;
        shards[worker].send(line).chain_err(|| {
            format!("Worker {} stopped before the input was exhausted.", worker)
        })?;
        dispatched += 1;
    }
    Ok(dispatched)
}

fn join_worker<T>(handle: thread::JoinHandle<Result<T>>, rank: usize) -> Result<T> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(format!("Worker {} panicked.", rank).into()),
    }
}

/// `Coordinator` drives a run: it partitions the record lines of an input, lets one worker
/// aggregate each shard and combines the workers' statistics into the final report.
pub struct Coordinator {
    index: Arc<CellIndex>,
    source: HashtagSource,
    top_k: usize,
}

impl Coordinator {
    pub fn new(index: Arc<CellIndex>, source: HashtagSource, top_k: usize) -> Self {
        Coordinator {
            index,
            source,
            top_k,
        }
    }

    pub fn index(&self) -> &CellIndex {
        &self.index
    }

    /// Runs one thread per worker.
    ///
    /// The calling thread reads `input` and sends each record line to the worker chosen by
    /// `partitioner`. Every worker owns its aggregator. When the input is exhausted, each worker
    /// hands its snapshot to the worker of rank 0, which waits for all of them before merging
    /// and reporting.
    pub fn run<R, P>(&self, input: R, partitioner: &P) -> Result<RunOutput>
    where
        R: BufRead,
        P: Partition + ?Sized,
    {
        let worker_count = partitioner.worker_count() as usize;
        if worker_count == 0 {
            return Err("A run needs at least one worker.".into());
        }
        info!(
            "Running over {} cells with {} workers.",
            self.index.size(),
            worker_count
        );

        let (snapshot_tx, snapshot_rx): (Sender<WorkerSnapshot>, Receiver<WorkerSnapshot>) =
            mpsc::channel();
        let mut shards = Vec::with_capacity(worker_count);
        let mut coordinator_lines = None;
        let mut peers = Vec::with_capacity(worker_count - 1);

        for rank in 0..worker_count {
            let (line_tx, line_rx) = mpsc::sync_channel(SHARD_QUEUE_DEPTH);
            shards.push(line_tx);
            if rank == COORDINATOR_RANK {
                coordinator_lines = Some(line_rx);
                continue;
            }

            let index = Arc::clone(&self.index);
            let source = self.source;
            let snapshot_tx = snapshot_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{}", rank))
                .spawn(move || -> Result<()> {
                    let snapshot = run_worker(rank, &index, source, line_rx);
                    snapshot_tx.send(snapshot).chain_err(|| {
                        format!("Worker {} could not hand over its statistics.", rank)
                    })?;
                    Ok(())
                })
                .chain_err(|| format!("Failed to start worker {}.", rank))?;
            peers.push((rank, handle));
        }
        drop(snapshot_tx);

        let coordinator_lines =
            coordinator_lines.chain_err(|| "No line queue for the coordinating worker.")?;
        let index = Arc::clone(&self.index);
        let source = self.source;
        let top_k = self.top_k;
        let coordinator = thread::Builder::new()
            .name(format!("worker-{}", COORDINATOR_RANK))
            .spawn(move || -> Result<RunOutput> {
                let own = run_worker(COORDINATOR_RANK, &index, source, coordinator_lines);
                let snapshots = gather(own, &snapshot_rx, worker_count)?;
                reduce(snapshots, top_k)
            })
            .chain_err(|| "Failed to start the coordinating worker.")?;

        let dispatched = dispatch(input, partitioner, &shards);
        // Closing the queues lets every worker finish its shard.
        drop(shards);

        for (rank, handle) in peers {
            join_worker(handle, rank)?;
        }
        let output = join_worker(coordinator, COORDINATOR_RANK)?;
        let dispatched = dispatched?;

        info!(
            "Run complete: {} records dispatched, {} accepted.",
            dispatched,
            output.tally.accepted
        );
        Ok(output)
    }

    /// Runs every shard on the calling thread.
    ///
    /// Records are partitioned exactly as in `run` and pass through the same classify,
    /// accumulate, merge and report steps, so the output is identical.
    pub fn run_in_process<R, P>(&self, input: R, partitioner: &P) -> Result<RunOutput>
    where
        R: BufRead,
        P: Partition + ?Sized,
    {
        let worker_count = partitioner.worker_count() as usize;
        if worker_count == 0 {
            return Err("A run needs at least one worker.".into());
        }

        let classifier = Classifier::new(&self.index, self.source);
        let mut aggregators: Vec<LocalAggregator> = (0..worker_count)
            .map(|_| LocalAggregator::new(&self.index))
            .collect();

        for record in RecordLines::new(input) {
            let (index, line) = record?;
            let worker = assign(partitioner, index)?;
            process_line(&classifier, &mut aggregators[worker], &line);
        }

        let snapshots = aggregators
            .into_iter()
            .enumerate()
            .map(|(rank, aggregator)| WorkerSnapshot::from_aggregator(rank, aggregator))
            .collect();
        reduce(snapshots, self.top_k)
    }

    /// A single pass with a single aggregator.
    pub fn run_sequential<R: BufRead>(&self, input: R) -> Result<RunOutput> {
        let partitioner = RoundRobinPartitioner::new(1)?;
        self.run_in_process(input, &partitioner)
    }
}
