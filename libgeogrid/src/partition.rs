use errors::*;

/// The `Partition` trait decides which worker processes a record.
///
/// # Arguments
///
/// * `index` - The 0-based position of the record among all record lines of the input. Header
///             and other non-record lines are not counted.
///
/// # Outputs
///
/// A `Result<u64>` holding the worker id, which must be below `worker_count()`.
pub trait Partition {
    fn partition(&self, index: u64) -> Result<u64>;

    fn worker_count(&self) -> u64;
}

/// `RoundRobinPartitioner` assigns record `i` to worker `i mod worker_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundRobinPartitioner {
    worker_count: u64,
}

impl RoundRobinPartitioner {
    pub fn new(worker_count: u64) -> Result<Self> {
        if worker_count == 0 {
            return Err("A partitioner needs at least one worker.".into());
        }
        Ok(RoundRobinPartitioner { worker_count })
    }
}

impl Partition for RoundRobinPartitioner {
    fn partition(&self, index: u64) -> Result<u64> {
        Ok(index % self.worker_count)
    }

    fn worker_count(&self) -> u64 {
        self.worker_count
    }
}

/// Asks `partitioner` for the worker of record `index` and checks that the worker exists.
pub fn assign<P: Partition + ?Sized>(partitioner: &P, index: u64) -> Result<usize> {
    let worker = partitioner.partition(index).chain_err(|| {
        format!("Error partitioning record {}.", index)
    })?;
    let worker_count = partitioner.worker_count();
    if worker >= worker_count {
        return Err(ErrorKind::InvalidPartition(worker, worker_count).into());
    }
    Ok(worker as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EverythingToWorker(u64);

    impl Partition for EverythingToWorker {
        fn partition(&self, _index: u64) -> Result<u64> {
            Ok(self.0)
        }

        fn worker_count(&self) -> u64 {
            2
        }
    }

    #[test]
    fn round_robin_cycles_through_workers() {
        let partitioner = RoundRobinPartitioner::new(3).unwrap();

        let workers: Vec<u64> = (0..7).map(|i| partitioner.partition(i).unwrap()).collect();

        assert_eq!(vec![0, 1, 2, 0, 1, 2, 0], workers);
    }

    #[test]
    fn single_worker_takes_everything() {
        let partitioner = RoundRobinPartitioner::new(1).unwrap();

        assert!((0..10).all(|i| partitioner.partition(i).unwrap() == 0));
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(RoundRobinPartitioner::new(0).is_err());
    }

    #[test]
    fn assign_rejects_unknown_worker() {
        assert_eq!(1, assign(&EverythingToWorker(1), 4).unwrap());

        match assign(&EverythingToWorker(2), 4) {
            Err(Error(ErrorKind::InvalidPartition(2, 2), _)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
