use super::types::IdentifierRange;
use crate::config::ScanConfig;

/// Splits `[1, max_id]` into contiguous, disjoint ranges, one per worker.
#[derive(Debug, Clone)]
pub struct RangePartitioner {
    worker_cap: usize,
    min_work_unit: u64,
}

impl RangePartitioner {
    pub fn new(worker_cap: usize, min_work_unit: u64) -> Self {
        Self {
            worker_cap: worker_cap.max(1),
            min_work_unit: min_work_unit.max(1),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.worker_cap, config.min_work_unit)
    }

    /// `min(worker_cap, ceil(max_id / min_work_unit))`, never less than one.
    pub fn worker_count(&self, max_id: u64) -> usize {
        let wanted = max_id.div_ceil(self.min_work_unit).max(1);
        (wanted.min(self.worker_cap as u64)) as usize
    }

    /// Ranges `[1 + step*i, 1 + step*(i+1))` clipped to `max_id + 1`.
    ///
    /// The union is exactly `[1, max_id]` for any `max_id < u64::MAX`; the
    /// arithmetic saturates instead of overflowing beyond that. Empty trailing
    /// ranges are dropped, so fewer than `worker_count` ranges may be returned
    /// for tiny spaces.
    pub fn partition(&self, max_id: u64) -> Vec<IdentifierRange> {
        if max_id == 0 {
            return Vec::new();
        }

        let workers = self.worker_count(max_id) as u64;
        let step = max_id.div_ceil(workers);
        let upper = max_id.saturating_add(1);
        let bound = |i: u64| step.saturating_mul(i).saturating_add(1).min(upper);

        (0..workers)
            .map(|i| IdentifierRange::new(bound(i), bound(i + 1)))
            .filter(|range| !range.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_small_space_single_worker() {
        let partitioner = RangePartitioner::new(30, 20_000);

        let ranges = partitioner.partition(1500);

        assert_eq!(ranges, vec![IdentifierRange::new(1, 1501)]);
        assert_eq!(ranges[0].batches(2000).count(), 1);
    }

    #[test]
    fn test_worker_count_is_capped() {
        let partitioner = RangePartitioner::new(30, 20_000);

        assert_eq!(partitioner.worker_count(1), 1);
        assert_eq!(partitioner.worker_count(40_000), 2);
        assert_eq!(partitioner.worker_count(40_001), 3);
        assert_eq!(partitioner.worker_count(70_000_000), 30);
    }

    #[test]
    fn test_partition_near_u64_max_does_not_overflow() {
        let partitioner = RangePartitioner::new(30, 20_000);

        let ranges = partitioner.partition(u64::MAX - 1);

        assert_eq!(ranges.len(), 30);
        assert_eq!(ranges[0].start, 1);
        assert_eq!(ranges[29].end, u64::MAX);
        assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));

        let saturated = partitioner.partition(u64::MAX);
        assert_eq!(saturated.last().map(|r| r.end), Some(u64::MAX));
    }
}
