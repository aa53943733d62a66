use super::bucket::ThresholdBucket;
use super::queue::SeedQueue;
use super::seed::CandidateSeed;
use crate::data::row::Row;
use crate::kernel::relevance::self_relevance;
use crate::subset::Subset;

/// consumes queued seeds into threshold buckets. process returns false once
/// nothing further can be accepted; finalize surfaces the best bucket's
/// subset and leaves the titrator spent.
pub trait Titrator: Send {
    fn process(&mut self, queue: &SeedQueue) -> bool;
    fn finalize(&mut self) -> Subset;
    fn is_full(&self) -> bool;
}

/// number of buckets in the threshold ladder. without a fixed delta-zero the
/// ladder is sized for 2k so later revisions stay inside it.
pub fn bucket_count(k: usize, epsilon: f64, known_delta: bool) -> usize {
    let v = match known_delta {
        true => k,
        false => 2 * k,
    } as f64;
    (v.log2() / (1.0 + epsilon).log2() + 0.5).floor() as usize + 1
}

/// tau_i = (1 + eps)^(i + ceil(log_{1+eps} delta)). a zero delta puts every
/// threshold at zero, which is the wide-open ladder the dynamic titrators
/// start from.
pub fn bucket_threshold(index: usize, delta: f64, epsilon: f64) -> f64 {
    let offset = (delta.ln() / (1.0 + epsilon).ln()).ceil();
    (1.0 + epsilon).powf(index as f64 + offset)
}

/// delta-zero estimate a single seed testifies to: 2 ln sqrt(s) of its
/// self-relevance. a titrator with fixed delta-zero probes nothing and
/// never revises.
pub fn seed_delta(row: &Row, known_delta: bool) -> f64 {
    match known_delta {
        true => 0.0,
        false => (self_relevance(row) as f64).sqrt().ln() * 2.0,
    }
}

/// SieveStreaming: every seed is offered to every bucket in the ladder.
/// when a seed testifies to a larger delta-zero, buckets below the revised
/// floor are dropped and fresh ones extend the top of the ladder.
pub struct SieveStreaming {
    epsilon: f64,
    k: usize,
    total: usize,
    known_delta: bool,
    delta: f64,
    buckets: Vec<ThresholdBucket>,
    retained: Vec<CandidateSeed>,
}

impl SieveStreaming {
    pub fn with_known_delta(k: usize, epsilon: f64, delta: f64) -> Self {
        Self::create(k, epsilon, delta, true)
    }

    pub fn with_dynamic_buckets(k: usize, epsilon: f64) -> Self {
        Self::create(k, epsilon, 0.0, false)
    }

    fn create(k: usize, epsilon: f64, delta: f64, known_delta: bool) -> Self {
        let total = bucket_count(k, epsilon, known_delta);
        log::info!("{} buckets over delta-zero {}", total, delta);
        Self {
            epsilon,
            k,
            total,
            known_delta,
            delta,
            buckets: (0..total)
                .map(|i| ThresholdBucket::new(bucket_threshold(i, delta, epsilon), k))
                .collect(),
            retained: vec![],
        }
    }

    /// raise delta-zero: retire buckets below the new floor, extend the top
    fn revise(&mut self, delta: f64) {
        log::debug!("revising delta-zero {} -> {}", self.delta, delta);
        self.delta = delta;
        let floor = bucket_threshold(0, delta, self.epsilon);
        self.buckets.retain(|bucket| bucket.threshold() > floor);
        let mut ceiling = self
            .buckets
            .last()
            .map(ThresholdBucket::threshold)
            .unwrap_or(0.0);
        for index in 0..self.total {
            let threshold = bucket_threshold(index, delta, self.epsilon);
            if threshold > ceiling {
                self.buckets.push(ThresholdBucket::new(threshold, self.k));
                ceiling = threshold;
            }
        }
    }

    /// the maximum utility any bucket currently holds
    pub fn best_score(&self) -> f64 {
        self.buckets
            .iter()
            .map(ThresholdBucket::utility)
            .fold(0.0, f64::max)
    }
}

impl Titrator for SieveStreaming {
    fn process(&mut self, queue: &SeedQueue) -> bool {
        use rayon::prelude::*;
        if self.is_full() {
            return false;
        }
        for seed in queue.drain() {
            let delta = seed_delta(seed.row(), self.known_delta);
            if delta > self.delta {
                self.revise(delta);
            }
            let inserted = self
                .buckets
                .par_iter_mut()
                .map(|bucket| bucket.attempt_insert(seed.global(), seed.row()))
                .reduce(|| false, |a, b| a || b);
            if inserted {
                self.retained.push(seed);
            } else if self.is_full() {
                log::info!("every bucket is full, leaving the stream early");
                return false;
            }
        }
        !self.is_full()
    }

    fn finalize(&mut self) -> Subset {
        log::info!("retained {} seeds across {} buckets", self.retained.len(), self.buckets.len());
        let best = self
            .buckets
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.utility().total_cmp(&b.utility()))
            .filter(|(_, bucket)| bucket.utility() > 0.0)
            .map(|(i, _)| i);
        match best {
            Some(i) => std::mem::take(&mut self.buckets).swap_remove(i).into_solution(),
            None => Subset::empty(),
        }
    }

    fn is_full(&self) -> bool {
        // an unknown delta-zero can always be revised upward, which makes
        // room; only a fixed ladder can saturate
        self.known_delta && self.buckets.iter().all(ThresholdBucket::is_full)
    }
}

/// ThreeSieve: one active bucket walking the ladder from the top threshold
/// downward. T consecutive rejects transfer its contents one rung down; a
/// revised delta-zero restarts the walk with an empty bucket.
pub struct ThreeSieve {
    epsilon: f64,
    transfer_after: u32,
    k: usize,
    total: usize,
    known_delta: bool,
    delta: f64,
    misses: u32,
    index: usize,
    bucket: ThresholdBucket,
    retained: Vec<CandidateSeed>,
}

impl ThreeSieve {
    pub fn with_known_delta(k: usize, epsilon: f64, transfer_after: u32, delta: f64) -> Self {
        Self::create(k, epsilon, transfer_after, delta, true)
    }

    pub fn with_dynamic_buckets(k: usize, epsilon: f64, transfer_after: u32) -> Self {
        Self::create(k, epsilon, transfer_after, 0.0, false)
    }

    fn create(k: usize, epsilon: f64, transfer_after: u32, delta: f64, known_delta: bool) -> Self {
        let total = bucket_count(k, epsilon, known_delta);
        log::info!("{} thresholds over delta-zero {}", total, delta);
        Self {
            epsilon,
            transfer_after,
            k,
            total,
            known_delta,
            delta,
            misses: 0,
            index: 0,
            bucket: ThresholdBucket::new(bucket_threshold(total - 1, delta, epsilon), k),
            retained: vec![],
        }
    }
}

impl Titrator for ThreeSieve {
    fn process(&mut self, queue: &SeedQueue) -> bool {
        if self.is_full() {
            return false;
        }
        for seed in queue.drain() {
            let delta = seed_delta(seed.row(), self.known_delta);
            if delta > self.delta {
                log::debug!("revising delta-zero {} -> {}", self.delta, delta);
                self.delta = delta;
                self.misses = 0;
                self.index = 0;
                self.bucket = ThresholdBucket::new(
                    bucket_threshold(self.total - 1, delta, self.epsilon),
                    self.k,
                );
                self.retained.clear();
            }
            if self.bucket.attempt_insert(seed.global(), seed.row()) {
                self.misses = 0;
                self.retained.push(seed);
            } else {
                self.misses += 1;
                if self.misses >= self.transfer_after && self.index < self.total - 1 {
                    self.misses = 0;
                    self.index += 1;
                    let threshold =
                        bucket_threshold(self.total - 1 - self.index, self.delta, self.epsilon);
                    self.bucket = std::mem::take(&mut self.bucket).transfer(threshold);
                }
            }
            if self.is_full() {
                log::info!("the active bucket is full, leaving the stream early");
                return false;
            }
        }
        !self.is_full()
    }

    fn finalize(&mut self) -> Subset {
        log::info!("retained {} seeds", self.retained.len());
        std::mem::take(&mut self.bucket).into_solution()
    }

    fn is_full(&self) -> bool {
        self.known_delta && self.bucket.is_full()
    }
}

/// defers construction until the queue holds the first wave of seeds, takes
/// delta-zero as the best self-relevance among them, and only then builds
/// the delegate with a fixed ladder. avoids re-forming buckets on every
/// revision when the stream's scale is unknown up front.
pub struct LazyInit<F>
where
    F: Fn(f64) -> Box<dyn Titrator> + Send,
{
    factory: F,
    delegate: Option<Box<dyn Titrator>>,
}

impl<F> LazyInit<F>
where
    F: Fn(f64) -> Box<dyn Titrator> + Send,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            delegate: None,
        }
    }
}

impl<F> Titrator for LazyInit<F>
where
    F: Fn(f64) -> Box<dyn Titrator> + Send,
{
    fn process(&mut self, queue: &SeedQueue) -> bool {
        if self.delegate.is_none() {
            let drained = queue.drain();
            let delta = drained
                .iter()
                .map(|seed| seed_delta(seed.row(), false))
                .fold(0.0, f64::max);
            log::info!("initialized titrator from {} queued seeds", drained.len());
            queue.refill(drained);
            self.delegate = Some((self.factory)(delta));
        }
        self.delegate.as_mut().expect("delegate").process(queue)
    }

    fn finalize(&mut self) -> Subset {
        match self.delegate.as_mut() {
            Some(delegate) => delegate.finalize(),
            None => Subset::empty(),
        }
    }

    fn is_full(&self) -> bool {
        match self.delegate.as_ref() {
            Some(delegate) => delegate.is_full(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(rows: &[Vec<f32>]) -> SeedQueue {
        let queue = SeedQueue::default();
        for (i, values) in rows.iter().enumerate() {
            queue.push(CandidateSeed::new(i, Row::dense(values.clone()), 0));
        }
        queue
    }

    fn spread() -> Vec<Vec<f32>> {
        vec![
            vec![4.0, 17.0, 20.0, 1.0],
            vec![5.0, 7.0, 31.0, 45.0],
            vec![2.6, 5.1, 73.0, 15.0],
            vec![12.0, 6.0, 47.0, 32.0],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![6.0, 31.0, 54.0, 3.5],
        ]
    }

    #[test]
    fn ladder_covers_delta_zero() {
        let delta: f64 = 40.0;
        let epsilon = 0.1;
        let total = bucket_count(8, epsilon, true);
        let lowest = bucket_threshold(0, delta, epsilon);
        assert!(lowest >= delta);
        assert!(bucket_threshold(total - 1, delta, epsilon) > lowest);
        // dynamic ladders are deeper to absorb revisions
        assert!(bucket_count(8, epsilon, false) > total);
    }

    #[test]
    fn zero_delta_opens_every_threshold() {
        assert_eq!(bucket_threshold(0, 0.0, 0.1), 0.0);
        assert_eq!(bucket_threshold(5, 0.0, 0.1), 0.0);
    }

    #[test]
    fn sieve_streaming_accepts_a_spread_stream() {
        let mut titrator = SieveStreaming::with_dynamic_buckets(3, 0.1);
        assert!(titrator.process(&queue(&spread())));
        let solution = titrator.finalize();
        assert!(!solution.is_empty());
        assert!(solution.len() <= 3);
        assert!(solution.score() > 0.0);
    }

    #[test]
    fn sieve_streaming_is_monotone_in_seeds() {
        let rows = spread();
        let mut short = SieveStreaming::with_dynamic_buckets(3, 0.1);
        short.process(&queue(&rows[..3]));
        let mut long = SieveStreaming::with_dynamic_buckets(3, 0.1);
        long.process(&queue(&rows));
        assert!(long.best_score() >= short.best_score());
    }

    #[test]
    fn three_sieve_transfers_after_repeated_misses() {
        // a known delta-zero far above the data keeps the top bucket
        // unreachable until the walk lowers the threshold
        let mut titrator = ThreeSieve::with_known_delta(3, 0.1, 2, 30.0);
        let rows = spread();
        for _ in 0..6 {
            titrator.process(&queue(&rows));
        }
        let solution = titrator.finalize();
        assert!(!solution.is_empty());
    }

    #[test]
    fn three_sieve_resets_on_revised_delta() {
        let mut titrator = ThreeSieve::with_dynamic_buckets(3, 0.1, 3);
        // weak seeds first, then one loud enough to force a revision
        titrator.process(&queue(&[vec![0.1, 0.0], vec![0.0, 0.1]]));
        let before = titrator.delta;
        titrator.process(&queue(&[vec![100.0, 100.0]]));
        assert!(titrator.delta > before);
        let solution = titrator.finalize();
        assert!(solution.len() <= 3);
    }

    #[test]
    fn lazy_init_builds_from_the_first_wave() {
        let mut titrator = LazyInit::new(|delta| {
            Box::new(SieveStreaming::with_known_delta(3, 0.1, delta)) as Box<dyn Titrator>
        });
        assert!(!titrator.is_full());
        let rows = vec![vec![1.0, 0.0], vec![100.0, 3.0], vec![10.0, 1.0]];
        titrator.process(&queue(&rows));
        let solution = titrator.finalize();
        assert!(!solution.is_empty());
    }

    #[test]
    fn empty_ladder_finalizes_to_the_empty_subset() {
        let mut titrator = SieveStreaming::with_known_delta(3, 0.1, 50.0);
        titrator.process(&queue(&[vec![0.1, 0.1]]));
        let solution = titrator.finalize();
        assert!(solution.is_empty());
        assert_eq!(solution.score(), 0.0);
    }
}
