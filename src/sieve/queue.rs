use super::seed::CandidateSeed;
use std::collections::VecDeque;
use std::sync::Mutex;

/// multi-producer single-consumer mailbox between the receiving and
/// titrating threads. one short critical section per operation; end of
/// stream is signalled out of band by the receiver's atomic flag.
#[derive(Debug, Default)]
pub struct SeedQueue {
    inner: Mutex<VecDeque<CandidateSeed>>,
}

impl SeedQueue {
    pub fn push(&self, seed: CandidateSeed) {
        self.inner.lock().expect("queue lock").push_back(seed);
    }

    pub fn pop(&self) -> Option<CandidateSeed> {
        self.inner.lock().expect("queue lock").pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("queue lock").is_empty()
    }

    /// take everything queued in one critical section
    pub fn drain(&self) -> Vec<CandidateSeed> {
        self.inner.lock().expect("queue lock").drain(..).collect()
    }

    /// put a drained batch back, ahead of anything pushed meanwhile
    pub fn refill(&self, seeds: Vec<CandidateSeed>) {
        let mut queue = self.inner.lock().expect("queue lock");
        for seed in seeds.into_iter().rev() {
            queue.push_front(seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::row::Row;

    fn seed(global: usize) -> CandidateSeed {
        CandidateSeed::new(global, Row::dense(vec![1.0]), 0)
    }

    #[test]
    fn fifo_order_survives_drain_and_refill() {
        let queue = SeedQueue::default();
        for global in 0..4 {
            queue.push(seed(global));
        }
        let drained = queue.drain();
        assert_eq!(drained.len(), 4);
        assert!(queue.is_empty());
        queue.refill(drained);
        let order = std::iter::from_fn(|| queue.pop())
            .map(|s| s.global())
            .collect::<Vec<_>>();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn producers_share_the_queue() {
        let queue = std::sync::Arc::new(SeedQueue::default());
        std::thread::scope(|scope| {
            for origin in 0..4 {
                let queue = queue.clone();
                scope.spawn(move || {
                    for global in 0..8 {
                        queue.push(CandidateSeed::new(global, Row::dense(vec![1.0]), origin));
                    }
                });
            }
        });
        assert_eq!(queue.len(), 32);
    }
}
