use super::buffer::RankBuffer;
use super::courier::Feed;
use crate::data::codec::RowCodec;
use crate::error::Result;
use crate::sieve::seed::CandidateSeed;
use crate::subset::Subset;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// the coordinator's intake: blocks until a seed arrives or a sender
/// closes, and clears `still` once every stream has ended. afterwards the
/// best per-sender local solution is available for the final comparison.
pub trait Receiver: Send {
    fn receive(&mut self, still: &AtomicBool) -> Result<Option<CandidateSeed>>;
    fn best_local(&mut self) -> Subset;
}

/// round-robin poller over one rank buffer per sender
pub struct RoundRobin<F: Feed> {
    buffers: Vec<RankBuffer<F>>,
    cursor: usize,
    open: usize,
    progress: crate::report::Progress,
}

impl<F: Feed> RoundRobin<F> {
    const CHECKPOINT: usize = 10_000;

    pub fn new(feeds: Vec<F>, codec: &RowCodec) -> Self {
        let buffers = feeds
            .into_iter()
            .enumerate()
            .map(|(rank, feed)| RankBuffer::new(rank, feed, codec.clone()))
            .collect::<Vec<_>>();
        Self {
            open: buffers.len(),
            buffers,
            cursor: 0,
            progress: crate::report::Progress::new(Self::CHECKPOINT),
        }
    }
}

impl<F: Feed> Receiver for RoundRobin<F> {
    fn receive(&mut self, still: &AtomicBool) -> Result<Option<CandidateSeed>> {
        if self.open == 0 {
            still.store(false, Ordering::SeqCst);
            return Ok(None);
        }
        loop {
            for _ in 0..self.buffers.len() {
                let i = self.cursor;
                self.cursor = (self.cursor + 1) % self.buffers.len();
                let buffer = &mut self.buffers[i];
                if !buffer.still_streaming() {
                    continue;
                }
                let seed = buffer.ask()?;
                if seed.is_some() {
                    self.progress.tick();
                }
                if !buffer.still_streaming() {
                    self.open -= 1;
                    log::info!("rank {} closed, {} streams remain", buffer.rank(), self.open);
                    still.store(self.open != 0, Ordering::SeqCst);
                    return Ok(seed);
                }
                if seed.is_some() {
                    return Ok(seed);
                }
            }
            std::thread::yield_now();
        }
    }

    fn best_local(&mut self) -> Subset {
        let mut best: Option<usize> = None;
        for i in 0..self.buffers.len() {
            let score = self.buffers[i].local_score();
            log::info!("rank {} streamed a local solution of score {}", i, score);
            if score <= 0.0 {
                log::warn!("rank {} local solution scored {} which is <= 0", i, score);
            }
            if best.map_or(true, |b| score >= self.buffers[b].local_score()) {
                best = Some(i);
            }
        }
        match best {
            Some(i) => self.buffers[i].take_solution(),
            None => Subset::empty(),
        }
    }
}

/// standalone streaming: "receives" by reading the dataset itself, one row
/// per ask, so a single machine can titrate without any senders
pub struct LoadingReceiver {
    codec: RowCodec,
    lines: std::vec::IntoIter<String>,
    normalize: bool,
    cursor: usize,
}

impl LoadingReceiver {
    pub fn new(codec: RowCodec, lines: Vec<String>, normalize: bool) -> Self {
        Self {
            codec,
            lines: lines.into_iter(),
            normalize,
            cursor: 0,
        }
    }
}

impl Receiver for LoadingReceiver {
    fn receive(&mut self, still: &AtomicBool) -> Result<Option<CandidateSeed>> {
        match self.codec.next(&mut self.lines)? {
            Some(row) => {
                let row = match self.normalize {
                    true => row.normalized(),
                    false => row,
                };
                let seed = CandidateSeed::new(self.cursor, row, 0);
                self.cursor += 1;
                Ok(Some(seed))
            }
            None => {
                still.store(false, Ordering::SeqCst);
                Ok(None)
            }
        }
    }

    fn best_local(&mut self) -> Subset {
        Subset::empty()
    }
}

/// restricts a stream to one user's candidate rows; anything outside the
/// candidate set never reaches the titrator
pub struct UserFilter<R: Receiver> {
    inner: R,
    candidates: std::collections::HashSet<usize>,
}

impl<R: Receiver> UserFilter<R> {
    pub fn new(inner: R, user: &crate::data::users::UserRecord) -> Self {
        Self {
            inner,
            candidates: user.cu.iter().map(|c| *c as usize).collect(),
        }
    }
}

impl<R: Receiver> Receiver for UserFilter<R> {
    fn receive(&mut self, still: &AtomicBool) -> Result<Option<CandidateSeed>> {
        loop {
            let seed = self.inner.receive(still)?;
            if !still.load(Ordering::SeqCst) {
                return Ok(seed);
            }
            match seed {
                Some(seed) if self.candidates.contains(&seed.global()) => {
                    return Ok(Some(seed));
                }
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }

    fn best_local(&mut self) -> Subset {
        self.inner.best_local()
    }
}
