use super::courier::Feed;
use super::frame;
use super::frame::Tag;
use crate::Coverage;
use crate::Rank;
use crate::data::codec::RowCodec;
use crate::error::Result;
use crate::sieve::seed::CandidateSeed;
use crate::subset::Grower;
use crate::subset::Subset;

/// coordinator-side state for one sender: the pending receive, the running
/// local-solution mirror rebuilt from frame controls, and whether the
/// sender is still streaming. owned by the polling thread alone.
pub struct RankBuffer<F: Feed> {
    rank: Rank,
    feed: F,
    codec: RowCodec,
    solution: Subset,
    streaming: bool,
}

impl<F: Feed> RankBuffer<F> {
    pub fn new(rank: Rank, feed: F, codec: RowCodec) -> Self {
        Self {
            rank,
            feed,
            codec,
            solution: Subset::empty(),
            streaming: true,
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }
    pub fn still_streaming(&self) -> bool {
        self.streaming
    }
    pub fn local_score(&self) -> Coverage {
        self.solution.score()
    }
    pub fn take_solution(&mut self) -> Subset {
        std::mem::replace(&mut self.solution, Subset::empty())
    }

    /// poll for one frame. a decoded seed mirrors into this sender's local
    /// solution before it is handed to the caller; a stop tag retires the
    /// buffer.
    pub fn ask(&mut self) -> Result<Option<CandidateSeed>> {
        if !self.streaming {
            return Ok(None);
        }
        let (data, tag) = match self.feed.poll()? {
            Some(delivery) => delivery,
            None => return Ok(None),
        };
        if tag == Tag::Stop {
            log::info!("rank {} finished streaming", self.rank);
            self.streaming = false;
        }
        match frame::decode_seed(&data)? {
            None => Ok(None),
            Some(decoded) => {
                let row = self.codec.decode_wire(decoded.payload)?;
                self.solution.add(decoded.global, decoded.marginal as Coverage);
                Ok(Some(CandidateSeed::new(decoded.global, row, self.rank)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::courier::Courier;
    use crate::wire::courier::links;

    #[test]
    fn frames_mirror_into_the_local_solution() {
        let (couriers, mut feeds) = links(1);
        couriers[0]
            .send(frame::encode_seed(&[1.0, 2.0, 3.0], 0.5, 7), Tag::Stop)
            .expect("send");
        let mut buffer = RankBuffer::new(0, feeds.remove(0), RowCodec::dense());
        let seed = buffer.ask().expect("ask").expect("seed");
        assert_eq!(seed.global(), 7);
        assert_eq!(seed.origin(), 0);
        assert_eq!(seed.row().size(), 3);
        assert!(!buffer.still_streaming());
        let local = buffer.take_solution();
        assert_eq!(local.rows(), &[7]);
        assert!((local.score() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn continue_tags_keep_the_buffer_listening() {
        let (couriers, mut feeds) = links(1);
        couriers[0]
            .send(frame::encode_seed(&[1.0], 0.1, 0), Tag::Continue)
            .expect("send");
        let mut buffer = RankBuffer::new(0, feeds.remove(0), RowCodec::dense());
        assert!(buffer.ask().expect("ask").is_some());
        assert!(buffer.still_streaming());
        assert!(buffer.ask().expect("ask").is_none());
    }

    #[test]
    fn sparse_frames_rebuild_sparse_rows() {
        let (couriers, mut feeds) = links(1);
        let row = crate::data::row::Row::sparse([(2, 4.0), (5, 1.5)].into_iter().collect(), 8);
        couriers[0]
            .send(frame::encode_seed(&row.wire_payload(), 1.0, 3), Tag::Stop)
            .expect("send");
        let mut buffer = RankBuffer::new(2, feeds.remove(0), RowCodec::sparse(8));
        let seed = buffer.ask().expect("ask").expect("seed");
        assert_eq!(seed.row().as_ref(), &row);
        assert_eq!(seed.origin(), 2);
    }

    #[test]
    fn malformed_sparse_payloads_abort() {
        let (couriers, mut feeds) = links(1);
        couriers[0]
            .send(frame::encode_seed(&[1.0, 2.0, 3.0], 0.5, 7), Tag::Stop)
            .expect("send");
        let mut buffer = RankBuffer::new(0, feeds.remove(0), RowCodec::sparse(8));
        assert!(buffer.ask().is_err());
    }
}
