use super::frame::Tag;
use crate::Weight;
use crate::error::Error;
use crate::error::Result;
use std::sync::mpsc;

/// worker-side endpoint of the message layer: non-blocking sends of tagged
/// frames toward the coordinator. the interconnect behind it is deployment
/// detail; everything in this crate runs against this seam.
pub trait Courier: Send {
    fn send(&self, frame: Vec<Weight>, tag: Tag) -> Result<()>;
}

/// coordinator-side endpoint for one sender's ordered stream
pub trait Feed: Send {
    /// non-blocking poll for the next tagged frame
    fn poll(&mut self) -> Result<Option<(Vec<Weight>, Tag)>>;
}

/// in-process transport over std channels, one per worker rank. frames from
/// one sender arrive in send order; senders interleave arbitrarily.
pub struct ChannelCourier {
    tx: mpsc::Sender<(Vec<Weight>, Tag)>,
}

pub struct ChannelFeed {
    rx: mpsc::Receiver<(Vec<Weight>, Tag)>,
    closed: bool,
}

/// endpoints for a world of `world` workers streaming to one coordinator
pub fn links(world: usize) -> (Vec<ChannelCourier>, Vec<ChannelFeed>) {
    (0..world)
        .map(|_| {
            let (tx, rx) = mpsc::channel();
            (ChannelCourier { tx }, ChannelFeed { rx, closed: false })
        })
        .unzip()
}

impl Courier for ChannelCourier {
    fn send(&self, frame: Vec<Weight>, tag: Tag) -> Result<()> {
        self.tx
            .send((frame, tag))
            .map_err(|_| Error::Transport("coordinator hung up".to_string()))
    }
}

impl Feed for ChannelFeed {
    fn poll(&mut self) -> Result<Option<(Vec<Weight>, Tag)>> {
        if self.closed {
            return Ok(None);
        }
        match self.rx.try_recv() {
            Ok(delivery) => {
                if delivery.1 == Tag::Stop {
                    self.closed = true;
                }
                Ok(Some(delivery))
            }
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(Error::Transport(
                "sender hung up before its stop tag".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_arrive_in_send_order() {
        let (couriers, mut feeds) = links(1);
        couriers[0].send(vec![1.0], Tag::Continue).expect("send");
        couriers[0].send(vec![2.0], Tag::Stop).expect("send");
        let first = feeds[0].poll().expect("poll").expect("frame");
        assert_eq!(first, (vec![1.0], Tag::Continue));
        let last = feeds[0].poll().expect("poll").expect("frame");
        assert_eq!(last.1, Tag::Stop);
        // after the stop tag the feed reads as drained, not failed
        assert_eq!(feeds[0].poll().expect("poll"), None);
    }

    #[test]
    fn empty_feeds_poll_none() {
        let (_couriers, mut feeds) = links(1);
        assert_eq!(feeds[0].poll().expect("poll"), None);
    }

    #[test]
    fn abnormal_close_is_a_transport_failure() {
        let (couriers, mut feeds) = links(1);
        drop(couriers);
        assert!(feeds[0].poll().is_err());
    }
}
