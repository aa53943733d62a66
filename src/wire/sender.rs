use super::courier::Courier;
use super::frame;
use super::frame::Tag;
use crate::Coverage;
use crate::Gain;
use crate::Weight;
use crate::data::store::Dataset;
use crate::subset::Grower;
use crate::subset::Subset;
use std::collections::VecDeque;

/// decorates subset growth with the worker's outbound stream: every
/// accepted row becomes a frame. the newest frame is always held back so
/// that when the local pass ends, the final send can carry the stop tag.
pub struct StreamingSubset<'a, D: Dataset, C: Courier> {
    base: Subset,
    data: &'a D,
    courier: C,
    pending: VecDeque<Vec<Weight>>,
    closed: bool,
}

impl<'a, D: Dataset, C: Courier> StreamingSubset<'a, D, C> {
    pub fn new(data: &'a D, courier: C) -> Self {
        Self {
            base: Subset::empty(),
            data,
            courier,
            pending: VecDeque::new(),
            closed: false,
        }
    }

    fn ship(&mut self, tag: Tag) {
        if let Some(frame) = self.pending.pop_front() {
            if self.courier.send(frame, tag).is_err() {
                // the coordinator stopped early; anything unsent is moot
                log::debug!("coordinator closed, dropping remaining seeds");
                self.pending.clear();
                self.closed = true;
            }
        }
    }

    /// flush held frames and close the stream. a worker whose pass selected
    /// nothing still closes with a bare terminator so the coordinator can
    /// retire its buffer.
    pub fn finalize(mut self) -> Subset {
        if !self.closed {
            while self.pending.len() > 1 {
                self.ship(Tag::Continue);
            }
            match self.pending.pop_front() {
                Some(last) => drop(self.courier.send(last, Tag::Stop)),
                None => drop(self.courier.send(frame::terminator(), Tag::Stop)),
            }
        }
        self.base
    }
}

impl<D: Dataset, C: Courier> Grower for StreamingSubset<'_, D, C> {
    fn add(&mut self, row: usize, gain: Gain) {
        self.base.add(row, gain);
        if self.closed {
            return;
        }
        self.pending.push_back(frame::encode_seed(
            &self.data.row(row).wire_payload(),
            gain as Weight,
            self.data.global_index(row),
        ));
        while self.pending.len() > 1 {
            self.ship(Tag::Continue);
        }
    }
    fn len(&self) -> usize {
        self.base.len()
    }
    fn score(&self) -> Coverage {
        self.base.score()
    }
}
