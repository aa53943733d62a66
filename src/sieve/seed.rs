use crate::Rank;
use crate::data::row::Row;
use std::sync::Arc;

/// one streamed candidate: a row payload, the dataset-global index its
/// sender reported, and the sending rank. immutable after construction; the
/// titrator's retained storage and its buckets share the row through the Arc.
#[derive(Debug, Clone)]
pub struct CandidateSeed {
    global: usize,
    row: Arc<Row>,
    origin: Rank,
}

impl CandidateSeed {
    pub fn new(global: usize, row: Row, origin: Rank) -> Self {
        Self {
            global,
            row: Arc::new(row),
            origin,
        }
    }
    pub fn global(&self) -> usize {
        self.global
    }
    pub fn row(&self) -> &Arc<Row> {
        &self.row
    }
    pub fn origin(&self) -> Rank {
        self.origin
    }
}
