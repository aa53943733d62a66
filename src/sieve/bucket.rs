use crate::Coverage;
use crate::Gain;
use crate::data::row::Row;
use crate::kernel::matrix::dot;
use crate::subset::Grower;
use crate::subset::Subset;
use std::sync::Arc;

/// one threshold bucket: a candidate row is admitted when its marginal
/// clears the bucket's pro-rated share of tau/2. the incremental Cholesky
/// state (one pivot d_j and one projection vector b_j per selected row)
/// reproduces the subset's log det(I + G) exactly, so admission costs
/// O(|S|) dot products instead of a factorization.
#[derive(Debug, Default)]
pub struct ThresholdBucket {
    threshold: f64,
    k: usize,
    solution: Subset,
    rows: Vec<Arc<Row>>,
    pivots: Vec<f64>,
    projections: Vec<Vec<f64>>,
}

impl ThresholdBucket {
    pub fn new(threshold: f64, k: usize) -> Self {
        Self {
            threshold,
            k,
            solution: Subset::empty(),
            rows: vec![],
            pivots: vec![],
            projections: vec![],
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
    pub fn utility(&self) -> Coverage {
        self.solution.score()
    }
    pub fn len(&self) -> usize {
        self.solution.len()
    }
    pub fn is_empty(&self) -> bool {
        self.solution.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.solution.len() >= self.k
    }

    /// move the selected contents under a new threshold. an empty bucket
    /// transfer is just the threshold change.
    pub fn transfer(self, threshold: f64) -> Self {
        Self { threshold, ..self }
    }

    pub fn into_solution(self) -> Subset {
        self.solution
    }

    pub fn attempt_insert(&mut self, global: usize, row: &Arc<Row>) -> bool {
        if self.is_full() {
            return false;
        }
        let mut d2 = 1.0 + row.norm2() as f64;
        let mut projection = Vec::with_capacity(self.rows.len());
        for j in 0..self.rows.len() {
            let e = (row.dot(&self.rows[j]) as f64 - dot(&self.projections[j], &projection))
                / self.pivots[j];
            projection.push(e);
            d2 -= e * e;
        }
        // roundoff can drive the residual non-positive; such a row adds
        // nothing representable and is rejected outright
        if !(d2 > 0.0) {
            return false;
        }
        let marginal = d2.ln();
        if !self.passes(marginal) {
            return false;
        }
        self.solution.add(global, marginal);
        self.rows.push(row.clone());
        self.pivots.push(d2.sqrt());
        self.projections.push(projection);
        true
    }

    fn passes(&self, marginal: Gain) -> bool {
        marginal
            >= (self.threshold / 2.0 - self.solution.score())
                / (self.k - self.solution.len()) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(values: Vec<f32>) -> Arc<Row> {
        Arc::new(Row::dense(values))
    }

    #[test]
    fn open_threshold_admits_the_first_row() {
        let mut bucket = ThresholdBucket::new(0.0, 3);
        assert!(bucket.attempt_insert(0, &arc(vec![1.0, 0.0, 0.0])));
        assert!(bucket.utility() > 0.0);
        assert_eq!(bucket.len(), 1);
        let solution = bucket.into_solution();
        assert_eq!(solution.rows(), &[0]);
    }

    #[test]
    fn capacity_caps_the_bucket() {
        let mut bucket = ThresholdBucket::new(0.0, 3);
        assert!(bucket.attempt_insert(0, &arc(vec![1.0, 0.0, 0.0])));
        assert!(bucket.attempt_insert(1, &arc(vec![0.0, 1.0, 0.0])));
        assert!(bucket.attempt_insert(2, &arc(vec![0.0, 0.0, 1.0])));
        assert!(bucket.is_full());
        assert!(!bucket.attempt_insert(3, &arc(vec![1.0, 1.0, 1.0])));
        assert_eq!(bucket.len(), 3);
    }

    #[test]
    fn open_threshold_admits_to_capacity() {
        let mut bucket = ThresholdBucket::new(0.0, 4);
        for (i, row) in (0..6).map(|i| (i, arc(vec![i as f32 + 1.0, 1.0]))) {
            let admitted = bucket.attempt_insert(i, &row);
            assert_eq!(admitted, i < 4, "row {}", i);
        }
    }

    #[test]
    fn unreachable_threshold_admits_nothing() {
        let rows = [vec![1.0, 2.0], vec![3.0, 0.5]].map(arc);
        let diag_max = rows
            .iter()
            .map(|r| 1.0 + r.norm2() as f64)
            .fold(0.0, f64::max);
        let mut bucket = ThresholdBucket::new(2.0 * 3.0 * diag_max + 1.0, 3);
        for (i, row) in rows.iter().enumerate() {
            assert!(!bucket.attempt_insert(i, row));
        }
        assert!(bucket.is_empty());
    }

    #[test]
    fn cholesky_state_tracks_the_log_determinant() {
        let rows = [
            vec![4.0, 17.0, 20.0],
            vec![5.0, 7.0, 31.0],
            vec![2.632, 5.126, 73.0],
        ]
        .map(arc);
        let mut bucket = ThresholdBucket::new(0.0, 3);
        for (i, row) in rows.iter().enumerate() {
            assert!(bucket.attempt_insert(i, row));
        }
        // log det(I + G) by direct 3x3 Cholesky over the raw Gram matrix
        let mut gram = crate::kernel::gram::Gram::default();
        let store = crate::data::store::FullyLoaded::new(
            rows.iter().map(|r| r.as_ref().clone()).collect(),
        )
        .expect("store");
        struct RawKernel<'a>(&'a crate::data::store::FullyLoaded);
        impl crate::kernel::relevance::Relevance for RawKernel<'_> {
            fn score(&self, i: usize, j: usize) -> f32 {
                use crate::data::store::Dataset;
                self.0.row(i).dot(self.0.row(j))
            }
        }
        let raw = RawKernel(&store);
        for i in 0..3 {
            gram.add(i, &raw);
        }
        let relative = (bucket.utility() - gram.coverage()).abs() / gram.coverage().abs();
        assert!(relative < 1e-4, "relative error {}", relative);
    }

    #[test]
    fn transfer_keeps_contents_and_lowers_threshold() {
        let mut bucket = ThresholdBucket::new(0.0, 3);
        assert!(bucket.attempt_insert(7, &arc(vec![2.0, 0.0])));
        let moved = bucket.transfer(1.0);
        assert_eq!(moved.threshold(), 1.0);
        assert_eq!(moved.len(), 1);
        let empty = ThresholdBucket::new(5.0, 3).transfer(2.0);
        assert_eq!(empty.threshold(), 2.0);
        assert!(empty.is_empty());
    }
}
