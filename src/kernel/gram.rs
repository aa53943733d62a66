use super::relevance::Relevance;
use crate::Coverage;
use crate::KERNEL_RIDGE;

/// the kernel submatrix over the currently selected rows, grown one row at a
/// time. coverage is the log-determinant through a fresh Cholesky
/// factorization, so cloning a Gram gives the cheap what-if probe the naive
/// and lazy selectors are built on.
#[derive(Debug, Clone, Default)]
pub struct Gram {
    selected: Vec<usize>,
    matrix: Vec<Vec<f64>>,
}

impl Gram {
    pub fn len(&self) -> usize {
        self.selected.len()
    }
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// extend the matrix by the kernel row and column of one more index
    pub fn add(&mut self, index: usize, calc: &impl Relevance) {
        let border = self
            .selected
            .iter()
            .map(|j| calc.score(index, *j) as f64)
            .collect::<Vec<_>>();
        for (row, s) in self.matrix.iter_mut().zip(border.iter()) {
            row.push(*s);
        }
        let mut last = border;
        last.push(calc.score(index, index) as f64 + KERNEL_RIDGE);
        self.matrix.push(last);
        self.selected.push(index);
    }

    /// log det of the current kernel. the ridge keeps the matrix positive
    /// definite; a pivot driven non-positive by roundoff reads as no
    /// remaining coverage.
    pub fn coverage(&self) -> Coverage {
        let n = self.matrix.len();
        let mut lower = vec![vec![0.0f64; n]; n];
        let mut logdet = 0.0;
        for i in 0..n {
            for j in 0..=i {
                let partial = super::matrix::dot(&lower[i][..j], &lower[j][..j]);
                let entry = self.matrix[i][j] - partial;
                if i == j {
                    if entry <= 0.0 {
                        return Coverage::NEG_INFINITY;
                    }
                    lower[i][j] = entry.sqrt();
                    logdet += entry.ln();
                } else {
                    lower[i][j] = entry / lower[j][j];
                }
            }
        }
        logdet
    }

    /// coverage change from adding one more index
    pub fn marginal(&self, index: usize, calc: &impl Relevance) -> Coverage {
        let mut probe = self.clone();
        let before = match self.is_empty() {
            true => 0.0,
            false => self.coverage(),
        };
        probe.add(index, calc);
        probe.coverage() - before
    }
}
