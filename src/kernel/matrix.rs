use super::relevance::Relevance;
use crate::KERNEL_RIDGE;

/// euclidean inner product, tolerant of length mismatch
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// the PSD matrix K with K[i,j] = s(i,j) and the identity ridge on the
/// diagonal, eagerly materialized. O(n^2) memory; the build is the dominant
/// cost of the fast selector and runs data-parallel.
pub struct NaiveKernel {
    matrix: Vec<Vec<f64>>,
}

impl NaiveKernel {
    pub fn from(calc: &impl Relevance, n: usize) -> Self {
        use rayon::prelude::*;
        let matrix = (0..n)
            .into_par_iter()
            .map(|j| {
                (0..n)
                    .map(|i| calc.score(j, i) as f64 + if i == j { KERNEL_RIDGE } else { 0.0 })
                    .collect()
            })
            .collect();
        Self { matrix }
    }

    pub fn get(&self, j: usize, i: usize) -> f64 {
        self.matrix[j][i]
    }

    pub fn diagonals(&self) -> Vec<f64> {
        (0..self.matrix.len()).map(|i| self.get(i, i)).collect()
    }
}

/// the same matrix, memoized on access. worth it when a selector only ever
/// touches the columns of rows it actually considers.
pub struct LazyKernel<'a, R: Relevance> {
    calc: &'a R,
    n: usize,
    memo: std::collections::HashMap<(usize, usize), f64>,
}

impl<'a, R: Relevance> LazyKernel<'a, R> {
    pub fn from(calc: &'a R, n: usize) -> Self {
        Self {
            calc,
            n,
            memo: std::collections::HashMap::new(),
        }
    }

    pub fn get(&mut self, j: usize, i: usize) -> f64 {
        let key = (j.min(i), j.max(i));
        let calc = self.calc;
        *self.memo.entry(key).or_insert_with(|| {
            calc.score(j, i) as f64 + if i == j { KERNEL_RIDGE } else { 0.0 }
        })
    }

    pub fn diagonals(&mut self) -> Vec<f64> {
        (0..self.n).map(|i| self.get(i, i)).collect()
    }
}
