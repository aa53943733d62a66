use super::Selector;
use crate::data::store::Dataset;
use crate::kernel::matrix::NaiveKernel;
use crate::kernel::matrix::dot;
use crate::kernel::relevance::Relevance;
use crate::subset::Grower;

/// Cholesky-incremental greedy, the preferred default. each selection
/// pushes one projection coefficient onto every unselected row and deflates
/// its residual diagonal, so a full pass costs O(nk) kernel lookups instead
/// of fresh factorizations.
pub struct FastSelector {
    epsilon: f64,
}

impl FastSelector {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// argmax over unseen diagonals, lowest index on ties
    fn peak(diagonals: &[f64], seen: &[bool]) -> Option<(usize, f64)> {
        diagonals
            .iter()
            .enumerate()
            .filter(|(i, _)| !seen[*i])
            .max_by(|(i, a), (j, b)| a.total_cmp(b).then(j.cmp(i)))
            .map(|(i, d)| (i, *d))
    }
}

impl Selector for FastSelector {
    fn select<G, D, R>(&self, into: &mut G, calc: &R, data: &D, k: usize)
    where
        G: Grower,
        D: Dataset,
        R: Relevance,
    {
        use rayon::prelude::*;
        if k == 0 {
            return;
        }
        let kernel = NaiveKernel::from(calc, data.len());
        log::debug!("materialized {0}x{0} kernel", data.len());
        let mut diagonals = kernel.diagonals();
        let mut projections = vec![vec![]; data.len()];
        let mut seen = vec![false; data.len()];
        let mut current = match Self::peak(&diagonals, &seen) {
            Some(first) => first,
            None => return,
        };
        seen[current.0] = true;
        into.add(current.0, current.1.ln());
        while into.len() < k {
            let j = current.0;
            let pivot = diagonals[j].sqrt();
            let against = projections[j].clone();
            projections
                .par_iter_mut()
                .zip(diagonals.par_iter_mut())
                .enumerate()
                .filter(|(i, _)| !seen[*i])
                .for_each(|(i, (c_i, d_i))| {
                    let e = (kernel.get(j, i) - dot(&against, c_i)) / pivot;
                    c_i.push(e);
                    *d_i -= e * e;
                });
            current = match Self::peak(&diagonals, &seen) {
                Some(next) if next.1 > self.epsilon => next,
                _ => {
                    log::warn!(
                        "residual coverage exhausted, stopping at {} of {}",
                        into.len(),
                        k
                    );
                    return;
                }
            };
            seen[current.0] = true;
            into.add(current.0, current.1.ln());
        }
    }
}
