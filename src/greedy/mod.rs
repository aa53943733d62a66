pub mod fast;
pub mod lazy;
pub mod lazyfast;
pub mod naive;
pub mod sendall;

use crate::Gain;
use crate::config::Algorithm;
use crate::data::store::Dataset;
use crate::kernel::relevance::Relevance;
use crate::subset::Grower;

/// k-selection over a dataset through a relevance kernel. implementations
/// agree on the objective (coverage = log det of the selected kernel, each
/// reported marginal the per-step log of the Cholesky pivot) and on the
/// stopping rule (no remaining marginal above ln epsilon), so any two
/// selectors return the same rows for the same input. ties break toward the
/// lowest index.
pub trait Selector {
    fn select<G, D, R>(&self, into: &mut G, calc: &R, data: &D, k: usize)
    where
        G: Grower,
        D: Dataset,
        R: Relevance;
}

/// marginals at or below this floor terminate selection early; it is the
/// log-domain image of the fast selector's diagonal guard
pub fn floor(epsilon: f64) -> Gain {
    epsilon.ln()
}

/// run the configured greedy selector. the streaming algorithm is not a
/// greedy pass and is dispatched by the drivers before this point.
pub fn select<G, D, R>(algorithm: Algorithm, epsilon: f64, into: &mut G, calc: &R, data: &D, k: usize)
where
    G: Grower,
    D: Dataset,
    R: Relevance,
{
    match algorithm {
        Algorithm::Naive => naive::NaiveSelector::new(epsilon).select(into, calc, data, k),
        Algorithm::Lazy => lazy::LazySelector::new(epsilon).select(into, calc, data, k),
        Algorithm::Fast => fast::FastSelector::new(epsilon).select(into, calc, data, k),
        Algorithm::LazyFast => lazyfast::LazyFastSelector::new(epsilon).select(into, calc, data, k),
        Algorithm::Streaming => unreachable!("streaming is resolved by the drivers"),
    }
}

/// max-heap entry over an f64 priority; equal priorities surface the lowest
/// index first
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Prioritized {
    pub key: Gain,
    pub index: usize,
}

impl Eq for Prioritized {}

impl Ord for Prioritized {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key
            .total_cmp(&other.key)
            .then(other.index.cmp(&self.index))
    }
}

impl PartialOrd for Prioritized {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::row::Row;
    use crate::data::store::FullyLoaded;
    use crate::kernel::relevance::NaiveRelevance;
    use crate::subset::Subset;

    /// the reference dataset every selector must agree on
    pub fn fixture() -> FullyLoaded {
        FullyLoaded::new(vec![
            Row::dense(vec![4.0, 17.0, 20.0, 1.0, 4.0, 21.0]),
            Row::dense(vec![5.0, 7.0, 31.0, 45.0, 3.0, 24.0]),
            Row::dense(vec![2.632, 5.126, 73.0, 15.0, 15.0, 4.0]),
            Row::dense(vec![12.0, 6.0, 47.0, 32.0, 74.0, 4.0]),
            Row::dense(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            Row::dense(vec![6.0, 31.0, 54.0, 3.5, 23.0, 57.0]),
        ])
        .expect("fixture")
    }

    pub fn run(algorithm: Algorithm, data: &FullyLoaded, k: usize, epsilon: f64) -> Subset {
        let calc = NaiveRelevance::from(data);
        let mut subset = Subset::empty();
        select(algorithm, epsilon, &mut subset, &calc, data, k);
        subset
    }

    #[test]
    fn all_selectors_agree_on_the_fixture() {
        let data = fixture();
        let naive = run(Algorithm::Naive, &data, 5, 0.01);
        for algorithm in [Algorithm::Lazy, Algorithm::Fast, Algorithm::LazyFast] {
            let other = run(algorithm, &data, 5, 0.01);
            assert_eq!(naive.rows(), other.rows(), "{:?} diverged", algorithm);
            assert!(
                (naive.score() - other.score()).abs() < 0.1,
                "{:?} score {} against naive {}",
                algorithm,
                other.score(),
                naive.score()
            );
        }
    }

    #[test]
    fn selections_are_valid_subsets() {
        let data = fixture();
        for algorithm in [
            Algorithm::Naive,
            Algorithm::Lazy,
            Algorithm::Fast,
            Algorithm::LazyFast,
        ] {
            for k in [1, 3, 6] {
                let subset = run(algorithm, &data, k, 0.01);
                assert!(subset.len() <= k);
                let mut rows = subset.rows().to_vec();
                rows.sort();
                rows.dedup();
                assert_eq!(rows.len(), subset.len(), "{:?} duplicated rows", algorithm);
                assert!(rows.iter().all(|r| *r < data.len()));
            }
        }
    }

    #[test]
    fn priority_ties_prefer_low_index() {
        let mut heap = std::collections::BinaryHeap::new();
        heap.push(Prioritized { key: 1.0, index: 4 });
        heap.push(Prioritized { key: 1.0, index: 2 });
        heap.push(Prioritized { key: 2.0, index: 9 });
        assert_eq!(heap.pop().map(|e| e.index), Some(9));
        assert_eq!(heap.pop().map(|e| e.index), Some(2));
    }
}
