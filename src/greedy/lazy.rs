use super::Prioritized;
use super::Selector;
use crate::data::store::Dataset;
use crate::kernel::gram::Gram;
use crate::kernel::relevance::Relevance;
use crate::subset::Grower;
use std::collections::BinaryHeap;

/// CELF greedy: marginals only shrink as the subset grows, so stale values
/// are upper bounds. pop the best bound, refresh it, and select immediately
/// when the refreshed marginal still beats the runner-up's bound.
pub struct LazySelector {
    epsilon: f64,
}

impl LazySelector {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Selector for LazySelector {
    fn select<G, D, R>(&self, into: &mut G, calc: &R, data: &D, k: usize)
    where
        G: Grower,
        D: Dataset,
        R: Relevance,
    {
        let mut gram = Gram::default();
        let mut heap = (0..data.len())
            .map(|index| Prioritized {
                key: Gram::default().marginal(index, calc),
                index,
            })
            .collect::<BinaryHeap<_>>();
        while into.len() < k {
            let top = match heap.pop() {
                Some(top) => top,
                None => break,
            };
            let refreshed = gram.marginal(top.index, calc);
            let runner_up = heap.peek().map(|next| next.key);
            match runner_up {
                Some(bound) if refreshed < bound => heap.push(Prioritized {
                    key: refreshed,
                    index: top.index,
                }),
                _ => {
                    if refreshed <= super::floor(self.epsilon) {
                        log::warn!(
                            "no row improves coverage, stopping at {} of {}",
                            into.len(),
                            k
                        );
                        break;
                    }
                    gram.add(top.index, calc);
                    into.add(top.index, refreshed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture;
    use super::*;
    use crate::kernel::relevance::NaiveRelevance;
    use crate::subset::Subset;

    #[test]
    fn matches_naive_on_every_prefix() {
        let data = fixture();
        let calc = NaiveRelevance::from(&data);
        for k in 1..=data.len() {
            let mut lazy = Subset::empty();
            LazySelector::new(0.01).select(&mut lazy, &calc, &data, k);
            let naive = super::super::tests::run(crate::config::Algorithm::Naive, &data, k, 0.01);
            assert_eq!(lazy.rows(), naive.rows(), "k = {}", k);
        }
    }
}
