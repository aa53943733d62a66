use super::Selector;
use crate::Gain;
use crate::data::store::Dataset;
use crate::kernel::gram::Gram;
use crate::kernel::relevance::Relevance;
use crate::subset::Grower;

/// textbook greedy: every step probes the marginal of every unselected row
/// against a fresh factorization and takes the argmax. quadratic in rows and
/// cubic in the subset, kept as the correctness oracle for the others.
pub struct NaiveSelector {
    epsilon: f64,
}

impl NaiveSelector {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Selector for NaiveSelector {
    fn select<G, D, R>(&self, into: &mut G, calc: &R, data: &D, k: usize)
    where
        G: Grower,
        D: Dataset,
        R: Relevance,
    {
        use rayon::prelude::*;
        let mut gram = Gram::default();
        let mut seen = vec![false; data.len()];
        while into.len() < k {
            let marginals = (0..data.len())
                .into_par_iter()
                .map(|i| match seen[i] {
                    true => Gain::NEG_INFINITY,
                    false => gram.marginal(i, calc),
                })
                .collect::<Vec<_>>();
            let best = marginals
                .iter()
                .enumerate()
                .max_by(|(i, a), (j, b)| a.total_cmp(b).then(j.cmp(i)))
                .map(|(i, gain)| (i, *gain));
            match best {
                Some((i, gain)) if gain > super::floor(self.epsilon) => {
                    gram.add(i, calc);
                    seen[i] = true;
                    into.add(i, gain);
                }
                _ => {
                    log::warn!("no row improves coverage, stopping at {} of {}", into.len(), k);
                    break;
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
    fn marginals_decrease_monotonically() {
        let data = fixture();
        let calc = NaiveRelevance::from(&data);
        let mut subset = Subset::empty();
        NaiveSelector::new(0.01).select(&mut subset, &calc, &data, 4);
        let mut gram = Gram::default();
        let mut last = Gain::INFINITY;
        for row in subset.rows() {
            let gain = gram.marginal(*row, &calc);
            assert!(gain <= last + 1e-9, "gain {} after {}", gain, last);
            gram.add(*row, &calc);
            last = gain;
        }
    }

    #[test]
    fn exhaustion_returns_short_subset() {
        // identical rows: after the first pick nothing clears a huge floor
        let data = crate::data::store::FullyLoaded::new(vec![
            crate::data::row::Row::dense(vec![1.0, 0.0]),
            crate::data::row::Row::dense(vec![1.0, 0.0]),
            crate::data::row::Row::dense(vec![1.0, 0.0]),
        ])
        .expect("data");
        let calc = NaiveRelevance::from(&data);
        let mut subset = Subset::empty();
        NaiveSelector::new(1.45).select(&mut subset, &calc, &data, 3);
        assert_eq!(subset.len(), 2);
    }
}
