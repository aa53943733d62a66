use crate::data::store::Dataset;
use crate::kernel::matrix::LazyKernel;
use crate::kernel::relevance::Relevance;
use crate::subset::Grower;

/// no selection at all: emit every local row in seeded-random order, scored
/// by its standalone diagonal. workers run this when the coordinator wants
/// the raw stream instead of local greedy picks.
pub struct SendAllSelector {
    seed: u64,
}

impl SendAllSelector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn select<G, D, R>(&self, into: &mut G, calc: &R, data: &D)
    where
        G: Grower,
        D: Dataset,
        R: Relevance,
    {
        use rand::SeedableRng;
        use rand::seq::SliceRandom;
        let mut kernel = LazyKernel::from(calc, data.len());
        let mut order = (0..data.len()).collect::<Vec<_>>();
        order.shuffle(&mut rand::rngs::StdRng::seed_from_u64(self.seed));
        for i in order {
            into.add(i, kernel.get(i, i).ln());
        }
    }
}
