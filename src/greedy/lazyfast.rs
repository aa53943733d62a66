use super::Prioritized;
use super::Selector;
use crate::data::store::Dataset;
use crate::kernel::matrix::LazyKernel;
use crate::kernel::matrix::dot;
use crate::kernel::relevance::Relevance;
use crate::subset::Grower;
use std::collections::BinaryHeap;
use std::collections::HashMap;

/// lazy evaluation over the Cholesky recurrence: the heap holds residual
/// diagonals as upper bounds, and a popped row replays only the updates it
/// missed since its last refresh. rows the selection never touches never pay
/// for kernel columns, which is where the lazy kernel earns its keep.
pub struct LazyFastSelector {
    epsilon: f64,
}

impl LazyFastSelector {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// projection coefficients against the first t selected rows, in
    /// selection order
    fn slice(projection: &HashMap<usize, f64>, selected: &[usize], t: usize) -> Vec<f64> {
        selected[..t].iter().map(|j| projection[j]).collect()
    }
}

impl Selector for LazyFastSelector {
    fn select<G, D, R>(&self, into: &mut G, calc: &R, data: &D, k: usize)
    where
        G: Grower,
        D: Dataset,
        R: Relevance,
    {
        let mut kernel = LazyKernel::from(calc, data.len());
        let mut diagonals = kernel.diagonals();
        let mut updates = vec![0usize; data.len()];
        let mut projections = vec![HashMap::new(); data.len()];
        let mut selected: Vec<usize> = vec![];
        let mut heap = diagonals
            .iter()
            .enumerate()
            .map(|(index, d)| Prioritized { key: d.ln(), index })
            .collect::<BinaryHeap<_>>();
        while into.len() < k {
            let top = match heap.pop() {
                Some(top) => top,
                None => break,
            };
            let i = top.index;
            for t in updates[i]..selected.len() {
                let j = selected[t];
                let mine = Self::slice(&projections[i], &selected, t);
                let theirs = Self::slice(&projections[j], &selected, t);
                let e = (kernel.get(i, j) - dot(&mine, &theirs)) / diagonals[j].sqrt();
                projections[i].insert(j, e);
                diagonals[i] -= e * e;
            }
            updates[i] = selected.len();
            if diagonals[i] < self.epsilon {
                log::warn!(
                    "residual coverage exhausted, stopping at {} of {}",
                    into.len(),
                    k
                );
                break;
            }
            let gain = diagonals[i].ln();
            let runner_up = heap.peek().map(|next| diagonals[next.index].ln());
            match runner_up {
                Some(bound) if gain < bound && into.len() != data.len() - 1 => {
                    heap.push(Prioritized { key: gain, index: i });
                }
                _ => {
                    into.add(i, gain);
                    selected.push(i);
                }
            }
        }
    }
}
