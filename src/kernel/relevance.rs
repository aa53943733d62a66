use crate::Weight;
use crate::data::row::Row;
use crate::data::store::Dataset;
use crate::data::users::UserRecord;
use crate::error::Result;

/// pairwise similarity s(i, j) in [0, 1]: symmetric, non-negative
pub trait Relevance: Sync {
    fn score(&self, i: usize, j: usize) -> Weight;
}

/// s(i, j) = (1 + row_i . row_j) / 2
pub struct NaiveRelevance<'a, D: Dataset> {
    data: &'a D,
}

impl<'a, D: Dataset> NaiveRelevance<'a, D> {
    pub fn from(data: &'a D) -> Self {
        Self { data }
    }
}

impl<D: Dataset> Relevance for NaiveRelevance<'_, D> {
    fn score(&self, i: usize, j: usize) -> Weight {
        (1.0 + self.data.row(i).dot(self.data.row(j))) / 2.0
    }
}

/// self-relevance of a detached row, used to probe delta-zero from a
/// streamed seed before it belongs to any store
pub fn self_relevance(row: &Row) -> Weight {
    (1.0 + row.norm2()) / 2.0
}

/// personalization: scales the base similarity by exp(a ru_i) exp(a ru_j)
/// where a = theta / 2(1 - theta). theta near 1 chases relevance, theta
/// near 0 falls back to pure diversity.
pub struct UserModeRelevance<'a, D: Dataset> {
    base: NaiveRelevance<'a, D>,
    boost: Vec<f64>,
}

impl<'a, D: Dataset> UserModeRelevance<'a, D> {
    pub fn from(data: &'a D, user: &UserRecord, theta: f64) -> Result<Self> {
        let alpha = 0.5 * theta / (1.0 - theta);
        log::debug!("user {} weighting with alpha {}", user.uid, alpha);
        Ok(Self {
            base: NaiveRelevance::from(data),
            boost: user
                .project(data)?
                .into_iter()
                .map(|ru| (alpha * ru).exp())
                .collect(),
        })
    }
}

impl<D: Dataset> Relevance for UserModeRelevance<'_, D> {
    fn score(&self, i: usize, j: usize) -> Weight {
        (self.boost[i] * self.base.score(i, j) as f64 * self.boost[j]) as Weight
    }
}
