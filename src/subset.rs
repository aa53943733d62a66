use crate::Coverage;
use crate::Gain;

/// something that accumulates selected rows one marginal gain at a time.
/// the plain Subset grows in place; the streaming decorator additionally
/// ships every accepted row to the coordinator.
pub trait Grower {
    fn add(&mut self, row: usize, gain: Gain);
    fn len(&self) -> usize;
    fn score(&self) -> Coverage;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// ordered selection of global row indices plus its cumulative coverage.
/// the score never decreases: growth happens only through non-negative
/// reported marginals.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Subset {
    rows: Vec<usize>,
    #[serde(rename = "totalCoverage")]
    score: Coverage,
}

impl Subset {
    pub fn empty() -> Self {
        Self {
            rows: vec![],
            score: 0.0,
        }
    }
    pub fn of(rows: Vec<usize>, score: Coverage) -> Self {
        Self { rows, score }
    }
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn score(&self) -> Coverage {
        self.score
    }
    pub fn row(&self, i: usize) -> usize {
        self.rows[i]
    }
    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.rows.iter()
    }
    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }
}

impl Grower for Subset {
    fn add(&mut self, row: usize, gain: Gain) {
        self.rows.push(row);
        self.score += gain;
    }
    fn len(&self) -> usize {
        self.rows.len()
    }
    fn score(&self) -> Coverage {
        self.score
    }
}

/// a subset attributed to the user whose relevance weighting produced it
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserSubset {
    #[serde(rename = "userId")]
    pub user: u64,
    #[serde(rename = "testId")]
    pub test: u64,
    #[serde(flatten)]
    pub subset: Subset,
}
