use crate::Weight;
use std::collections::BTreeMap;

/// a single observation. dense rows keep every column in order, sparse rows
/// keep only their nonzero entries keyed by column index. column count is
/// uniform across a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Dense(Vec<Weight>),
    Sparse {
        entries: BTreeMap<usize, Weight>,
        columns: usize,
    },
}

impl Row {
    pub fn dense(values: Vec<Weight>) -> Self {
        Self::Dense(values)
    }
    pub fn sparse(entries: BTreeMap<usize, Weight>, columns: usize) -> Self {
        Self::Sparse { entries, columns }
    }

    /// number of columns, counting implicit zeros
    pub fn size(&self) -> usize {
        match self {
            Self::Dense(values) => values.len(),
            Self::Sparse { columns, .. } => *columns,
        }
    }

    /// euclidean inner product over the variant pair. mismatched lengths
    /// truncate to the shorter operand.
    pub fn dot(&self, other: &Self) -> Weight {
        match (self, other) {
            (Self::Dense(a), Self::Dense(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x * y)
                .sum(),
            (Self::Dense(a), Self::Sparse { entries, .. })
            | (Self::Sparse { entries, .. }, Self::Dense(a)) => entries
                .iter()
                .filter_map(|(col, v)| a.get(*col).map(|x| x * v))
                .sum(),
            (Self::Sparse { entries: a, .. }, Self::Sparse { entries: b, .. }) => {
                Self::intersect(a, b)
            }
        }
    }

    /// squared euclidean norm
    pub fn norm2(&self) -> Weight {
        self.dot(self)
    }

    /// sorted-map intersection by column key
    fn intersect(a: &BTreeMap<usize, Weight>, b: &BTreeMap<usize, Weight>) -> Weight {
        let mut lhs = a.iter().peekable();
        let mut rhs = b.iter().peekable();
        let mut dot = 0.0;
        while let (Some((i, x)), Some((j, y))) = (lhs.peek(), rhs.peek()) {
            match i.cmp(j) {
                std::cmp::Ordering::Equal => {
                    dot += *x * *y;
                    lhs.next();
                    rhs.next();
                }
                std::cmp::Ordering::Less => {
                    lhs.next();
                }
                std::cmp::Ordering::Greater => {
                    rhs.next();
                }
            }
        }
        dot
    }

    /// streaming payload: dense rows ship their values in column order,
    /// sparse rows ship flattened (column, value) pairs
    pub fn wire_payload(&self) -> Vec<Weight> {
        match self {
            Self::Dense(values) => values.clone(),
            Self::Sparse { entries, .. } => entries
                .iter()
                .flat_map(|(col, v)| [*col as Weight, *v])
                .collect(),
        }
    }

    /// fixed-width payload for gathered bulk messages: always one value per
    /// column, zeros included
    pub fn dense_payload(&self) -> Vec<Weight> {
        match self {
            Self::Dense(values) => values.clone(),
            Self::Sparse { entries, columns } => {
                let mut values = vec![0.0; *columns];
                for (col, v) in entries {
                    values[*col] = *v;
                }
                values
            }
        }
    }

    /// scale to unit euclidean norm. zero rows come back unchanged.
    pub fn normalized(self) -> Self {
        let norm = (self.norm2() as f64).sqrt();
        if norm == 0.0 {
            return self;
        }
        match self {
            Self::Dense(values) => {
                Self::Dense(values.into_iter().map(|v| (v as f64 / norm) as Weight).collect())
            }
            Self::Sparse { entries, columns } => Self::Sparse {
                entries: entries
                    .into_iter()
                    .map(|(col, v)| (col, (v as f64 / norm) as Weight))
                    .collect(),
                columns,
            },
        }
    }
}

impl crate::Arbitrary for Row {
    fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        Self::Dense((0..8).map(|_| rng.random::<Weight>()).collect())
    }
}
