use super::row::Row;
use crate::Rank;
use crate::error::Error;
use crate::error::Result;
use crate::subset::Subset;

/// read access to an immutable collection of rows. stores are built once at
/// load time and shared freely afterwards.
pub trait Dataset: Send + Sync {
    fn len(&self) -> usize;
    fn columns(&self) -> usize;
    fn row(&self, i: usize) -> &Row;
    /// dataset-global index of a local row
    fn global_index(&self, i: usize) -> usize {
        i
    }
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn uniform_columns(rows: &[Row]) -> Result<usize> {
    let columns = rows.first().map(Row::size).unwrap_or(0);
    match rows.iter().position(|row| row.size() != columns) {
        None => Ok(columns),
        Some(i) => Err(Error::InvariantViolation(format!(
            "row {} has {} columns, dataset established {}",
            i,
            rows[i].size(),
            columns
        ))),
    }
}

/// every row of the dataset on one host; global index == local index
pub struct FullyLoaded {
    rows: Vec<Row>,
    columns: usize,
}

impl FullyLoaded {
    pub fn new(rows: Vec<Row>) -> Result<Self> {
        let columns = uniform_columns(&rows)?;
        Ok(Self { rows, columns })
    }
}

impl Dataset for FullyLoaded {
    fn len(&self) -> usize {
        self.rows.len()
    }
    fn columns(&self) -> usize {
        self.columns
    }
    fn row(&self, i: usize) -> &Row {
        &self.rows[i]
    }
}

/// one worker's shard, carrying the local-to-global index map derived from
/// the shared rank-assignment table
pub struct Segmented {
    rows: Vec<Row>,
    globals: Vec<usize>,
    columns: usize,
}

impl Segmented {
    pub fn new(rows: Vec<Row>, globals: Vec<usize>) -> Result<Self> {
        if rows.len() != globals.len() {
            return Err(Error::InvariantViolation(format!(
                "{} rows against {} global indices",
                rows.len(),
                globals.len()
            )));
        }
        let columns = uniform_columns(&rows)?;
        Ok(Self {
            rows,
            globals,
            columns,
        })
    }

    /// keep the rows of `assignment` that belong to `rank`, in global order
    pub fn shard(rows: Vec<Row>, assignment: &[Rank], rank: Rank) -> Result<Self> {
        if rows.len() != assignment.len() {
            return Err(Error::InvariantViolation(format!(
                "assignment table covers {} rows, dataset has {}",
                assignment.len(),
                rows.len()
            )));
        }
        let (mine, globals): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .enumerate()
            .filter(|(global, _)| assignment[*global] == rank)
            .map(|(global, row)| (row, global))
            .unzip();
        Self::new(mine, globals)
    }
}

impl Dataset for Segmented {
    fn len(&self) -> usize {
        self.rows.len()
    }
    fn columns(&self) -> usize {
        self.columns
    }
    fn row(&self, i: usize) -> &Row {
        &self.rows[i]
    }
    fn global_index(&self, i: usize) -> usize {
        self.globals[i]
    }
}

/// rows reconstructed from wire frames on the coordinator, keyed by the
/// global indices their senders reported
pub struct Received {
    rows: Vec<Row>,
    globals: Vec<usize>,
    columns: usize,
}

impl Received {
    pub fn new(pairs: Vec<(usize, Row)>) -> Result<Self> {
        let (globals, rows) = pairs.into_iter().unzip::<_, _, Vec<_>, Vec<_>>();
        let columns = uniform_columns(&rows)?;
        Ok(Self {
            rows,
            globals,
            columns,
        })
    }

    /// map a subset over local indices back into sender-global indices
    pub fn translate(&self, local: Subset) -> Subset {
        Subset::of(
            local.rows().iter().map(|i| self.globals[*i]).collect(),
            local.score(),
        )
    }
}

impl Dataset for Received {
    fn len(&self) -> usize {
        self.rows.len()
    }
    fn columns(&self) -> usize {
        self.columns
    }
    fn row(&self, i: usize) -> &Row {
        &self.rows[i]
    }
    fn global_index(&self, i: usize) -> usize {
        self.globals[i]
    }
}
