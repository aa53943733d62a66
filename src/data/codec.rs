use super::row::Row;
use crate::Weight;
use crate::error::Error;
use crate::error::Result;
use std::collections::BTreeMap;

/// parses text lines into rows and decodes row payloads off the wire. the
/// sparse variant is stateful across lines and cannot be reused between
/// loads.
#[derive(Debug, Clone)]
pub enum RowCodec {
    Dense,
    Sparse(SparseCodec),
    Adjacency { fanout: usize, columns: usize },
}

impl RowCodec {
    pub fn dense() -> Self {
        Self::Dense
    }
    pub fn sparse(columns: usize) -> Self {
        Self::Sparse(SparseCodec::new(columns))
    }
    pub fn adjacency(fanout: usize, columns: usize) -> Self {
        Self::Adjacency { fanout, columns }
    }

    /// parse the next row from a line source. None at end of input.
    pub fn next(&mut self, lines: &mut impl Iterator<Item = String>) -> Result<Option<Row>> {
        match self {
            Self::Dense => lines.next().map(Self::parse_dense).transpose(),
            Self::Sparse(codec) => codec.next(lines),
            Self::Adjacency { fanout, columns } => lines
                .next()
                .map(|line| Self::parse_adjacency(line, *fanout, *columns))
                .transpose(),
        }
    }

    /// decode a streamed payload: dense rows arrive as values in column
    /// order, sparse rows as flattened (column, value) pairs
    pub fn decode_wire(&self, payload: &[Weight]) -> Result<Row> {
        match self {
            Self::Dense => Ok(Row::dense(payload.to_vec())),
            Self::Sparse(SparseCodec { columns, .. }) | Self::Adjacency { columns, .. } => {
                if payload.len() % 2 != 0 {
                    return Err(Error::InvariantViolation(format!(
                        "sparse payload of length {} is not index/value pairs",
                        payload.len()
                    )));
                }
                let entries = payload
                    .chunks_exact(2)
                    .map(|pair| (pair[0] as usize, pair[1]))
                    .collect::<BTreeMap<_, _>>();
                Ok(Row::sparse(entries, *columns))
            }
        }
    }

    /// decode a fixed-width payload from a gathered bulk message, one value
    /// per column with zeros included
    pub fn decode_dense_wire(&self, payload: &[Weight]) -> Row {
        match self {
            Self::Dense => Row::dense(payload.to_vec()),
            Self::Sparse(SparseCodec { columns, .. }) | Self::Adjacency { columns, .. } => {
                let entries = payload
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| **v != 0.0)
                    .map(|(col, v)| (col, *v))
                    .collect::<BTreeMap<_, _>>();
                Row::sparse(entries, *columns)
            }
        }
    }

    fn parse_dense(line: String) -> Result<Row> {
        line.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Self::parse_weight)
            .collect::<Result<Vec<_>>>()
            .map(Row::dense)
    }

    fn parse_adjacency(line: String, fanout: usize, columns: usize) -> Result<Row> {
        let targets = line
            .split_whitespace()
            .map(Self::parse_weight)
            .collect::<Result<Vec<_>>>()?;
        if targets.len() != fanout {
            return Err(Error::InputMalformed(format!(
                "adjacency line has {} targets, expected fan-out of {}",
                targets.len(),
                fanout
            )));
        }
        Ok(Row::sparse(
            targets.into_iter().map(|col| (col as usize, 1.0)).collect(),
            columns,
        ))
    }

    fn parse_weight(token: &str) -> Result<Weight> {
        token
            .parse::<Weight>()
            .map_err(|_| Error::InputMalformed(format!("unparseable value {:?}", token)))
    }
}

/// incremental reader of whitespace-delimited coordinate triples
/// `row col [value]`. row indices must be non-decreasing; gaps in the row
/// sequence yield empty rows; a missing value defaults to 1.0.
#[derive(Debug, Clone)]
pub struct SparseCodec {
    columns: usize,
    expected: usize,
    carried: Option<(usize, usize, Weight)>,
}

impl SparseCodec {
    fn new(columns: usize) -> Self {
        Self {
            columns,
            expected: 0,
            carried: None,
        }
    }

    fn next(&mut self, lines: &mut impl Iterator<Item = String>) -> Result<Option<Row>> {
        let mut entries = BTreeMap::new();
        if let Some((row, col, value)) = self.carried {
            if row == self.expected {
                entries.insert(col, value);
                self.carried = None;
            } else {
                // still inside a gap: emit an empty row and keep the carry
                self.expected += 1;
                return Ok(Some(Row::sparse(entries, self.columns)));
            }
        }
        loop {
            let line = match lines.next() {
                Some(line) => line,
                None => {
                    return match entries.is_empty() {
                        true => Ok(None),
                        false => Ok(Some(Row::sparse(entries, self.columns))),
                    };
                }
            };
            let (row, col, value) = Self::parse_edge(&line)?;
            if row == self.expected {
                entries.insert(col, value);
            } else if row > self.expected {
                self.expected += 1;
                self.carried = Some((row, col, value));
                return Ok(Some(Row::sparse(entries, self.columns)));
            } else {
                return Err(Error::InvariantViolation(format!(
                    "cannot backtrack from row {} to row {}",
                    self.expected, row
                )));
            }
        }
    }

    fn parse_edge(line: &str) -> Result<(usize, usize, Weight)> {
        let mut tokens = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty());
        let row = Self::parse_index(tokens.next(), line)?;
        let col = Self::parse_index(tokens.next(), line)?;
        let value = match tokens.next() {
            Some(token) => RowCodec::parse_weight(token)?,
            None => 1.0,
        };
        Ok((row, col, value))
    }

    fn parse_index(token: Option<&str>, line: &str) -> Result<usize> {
        token
            .and_then(|t| t.parse::<f64>().ok())
            .map(|v| v.floor() as usize)
            .ok_or_else(|| Error::InputMalformed(format!("unparseable edge {:?}", line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> impl Iterator<Item = String> + '_ {
        text.lines().map(String::from)
    }

    fn collect(codec: &mut RowCodec, text: &str) -> Vec<Row> {
        let mut source = lines(text).collect::<Vec<_>>().into_iter();
        let mut rows = vec![];
        while let Some(row) = codec.next(&mut source).expect("parse") {
            rows.push(row);
        }
        rows
    }

    #[test]
    fn dense_lines_parse_in_order() {
        let rows = collect(&mut RowCodec::dense(), "1,2,3\n4,5,6\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Row::dense(vec![1.0, 2.0, 3.0]));
        assert_eq!(rows[1], Row::dense(vec![4.0, 5.0, 6.0]));
    }

    #[test]
    fn sparse_edges_group_by_row() {
        let rows = collect(&mut RowCodec::sparse(4), "0 1 2.0\n0 3 4.0\n1 0 1.5\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dot(&Row::dense(vec![0.0, 1.0, 0.0, 1.0])), 6.0);
        assert_eq!(rows[1].size(), 4);
    }

    #[test]
    fn sparse_missing_value_defaults_to_one() {
        let rows = collect(&mut RowCodec::sparse(3), "0 2\n");
        assert_eq!(rows[0].dot(&Row::dense(vec![0.0, 0.0, 1.0])), 1.0);
    }

    #[test]
    fn sparse_gaps_emit_empty_rows() {
        let rows = collect(&mut RowCodec::sparse(3), "0 0 1.0\n3 1 2.0\n");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].norm2(), 0.0);
        assert_eq!(rows[2].norm2(), 0.0);
        assert_eq!(rows[3].norm2(), 4.0);
    }

    #[test]
    fn sparse_backtrack_is_fatal() {
        let mut source = lines("2 0 1.0\n1 0 1.0\n").collect::<Vec<_>>().into_iter();
        let mut codec = RowCodec::sparse(3);
        let mut outcome = Ok(None);
        for _ in 0..4 {
            outcome = codec.next(&mut source);
            if outcome.is_err() {
                break;
            }
        }
        assert!(matches!(outcome, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn adjacency_lines_become_unit_entries() {
        let rows = collect(&mut RowCodec::adjacency(2, 5), "1 3\n0 4\n");
        assert_eq!(rows[0].dot(&Row::dense(vec![1.0; 5])), 2.0);
        assert_eq!(rows[1].size(), 5);
    }

    #[test]
    fn wire_roundtrip_preserves_rows() {
        let dense = Row::dense(vec![1.0, 2.0, 3.0]);
        let codec = RowCodec::dense();
        assert_eq!(codec.decode_wire(&dense.wire_payload()).expect("decode"), dense);

        let sparse = Row::sparse([(1, 2.0), (4, 0.5)].into_iter().collect(), 6);
        let codec = RowCodec::sparse(6);
        assert_eq!(codec.decode_wire(&sparse.wire_payload()).expect("decode"), sparse);
        assert_eq!(codec.decode_dense_wire(&sparse.dense_payload()), sparse);
    }

    #[test]
    fn odd_sparse_payload_is_fatal() {
        let codec = RowCodec::sparse(4);
        assert!(codec.decode_wire(&[1.0, 2.0, 3.0]).is_err());
    }
}
