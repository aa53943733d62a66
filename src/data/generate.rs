use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// deterministic synthetic inputs, emitted in the same text formats the
/// loaders consume so generated and on-disk datasets follow one path

/// dense rows of uniform values in [0, 1), one comma-delimited line per row
pub fn dense_lines(rows: usize, columns: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|_| {
            (0..columns)
                .map(|_| format!("{}", rng.random::<f32>()))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect()
}

/// coordinate triples `row col value`, keeping each edge with probability
/// (1 - sparsity). rows that draw no edges surface downstream as empty rows.
pub fn sparse_lines(rows: usize, columns: usize, sparsity: f32, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut lines = vec![];
    for row in 0..rows {
        for col in 0..columns {
            if rng.random::<f32>() >= sparsity {
                lines.push(format!("{} {} {}", row, col, rng.random::<f32>()));
            }
        }
    }
    lines
}
