use super::codec::RowCodec;
use super::row::Row;
use super::store::FullyLoaded;
use super::store::Segmented;
use crate::Rank;
use crate::error::Error;
use crate::error::Result;
use std::io::BufRead;

/// read a whole input file into memory as lines
pub fn lines_from(path: &std::path::Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    Ok(std::io::BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()?)
}

/// drain a line source through the codec
pub fn load_rows(
    codec: &mut RowCodec,
    lines: impl IntoIterator<Item = String>,
    normalize: bool,
) -> Result<Vec<Row>> {
    let mut source = lines.into_iter();
    let mut rows = vec![];
    while let Some(row) = codec.next(&mut source)? {
        rows.push(match normalize {
            true => row.normalized(),
            false => row,
        });
    }
    Ok(rows)
}

/// load every row onto this host
pub fn load_full(
    codec: &mut RowCodec,
    lines: impl IntoIterator<Item = String>,
    normalize: bool,
) -> Result<FullyLoaded> {
    let rows = load_rows(codec, lines, normalize)?;
    log::info!("loaded {} rows", rows.len());
    FullyLoaded::new(rows)
}

/// load only the rows the assignment table maps to this rank. every rank
/// parses the full input so the stateful sparse codec stays consistent, but
/// only its own shard is retained.
pub fn load_shard(
    codec: &mut RowCodec,
    lines: impl IntoIterator<Item = String>,
    assignment: &[Rank],
    rank: Rank,
    normalize: bool,
) -> Result<Segmented> {
    let mut source = lines.into_iter();
    let mut rows = vec![];
    let mut globals = vec![];
    for (global, owner) in assignment.iter().enumerate() {
        let row = codec.next(&mut source)?.ok_or_else(|| {
            Error::InputMalformed(format!(
                "dataset ended at row {}, assignment table covers {}",
                global,
                assignment.len()
            ))
        })?;
        if *owner == rank {
            rows.push(match normalize {
                true => row.normalized(),
                false => row,
            });
            globals.push(global);
        }
    }
    log::info!("rank {} keeps {} of {} rows", rank, rows.len(), assignment.len());
    Segmented::new(rows, globals)
}

/// resolve the input surface: the given file, else the seeded generator
pub fn source_lines(settings: &crate::config::Settings) -> Result<Vec<String>> {
    use super::generate;
    match &settings.input {
        Some(path) => lines_from(path),
        None if settings.number_of_rows > 0 && settings.sparse => Ok(generate::sparse_lines(
            settings.number_of_rows,
            settings.width(),
            settings.sparsity,
            settings.seed(),
        )),
        None if settings.number_of_rows > 0 && settings.columns > 0 => Ok(generate::dense_lines(
            settings.number_of_rows,
            settings.columns,
            settings.seed(),
        )),
        None => Err(Error::InputMalformed(
            "provide --input or --number-of-rows with --columns".to_string(),
        )),
    }
}

/// total global rows behind a line source
pub fn total_rows(settings: &crate::config::Settings, lines: &[String]) -> Result<usize> {
    match settings.sparse {
        false => Ok(lines.len()),
        true if settings.number_of_rows > 0 => Ok(settings.number_of_rows),
        true => Err(Error::InputMalformed(
            "sparse inputs need --number-of-rows".to_string(),
        )),
    }
}

/// column count behind a line source
pub fn total_columns(settings: &crate::config::Settings, lines: &[String]) -> Result<usize> {
    match settings.codec() {
        super::codec::RowCodec::Dense => Ok(lines
            .first()
            .map(|line| line.split(',').count())
            .unwrap_or(0)),
        _ => Ok(settings.width()),
    }
}

/// rank assignment for every global row: balanced round-robin shuffled under
/// the shared seed, so all ranks derive the identical table independently
pub fn assignment(rows: usize, world: usize, seed: u64) -> Vec<Rank> {
    use rand::SeedableRng;
    use rand::seq::SliceRandom;
    let mut table = (0..rows).map(|i| i % world).collect::<Vec<_>>();
    table.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed));
    table
}
