use super::courier::Courier;
use super::courier::Feed;
use super::frame;
use super::frame::Tag;
use crate::Weight;
use crate::config::Algorithm;
use crate::data::codec::RowCodec;
use crate::data::store::Dataset;
use crate::data::store::Received;
use crate::error::Result;
use crate::kernel::relevance::NaiveRelevance;
use crate::kernel::relevance::Relevance;
use crate::subset::Subset;

/// RandGreedI, worker half: one local greedy pass, then the whole solution
/// leaves as a single bulk message with dense-expanded fixed-width records
pub fn send_local<C, D, R>(
    courier: &C,
    data: &D,
    calc: &R,
    algorithm: Algorithm,
    epsilon: f64,
    k: usize,
) -> Result<Subset>
where
    C: Courier,
    D: Dataset,
    R: Relevance,
{
    let mut local = Subset::empty();
    crate::greedy::select(algorithm, epsilon, &mut local, calc, data, k);
    let records = local
        .rows()
        .iter()
        .map(|i| (data.global_index(*i), data.row(*i).dense_payload()))
        .collect::<Vec<_>>();
    courier.send(
        frame::encode_bulk(local.score() as Weight, &records),
        Tag::Stop,
    )?;
    Ok(local)
}

/// RandGreedI, coordinator half: gather every worker's message, rerun the
/// configured greedy over the union of local solutions, and keep the better
/// of that global solution and the best local one.
pub fn resolve_gather<F: Feed>(
    feeds: Vec<F>,
    codec: &RowCodec,
    columns: usize,
    algorithm: Algorithm,
    epsilon: f64,
    k: usize,
) -> Result<Subset> {
    let mut pairs = vec![];
    let mut best_local = Subset::empty();
    for (rank, mut feed) in feeds.into_iter().enumerate() {
        let message = loop {
            match feed.poll()? {
                Some((message, _)) => break message,
                None => std::thread::yield_now(),
            }
        };
        let (score, records) = frame::decode_bulk(&message, columns)?;
        log::info!("rank {} gathered a local solution of score {}", rank, score);
        if score as f64 >= best_local.score() {
            best_local = Subset::of(records.iter().map(|(g, _)| *g).collect(), score as f64);
        }
        pairs.extend(
            records
                .into_iter()
                .map(|(global, payload)| (global, codec.decode_dense_wire(&payload))),
        );
    }
    let union = Received::new(pairs)?;
    let calc = NaiveRelevance::from(&union);
    let mut global = Subset::empty();
    crate::greedy::select(algorithm, epsilon, &mut global, &calc, &union, k);
    let global = union.translate(global);
    log::info!(
        "global solution scored {}, best local scored {}",
        global.score(),
        best_local.score()
    );
    match global.score() > best_local.score() {
        true => Ok(global),
        false => Ok(best_local),
    }
}
