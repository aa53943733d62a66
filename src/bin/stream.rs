//! Distributed driver: worker threads shard the dataset under a shared
//! seed, each runs its local pass, and the coordinator combines them by
//! RandGreedI gather or by streaming titration.

use clap::Parser;
use rowsieve::config::Algorithm;
use rowsieve::config::Distributed;
use rowsieve::config::Settings;
use rowsieve::data::load;
use rowsieve::error::Error;
use rowsieve::error::Result;
use rowsieve::greedy;
use rowsieve::greedy::sendall::SendAllSelector;
use rowsieve::kernel::relevance::NaiveRelevance;
use rowsieve::report;
use rowsieve::report::Stopwatch;
use rowsieve::sieve::titrator::LazyInit;
use rowsieve::sieve::titrator::SieveStreaming;
use rowsieve::sieve::titrator::ThreeSieve;
use rowsieve::sieve::titrator::Titrator;
use rowsieve::subset::Subset;
use rowsieve::wire::courier::ChannelCourier;
use rowsieve::wire::courier::links;
use rowsieve::wire::gather;
use rowsieve::wire::receiver::RoundRobin;
use rowsieve::wire::sender::StreamingSubset;
use rowsieve::wire::streamer::resolve_stream;

fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    rowsieve::init();
    // the data-parallel pool leaves one core to the frame-receiving thread
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get().saturating_sub(1).max(1))
        .build_global()
        .expect("initialize the data-parallel pool");
    let mut settings = Settings::parse();
    // pin the seed up front so every worker derives the same assignment
    // table and generated inputs, the way ranks share a broadcast seed
    settings.seed = Some(settings.seed());
    if let Err(e) = run(&settings) {
        log::error!("{}", e);
        let _ = report::write(&settings.output, &report::failure(&settings, &e));
        return Err(e).context("distributed run failed");
    }
    Ok(())
}

fn run(settings: &Settings) -> Result<()> {
    if settings.world_size == 0 {
        return Err(Error::InputMalformed("at least one worker is needed".to_string()));
    }
    let mut watch = Stopwatch::default();
    let distributed = settings.distributed()?;
    let algorithm = local_algorithm(settings)?;
    let lines = watch.time("loadingDataset", || load::source_lines(settings))?;
    let rows = load::total_rows(settings, &lines)?;
    let columns = load::total_columns(settings, &lines)?;
    let assignment = load::assignment(rows, settings.world_size, settings.seed());
    let local_k = (settings.k as f64 * settings.alpha).floor() as usize;
    log::info!(
        "{} workers over {} rows, {} via {}",
        settings.world_size,
        rows,
        local_k,
        distributed.name()
    );
    let (couriers, feeds) = links(settings.world_size);
    let solution = watch.time("totalCalculation", || -> Result<Subset> {
        std::thread::scope(|scope| {
            let workers = couriers
                .into_iter()
                .enumerate()
                .map(|(rank, courier)| {
                    let lines = &lines;
                    let assignment = &assignment;
                    scope.spawn(move || {
                        worker(settings, distributed, algorithm, rank, courier, lines, assignment, local_k)
                    })
                })
                .collect::<Vec<_>>();
            let solution = match distributed {
                Distributed::RandGreedi => gather::resolve_gather(
                    feeds,
                    &settings.codec(),
                    columns,
                    algorithm,
                    settings.epsilon,
                    settings.k,
                ),
                streaming => {
                    let mut receiver = RoundRobin::new(feeds, &settings.codec());
                    let mut titrator = titrator_for(settings, streaming);
                    resolve_stream(&mut receiver, &mut *titrator, settings.stop_early)
                }
            };
            let outcomes = workers
                .into_iter()
                .map(|handle| handle.join().expect("worker thread"))
                .collect::<Vec<_>>();
            // a dead coordinator makes workers fail their sends, so its
            // error is the root cause and reports first
            let solution = solution?;
            for outcome in outcomes {
                outcome?;
            }
            Ok(solution)
        })
    })?;
    report::write(
        &settings.output,
        &report::document(settings, distributed.name(), &solution, &watch),
    )
}

/// one worker: load the shard this rank owns and push its local solution
/// into the message layer
#[allow(clippy::too_many_arguments)]
fn worker(
    settings: &Settings,
    distributed: Distributed,
    algorithm: Algorithm,
    rank: usize,
    courier: ChannelCourier,
    lines: &[String],
    assignment: &[usize],
    local_k: usize,
) -> Result<()> {
    let shard = load::load_shard(
        &mut settings.codec(),
        lines.iter().cloned(),
        assignment,
        rank,
        settings.normalize,
    )?;
    let calc = NaiveRelevance::from(&shard);
    match distributed {
        Distributed::RandGreedi => {
            let local =
                gather::send_local(&courier, &shard, &calc, algorithm, settings.epsilon, local_k)?;
            log::info!("rank {} gathered {} rows locally", rank, local.len());
        }
        _ => {
            let mut local = StreamingSubset::new(&shard, courier);
            match settings.send_all_to_receiver {
                true => SendAllSelector::new(settings.seed()).select(&mut local, &calc, &shard),
                false => greedy::select(
                    algorithm,
                    settings.epsilon,
                    &mut local,
                    &calc,
                    &shard,
                    local_k,
                ),
            }
            let local = local.finalize();
            log::info!("rank {} streamed {} rows", rank, local.len());
        }
    }
    Ok(())
}

/// the workers' local pass must be one of the greedy selectors
fn local_algorithm(settings: &Settings) -> Result<Algorithm> {
    match settings.algorithm()? {
        Algorithm::Streaming => Err(Error::InputMalformed(
            "workers need a greedy local algorithm, not streaming".to_string(),
        )),
        greedy => Ok(greedy),
    }
}

fn titrator_for(settings: &Settings, distributed: Distributed) -> Box<dyn Titrator> {
    let k = settings.k;
    let epsilon = settings.sieve_epsilon;
    let transfer_after = settings.three_sieve_t;
    match distributed {
        Distributed::SieveStreaming => Box::new(LazyInit::new(move |delta| {
            Box::new(SieveStreaming::with_known_delta(k, epsilon, delta)) as Box<dyn Titrator>
        })),
        _ => Box::new(LazyInit::new(move |delta| {
            Box::new(ThreeSieve::with_known_delta(k, epsilon, transfer_after, delta))
                as Box<dyn Titrator>
        })),
    }
}
