//! Single-machine driver: load or generate the dataset, run the configured
//! selection algorithm, write the JSON result document.

use clap::Parser;
use rowsieve::config::Algorithm;
use rowsieve::config::Distributed;
use rowsieve::config::Settings;
use rowsieve::data::load;
use rowsieve::data::store::Dataset;
use rowsieve::data::users::UserRecord;
use rowsieve::error::Result;
use rowsieve::greedy;
use rowsieve::kernel::relevance::NaiveRelevance;
use rowsieve::kernel::relevance::UserModeRelevance;
use rowsieve::report;
use rowsieve::report::Stopwatch;
use rowsieve::sieve::titrator::SieveStreaming;
use rowsieve::sieve::titrator::ThreeSieve;
use rowsieve::sieve::titrator::Titrator;
use rowsieve::subset::Subset;
use rowsieve::subset::UserSubset;
use rowsieve::wire::receiver::LoadingReceiver;
use rowsieve::wire::streamer::resolve_stream;

fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    rowsieve::init();
    let mut settings = Settings::parse();
    settings.seed = Some(settings.seed());
    if let Err(e) = run(&settings) {
        log::error!("{}", e);
        let _ = report::write(&settings.output, &report::failure(&settings, &e));
        return Err(e).context("selection failed");
    }
    Ok(())
}

fn run(settings: &Settings) -> Result<()> {
    let mut watch = Stopwatch::default();
    let algorithm = settings.algorithm()?;
    let lines = watch.time("loadingDataset", || load::source_lines(settings))?;
    let solution = match algorithm {
        Algorithm::Streaming => stream(settings, lines, &mut watch)?,
        chosen => select(settings, chosen, lines, &mut watch)?,
    };
    report::write(
        &settings.output,
        &report::document(settings, algorithm.name(), &solution, &watch),
    )
}

/// one full greedy pass over the loaded dataset
fn select(
    settings: &Settings,
    algorithm: Algorithm,
    lines: Vec<String>,
    watch: &mut Stopwatch,
) -> Result<Subset> {
    let data = watch.time("loadingDataset", || {
        load::load_full(&mut settings.codec(), lines, settings.normalize)
    })?;
    log::info!(
        "selecting {} of {} rows across {} columns",
        settings.k,
        data.len(),
        data.columns()
    );
    match &settings.user_mode_file {
        None => {
            let calc = NaiveRelevance::from(&data);
            let mut solution = Subset::empty();
            watch.time("totalCalculation", || {
                greedy::select(algorithm, settings.epsilon, &mut solution, &calc, &data, settings.k)
            });
            Ok(solution)
        }
        Some(path) => {
            // one personalized pass per user; the output carries the best
            // scoring user's subset and every per-user result in the log
            let users = UserRecord::load(load::lines_from(path)?)?;
            let mut best = Subset::empty();
            for user in &users {
                let calc = UserModeRelevance::from(&data, user, settings.theta)?;
                let mut solution = Subset::empty();
                watch.time("totalCalculation", || {
                    greedy::select(algorithm, settings.epsilon, &mut solution, &calc, &data, settings.k)
                });
                let result = UserSubset {
                    user: user.uid,
                    test: user.tid,
                    subset: solution,
                };
                log::info!(
                    "user {} scored {}",
                    result.user,
                    serde_json::to_string(&result).expect("serializable")
                );
                if result.subset.score() >= best.score() {
                    best = result.subset;
                }
            }
            Ok(best)
        }
    }
}

/// standalone streaming: the dataset itself is the stream and a dynamic
/// titrator absorbs it in one pass
fn stream(settings: &Settings, lines: Vec<String>, watch: &mut Stopwatch) -> Result<Subset> {
    use rowsieve::wire::receiver::Receiver;
    use rowsieve::wire::receiver::UserFilter;
    let loader = LoadingReceiver::new(settings.codec(), lines, settings.normalize);
    let mut receiver: Box<dyn Receiver> = match &settings.user_mode_file {
        None => Box::new(loader),
        Some(path) => {
            let user = UserRecord::load(load::lines_from(path)?)?
                .into_iter()
                .next()
                .ok_or_else(|| rowsieve::error::Error::InputMalformed(
                    "user mode file holds no records".to_string(),
                ))?;
            log::info!("streaming restricted to user {}", user.uid);
            Box::new(UserFilter::new(loader, &user))
        }
    };
    let mut titrator: Box<dyn Titrator> = match settings.distributed()? {
        Distributed::SieveStreaming => Box::new(SieveStreaming::with_dynamic_buckets(
            settings.k,
            settings.sieve_epsilon,
        )),
        _ => Box::new(ThreeSieve::with_dynamic_buckets(
            settings.k,
            settings.sieve_epsilon,
            settings.three_sieve_t,
        )),
    };
    watch.time("totalCalculation", || {
        resolve_stream(&mut *receiver, &mut *titrator, settings.stop_early)
    })
}
