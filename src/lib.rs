pub mod config;
pub mod data;
pub mod error;
pub mod greedy;
pub mod kernel;
pub mod report;
pub mod sieve;
pub mod subset;
pub mod wire;

/// dimensional analysis types
type Weight = f32;
type Coverage = f64;
type Gain = f64;
type Rank = usize;

// selection parameters
const DEFAULT_EPSILON: f64 = 0.01;
const DEFAULT_SIEVE_EPSILON: f64 = 0.13;
const DEFAULT_ALPHA: f64 = 1.0;
const DEFAULT_THETA: f64 = 0.7;
const DEFAULT_THREE_SIEVE_T: u32 = 5;

// kernel parameters. the identity ridge keeps every diagonal >= 1 so that
// single-row marginals ln(K[i,i]) stay non-negative.
const KERNEL_RIDGE: f64 = 1.0;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// initialize logging: terminal at info, file at debug
pub fn init() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    std::fs::create_dir_all("logs").expect("create logs directory");
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
