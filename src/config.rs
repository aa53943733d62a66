use crate::data::codec::RowCodec;
use crate::error::Error;
use crate::error::Result;
use std::path::PathBuf;

/// seed selection algorithms, numbered the way the tooling has always
/// numbered them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Naive,
    Lazy,
    Fast,
    LazyFast,
    Streaming,
}

impl Algorithm {
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(Self::Naive),
            1 => Ok(Self::Lazy),
            2 => Ok(Self::Fast),
            3 => Ok(Self::LazyFast),
            4 => Ok(Self::Streaming),
            _ => Err(Error::InputMalformed(format!("unknown algorithm {}", id))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Naive => "naive greedy",
            Self::Lazy => "lazy greedy",
            Self::Fast => "fast greedy",
            Self::LazyFast => "lazy fast greedy",
            Self::Streaming => "streaming",
        }
    }
}

/// how the cluster combines worker solutions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distributed {
    RandGreedi,
    SieveStreaming,
    ThreeSieve,
}

impl Distributed {
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(Self::RandGreedi),
            1 => Ok(Self::SieveStreaming),
            2 => Ok(Self::ThreeSieve),
            _ => Err(Error::InputMalformed(format!(
                "unknown distributed algorithm {}",
                id
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RandGreedi => "randgreedi",
            Self::SieveStreaming => "sieve streaming",
            Self::ThreeSieve => "three sieve",
        }
    }
}

#[derive(Debug, Clone, clap::Parser)]
#[command(about = "Approximates the most representative k-subset of the input dataset.")]
pub struct Settings {
    /// path to the input dataset; omit to generate a synthetic one
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// path for the JSON result document
    #[arg(short, long)]
    pub output: PathBuf,

    /// desired size of the representative set
    #[arg(short = 'k', long = "output-set-size")]
    pub k: usize,

    /// fast-greedy termination floor and bucket spacing
    #[arg(short, long, default_value_t = crate::DEFAULT_EPSILON)]
    pub epsilon: f64,

    /// bucket spacing used by the distributed titrators
    #[arg(long, default_value_t = crate::DEFAULT_SIEVE_EPSILON)]
    pub sieve_epsilon: f64,

    /// 0 naive, 1 lazy, 2 fast, 3 lazy fast, 4 streaming
    #[arg(short, long, default_value_t = 2)]
    pub algorithm: u32,

    /// 0 randgreedi, 1 sieve streaming, 2 three sieve
    #[arg(short, long, default_value_t = 2)]
    pub distributed_algorithm: u32,

    /// fraction of k each worker selects locally
    #[arg(long, default_value_t = crate::DEFAULT_ALPHA)]
    pub alpha: f64,

    /// consecutive rejects before three-sieve advances its bucket
    #[arg(long, default_value_t = crate::DEFAULT_THREE_SIEVE_T)]
    pub three_sieve_t: u32,

    /// user-mode trade-off between relevance and diversity, in (0, 1)
    #[arg(long, default_value_t = crate::DEFAULT_THETA)]
    pub theta: f64,

    /// per-user personalization records
    #[arg(long)]
    pub user_mode_file: Option<PathBuf>,

    /// terminate senders as soon as the coordinator closes
    #[arg(long, default_value_t = false)]
    pub stop_early: bool,

    /// workers skip local greedy and stream raw rows
    #[arg(long, default_value_t = false)]
    pub send_all_to_receiver: bool,

    /// treat the input as an adjacency list with this fixed fan-out
    #[arg(long, default_value_t = 0)]
    pub adjacency_list_column_count: usize,

    /// interpret the input as sparse coordinate triples
    #[arg(long, default_value_t = false)]
    pub sparse: bool,

    /// scale every loaded row to unit norm
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// worker count for the distributed driver
    #[arg(short, long, default_value_t = 2)]
    pub world_size: usize,

    /// total rows: mandatory for sharded loads and generation
    #[arg(short, long, default_value_t = 0)]
    pub number_of_rows: usize,

    /// columns for sparse width and generation
    #[arg(short, long, default_value_t = 0)]
    pub columns: usize,

    /// edge-dropping probability for sparse generation
    #[arg(long, default_value_t = 0.9)]
    pub sparsity: f32,

    /// generation and sharding seed; defaults to wall-clock
    #[arg(short, long)]
    pub seed: Option<u64>,
}

impl Settings {
    pub fn algorithm(&self) -> Result<Algorithm> {
        Algorithm::from_id(self.algorithm)
    }

    pub fn distributed(&self) -> Result<Distributed> {
        Distributed::from_id(self.distributed_algorithm)
    }

    /// the codec implied by the input flags
    pub fn codec(&self) -> RowCodec {
        if self.adjacency_list_column_count > 0 {
            RowCodec::adjacency(self.adjacency_list_column_count, self.width())
        } else if self.sparse {
            RowCodec::sparse(self.width())
        } else {
            RowCodec::dense()
        }
    }

    /// sparse row width: explicit columns, else square on the row count
    pub fn width(&self) -> usize {
        match self.columns {
            0 => self.number_of_rows,
            explicit => explicit,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time moves slow")
                .as_secs()
        })
    }

    /// snapshot of the input surface for the output document
    pub fn input_settings(&self) -> serde_json::Value {
        serde_json::json!({
            "inputFile": self.input.as_ref().map(|p| p.display().to_string()),
            "generatedRows": self.number_of_rows,
            "generatedCols": self.columns,
            "sparsity": self.sparsity,
            "seed": self.seed,
            "normalize": self.normalize,
        })
    }
}
