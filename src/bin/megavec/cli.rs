use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Paged vector driver: runs N ranks as threads over a directory store.
#[derive(Parser, Debug)]
#[command(name = "megavec", version, about = "MegaVec paged vector driver")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Common {
    /// Root directory of the blob store
    #[arg(long)]
    pub dir: PathBuf,
    /// Vector (bucket) name
    #[arg(long, default_value = "vec")]
    pub key: String,
    /// Global element count (u64 elements)
    #[arg(long, default_value_t = 1 << 20)]
    pub count: u64,
    /// Number of ranks (threads)
    #[arg(long, default_value_t = 4)]
    pub ranks: usize,
    /// Per-rank memory window in bytes (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    pub window: usize,
    /// Page byte budget (overrides MM_PAGE_BYTES)
    #[arg(long)]
    pub page_bytes: Option<usize>,
    /// Print metrics as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Write a deterministic pattern through sequential write transactions
    Fill {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Read the vector back and count mismatches against the fill pattern
    Verify {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Seeded random draws over each rank's local range
    Sample {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Draws per rank
        #[arg(long, default_value_t = 4096)]
        draws: u64,
    },
    /// Sort each rank's local range in place and check the result
    Sort {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}
