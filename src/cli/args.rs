//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::config::Overrides;

/// Enumerate k-ary tree partitions and walk partition hypotheses
#[derive(Parser, Debug)]
#[command(name = "hyptree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(long, global = true, env = "HYPTREE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Tree levels, root included
    #[arg(long, global = true)]
    pub depth: Option<usize>,

    /// Children per inner node
    #[arg(short, long, global = true)]
    pub branch_count: Option<usize>,

    /// Children grouped per split
    #[arg(short = 'k', long, global = true)]
    pub split_num: Option<usize>,

    /// RNG seed for reproducible runs
    #[arg(long, global = true, env = "HYPTREE_SEED")]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            depth: self.depth,
            branch_count: self.branch_count,
            split_num: self.split_num,
            seed: self.seed,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the tree
    Tree,

    /// List every partition of the tree
    Enumerate {
        /// Stop after this many partitions
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Compare the enumerated partition count with the closed form
    Count,

    /// Rank partitions over random node data
    Best {
        /// Number of partitions to show
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Best partition for a grid of tree shapes
    Survey {
        /// Depths to survey
        #[arg(long, value_delimiter = ',', default_values_t = vec![1, 2, 3])]
        depths: Vec<usize>,
        /// Branch counts to survey
        #[arg(long, value_delimiter = ',', default_values_t = vec![1, 2, 3])]
        branch_counts: Vec<usize>,
        /// Split arities to survey
        #[arg(long, value_delimiter = ',', default_values_t = vec![1, 2, 3])]
        split_nums: Vec<usize>,
    },

    /// Random split/prune walk from the empty hypothesis
    Walk {
        /// Number of steps
        #[arg(short, long)]
        steps: Option<usize>,
        /// Chance of pruning when both edits are possible
        #[arg(short, long)]
        prune_probability: Option<f64>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show global config file location
    Path,
    /// Print a config template
    Template,
}
