//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Family tree reconstruction: rebuild a multi-generation forest from flat person records
#[derive(Parser, Debug)]
#[command(name = "kintree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Family data file (overrides `data_file` from config)
    #[arg(short, long, global = true, env = "KINTREE_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the family forest as a tree
    Tree {
        /// Only the subtree below this person
        #[arg(long)]
        from: Option<String>,
        /// Prefix names with ids
        #[arg(long)]
        ids: bool,
    },

    /// Print the render event sequence
    Events {
        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// List complete records by id
    List {
        /// Only names containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Head counts over complete records
    Stats,

    /// List all marriage tags in use
    Tags,

    /// Marriage tag for a new entry
    NextTag {
        /// Reuse the tag of this partner if they have one
        #[arg(long)]
        spouse: Option<String>,
    },

    /// Id for a new entry
    NextId,

    /// List selectable parents (all records)
    Parents,

    /// Show one person
    Show {
        /// Person id
        id: String,
    },

    /// Report data-quality findings
    Check,

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
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
