//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "htmlshelf",
    version,
    about = "Keep a shelf of HTML files and track which ones you have finished"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Snapshot database file (overrides HTMLSHELF_DB_PATH).
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Keep the shelf in memory for this run only.
    #[arg(long = "memory", global = true, conflicts_with = "db")]
    pub memory: bool,

    /// Log level (overrides HTMLSHELF_LOG_LEVEL).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Directory for rolling log files (overrides HTMLSHELF_LOG_DIR).
    #[arg(long = "log-dir", value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload HTML files from disk.
    Add {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// List stored files.
    List {
        /// Show the files ordered by name without changing the stored order.
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Print the content of a file, or of the selected file.
    Show { id: Option<String> },
    /// Select a file, or clear the selection with --none.
    Select {
        #[arg(required_unless_present = "none")]
        id: Option<String>,
        #[arg(long, conflicts_with = "id")]
        none: bool,
    },
    /// Remove a file.
    Remove { id: String },
    /// Flip the completed flag of a file.
    Toggle { id: String },
    /// Reorder the stored files by name.
    Sort {
        #[arg(value_enum)]
        order: SortArg,
    },
    /// Remove every file.
    Clear,
    /// Show or change the aside panel flag.
    Aside {
        #[arg(value_enum)]
        action: Option<AsideArg>,
    },
    /// Print completion statistics.
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    Asc,
    Desc,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AsideArg {
    On,
    Off,
    Toggle,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
