//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use bt_core::{DiaperKind, FeedingSide};

/// Baby activity tracker.
///
/// Logs feedings, diaper changes, and sleep; keeps per-day statistics in
/// sync; and exchanges JSON snapshots with other devices.
#[derive(Debug, Parser)]
#[command(name = "bt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a feeding or a sleep (stops whatever is running first).
    Start {
        #[command(subcommand)]
        activity: StartActivity,
    },

    /// Log a diaper change.
    Diaper {
        /// What the diaper dealt with.
        #[arg(value_enum)]
        kind: DiaperArg,
    },

    /// Stop the running activity.
    Stop,

    /// Reopen the most recent completed feeding or sleep.
    Resume {
        /// Id of the activity to reopen.
        id: String,
    },

    /// Show logged activities.
    Log(LogArgs),

    /// Show daily statistics.
    Stats {
        /// Day to report on (YYYY-MM-DD, default today).
        #[arg(long)]
        day: Option<String>,
    },

    /// Show the running activity and today's totals.
    Status,

    /// Edit a logged activity.
    Edit(EditArgs),

    /// Delete a completed activity (undoable for a few seconds).
    Delete {
        /// Id of the activity to delete.
        id: String,
    },

    /// Restore the most recently deleted activity.
    Undo,

    /// Write a JSON snapshot of all activities.
    Export {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge activities from a JSON snapshot.
    Import {
        /// Snapshot file to read.
        file: PathBuf,
    },
}

/// Timed activities that can be started.
#[derive(Debug, Subcommand)]
pub enum StartActivity {
    /// Start a feeding.
    Feeding {
        /// Breast side or bottle.
        #[arg(long, value_enum)]
        side: Option<SideArg>,
    },
    /// Start a sleep.
    Sleep,
}

/// Arguments for `bt log`.
#[derive(Debug, Args)]
pub struct LogArgs {
    /// Day to list (YYYY-MM-DD, default today).
    #[arg(long, conflicts_with = "all")]
    pub day: Option<String>,

    /// List the whole history grouped by day.
    #[arg(long)]
    pub all: bool,
}

/// Arguments for `bt edit`.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Id of the activity to edit.
    pub id: String,

    /// New start time (local, YYYY-MM-DDTHH:MM).
    #[arg(long)]
    pub start: Option<String>,

    /// New end time (local, YYYY-MM-DDTHH:MM).
    #[arg(long)]
    pub end: Option<String>,

    /// New feeding side.
    #[arg(long, value_enum)]
    pub side: Option<SideArg>,

    /// New diaper kind.
    #[arg(long, value_enum)]
    pub diaper: Option<DiaperArg>,

    /// New notes (an empty string clears them).
    #[arg(long)]
    pub notes: Option<String>,
}

/// Feeding side as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Left,
    Right,
    Bottle,
}

impl From<SideArg> for FeedingSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Self::Left,
            SideArg::Right => Self::Right,
            SideArg::Bottle => Self::Bottle,
        }
    }
}

/// Diaper kind as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiaperArg {
    Pee,
    Poo,
    Both,
}

impl From<DiaperArg> for DiaperKind {
    fn from(kind: DiaperArg) -> Self {
        match kind {
            DiaperArg::Pee => Self::Pee,
            DiaperArg::Poo => Self::Poo,
            DiaperArg::Both => Self::Both,
        }
    }
}
