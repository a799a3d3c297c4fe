//! Command-line interface definitions for wininfo.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use logging::LogArgs;
use regex::Regex;

/// Command-line interface for the `wininfo` binary.
#[derive(Parser, Debug)]
#[command(
    name = "wininfo",
    about = "List X11 top-level windows and follow the focused one",
    version
)]
pub struct Cli {
    /// Logging controls shared across workspace binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// X display to connect to, e.g. `:0`. Defaults to `$DISPLAY`.
    #[arg(long, global = true, value_name = "NAME")]
    pub display: Option<String>,

    /// Which query to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every top-level client window.
    List(ListArgs),
    /// Print the window that holds input focus.
    Focus(FocusArgs),
    /// Poll the focused window and print a line whenever it changes.
    Watch(WatchArgs),
}

/// Output encodings for window records.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One summary line per window.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// Pretty-printed RON.
    Ron,
}

/// Arguments for the `list` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Output encoding.
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Only show windows whose instance or class name matches this regex.
    #[arg(long, value_name = "REGEX", value_parser = Regex::new)]
    pub class: Option<Regex>,
}

/// Arguments for the `focus` subcommand.
#[derive(Args, Debug, Clone)]
pub struct FocusArgs {
    /// Output encoding.
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Arguments for the `watch` subcommand.
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Time between focus polls.
    #[arg(
        long,
        value_parser = humantime::parse_duration,
        default_value = "1s",
        value_name = "DURATION"
    )]
    pub interval: Duration,

    /// Stop after this many polls. Runs until interrupted when omitted.
    #[arg(long, value_name = "N")]
    pub count: Option<u64>,
}
