#![warn(missing_docs)]

//! Entry point for the `wininfo` binary.

mod cli;
mod error;
mod focus;
mod list;
mod output;
mod watch;

use std::{io, process};

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, registry};
use x_wininfo::Connection;

use crate::{
    cli::{Cli, Commands},
    error::Result,
};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli {
        log,
        display,
        command,
    } = Cli::parse();
    let env_filter = logging::env_filter_from_spec(&log.spec());
    registry()
        .with(env_filter)
        .with(fmt::layer().without_time().with_writer(io::stderr))
        .try_init()
        .ok();

    let mut conn = Connection::new();
    conn.open(display.as_deref())?;
    let mut stdout = io::stdout().lock();
    let result = match command {
        Commands::List(args) => list::run(&conn, &args, &mut stdout),
        Commands::Focus(args) => focus::run(&conn, &args, &mut stdout),
        Commands::Watch(args) => watch::run(&conn, &args, &mut stdout),
    };
    conn.close();
    result
}
