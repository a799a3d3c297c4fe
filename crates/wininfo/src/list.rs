//! Implementation for the `list` subcommand.

use std::io::Write;

use regex::Regex;
use tracing::debug;
use x_wininfo::{Connection, Connector, WindowInfo};

use crate::{
    cli::ListArgs,
    error::{Error, Result},
    output,
};

/// True when `filter` is unset or matches the instance or class name.
fn class_matches(window: &WindowInfo, filter: Option<&Regex>) -> bool {
    let class = &window.class;
    filter.is_none_or(|re| re.is_match(&class.instance) || re.is_match(&class.class))
}

/// Print the window catalog.
pub fn run<C, W>(conn: &Connection<C>, args: &ListArgs, out: &mut W) -> Result<()>
where
    C: Connector,
    W: Write,
{
    let windows = conn.try_get_windows()?.ok_or(Error::WindowListUnavailable)?;
    let total = windows.len();
    let shown: Vec<WindowInfo> = windows
        .into_iter()
        .filter(|w| class_matches(w, args.class.as_ref()))
        .collect();
    debug!(total, shown = shown.len(), "listing windows");
    out.write_all(output::windows(&shown, args.format)?.as_bytes())?;
    Ok(())
}
