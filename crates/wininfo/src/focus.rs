//! Implementation for the `focus` subcommand.

use std::io::Write;

use x_wininfo::{Connection, Connector};

use crate::{cli::FocusArgs, error::Result, output};

/// Print the focused window.
pub fn run<C, W>(conn: &Connection<C>, args: &FocusArgs, out: &mut W) -> Result<()>
where
    C: Connector,
    W: Write,
{
    let window = conn.get_focused_window()?;
    out.write_all(output::focused(window.as_ref(), args.format)?.as_bytes())?;
    Ok(())
}
