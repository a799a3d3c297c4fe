//! Implementation for the `watch` subcommand.

use std::{io::Write, thread};

use tracing::{debug, trace};
use x_wininfo::{Connection, Connector, WindowId, WindowInfo};

use crate::{cli::WatchArgs, error::Result};

/// Remembers the last reported focus so only changes are printed.
#[derive(Debug, Default)]
struct FocusTracker {
    /// Identifier and title last reported; `None` before the first poll.
    last: Option<Option<(WindowId, Option<String>)>>,
}

impl FocusTracker {
    /// Line to print for this poll, or `None` if focus is unchanged.
    fn observe(&mut self, window: Option<&WindowInfo>) -> Option<String> {
        let key = window.map(|w| (w.id, w.title.clone()));
        if self.last.as_ref() == Some(&key) {
            return None;
        }
        self.last = Some(key);
        Some(match window {
            Some(w) => format!("{w}\n"),
            None => "no focused window\n".to_string(),
        })
    }
}

/// Poll the focused window, printing a line each time it changes.
pub fn run<C, W>(conn: &Connection<C>, args: &WatchArgs, out: &mut W) -> Result<()>
where
    C: Connector,
    W: Write,
{
    let mut tracker = FocusTracker::default();
    let mut polls = 0u64;
    loop {
        let window = conn.get_focused_window()?;
        polls += 1;
        match tracker.observe(window.as_ref()) {
            Some(line) => {
                debug!(window = window.as_ref().map(|w| w.id), "focus changed");
                out.write_all(line.as_bytes())?;
                out.flush()?;
            }
            None => trace!(polls, "focus unchanged"),
        }
        if args.count.is_some_and(|n| polls >= n) {
            return Ok(());
        }
        thread::sleep(args.interval);
    }
}
