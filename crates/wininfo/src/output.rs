//! Rendering of window records in the selected output format.

use ron::ser::PrettyConfig;
use serde::Serialize;
use x_wininfo::WindowInfo;

use crate::{cli::OutputFormat, error::Result};

/// Encode `value` as pretty JSON or RON.
fn structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Ron => ron::ser::to_string_pretty(value, PrettyConfig::default())?,
        OutputFormat::Json | OutputFormat::Text => serde_json::to_string_pretty(value)?,
    })
}

/// Render a window list; text output is one summary line per window.
pub fn windows(list: &[WindowInfo], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(list.iter().map(|w| format!("{w}\n")).collect()),
        _ => Ok(format!("{}\n", structured(list, format)?)),
    }
}

/// Render the focused window, or its absence.
pub fn focused(window: Option<&WindowInfo>, format: OutputFormat) -> Result<String> {
    match (format, window) {
        (OutputFormat::Text, Some(w)) => Ok(format!("{w}\n")),
        (OutputFormat::Text, None) => Ok("no focused window\n".to_string()),
        _ => Ok(format!("{}\n", structured(&window, format)?)),
    }
}
