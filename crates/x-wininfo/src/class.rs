use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

/// Instance and class names decoded from `WM_CLASS`.
///
/// Both fields are always present; a field the window did not set is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct WindowClass {
    /// Resource instance name (first segment).
    pub instance: String,
    /// Resource class name (second segment).
    pub class: String,
}

impl WindowClass {
    /// Decode a NUL-delimited `WM_CLASS` payload.
    ///
    /// Empty segments are skipped; the first two remaining segments become
    /// the instance and class names, and any that are missing default to "".
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw.split('\0').filter(|s| !s.is_empty());
        let instance = segments.next().unwrap_or_default().to_string();
        let class = segments.next().unwrap_or_default().to_string();
        Self { instance, class }
    }

    /// True when neither name is set.
    pub fn is_empty(&self) -> bool {
        self.instance.is_empty() && self.class.is_empty()
    }
}

impl Display for WindowClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}.{}", self.instance, self.class)
        }
    }
}
