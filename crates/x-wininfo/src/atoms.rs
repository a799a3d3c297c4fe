//! Well-known EWMH and ICCCM atom names and the fallback tables built from them.
//!
//! The names are protocol constants and must match the server byte for byte.

/// EWMH list of managed client windows on the root.
pub const NET_CLIENT_LIST: &str = "_NET_CLIENT_LIST";
/// Legacy GNOME (WinHints) client list on the root.
pub const WIN_CLIENT_LIST: &str = "_WIN_CLIENT_LIST";
/// EWMH currently active window on the root.
pub const NET_ACTIVE_WINDOW: &str = "_NET_ACTIVE_WINDOW";
/// ICCCM `instance\0class\0` pair.
pub const WM_CLASS: &str = "WM_CLASS";
/// EWMH UTF-8 window title.
pub const NET_WM_NAME: &str = "_NET_WM_NAME";
/// ICCCM window title.
pub const WM_NAME: &str = "WM_NAME";
/// EWMH owning process id.
pub const NET_WM_PID: &str = "_NET_WM_PID";
/// ICCCM host the client runs on.
pub const WM_CLIENT_MACHINE: &str = "WM_CLIENT_MACHINE";

/// Expected payload type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Array of window ids.
    Window,
    /// Array of unsigned numbers.
    Cardinal,
    /// Latin-1 text.
    String,
    /// UTF-8 text.
    Utf8String,
}

impl PropertyType {
    /// Name of the type atom on the server.
    pub const fn atom_name(self) -> &'static str {
        match self {
            Self::Window => "WINDOW",
            Self::Cardinal => "CARDINAL",
            Self::String => "STRING",
            Self::Utf8String => "UTF8_STRING",
        }
    }
}

/// One tier of a fallback chain: a property name and the type it must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySource {
    /// Property atom name.
    pub name: &'static str,
    /// Required payload type.
    pub kind: PropertyType,
}

impl PropertySource {
    /// Pair a property name with its required type.
    pub const fn new(name: &'static str, kind: PropertyType) -> Self {
        Self { name, kind }
    }
}

/// Sources for the top-level window list, most preferred first.
pub const CLIENT_LIST_SOURCES: &[PropertySource] = &[
    PropertySource::new(NET_CLIENT_LIST, PropertyType::Window),
    PropertySource::new(WIN_CLIENT_LIST, PropertyType::Cardinal),
];

/// Sources for the window title, most preferred first.
pub const TITLE_SOURCES: &[PropertySource] = &[
    PropertySource::new(NET_WM_NAME, PropertyType::Utf8String),
    PropertySource::new(WM_NAME, PropertyType::String),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_list_prefers_ewmh() {
        let names: Vec<_> = CLIENT_LIST_SOURCES.iter().map(|s| s.name).collect();
        assert_eq!(names, ["_NET_CLIENT_LIST", "_WIN_CLIENT_LIST"]);
        assert_eq!(CLIENT_LIST_SOURCES[1].kind.atom_name(), "CARDINAL");
    }

    #[test]
    fn title_prefers_utf8() {
        assert_eq!(TITLE_SOURCES[0].kind.atom_name(), "UTF8_STRING");
        assert_eq!(TITLE_SOURCES[1].name, "WM_NAME");
    }
}
