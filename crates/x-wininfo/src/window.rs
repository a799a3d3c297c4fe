use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::{
    Transport, WindowClass, WindowId,
    atoms::{
        CLIENT_LIST_SOURCES, NET_ACTIVE_WINDOW, NET_WM_PID, PropertyType, TITLE_SOURCES, WM_CLASS,
        WM_CLIENT_MACHINE,
    },
    property::{first_of, number_property, string_property, window_list_property},
};

/// Window geometry relative to its parent, as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Geometry {
    /// Root window of the screen the window lives on.
    pub root: WindowId,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Inner width, excluding the border.
    pub width: u32,
    /// Inner height, excluding the border.
    pub height: u32,
    /// Border width.
    pub border_width: u32,
    /// Colour depth in bits.
    pub depth: u8,
}

/// Point-in-time snapshot of one top-level window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    /// Window id.
    pub id: WindowId,
    /// `WM_CLASS` instance and class names.
    pub class: WindowClass,
    /// Title, `None` when neither `_NET_WM_NAME` nor `WM_NAME` is set.
    pub title: Option<String>,
    /// Owning process id from `_NET_WM_PID`, `0` when unknown.
    pub pid: u64,
    /// Host the client runs on, `None` when unknown.
    pub client_machine: Option<String>,
    /// Geometry at the time of the query.
    pub geometry: Geometry,
}

impl Display for WindowInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let g = &self.geometry;
        write!(
            f,
            "0x{:08x} {} pid={} {}x{}+{}+{}",
            self.id, self.class, self.pid, g.width, g.height, g.x, g.y
        )?;
        if let Some(host) = &self.client_machine {
            write!(f, " host={host}")?;
        }
        match &self.title {
            Some(title) => write!(f, " {title:?}"),
            None => Ok(()),
        }
    }
}

/// Top-level window ids from the first client list source that resolves.
pub fn client_windows<T>(transport: &T) -> Option<Vec<WindowId>>
where
    T: Transport + ?Sized,
{
    let root = transport.default_root();
    first_of(CLIENT_LIST_SOURCES, |source| {
        window_list_property(transport, root, source.kind, source.name)
    })
}

/// Assemble the record for `id`.
///
/// Returns `None` only when the window's geometry cannot be read, which means
/// the window is gone.
pub fn window_info<T>(transport: &T, id: WindowId) -> Option<WindowInfo>
where
    T: Transport + ?Sized,
{
    let class_raw =
        string_property(transport, id, PropertyType::String, WM_CLASS).unwrap_or_default();
    let class = WindowClass::parse(&class_raw);
    let title = first_of(TITLE_SOURCES, |source| {
        string_property(transport, id, source.kind, source.name)
    });
    let pid = number_property(transport, id, NET_WM_PID);
    let client_machine = string_property(transport, id, PropertyType::String, WM_CLIENT_MACHINE);
    let geometry = match transport.fetch_geometry(id) {
        Ok(g) => g,
        Err(e) => {
            warn!(window = id, error = %e, "window vanished before geometry could be read");
            return None;
        }
    };
    trace!(window = id, class = %class, pid, "window assembled");
    Some(WindowInfo {
        id,
        class,
        title,
        pid,
        client_machine,
        geometry,
    })
}

/// Records for every top-level window, in server order.
///
/// `None` means no client list could be read at all.
pub fn list_windows<T>(transport: &T) -> Option<Vec<WindowInfo>>
where
    T: Transport + ?Sized,
{
    let Some(ids) = client_windows(transport) else {
        debug!("no client list property on root");
        return None;
    };
    debug!(count = ids.len(), "enumerating client windows");
    Some(
        ids.into_iter()
            .filter_map(|id| window_info(transport, id))
            .collect(),
    )
}

/// Record for the window named by `_NET_ACTIVE_WINDOW`, if any.
pub fn focused_window<T>(transport: &T) -> Option<WindowInfo>
where
    T: Transport + ?Sized,
{
    let root = transport.default_root();
    let active = window_list_property(transport, root, PropertyType::Window, NET_ACTIVE_WINDOW)?
        .into_iter()
        .next()
        .filter(|id| *id != 0);
    let Some(id) = active else {
        debug!("no active window");
        return None;
    };
    window_info(transport, id)
}
