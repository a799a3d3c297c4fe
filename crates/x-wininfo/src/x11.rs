//! Production transport over an X11 connection via `x11rb`.

use std::{cell::RefCell, collections::HashMap, fmt::Display};

use tracing::{debug, trace};
use x11rb::{
    atom_manager, connection::Connection as _, protocol::xproto::ConnectionExt as _,
    rust_connection::RustConnection,
};

use crate::{
    Atom, Connector, Error, Geometry, PropertyBuffer, RawProperty, Result, Transport, WindowId,
    atoms::{
        NET_ACTIVE_WINDOW, NET_CLIENT_LIST, NET_WM_NAME, NET_WM_PID, PropertyType,
        WIN_CLIENT_LIST, WM_CLASS, WM_CLIENT_MACHINE, WM_NAME,
    },
};

atom_manager! {
    /// Atoms every catalog query touches, interned in one batch on connect.
    KnownAtoms: KnownAtomsCookie {
        _NET_CLIENT_LIST,
        _WIN_CLIENT_LIST,
        _NET_ACTIVE_WINDOW,
        WM_CLASS,
        _NET_WM_NAME,
        WM_NAME,
        _NET_WM_PID,
        WM_CLIENT_MACHINE,
        WINDOW,
        CARDINAL,
        STRING,
        UTF8_STRING,
    }
}

impl KnownAtoms {
    /// Initial contents of the per-connection atom cache.
    fn cache(&self) -> HashMap<String, Atom> {
        [
            (NET_CLIENT_LIST, self._NET_CLIENT_LIST),
            (WIN_CLIENT_LIST, self._WIN_CLIENT_LIST),
            (NET_ACTIVE_WINDOW, self._NET_ACTIVE_WINDOW),
            (WM_CLASS, self.WM_CLASS),
            (NET_WM_NAME, self._NET_WM_NAME),
            (WM_NAME, self.WM_NAME),
            (NET_WM_PID, self._NET_WM_PID),
            (WM_CLIENT_MACHINE, self.WM_CLIENT_MACHINE),
            (PropertyType::Window.atom_name(), self.WINDOW),
            (PropertyType::Cardinal.atom_name(), self.CARDINAL),
            (PropertyType::String.atom_name(), self.STRING),
            (PropertyType::Utf8String.atom_name(), self.UTF8_STRING),
        ]
        .into_iter()
        .map(|(name, atom)| (name.to_string(), atom))
        .collect()
    }
}

/// Connects to X servers with `x11rb`'s pure-Rust connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct X11Connector;

impl Connector for X11Connector {
    type Transport = X11Transport;

    fn connect(&self, display_name: Option<&str>) -> Result<X11Transport> {
        let display = display_name.unwrap_or("$DISPLAY");
        let refused = |message: String| Error::Connection {
            display: display.to_string(),
            message,
        };
        let (conn, screen) = x11rb::connect(display_name).map_err(|e| refused(e.to_string()))?;
        let root = conn
            .setup()
            .roots
            .get(screen)
            .map(|s| s.root)
            .ok_or_else(|| refused(format!("screen {screen} missing from setup")))?;
        let known = KnownAtoms::new(&conn)
            .map_err(|e| refused(e.to_string()))?
            .reply()
            .map_err(|e| refused(e.to_string()))?;
        debug!(screen, root, "connected to X server");
        Ok(X11Transport {
            conn,
            root,
            atoms: RefCell::new(known.cache()),
        })
    }
}

/// A live X11 connection. Dropping it closes the connection.
pub struct X11Transport {
    /// Underlying connection.
    conn: RustConnection,
    /// Root of the default screen.
    root: WindowId,
    /// Atoms interned on this connection, seeded with [`KnownAtoms`].
    atoms: RefCell<HashMap<String, Atom>>,
}

/// Map a transport failure for `request` into [`Error::Protocol`].
fn protocol<E: Display>(request: &'static str) -> impl Fn(E) -> Error {
    move |e| Error::Protocol {
        request,
        message: e.to_string(),
    }
}

impl Transport for X11Transport {
    fn default_root(&self) -> WindowId {
        self.root
    }

    fn intern_atom(&self, name: &str) -> Result<Atom> {
        let cached = self.atoms.borrow().get(name).copied();
        if let Some(atom) = cached {
            return Ok(atom);
        }
        let atom = self
            .conn
            .intern_atom(false, name.as_bytes())
            .map_err(protocol("InternAtom"))?
            .reply()
            .map_err(protocol("InternAtom"))?
            .atom;
        trace!(name, atom, "interned atom");
        self.atoms.borrow_mut().insert(name.to_string(), atom);
        Ok(atom)
    }

    fn fetch_property(
        &self,
        window: WindowId,
        property: Atom,
        offset: u32,
        length: u32,
        expected_type: Atom,
    ) -> Result<RawProperty> {
        let reply = self
            .conn
            .get_property(false, window, property, expected_type, offset, length)
            .map_err(protocol("GetProperty"))?
            .reply()
            .map_err(protocol("GetProperty"))?;
        Ok(RawProperty {
            actual_type: reply.type_,
            format: reply.format,
            item_count: reply.value_len,
            bytes_after: reply.bytes_after,
            buffer: PropertyBuffer::new(reply.value),
        })
    }

    fn fetch_geometry(&self, window: WindowId) -> Result<Geometry> {
        let reply = self
            .conn
            .get_geometry(window)
            .map_err(protocol("GetGeometry"))?
            .reply()
            .map_err(protocol("GetGeometry"))?;
        Ok(Geometry {
            root: reply.root,
            x: i32::from(reply.x),
            y: i32::from(reply.y),
            width: u32::from(reply.width),
            height: u32::from(reply.height),
            border_width: u32::from(reply.border_width),
            depth: reply.depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{CLIENT_LIST_SOURCES, TITLE_SOURCES};

    #[test]
    fn cache_seeds_every_catalog_atom() {
        let known = KnownAtoms {
            _NET_CLIENT_LIST: 301,
            _WIN_CLIENT_LIST: 302,
            _NET_ACTIVE_WINDOW: 303,
            WM_CLASS: 67,
            _NET_WM_NAME: 304,
            WM_NAME: 39,
            _NET_WM_PID: 305,
            WM_CLIENT_MACHINE: 36,
            WINDOW: 33,
            CARDINAL: 6,
            STRING: 31,
            UTF8_STRING: 306,
        };
        let cache = known.cache();
        assert_eq!(cache.len(), 12);

        let mut names: Vec<&str> = CLIENT_LIST_SOURCES
            .iter()
            .chain(TITLE_SOURCES)
            .flat_map(|s| [s.name, s.kind.atom_name()])
            .collect();
        names.extend([NET_ACTIVE_WINDOW, WM_CLASS, NET_WM_PID, WM_CLIENT_MACHINE]);
        for name in names {
            assert!(cache.contains_key(name), "{name} not preinterned");
        }
        assert_eq!(cache.get("_WIN_CLIENT_LIST"), Some(&302));
        assert_eq!(cache.get("UTF8_STRING"), Some(&306));
        assert_eq!(cache.get("WM_CLASS"), Some(&67));
    }
}
