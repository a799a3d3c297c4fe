//! In-memory transport for tests.
//!
//! [`StubTransport`] holds per-window properties and geometry, records every
//! request, and counts live payload buffers so tests can check that each one
//! is released. [`StubConnector`] hands out transports that share that state.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{
    Atom, Connector, Error, Geometry, PropertyBuffer, RawProperty, Result, Transport, WindowId,
    atoms::PropertyType,
};

/// A stored property value.
#[derive(Debug, Clone)]
struct StubProperty {
    /// Type atom the property is stored as.
    type_atom: Atom,
    /// Wire format in bits.
    format: u8,
    /// Element count.
    item_count: u32,
    /// Delivered payload; its length divided by `item_count` is the stride.
    bytes: Vec<u8>,
}

/// Shared server state.
#[derive(Debug, Default)]
struct StubState {
    /// Interned atoms by name.
    atoms: HashMap<String, Atom>,
    /// Atom names by id, for call logging.
    names: HashMap<Atom, String>,
    /// Properties keyed by window and property atom.
    properties: HashMap<(WindowId, Atom), StubProperty>,
    /// Geometry per window; windows without an entry behave as destroyed.
    geometry: HashMap<WindowId, Geometry>,
    /// Property names whose fetch fails outright.
    failing: HashSet<String>,
    /// Request log, e.g. "fetch WM_NAME".
    calls: Vec<String>,
}

impl StubState {
    /// Intern `name`, allocating ids from 1 (0 is None).
    fn intern(&mut self, name: &str) -> Atom {
        if let Some(atom) = self.atoms.get(name) {
            return *atom;
        }
        let atom = Atom::try_from(self.atoms.len() + 1).unwrap_or(Atom::MAX);
        self.atoms.insert(name.to_string(), atom);
        self.names.insert(atom, name.to_string());
        atom
    }

    /// Name of `atom`, or its number when unknown.
    fn name(&self, atom: Atom) -> String {
        self.names
            .get(&atom)
            .cloned()
            .unwrap_or_else(|| atom.to_string())
    }
}

/// Counts shared between a stub and the buffers it hands out.
#[derive(Debug, Default)]
struct BufferCounts {
    /// Buffers handed out and not yet released.
    live: AtomicUsize,
    /// Buffers released so far.
    released: AtomicUsize,
}

/// Marks one connected session; dropped when the last transport clone goes.
#[derive(Debug)]
struct Session {
    /// Open session counter on the connector.
    open: Arc<AtomicUsize>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory [`Transport`] with scripted properties and geometry.
#[derive(Debug, Clone, Default)]
pub struct StubTransport {
    /// Server state shared by all clones.
    state: Arc<Mutex<StubState>>,
    /// Buffer accounting shared by all clones.
    buffers: Arc<BufferCounts>,
    /// Present on transports handed out by a [`StubConnector`].
    _session: Option<Arc<Session>>,
}

impl StubTransport {
    /// Root window id reported by every stub.
    pub const ROOT: WindowId = 0x0000_0100;

    /// Create an empty stub: no properties, no windows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atom id for `name`, interning it if needed.
    pub fn atom(&self, name: &str) -> Atom {
        self.state.lock().intern(name)
    }

    /// Store a property verbatim.
    pub fn set_raw(
        &self,
        window: WindowId,
        name: &str,
        kind: PropertyType,
        format: u8,
        item_count: u32,
        bytes: Vec<u8>,
    ) {
        let mut st = self.state.lock();
        let property = st.intern(name);
        let type_atom = st.intern(kind.atom_name());
        st.properties.insert(
            (window, property),
            StubProperty {
                type_atom,
                format,
                item_count,
                bytes,
            },
        );
    }

    /// Store an 8-bit text property of type `kind`.
    pub fn set_text(&self, window: WindowId, name: &str, kind: PropertyType, value: &[u8]) {
        let count = u32::try_from(value.len()).unwrap_or(u32::MAX);
        self.set_raw(window, name, kind, 8, count, value.to_vec());
    }

    /// Store a `CARDINAL` array with 32-bit elements.
    pub fn set_cardinals(&self, window: WindowId, name: &str, values: &[u32]) {
        self.set_words(window, name, PropertyType::Cardinal, values);
    }

    /// Store a `WINDOW` array with 32-bit elements.
    pub fn set_window_list(&self, window: WindowId, name: &str, ids: &[WindowId]) {
        self.set_words(window, name, PropertyType::Window, ids);
    }

    /// Store 32-bit elements of type `kind`.
    fn set_words(&self, window: WindowId, name: &str, kind: PropertyType, values: &[u32]) {
        let bytes = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let count = u32::try_from(values.len()).unwrap_or(u32::MAX);
        self.set_raw(window, name, kind, 32, count, bytes);
    }

    /// Remove a property from `window`.
    pub fn remove(&self, window: WindowId, name: &str) {
        let mut st = self.state.lock();
        let property = st.intern(name);
        st.properties.remove(&(window, property));
    }

    /// Give `window` a geometry, making it a live window.
    pub fn set_geometry(&self, window: WindowId, geometry: Geometry) {
        self.state.lock().geometry.insert(window, geometry);
    }

    /// Make every fetch of `name` fail with a protocol error.
    pub fn fail_property(&self, name: &str) {
        self.state.lock().failing.insert(name.to_string());
    }

    /// Requests issued so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// True if `call` appears in the request log.
    pub fn calls_contains(&self, call: &str) -> bool {
        self.state.lock().calls.iter().any(|c| c == call)
    }

    /// Payload buffers handed out and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.buffers.live.load(Ordering::SeqCst)
    }

    /// Payload buffers released so far.
    pub fn released_buffers(&self) -> usize {
        self.buffers.released.load(Ordering::SeqCst)
    }

    /// Wrap `bytes` in a buffer tracked by this stub's counters.
    fn tracked_buffer(&self, bytes: Vec<u8>) -> PropertyBuffer {
        self.buffers.live.fetch_add(1, Ordering::SeqCst);
        let counts = self.buffers.clone();
        PropertyBuffer::with_release(bytes, move || {
            counts.live.fetch_sub(1, Ordering::SeqCst);
            counts.released.fetch_add(1, Ordering::SeqCst);
        })
    }
}

impl Transport for StubTransport {
    fn default_root(&self) -> WindowId {
        Self::ROOT
    }

    fn intern_atom(&self, name: &str) -> Result<Atom> {
        let mut st = self.state.lock();
        st.calls.push(format!("intern {name}"));
        Ok(st.intern(name))
    }

    fn fetch_property(
        &self,
        window: WindowId,
        property: Atom,
        offset: u32,
        length: u32,
        expected_type: Atom,
    ) -> Result<RawProperty> {
        let stored = {
            let mut st = self.state.lock();
            let name = st.name(property);
            st.calls.push(format!("fetch {name}"));
            if st.failing.contains(&name) {
                return Err(Error::Protocol {
                    request: "GetProperty",
                    message: format!("BadWindow for {name} on 0x{window:x}"),
                });
            }
            st.properties.get(&(window, property)).cloned()
        };
        let Some(prop) = stored else {
            return Ok(RawProperty::absent());
        };
        let wire_width = usize::from(prop.format / 8).max(1);
        let total_items = prop.item_count as usize;
        if prop.type_atom != expected_type {
            return Ok(RawProperty {
                actual_type: prop.type_atom,
                format: prop.format,
                item_count: 0,
                bytes_after: u32::try_from(total_items * wire_width).unwrap_or(u32::MAX),
                buffer: self.tracked_buffer(Vec::new()),
            });
        }
        let stride = prop.bytes.len().checked_div(total_items).unwrap_or(wire_width);
        let window_items = length as usize * 4 / wire_width;
        let first = (offset as usize * 4 / wire_width).min(total_items);
        let taken = (total_items - first).min(window_items);
        let bytes = prop
            .bytes
            .get(first * stride..(first + taken) * stride)
            .unwrap_or_default()
            .to_vec();
        Ok(RawProperty {
            actual_type: prop.type_atom,
            format: prop.format,
            item_count: u32::try_from(taken).unwrap_or(u32::MAX),
            bytes_after: u32::try_from((total_items - first - taken) * wire_width)
                .unwrap_or(u32::MAX),
            buffer: self.tracked_buffer(bytes),
        })
    }

    fn fetch_geometry(&self, window: WindowId) -> Result<Geometry> {
        let mut st = self.state.lock();
        st.calls.push(format!("geometry 0x{window:x}"));
        st.geometry.get(&window).copied().ok_or_else(|| Error::Protocol {
            request: "GetGeometry",
            message: format!("BadDrawable 0x{window:x}"),
        })
    }
}

/// [`Connector`] that hands out clones of one [`StubTransport`].
#[derive(Debug, Clone, Default)]
pub struct StubConnector {
    /// Transport template; connected transports share its state.
    transport: StubTransport,
    /// When set, every connect fails.
    unreachable: Arc<AtomicBool>,
    /// Successful connects so far.
    connects: Arc<AtomicUsize>,
    /// Sessions currently open.
    open: Arc<AtomicUsize>,
}

impl StubConnector {
    /// Connector serving `transport`'s state.
    pub fn new(transport: StubTransport) -> Self {
        Self {
            transport,
            ..Self::default()
        }
    }

    /// The shared transport, for scripting and inspection.
    pub fn transport(&self) -> &StubTransport {
        &self.transport
    }

    /// Make subsequent connects fail (or succeed again).
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of successful connects.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of connected transports not yet dropped.
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl Connector for StubConnector {
    type Transport = StubTransport;

    fn connect(&self, display_name: Option<&str>) -> Result<StubTransport> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Connection {
                display: display_name.unwrap_or("$DISPLAY").to_string(),
                message: "connection refused".to_string(),
            });
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(StubTransport {
            _session: Some(Arc::new(Session {
                open: self.open.clone(),
            })),
            ..self.transport.clone()
        })
    }
}
