use crate::{Atom, Geometry, PropertyBuffer, Result, WindowId};

/// Reply to a single property fetch, as delivered by a [`Transport`].
#[derive(Debug)]
pub struct RawProperty {
    /// Type atom stored on the server; `0` (None) when the property does not exist.
    pub actual_type: Atom,
    /// Element width on the wire in bits (8, 16 or 32); `0` when absent.
    pub format: u8,
    /// Number of elements held in `buffer`.
    pub item_count: u32,
    /// Bytes left on the server past the fetched range.
    pub bytes_after: u32,
    /// Fetched payload.
    pub buffer: PropertyBuffer,
}

impl RawProperty {
    /// Reply for a property that does not exist on the window.
    pub fn absent() -> Self {
        Self {
            actual_type: 0,
            format: 0,
            item_count: 0,
            bytes_after: 0,
            buffer: PropertyBuffer::empty(),
        }
    }
}

/// Requests the catalog needs from a live display connection.
///
/// Implementations perform one blocking round trip per call. They are used
/// by a single caller at a time.
pub trait Transport {
    /// Root window of the default screen.
    fn default_root(&self) -> WindowId;

    /// Look up (interning if needed) the atom for `name`.
    fn intern_atom(&self, name: &str) -> Result<Atom>;

    /// Fetch `length` 32-bit units of `property` on `window`, starting at `offset`.
    ///
    /// A missing property is not an error: it is reported with
    /// `actual_type == 0`. A property of another type than `expected_type` is
    /// reported with its real type and no payload.
    fn fetch_property(
        &self,
        window: WindowId,
        property: Atom,
        offset: u32,
        length: u32,
        expected_type: Atom,
    ) -> Result<RawProperty>;

    /// Fetch the geometry of `window`.
    fn fetch_geometry(&self, window: WindowId) -> Result<Geometry>;
}

/// Opens [`Transport`]s; dropping the transport closes the connection.
pub trait Connector {
    /// Transport produced by a successful connect.
    type Transport: Transport;

    /// Connect to `display_name`, or to `$DISPLAY` when `None`.
    fn connect(&self, display_name: Option<&str>) -> Result<Self::Transport>;
}
