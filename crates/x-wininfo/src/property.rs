//! Property resolution and payload decoding.
//!
//! [`resolve_property`] is the single entry point to the server's property
//! mechanism: it interns the name, fetches a bounded range and checks the
//! returned type. Missing properties, failed requests and type mismatches all
//! collapse into `None`. The typed helpers consume the resolved buffer, so the
//! payload is released as soon as the value has been copied out.

use tracing::{debug, trace};

use crate::{
    Atom, PropertyBuffer, Transport, WindowId,
    atoms::{PropertySource, PropertyType},
};

/// Bytes requested per fetch.
///
/// Properties longer than this are truncated, not paged. This bounds every
/// round trip; a window list or title past 4 KiB is cut short.
pub const FETCH_WINDOW_BYTES: u32 = 4096;

/// Fetch length in 32-bit units, as the protocol counts it.
const FETCH_LENGTH: u32 = FETCH_WINDOW_BYTES / 4;

/// A present property of the expected type: payload plus element count.
#[derive(Debug)]
pub struct Resolved {
    /// Fetched payload; released when this value is dropped.
    buffer: PropertyBuffer,
    /// Number of elements in `buffer` (not bytes).
    item_count: usize,
    /// Wire element width in bits, as reported by the server.
    format: u8,
}

impl Resolved {
    /// Number of elements in the payload.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Borrow the raw payload.
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Wire element width in bits.
    pub fn format(&self) -> u8 {
        self.format
    }

    /// Width of one element in the delivered payload.
    ///
    /// Transports may widen 32-bit wire items to a native word, so the stride
    /// is derived from what was delivered. It must still agree with the wire
    /// format: 8-bit items are one byte, 16-bit items two, 32-bit items four
    /// or eight.
    fn stride(&self) -> Option<usize> {
        if self.item_count == 0 {
            return None;
        }
        let stride = self.buffer.len() / self.item_count;
        if matches!((self.format, stride), (8, 1) | (16, 2) | (32, 4 | 8)) {
            Some(stride)
        } else {
            debug!(
                format = self.format,
                stride,
                "payload width does not match property format"
            );
            None
        }
    }

    /// Element `index` widened to `u64`.
    fn element(&self, stride: usize, index: usize) -> Option<u64> {
        let start = index.checked_mul(stride)?;
        let chunk = self.bytes().get(start..start.checked_add(stride)?)?;
        let value = match stride {
            1 => u64::from(*chunk.first()?),
            2 => u64::from(u16::from_ne_bytes(chunk.try_into().ok()?)),
            4 => u64::from(u32::from_ne_bytes(chunk.try_into().ok()?)),
            8 => u64::from_ne_bytes(chunk.try_into().ok()?),
            _ => return None,
        };
        Some(value)
    }

    /// The first `item_count` bytes without trailing NUL padding.
    fn text_bytes(&self) -> &[u8] {
        let len = self.item_count.min(self.buffer.len());
        let bytes = self.bytes().get(..len).unwrap_or_default();
        let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        bytes.get(..end).unwrap_or_default()
    }

    /// Decode the payload as UTF-8 text; invalid sequences become U+FFFD.
    pub fn into_text(self) -> String {
        String::from_utf8_lossy(self.text_bytes()).into_owned()
    }

    /// Decode the payload as ISO 8859-1 (Latin-1) text, as ICCCM `STRING` is defined.
    pub fn into_latin1(self) -> String {
        self.text_bytes().iter().map(|&b| char::from(b)).collect()
    }

    /// Decode the first element as an unsigned scalar.
    pub fn into_scalar(self) -> Option<u64> {
        let stride = self.stride()?;
        self.element(stride, 0)
    }

    /// Decode every element at the delivered stride.
    pub fn into_words(self) -> Vec<u64> {
        let Some(stride) = self.stride() else {
            return Vec::new();
        };
        (0..self.item_count)
            .filter_map(|i| self.element(stride, i))
            .collect()
    }
}

/// Resolve `name` on `window`, requiring the server to report `expected_type`.
///
/// Returns `None` when the atom cannot be interned, the fetch fails, or the
/// stored type differs from `expected_type`. The fetched buffer is released
/// before returning on every `None` path.
pub fn resolve_property<T>(
    transport: &T,
    window: WindowId,
    expected_type: Atom,
    name: &str,
) -> Option<Resolved>
where
    T: Transport + ?Sized,
{
    let property = match transport.intern_atom(name) {
        Ok(atom) => atom,
        Err(e) => {
            trace!(window, property = name, error = %e, "atom lookup failed");
            return None;
        }
    };
    let raw = match transport.fetch_property(window, property, 0, FETCH_LENGTH, expected_type) {
        Ok(raw) => raw,
        Err(e) => {
            trace!(window, property = name, error = %e, "property fetch failed");
            return None;
        }
    };
    if raw.actual_type != expected_type {
        trace!(
            window,
            property = name,
            expected = expected_type,
            actual = raw.actual_type,
            "property absent or of another type"
        );
        return None;
    }
    if raw.bytes_after > 0 {
        debug!(
            window,
            property = name,
            bytes_after = raw.bytes_after,
            limit = FETCH_WINDOW_BYTES,
            "property truncated at fetch window"
        );
    }
    trace!(window, property = name, items = raw.item_count, "property resolved");
    Some(Resolved {
        buffer: raw.buffer,
        item_count: raw.item_count as usize,
        format: raw.format,
    })
}

/// Resolve a property by type name rather than atom.
fn resolve_typed<T>(
    transport: &T,
    window: WindowId,
    kind: PropertyType,
    name: &str,
) -> Option<Resolved>
where
    T: Transport + ?Sized,
{
    let type_atom = match transport.intern_atom(kind.atom_name()) {
        Ok(atom) => atom,
        Err(e) => {
            trace!(type_name = kind.atom_name(), error = %e, "type atom lookup failed");
            return None;
        }
    };
    resolve_property(transport, window, type_atom, name)
}

/// Read a text property of type `kind`.
///
/// `STRING` is decoded as Latin-1; every other type as UTF-8.
pub fn string_property<T>(
    transport: &T,
    window: WindowId,
    kind: PropertyType,
    name: &str,
) -> Option<String>
where
    T: Transport + ?Sized,
{
    let resolved = resolve_typed(transport, window, kind, name)?;
    Some(match kind {
        PropertyType::String => resolved.into_latin1(),
        _ => resolved.into_text(),
    })
}

/// Read a single `CARDINAL` number; `0` when absent.
pub fn number_property<T>(transport: &T, window: WindowId, name: &str) -> u64
where
    T: Transport + ?Sized,
{
    resolve_typed(transport, window, PropertyType::Cardinal, name)
        .and_then(Resolved::into_scalar)
        .unwrap_or(0)
}

/// Read an array of window ids stored as `kind`.
///
/// Elements that do not fit a window id are skipped.
pub fn window_list_property<T>(
    transport: &T,
    window: WindowId,
    kind: PropertyType,
    name: &str,
) -> Option<Vec<WindowId>>
where
    T: Transport + ?Sized,
{
    let words = resolve_typed(transport, window, kind, name)?.into_words();
    Some(
        words
            .into_iter()
            .filter_map(|w| match WindowId::try_from(w) {
                Ok(id) => Some(id),
                Err(_) => {
                    debug!(property = name, value = w, "skipping out-of-range window id");
                    None
                }
            })
            .collect(),
    )
}

/// Try each source in order; the first one that resolves wins.
pub fn first_of<V, F>(sources: &[PropertySource], mut read: F) -> Option<V>
where
    F: FnMut(&PropertySource) -> Option<V>,
{
    let last = sources.len().saturating_sub(1);
    sources.iter().enumerate().find_map(|(tier, source)| {
        let value = read(source);
        if value.is_some() {
            return value;
        }
        if tier < last {
            debug!(property = source.name, "source absent, trying next");
        } else {
            debug!(property = source.name, "last source absent, no value");
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use std::{fmt::Debug, sync::Arc};

    use parking_lot::Mutex;
    use tracing::{
        Event, Subscriber,
        field::{Field, Visit},
        subscriber::with_default,
    };
    use tracing_subscriber::{
        layer::{Context, Layer},
        prelude::*,
        registry,
    };

    use super::*;
    use crate::{
        atoms::{CLIENT_LIST_SOURCES, TITLE_SOURCES},
        stub::StubTransport,
    };

    const WIN: WindowId = 0x0040_0001;

    /// Collects the message of every event it sees.
    #[derive(Clone, Default)]
    struct Messages(Arc<Mutex<Vec<String>>>);

    /// Pulls the `message` field out of an event.
    #[derive(Default)]
    struct MessageField(String);

    impl Visit for MessageField {
        fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Messages {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut field = MessageField::default();
            event.record(&mut field);
            self.0.lock().push(field.0);
        }
    }

    /// Run `f` and return the log messages it emitted.
    fn captured<F: FnOnce()>(f: F) -> Vec<String> {
        let messages = Messages::default();
        let subscriber = registry().with(messages.clone());
        with_default(subscriber, f);
        messages.0.lock().clone()
    }

    #[test]
    fn present_property_resolves() {
        let stub = StubTransport::new();
        stub.set_text(WIN, "WM_NAME", PropertyType::String, b"xterm");
        assert_eq!(
            string_property(&stub, WIN, PropertyType::String, "WM_NAME").as_deref(),
            Some("xterm")
        );
        assert_eq!(stub.live_buffers(), 0);
        assert_eq!(stub.released_buffers(), 1);
    }

    #[test]
    fn type_mismatch_is_same_as_failure() {
        let stub = StubTransport::new();
        stub.set_text(WIN, "WM_NAME", PropertyType::String, b"xterm");
        stub.set_text(WIN, "WM_CLIENT_MACHINE", PropertyType::String, b"host");
        stub.fail_property("WM_CLIENT_MACHINE");
        let mismatched = string_property(&stub, WIN, PropertyType::Utf8String, "WM_NAME");
        let failed = string_property(&stub, WIN, PropertyType::String, "WM_CLIENT_MACHINE");
        let missing = string_property(&stub, WIN, PropertyType::String, "_NET_WM_NAME");
        assert_eq!(mismatched, None);
        assert_eq!(failed, None);
        assert_eq!(missing, None);
        assert_eq!(stub.live_buffers(), 0);
    }

    #[test]
    fn buffer_released_on_every_path() {
        let stub = StubTransport::new();
        stub.set_text(WIN, "WM_NAME", PropertyType::String, b"xterm");
        let _ = string_property(&stub, WIN, PropertyType::String, "WM_NAME");
        let _ = string_property(&stub, WIN, PropertyType::Utf8String, "WM_NAME");
        let _ = number_property(&stub, WIN, "WM_NAME");
        assert_eq!(stub.live_buffers(), 0);
        assert_eq!(stub.released_buffers(), 3);
    }

    #[test]
    fn resolved_handle_holds_buffer_until_dropped() {
        let stub = StubTransport::new();
        stub.set_cardinals(WIN, "_NET_WM_PID", &[42]);
        let cardinal = stub.atom("CARDINAL");
        let resolved = resolve_property(&stub, WIN, cardinal, "_NET_WM_PID").expect("present");
        assert_eq!(resolved.item_count(), 1);
        assert_eq!(resolved.format(), 32);
        assert_eq!(stub.live_buffers(), 1);
        assert_eq!(resolved.into_scalar(), Some(42));
        assert_eq!(stub.live_buffers(), 0);
    }

    #[test]
    fn number_defaults_to_zero() {
        let stub = StubTransport::new();
        assert_eq!(number_property(&stub, WIN, "_NET_WM_PID"), 0);
    }

    #[test]
    fn native_word_cardinal_round_trips() {
        let stub = StubTransport::new();
        let value: u64 = 0x0123_4567_89ab_cdef;
        stub.set_raw(
            WIN,
            "_NET_WM_PID",
            PropertyType::Cardinal,
            32,
            1,
            value.to_ne_bytes().to_vec(),
        );
        assert_eq!(number_property(&stub, WIN, "_NET_WM_PID"), value);
    }

    #[test]
    fn window_list_decodes_at_delivered_stride() {
        let stub = StubTransport::new();
        let mut wide = Vec::new();
        for id in [0x1u64, 0x2, 0x3] {
            wide.extend_from_slice(&id.to_ne_bytes());
        }
        stub.set_raw(WIN, "_NET_CLIENT_LIST", PropertyType::Window, 32, 3, wide);
        assert_eq!(
            window_list_property(&stub, WIN, PropertyType::Window, "_NET_CLIENT_LIST"),
            Some(vec![0x1, 0x2, 0x3])
        );

        stub.set_window_list(WIN, "_NET_CLIENT_LIST", &[0x10, 0x20]);
        assert_eq!(
            window_list_property(&stub, WIN, PropertyType::Window, "_NET_CLIENT_LIST"),
            Some(vec![0x10, 0x20])
        );
    }

    #[test]
    fn empty_list_is_present_but_empty() {
        let stub = StubTransport::new();
        stub.set_window_list(WIN, "_NET_CLIENT_LIST", &[]);
        assert_eq!(
            window_list_property(&stub, WIN, PropertyType::Window, "_NET_CLIENT_LIST"),
            Some(Vec::new())
        );
    }

    #[test]
    fn long_text_is_truncated_at_fetch_window() {
        let stub = StubTransport::new();
        let long = vec![b'a'; FETCH_WINDOW_BYTES as usize + 500];
        stub.set_text(WIN, "WM_NAME", PropertyType::String, &long);
        let title = string_property(&stub, WIN, PropertyType::String, "WM_NAME").expect("present");
        assert_eq!(title.len(), FETCH_WINDOW_BYTES as usize);
    }

    #[test]
    fn text_drops_trailing_nul() {
        let stub = StubTransport::new();
        stub.set_text(WIN, "WM_CLIENT_MACHINE", PropertyType::String, b"box\0");
        assert_eq!(
            string_property(&stub, WIN, PropertyType::String, "WM_CLIENT_MACHINE").as_deref(),
            Some("box")
        );
    }

    #[test]
    fn out_of_range_window_ids_are_skipped() {
        let stub = StubTransport::new();
        let mut wide = Vec::new();
        for id in [0x1u64, 0x1_0000_0001, 0x3] {
            wide.extend_from_slice(&id.to_ne_bytes());
        }
        stub.set_raw(WIN, "_NET_CLIENT_LIST", PropertyType::Window, 32, 3, wide);
        assert_eq!(
            window_list_property(&stub, WIN, PropertyType::Window, "_NET_CLIENT_LIST"),
            Some(vec![0x1, 0x3])
        );
        assert_eq!(stub.live_buffers(), 0);
    }

    #[test]
    fn window_list_is_truncated_at_fetch_window() {
        let stub = StubTransport::new();
        let ids: Vec<WindowId> = (1..=1500).collect();
        stub.set_window_list(WIN, "_NET_CLIENT_LIST", &ids);
        let got = window_list_property(&stub, WIN, PropertyType::Window, "_NET_CLIENT_LIST")
            .expect("present");
        assert_eq!(got.len(), FETCH_WINDOW_BYTES as usize / 4);
        assert_eq!(got.first(), Some(&1));
        assert_eq!(got.last(), Some(&1024));
        assert_eq!(stub.live_buffers(), 0);
    }

    #[test]
    fn stride_must_agree_with_format() {
        let stub = StubTransport::new();
        // Four bytes per item but declared as 8-bit.
        stub.set_raw(
            WIN,
            "_NET_WM_PID",
            PropertyType::Cardinal,
            8,
            1,
            42u32.to_ne_bytes().to_vec(),
        );
        assert_eq!(number_property(&stub, WIN, "_NET_WM_PID"), 0);

        stub.set_raw(
            WIN,
            "_NET_CLIENT_LIST",
            PropertyType::Window,
            16,
            2,
            vec![0; 8],
        );
        assert_eq!(
            window_list_property(&stub, WIN, PropertyType::Window, "_NET_CLIENT_LIST"),
            Some(Vec::new())
        );
        assert_eq!(stub.live_buffers(), 0);
    }

    #[test]
    fn string_type_decodes_as_latin1() {
        let stub = StubTransport::new();
        stub.set_text(WIN, "WM_NAME", PropertyType::String, b"caf\xe9 cr\xe8me\0");
        assert_eq!(
            string_property(&stub, WIN, PropertyType::String, "WM_NAME").as_deref(),
            Some("café crème")
        );

        stub.set_text(WIN, "_NET_WM_NAME", PropertyType::Utf8String, "café".as_bytes());
        assert_eq!(
            string_property(&stub, WIN, PropertyType::Utf8String, "_NET_WM_NAME").as_deref(),
            Some("café")
        );
    }

    #[test]
    fn first_of_marks_the_last_tier() {
        let messages = captured(|| {
            let hit: Option<()> = first_of(CLIENT_LIST_SOURCES, |_| None);
            assert_eq!(hit, None);
        });
        assert_eq!(
            messages,
            ["source absent, trying next", "last source absent, no value"]
        );

        let messages = captured(|| {
            let hit = first_of(CLIENT_LIST_SOURCES, |s| {
                (s.name == "_WIN_CLIENT_LIST").then_some(())
            });
            assert_eq!(hit, Some(()));
        });
        assert_eq!(messages, ["source absent, trying next"]);
    }

    #[test]
    fn first_of_stops_at_first_hit() {
        let mut seen = Vec::new();
        let hit = first_of(TITLE_SOURCES, |s| {
            seen.push(s.name);
            (s.name == "_NET_WM_NAME").then_some(1)
        });
        assert_eq!(hit, Some(1));
        assert_eq!(seen, ["_NET_WM_NAME"]);
    }
}
