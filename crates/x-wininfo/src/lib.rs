//! x-wininfo: read-only X11 window catalog and focus queries.
//!
//! Enumerates top-level client windows through the EWMH/ICCCM properties on
//! the root window and decodes per-window metadata (class, title, pid,
//! client host, geometry) into [`WindowInfo`] snapshots. The focused window
//! is resolved from `_NET_ACTIVE_WINDOW`.
//!
//! Every query is a synchronous round trip on a [`Connection`]; nothing is
//! ever written to the server. A connection is owned by one caller at a time.
//!
//! The server is reached through the [`Transport`] and [`Connector`] traits.
//! [`x11::X11Connector`] is the production implementation; [`stub`] provides
//! an in-memory one for tests.

pub mod atoms;
mod buffer;
mod class;
mod connection;
mod error;
pub mod property;
pub mod stub;
mod transport;
mod window;
pub mod x11;

pub use buffer::PropertyBuffer;
pub use class::WindowClass;
pub use connection::Connection;
pub use error::{Error, Result};
pub use transport::{Connector, RawProperty, Transport};
pub use window::{Geometry, WindowInfo};

/// X11 window id (XID).
pub type WindowId = u32;

/// Server-interned atom id.
pub type Atom = u32;
