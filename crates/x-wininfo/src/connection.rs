use std::mem;

use tracing::{debug, info};

use crate::{
    Connector, Error, Result, WindowInfo,
    window::{focused_window, list_windows},
    x11::X11Connector,
};

/// Lifecycle of a display connection.
enum State<T> {
    /// No live connection.
    Closed,
    /// Connected; owns the transport.
    Open(T),
}

/// An exclusively owned connection to a display.
///
/// Starts closed. [`Connection::open`] connects, [`Connection::close`] (or
/// dropping the value) releases the connection. Queries on a closed
/// connection fail with [`Error::NotOpen`].
pub struct Connection<C: Connector = X11Connector> {
    /// Produces transports on open.
    connector: C,
    /// Current lifecycle state.
    state: State<C::Transport>,
}

impl Connection<X11Connector> {
    /// A closed connection that will talk to an X server through `x11rb`.
    pub fn new() -> Self {
        Self::with_connector(X11Connector)
    }
}

impl Default for Connection<X11Connector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> Connection<C> {
    /// A closed connection using `connector` to open transports.
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            state: State::Closed,
        }
    }

    /// Connect to `display_name`, or `$DISPLAY` when `None`.
    ///
    /// Fails with [`Error::AlreadyOpen`] if a connection is live; the live
    /// connection is left untouched.
    pub fn open(&mut self, display_name: Option<&str>) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }
        let transport = self.connector.connect(display_name)?;
        info!(display = display_name.unwrap_or("$DISPLAY"), "display opened");
        self.state = State::Open(transport);
        Ok(())
    }

    /// Release the connection. Closing a closed connection does nothing.
    pub fn close(&mut self) {
        if let State::Open(transport) = mem::replace(&mut self.state, State::Closed) {
            drop(transport);
            debug!("display closed");
        }
    }

    /// True while a connection is live.
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// The connector this connection opens transports with.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Borrow the live transport.
    fn transport(&self) -> Result<&C::Transport> {
        match &self.state {
            State::Open(t) => Ok(t),
            State::Closed => Err(Error::NotOpen),
        }
    }

    /// Snapshot every top-level window, in the order the server lists them.
    ///
    /// `Ok(None)` means neither `_NET_CLIENT_LIST` nor `_WIN_CLIENT_LIST`
    /// could be read; this differs from `Ok(Some(vec![]))`, a readable but
    /// empty list. Windows that disappear mid-enumeration are omitted.
    pub fn try_get_windows(&self) -> Result<Option<Vec<WindowInfo>>> {
        Ok(list_windows(self.transport()?))
    }

    /// Snapshot the window that holds input focus, if any.
    pub fn get_focused_window(&self) -> Result<Option<WindowInfo>> {
        Ok(focused_window(self.transport()?))
    }
}
