use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Hook run once when a buffer is released.
type ReleaseHook = Box<dyn FnOnce()>;

/// Payload of a single property fetch.
///
/// A buffer is released exactly once, when it is dropped. The decoding helpers
/// in [`crate::property`] consume it, so a payload never outlives the read that
/// produced it. [`PropertyBuffer::empty`] is the invalid handle; releasing it
/// does nothing.
pub struct PropertyBuffer {
    /// Raw bytes as delivered by the transport.
    bytes: Vec<u8>,
    /// Transport-specific release, if any.
    release: Option<ReleaseHook>,
}

impl PropertyBuffer {
    /// Wrap bytes that need no release beyond being freed.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            release: None,
        }
    }

    /// Wrap bytes and run `release` when the buffer is dropped.
    pub fn with_release<F>(bytes: Vec<u8>, release: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            bytes,
            release: Some(Box::new(release)),
        }
    }

    /// The invalid handle: no bytes, no release.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Borrow the payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the payload holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for PropertyBuffer {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Debug for PropertyBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PropertyBuffer")
            .field("len", &self.bytes.len())
            .field("release", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn release_runs_once_on_drop() {
        let released = Rc::new(Cell::new(0));
        let hook = released.clone();
        let buf = PropertyBuffer::with_release(vec![1, 2, 3], move || hook.set(hook.get() + 1));
        assert_eq!(buf.len(), 3);
        assert_eq!(released.get(), 0);
        drop(buf);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn empty_handle_is_noop() {
        let buf = PropertyBuffer::empty();
        assert!(buf.is_empty());
        assert_eq!(buf.as_bytes(), &[] as &[u8]);
        drop(buf);
    }
}
