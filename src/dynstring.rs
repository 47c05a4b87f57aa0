//! Growable text accumulator used to assemble PostScript output.

use std::fmt;

/// An owned, growable byte buffer that can be formatted into with `write!`.
///
/// Output is built up here and handed to a `WriteContext` in chunks, so that the caller sees
/// a small number of large writes rather than many tiny ones.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynString {
    buf: Vec<u8>,
}

impl DynString {
    pub fn new() -> Self {
        DynString { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DynString {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discard the contents, keeping the allocation for reuse.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl fmt::Write for DynString {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}
