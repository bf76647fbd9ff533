//! Bump allocated storage for node and property names.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::str::from_utf8;

use crate::error::{DevTreeError, Result};
use crate::prelude::*;

/// A reference to a name stored in a [`StringArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct StrRef(usize);

/// An append-only, byte-bounded buffer of null terminated names.
///
/// Names are deduplicated: interning a name which is already present returns the existing
/// reference without consuming more space.
#[derive(Debug)]
pub(crate) struct StringArena {
    buf: Vec<u8>,
    capacity: usize,
    lookup: BTreeMap<String, StrRef>,
}

impl StringArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            capacity,
            lookup: BTreeMap::new(),
        }
    }

    /// Store `name` (plus its terminator) and return a reference to it.
    ///
    /// Fails with [`DevTreeError::ArenaExhausted`] when the name does not fit; the arena is left
    /// untouched in that case.
    pub fn intern(&mut self, name: &str) -> Result<StrRef> {
        if name.as_bytes().contains(&0) {
            return Err(DevTreeError::InvalidParameter("name contains a null byte"));
        }
        if let Some(existing) = self.lookup.get(name) {
            return Ok(*existing);
        }

        let needed = name.len() + 1;
        if self.buf.len() + needed > self.capacity {
            return Err(DevTreeError::ArenaExhausted);
        }

        let r = StrRef(self.buf.len());
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(0);
        self.lookup.insert(String::from(name), r);
        Ok(r)
    }

    /// Look up a name. Returns `None` for a reference this arena never handed out.
    pub fn resolve(&self, r: StrRef) -> Option<&str> {
        let buf: &[u8] = &self.buf;
        let raw = buf.read_bstring0(r.0).ok()?;
        from_utf8(raw).ok()
    }

    /// Bytes in use, terminators included.
    #[inline]
    pub fn used(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
