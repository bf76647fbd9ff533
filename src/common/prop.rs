use core::str::from_utf8;

use crate::prelude::*;

use crate::error::{DevTreeError, Result};
use crate::spec::Phandle;

#[cfg(doc)]
use crate::index::DevTreeIndexProp;

/// The shapes a property value can be decoded as.
///
/// Device tree properties are untyped on the wire; the caller chooses the interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Empty,
    U32,
    U64,
    Str,
    Bytes,
}

/// A property value decoded as one [`PropKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropValue<'a> {
    Empty,
    U32(u32),
    U64(u64),
    Str(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> PropValue<'a> {
    #[must_use]
    pub fn kind(&self) -> PropKind {
        match self {
            PropValue::Empty => PropKind::Empty,
            PropValue::U32(_) => PropKind::U32,
            PropValue::U64(_) => PropKind::U64,
            PropValue::Str(_) => PropKind::Str,
            PropValue::Bytes(_) => PropKind::Bytes,
        }
    }
}

/// Typed access to a property value.
///
/// Implemented both by properties streamed straight out of a blob ([`ParsedProp`]) and by
/// properties held in a built tree ([`DevTreeIndexProp`]).
///
/// [`ParsedProp`]: crate::base::ParsedProp
pub trait PropReader<'a> {
    /// Returns the buffer associated with the property's data.
    fn propbuf(&self) -> &'a [u8];

    /// Returns the name of the property.
    fn name(&self) -> Result<&'a str>;

    /// Returns the length of the property value in bytes.
    #[inline]
    #[must_use]
    fn length(&self) -> usize {
        self.propbuf().len()
    }

    /// Read a big-endian [`u32`] from the provided offset in this property's value and convert it
    /// to host order.
    ///
    /// A read reaching past the end of the value fails with [`DevTreeError::TypeMismatch`].
    #[inline]
    fn get_u32(&self, offset: usize) -> Result<u32> {
        self.propbuf()
            .read_be_u32(offset)
            .or(Err(DevTreeError::TypeMismatch))
    }

    /// Read a big-endian [`u64`] from the provided offset in this property's value and convert it
    /// to host order.
    ///
    /// A read reaching past the end of the value fails with [`DevTreeError::TypeMismatch`].
    #[inline]
    fn get_u64(&self, offset: usize) -> Result<u64> {
        self.propbuf()
            .read_be_u64(offset)
            .or(Err(DevTreeError::TypeMismatch))
    }

    /// A Phandle is simply defined as a u32 value, as such this method performs the same action as
    /// [`PropReader::get_u32`]
    #[inline]
    fn get_phandle(&self, offset: usize) -> Result<Phandle> {
        self.get_u32(offset)
    }

    /// Returns the value as a string, up to (not including) its first null byte.
    #[inline]
    fn get_str(&self) -> Result<&'a str> {
        self.get_str_at(0)
    }

    /// Returns the null terminated `str` starting at the given offset within the value.
    ///
    /// A value without a terminator after `offset` fails with [`DevTreeError::TypeMismatch`].
    fn get_str_at(&self, offset: usize) -> Result<&'a str> {
        let raw = self
            .propbuf()
            .read_bstring0(offset)
            .or(Err(DevTreeError::TypeMismatch))?;
        Ok(from_utf8(raw)?)
    }

    /// Returns the number of strings in a string list value.
    fn get_str_count(&self) -> Result<usize> {
        self.str_list().count()
    }

    /// Returns an iterator over the strings of a string list value (`"a\0b\0"`).
    fn str_list(&self) -> StrListIter<'a> {
        StrListIter {
            buf: self.propbuf(),
            offset: 0,
        }
    }

    /// Returns this property's data as a raw slice
    #[inline]
    fn get_raw(&self) -> &'a [u8] {
        self.propbuf()
    }

    /// Whether `needle` occurs inside one of the value's null separated entries.
    ///
    /// This is a loose test: `"uart"` matches a value of `"vendor,uart16550\0"`. A match never
    /// spans the terminator between two entries, so a needle holding a null byte never matches.
    fn contains(&self, needle: &[u8]) -> bool {
        if needle.contains(&0) {
            return false;
        }
        self.propbuf()
            .split(|&b| b == 0)
            .any(|entry| needle.is_empty() || entry.windows(needle.len()).any(|w| w == needle))
    }

    /// Whether one entry of a string list value is exactly `s`.
    fn has_str(&self, s: &str) -> bool {
        let mut iter = self.str_list();
        while let Ok(Some(entry)) = iter.next() {
            if entry == s {
                return true;
            }
        }
        false
    }

    /// Decode the value as the given [`PropKind`].
    ///
    /// Integer decodes need at least as many bytes as the integer is wide; extra bytes are
    /// ignored. [`PropKind::Empty`] only accepts a zero length value.
    fn decode(&self, kind: PropKind) -> Result<PropValue<'a>> {
        match kind {
            PropKind::Empty if self.length() == 0 => Ok(PropValue::Empty),
            PropKind::Empty => Err(DevTreeError::TypeMismatch),
            PropKind::U32 => self.get_u32(0).map(PropValue::U32),
            PropKind::U64 => self.get_u64(0).map(PropValue::U64),
            PropKind::Str => self.get_str().map(PropValue::Str),
            PropKind::Bytes => Ok(PropValue::Bytes(self.propbuf())),
        }
    }
}

/// An iterator over the null terminated strings of a property value.
#[derive(Clone, Debug)]
pub struct StrListIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> FallibleIterator for StrListIter<'a> {
    type Error = DevTreeError;
    type Item = &'a str;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        if self.offset >= self.buf.len() {
            return Ok(None);
        }
        let raw = match self.buf.read_bstring0(self.offset) {
            Ok(raw) => raw,
            Err(_) => {
                self.offset = self.buf.len();
                return Err(DevTreeError::TypeMismatch);
            }
        };
        // Include null byte
        self.offset += raw.len() + 1;
        Ok(Some(from_utf8(raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RawProp(&'static [u8]);

    impl PropReader<'static> for RawProp {
        fn propbuf(&self) -> &'static [u8] {
            self.0
        }

        fn name(&self) -> Result<&'static str> {
            Ok("raw")
        }
    }

    #[test]
    fn integer_reads_check_width() {
        let prop = RawProp(&[0, 0, 0, 0x2a, 0, 0, 0, 0x2b]);
        assert_eq!(prop.get_u32(0), Ok(0x2a));
        assert_eq!(prop.get_u32(4), Ok(0x2b));
        assert_eq!(prop.get_u32(6), Err(DevTreeError::TypeMismatch));
        assert_eq!(prop.get_u64(0), Ok(0x2a_0000_002b));
        assert_eq!(RawProp(&[0, 1]).get_u32(0), Err(DevTreeError::TypeMismatch));
    }

    #[test]
    fn string_lists() {
        let prop = RawProp(b"arm,pl011\0arm,primecell\0");
        assert_eq!(prop.get_str(), Ok("arm,pl011"));
        assert_eq!(prop.get_str_count(), Ok(2));
        assert!(prop.has_str("arm,primecell"));
        assert!(!prop.has_str("arm,prime"));
        assert!(prop.contains(b"prime"));

        let unterminated = RawProp(b"okay");
        assert_eq!(unterminated.get_str(), Err(DevTreeError::TypeMismatch));
        assert_eq!(unterminated.get_str_count(), Err(DevTreeError::TypeMismatch));
    }

    #[test]
    fn substring_matches_stay_within_one_entry() {
        let prop = RawProp(b"vendor,foo\0generic-bar\0");
        assert!(prop.contains(b"foo"));
        assert!(prop.contains(b"generic"));
        assert!(prop.contains(b""));
        assert!(!prop.contains(b"foo\0generic"));
        assert!(!prop.contains(b"foogeneric"));
    }

    #[test]
    fn tagged_decode() {
        let prop = RawProp(&[0, 0, 0, 0, 0, 0, 0x10, 0]);
        assert_eq!(prop.decode(PropKind::U64), Ok(PropValue::U64(0x1000)));
        assert_eq!(prop.decode(PropKind::U32), Ok(PropValue::U32(0)));
        assert_eq!(prop.decode(PropKind::Empty), Err(DevTreeError::TypeMismatch));
        assert_eq!(
            prop.decode(PropKind::Bytes).map(|v| v.kind()),
            Ok(PropKind::Bytes)
        );
        assert_eq!(RawProp(&[]).decode(PropKind::Empty), Ok(PropValue::Empty));
    }
}
