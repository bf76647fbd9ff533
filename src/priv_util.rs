use core::mem::size_of;
use core::ptr::read_unaligned;

use crate::util::{be32_to_host, be64_to_host};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum SliceReadError {
    UnexpectedEndOfInput,
}

pub(crate) type SliceReadResult<T> = Result<T, SliceReadError>;

pub(crate) trait SliceRead<'a> {
    fn read_be_u32(&self, pos: usize) -> SliceReadResult<u32>;
    fn read_be_u64(&self, pos: usize) -> SliceReadResult<u64>;
    fn read_bstring0(&self, pos: usize) -> SliceReadResult<&'a [u8]>;
    fn nread_bstring0(&self, pos: usize, len: usize) -> SliceReadResult<&'a [u8]>;
}

macro_rules! be_read {
    ( $buf:ident, $type:ident, $off:expr, $conv:ident ) => {{
        let end = $off
            .checked_add(size_of::<$type>())
            .ok_or(SliceReadError::UnexpectedEndOfInput)?;
        if end > $buf.len() {
            Err(SliceReadError::UnexpectedEndOfInput)
        } else {
            // We explicitly read unaligned; the bounds were checked above.
            #[allow(clippy::cast_ptr_alignment)]
            let raw = unsafe { read_unaligned::<$type>($buf.as_ptr().add($off) as *const $type) };
            Ok($conv(raw))
        }
    }};
}

impl<'a> SliceRead<'a> for &'a [u8] {
    #[inline]
    fn read_be_u32(&self, pos: usize) -> SliceReadResult<u32> {
        be_read!(self, u32, pos, be32_to_host)
    }

    #[inline]
    fn read_be_u64(&self, pos: usize) -> SliceReadResult<u64> {
        be_read!(self, u64, pos, be64_to_host)
    }

    #[inline]
    fn read_bstring0(&self, pos: usize) -> SliceReadResult<&'a [u8]> {
        self.nread_bstring0(pos, self.len())
    }

    fn nread_bstring0(&self, pos: usize, len: usize) -> SliceReadResult<&'a [u8]> {
        let buf: &'a [u8] = *self;
        let end = core::cmp::min(pos.saturating_add(len), buf.len());
        let window = buf.get(pos..end).ok_or(SliceReadError::UnexpectedEndOfInput)?;
        match window.iter().position(|&b| b == 0) {
            Some(nul) => Ok(&window[..nul]),
            None => Err(SliceReadError::UnexpectedEndOfInput),
        }
    }
}
