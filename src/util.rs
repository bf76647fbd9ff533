//! Endian decoding helpers.
//!
//! Every multi-byte integer in a flattened device tree is stored big-endian regardless of the
//! host's byte order.

/// Convert a big-endian `u32` read verbatim from a device tree into host order.
#[inline]
#[must_use]
pub const fn be32_to_host(value: u32) -> u32 {
    u32::from_be(value)
}

/// Convert a big-endian `u64` read verbatim from a device tree into host order.
#[inline]
#[must_use]
pub const fn be64_to_host(value: u64) -> u64 {
    u64::from_be(value)
}

/// Round `offset` up to the next multiple of `align` (which must be a power of two).
#[inline]
pub(crate) const fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}
