//! Iterative readers of a [`DevTree`].
use core::mem::size_of;

use crate::base::DevTree;
use crate::error::{DevTreeError, Result};
use crate::priv_util::SliceRead;
use crate::spec::fdt_reserve_entry;

use fallible_iterator::FallibleIterator;

/// A physical memory range the boot environment declares off-limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedRegion {
    pub address: u64,
    pub size: u64,
}

/// An iterator over the entries of the memory reservation block.
///
/// Iteration stops at the first entry with a `size` of zero, or after `max_entries` entries,
/// whichever comes first. An entry which would extend past the blob fails with
/// [`DevTreeError::Truncated`].
#[derive(Clone)]
pub struct DevTreeReserveEntryIter<'a, 'dt: 'a> {
    offset: usize,
    remaining: usize,
    fdt: &'a DevTree<'dt>,
}

impl<'a, 'dt: 'a> DevTreeReserveEntryIter<'a, 'dt> {
    pub(crate) fn new(fdt: &'a DevTree<'dt>, max_entries: usize) -> Self {
        Self {
            offset: fdt.off_mem_rsvmap(),
            remaining: if fdt.has_reservation_map() {
                max_entries
            } else {
                0
            },
            fdt,
        }
    }

    fn read(&self) -> Result<ReservedRegion> {
        let buf = self.fdt.buf();
        Ok(ReservedRegion {
            address: buf.read_be_u64(self.offset + offset_of!(fdt_reserve_entry, address))?,
            size: buf.read_be_u64(self.offset + offset_of!(fdt_reserve_entry, size))?,
        })
    }
}

impl<'a, 'dt: 'a> FallibleIterator for DevTreeReserveEntryIter<'a, 'dt> {
    type Error = DevTreeError;
    type Item = ReservedRegion;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        if self.remaining == 0 {
            return Ok(None);
        }

        let entry = match self.read() {
            Ok(entry) => entry,
            Err(e) => {
                self.remaining = 0;
                return Err(e);
            }
        };
        if entry.size == 0 {
            self.remaining = 0;
            return Ok(None);
        }

        self.offset += size_of::<fdt_reserve_entry>();
        self.remaining -= 1;
        Ok(Some(entry))
    }
}
