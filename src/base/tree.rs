#[cfg(doc)]
use crate::base::parse::ParsedTok;

use core::mem::size_of;
use core::str::from_utf8;

use crate::error::{DevTreeError, Result};

use crate::priv_util::SliceRead;
use crate::spec::{fdt_header, FDT_MAGIC, MAX_NODE_NAME_LEN};

use super::iters::DevTreeReserveEntryIter;
use super::parse::DevTreeParseIter;

const fn is_aligned<T>(offset: usize) -> bool {
    offset % size_of::<T>() == 0
}

fn verify_offset_aligned<T>(offset: usize) -> Result<usize> {
    if is_aligned::<T>(offset) {
        Ok(offset)
    } else {
        Err(DevTreeError::InvalidOffset)
    }
}

macro_rules! get_be32_field {
    ( $f:ident, $s:ident , $buf:expr ) => {
        $buf.read_be_u32(offset_of!($s, $f))
    };
}

/// Returns `(off, off + len)` if that range lies within the first `totalsize` bytes.
fn block_range(off: u32, len: u32, totalsize: usize) -> Result<(usize, usize)> {
    let start = off as usize;
    let end = start
        .checked_add(len as usize)
        .ok_or(DevTreeError::Truncated)?;
    if end > totalsize {
        Err(DevTreeError::Truncated)
    } else {
        Ok((start, end))
    }
}

/// The decoded (host order) header of a flattened device tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdtHeader {
    pub magic: u32,
    pub totalsize: u32,
    pub off_dt_struct: u32,
    pub off_dt_strings: u32,
    pub off_mem_rsvmap: u32,
    pub version: u32,
    pub last_comp_version: u32,
    pub boot_cpuid_phys: u32,
    pub size_dt_strings: u32,
    pub size_dt_struct: u32,
}

impl FdtHeader {
    pub const SIZE: usize = size_of::<fdt_header>();

    /// Read and decode the header at the start of `buf`.
    ///
    /// Fails with [`DevTreeError::Truncated`] if `buf` cannot hold a header and with
    /// [`DevTreeError::InvalidMagic`] if the magic number is wrong. No other field is checked.
    pub fn read(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(DevTreeError::Truncated);
        }
        let magic = get_be32_field!(magic, fdt_header, buf)?;
        if magic != FDT_MAGIC {
            return Err(DevTreeError::InvalidMagic);
        }

        Ok(Self {
            magic,
            totalsize: get_be32_field!(totalsize, fdt_header, buf)?,
            off_dt_struct: get_be32_field!(off_dt_struct, fdt_header, buf)?,
            off_dt_strings: get_be32_field!(off_dt_strings, fdt_header, buf)?,
            off_mem_rsvmap: get_be32_field!(off_mem_rsvmap, fdt_header, buf)?,
            version: get_be32_field!(version, fdt_header, buf)?,
            last_comp_version: get_be32_field!(last_comp_version, fdt_header, buf)?,
            boot_cpuid_phys: get_be32_field!(boot_cpuid_phys, fdt_header, buf)?,
            size_dt_strings: get_be32_field!(size_dt_strings, fdt_header, buf)?,
            size_dt_struct: get_be32_field!(size_dt_struct, fdt_header, buf)?,
        })
    }
}

/// A validated view of a Flattened Device Tree blob.
///
/// Construction checks the header and bounds every block against the declared `totalsize`, so
/// all later reads through this view stay inside the blob. Nothing is copied; the blob must
/// outlive the view.
#[derive(Copy, Clone, Debug)]
pub struct DevTree<'dt> {
    buf: &'dt [u8],
    header: FdtHeader,
    dt_struct: (usize, usize),
    dt_strings: (usize, usize),
}

impl<'dt> PartialEq for DevTree<'dt> {
    fn eq(&self, other: &Self) -> bool {
        self.buf as *const [u8] == other.buf as *const [u8]
    }
}

impl<'dt> DevTree<'dt> {
    pub const MIN_HEADER_SIZE: usize = FdtHeader::SIZE;

    /// Verify the magic header of a Device Tree buffer
    #[inline]
    pub fn verify_magic(buf: &[u8]) -> Result<()> {
        FdtHeader::read(buf).map(|_| ())
    }

    /// Using the provided byte slice this method will:
    ///
    /// 1. Verify that the slice begins with the magic Device Tree header
    /// 2. Return the reported `totalsize` field of the Device Tree header
    ///
    /// When the actual size of the device tree is unknown (a boot loader only handed over an
    /// address), this may be called on the first [`Self::MIN_HEADER_SIZE`] bytes to learn how
    /// much to map before calling [`DevTree::new()`].
    #[inline]
    pub fn read_totalsize(buf: &[u8]) -> Result<usize> {
        Ok(FdtHeader::read(buf)?.totalsize as usize)
    }

    /// Construct the parseable DevTree object from the provided byte slice.
    ///
    /// The slice may be longer than the declared `totalsize`; trailing bytes are ignored.
    pub fn new(buf: &'dt [u8]) -> Result<Self> {
        let header = FdtHeader::read(buf)?;

        let totalsize = header.totalsize as usize;
        if totalsize > buf.len() || totalsize < FdtHeader::SIZE {
            return Err(DevTreeError::Truncated);
        }
        let buf = &buf[..totalsize];

        verify_offset_aligned::<u32>(header.off_mem_rsvmap as usize)?;
        verify_offset_aligned::<u32>(header.off_dt_struct as usize)?;

        let dt_struct = block_range(header.off_dt_struct, header.size_dt_struct, totalsize)?;
        let dt_strings = block_range(header.off_dt_strings, header.size_dt_strings, totalsize)?;
        if header.off_mem_rsvmap as usize > totalsize {
            return Err(DevTreeError::Truncated);
        }
        if (header.off_mem_rsvmap as usize) < FdtHeader::SIZE {
            log::warn!(
                "fdt reservation map offset {:#x} overlaps the header, ignoring it",
                header.off_mem_rsvmap
            );
        }

        Ok(Self {
            buf,
            header,
            dt_struct,
            dt_strings,
        })
    }

    /// Returns the decoded header.
    #[inline]
    pub fn header(&self) -> &FdtHeader {
        &self.header
    }

    /// Returns the totalsize field of the Device Tree. This is the number of bytes of the device
    /// tree structure.
    #[inline]
    #[must_use]
    pub fn totalsize(&self) -> usize {
        self.header.totalsize as usize
    }

    /// Returns the rsvmap offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_mem_rsvmap(&self) -> usize {
        self.header.off_mem_rsvmap as usize
    }

    /// Returns the dt_struct offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_dt_struct(&self) -> usize {
        self.header.off_dt_struct as usize
    }

    /// Returns the dt_strings offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_dt_strings(&self) -> usize {
        self.header.off_dt_strings as usize
    }

    /// Returns the magic field of the Device Tree
    #[inline]
    #[must_use]
    pub fn magic(&self) -> u32 {
        self.header.magic
    }

    /// Returns the version field of the Device Tree
    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Returns the boot_cpuid_phys field of the Device Tree
    #[inline]
    #[must_use]
    pub fn boot_cpuid_phys(&self) -> u32 {
        self.header.boot_cpuid_phys
    }

    /// Returns the last_comp_version field of the Device Tree
    #[inline]
    #[must_use]
    pub fn last_comp_version(&self) -> u32 {
        self.header.last_comp_version
    }

    /// Returns the size_dt_strings field of the Device Tree
    #[inline]
    #[must_use]
    pub fn size_dt_strings(&self) -> u32 {
        self.header.size_dt_strings
    }

    /// Returns the size_dt_struct field of the Device Tree
    #[inline]
    #[must_use]
    pub fn size_dt_struct(&self) -> u32 {
        self.header.size_dt_struct
    }

    /// The whole blob, cut to `totalsize`.
    #[inline]
    pub fn buf(&self) -> &'dt [u8] {
        self.buf
    }

    /// The structure block.
    #[inline]
    pub fn struct_block(&self) -> &'dt [u8] {
        &self.buf[self.dt_struct.0..self.dt_struct.1]
    }

    /// The strings block.
    #[inline]
    pub fn strings_block(&self) -> &'dt [u8] {
        &self.buf[self.dt_strings.0..self.dt_strings.1]
    }

    /// Resolve a property name offset into the strings block.
    ///
    /// The returned name borrows from the blob. Offsets outside the strings block fail with
    /// [`DevTreeError::InvalidOffset`]; a name missing its terminator fails with
    /// [`DevTreeError::Truncated`].
    pub fn string_at(&self, nameoff: usize) -> Result<&'dt str> {
        let strings = self.strings_block();
        if nameoff >= strings.len() {
            return Err(DevTreeError::InvalidOffset);
        }
        let name = strings.read_bstring0(nameoff)?;
        Ok(from_utf8(name)?)
    }

    /// Read the node name stored at `off` within the structure block.
    pub(crate) fn node_name_at(&self, off: usize) -> Result<&'dt str> {
        let name = self
            .struct_block()
            .nread_bstring0(off, MAX_NODE_NAME_LEN)?;
        Ok(from_utf8(name)?)
    }

    /// Whether the reservation map lies past the header. A map offset inside the header is
    /// treated as an empty map.
    #[inline]
    pub fn has_reservation_map(&self) -> bool {
        self.off_mem_rsvmap() >= FdtHeader::SIZE
    }

    /// Returns an iterator over the Dev Tree "5.3 Memory Reservation Blocks".
    ///
    /// At most `max_entries` entries are produced, and none when the map offset points into the
    /// header.
    #[must_use]
    pub fn reserved_entries(&self, max_entries: usize) -> DevTreeReserveEntryIter<'_, 'dt> {
        DevTreeReserveEntryIter::new(self, max_entries)
    }

    /// Returns an iterator over low level parsing tokens, [`ParsedTok`].
    #[must_use]
    pub fn parse_iter(&self) -> DevTreeParseIter<'_, 'dt> {
        DevTreeParseIter::new(self)
    }
}
