//! A minimal flattened device tree writer used to build test blobs.
#![allow(dead_code)]

use std::collections::BTreeMap;

use fdt_tree::index::ToPropValue;

pub const FDT_HEADER_SIZE: usize = 40;
pub const FDT_VERSION: u32 = 17;
pub const FDT_LAST_COMP_VERSION: u32 = 16;
pub const FDT_MAGIC: u32 = 0xd00d_feed;

pub const FDT_BEGIN_NODE: u32 = 0x1;
pub const FDT_END_NODE: u32 = 0x2;
pub const FDT_PROP: u32 = 0x3;
pub const FDT_NOP: u32 = 0x4;
pub const FDT_END: u32 = 0x9;

pub struct FdtWriter {
    data: Vec<u8>,
    off_mem_rsvmap: u32,
    off_dt_struct: u32,
    strings: Vec<u8>,
    string_offsets: BTreeMap<String, u32>,
    boot_cpuid_phys: u32,
}

impl FdtWriter {
    pub fn new(mem_reservations: &[(u64, u64)]) -> Self {
        let mut fdt = FdtWriter {
            data: vec![0u8; FDT_HEADER_SIZE],
            off_mem_rsvmap: 0,
            off_dt_struct: 0,
            strings: Vec::new(),
            string_offsets: BTreeMap::new(),
            boot_cpuid_phys: 0,
        };

        fdt.align(8);
        fdt.off_mem_rsvmap = fdt.data.len() as u32;
        for &(address, size) in mem_reservations {
            fdt.append_u64(address);
            fdt.append_u64(size);
        }
        fdt.append_u64(0);
        fdt.append_u64(0);

        fdt.align(4);
        fdt.off_dt_struct = fdt.data.len() as u32;
        fdt
    }

    pub fn set_boot_cpuid_phys(&mut self, boot_cpuid_phys: u32) {
        self.boot_cpuid_phys = boot_cpuid_phys;
    }

    fn align(&mut self, alignment: usize) {
        while self.data.len() % alignment != 0 {
            self.data.push(0);
        }
    }

    fn update_u32(&mut self, offset: usize, val: u32) {
        self.data[offset..offset + 4].copy_from_slice(&val.to_be_bytes());
    }

    pub fn append_u32(&mut self, val: u32) {
        self.data.extend_from_slice(&val.to_be_bytes());
    }

    fn append_u64(&mut self, val: u64) {
        self.data.extend_from_slice(&val.to_be_bytes());
    }

    pub fn begin_node(&mut self, name: &str) {
        self.append_u32(FDT_BEGIN_NODE);
        self.data.extend_from_slice(name.as_bytes());
        self.data.push(0);
        self.align(4);
    }

    pub fn end_node(&mut self) {
        self.append_u32(FDT_END_NODE);
    }

    pub fn nop(&mut self) {
        self.append_u32(FDT_NOP);
    }

    fn intern_string(&mut self, s: &str) -> u32 {
        if let Some(off) = self.string_offsets.get(s) {
            return *off;
        }
        let off = self.strings.len() as u32;
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(s.to_string(), off);
        off
    }

    pub fn set_prop<T: ToPropValue>(&mut self, name: &str, val: T) {
        let val = val.to_prop_value().unwrap();
        let nameoff = self.intern_string(name);
        self.prop_raw(nameoff, &val);
    }

    /// Emit a property with an arbitrary name offset.
    pub fn prop_raw(&mut self, nameoff: u32, val: &[u8]) {
        self.append_u32(FDT_PROP);
        self.append_u32(val.len() as u32);
        self.append_u32(nameoff);
        self.data.extend_from_slice(val);
        self.align(4);
    }

    /// Finish the blob with an `END` token.
    pub fn finish(mut self) -> Vec<u8> {
        self.append_u32(FDT_END);
        self.finish_raw()
    }

    /// Finish the blob exactly as written so far.
    pub fn finish_raw(mut self) -> Vec<u8> {
        let size_dt_struct = self.data.len() as u32 - self.off_dt_struct;
        let off_dt_strings = self.data.len() as u32;
        let size_dt_strings = self.strings.len() as u32;
        let totalsize = off_dt_strings + size_dt_strings;

        self.update_u32(0, FDT_MAGIC);
        self.update_u32(4, totalsize);
        self.update_u32(2 * 4, self.off_dt_struct);
        self.update_u32(3 * 4, off_dt_strings);
        self.update_u32(4 * 4, self.off_mem_rsvmap);
        self.update_u32(5 * 4, FDT_VERSION);
        self.update_u32(6 * 4, FDT_LAST_COMP_VERSION);
        self.update_u32(7 * 4, self.boot_cpuid_phys);
        self.update_u32(8 * 4, size_dt_strings);
        self.update_u32(9 * 4, size_dt_struct);

        let strings = std::mem::take(&mut self.strings);
        self.data.extend_from_slice(&strings);
        self.data
    }
}

/// A small riscv-virt like tree used across the integration tests.
///
/// ```text
/// / {
///     compatible = "riscv-virtio";
///     #address-cells = <2>;
///     cpus { cpu@0 { compatible = "riscv"; phandle = <1>; }; };
///     memory@80000000 { reg = <0x0 0x80000000 0x0 0x8000000>; };
///     soc {
///         plic@c000000 { compatible = "sifive,plic-1.0.0", "riscv,plic0"; phandle = <2>; };
///         uart@10000000 { compatible = "ns16550a"; clock-frequency = <3686400>; };
///         virtio_mmio@10001000 { compatible = "virtio,mmio"; };
///         virtio_mmio@10002000 { compatible = "virtio,mmio"; };
///     };
///     chosen { bootargs = "console=ttyS0"; };
/// };
/// ```
pub fn virt_fdt() -> Vec<u8> {
    let mut fdt = FdtWriter::new(&[(0x8000_0000, 0x20_0000)]);
    fdt.begin_node("");
    fdt.set_prop("compatible", "riscv-virtio");
    fdt.set_prop("#address-cells", 2u32);

    fdt.begin_node("cpus");
    fdt.begin_node("cpu@0");
    fdt.set_prop("compatible", "riscv");
    fdt.set_prop("phandle", 1u32);
    fdt.end_node();
    fdt.end_node();

    fdt.begin_node("memory@80000000");
    fdt.set_prop("reg", &[0x0u32, 0x8000_0000, 0x0, 0x0800_0000]);
    fdt.end_node();

    fdt.begin_node("soc");
    fdt.begin_node("plic@c000000");
    fdt.set_prop("compatible", &["sifive,plic-1.0.0", "riscv,plic0"]);
    fdt.set_prop("phandle", 2u32);
    fdt.end_node();
    fdt.begin_node("uart@10000000");
    fdt.set_prop("compatible", "ns16550a");
    fdt.set_prop("clock-frequency", 3_686_400u32);
    fdt.end_node();
    fdt.nop();
    fdt.begin_node("virtio_mmio@10001000");
    fdt.set_prop("compatible", "virtio,mmio");
    fdt.end_node();
    fdt.begin_node("virtio_mmio@10002000");
    fdt.set_prop("compatible", "virtio,mmio");
    fdt.end_node();
    fdt.end_node();

    fdt.begin_node("chosen");
    fdt.set_prop("bootargs", "console=ttyS0");
    fdt.end_node();

    fdt.end_node();
    fdt.finish()
}

/// Build a bare 40 byte header (plus `len - 40` zero bytes) from ten host-order fields.
pub fn raw_header(fields: [u32; 10], len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    for (i, field) in fields.iter().enumerate() {
        buf[i * 4..i * 4 + 4].copy_from_slice(&field.to_be_bytes());
    }
    buf
}
