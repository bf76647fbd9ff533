extern crate fdt_tree;

mod common;

use common::*;

use fdt_tree::base::{DevTree, ParsedTok, ReservedRegion};
use fdt_tree::error::{Capacity, DevTreeError};
use fdt_tree::prelude::*;
use fdt_tree::{DevTreeIndex, TreeLimits};

#[test]
fn header_only_blob_has_only_root() {
    // Structure block of size zero: the walk is empty.
    let blob = raw_header([FDT_MAGIC, 128, 8, 0x40, 0, 0, 0, 0, 0, 0], 128);
    let index = DevTreeIndex::parse_blob(&blob).unwrap();
    assert_eq!(index.node_count(), 1);
    assert_eq!(index.root().name(), "");
    assert_eq!(index.phandle_count(), 0);
    // The map offset of zero points into the header; no header words are read as regions.
    assert!(index.reserved_regions().is_empty());
}

#[test]
fn test_readsize_advice() {
    let blob = virt_fdt();
    let size = DevTree::read_totalsize(&blob).unwrap();
    assert_eq!(size, blob.len());
    let devtree = DevTree::new(&blob).unwrap();
    assert_eq!(devtree.version(), FDT_VERSION);
    assert_eq!(devtree.last_comp_version(), FDT_LAST_COMP_VERSION);
}

#[test]
fn one_node_per_begin_node_token() {
    let blob = virt_fdt();
    let devtree = DevTree::new(&blob).unwrap();

    let mut begin_nodes = 0;
    let mut iter = devtree.parse_iter();
    while let Some(tok) = iter.next().unwrap() {
        if let ParsedTok::BeginNode(_) = tok {
            begin_nodes += 1;
        }
    }
    assert!(iter.reached_end_token());
    assert_eq!(begin_nodes, 10);

    let index = DevTreeIndex::from_devtree(&devtree, TreeLimits::default()).unwrap();
    assert_eq!(index.node_count(), begin_nodes);
    assert_eq!(index.nodes().count(), begin_nodes);
}

#[test]
fn nesting_becomes_parent_links() {
    let blob = virt_fdt();
    let index = DevTreeIndex::parse_blob(&blob).unwrap();

    let cpu = index.find_node("/cpus/cpu@0").unwrap();
    let cpus = index.get_parent(cpu).unwrap();
    assert_eq!(index.node(cpus).unwrap().name(), "cpus");
    assert_eq!(index.get_parent(cpus), Some(index.root_id()));
    assert_eq!(index.get_parent(index.root_id()), None);

    let soc = index.find_node("/soc").unwrap();
    let names: Vec<&str> = index
        .node(soc)
        .unwrap()
        .children()
        .map(|c| c.name())
        .collect();
    assert_eq!(
        names,
        [
            "plic@c000000",
            "uart@10000000",
            "virtio_mmio@10001000",
            "virtio_mmio@10002000"
        ]
    );
}

#[test]
fn phandles_and_reservations_are_indexed() {
    let blob = virt_fdt();
    let index = DevTreeIndex::parse_blob(&blob).unwrap();

    assert_eq!(index.phandle_count(), 2);
    assert_eq!(index.find_by_phandle(2), index.find_node("/soc/plic@c000000"));
    assert_eq!(
        index.reserved_regions(),
        [ReservedRegion {
            address: 0x8000_0000,
            size: 0x20_0000
        }]
    );
    assert_eq!(index.header().unwrap().version, FDT_VERSION);
}

#[test]
fn rejects_bad_magic() {
    let mut blob = virt_fdt();
    blob[0] = 0;
    assert_eq!(
        DevTreeIndex::parse_blob(&blob).unwrap_err(),
        DevTreeError::InvalidMagic
    );
}

#[test]
fn rejects_short_and_truncated_blobs() {
    assert_eq!(
        DevTreeIndex::parse_blob(&[0u8; 16]).unwrap_err(),
        DevTreeError::Truncated
    );

    let blob = virt_fdt();
    assert_eq!(
        DevTreeIndex::parse_blob(&blob[..blob.len() - 4]).unwrap_err(),
        DevTreeError::Truncated
    );
}

#[test]
fn rejects_misaligned_structure_block() {
    let blob = raw_header([FDT_MAGIC, 128, 6, 0x40, 0, 0, 0, 0, 0, 0], 128);
    assert_eq!(
        DevTreeIndex::parse_blob(&blob).unwrap_err(),
        DevTreeError::InvalidOffset
    );
}

#[test]
fn unknown_token_is_malformed() {
    let mut fdt = FdtWriter::new(&[]);
    fdt.begin_node("");
    fdt.append_u32(0x7);
    fdt.end_node();
    let blob = fdt.finish();

    assert_eq!(
        DevTreeIndex::parse_blob(&blob).unwrap_err(),
        DevTreeError::MalformedToken(7)
    );
}

#[test]
fn extra_end_node_is_unbalanced() {
    let mut fdt = FdtWriter::new(&[]);
    fdt.begin_node("");
    fdt.end_node();
    fdt.end_node();
    let blob = fdt.finish();

    assert_eq!(
        DevTreeIndex::parse_blob(&blob).unwrap_err(),
        DevTreeError::UnbalancedStructure
    );
}

#[test]
fn second_root_is_unbalanced() {
    let mut fdt = FdtWriter::new(&[]);
    fdt.begin_node("");
    fdt.end_node();
    fdt.begin_node("other");
    fdt.end_node();
    let blob = fdt.finish();

    assert_eq!(
        DevTreeIndex::parse_blob(&blob).unwrap_err(),
        DevTreeError::UnbalancedStructure
    );
}

#[test]
fn missing_end_token_still_parses() {
    let mut fdt = FdtWriter::new(&[]);
    fdt.begin_node("");
    fdt.begin_node("chosen");
    fdt.end_node();
    fdt.end_node();
    let blob = fdt.finish_raw();

    let index = DevTreeIndex::parse_blob(&blob).unwrap();
    assert_eq!(index.node_count(), 2);
}

#[test]
fn property_name_outside_strings_block() {
    let mut fdt = FdtWriter::new(&[]);
    fdt.begin_node("");
    fdt.prop_raw(0x1000, &[0, 0, 0, 1]);
    fdt.end_node();
    let blob = fdt.finish();

    assert_eq!(
        DevTreeIndex::parse_blob(&blob).unwrap_err(),
        DevTreeError::InvalidOffset
    );
}

#[test]
fn property_value_past_structure_block() {
    let mut fdt = FdtWriter::new(&[]);
    fdt.begin_node("");
    fdt.append_u32(FDT_PROP);
    fdt.append_u32(0x100);
    fdt.append_u32(0);
    let blob = fdt.finish();

    assert_eq!(
        DevTreeIndex::parse_blob(&blob).unwrap_err(),
        DevTreeError::Truncated
    );
}

#[test]
fn node_limit_is_enforced() {
    let blob = virt_fdt();
    let limits = TreeLimits::default().max_nodes(4);
    assert_eq!(
        DevTreeIndex::parse_blob_with_limits(&blob, limits).unwrap_err(),
        DevTreeError::CapacityExceeded(Capacity::Nodes)
    );
}

#[test]
fn property_limit_is_enforced() {
    let mut fdt = FdtWriter::new(&[]);
    fdt.begin_node("");
    fdt.set_prop("a", 1u32);
    fdt.set_prop("b", 2u32);
    fdt.set_prop("c", 3u32);
    fdt.end_node();
    let blob = fdt.finish();

    let limits = TreeLimits::default().max_properties(2);
    assert_eq!(
        DevTreeIndex::parse_blob_with_limits(&blob, limits).unwrap_err(),
        DevTreeError::CapacityExceeded(Capacity::Properties)
    );
    assert!(DevTreeIndex::parse_blob(&blob).is_ok());
}

#[test]
fn string_arena_limit_is_enforced() {
    let blob = virt_fdt();
    let limits = TreeLimits::default().string_arena_size(4);
    assert_eq!(
        DevTreeIndex::parse_blob_with_limits(&blob, limits).unwrap_err(),
        DevTreeError::ArenaExhausted
    );
}

#[test]
fn reservations_stop_at_limit() {
    let regions = [(0x1000, 0x1000), (0x4000, 0x2000), (0x8000, 0x100)];
    let mut fdt = FdtWriter::new(&regions);
    fdt.begin_node("");
    fdt.end_node();
    let blob = fdt.finish();

    let all = DevTreeIndex::parse_blob(&blob).unwrap();
    assert_eq!(all.reserved_regions().len(), 3);

    let limits = TreeLimits::default().max_reserved_entries(2);
    let capped = DevTreeIndex::parse_blob_with_limits(&blob, limits).unwrap();
    assert_eq!(
        capped.reserved_regions(),
        [
            ReservedRegion {
                address: 0x1000,
                size: 0x1000
            },
            ReservedRegion {
                address: 0x4000,
                size: 0x2000
            },
        ]
    );
}

#[test]
fn zero_phandle_is_not_indexed() {
    let mut fdt = FdtWriter::new(&[]);
    fdt.begin_node("");
    fdt.begin_node("a");
    fdt.set_prop("phandle", 0u32);
    fdt.end_node();
    fdt.begin_node("b");
    fdt.set_prop("phandle", 0xffff_ffffu32);
    fdt.end_node();
    fdt.end_node();
    let blob = fdt.finish();

    let index = DevTreeIndex::parse_blob(&blob).unwrap();
    assert_eq!(index.phandle_count(), 0);
    assert_eq!(index.find_by_phandle(0), None);
}

#[test]
fn node_prop_iter() {
    let blob = virt_fdt();
    let index = DevTreeIndex::parse_blob(&blob).unwrap();

    let mut props = 0;
    for node in index.nodes() {
        for prop in node.props() {
            assert!(prop.name().is_ok());
            assert_eq!(prop.node().unwrap().id(), node.id());
            props += 1;
        }
    }
    assert_eq!(props, 12);
}

#[test]
fn reservations_stop_at_first_zero_size() {
    let regions = [(0x1000, 0x10), (0x2000, 0), (0x3000, 0x10)];
    let mut fdt = FdtWriter::new(&regions);
    fdt.begin_node("");
    fdt.end_node();
    let blob = fdt.finish();

    let index = DevTreeIndex::parse_blob(&blob).unwrap();
    assert_eq!(
        index.reserved_regions(),
        [ReservedRegion {
            address: 0x1000,
            size: 0x10
        }]
    );
}
