//! An owned, mutable device tree built from a flattened device tree blob.
//!
//! Utilities in this module operate on a [`DevTreeIndex`]. The index copies every node, property
//! and name out of the blob, so it outlives the buffer it was parsed from and can be edited.
//!
//! # Background
//!
//! The [`base`](crate::base) parser walks the blob on the fly. Finding a node's parent, or a node
//! by phandle, then means rescanning the structure block. The index parses the blob once into a
//! node arena, interns names in a bounded string arena and keeps a phandle table, so lookups no
//! longer touch the blob.
//!
//! Nodes are addressed through [`NodeId`] handles. Every handle carries a stamp of the tree that
//! issued it; handles from another tree, or to a removed node, are rejected.
//!
//! # Examples
//!
//! ## Initialization
//!
//! ```ignore
//! use fdt_tree::prelude::*;
//! use fdt_tree::index::DevTreeIndex;
//! use fdt_tree::limits::TreeLimits;
//!
//! let index = DevTreeIndex::parse_blob_with_limits(blob, TreeLimits::default().max_nodes(128))?;
//! println!("{}", index.summary());
//! ```
//!
//! ## Queries
//!
//! ```ignore
//! let uart = index.find_node("/soc/serial@10000000").ok_or(DevTreeError::NotFound)?;
//! let clock = index.get_u32_property(uart, "clock-frequency")?;
//!
//! for dev in index.match_compatible("virtio,mmio") {
//!     println!("{} {:?}", dev.name, dev.phandle);
//! }
//! ```
//!
//! ## Mutation
//!
//! ```ignore
//! let chosen = index.add_node(index.root_id(), "chosen")?;
//! index.add_property(chosen, "bootargs", "console=ttyS0")?;
//! index.add_property(chosen, "linux,initrd-start", 0x8800_0000u64)?;
//! ```

pub(crate) mod arena;

#[doc(hidden)]
pub mod node;
#[doc(hidden)]
pub mod prop;
#[doc(hidden)]
pub mod query;
#[doc(hidden)]
pub mod tree;

pub mod iters;

#[doc(inline)]
pub use node::{DevTreeIndexNode, NodeId};
#[doc(inline)]
pub use prop::{DevTreeIndexProp, ToPropValue};
#[doc(inline)]
pub use query::DeviceMatch;
#[doc(inline)]
pub use tree::{DevTreeIndex, TreeSummary};

pub use iters::{DevTreeIndexChildIter, DevTreeIndexNodeIter, DevTreeIndexNodePropIter};
