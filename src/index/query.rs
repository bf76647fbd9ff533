use alloc::vec::Vec;

use crate::common::prop::{PropKind, PropValue};
use crate::error::{DevTreeError, Result};
use crate::prelude::*;
use crate::spec::Phandle;

use super::{DevTreeIndex, DevTreeIndexNode, DevTreeIndexProp, NodeId};

/// One node matched by [`DevTreeIndex::match_compatible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMatch<'a> {
    pub node: NodeId,
    pub name: &'a str,
    pub phandle: Option<Phandle>,
}

impl<'a> From<DevTreeIndexNode<'a>> for DeviceMatch<'a> {
    fn from(node: DevTreeIndexNode<'a>) -> Self {
        Self {
            node: node.id(),
            name: node.name(),
            phandle: node.phandle(),
        }
    }
}

impl DevTreeIndex {
    /// Resolve an absolute path such as `"/soc/uart@10000000"`.
    ///
    /// Empty path segments are ignored, so `""`, `"/"` and `"//"` all name the root. Each
    /// segment must equal a child's full name, unit address included.
    pub fn find_node(&self, path: &str) -> Option<NodeId> {
        let mut cur = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            cur = cur.children().find(|child| child.name() == segment)?;
        }
        Some(cur.id())
    }

    /// The first node, in arena order, whose `compatible` value contains `compatible`.
    pub fn find_node_by_compatible(&self, compatible: &str) -> Option<NodeId> {
        self.nodes()
            .find(|node| node.compatible_contains(compatible))
            .map(|node| node.id())
    }

    /// Every node whose `compatible` value contains `compatible`, in arena order.
    pub fn match_compatible(&self, compatible: &str) -> Vec<DeviceMatch<'_>> {
        self.nodes()
            .filter(|node| node.compatible_contains(compatible))
            .map(DeviceMatch::from)
            .collect()
    }

    pub fn find_by_phandle(&self, phandle: Phandle) -> Option<NodeId> {
        self.phandle_entries()
            .iter()
            .find(|&&(p, _)| p == phandle)
            .map(|&(_, node)| node)
    }

    /// Returns `None` for the root and for handles which are not live nodes of this tree.
    pub fn get_parent(&self, node: NodeId) -> Option<NodeId> {
        self.raw_node(node)?.parent
    }

    /// The node's children in insertion order. Empty for stale handles.
    pub fn get_children(&self, node: NodeId) -> &[NodeId] {
        match self.raw_node(node) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    pub fn get_property(&self, node: NodeId, name: &str) -> Option<DevTreeIndexProp<'_>> {
        self.node(node)?.prop(name)
    }

    fn require_property(&self, node: NodeId, name: &str) -> Result<DevTreeIndexProp<'_>> {
        self.get_property(node, name).ok_or(DevTreeError::NotFound)
    }

    /// Decode the first cell of `name` as a big-endian `u32`.
    pub fn get_u32_property(&self, node: NodeId, name: &str) -> Result<u32> {
        self.require_property(node, name)?.get_u32(0)
    }

    pub fn get_u64_property(&self, node: NodeId, name: &str) -> Result<u64> {
        self.require_property(node, name)?.get_u64(0)
    }

    /// The first string of `name`'s value.
    pub fn get_string_property(&self, node: NodeId, name: &str) -> Result<&str> {
        self.require_property(node, name)?.get_str()
    }

    /// Copy the first `buf.len()` bytes of `name`'s value into `buf`.
    ///
    /// Fails with [`DevTreeError::TypeMismatch`] if the value is shorter than `buf`.
    pub fn get_bytes_property(&self, node: NodeId, name: &str, buf: &mut [u8]) -> Result<()> {
        let raw = self.require_property(node, name)?.get_raw();
        let src = raw.get(..buf.len()).ok_or(DevTreeError::TypeMismatch)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    /// Decode `name`'s value as `kind`.
    pub fn get_property_value(&self, node: NodeId, name: &str, kind: PropKind) -> Result<PropValue<'_>> {
        self.require_property(node, name)?.decode(kind)
    }
}
