use alloc::vec::Vec;
use core::fmt;
use core::ops::ControlFlow;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::prelude::*;

use super::arena::{StrRef, StringArena};
use super::iters::DevTreeIndexNodeIter;
use super::node::DTINode;
use super::prop::{DTIProp, ToPropValue};
use super::{DevTreeIndexNode, NodeId};
use crate::base::parse::{ParsedBeginNode, ParsedProp, ParsedTok};
use crate::base::{DevTree, FdtHeader, ReservedRegion};
use crate::error::{Capacity, DevTreeError, Result};
use crate::limits::TreeLimits;
use crate::spec::{Phandle, PHANDLE_PROP};

/// Source of the per-tree stamp carried by every [`NodeId`].
static NEXT_TREE_STAMP: AtomicU32 = AtomicU32::new(1);

#[cfg(target_has_atomic = "32")]
fn next_tree_stamp() -> u32 {
    NEXT_TREE_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Targets without compare-and-swap only get plain loads and stores. Stamps stay unique as
/// long as trees are not built concurrently (e.g. from an interrupt handler).
#[cfg(not(target_has_atomic = "32"))]
fn next_tree_stamp() -> u32 {
    let stamp = NEXT_TREE_STAMP.load(Ordering::Relaxed);
    NEXT_TREE_STAMP.store(stamp.wrapping_add(1), Ordering::Relaxed);
    stamp
}

/// Decode a `phandle` property value. `0` and `0xffffffff` both mean "no phandle".
fn phandle_value(value: &[u8]) -> Option<Phandle> {
    if value.len() != 4 {
        return None;
    }
    match value.read_be_u32(0).ok()? {
        0 | 0xffff_ffff => None,
        phandle => Some(phandle),
    }
}

/// An owned, queryable device tree.
///
/// The tree owns every node in a single arena. Parent and child links are [`NodeId`] handles
/// into that arena, never owning references. Names live in a bounded string arena and phandles
/// are indexed as nodes declare them.
///
/// Mutating methods take `&mut self`, so no borrowed view ([`DevTreeIndexNode`],
/// [`DevTreeIndexProp`](super::DevTreeIndexProp) or a child slice) survives a mutation.
/// [`NodeId`] handles do, and are re-validated on every use.
#[derive(Debug)]
pub struct DevTreeIndex {
    stamp: u32,
    limits: TreeLimits,
    header: Option<FdtHeader>,
    root: NodeId,
    nodes: Vec<DTINode>,
    live_nodes: usize,
    strings: StringArena,
    phandles: Vec<(Phandle, NodeId)>,
    reserved: Vec<ReservedRegion>,
}

/// Consumes walker tokens and grows a [`DevTreeIndex`].
///
/// `depth` counts open nodes. The blob's first top-level node is the root the index already
/// holds; opening a second one, or closing a node at depth zero, is an unbalanced structure.
struct DTIBuilder<'i> {
    index: &'i mut DevTreeIndex,
    cur_node: NodeId,
    depth: usize,
    root_opened: bool,
}

impl<'i> DTIBuilder<'i> {
    fn new(index: &'i mut DevTreeIndex) -> Self {
        let root = index.root;
        Self {
            index,
            cur_node: root,
            depth: 0,
            root_opened: false,
        }
    }

    fn parsed_node(&mut self, node: &ParsedBeginNode<'_>) -> Result<()> {
        if self.depth == 0 {
            if self.root_opened {
                return Err(DevTreeError::UnbalancedStructure);
            }
            self.root_opened = true;
            let root = self.index.root;
            let name = self.index.strings.intern(node.name)?;
            self.index.nodes[root.index()].name = name;
            self.cur_node = root;
        } else {
            self.cur_node = self.index.alloc_node(self.cur_node, node.name)?;
        }
        self.depth += 1;
        Ok(())
    }

    fn parsed_prop(&mut self, prop: &ParsedProp<'_>) -> Result<()> {
        self.index
            .append_prop(self.cur_node, prop.name, prop.get_raw().into())
    }

    fn parsed_end_node(&mut self) -> Result<()> {
        // There were more EndNode tokens than BeginNode ones.
        if self.depth == 0 {
            return Err(DevTreeError::UnbalancedStructure);
        }
        self.depth -= 1;
        if self.depth > 0 {
            self.cur_node = self.index.nodes[self.cur_node.index()]
                .parent
                .ok_or(DevTreeError::UnbalancedStructure)?;
        }
        Ok(())
    }
}

impl DevTreeIndex {
    /// Create a tree holding only an unnamed root node.
    pub fn new(limits: TreeLimits) -> Result<Self> {
        Self::with_header(limits, None)
    }

    fn with_header(limits: TreeLimits, header: Option<FdtHeader>) -> Result<Self> {
        if limits.nodes() == 0 {
            return Err(DevTreeError::CapacityExceeded(Capacity::Nodes));
        }
        let stamp = next_tree_stamp();
        let mut strings = StringArena::new(limits.string_arena());
        let root_name = strings.intern("")?;
        let root = NodeId {
            tree: stamp,
            index: 0,
        };

        let mut nodes = Vec::new();
        nodes.push(DTINode::new(root_name, None));

        Ok(Self {
            stamp,
            limits,
            header,
            root,
            nodes,
            live_nodes: 1,
            strings,
            phandles: Vec::new(),
            reserved: Vec::new(),
        })
    }

    /// Parse a flattened device tree blob into a tree, using [`TreeLimits::default()`].
    ///
    /// On any error no tree is returned; everything built so far is released.
    pub fn parse_blob(blob: &[u8]) -> Result<Self> {
        Self::parse_blob_with_limits(blob, TreeLimits::default())
    }

    /// Parse a flattened device tree blob into a tree bounded by `limits`.
    pub fn parse_blob_with_limits(blob: &[u8], limits: TreeLimits) -> Result<Self> {
        let fdt = DevTree::new(blob)?;
        Self::from_devtree(&fdt, limits)
    }

    /// Build a tree from an already validated blob view.
    pub fn from_devtree(fdt: &DevTree<'_>, limits: TreeLimits) -> Result<Self> {
        log::debug!(
            "parsing fdt: version {}, {} bytes, {} byte structure block",
            fdt.version(),
            fdt.totalsize(),
            fdt.size_dt_struct()
        );

        let mut index = Self::with_header(limits, Some(*fdt.header()))?;

        let mut iter = fdt.parse_iter();
        {
            let mut builder = DTIBuilder::new(&mut index);
            while let Some(tok) = iter.next()? {
                match tok {
                    ParsedTok::BeginNode(node) => builder.parsed_node(&node)?,
                    ParsedTok::Prop(prop) => builder.parsed_prop(&prop)?,
                    ParsedTok::EndNode => builder.parsed_end_node()?,
                    ParsedTok::Nop => continue,
                }
            }
        }
        if !iter.reached_end_token() && !fdt.struct_block().is_empty() {
            log::warn!("fdt structure block ended without an END token");
        }

        let mut entries = fdt.reserved_entries(limits.reserved_entries());
        while let Some(region) = entries.next()? {
            index.reserved.push(region);
        }

        log::debug!(
            "parsed fdt: {} nodes, {} phandles, {} reserved regions",
            index.live_nodes,
            index.phandles.len(),
            index.reserved.len()
        );
        Ok(index)
    }

    /// Release the tree and everything it owns.
    ///
    /// Dropping the tree has the same effect. Handles taken from it are rejected by every other
    /// tree, including trees parsed later.
    pub fn free(self) {
        log::trace!("freeing fdt index with {} nodes", self.live_nodes);
    }

    /***********************************/
    /*********  Arena access  **********/
    /***********************************/

    pub(super) fn node_id(&self, index: usize) -> NodeId {
        NodeId {
            tree: self.stamp,
            index: index as u32,
        }
    }

    pub(super) fn raw_node(&self, id: NodeId) -> Option<&DTINode> {
        if id.tree != self.stamp {
            return None;
        }
        self.nodes.get(id.index()).filter(|node| node.live)
    }

    fn raw_node_mut(&mut self, id: NodeId) -> Result<&mut DTINode> {
        if id.tree != self.stamp {
            return Err(DevTreeError::NotFound);
        }
        self.nodes
            .get_mut(id.index())
            .filter(|node| node.live)
            .ok_or(DevTreeError::NotFound)
    }

    pub(crate) fn resolve(&self, name: StrRef) -> Option<&str> {
        self.strings.resolve(name)
    }

    /// Returns a view of the node `id`, or `None` if it is not a live node of this tree.
    pub fn node(&self, id: NodeId) -> Option<DevTreeIndexNode<'_>> {
        self.raw_node(id)
            .map(|node| DevTreeIndexNode::new(self, id, node))
    }

    pub fn root(&self) -> DevTreeIndexNode<'_> {
        DevTreeIndexNode::new(self, self.root, &self.nodes[self.root.index()])
    }

    #[inline]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.live_nodes
    }

    #[inline]
    pub fn phandle_count(&self) -> usize {
        self.phandles.len()
    }

    /// The memory reservation entries read from the blob.
    #[inline]
    pub fn reserved_regions(&self) -> &[ReservedRegion] {
        &self.reserved
    }

    /// The header of the blob this tree was parsed from.
    #[inline]
    pub fn header(&self) -> Option<&FdtHeader> {
        self.header.as_ref()
    }

    /// The `version` header field of the source blob, `None` for a tree built by hand.
    pub fn version(&self) -> Option<u32> {
        self.header.map(|h| h.version)
    }

    pub fn boot_cpuid_phys(&self) -> Option<u32> {
        self.header.map(|h| h.boot_cpuid_phys)
    }

    #[inline]
    pub fn limits(&self) -> &TreeLimits {
        &self.limits
    }

    /// Iterate over all live nodes in arena order.
    pub fn nodes(&self) -> DevTreeIndexNodeIter<'_> {
        DevTreeIndexNodeIter::new(self, &self.nodes)
    }

    /// Call `f` for every live node in arena order until it breaks.
    pub fn traverse<B, F>(&self, mut f: F) -> ControlFlow<B>
    where
        F: FnMut(DevTreeIndexNode<'_>) -> ControlFlow<B>,
    {
        for node in self.nodes() {
            if let ControlFlow::Break(b) = f(node) {
                return ControlFlow::Break(b);
            }
        }
        ControlFlow::Continue(())
    }

    /***********************************/
    /***********  Mutation  ************/
    /***********************************/

    fn alloc_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        if self.nodes.len() >= self.limits.nodes() {
            return Err(DevTreeError::CapacityExceeded(Capacity::Nodes));
        }
        self.raw_node_mut(parent)?;
        let name = self.strings.intern(name)?;

        let id = self.node_id(self.nodes.len());
        self.nodes.push(DTINode::new(name, Some(parent)));
        self.nodes[parent.index()].children.push(id);
        self.live_nodes += 1;
        Ok(id)
    }

    /// Append a property while building. Names are not checked for duplicates.
    fn append_prop(&mut self, node: NodeId, name: &str, value: Vec<u8>) -> Result<()> {
        let props = self.raw_node_mut(node)?.props.len();
        if props >= self.limits.properties() {
            return Err(DevTreeError::CapacityExceeded(Capacity::Properties));
        }
        let phandle = if name == PHANDLE_PROP {
            phandle_value(&value)
        } else {
            None
        };
        if phandle.is_some() {
            self.check_phandle_room(node)?;
        }

        let name = self.strings.intern(name)?;
        self.nodes[node.index()].props.push(DTIProp {
            name,
            value: value.into_boxed_slice(),
        });
        if let Some(phandle) = phandle {
            self.set_phandle(node, Some(phandle));
        }
        Ok(())
    }

    fn check_phandle_room(&self, node: NodeId) -> Result<()> {
        let indexed = self.phandles.iter().any(|&(_, n)| n == node);
        if !indexed && self.phandles.len() >= self.limits.nodes() {
            Err(DevTreeError::CapacityExceeded(Capacity::Phandles))
        } else {
            Ok(())
        }
    }

    /// Mirror `phandle` onto the node and the phandle index. Room must have been checked.
    fn set_phandle(&mut self, node: NodeId, phandle: Option<Phandle>) {
        self.nodes[node.index()].phandle = phandle;
        let slot = self.phandles.iter().position(|&(_, n)| n == node);
        match (slot, phandle) {
            (Some(i), Some(phandle)) => self.phandles[i].0 = phandle,
            (Some(i), None) => {
                self.phandles.remove(i);
            }
            (None, Some(phandle)) => self.phandles.push((phandle, node)),
            (None, None) => (),
        }
    }

    /// Add a child node called `name` under `parent`.
    ///
    /// Fails with [`DevTreeError::CapacityExceeded`] when the node arena is full and with
    /// [`DevTreeError::NotFound`] when `parent` is not a live node of this tree.
    pub fn add_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.alloc_node(parent, name)
    }

    /// Set the property `name` of `node` to `value`.
    ///
    /// An existing property of that name has its value replaced; otherwise the property is
    /// appended. A four byte `phandle` property also updates the node's phandle and the phandle
    /// index. On error the tree is left unchanged.
    pub fn add_property<V: ToPropValue>(&mut self, node: NodeId, name: &str, value: V) -> Result<()> {
        let value = value.to_prop_value()?;
        let existing = self
            .node(node)
            .ok_or(DevTreeError::NotFound)?
            .props()
            .position(|prop| prop.name().map_or(false, |n| n == name));

        let pos = match existing {
            Some(pos) => pos,
            None => return self.append_prop(node, name, value),
        };

        if name == PHANDLE_PROP {
            let phandle = phandle_value(&value);
            if phandle.is_some() {
                self.check_phandle_room(node)?;
            }
            self.set_phandle(node, phandle);
        }
        self.nodes[node.index()].props[pos].value = value.into_boxed_slice();
        Ok(())
    }

    /// Detach `node` and its whole subtree from the tree.
    ///
    /// The nodes are unlinked from their parent, dropped from the phandle index and their
    /// properties are released. Their arena slots are kept (so other handles stay stable) but
    /// no query returns them again. The root cannot be removed.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(DevTreeError::InvalidParameter("the root node cannot be removed"));
        }
        let parent = self
            .raw_node(node)
            .ok_or(DevTreeError::NotFound)?
            .parent
            .ok_or(DevTreeError::NotFound)?;
        self.raw_node_mut(parent)?.children.retain(|&c| c != node);

        let mut removed = 0;
        let mut stack = Vec::new();
        stack.push(node);
        while let Some(id) = stack.pop() {
            let dead = &mut self.nodes[id.index()];
            if !dead.live {
                continue;
            }
            dead.live = false;
            dead.phandle = None;
            dead.props = Vec::new();
            stack.append(&mut dead.children);
            removed += 1;
        }
        self.live_nodes -= removed;

        let nodes = &self.nodes;
        self.phandles.retain(|&(_, n)| nodes[n.index()].live);

        log::debug!("removed {} fdt nodes", removed);
        Ok(())
    }

    /***********************************/
    /***********  Overlays  ************/
    /***********************************/

    /// Parse and validate an overlay blob with this tree's limits.
    ///
    /// The overlay is discarded afterwards: nothing is merged into this tree. `Ok(())` only
    /// proves the overlay is well formed.
    pub fn load_overlay(&self, blob: &[u8]) -> Result<()> {
        let overlay = Self::parse_blob_with_limits(blob, self.limits)?;
        let errors = overlay.validate();
        if errors != 0 {
            return Err(DevTreeError::InvalidParameter("overlay failed validation"));
        }
        log::warn!(
            "fdt overlay with {} nodes validated but not merged",
            overlay.node_count()
        );
        Ok(())
    }

    /// Merge an overlay into this tree.
    ///
    /// Merge semantics are not defined yet. The overlay is validated as in
    /// [`DevTreeIndex::load_overlay`] and then [`DevTreeError::Unsupported`] is returned; the
    /// tree is never modified.
    pub fn apply_overlay(&mut self, blob: &[u8]) -> Result<()> {
        self.load_overlay(blob)?;
        Err(DevTreeError::Unsupported("overlay merge"))
    }

    /***********************************/
    /*********  Diagnostics  ***********/
    /***********************************/

    /// Count structural inconsistencies. `0` means the tree is consistent.
    ///
    /// Checked: every live node's name and every property name resolve in the string arena,
    /// parent and child links agree, and node phandles agree with the phandle index.
    pub fn validate(&self) -> usize {
        let mut errors = 0;

        for (i, node) in self.nodes.iter().enumerate() {
            if !node.live {
                continue;
            }
            let id = self.node_id(i);

            if self.strings.resolve(node.name).is_none() {
                errors += 1;
            }
            errors += node
                .props
                .iter()
                .filter(|prop| self.strings.resolve(prop.name).is_none())
                .count();

            match node.parent {
                None if id != self.root => errors += 1,
                Some(parent) if self.raw_node(parent).is_none() => errors += 1,
                _ => (),
            }
            errors += node
                .children
                .iter()
                .filter(|&&child| self.raw_node(child).map_or(true, |c| c.parent != Some(id)))
                .count();

            if let Some(phandle) = node.phandle {
                if !self.phandles.contains(&(phandle, id)) {
                    errors += 1;
                }
            }
        }

        errors += self
            .phandles
            .iter()
            .filter(|&&(phandle, id)| {
                self.raw_node(id).map_or(true, |node| node.phandle != Some(phandle))
            })
            .count();

        errors
    }

    /// Node, phandle and reserved region counts. The summary's `Display` is a readable dump.
    pub fn summary(&self) -> TreeSummary {
        TreeSummary {
            nodes: self.live_nodes,
            phandles: self.phandles.len(),
            reserved_regions: self.reserved.len(),
            string_bytes: self.strings.used(),
            string_capacity: self.strings.capacity(),
        }
    }

    pub(super) fn phandle_entries(&self) -> &[(Phandle, NodeId)] {
        &self.phandles
    }
}

/// Counts describing a [`DevTreeIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSummary {
    pub nodes: usize,
    pub phandles: usize,
    pub reserved_regions: usize,
    pub string_bytes: usize,
    pub string_capacity: usize,
}

impl fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Device Tree:")?;
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(f, "  Phandles: {}", self.phandles)?;
        writeln!(f, "  Reserved Regions: {}", self.reserved_regions)?;
        write!(
            f,
            "  String Arena: {}/{} bytes",
            self.string_bytes, self.string_capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tree_gets_its_own_stamp() {
        let a = DevTreeIndex::new(TreeLimits::default()).unwrap();
        let b = DevTreeIndex::new(TreeLimits::default()).unwrap();
        assert_ne!(a.stamp, b.stamp);
        assert_ne!(a.root_id(), b.root_id());
        assert!(b.node(a.root_id()).is_none());
    }
}
