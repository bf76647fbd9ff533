use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use super::arena::StrRef;
use super::iters::{DevTreeIndexChildIter, DevTreeIndexNodePropIter};
use super::prop::DTIProp;
use super::{DevTreeIndex, DevTreeIndexProp};
use crate::prelude::*;
use crate::spec::{Phandle, COMPATIBLE_PROP};

/// A handle naming one node of one [`DevTreeIndex`].
///
/// Handles are plain values and stay valid across mutations, but they are checked on every use:
/// a handle to a removed node, or to a node of a different (or dropped) tree, is rejected with
/// [`DevTreeError::NotFound`](crate::error::DevTreeError::NotFound) or an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub(super) tree: u32,
    pub(super) index: u32,
}

impl NodeId {
    /// Position of the node in its tree's node arena.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

pub(super) struct DTINode {
    pub(super) name: StrRef,
    pub(super) phandle: Option<Phandle>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) props: Vec<DTIProp>,
    /// Cleared when the node is removed. Dead slots stay in the arena so indices never shift.
    pub(super) live: bool,
}

impl DTINode {
    pub(super) fn new(name: StrRef, parent: Option<NodeId>) -> Self {
        Self {
            name,
            phandle: None,
            parent,
            children: Vec::new(),
            props: Vec::new(),
            live: true,
        }
    }
}

impl fmt::Debug for DTINode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DTINode")
            .field("name", &self.name)
            .field("phandle", &self.phandle)
            .field("parent", &self.parent)
            .field("children", &self.children.len())
            .field("props", &self.props.len())
            .field("live", &self.live)
            .finish()
    }
}

/// A borrowed view of a live node within a [`DevTreeIndex`].
#[derive(Clone)]
pub struct DevTreeIndexNode<'a> {
    index: &'a DevTreeIndex,
    id: NodeId,
    pub(super) node: &'a DTINode,
}

impl<'a> DevTreeIndexNode<'a> {
    pub(super) fn new(index: &'a DevTreeIndex, id: NodeId, node: &'a DTINode) -> Self {
        Self { index, id, node }
    }

    pub fn index(&self) -> &'a DevTreeIndex {
        self.index
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the name of the node (including unit address). The root's name is empty.
    pub fn name(&self) -> &'a str {
        self.index.resolve(self.node.name).unwrap_or("")
    }

    /// The phandle this node declared through its `phandle` property, if any.
    #[inline]
    pub fn phandle(&self) -> Option<Phandle> {
        self.node.phandle
    }

    pub fn parent(&self) -> Option<Self> {
        self.node.parent.and_then(|par| self.index.node(par))
    }

    pub fn children(&self) -> DevTreeIndexChildIter<'a> {
        DevTreeIndexChildIter::new(self.index, &self.node.children)
    }

    pub fn props(&self) -> DevTreeIndexNodePropIter<'a> {
        DevTreeIndexNodePropIter::new(self.index, self.id, &self.node.props)
    }

    /// Returns the property called `name`, if this node has one.
    pub fn prop(&self, name: &str) -> Option<DevTreeIndexProp<'a>> {
        self.props().find(|prop| prop.name().map_or(false, |n| n == name))
    }

    /// Whether this node's `compatible` value contains `substring` anywhere in its bytes.
    pub fn compatible_contains(&self, substring: &str) -> bool {
        self.prop(COMPATIBLE_PROP)
            .map_or(false, |prop| prop.contains(substring.as_bytes()))
    }

    /// Whether one entry of this node's `compatible` string list is exactly `compatible`.
    ///
    /// Unlike [`DevTreeIndexNode::compatible_contains`] this does not match fragments:
    /// `"ns16550"` is not compatible with a node declaring `"ns16550a"`.
    pub fn is_compatible(&self, compatible: &str) -> bool {
        self.prop(COMPATIBLE_PROP)
            .map_or(false, |prop| prop.has_str(compatible))
    }

    /// Returns the absolute path of this node, `"/"` for the root.
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut cur = Some(self.clone());
        while let Some(node) = cur {
            let parent = node.parent();
            if parent.is_some() {
                names.push(node.name());
            }
            cur = parent;
        }

        if names.is_empty() {
            return String::from("/");
        }
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push('/');
            path.push_str(name);
        }
        path
    }
}
