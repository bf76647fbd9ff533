use core::slice;

use super::node::DTINode;
use super::prop::DTIProp;
use super::{DevTreeIndex, DevTreeIndexNode, DevTreeIndexProp, NodeId};

/***********************************/
/***********  All nodes  ***********/
/***********************************/

/// Iterates over every live node of a tree in creation order (depth first for a parsed tree).
#[derive(Clone)]
pub struct DevTreeIndexNodeIter<'a> {
    index: &'a DevTreeIndex,
    nodes: core::iter::Enumerate<slice::Iter<'a, DTINode>>,
}

impl<'a> DevTreeIndexNodeIter<'a> {
    pub(super) fn new(index: &'a DevTreeIndex, nodes: &'a [DTINode]) -> Self {
        Self {
            index,
            nodes: nodes.iter().enumerate(),
        }
    }
}

impl<'a> Iterator for DevTreeIndexNodeIter<'a> {
    type Item = DevTreeIndexNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        self.nodes
            .by_ref()
            .find(|(_, node)| node.live)
            .map(|(i, node)| DevTreeIndexNode::new(index, index.node_id(i), node))
    }
}

/***********************************/
/***********  Children   ***********/
/***********************************/

#[derive(Clone)]
pub struct DevTreeIndexChildIter<'a> {
    index: &'a DevTreeIndex,
    children: slice::Iter<'a, NodeId>,
}

impl<'a> DevTreeIndexChildIter<'a> {
    pub(super) fn new(index: &'a DevTreeIndex, children: &'a [NodeId]) -> Self {
        Self {
            index,
            children: children.iter(),
        }
    }
}

impl<'a> Iterator for DevTreeIndexChildIter<'a> {
    type Item = DevTreeIndexNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        self.children.by_ref().find_map(|&id| index.node(id))
    }
}

/***********************************/
/***********  Node Props ***********/
/***********************************/

#[derive(Clone)]
pub struct DevTreeIndexNodePropIter<'a> {
    index: &'a DevTreeIndex,
    node: NodeId,
    props: slice::Iter<'a, DTIProp>,
}

impl<'a> DevTreeIndexNodePropIter<'a> {
    pub(super) fn new(index: &'a DevTreeIndex, node: NodeId, props: &'a [DTIProp]) -> Self {
        Self {
            index,
            node,
            props: props.iter(),
        }
    }
}

impl<'a> Iterator for DevTreeIndexNodePropIter<'a> {
    type Item = DevTreeIndexProp<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.props
            .next()
            .map(|prop| DevTreeIndexProp::new(self.index, self.node, prop))
    }
}
