//! Capacity configuration for a [`DevTreeIndex`](crate::index::DevTreeIndex).
//!
//! Every arena owned by a tree is bounded. Insertions past a bound fail with
//! [`DevTreeError::CapacityExceeded`](crate::error::DevTreeError::CapacityExceeded) or
//! [`DevTreeError::ArenaExhausted`](crate::error::DevTreeError::ArenaExhausted) and leave the tree
//! unchanged.

pub const DEFAULT_MAX_NODES: usize = 512;
pub const DEFAULT_MAX_PROPERTIES: usize = 64;
pub const DEFAULT_STRING_ARENA_SIZE: usize = 64 * 1024;
pub const DEFAULT_MAX_RESERVED_ENTRIES: usize = 64;

/// Limits applied while building and modifying a tree.
///
/// ```
/// use fdt_tree::TreeLimits;
///
/// let limits = TreeLimits::default().max_nodes(1024).max_properties(128);
/// assert_eq!(limits.nodes(), 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLimits {
    max_nodes: usize,
    max_properties: usize,
    string_arena_size: usize,
    max_reserved_entries: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            max_properties: DEFAULT_MAX_PROPERTIES,
            string_arena_size: DEFAULT_STRING_ARENA_SIZE,
            max_reserved_entries: DEFAULT_MAX_RESERVED_ENTRIES,
        }
    }
}

impl TreeLimits {
    /// Maximum number of nodes, the root included.
    #[must_use]
    pub fn max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Maximum number of properties held by a single node.
    #[must_use]
    pub fn max_properties(mut self, max_properties: usize) -> Self {
        self.max_properties = max_properties;
        self
    }

    /// Byte capacity of the string arena holding node and property names.
    #[must_use]
    pub fn string_arena_size(mut self, size: usize) -> Self {
        self.string_arena_size = size;
        self
    }

    /// Maximum number of memory reservation entries read from the blob.
    #[must_use]
    pub fn max_reserved_entries(mut self, max: usize) -> Self {
        self.max_reserved_entries = max;
        self
    }

    #[inline]
    pub fn nodes(&self) -> usize {
        self.max_nodes
    }

    #[inline]
    pub fn properties(&self) -> usize {
        self.max_properties
    }

    #[inline]
    pub fn string_arena(&self) -> usize {
        self.string_arena_size
    }

    #[inline]
    pub fn reserved_entries(&self) -> usize {
        self.max_reserved_entries
    }
}
