//! Errors reported by this library

use crate::priv_util::SliceReadError;
use core::fmt;
use core::result;
use core::str::Utf8Error;

/// The bounded resource that a [`DevTreeError::CapacityExceeded`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// The tree's node arena is full.
    Nodes,
    /// A single node already holds the maximum number of properties.
    Properties,
    /// The phandle index is full.
    Phandles,
}

/// An error describing problems when parsing, querying or modifying device trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevTreeError {
    InvalidParameter(&'static str),

    /// The magic number FDT_MAGIC was not found at the start of the
    /// structure.
    InvalidMagic,

    /// The blob is shorter than its header, or than the size its header declares, or one of its
    /// blocks reaches past the declared size.
    Truncated,

    /// A block offset is misaligned, or a property name offset points outside the strings block.
    InvalidOffset,

    /// The structure block contained a token value which is not defined by the format.
    MalformedToken(u32),

    /// The structure block closed more nodes than it opened, or opened a second root.
    UnbalancedStructure,

    /// A fixed limit of the tree was reached. The attempted insertion was not applied.
    CapacityExceeded(Capacity),

    /// The string arena has no room left for another name.
    ArenaExhausted,

    /// A typed property read asked for more bytes than the property holds, or the value does
    /// not have the requested shape.
    TypeMismatch,

    /// A node or property lookup came up empty, or a node handle no longer refers to a live node
    /// of this tree.
    NotFound,

    /// While trying to convert a string that was supposed to be UTF-8, invalid
    /// `str` sequences were encountered.
    StrError(Utf8Error),

    /// The requested operation exists in the format but is not implemented.
    Unsupported(&'static str),
}

impl From<SliceReadError> for DevTreeError {
    fn from(_: SliceReadError) -> DevTreeError {
        DevTreeError::Truncated
    }
}

impl From<Utf8Error> for DevTreeError {
    fn from(e: Utf8Error) -> DevTreeError {
        DevTreeError::StrError(e)
    }
}

/// The result of a device tree operation.
pub type Result<T> = core::result::Result<T, DevTreeError>;

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match *self {
            Capacity::Nodes => write!(f, "nodes"),
            Capacity::Properties => write!(f, "properties per node"),
            Capacity::Phandles => write!(f, "phandles"),
        }
    }
}

impl fmt::Display for DevTreeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match *self {
            DevTreeError::InvalidParameter(err) => write!(f, "Invalid parameter supplied: {}", err),
            DevTreeError::InvalidMagic => write!(f, "Device tree contains invalid magic number."),
            DevTreeError::Truncated => write!(f, "Device tree is shorter than its header declares."),
            DevTreeError::InvalidOffset => write!(f, "Invalid offset found in device tree."),
            DevTreeError::MalformedToken(tok) => {
                write!(f, "Unexpected token {:#x} in device tree structure block.", tok)
            }
            DevTreeError::UnbalancedStructure => {
                write!(f, "Device tree structure block has unbalanced node tokens.")
            }
            DevTreeError::CapacityExceeded(what) => write!(f, "Capacity exceeded for {}.", what),
            DevTreeError::ArenaExhausted => write!(f, "Device tree string arena is exhausted."),
            DevTreeError::TypeMismatch => write!(f, "Property value does not hold the requested type."),
            DevTreeError::NotFound => write!(f, "Device tree node or property not found."),
            DevTreeError::StrError(utf_err) => {
                write!(f, "Failed to parse device tree string: {}", utf_err)
            }
            DevTreeError::Unsupported(what) => write!(f, "Unsupported operation: {}", what),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DevTreeError {}
