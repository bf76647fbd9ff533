//! Basic device tree parsing utils that operate directly on the FDT.
//!
//! # Overview
//!
//! This module provides the allocation-free layer of the crate: header validation, the
//! structure block walker, string table resolution and the memory reservation reader. Nothing
//! here copies out of the blob.
//!
//! See the [`crate::index`] module for the owned, queryable tree built on top of it.
//!
//! # Examples
//!
//! ## Initialization
//!
//! ```ignore
//! use fdt_tree::prelude::*;
//! use fdt_tree::base::*;
//!
//! # let fdt: &[u8] = &[];
//! // Create the device tree parser
//! let devtree = DevTree::new(fdt)
//!     .expect("Buffer does not contain a device tree.");
//! ```
//!
//! ## Token walk
//!
//! ```ignore
//! # use fdt_tree::prelude::*;
//! # use fdt_tree::base::*;
//! # let devtree = DevTree::new(&[]).unwrap();
//! let mut iter = devtree.parse_iter();
//! while let Some(tok) = iter.next()? {
//!     if let ParsedTok::Prop(prop) = tok {
//!         println!("{} is {} bytes", prop.name, prop.length());
//!     }
//! }
//! # Ok::<(), fdt_tree::error::DevTreeError>(())
//! ```

#[doc(hidden)]
pub mod prop;
#[doc(hidden)]
pub mod tree;

pub mod iters;
pub mod parse;

#[doc(inline)]
pub use iters::{DevTreeReserveEntryIter, ReservedRegion};
#[doc(inline)]
pub use parse::{DevTreeParseIter, ParsedBeginNode, ParsedProp, ParsedTok};
#[doc(inline)]
pub use tree::*;
