//! A flattened device tree parser and owned, queryable device tree for `no_std` environments.
//!
//! # Overview
//!
//! The crate is split in two layers:
//!
//! - [`base`] validates a blob and walks its structure block without allocating.
//! - [`index`] builds a [`DevTreeIndex`] from that walk: an arena of nodes with interned names,
//!   a phandle table and the memory reservation list. The index supports path, phandle and
//!   compatible lookups, typed property reads and in-place edits.
//!
//! Every resource the index holds is bounded by [`TreeLimits`].
//!
//! # Features
//!
//! This crate can be used without the standard library (`#![no_std]`) by disabling
//! the default `std` feature. An allocator is always required since the index owns its data.
//!
//! ```toml
//! [dependencies]
//! fdt-tree = { version = "0.1", default-features = false }
//! ```
//!
//! Diagnostics are emitted through the [`log`] facade.
//!
//! # Examples
//!
//! ```ignore
//! use fdt_tree::prelude::*;
//! use fdt_tree::DevTreeIndex;
//!
//! let index = DevTreeIndex::parse_blob(blob)?;
//! if let Some(memory) = index.find_node("/memory@80000000") {
//!     let reg = index.get_u64_property(memory, "reg")?;
//! }
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[macro_use]
extern crate memoffset;
#[macro_use]
extern crate static_assertions;

extern crate endian_type;
extern crate fallible_iterator;
extern crate num_derive;
extern crate num_traits;

pub mod base;
pub mod common;
pub mod error;
pub mod index;
pub mod limits;
pub mod prelude;
pub mod spec;
pub mod util;

mod priv_util;

#[doc(inline)]
pub use error::{DevTreeError, Result};
#[doc(inline)]
pub use index::{DevTreeIndex, NodeId};
#[doc(inline)]
pub use limits::TreeLimits;
