use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem::size_of_val;

use crate::error::{DevTreeError, Result};
use crate::prelude::*;

use super::arena::StrRef;
use super::{DevTreeIndex, DevTreeIndexNode, NodeId};

pub(super) struct DTIProp {
    pub(super) name: StrRef,
    pub(super) value: Box<[u8]>,
}

/// A wrapper around a device tree property within a [`DevTreeIndex`].
///
/// Most desired methods are available through the [`PropReader`] trait.
#[derive(Clone)]
pub struct DevTreeIndexProp<'a> {
    pub index: &'a DevTreeIndex,
    node: NodeId,
    prop: &'a DTIProp,
}

impl<'a> DevTreeIndexProp<'a> {
    pub(super) fn new(index: &'a DevTreeIndex, node: NodeId, prop: &'a DTIProp) -> Self {
        Self { index, node, prop }
    }

    /// Returns the node which this property is attached to.
    pub fn node(&self) -> Option<DevTreeIndexNode<'a>> {
        self.index.node(self.node)
    }
}

impl<'a> PropReader<'a> for DevTreeIndexProp<'a> {
    #[inline]
    fn propbuf(&self) -> &'a [u8] {
        &self.prop.value
    }

    fn name(&self) -> Result<&'a str> {
        self.index
            .resolve(self.prop.name)
            .ok_or(DevTreeError::InvalidOffset)
    }
}

/// Conversion into a raw property value.
///
/// Integers are stored big-endian as the format requires; strings gain their null terminator.
pub trait ToPropValue {
    fn to_prop_value(self) -> Result<Vec<u8>>;
}

#[inline]
fn u32_to_bytes(value: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(size_of_val(value));
    for val in value {
        bytes.extend_from_slice(&val.to_be_bytes())
    }
    bytes
}

#[inline]
fn u64_to_bytes(value: &[u64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(size_of_val(value));
    for val in value {
        bytes.extend_from_slice(&val.to_be_bytes())
    }
    bytes
}

#[inline]
fn str_list_to_bytes(value: &[&str]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for s in value {
        if s.contains('\0') {
            return Err(DevTreeError::InvalidParameter("string value contains a null byte"));
        }
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
    }
    Ok(bytes)
}

impl ToPropValue for () {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

impl ToPropValue for &[u8] {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(self.into())
    }
}

impl<const N: usize> ToPropValue for &[u8; N] {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl ToPropValue for Vec<u8> {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(self)
    }
}

impl ToPropValue for u32 {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(u32_to_bytes(core::slice::from_ref(&self)))
    }
}

impl ToPropValue for &[u32] {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(u32_to_bytes(self))
    }
}

impl<const N: usize> ToPropValue for &[u32; N] {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(u32_to_bytes(self))
    }
}

impl ToPropValue for u64 {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(u64_to_bytes(core::slice::from_ref(&self)))
    }
}

impl ToPropValue for &[u64] {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(u64_to_bytes(self))
    }
}

impl<const N: usize> ToPropValue for &[u64; N] {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        Ok(u64_to_bytes(self))
    }
}

impl ToPropValue for &str {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        str_list_to_bytes(core::slice::from_ref(&self))
    }
}

impl ToPropValue for &String {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        self.as_str().to_prop_value()
    }
}

impl ToPropValue for &[&str] {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        str_list_to_bytes(self)
    }
}

impl<const N: usize> ToPropValue for &[&str; N] {
    fn to_prop_value(self) -> Result<Vec<u8>> {
        str_list_to_bytes(self)
    }
}
