//! Low level flattened device tree parsing functions.
//!

use core::mem::size_of;

use num_traits::FromPrimitive;

use crate::base::DevTree;
use crate::error::{DevTreeError, Result};
use crate::priv_util::SliceRead;
use crate::spec::{fdt_prop_header, FdtTok};
use crate::util::align_up;

use fallible_iterator::FallibleIterator;

/// This function implements the logic to tokenize the device tree's main structure block.
///
/// This function will return the next [`ParsedTok`] if one exists. If it succeeds in parsing
/// a token, `off` will be incremented to the start of the next token within the structure block.
///
/// `off` is relative to the start of the structure block. `Ok(None)` is returned on an `END`
/// token and once `off` reaches the end of the block, so a walk can never leave the block.
/// Token values not defined by the format fail with [`DevTreeError::MalformedToken`].
pub fn next_devtree_token<'dt>(fdt: &DevTree<'dt>, off: &mut usize) -> Result<Option<ParsedTok<'dt>>> {
    let buf = fdt.struct_block();
    if *off >= buf.len() {
        return Ok(None);
    }

    let fdt_tok_val = buf.read_be_u32(*off)?;
    *off += size_of::<u32>();

    match FromPrimitive::from_u32(fdt_tok_val) {
        Some(FdtTok::BeginNode) => {
            // Read the name (or return an error if the device tree is incorrectly formatted).
            let name = fdt.node_name_at(*off)?;

            // Move to the end of name (adding null byte), then align back to u32.
            *off = align_up(*off + name.len() + 1, size_of::<u32>());

            Ok(Some(ParsedTok::BeginNode(ParsedBeginNode { name })))
        }
        Some(FdtTok::Prop) => {
            let prop_len = buf.read_be_u32(*off + offset_of!(fdt_prop_header, len))? as usize;
            let name_offset =
                buf.read_be_u32(*off + offset_of!(fdt_prop_header, nameoff))? as usize;

            // Move offset past prop header
            *off += size_of::<fdt_prop_header>();
            let end = off.checked_add(prop_len).ok_or(DevTreeError::Truncated)?;
            let prop_buf = buf.get(*off..end).ok_or(DevTreeError::Truncated)?;

            // Move the offset past the prop data and align back to u32.
            *off = align_up(end, size_of::<u32>());

            let name = fdt.string_at(name_offset)?;

            Ok(Some(ParsedTok::Prop(ParsedProp {
                name,
                name_offset,
                prop_buf,
            })))
        }
        Some(FdtTok::EndNode) => Ok(Some(ParsedTok::EndNode)),
        Some(FdtTok::Nop) => Ok(Some(ParsedTok::Nop)),
        Some(FdtTok::End) => Ok(None),
        None => Err(DevTreeError::MalformedToken(fdt_tok_val)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBeginNode<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProp<'a> {
    /// Name resolved through the strings block.
    pub name: &'a str,
    /// Offset of the name within the strings block.
    pub name_offset: usize,
    /// The property value, exactly as long as the property header declares.
    pub prop_buf: &'a [u8],
}

/// Enumeration of all tokens within a device tree's structure block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTok<'a> {
    BeginNode(ParsedBeginNode<'a>),
    EndNode,
    Prop(ParsedProp<'a>),
    Nop,
}

/// Walks the structure block token by token.
///
/// Once the walk ends (an `END` token, the end of the block, or an error), every further call
/// returns `Ok(None)`.
pub struct DevTreeParseIter<'r, 'dt: 'r> {
    pub offset: usize,
    pub fdt: &'r DevTree<'dt>,
    done: bool,
    end_token: bool,
}

impl<'r, 'dt: 'r> DevTreeParseIter<'r, 'dt> {
    pub(crate) fn new(fdt: &'r DevTree<'dt>) -> Self {
        Self {
            offset: 0,
            fdt,
            done: false,
            end_token: false,
        }
    }

    /// Whether the walk stopped on an explicit `END` token rather than running off the block.
    pub fn reached_end_token(&self) -> bool {
        self.end_token
    }
}

impl<'r, 'dt: 'r> FallibleIterator for DevTreeParseIter<'r, 'dt> {
    type Error = DevTreeError;
    type Item = ParsedTok<'dt>;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }
        let start = self.offset;
        let res = next_devtree_token(self.fdt, &mut self.offset);
        match res {
            Ok(Some(tok)) => {
                log::trace!("fdt token at {:#x}: {:?}", start, tok);
                Ok(Some(tok))
            }
            Ok(None) => {
                self.done = true;
                self.end_token = start < self.fdt.struct_block().len();
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }
}
