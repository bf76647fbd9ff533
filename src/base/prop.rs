use crate::base::parse::ParsedProp;
use crate::error::Result;
use crate::prelude::*;

impl<'dt> PropReader<'dt> for ParsedProp<'dt> {
    #[inline]
    fn propbuf(&self) -> &'dt [u8] {
        self.prop_buf
    }

    #[inline]
    fn name(&self) -> Result<&'dt str> {
        Ok(self.name)
    }
}
