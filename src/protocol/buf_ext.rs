use bytes::{Buf, Bytes};

use super::error::DecodeError;

/// Bounds-checked reads over a payload. Every read either succeeds or
/// reports a truncated frame; none of them panic.
pub(crate) trait BufExt: Buf {
    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(DecodeError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    fn checked_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        Ok(self.get_u8())
    }

    fn checked_u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        Ok(self.get_u16())
    }

    /// Consumes everything left in the payload.
    fn rest(&mut self) -> Bytes {
        self.copy_to_bytes(self.remaining())
    }

    fn rest_string(&mut self) -> Result<String, DecodeError> {
        let raw = self.rest();
        String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }
}

impl<T: Buf> BufExt for T {}
