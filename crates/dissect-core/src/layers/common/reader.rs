use std::ops::Range;

use crate::layers::error::DecodeError;

/// Checked reads over a borrowed byte buffer.
///
/// Every accessor validates the requested range against the buffer length
/// and returns [`DecodeError::Truncated`] instead of indexing out of range.
/// Returned slices borrow from the original buffer.
///
/// # Examples
/// ```
/// use dissect_core::{ByteReader, DecodeError};
///
/// let reader = ByteReader::new(&[0x08, 0x06, 0x01]);
/// assert_eq!(reader.read_u16_be(0), Ok(0x0806));
/// assert_eq!(
///     reader.read_u16_be(2),
///     Err(DecodeError::Truncated { needed: 4, actual: 3 })
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn require_len(&self, needed: usize) -> Result<(), DecodeError> {
        if self.data.len() < needed {
            return Err(self.truncated(needed));
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, DecodeError> {
        self.data
            .get(offset)
            .copied()
            .ok_or_else(|| self.truncated(offset.saturating_add(1)))
    }

    /// Big-endian `u16` at `offset..offset + 2`.
    pub fn read_u16_be(&self, offset: usize) -> Result<u16, DecodeError> {
        let end = offset.saturating_add(2);
        match self.data.get(offset..end) {
            Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
            _ => Err(self.truncated(end)),
        }
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], DecodeError> {
        let needed = range.end.max(range.start);
        self.data
            .get(range)
            .ok_or_else(|| self.truncated(needed))
    }

    /// Split the buffer into `[..offset]` and `[offset..]`.
    pub fn split_at(&self, offset: usize) -> Result<(&'a [u8], &'a [u8]), DecodeError> {
        self.require_len(offset)?;
        Ok(self.data.split_at(offset))
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::Truncated {
            needed,
            actual: self.data.len(),
        }
    }
}
