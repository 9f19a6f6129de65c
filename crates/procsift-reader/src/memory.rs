#![forbid(unsafe_code)]

use crate::{ByteSource, ReaderError, ReaderResult};

/// [`ByteSource`] over caller-owned memory.
///
/// Borrows the buffer instead of copying it; the borrow checker enforces
/// that the memory outlives the source. Immutable after construction.
///
/// Unlike file and cache sources, a read starting strictly past the end
/// fails with [`ReaderError::OutOfRange`] rather than returning zero
/// bytes (`offset == len` still yields `Ok(0)`). The asymmetry is part of
/// the contract, not an accident.
#[derive(Clone, Copy, Debug)]
pub struct MemorySource<'a> {
    data: &'a [u8],
}

impl<'a> MemorySource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ByteSource for MemorySource<'_> {
    fn size(&self) -> ReaderResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> ReaderResult<usize> {
        let len = self.data.len() as u64;
        if offset > len {
            return Err(ReaderError::OutOfRange { offset, len });
        }
        let start = offset as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn describe(&self) -> String {
        "in-memory image".to_string()
    }
}
