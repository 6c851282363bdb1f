mod field;
mod http;
mod local;
mod memory;

pub use field::{BigEndianField, read_field};
pub use http::{HttpRangeReader, is_http_url};
pub use local::LocalFileReader;
pub use memory::MemoryReader;

use std::io;
use std::ops::Range;

use crate::error::{Result, XarError};

/// Trait for random access reading from a data source
pub trait ReadAt {
    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// A short read is an error; implementations never return partial data.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Read the half-open byte range `range` into a new buffer.
    ///
    /// The range is checked against [`size`](ReadAt::size) before anything is
    /// allocated, so a bogus length from a corrupted header fails cleanly.
    fn read_range(&self, range: Range<u64>) -> Result<Vec<u8>> {
        let Range { start, end } = range;
        let len = end.saturating_sub(start);
        if end < start {
            return Err(XarError::read(
                start,
                0,
                io::Error::new(io::ErrorKind::InvalidInput, "range end precedes start"),
            ));
        }
        if end > self.size() {
            return Err(XarError::read(
                start,
                len,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("range ends at {end}, source holds {} bytes", self.size()),
                ),
            ));
        }
        let len_usize = usize::try_from(len).map_err(|_| {
            XarError::read(
                start,
                len,
                io::Error::new(io::ErrorKind::OutOfMemory, "range too large for this platform"),
            )
        })?;

        tracing::trace!(start, end, "reading range");
        let mut buf = vec![0u8; len_usize];
        self.read_at(start, &mut buf)?;
        Ok(buf)
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let len = buf.len() as u64;
        let slice = usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(buf.len())?))
            .and_then(|range| self.get(range))
            .ok_or_else(|| {
                XarError::read(
                    offset,
                    len,
                    io::Error::new(io::ErrorKind::UnexpectedEof, "range outside buffer"),
                )
            })?;
        buf.copy_from_slice(slice);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}
