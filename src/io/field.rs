//! Fixed-width big-endian field decoding on top of [`ReadAt`].

use byteorder::{BigEndian, ByteOrder};

use super::ReadAt;
use crate::error::Result;

/// An unsigned integer stored big-endian at a fixed width.
pub trait BigEndianField: Sized {
    /// Width of the field in bytes.
    const WIDTH: usize;

    /// Decode from exactly [`WIDTH`](BigEndianField::WIDTH) big-endian bytes.
    fn from_be_slice(bytes: &[u8]) -> Self;
}

impl BigEndianField for u8 {
    const WIDTH: usize = 1;

    fn from_be_slice(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl BigEndianField for u16 {
    const WIDTH: usize = 2;

    fn from_be_slice(bytes: &[u8]) -> Self {
        BigEndian::read_u16(bytes)
    }
}

impl BigEndianField for u32 {
    const WIDTH: usize = 4;

    fn from_be_slice(bytes: &[u8]) -> Self {
        BigEndian::read_u32(bytes)
    }
}

impl BigEndianField for u64 {
    const WIDTH: usize = 8;

    fn from_be_slice(bytes: &[u8]) -> Self {
        BigEndian::read_u64(bytes)
    }
}

/// Read a `T` stored big-endian at `offset`.
///
/// Exactly `T::WIDTH` bytes are requested from the reader; the value comes
/// back already converted to host order.
pub fn read_field<T, R>(reader: &R, offset: u64) -> Result<T>
where
    T: BigEndianField,
    R: ReadAt + ?Sized,
{
    let mut buf = [0u8; 8];
    let buf = &mut buf[..T::WIDTH];
    reader.read_at(offset, buf)?;
    Ok(T::from_be_slice(buf))
}
