use super::ReadAt;
use crate::error::Result;

/// In-memory reader over an owned buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Borrow the whole underlying buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for MemoryReader {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl ReadAt for MemoryReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.data.as_slice().read_at(offset, buf)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_within_buffer() {
        let reader = MemoryReader::from(b"hello world".to_vec());
        assert_eq!(reader.size(), 11);
        assert_eq!(reader.read_range(6..11).unwrap(), b"world");
    }

    #[test]
    fn out_of_range_fails() {
        let reader = MemoryReader::new(vec![1, 2, 3]);
        assert!(reader.read_range(2..4).is_err());
        let mut buf = [0u8; 1];
        assert!(reader.read_at(3, &mut buf).is_err());
    }
}
