use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::ReadAt;
use crate::error::{Result, XarError};

/// Local file reader with random access support
///
/// Every call seeks and reads afresh; nothing is buffered between calls.
#[derive(Debug)]
pub struct LocalFileReader {
    file: File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| XarError::Source(format!("{}: {}", path.display(), e)))?;
        let size = file
            .metadata()
            .map_err(|e| XarError::Source(format!("{}: {}", path.display(), e)))?
            .len();
        Ok(Self { file, size })
    }
}

impl ReadAt for LocalFileReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(buf))
            .map_err(|e| XarError::read(offset, buf.len() as u64, e))
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_ranges_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"abcdefghij").unwrap();
        tmp.flush().unwrap();

        let reader = LocalFileReader::new(tmp.path()).unwrap();
        assert_eq!(reader.size(), 10);
        assert_eq!(reader.read_range(3..6).unwrap(), b"def");
        // Seeking backwards must work just as well.
        assert_eq!(reader.read_range(0..2).unwrap(), b"ab");
    }

    #[test]
    fn short_read_is_a_read_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"abc").unwrap();
        tmp.flush().unwrap();

        let reader = LocalFileReader::new(tmp.path()).unwrap();
        let mut buf = [0u8; 4];
        let err = reader.read_at(1, &mut buf).unwrap_err();
        assert!(matches!(err, XarError::Read { offset: 1, len: 4, .. }));
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFileReader::new(&dir.path().join("absent.xar")).unwrap_err();
        assert!(matches!(err, XarError::Source(_)));
    }
}
