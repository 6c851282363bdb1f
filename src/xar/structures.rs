use std::ops::Range;

use chrono::{DateTime, Utc};

use crate::error::{Result, XarError};
use crate::io::{BigEndianField, ReadAt, read_field};

/// Checksum algorithms a XAR header can declare
///
/// Only recorded; this crate never computes or verifies digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    None,
    Sha1,
    Md5,
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(ChecksumAlgorithm::None),
            1 => Ok(ChecksumAlgorithm::Sha1),
            2 => Ok(ChecksumAlgorithm::Md5),
            3 => Ok(ChecksumAlgorithm::Sha256),
            4 => Ok(ChecksumAlgorithm::Sha512),
            _ => Err(XarError::UnknownChecksumAlgorithm(value)),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            ChecksumAlgorithm::None => 0,
            ChecksumAlgorithm::Sha1 => 1,
            ChecksumAlgorithm::Md5 => 2,
            ChecksumAlgorithm::Sha256 => 3,
            ChecksumAlgorithm::Sha512 => 4,
        }
    }

    /// Length in bytes of a digest produced by this algorithm
    pub fn digest_len(&self) -> usize {
        match self {
            ChecksumAlgorithm::None => 0,
            ChecksumAlgorithm::Sha1 => 20,
            ChecksumAlgorithm::Md5 => 16,
            ChecksumAlgorithm::Sha256 => 32,
            ChecksumAlgorithm::Sha512 => 64,
        }
    }
}

/// XAR fixed header - 28 bytes minimum
///
/// ```text
/// offset  width  field
///      0      4  magic "xar!"
///      4      2  header_size
///      6      2  version
///      8      8  toc_compressed_length
///     16      8  toc_length
///     24      4  checksum_algorithm
/// ```
///
/// All multi-byte fields are big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub header_size: u16,
    pub version: u16,
    pub toc_compressed_length: u64,
    pub toc_length: u64,
    pub checksum_algorithm: ChecksumAlgorithm,
}

impl Header {
    pub const MAGIC: &'static [u8; 4] = b"xar!";
    pub const MIN_SIZE: usize = 28;

    const HEADER_SIZE_OFFSET: u64 = 4;
    const VERSION_OFFSET: u64 = 6;
    const TOC_COMPRESSED_OFFSET: u64 = 8;
    const TOC_LENGTH_OFFSET: u64 = 16;
    const CHECKSUM_OFFSET: u64 = 24;

    /// Read and decode the header from the start of `reader`.
    ///
    /// The fixed prefix is fetched with a single range read and decoded from
    /// memory.
    pub fn read_from<R: ReadAt + ?Sized>(reader: &R) -> Result<Self> {
        let prefix = reader
            .read_range(0..Self::MIN_SIZE as u64)
            .map_err(|e| XarError::MalformedHeader(format!("header unreadable: {e}")))?;
        Self::from_bytes(&prefix)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(XarError::MalformedHeader(format!(
                "need {} bytes, found {}",
                Self::MIN_SIZE,
                data.len()
            )));
        }

        let magic: [u8; 4] = [data[0], data[1], data[2], data[3]];
        if &magic != Self::MAGIC {
            return Err(XarError::BadMagic(magic));
        }

        let header_size: u16 = field(data, "header_size", Self::HEADER_SIZE_OFFSET)?;
        if (header_size as usize) < Self::MIN_SIZE {
            return Err(XarError::MalformedHeader(format!(
                "declared header size {header_size} is smaller than {}",
                Self::MIN_SIZE
            )));
        }

        let raw_checksum: u32 = field(data, "checksum_algorithm", Self::CHECKSUM_OFFSET)?;

        Ok(Self {
            header_size,
            version: field(data, "version", Self::VERSION_OFFSET)?,
            toc_compressed_length: field(
                data,
                "toc_compressed_length",
                Self::TOC_COMPRESSED_OFFSET,
            )?,
            toc_length: field(data, "toc_length", Self::TOC_LENGTH_OFFSET)?,
            checksum_algorithm: ChecksumAlgorithm::from_u32(raw_checksum)?,
        })
    }

    /// Byte range of the compressed table of contents
    pub fn toc_range(&self) -> Range<u64> {
        let start = self.header_size as u64;
        start..start.saturating_add(self.toc_compressed_length)
    }

    /// Base offset that entry payload offsets are relative to
    pub fn heap_base(&self) -> u64 {
        self.header_size as u64
    }
}

fn field<T: BigEndianField>(data: &[u8], name: &str, offset: u64) -> Result<T> {
    read_field(data, offset)
        .map_err(|e| XarError::MalformedHeader(format!("field {name} unreadable: {e}")))
}

/// Kind of a table-of-contents entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// A digest recorded in the table of contents, e.g. `<archived-checksum>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub style: String,
    pub value: String,
}

/// Location and encoding of an entry's archived bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// The full size of the file once decoded
    pub size: u64,
    /// The archived length of this file's data inside the heap
    pub length: u64,
    /// Offset of the archived data, relative to the heap base
    pub offset: u64,
    /// MIME-like label of the codec applied to the archived bytes
    pub encoding_style: String,
    pub archived_checksum: Option<Digest>,
    pub extracted_checksum: Option<Digest>,
}

impl Payload {
    /// Heap-relative byte range of the archived data
    pub fn archived_range(&self) -> Option<Range<u64>> {
        Some(self.offset..self.offset.checked_add(self.length)?)
    }
}

/// One file or directory from the table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    pub gid: Option<i64>,
    pub uid: Option<i64>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub mode: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub modification_time: Option<DateTime<Utc>>,
    pub add_time: Option<DateTime<Utc>>,
    /// Always `None` for directories
    pub payload: Option<Payload>,
    pub contained_entries: Vec<Entry>,
}

impl Entry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// The table of contents' own checksum slot inside the heap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocChecksum {
    pub style: String,
    pub offset: u64,
    pub size: u64,
}

/// Archive-level metadata decoded alongside the entry tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toc {
    pub creation_time: Option<DateTime<Utc>>,
    pub checksum: Option<TocChecksum>,
    pub entries: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn header_bytes(header_size: u16, checksum: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"xar!");
        data.extend_from_slice(&header_size.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&57u64.to_be_bytes());
        data.extend_from_slice(&120u64.to_be_bytes());
        data.extend_from_slice(&checksum.to_be_bytes());
        data
    }

    #[test]
    fn decodes_fixed_fields() {
        let header = Header::from_bytes(&header_bytes(28, 0)).unwrap();
        assert_eq!(
            header,
            Header {
                header_size: 28,
                version: 1,
                toc_compressed_length: 57,
                toc_length: 120,
                checksum_algorithm: ChecksumAlgorithm::None,
            }
        );
        assert_eq!(header.toc_range(), 28..85);
        assert_eq!(header.heap_base(), 28);
    }

    #[test]
    fn fixed_prefix_is_28_bytes() {
        assert_eq!(Header::MIN_SIZE, 28);
        assert_eq!(Header::MIN_SIZE, header_bytes(28, 0).len());
    }

    #[test]
    fn reads_through_reader() {
        let mut data = header_bytes(28, 1);
        data.extend_from_slice(b"trailing");
        let header = Header::read_from(data.as_slice()).unwrap();
        assert_eq!(header.checksum_algorithm, ChecksumAlgorithm::Sha1);
    }

    #[test]
    fn unknown_checksum_algorithm_fails() {
        let err = Header::from_bytes(&header_bytes(28, 99)).unwrap_err();
        assert!(matches!(err, XarError::UnknownChecksumAlgorithm(99)));
        assert_eq!(err.category(), ErrorCategory::MalformedHeader);
    }

    #[test]
    fn bad_magic_fails() {
        let mut data = header_bytes(28, 0);
        data[..4].copy_from_slice(b"PK\x03\x04");
        assert!(matches!(
            Header::from_bytes(&data),
            Err(XarError::BadMagic(m)) if &m == b"PK\x03\x04"
        ));
    }

    #[test]
    fn truncated_header_fails() {
        let data = header_bytes(28, 0);
        let err = Header::read_from(&data[..20]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedHeader);
    }

    #[test]
    fn undersized_declared_header_fails() {
        assert!(matches!(
            Header::from_bytes(&header_bytes(12, 0)),
            Err(XarError::MalformedHeader(_))
        ));
    }

    #[test]
    fn checksum_values_round_trip() {
        for raw in 0..=4 {
            let algo = ChecksumAlgorithm::from_u32(raw).unwrap();
            assert_eq!(algo.as_u32(), raw);
        }
        assert_eq!(ChecksumAlgorithm::Sha256.digest_len(), 32);
    }

    #[test]
    fn archived_range_detects_overflow() {
        let payload = Payload {
            size: 1,
            length: 2,
            offset: u64::MAX,
            encoding_style: "application/octet-stream".into(),
            archived_checksum: None,
            extracted_checksum: None,
        };
        assert!(payload.archived_range().is_none());
    }
}
