use std::fmt;
use std::path::Path;

use crate::error::{Result, XarError};
use crate::io::{LocalFileReader, MemoryReader, ReadAt};

use super::parser::read_toc;
use super::structures::{Entry, EntryKind, Header, Toc};

/// An opened XAR archive
///
/// Owns its reader exclusively. Everything is decoded up front by
/// [`open`](Archive::open); afterwards the archive is read-only and only
/// touches the reader again to fetch archived bytes.
pub struct Archive<R: ReadAt> {
    reader: R,
    header: Header,
    toc: Toc,
}

impl<R: ReadAt> fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("header", &self.header)
            .field("toc", &self.toc)
            .finish_non_exhaustive()
    }
}

impl Archive<MemoryReader> {
    /// Open an archive held entirely in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::open(MemoryReader::new(data))
    }
}

impl Archive<LocalFileReader> {
    /// Open an archive stored in a local file.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(LocalFileReader::new(path.as_ref())?)
    }
}

impl<R: ReadAt> Archive<R> {
    /// Decode the header and table of contents from `reader`.
    ///
    /// Either the whole tree decodes or an error is returned; a partially
    /// decoded archive is never handed out.
    pub fn open(reader: R) -> Result<Self> {
        let header = Header::read_from(&reader)?;
        tracing::debug!(
            header_size = header.header_size,
            version = header.version,
            toc_compressed_length = header.toc_compressed_length,
            toc_length = header.toc_length,
            checksum = ?header.checksum_algorithm,
            "header decoded"
        );
        let toc = read_toc(&reader, &header)?;
        Ok(Self {
            reader,
            header,
            toc,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Archive-level TOC metadata (creation time, TOC checksum slot)
    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    /// Top-level entries in document order
    pub fn entries(&self) -> &[Entry] {
        &self.toc.entries
    }

    /// First top-level entry with the given id.
    ///
    /// Nested entries are not searched; use [`walk`](Archive::walk) or
    /// [`find_path`](Archive::find_path) to reach them.
    pub fn find_by_id(&self, id: &str) -> Option<&Entry> {
        self.entries().iter().find(|e| e.id == id)
    }

    /// First top-level entry with the given name. Nested entries are not searched.
    pub fn find_by_name(&self, name: &str) -> Option<&Entry> {
        self.entries().iter().find(|e| e.name == name)
    }

    /// Resolve a `/`-separated path of entry names through the tree.
    pub fn find_path(&self, path: &str) -> Option<&Entry> {
        let mut components = path.split('/').filter(|c| !c.is_empty());
        let first = components.next()?;
        let mut entry = self.find_by_name(first)?;
        for component in components {
            entry = entry
                .contained_entries
                .iter()
                .find(|e| e.name == component)?;
        }
        Some(entry)
    }

    /// Every entry in the tree, depth-first in document order, paired with
    /// its `/`-joined path.
    pub fn walk(&self) -> Vec<(String, &Entry)> {
        fn visit<'a>(prefix: &str, entries: &'a [Entry], out: &mut Vec<(String, &'a Entry)>) {
            for entry in entries {
                let path = if prefix.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{}/{}", prefix, entry.name)
                };
                out.push((path.clone(), entry));
                visit(&path, &entry.contained_entries, out);
            }
        }

        let mut out = Vec::new();
        visit("", self.entries(), &mut out);
        out
    }

    /// Offset that payload offsets are relative to
    pub fn heap_base(&self) -> u64 {
        self.header.heap_base()
    }

    /// Read an entry's archived bytes, still in its declared encoding.
    ///
    /// Directories have no archived data and always fail with
    /// [`XarError::NoPayload`]. A file entry without a `<data>` element is
    /// empty. Each call reads the source again; nothing is cached.
    pub fn read_archived_bytes(&self, entry: &Entry) -> Result<Vec<u8>> {
        if entry.kind == EntryKind::Directory {
            return Err(XarError::NoPayload {
                id: entry.id.clone(),
                name: entry.name.clone(),
            });
        }
        let Some(payload) = &entry.payload else {
            return Ok(Vec::new());
        };

        let base = self.heap_base();
        let range = payload
            .archived_range()
            .and_then(|r| Some(base.checked_add(r.start)?..base.checked_add(r.end)?))
            .ok_or_else(|| {
                XarError::read(
                    payload.offset,
                    payload.length,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "archived range overflows",
                    ),
                )
            })?;
        tracing::trace!(id = %entry.id, start = range.start, end = range.end, "reading archived bytes");
        self.reader.read_range(range)
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Give the reader back, dropping the decoded tree.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
