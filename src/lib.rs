//! # runxar
//!
//! A Rust XAR archive reader with HTTP URL support using Range requests.
//!
//! This library opens XAR containers from memory, the local filesystem or a
//! remote HTTP server, decodes the compressed XML table of contents into a
//! typed entry tree, and hands out the raw archived bytes of any file entry.
//! For remote files it uses HTTP Range requests, so only the header, the
//! table of contents and the requested payloads are downloaded.
//!
//! ## Features
//!
//! - Big-endian header decoding with magic and checksum-algorithm validation
//! - zlib table-of-contents inflation with exact length checking
//! - Recursive decoding of nested directory entries
//! - Random access to archived payload bytes (still encoded)
//!
//! ## Example
//!
//! ```no_run
//! use runxar::Archive;
//!
//! fn main() -> anyhow::Result<()> {
//!     let archive = Archive::open_path("package.xar")?;
//!
//!     for (path, entry) in archive.walk() {
//!         println!("{} ({})", path, entry.kind.as_str());
//!     }
//!
//!     if let Some(entry) = archive.find_by_name("hello.txt") {
//!         let archived = archive.read_archived_bytes(entry)?;
//!         println!("{} archived bytes", archived.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod xar;

pub use cli::Cli;
pub use error::{ErrorCategory, Result, XarError};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use xar::{Archive, ChecksumAlgorithm, Entry, EntryKind, Header, Payload};
