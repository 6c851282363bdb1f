//! XAR archive parsing.
//!
//! ## Architecture
//!
//! - [`structures`]: header layout and the typed entry tree
//! - [`parser`]: table-of-contents inflation and XML decoding
//! - [`archive`]: the [`Archive`] facade used by callers
//!
//! ## XAR Format Overview
//!
//! A XAR file consists of:
//! 1. A fixed big-endian header (`xar!` magic, sizes, checksum algorithm)
//! 2. A zlib-compressed XML table of contents describing the file tree
//! 3. A heap holding each file's archived bytes
//!
//! Payload offsets in the table of contents are relative to the heap base,
//! which this reader takes to be the declared header size.
//!
//! ## Limitations
//!
//! - Read only
//! - Archived bytes are returned as stored; decoding them per their
//!   `encoding` style is left to the caller
//! - Checksums are exposed but never verified

mod archive;
mod parser;
mod structures;

pub use archive::Archive;
pub use parser::{decode_toc, inflate_toc, read_toc};
pub use structures::*;
