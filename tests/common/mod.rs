//! Builds XAR containers in memory for the integration tests.

#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

pub const HEADER_SIZE: u16 = 28;

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn header(toc_compressed_length: u64, toc_length: u64, checksum: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE as usize);
    out.extend_from_slice(b"xar!");
    out.extend_from_slice(&HEADER_SIZE.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&toc_compressed_length.to_be_bytes());
    out.extend_from_slice(&toc_length.to_be_bytes());
    out.extend_from_slice(&checksum.to_be_bytes());
    out
}

/// Heap-relative offset where [`container`] places its payload bytes.
///
/// Payload offsets count from the header size, so the compressed TOC itself
/// occupies the start of the heap. Parking payloads at a fixed offset keeps
/// the XML independent of the compressed TOC length.
pub const PAYLOAD_BASE: u64 = 1024;

/// Header + compressed TOC + padding + `payloads` at [`PAYLOAD_BASE`].
pub fn container(toc_xml: &str, payloads: &[u8]) -> Vec<u8> {
    let compressed = deflate(toc_xml.as_bytes());
    assert!(compressed.len() as u64 <= PAYLOAD_BASE, "test TOC too large");
    let mut out = header(compressed.len() as u64, toc_xml.len() as u64, 0);
    out.extend_from_slice(&compressed);
    out.resize(HEADER_SIZE as usize + PAYLOAD_BASE as usize, 0);
    out.extend_from_slice(payloads);
    out
}

pub fn file_xml(id: &str, name: &str, offset: u64, length: u64) -> String {
    format!(
        r#"<file id="{id}">
  <name>{name}</name>
  <type>file</type>
  <mode>0644</mode>
  <uid>0</uid>
  <gid>0</gid>
  <user>root</user>
  <group>wheel</group>
  <ctime>2020-10-22T12:00:00Z</ctime>
  <mtime>2020-10-22T12:00:00Z</mtime>
  <atime>2020-10-22T12:00:00Z</atime>
  <data>
    <length>{length}</length>
    <offset>{offset}</offset>
    <size>{length}</size>
    <encoding style="application/octet-stream"/>
  </data>
</file>"#
    )
}

pub fn toc_xml(files: &str) -> String {
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><xar><toc>{files}</toc></xar>"#)
}
