//! Table-of-contents decoding.
//!
//! The TOC sits right after the fixed header as a zlib stream. Once inflated
//! it is an XML document shaped like:
//!
//! ```xml
//! <xar>
//!   <toc>
//!     <creation-time>2020-10-22T12:00:00Z</creation-time>
//!     <checksum style="sha1"><offset>0</offset><size>20</size></checksum>
//!     <file id="1">
//!       <name>hello.txt</name>
//!       <type>file</type>
//!       <data>
//!         <offset>20</offset><length>42</length><size>42</size>
//!         <encoding style="application/octet-stream"/>
//!       </data>
//!     </file>
//!   </toc>
//! </xar>
//! ```
//!
//! Directories nest further `<file>` elements. Decoding goes through private
//! "raw" records first and is converted into [`Entry`] values afterwards, so
//! numbers and timestamps get validated with proper error context.

use std::io::Read;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use flate2::read::ZlibDecoder;
use serde::Deserialize;

use crate::error::{Result, XarError};
use crate::io::ReadAt;

use super::structures::*;

/// Read, inflate and decode the table of contents described by `header`.
pub fn read_toc<R: ReadAt + ?Sized>(reader: &R, header: &Header) -> Result<Toc> {
    let compressed = reader.read_range(header.toc_range())?;
    let xml = inflate_toc(&compressed, header.toc_length)?;
    tracing::debug!(
        compressed = compressed.len(),
        inflated = xml.len(),
        "table of contents inflated"
    );
    let toc = decode_toc(&xml)?;
    tracing::debug!(entries = toc.entries.len(), "table of contents decoded");
    Ok(toc)
}

/// Inflate a zlib stream that must expand to exactly `expected` bytes.
///
/// The output grows as needed; reading stops one byte past `expected`, which
/// is enough to tell an oversized stream apart without inflating all of it.
pub fn inflate_toc(compressed: &[u8], expected: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(compressed)
        .take(expected.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(XarError::Decompress)?;

    if out.len() as u64 != expected {
        return Err(XarError::TocLengthMismatch {
            expected,
            actual: out.len() as u64,
        });
    }
    Ok(out)
}

/// Decode an inflated TOC document.
pub fn decode_toc(xml: &[u8]) -> Result<Toc> {
    let text = std::str::from_utf8(xml).map_err(|e| XarError::TocXml(e.to_string()))?;
    let doc: RawDocument =
        quick_xml::de::from_str(text).map_err(|e| XarError::TocXml(e.to_string()))?;
    doc.toc.try_into()
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    toc: RawToc,
}

#[derive(Debug, Deserialize)]
struct RawToc {
    #[serde(rename = "creation-time", default)]
    creation_time: Option<String>,
    #[serde(default)]
    checksum: Option<RawTocChecksum>,
    #[serde(rename = "file", default)]
    files: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawTocChecksum {
    #[serde(rename = "@style")]
    style: String,
    offset: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "@id", alias = "id")]
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    gid: Option<String>,
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    ctime: Option<String>,
    #[serde(default)]
    mtime: Option<String>,
    #[serde(default)]
    atime: Option<String>,
    #[serde(default)]
    data: Option<RawData>,
    #[serde(rename = "file", default)]
    children: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    size: String,
    length: String,
    offset: String,
    encoding: RawEncoding,
    #[serde(rename = "archived-checksum", default)]
    archived_checksum: Option<RawDigest>,
    #[serde(rename = "extracted-checksum", default)]
    extracted_checksum: Option<RawDigest>,
}

#[derive(Debug, Deserialize)]
struct RawEncoding {
    #[serde(rename = "@style")]
    style: String,
}

#[derive(Debug, Deserialize)]
struct RawDigest {
    #[serde(rename = "@style")]
    style: String,
    #[serde(rename = "$text", default)]
    value: String,
}

impl TryFrom<RawToc> for Toc {
    type Error = XarError;

    fn try_from(raw: RawToc) -> Result<Self> {
        let creation_time = parse_time("toc", "creation-time", raw.creation_time.as_deref())?;
        let checksum = raw
            .checksum
            .map(|c| -> Result<TocChecksum> {
                Ok(TocChecksum {
                    offset: parse_number("toc", "checksum/offset", &c.offset)?,
                    size: parse_number("toc", "checksum/size", &c.size)?,
                    style: c.style,
                })
            })
            .transpose()?;
        let entries = raw
            .files
            .into_iter()
            .map(Entry::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Toc {
            creation_time,
            checksum,
            entries,
        })
    }
}

impl TryFrom<RawEntry> for Entry {
    type Error = XarError;

    fn try_from(raw: RawEntry) -> Result<Self> {
        let id = raw.id.trim().to_string();
        let kind = match raw.kind.trim() {
            "file" => EntryKind::File,
            "directory" => EntryKind::Directory,
            other => {
                return Err(XarError::UnknownEntryType {
                    id,
                    kind: other.to_string(),
                });
            }
        };

        let payload = match (kind, raw.data) {
            (EntryKind::File, Some(data)) => Some(build_payload(&id, data)?),
            (EntryKind::Directory, Some(_)) => {
                tracing::debug!(%id, "ignoring data element on directory entry");
                None
            }
            (_, None) => None,
        };

        let contained_entries = raw
            .children
            .into_iter()
            .map(Entry::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Entry {
            gid: parse_optional_number(&id, "gid", raw.gid.as_deref())?,
            uid: parse_optional_number(&id, "uid", raw.uid.as_deref())?,
            creation_time: parse_time(&id, "ctime", raw.ctime.as_deref())?,
            modification_time: parse_time(&id, "mtime", raw.mtime.as_deref())?,
            add_time: parse_time(&id, "atime", raw.atime.as_deref())?,
            name: raw.name,
            kind,
            user: raw.user,
            group: raw.group,
            mode: raw.mode.map(|m| m.trim().to_string()),
            payload,
            contained_entries,
            id,
        })
    }
}

fn build_payload(id: &str, data: RawData) -> Result<Payload> {
    Ok(Payload {
        size: parse_number(id, "size", &data.size)?,
        length: parse_number(id, "length", &data.length)?,
        offset: parse_number(id, "offset", &data.offset)?,
        encoding_style: data.encoding.style,
        archived_checksum: data.archived_checksum.map(Digest::from),
        extracted_checksum: data.extracted_checksum.map(Digest::from),
    })
}

impl From<RawDigest> for Digest {
    fn from(raw: RawDigest) -> Self {
        Digest {
            style: raw.style,
            value: raw.value.trim().to_string(),
        }
    }
}

fn parse_number<T: FromStr>(id: &str, field: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| XarError::InvalidNumber {
        id: id.to_string(),
        field,
        value: value.to_string(),
    })
}

fn parse_optional_number<T: FromStr>(
    id: &str,
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<T>> {
    value.map(|v| parse_number(id, field, v)).transpose()
}

/// Strict ISO-8601 (RFC 3339) timestamp; a missing element is `None`.
fn parse_time(id: &str, field: &'static str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| XarError::InvalidTimestamp {
                    id: id.to_string(),
                    field,
                    value: v.to_string(),
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use chrono::TimeZone;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    const NESTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xar>
  <toc>
    <creation-time>2020-10-22T12:00:00Z</creation-time>
    <checksum style="sha1">
      <offset>0</offset>
      <size>20</size>
    </checksum>
    <file id="1">
      <name>docs</name>
      <type>directory</type>
      <mode>0755</mode>
      <uid>501</uid>
      <gid>20</gid>
      <user>ayden</user>
      <group>staff</group>
      <ctime>2020-10-22T12:00:00Z</ctime>
      <mtime>2020-10-22T12:30:00+02:00</mtime>
      <atime>2020-10-22T13:00:00Z</atime>
      <file id="2">
        <name>a.txt</name>
        <type>file</type>
        <data>
          <length>5</length>
          <offset>20</offset>
          <size>5</size>
          <encoding style="application/octet-stream"/>
          <extracted-checksum style="sha1">aabbcc</extracted-checksum>
          <archived-checksum style="sha1">ddeeff</archived-checksum>
        </data>
      </file>
      <file id="3">
        <name>b.txt</name>
        <type>file</type>
        <data>
          <length>7</length>
          <offset>25</offset>
          <size>30</size>
          <encoding style="application/x-gzip"/>
        </data>
      </file>
    </file>
  </toc>
</xar>"#;

    #[test]
    fn decodes_nested_tree() {
        let toc = decode_toc(NESTED.as_bytes()).unwrap();
        assert_eq!(
            toc.checksum,
            Some(TocChecksum {
                style: "sha1".into(),
                offset: 0,
                size: 20
            })
        );
        assert_eq!(
            toc.creation_time,
            Some(Utc.with_ymd_and_hms(2020, 10, 22, 12, 0, 0).unwrap())
        );
        assert_eq!(toc.entries.len(), 1);

        let dir = &toc.entries[0];
        assert_eq!(dir.kind, EntryKind::Directory);
        assert!(dir.payload.is_none());
        assert_eq!(dir.uid, Some(501));
        assert_eq!(dir.gid, Some(20));
        assert_eq!(dir.user.as_deref(), Some("ayden"));
        assert_eq!(dir.mode.as_deref(), Some("0755"));
        assert_eq!(
            dir.modification_time,
            Some(Utc.with_ymd_and_hms(2020, 10, 22, 10, 30, 0).unwrap())
        );

        let names: Vec<_> = dir.contained_entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);

        let a = dir.contained_entries[0].payload.as_ref().unwrap();
        assert_eq!((a.offset, a.length, a.size), (20, 5, 5));
        assert_eq!(a.extracted_checksum.as_ref().unwrap().value, "aabbcc");
        assert_eq!(a.archived_checksum.as_ref().unwrap().value, "ddeeff");

        let b = dir.contained_entries[1].payload.as_ref().unwrap();
        assert_eq!(b.encoding_style, "application/x-gzip");
        assert_eq!(b.size, 30);
    }

    #[test]
    fn accepts_id_as_child_element() {
        let xml = r#"<xar><toc><file><id>7</id><name>x</name><type>file</type></file></toc></xar>"#;
        let toc = decode_toc(xml.as_bytes()).unwrap();
        assert_eq!(toc.entries[0].id, "7");
        assert!(toc.entries[0].payload.is_none());
    }

    #[test]
    fn unknown_elements_are_ignored() {
        let xml = r#"<xar><toc><file id="1"><name>x</name><type>file</type><inode>42</inode><FinderCreateTime><nanoseconds>0</nanoseconds></FinderCreateTime></file></toc></xar>"#;
        assert!(decode_toc(xml.as_bytes()).is_ok());
    }

    #[test]
    fn invalid_timestamp_fails_whole_decode() {
        let xml = r#"<xar><toc><file id="1"><name>ok</name><type>file</type></file><file id="2"><name>x</name><type>file</type><mtime>yesterday</mtime></file></toc></xar>"#;
        let err = decode_toc(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, XarError::InvalidTimestamp { field: "mtime", .. }));
        assert_eq!(err.category(), ErrorCategory::TocCorruption);
    }

    #[test]
    fn timestamp_without_offset_is_rejected() {
        let xml = r#"<xar><toc><file id="1"><name>x</name><type>file</type><ctime>2020-10-22T12:00:00</ctime></file></toc></xar>"#;
        assert!(matches!(
            decode_toc(xml.as_bytes()),
            Err(XarError::InvalidTimestamp { field: "ctime", .. })
        ));
    }

    #[test]
    fn unknown_entry_type_fails() {
        let xml = r#"<xar><toc><file id="9"><name>l</name><type>symlink</type></file></toc></xar>"#;
        assert!(matches!(
            decode_toc(xml.as_bytes()),
            Err(XarError::UnknownEntryType { ref kind, .. }) if kind == "symlink"
        ));
    }

    #[test]
    fn bad_payload_number_fails() {
        let xml = r#"<xar><toc><file id="1"><name>x</name><type>file</type><data><length>-1</length><offset>0</offset><size>1</size><encoding style="application/octet-stream"/></data></file></toc></xar>"#;
        assert!(matches!(
            decode_toc(xml.as_bytes()),
            Err(XarError::InvalidNumber { field: "length", .. })
        ));
    }

    #[test]
    fn missing_name_fails() {
        let xml = r#"<xar><toc><file id="1"><type>file</type></file></toc></xar>"#;
        assert!(matches!(decode_toc(xml.as_bytes()), Err(XarError::TocXml(_))));
    }

    #[test]
    fn malformed_xml_fails() {
        assert!(matches!(
            decode_toc(b"<xar><toc><file id=\"1\">"),
            Err(XarError::TocXml(_))
        ));
        assert!(matches!(decode_toc(&[0xff, 0xfe]), Err(XarError::TocXml(_))));
    }

    #[test]
    fn inflate_checks_exact_length() {
        let compressed = deflate(NESTED.as_bytes());
        let len = NESTED.len() as u64;
        assert_eq!(inflate_toc(&compressed, len).unwrap(), NESTED.as_bytes());

        assert!(matches!(
            inflate_toc(&compressed, len + 1),
            Err(XarError::TocLengthMismatch { actual, .. }) if actual == len
        ));
        assert!(matches!(
            inflate_toc(&compressed, len - 1),
            Err(XarError::TocLengthMismatch { actual, .. }) if actual == len
        ));
    }

    #[test]
    fn inflate_rejects_garbage() {
        let err = inflate_toc(b"definitely not zlib", 10).unwrap_err();
        assert!(matches!(err, XarError::Decompress(_)));
    }
}
