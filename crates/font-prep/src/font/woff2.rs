//! WOFF2 container decoding.
//!
//! Only tables stored without a transform can be read; transformed tables (normally `glyf`,
//! `loca` and occasionally `hmtx`) are reported as present but unreadable.

use core::ops;
use std::io::Read;

use super::{Cursor, RawTable, TableTag};
use crate::{errors::ParseErrorKind, ParseError};

pub(super) const SIGNATURE: [u8; 4] = *b"wOF2";
const COLLECTION_FLAVOR: u32 = u32::from_be_bytes(*b"ttcf");
/// Index in the table directory flags signaling an explicit tag.
pub(crate) const ARBITRARY_TAG_INDEX: u8 = 63;

/// Tags with a compact encoding in the WOFF2 table directory.
pub(crate) const KNOWN_TAGS: [TableTag; 63] = [
    TableTag(*b"cmap"),
    TableTag(*b"head"),
    TableTag(*b"hhea"),
    TableTag(*b"hmtx"),
    TableTag(*b"maxp"),
    TableTag(*b"name"),
    TableTag(*b"OS/2"),
    TableTag(*b"post"),
    TableTag(*b"cvt "),
    TableTag(*b"fpgm"),
    TableTag(*b"glyf"),
    TableTag(*b"loca"),
    TableTag(*b"prep"),
    TableTag(*b"CFF "),
    TableTag(*b"VORG"),
    TableTag(*b"EBDT"),
    TableTag(*b"EBLC"),
    TableTag(*b"gasp"),
    TableTag(*b"hdmx"),
    TableTag(*b"kern"),
    TableTag(*b"LTSH"),
    TableTag(*b"PCLT"),
    TableTag(*b"VDMX"),
    TableTag(*b"vhea"),
    TableTag(*b"vmtx"),
    TableTag(*b"BASE"),
    TableTag(*b"GDEF"),
    TableTag(*b"GPOS"),
    TableTag(*b"GSUB"),
    TableTag(*b"EBSC"),
    TableTag(*b"JSTF"),
    TableTag(*b"MATH"),
    TableTag(*b"CBDT"),
    TableTag(*b"CBLC"),
    TableTag(*b"COLR"),
    TableTag(*b"CPAL"),
    TableTag(*b"SVG "),
    TableTag(*b"sbix"),
    TableTag(*b"acnt"),
    TableTag(*b"avar"),
    TableTag(*b"bdat"),
    TableTag(*b"bloc"),
    TableTag(*b"bsln"),
    TableTag(*b"cvar"),
    TableTag(*b"fdsc"),
    TableTag(*b"feat"),
    TableTag(*b"fmtx"),
    TableTag(*b"fvar"),
    TableTag(*b"gvar"),
    TableTag(*b"hsty"),
    TableTag(*b"just"),
    TableTag(*b"lcar"),
    TableTag(*b"mort"),
    TableTag(*b"morx"),
    TableTag(*b"opbd"),
    TableTag(*b"prop"),
    TableTag(*b"trak"),
    TableTag(*b"Zapf"),
    TableTag(*b"Silf"),
    TableTag(*b"Glat"),
    TableTag(*b"Gloc"),
    TableTag(*b"Feat"),
    TableTag(*b"Sill"),
];

fn read_uint_base128(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    let mut value = 0_u32;
    for i in 0..5 {
        let prev = *cursor;
        let byte = cursor.read_u8()?;
        // Leading zeros and values overflowing u32 are forbidden.
        if (i == 0 && byte == 0x80) || value >> 25 != 0 {
            return Err(prev.err(ParseErrorKind::InvalidBase128));
        }
        value = (value << 7) | u32::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(cursor.err(ParseErrorKind::InvalidBase128))
}

#[derive(Debug)]
struct DirectoryEntry {
    tag: TableTag,
    transformed: bool,
    /// Range in the decompressed table stream.
    range: ops::Range<usize>,
}

/// Decompressed WOFF2 table data.
#[derive(Debug)]
pub(super) struct Woff2Data {
    pub(super) flavor: u32,
    entries: Vec<DirectoryEntry>,
    data: Vec<u8>,
}

impl Woff2Data {
    const NULL_TRANSFORM_FOR_GLYPHS: u8 = 3;

    pub(super) fn new(raw: &[u8]) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(raw);
        cursor.skip(4)?; // signature
        let flavor = cursor.read_u32_checked(|flavor| {
            if flavor == COLLECTION_FLAVOR {
                Err(ParseErrorKind::UnexpectedFontVersion(flavor))
            } else {
                Ok(flavor)
            }
        })?;
        cursor.skip(4)?; // length
        let table_count = cursor.read_u16()?;
        cursor.skip(6)?; // reserved, totalSfntSize
        let compressed_len = cursor.read_u32()? as usize;
        cursor.skip(24)?; // version, metadata and private blocks

        let mut stream_len = 0_usize;
        let mut entries = Vec::with_capacity(table_count.into());
        for _ in 0..table_count {
            let flags = cursor.read_u8()?;
            let tag_idx = flags & 0x3f;
            let tag = if tag_idx == ARBITRARY_TAG_INDEX {
                TableTag(cursor.read_byte_array()?)
            } else {
                KNOWN_TAGS[usize::from(tag_idx)]
            };
            let transform_version = flags >> 6;
            let orig_len = read_uint_base128(&mut cursor)?;
            let transformed = if tag == TableTag::GLYF || tag == TableTag::LOCA {
                transform_version != Self::NULL_TRANSFORM_FOR_GLYPHS
            } else {
                transform_version != 0
            };
            let stored_len = if transformed {
                read_uint_base128(&mut cursor)?
            } else {
                orig_len
            } as usize;

            let start = stream_len;
            stream_len = stream_len.saturating_add(stored_len);
            entries.push(DirectoryEntry {
                tag,
                transformed,
                range: start..stream_len,
            });
        }

        let compressed = cursor.split_at(compressed_len)?;
        let mut data = vec![];
        brotli::Decompressor::new(compressed.bytes, 4_096)
            .read_to_end(&mut data)
            .map_err(|err| compressed.err(ParseErrorKind::Decompression(err.to_string())))?;
        if data.len() < stream_len {
            return Err(ParseError::new(ParseErrorKind::UnexpectedTableLen {
                expected: stream_len,
                actual: data.len(),
            }));
        }

        let transformed_count = entries.iter().filter(|entry| entry.transformed).count();
        if transformed_count > 0 {
            log::warn!("WOFF2 font has {transformed_count} transformed table(s), which cannot be read");
        }
        Ok(Self {
            flavor,
            entries,
            data,
        })
    }

    pub(super) fn tables(&self) -> impl Iterator<Item = RawTable<'_>> + '_ {
        self.entries.iter().map(|entry| RawTable {
            tag: entry.tag,
            data: (!entry.transformed).then(|| &self.data[entry.range.clone()]),
        })
    }
}
