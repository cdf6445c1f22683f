//! OpenType / WOFF2 parsing logic.

use core::{fmt, ops};
use std::{fs, path::Path};

use serde::{Serialize, Serializer};

pub(crate) use self::{
    cmap::{CmapTable, SegmentDeltas, SegmentWithDelta, SegmentedCoverage, SequentialMapGroup},
    glyph::Glyph,
    woff2::{ARBITRARY_TAG_INDEX, KNOWN_TAGS},
};
pub use self::{
    cmap::{CharMap, CharacterMap},
    glyph::{BoundingBox, GlyphGeometry, GlyphSampler},
    name::NameStrings,
};
use self::cmap::CmapEncodings;
use crate::{
    errors::{Error, ParseErrorKind},
    ParseError,
};

mod cmap;
mod glyph;
mod layout;
mod name;
mod woff2;

/// Big-endian reader over a slice of font data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    pub(crate) bytes: &'a [u8],
    /// Offset of `bytes` relative to the start of the font data.
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub(crate) fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            offset: self.offset,
            table: None,
        }
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), ParseError> {
        if self.bytes.len() < len {
            return Err(self.err(ParseErrorKind::UnexpectedEof));
        }
        self.bytes = &self.bytes[len..];
        self.offset += len;
        Ok(())
    }

    pub(crate) fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let Some((head, tail)) = self.bytes.split_first_chunk::<N>() else {
            return Err(self.err(ParseErrorKind::UnexpectedEof));
        };
        self.bytes = tail;
        self.offset += N;
        Ok(*head)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, ParseError> {
        self.read_byte_array::<1>().map(|[byte]| byte)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.read_byte_array().map(u16::from_be_bytes)
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16, ParseError> {
        self.read_byte_array().map(i16::from_be_bytes)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.read_byte_array().map(u32::from_be_bytes)
    }

    pub(crate) fn read_u16_checked<T>(
        &mut self,
        check: impl FnOnce(u16) -> Result<T, ParseErrorKind>,
    ) -> Result<T, ParseError> {
        let prev = *self;
        let value = self.read_u16()?;
        check(value).map_err(|kind| prev.err(kind))
    }

    pub(crate) fn read_u32_checked<T>(
        &mut self,
        check: impl FnOnce(u32) -> Result<T, ParseErrorKind>,
    ) -> Result<T, ParseError> {
        let prev = *self;
        let value = self.read_u32()?;
        check(value).map_err(|kind| prev.err(kind))
    }

    /// Returns a cursor over the specified range of the remaining bytes.
    pub(crate) fn range(&self, range: ops::Range<usize>) -> Result<Self, ParseError> {
        let bytes = self.bytes.get(range.clone()).ok_or_else(|| {
            self.err(ParseErrorKind::RangeOutOfBounds {
                range: range.clone(),
                len: self.bytes.len(),
            })
        })?;
        Ok(Self {
            bytes,
            offset: self.offset + range.start,
        })
    }

    /// Returns a cursor starting at `offset` from the current position.
    pub(crate) fn at(&self, offset: usize) -> Result<Self, ParseError> {
        if offset > self.bytes.len() {
            return Err(self.err(ParseErrorKind::OffsetOutOfBounds(offset)));
        }
        self.range(offset..self.bytes.len())
    }

    /// Splits off the first `len` bytes, advancing this cursor past them.
    pub(crate) fn split_at(&mut self, len: usize) -> Result<Self, ParseError> {
        let head = self.range(0..len)?;
        self.skip(len)?;
        Ok(head)
    }
}

/// OpenType table tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableTag(pub(crate) [u8; 4]);

impl fmt::Debug for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "TableTag({self})")
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(formatter, "{}", char::from(byte))?;
            } else {
                write!(formatter, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for TableTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[allow(missing_docs)] // self-explanatory
impl TableTag {
    pub const CMAP: Self = Self(*b"cmap");
    pub const HEAD: Self = Self(*b"head");
    pub const HHEA: Self = Self(*b"hhea");
    pub const HMTX: Self = Self(*b"hmtx");
    pub const MAXP: Self = Self(*b"maxp");
    pub const NAME: Self = Self(*b"name");
    pub const OS2: Self = Self(*b"OS/2");
    pub const POST: Self = Self(*b"post");
    pub const CVT: Self = Self(*b"cvt ");
    pub const FPGM: Self = Self(*b"fpgm");
    pub const GLYF: Self = Self(*b"glyf");
    pub const LOCA: Self = Self(*b"loca");
    pub const PREP: Self = Self(*b"prep");
    pub const CFF: Self = Self(*b"CFF ");
    pub const CFF2: Self = Self(*b"CFF2");
    pub const GDEF: Self = Self(*b"GDEF");
    pub const GPOS: Self = Self(*b"GPOS");
    pub const GSUB: Self = Self(*b"GSUB");
    pub const BASE: Self = Self(*b"BASE");
    pub const JSTF: Self = Self(*b"JSTF");
    pub const COLR: Self = Self(*b"COLR");
    pub const CPAL: Self = Self(*b"CPAL");
    pub const CBDT: Self = Self(*b"CBDT");
    pub const CBLC: Self = Self(*b"CBLC");
    pub const SBIX: Self = Self(*b"sbix");
    pub const SVG: Self = Self(*b"SVG ");
    pub const DSIG: Self = Self(*b"DSIG");

    /// Creates a tag from its bytes.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Returns the tag bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

/// Table from the font directory. `data` is `None` if the table is stored with a WOFF2 transform.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawTable<'a> {
    pub(crate) tag: TableTag,
    pub(crate) data: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Copy)]
struct HheaTable {
    number_of_h_metrics: u16,
}

impl HheaTable {
    const EXPECTED_LEN: usize = 36; // 18 big-endian words

    fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        if raw.len() != Self::EXPECTED_LEN {
            return Err(ParseError::new(ParseErrorKind::UnexpectedTableLen {
                expected: Self::EXPECTED_LEN,
                actual: raw.len(),
            }));
        }
        let mut cursor = Cursor::new(raw);
        cursor.skip(Self::EXPECTED_LEN - 2)?;
        Ok(Self {
            number_of_h_metrics: cursor.read_u16()?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HmtxTable<'a> {
    raw: &'a [u8],
    number_of_h_metrics: u16,
}

impl HmtxTable<'_> {
    pub(crate) fn advance(&self, glyph_idx: u16) -> Result<u16, ParseError> {
        // Glyphs past `number_of_h_metrics` share the last advance.
        let metric_idx = glyph_idx.min(self.number_of_h_metrics.saturating_sub(1));
        let mut cursor = Cursor::new(self.raw);
        cursor.skip(usize::from(metric_idx) * 4)?;
        cursor.read_u16()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocaFormat {
    Short,
    Long,
}

impl LocaFormat {
    const fn bytes_per_offset(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Long => 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LocaTable<'a> {
    format: LocaFormat,
    bytes: &'a [u8],
}

impl<'a> LocaTable<'a> {
    fn new(format: LocaFormat, glyph_count: u16, bytes: &'a [u8]) -> Result<Self, ParseError> {
        let expected_len = format.bytes_per_offset() * (usize::from(glyph_count) + 1);
        // Some fonts pad `loca`; only a shorter table is an error.
        if bytes.len() < expected_len {
            return Err(ParseError::new(ParseErrorKind::UnexpectedTableLen {
                expected: expected_len,
                actual: bytes.len(),
            }));
        }
        Ok(Self { format, bytes })
    }

    fn glyph_range(&self, glyph_idx: u16) -> Result<ops::Range<usize>, ParseError> {
        let mut cursor = Cursor::new(self.bytes);
        cursor.skip(usize::from(glyph_idx) * self.format.bytes_per_offset())?;
        Ok(match self.format {
            LocaFormat::Short => {
                let start_offset = usize::from(cursor.read_u16()?) * 2;
                let end_offset = usize::from(cursor.read_u16()?) * 2;
                start_offset..end_offset
            }
            LocaFormat::Long => {
                let start_offset = cursor.read_u32()? as usize;
                let end_offset = cursor.read_u32()? as usize;
                start_offset..end_offset
            }
        })
    }
}

/// TrueType outlines (`loca` + `glyf`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct GlyphTable<'a> {
    loca: LocaTable<'a>,
    glyf: &'a [u8],
    glyph_count: u16,
}

impl<'a> GlyphTable<'a> {
    /// Returns raw bytes of the glyph with the specified index.
    pub(crate) fn raw_glyph(&self, glyph_idx: u16) -> Result<&'a [u8], ParseError> {
        if glyph_idx >= self.glyph_count {
            return Err(ParseError::new(ParseErrorKind::GlyphOutOfBounds(glyph_idx))
                .with_table(TableTag::LOCA));
        }
        let range = self
            .loca
            .glyph_range(glyph_idx)
            .map_err(|err| err.with_table(TableTag::LOCA))?;
        if range.start > range.end {
            return Err(ParseError::new(ParseErrorKind::RangeOutOfBounds {
                range,
                len: self.glyf.len(),
            })
            .with_table(TableTag::GLYF));
        }
        let len = self.glyf.len();
        self.glyf.get(range.clone()).ok_or_else(|| {
            ParseError::new(ParseErrorKind::RangeOutOfBounds { range, len }).with_table(TableTag::GLYF)
        })
    }

    pub(crate) fn glyph(&self, glyph_idx: u16) -> Result<Glyph<'a>, ParseError> {
        let raw = self.raw_glyph(glyph_idx)?;
        Glyph::new(Cursor::new(raw)).map_err(|err| err.with_table(TableTag::GLYF))
    }
}

/// Glyph outline flavor of a font.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Outlines<'a> {
    TrueType(GlyphTable<'a>),
    /// `CFF ` or `CFF2` outlines, which are passed through as is.
    Cff,
    /// `glyf` / `loca` stored with a WOFF2 transform.
    Transformed,
    Missing,
}

/// Hints from the `OS/2` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Os2Hints {
    panose_family_type: Option<u8>,
    x_height: Option<i16>,
}

impl Os2Hints {
    const PANOSE_OFFSET: usize = 32;
    const X_HEIGHT_OFFSET: usize = 86;

    fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(raw);
        let version = cursor.read_u16()?;
        let panose_family_type = raw.get(Self::PANOSE_OFFSET).copied();
        let x_height = if version >= 2 {
            let mut cursor = Cursor::new(raw);
            cursor.skip(Self::X_HEIGHT_OFFSET)?;
            Some(cursor.read_i16()?)
        } else {
            None
        };
        Ok(Self {
            panose_family_type,
            x_height,
        })
    }
}

/// Container format of a [`FontFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFormat {
    /// Plain sfnt (TrueType or OpenType).
    Sfnt,
    /// WOFF 2.0.
    Woff2,
}

/// Font file loaded into memory.
#[derive(Debug)]
pub struct FontFile {
    raw: Vec<u8>,
    woff2: Option<woff2::Woff2Data>,
}

impl FontFile {
    /// Wraps font bytes, decompressing WOFF2 data if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the WOFF2 container is malformed.
    pub fn new(raw: Vec<u8>) -> Result<Self, ParseError> {
        let woff2 = if raw.starts_with(&woff2::SIGNATURE) {
            Some(woff2::Woff2Data::new(&raw)?)
        } else {
            None
        };
        Ok(Self { raw, woff2 })
    }

    /// Reads a font file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its container is malformed.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let raw = fs::read(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        log::debug!("read {} bytes from {}", raw.len(), path.display());
        Ok(Self::new(raw)?)
    }

    /// Returns the container format.
    pub fn format(&self) -> FontFormat {
        if self.woff2.is_some() {
            FontFormat::Woff2
        } else {
            FontFormat::Sfnt
        }
    }

    /// Parses the font.
    ///
    /// # Errors
    ///
    /// Returns an error if the font data is corrupt or unsupported.
    pub fn font(&self) -> Result<Font<'_>, ParseError> {
        match &self.woff2 {
            Some(woff2) => Font::from_tables(woff2.flavor, woff2.tables().collect()),
            None => Font::new(&self.raw),
        }
    }
}

/// Tables of a font, sorted by tag.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables<'a>(Vec<RawTable<'a>>);

impl<'a> Tables<'a> {
    fn new(mut tables: Vec<RawTable<'a>>) -> Self {
        tables.sort_unstable_by_key(|table| table.tag);
        Self(tables)
    }

    /// Looks up a table. The outer `Option` is `None` if the table is absent; the inner one
    /// if its data is not readable because of a WOFF2 transform.
    pub(crate) fn get(&self, tag: TableTag) -> Option<Option<&'a [u8]>> {
        let idx = self.0.binary_search_by_key(&tag, |table| table.tag).ok()?;
        Some(self.0[idx].data)
    }

    fn required(&self, tag: TableTag) -> Result<&'a [u8], ParseError> {
        match self.get(tag) {
            None => Err(ParseError::missing_table(tag)),
            Some(None) => Err(ParseError::transformed_table(tag)),
            Some(Some(data)) => Ok(data),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = RawTable<'a>> + '_ {
        self.0.iter().copied()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Parsed OpenType font.
#[derive(Debug)]
pub struct Font<'a> {
    pub(crate) flavor: u32,
    pub(crate) tables: Tables<'a>,
    pub(crate) head: &'a [u8],
    units_per_em: u16,
    glyph_count: u16,
    hmtx: Option<HmtxTable<'a>>,
    pub(crate) outlines: Outlines<'a>,
    cmap_encodings: CmapEncodings,
    char_map: CharMap,
    os2: Os2Hints,
}

impl<'a> Font<'a> {
    pub(crate) const SFNT_VERSION: u32 = 0x_0001_0000;
    const OPENTYPE_VERSION: u32 = u32::from_be_bytes(*b"OTTO");
    const APPLE_VERSION: u32 = u32::from_be_bytes(*b"true");
    pub(crate) const HEAD_CHECKSUM_OFFSET: usize = 8;
    pub(crate) const SFNT_CHECKSUM: u32 = 0x_b1b0_afba;

    /// Parses an sfnt font (TrueType or OpenType).
    ///
    /// # Errors
    ///
    /// Returns an error if the font data is corrupt or unsupported (e.g., a font collection).
    pub fn new(bytes: &'a [u8]) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(bytes);
        let flavor = cursor.read_u32_checked(|version| match version {
            Self::SFNT_VERSION | Self::OPENTYPE_VERSION | Self::APPLE_VERSION => Ok(version),
            _ => Err(ParseErrorKind::UnexpectedFontVersion(version)),
        })?;
        let table_count = cursor.read_u16()?;
        cursor.skip(6)?; // searchRange, entrySelector, rangeShift

        let font_cursor = Cursor::new(bytes);
        let tables = (0..table_count).map(|_| {
            let tag = TableTag(cursor.read_byte_array()?);
            cursor.skip(4)?; // checksum
            let offset = cursor.read_u32()? as usize;
            let len = cursor.read_u32()? as usize;
            let data = font_cursor
                .range(offset..offset.saturating_add(len))
                .map_err(|err| err.with_table(tag))?;
            Ok(RawTable {
                tag,
                data: Some(data.bytes),
            })
        });
        let tables = tables.collect::<Result<_, ParseError>>()?;
        Self::from_tables(flavor, tables)
    }

    pub(crate) fn from_tables(flavor: u32, tables: Vec<RawTable<'a>>) -> Result<Self, ParseError> {
        let tables = Tables::new(tables);

        let head = tables.required(TableTag::HEAD)?;
        let (units_per_em, loca_format) =
            Self::parse_head(head).map_err(|err| err.with_table(TableTag::HEAD))?;
        let maxp = tables.required(TableTag::MAXP)?;
        let glyph_count =
            Self::parse_glyph_count(maxp).map_err(|err| err.with_table(TableTag::MAXP))?;
        let hmtx = Self::parse_hmtx(&tables)?;
        let outlines = Self::parse_outlines(&tables, loca_format, glyph_count)?;

        let cmap = tables.required(TableTag::CMAP)?;
        let (cmap, cmap_encodings) =
            CmapTable::parse(Cursor::new(cmap)).map_err(|err| err.with_table(TableTag::CMAP))?;
        let char_map = cmap
            .mappings()
            .into_iter()
            .filter(|&(_, glyph_id)| glyph_id < glyph_count)
            .collect::<CharMap>();
        let os2 = match tables.get(TableTag::OS2) {
            Some(Some(raw)) => Os2Hints::parse(raw).map_err(|err| err.with_table(TableTag::OS2))?,
            _ => Os2Hints::default(),
        };

        log::debug!(
            "parsed font with {} tables, {glyph_count} glyphs, {} mapped codepoints",
            tables.len(),
            char_map.len()
        );
        Ok(Self {
            flavor,
            tables,
            head,
            units_per_em,
            glyph_count,
            hmtx,
            outlines,
            cmap_encodings,
            char_map,
            os2,
        })
    }

    fn parse_head(raw: &[u8]) -> Result<(u16, LocaFormat), ParseError> {
        let mut cursor = Cursor::new(raw);
        cursor.read_u32_checked(|version| {
            if version == 0x_0001_0000 {
                Ok(())
            } else {
                Err(ParseErrorKind::UnexpectedTableVersion { version })
            }
        })?;
        cursor.skip(14)?; // fontRevision, checksumAdjustment, magicNumber, flags
        let units_per_em = cursor.read_u16()?;
        cursor.skip(30)?;
        // ^ created, modified, bounding box, macStyle, lowestRecPPEM, fontDirectionHint

        let format_cursor = cursor;
        let loca_format = match cursor.read_i16()? {
            0 => LocaFormat::Short,
            1 => LocaFormat::Long,
            other => return Err(format_cursor.err(ParseErrorKind::UnexpectedLocaFormat(other))),
        };
        Ok((units_per_em, loca_format))
    }

    fn parse_glyph_count(raw: &[u8]) -> Result<u16, ParseError> {
        let mut cursor = Cursor::new(raw);
        cursor.read_u32_checked(|version| {
            if version == 0x_0000_5000 || version == 0x_0001_0000 {
                Ok(())
            } else {
                Err(ParseErrorKind::UnexpectedTableVersion { version })
            }
        })?;
        cursor.read_u16()
    }

    fn parse_hmtx(tables: &Tables<'a>) -> Result<Option<HmtxTable<'a>>, ParseError> {
        let Some(Some(hhea)) = tables.get(TableTag::HHEA) else {
            return Ok(None);
        };
        let hhea = HheaTable::parse(hhea).map_err(|err| err.with_table(TableTag::HHEA))?;
        let Some(Some(raw)) = tables.get(TableTag::HMTX) else {
            return Ok(None);
        };
        Ok(Some(HmtxTable {
            raw,
            number_of_h_metrics: hhea.number_of_h_metrics,
        }))
    }

    fn parse_outlines(
        tables: &Tables<'a>,
        loca_format: LocaFormat,
        glyph_count: u16,
    ) -> Result<Outlines<'a>, ParseError> {
        if tables.get(TableTag::CFF).is_some() || tables.get(TableTag::CFF2).is_some() {
            return Ok(Outlines::Cff);
        }
        Ok(match (tables.get(TableTag::LOCA), tables.get(TableTag::GLYF)) {
            (Some(Some(loca)), Some(Some(glyf))) => {
                let loca = LocaTable::new(loca_format, glyph_count, loca)
                    .map_err(|err| err.with_table(TableTag::LOCA))?;
                Outlines::TrueType(GlyphTable {
                    loca,
                    glyf,
                    glyph_count,
                })
            }
            (Some(None), _) | (_, Some(None)) => Outlines::Transformed,
            _ => Outlines::Missing,
        })
    }

    /// Returns the number of glyphs in the font.
    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// Returns the number of font units per em.
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Returns tags of all tables in the font, in ascending order.
    pub fn table_tags(&self) -> impl Iterator<Item = TableTag> + '_ {
        self.tables.iter().map(|table| table.tag)
    }

    /// Checks whether the font contains the specified table.
    pub fn has_table(&self, tag: TableTag) -> bool {
        self.tables.get(tag).is_some()
    }

    /// Returns the character map of the font.
    pub fn char_map(&self) -> &CharMap {
        &self.char_map
    }

    /// Checks whether the `cmap` table has a Windows Symbol (3, 0) encoding record.
    pub fn has_symbol_cmap(&self) -> bool {
        self.cmap_encodings.has_symbol_encoding
    }

    /// Checks whether the `cmap` table has a many-to-one range mappings (format 13) subtable.
    pub fn has_many_to_one_cmap(&self) -> bool {
        self.cmap_encodings.has_many_to_one
    }

    /// Returns the PANOSE family type (`bFamilyType`) from the `OS/2` table.
    pub fn panose_family_type(&self) -> Option<u8> {
        self.os2.panose_family_type
    }

    /// Returns the x-height from the `OS/2` table (version 2 and above).
    pub fn x_height(&self) -> Option<i16> {
        self.os2.x_height
    }

    /// Returns the advance width of the specified glyph.
    ///
    /// # Errors
    ///
    /// Returns an error if horizontal metrics are missing or corrupt.
    pub fn advance(&self, glyph_idx: u16) -> Result<u16, ParseError> {
        let hmtx = match self.tables.get(TableTag::HMTX) {
            Some(None) => return Err(ParseError::transformed_table(TableTag::HMTX)),
            _ => self.hmtx.ok_or_else(|| ParseError::missing_table(TableTag::HMTX))?,
        };
        hmtx.advance(glyph_idx)
            .map_err(|err| err.with_table(TableTag::HMTX))
    }

    pub(crate) fn glyph_table(&self) -> Result<&GlyphTable<'a>, ParseError> {
        match &self.outlines {
            Outlines::TrueType(table) => Ok(table),
            Outlines::Transformed => Err(ParseError::transformed_table(TableTag::GLYF)),
            Outlines::Cff | Outlines::Missing => Err(ParseError::missing_table(TableTag::GLYF)),
        }
    }

    pub(crate) fn checksum(data: &[u8]) -> u32 {
        data.chunks(4).fold(0_u32, |acc, chunk| {
            let mut word = [0_u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            acc.wrapping_add(u32::from_be_bytes(word))
        })
    }
}
