//! Serialization of [`FontSubset`]s as sfnt (TrueType / OpenType) and WOFF2 fonts.

use core::ops;

use crate::{
    font::{
        CmapTable, LocaFormat, SegmentDeltas, SegmentWithDelta, SegmentedCoverage,
        SequentialMapGroup, ARBITRARY_TAG_INDEX, KNOWN_TAGS,
    },
    subset::SubsetTable,
    Font, FontSubset, TableTag,
};

mod brotli;

/// Big-endian serialization into a byte buffer.
trait BufferExt {
    fn put_u16(&mut self, value: u16);
    fn put_u32(&mut self, value: u32);
    /// Pads the buffer with zeros to a multiple of 4 bytes.
    fn align4(&mut self);
}

impl BufferExt for Vec<u8> {
    fn put_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn align4(&mut self) {
        let padded_len = self.len().next_multiple_of(4);
        self.resize(padded_len, 0);
    }
}

/// Binary search hints shared by the sfnt table directory and `cmap` format 4 segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchHints {
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl SearchHints {
    /// Computes hints for `count` entries of `entry_len` bytes each. `count` must be positive.
    #[allow(clippy::cast_possible_truncation)] // `ilog2()` of a `u16` is less than 16
    fn new(count: u16, entry_len: u16) -> Self {
        let entry_selector = count.ilog2();
        let search_range = entry_len << entry_selector;
        Self {
            search_range,
            entry_selector: entry_selector as u16,
            range_shift: count * entry_len - search_range,
        }
    }

    fn write(self, buffer: &mut Vec<u8>) {
        buffer.put_u16(self.search_range);
        buffer.put_u16(self.entry_selector);
        buffer.put_u16(self.range_shift);
    }
}

/// Length of the `UIntBase128` encoding of `value`.
fn base128_len(value: u32) -> usize {
    if value == 0 {
        1
    } else {
        value.ilog2() as usize / 7 + 1
    }
}

#[allow(clippy::cast_possible_truncation)] // values are masked to 7 bits
fn write_base128(buffer: &mut Vec<u8>, value: u32) {
    for shift in (1..base128_len(value)).rev() {
        let byte = ((value >> (7 * shift)) & 0x7f) as u8;
        buffer.push(0x80 | byte);
    }
    buffer.push((value & 0x7f) as u8);
}

/// Groups sorted `(codepoint, glyph_id)` mappings into runs with consecutive codepoints
/// and glyph IDs.
fn sequential_groups(mappings: &[(u32, u16)]) -> Vec<SequentialMapGroup> {
    let mut groups: Vec<SequentialMapGroup> = vec![];
    for &(cp, glyph_id) in mappings {
        if let Some(last) = groups.last_mut() {
            if cp == last.end_char_code + 1 && u32::from(glyph_id) == last.map_unchecked(cp) {
                last.end_char_code = cp;
                continue;
            }
        }
        groups.push(SequentialMapGroup {
            start_char_code: cp,
            end_char_code: cp,
            start_glyph_id: glyph_id.into(),
        });
    }
    groups
}

impl CmapTable<'static> {
    /// Segments available to format 4 besides the terminating `0xFFFF` segment.
    const MAX_FORMAT4_SEGMENTS: usize = (0xffff - 16) / 8;

    /// Builds the subtable for sorted subset `mappings`: format 4 if all codepoints are
    /// in the BMP and the segments fit, otherwise format 12.
    fn for_mappings(mappings: &[(u32, u16)]) -> Self {
        let groups = sequential_groups(mappings);
        let in_bmp = mappings.last().is_none_or(|&(cp, _)| cp < 0xffff);
        if !in_bmp || groups.len() >= Self::MAX_FORMAT4_SEGMENTS {
            return Self::Coverage(SegmentedCoverage { groups });
        }

        let mut segments: Vec<_> = groups
            .iter()
            .map(|group| {
                // Truncation is impossible due to the BMP check above.
                #[allow(clippy::cast_possible_truncation)]
                let (start_code, end_code, start_glyph) = (
                    group.start_char_code as u16,
                    group.end_char_code as u16,
                    group.start_glyph_id as u16,
                );
                SegmentWithDelta {
                    start_code,
                    end_code,
                    id_delta: start_glyph.wrapping_sub(start_code),
                    id_range_offset: 0,
                }
            })
            .collect();
        // Terminating segment mapping 0xFFFF to .notdef
        segments.push(SegmentWithDelta {
            start_code: 0xffff,
            end_code: 0xffff,
            id_delta: 1,
            id_range_offset: 0,
        });
        Self::Deltas(SegmentDeltas {
            segments,
            glyph_id_array: &[],
        })
    }
}

impl CmapTable<'_> {
    /// Version, record count and two encoding records.
    const HEADER_LEN: u32 = 4 + 2 * 8;

    /// Writes the table with Unicode and Windows encoding records sharing the subtable.
    fn write(&self, buffer: &mut Vec<u8>) {
        let (unicode_encoding, windows_encoding) = match self {
            Self::Deltas(_) => (3, 1),
            Self::Coverage(_) | Self::ManyToOne(_) => (4, 10),
        };
        buffer.put_u16(0); // version
        buffer.put_u16(2); // numTables
        for (platform_id, encoding_id) in [
            (Self::UNICODE_PLATFORM, unicode_encoding),
            (Self::WINDOWS_PLATFORM, windows_encoding),
        ] {
            buffer.put_u16(platform_id);
            buffer.put_u16(encoding_id);
            buffer.put_u32(Self::HEADER_LEN);
        }

        match self {
            Self::Deltas(deltas) => deltas.write(buffer),
            Self::Coverage(coverage) => coverage.write(buffer, 12),
            Self::ManyToOne(coverage) => coverage.write(buffer, 13),
        }
    }
}

impl SegmentDeltas<'_> {
    fn write(&self, buffer: &mut Vec<u8>) {
        // Segment count is bounded by `MAX_FORMAT4_SEGMENTS`.
        let segment_count = u16::try_from(self.segments.len()).unwrap_or(u16::MAX);
        let len = 16 + 8 * usize::from(segment_count) + self.glyph_id_array.len();

        buffer.put_u16(4); // format
        buffer.put_u16(u16::try_from(len).unwrap_or(u16::MAX));
        buffer.put_u16(0); // language
        buffer.put_u16(2 * segment_count);
        SearchHints::new(segment_count, 2).write(buffer);

        let columns: [fn(&SegmentWithDelta) -> u16; 4] = [
            |segment| segment.end_code,
            |segment| segment.start_code,
            |segment| segment.id_delta,
            |segment| segment.id_range_offset,
        ];
        for (i, column) in columns.into_iter().enumerate() {
            if i == 1 {
                buffer.put_u16(0); // reservedPad
            }
            for segment in &self.segments {
                buffer.put_u16(column(segment));
            }
        }
        buffer.extend_from_slice(self.glyph_id_array);
    }
}

impl SegmentedCoverage {
    fn write(&self, buffer: &mut Vec<u8>, format: u16) {
        // Groups are bounded by the number of Unicode codepoints.
        let group_count = u32::try_from(self.groups.len()).unwrap_or(u32::MAX);
        buffer.put_u16(format);
        buffer.put_u16(0); // reserved
        buffer.put_u32(16 + 12 * group_count);
        buffer.put_u32(0); // language
        buffer.put_u32(group_count);
        for group in &self.groups {
            buffer.put_u32(group.start_char_code);
            buffer.put_u32(group.end_char_code);
            buffer.put_u32(group.start_glyph_id);
        }
    }
}

/// Writes a version 0 `name` table without records.
fn write_empty_name_table(buffer: &mut Vec<u8>) {
    buffer.put_u16(0); // version
    buffer.put_u16(0); // count
    buffer.put_u16(6); // storageOffset
}

/// Concatenates glyph data, padding each glyph to an even length. Returns `glyph_count + 1`
/// glyph offsets.
fn write_glyf_table(glyphs: &[&[u8]], buffer: &mut Vec<u8>) -> Vec<usize> {
    let start = buffer.len();
    let mut offsets = vec![0];
    for glyph in glyphs {
        buffer.extend_from_slice(glyph);
        if glyph.len() % 2 == 1 {
            buffer.push(0);
        }
        offsets.push(buffer.len() - start);
    }
    offsets
}

/// Writes `loca` in the short format if all offsets fit, otherwise in the long one.
fn write_loca_table(offsets: &[usize], buffer: &mut Vec<u8>) -> LocaFormat {
    let short_offsets: Option<Vec<u16>> = offsets
        .iter()
        .map(|&offset| {
            if offset % 2 == 0 {
                u16::try_from(offset / 2).ok()
            } else {
                None
            }
        })
        .collect();

    if let Some(short_offsets) = short_offsets {
        for offset in short_offsets {
            buffer.put_u16(offset);
        }
        LocaFormat::Short
    } else {
        for &offset in offsets {
            // `glyf` data originates from a font, so its length fits into `u32`
            buffer.put_u32(u32::try_from(offset).unwrap_or(u32::MAX));
        }
        LocaFormat::Long
    }
}

/// Copies `head` with a zeroed checksum adjustment and, if specified, a new `loca` format.
fn write_head_table(original: &[u8], loca_format: Option<LocaFormat>, buffer: &mut Vec<u8>) {
    const LOCA_FORMAT_OFFSET: usize = 50;

    let start = buffer.len();
    buffer.extend_from_slice(original);
    let checksum_start = start + Font::HEAD_CHECKSUM_OFFSET;
    buffer[checksum_start..checksum_start + 4].fill(0);
    if let Some(format) = loca_format {
        let value: i16 = match format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        };
        let offset = start + LOCA_FORMAT_OFFSET;
        buffer[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    }
}

impl FontSubset<'_> {
    /// Serializes this subset as an sfnt font with the flavor of the original font.
    pub fn to_opentype(&self) -> Vec<u8> {
        self.to_writer().into_opentype()
    }

    /// Serializes this subset as a WOFF2 font. Tables are stored with null transforms.
    pub fn to_woff2(&self) -> Vec<u8> {
        self.to_writer().into_woff2()
    }

    fn to_writer(&self) -> FontWriter {
        let mut writer = FontWriter::new(self.font.flavor);
        for &(tag, source) in &self.tables {
            match source {
                SubsetTable::Cmap => {
                    let cmap = CmapTable::for_mappings(&self.char_map);
                    writer.add_table(tag, |buffer| cmap.write(buffer));
                }
                SubsetTable::EmptyName => writer.add_table(tag, write_empty_name_table),
                SubsetTable::Raw(data) => {
                    writer.add_table(tag, |buffer| buffer.extend_from_slice(data));
                }
                // Written after other tables
                SubsetTable::Glyf | SubsetTable::Loca | SubsetTable::Head => {}
            }
        }

        // WOFF2 requires `loca` to immediately follow `glyf`.
        let loca_format = self.glyph_data.as_ref().map(|glyphs| {
            let offsets =
                writer.add_table(TableTag::GLYF, |buffer| write_glyf_table(glyphs, buffer));
            writer.add_table(TableTag::LOCA, |buffer| write_loca_table(&offsets, buffer))
        });
        writer.add_table(TableTag::HEAD, |buffer| {
            write_head_table(self.font.head, loca_format, buffer);
        });
        writer
    }
}

/// Entry of the table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableRecord {
    tag: TableTag,
    checksum: u32,
    /// Offset relative to the start of table data; always 4-byte aligned.
    offset: u32,
    length: u32,
}

impl TableRecord {
    const SFNT_LEN: u16 = 16;
    /// Transform version 3 for `glyf` / `loca`, i.e. no transform.
    const GLYPH_NULL_TRANSFORM: u8 = 0b_1100_0000;

    fn data_range(&self) -> ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.length as usize
    }

    fn write_sfnt(&self, data_offset: u32, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(self.tag.as_bytes());
        buffer.put_u32(self.checksum);
        buffer.put_u32(data_offset + self.offset);
        buffer.put_u32(self.length);
    }

    fn known_tag_index(&self) -> Option<u8> {
        let idx = KNOWN_TAGS.iter().position(|&tag| tag == self.tag)?;
        u8::try_from(idx).ok()
    }

    fn woff2_len(&self) -> usize {
        let tag_len = if self.known_tag_index().is_some() { 0 } else { 4 };
        1 + tag_len + base128_len(self.length)
    }

    fn write_woff2(&self, buffer: &mut Vec<u8>) {
        let transform = if matches!(self.tag, TableTag::GLYF | TableTag::LOCA) {
            Self::GLYPH_NULL_TRANSFORM
        } else {
            0
        };
        match self.known_tag_index() {
            Some(idx) => buffer.push(idx | transform),
            None => {
                buffer.push(ARBITRARY_TAG_INDEX | transform);
                buffer.extend_from_slice(self.tag.as_bytes());
            }
        }
        write_base128(buffer, self.length);
    }
}

/// Fixed-size WOFF2 header. Metadata and private blocks are never written.
#[derive(Debug)]
struct Woff2Header {
    flavor: u32,
    file_len: u32,
    table_count: u16,
    total_sfnt_size: u32,
    compressed_len: u32,
}

impl Woff2Header {
    const LEN: usize = 48;
    const SIGNATURE: u32 = u32::from_be_bytes(*b"wOF2");

    fn write(&self, buffer: &mut Vec<u8>) {
        buffer.put_u32(Self::SIGNATURE);
        buffer.put_u32(self.flavor);
        buffer.put_u32(self.file_len);
        buffer.put_u16(self.table_count);
        buffer.put_u16(0); // reserved
        buffer.put_u32(self.total_sfnt_size);
        buffer.put_u32(self.compressed_len);
        // majorVersion, minorVersion, metaOffset, metaLength, metaOrigLength,
        // privOffset, privLength
        buffer.extend_from_slice(&[0; 24]);
    }
}

/// Accumulates tables in write order and assembles them into a font file.
#[derive(Debug, Clone)]
struct FontWriter {
    flavor: u32,
    /// Records in write order, which is also the order of table data.
    tables: Vec<TableRecord>,
    /// Table data, each table padded to 4 bytes.
    table_data: Vec<u8>,
}

impl FontWriter {
    const SFNT_HEADER_LEN: usize = 12;

    fn new(flavor: u32) -> Self {
        Self {
            flavor,
            tables: vec![],
            table_data: vec![],
        }
    }

    fn add_table<T>(&mut self, tag: TableTag, write: impl FnOnce(&mut Vec<u8>) -> T) -> T {
        let start = self.table_data.len();
        let output = write(&mut self.table_data);
        let length = self.table_data.len() - start;
        self.table_data.align4();

        // Offsets and lengths are bounded by the source font.
        self.tables.push(TableRecord {
            tag,
            checksum: Font::checksum(&self.table_data[start..]),
            offset: u32::try_from(start).unwrap_or(u32::MAX),
            length: u32::try_from(length).unwrap_or(u32::MAX),
        });
        output
    }

    fn table_count(&self) -> u16 {
        // The number of tables is bounded by the source font.
        u16::try_from(self.tables.len()).unwrap_or(u16::MAX)
    }

    fn data_offset(&self) -> u32 {
        let directory_len = Self::SFNT_HEADER_LEN
            + self.tables.len() * usize::from(TableRecord::SFNT_LEN);
        u32::try_from(directory_len).unwrap_or(u32::MAX)
    }

    /// Writes the sfnt header and table directory, with records sorted by tag.
    fn write_sfnt_directory(&self, buffer: &mut Vec<u8>) {
        buffer.put_u32(self.flavor);
        buffer.put_u16(self.table_count());
        SearchHints::new(self.table_count(), TableRecord::SFNT_LEN).write(buffer);

        let mut records = self.tables.clone();
        records.sort_unstable_by_key(|record| record.tag);
        let data_offset = self.data_offset();
        for record in &records {
            record.write_sfnt(data_offset, buffer);
        }
    }

    /// Sets `head.checksumAdjustment` so that the assembled sfnt font sums up to
    /// [`Font::SFNT_CHECKSUM`].
    fn set_checksum_adjustment(&mut self) {
        let mut directory = vec![];
        self.write_sfnt_directory(&mut directory);
        let checksum = self
            .tables
            .iter()
            .fold(Font::checksum(&directory), |acc, record| {
                acc.wrapping_add(record.checksum)
            });
        let adjustment = Font::SFNT_CHECKSUM.wrapping_sub(checksum);

        let head = self.tables.iter().find(|record| record.tag == TableTag::HEAD);
        if let Some(head) = head {
            let start = head.offset as usize + Font::HEAD_CHECKSUM_OFFSET;
            self.table_data[start..start + 4].copy_from_slice(&adjustment.to_be_bytes());
        }
    }

    fn into_opentype(mut self) -> Vec<u8> {
        self.set_checksum_adjustment();
        let mut buffer = vec![];
        self.write_sfnt_directory(&mut buffer);
        buffer.extend_from_slice(&self.table_data);
        buffer
    }

    fn into_woff2(mut self) -> Vec<u8> {
        self.set_checksum_adjustment();
        let compressed = self.compress_table_data();
        let directory_len: usize = self.tables.iter().map(TableRecord::woff2_len).sum();
        let file_len = (Woff2Header::LEN + directory_len + compressed.len()).next_multiple_of(4);
        let sfnt_size = self.data_offset() as usize + self.table_data.len();

        // Sizes are bounded by the source font.
        let header = Woff2Header {
            flavor: self.flavor,
            file_len: u32::try_from(file_len).unwrap_or(u32::MAX),
            table_count: self.table_count(),
            total_sfnt_size: u32::try_from(sfnt_size).unwrap_or(u32::MAX),
            compressed_len: u32::try_from(compressed.len()).unwrap_or(u32::MAX),
        };

        let mut buffer = Vec::with_capacity(file_len);
        header.write(&mut buffer);
        debug_assert_eq!(buffer.len(), Woff2Header::LEN);
        for record in &self.tables {
            record.write_woff2(&mut buffer);
        }
        buffer.extend_from_slice(&compressed);
        buffer.align4();
        debug_assert_eq!(buffer.len(), file_len);
        buffer
    }
}
