//! `cmap` table processing.

use std::collections::{hash_map, HashMap};

use super::Cursor;
use crate::{errors::ParseErrorKind, range::MAX_CODEPOINT, ParseError};

/// Read-only view of a font's character map.
///
/// Glyph #0 (`.notdef`) means "no glyph", so codepoints mapped to it are never reported.
pub trait CharacterMap {
    /// Returns the glyph mapped to `codepoint`, if any.
    fn glyph_id(&self, codepoint: u32) -> Option<u16>;

    /// Returns all mapped codepoints in ascending order.
    fn codepoints(&self) -> &[u32];

    /// Checks whether `codepoint` has a glyph.
    fn contains(&self, codepoint: u32) -> bool {
        self.glyph_id(codepoint).is_some()
    }

    /// Returns the number of mapped codepoints.
    fn len(&self) -> usize {
        self.codepoints().len()
    }

    /// Checks whether the map is empty.
    fn is_empty(&self) -> bool {
        self.codepoints().is_empty()
    }
}

/// In-memory character map with O(1) lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharMap {
    glyphs: HashMap<u32, u16>,
    codepoints: Vec<u32>,
}

/// Mappings to glyph #0 are skipped; if a codepoint is mapped several times, the first mapping wins.
impl FromIterator<(u32, u16)> for CharMap {
    fn from_iter<I: IntoIterator<Item = (u32, u16)>>(iter: I) -> Self {
        let mut glyphs = HashMap::new();
        for (codepoint, glyph_id) in iter {
            if glyph_id == 0 {
                continue;
            }
            if let hash_map::Entry::Vacant(entry) = glyphs.entry(codepoint) {
                entry.insert(glyph_id);
            }
        }
        let mut codepoints: Vec<_> = glyphs.keys().copied().collect();
        codepoints.sort_unstable();
        Self { glyphs, codepoints }
    }
}

impl CharacterMap for CharMap {
    fn glyph_id(&self, codepoint: u32) -> Option<u16> {
        self.glyphs.get(&codepoint).copied()
    }

    fn codepoints(&self) -> &[u32] {
        &self.codepoints
    }
}

impl CharMap {
    /// Iterates over `(codepoint, glyph_id)` pairs in ascending codepoint order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.codepoints
            .iter()
            .map(|&codepoint| (codepoint, self.glyphs[&codepoint]))
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SegmentWithDelta {
    pub(crate) start_code: u16,
    pub(crate) end_code: u16,
    pub(crate) id_delta: u16,
    pub(crate) id_range_offset: u16,
}

/// Segment mapping to delta values (format 4) subtable of the `cmap` table.
#[derive(Debug, Clone)]
pub(crate) struct SegmentDeltas<'a> {
    pub(crate) segments: Vec<SegmentWithDelta>,
    pub(crate) glyph_id_array: &'a [u8],
}

/// Reads the `format` field of a subtable, checking that it matches `expected`.
fn read_format(cursor: &mut Cursor<'_>, expected: u16) -> Result<(), ParseError> {
    cursor.read_u16_checked(|format| {
        (format == expected)
            .then_some(())
            .ok_or(ParseErrorKind::UnexpectedTableFormat { format })
    })
}

/// Restricts `cursor` to the subtable body given the declared subtable length and
/// the number of header bytes already consumed.
fn restrict_to_subtable<'a>(
    cursor: Cursor<'a>,
    declared_len: usize,
    consumed: usize,
) -> Result<Cursor<'a>, ParseError> {
    let Some(body_len) = declared_len.checked_sub(consumed) else {
        return Err(cursor.err(ParseErrorKind::UnexpectedEof));
    };
    // Some fonts declare a length exceeding the table; clamp it.
    cursor.range(0..body_len.min(cursor.bytes.len()))
}

impl<'a> SegmentDeltas<'a> {
    fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        read_format(&mut cursor, 4)?;
        let declared_len = cursor.read_u16()?;
        let mut body = restrict_to_subtable(cursor, declared_len.into(), 4)?;

        body.skip(2)?; // language
        let segment_count = usize::from(body.read_u16()? / 2);
        body.skip(6)?; // search hints
        // Columns: endCode, reservedPad, startCode, idDelta, idRangeOffset
        let column_len = 2 * segment_count;
        let end_codes = body.split_at(column_len)?;
        body.skip(2)?;
        let mut columns = [
            end_codes,
            body.split_at(column_len)?,
            body.split_at(column_len)?,
            body.split_at(column_len)?,
        ];

        let mut segments = Vec::with_capacity(segment_count);
        for _ in 0..segment_count {
            let [end_code, start_code, id_delta, id_range_offset] =
                columns.each_mut().map(Cursor::read_u16);
            segments.push(SegmentWithDelta {
                start_code: start_code?,
                end_code: end_code?,
                id_delta: id_delta?,
                id_range_offset: id_range_offset?,
            });
        }
        Ok(Self {
            segments,
            glyph_id_array: body.bytes,
        })
    }

    fn map_code(&self, segment_idx: usize, code: u16) -> Option<u16> {
        let segment = &self.segments[segment_idx];
        if segment.id_range_offset == 0 {
            return Some(segment.id_delta.wrapping_add(code));
        }

        // Offset is counted from the start of `idRangeOffsets`
        let mut byte_offset = 2 * segment_idx;
        byte_offset += usize::from(segment.id_range_offset);
        byte_offset += 2 * usize::from(code - segment.start_code);
        // Shift the offset to count from the start of `glyphIdArray`
        let byte_offset = byte_offset.checked_sub(2 * self.segments.len())?;
        let glyph_id_bytes = self.glyph_id_array.get(byte_offset..byte_offset + 2)?;
        let glyph_id = u16::from_be_bytes([glyph_id_bytes[0], glyph_id_bytes[1]]);
        if glyph_id == 0 {
            Some(0) // missing glyph
        } else {
            Some(segment.id_delta.wrapping_add(glyph_id))
        }
    }

    fn collect_mappings(&self, output: &mut Vec<(u32, u16)>) {
        for (idx, segment) in self.segments.iter().enumerate() {
            if segment.start_code > segment.end_code {
                continue;
            }
            for code in segment.start_code..=segment.end_code {
                if code == u16::MAX {
                    continue; // sentinel segment
                }
                if let Some(glyph_id) = self.map_code(idx, code) {
                    output.push((code.into(), glyph_id));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SequentialMapGroup {
    pub(crate) start_char_code: u32,
    pub(crate) end_char_code: u32,
    pub(crate) start_glyph_id: u32,
}

impl SequentialMapGroup {
    pub(crate) fn map_unchecked(&self, codepoint: u32) -> u32 {
        codepoint - self.start_char_code + self.start_glyph_id
    }

    fn codepoints(&self) -> std::ops::RangeInclusive<u32> {
        let end = self.end_char_code.min(MAX_CODEPOINT);
        // An inverted group yields an empty range.
        self.start_char_code..=end
    }
}

/// Segmented coverage (format 12) or many-to-one range mappings (format 13) subtable
/// of the `cmap` table.
#[derive(Debug, Default, Clone)]
pub(crate) struct SegmentedCoverage {
    pub(crate) groups: Vec<SequentialMapGroup>,
}

impl SegmentedCoverage {
    fn parse(mut cursor: Cursor<'_>, format: u16) -> Result<Self, ParseError> {
        read_format(&mut cursor, format)?;
        cursor.skip(2)?; // reserved
        let declared_len = cursor.read_u32()? as usize;
        let mut body = restrict_to_subtable(cursor, declared_len, 8)?;

        body.skip(4)?; // language
        let group_count = body.read_u32()?;
        let mut groups = vec![];
        for _ in 0..group_count {
            let [start_char_code, end_char_code, start_glyph_id] =
                [body.read_u32()?, body.read_u32()?, body.read_u32()?];
            groups.push(SequentialMapGroup {
                start_char_code,
                end_char_code,
                start_glyph_id,
            });
        }
        Ok(Self { groups })
    }

    fn collect_mappings(&self, output: &mut Vec<(u32, u16)>) {
        for group in &self.groups {
            for codepoint in group.codepoints() {
                let glyph_id = group
                    .start_glyph_id
                    .checked_add(codepoint - group.start_char_code)
                    .and_then(|id| u16::try_from(id).ok());
                if let Some(glyph_id) = glyph_id {
                    output.push((codepoint, glyph_id));
                }
            }
        }
    }

    fn collect_many_to_one_mappings(&self, output: &mut Vec<(u32, u16)>) {
        for group in &self.groups {
            let Ok(glyph_id) = u16::try_from(group.start_glyph_id) else {
                continue;
            };
            output.extend(group.codepoints().map(|codepoint| (codepoint, glyph_id)));
        }
    }
}

/// Facts about all encoding records of a `cmap` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CmapEncodings {
    /// Has a Windows Symbol (3, 0) encoding.
    pub(crate) has_symbol_encoding: bool,
    /// Has a many-to-one (format 13) subtable, typical for last-resort fonts.
    pub(crate) has_many_to_one: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum CmapTable<'a> {
    Deltas(SegmentDeltas<'a>),
    Coverage(SegmentedCoverage),
    ManyToOne(SegmentedCoverage),
}

impl<'a> CmapTable<'a> {
    pub(crate) const UNICODE_PLATFORM: u16 = 0;
    pub(crate) const WINDOWS_PLATFORM: u16 = 3;
    const WINDOWS_SYMBOL_ENCODING: u16 = 0;
    const UNICODE_VARIATION_SEQUENCES: u16 = 5;

    /// Parses the best supported subtable: full-repertoire format 12, then BMP format 4,
    /// then symbol format 4, then format 13.
    pub(crate) fn parse(mut cursor: Cursor<'a>) -> Result<(Self, CmapEncodings), ParseError> {
        let table_cursor = cursor;
        cursor.read_u16_checked(|version| {
            if version != 0 {
                return Err(ParseErrorKind::UnexpectedTableVersion {
                    version: version.into(),
                });
            }
            Ok(())
        })?;

        let num_tables = cursor.read_u16()?;
        let mut encodings = CmapEncodings::default();
        let mut best: Option<(u8, u16, Cursor<'a>)> = None;
        for _ in 0..num_tables {
            let platform_id = cursor.read_u16()?;
            let encoding_id = cursor.read_u16()?;
            let offset = cursor.read_u32()? as usize;

            let is_symbol = (platform_id, encoding_id)
                == (Self::WINDOWS_PLATFORM, Self::WINDOWS_SYMBOL_ENCODING);
            encodings.has_symbol_encoding |= is_symbol;
            let is_supported = match platform_id {
                Self::UNICODE_PLATFORM => encoding_id != Self::UNICODE_VARIATION_SEQUENCES,
                Self::WINDOWS_PLATFORM => matches!(encoding_id, 0 | 1 | 10),
                _ => false,
            };
            if !is_supported {
                continue;
            }

            let subtable = table_cursor.at(offset)?;
            let format = { subtable }.read_u16()?;
            encodings.has_many_to_one |= format == 13;
            let rank = match format {
                12 => 0,
                4 if !is_symbol => 1,
                4 => 2,
                13 => 3,
                _ => continue, // unsupported table format
            };
            if best.as_ref().is_none_or(|&(best_rank, ..)| rank < best_rank) {
                best = Some((rank, format, subtable));
            }
        }

        let Some((_, format, subtable)) = best else {
            return Err(cursor.err(ParseErrorKind::NoSupportedCmap));
        };
        let this = match format {
            4 => Self::Deltas(SegmentDeltas::parse(subtable)?),
            12 => Self::Coverage(SegmentedCoverage::parse(subtable, 12)?),
            _ => Self::ManyToOne(SegmentedCoverage::parse(subtable, 13)?),
        };
        Ok((this, encodings))
    }

    /// Lists all `(codepoint, glyph_id)` mappings of this subtable.
    pub(crate) fn mappings(&self) -> Vec<(u32, u16)> {
        let mut output = vec![];
        match self {
            Self::Deltas(deltas) => deltas.collect_mappings(&mut output),
            Self::Coverage(coverage) => coverage.collect_mappings(&mut output),
            Self::ManyToOne(coverage) => coverage.collect_many_to_one_mappings(&mut output),
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_map_skips_missing_glyphs_and_sorts_codepoints() {
        let map: CharMap = [(0x42, 2), (0x41, 1), (0x43, 0), (0x41, 5)].into_iter().collect();
        assert_eq!(map.codepoints(), [0x41, 0x42]);
        assert_eq!(map.glyph_id(0x41), Some(1));
        assert_eq!(map.glyph_id(0x43), None);
        assert!(!map.contains(0x43));
        assert_eq!(map.iter().collect::<Vec<_>>(), [(0x41, 1), (0x42, 2)]);
    }

    #[test]
    fn format4_mappings_with_glyph_id_array() {
        let deltas = SegmentDeltas {
            segments: vec![
                SegmentWithDelta {
                    start_code: 0x41,
                    end_code: 0x42,
                    id_delta: 0,
                    // Points to `glyph_id_array[0]` from `id_range_offsets[0]`
                    id_range_offset: 4,
                },
                SegmentWithDelta {
                    start_code: u16::MAX,
                    end_code: u16::MAX,
                    id_delta: 1,
                    id_range_offset: 0,
                },
            ],
            glyph_id_array: &[0, 7, 0, 0],
        };
        let mut mappings = vec![];
        deltas.collect_mappings(&mut mappings);
        assert_eq!(mappings, [(0x41, 7), (0x42, 0)]);
    }

    #[test]
    fn format13_maps_ranges_to_single_glyph() {
        let coverage = SegmentedCoverage {
            groups: vec![SequentialMapGroup {
                start_char_code: 0x10,
                end_char_code: 0x12,
                start_glyph_id: 3,
            }],
        };
        let mut mappings = vec![];
        coverage.collect_many_to_one_mappings(&mut mappings);
        assert_eq!(mappings, [(0x10, 3), (0x11, 3), (0x12, 3)]);
    }

    #[test]
    fn oversized_groups_are_clamped() {
        let group = SequentialMapGroup {
            start_char_code: 0x10_FFFE,
            end_char_code: u32::MAX,
            start_glyph_id: 1,
        };
        assert_eq!(group.codepoints().count(), 2);
    }

    fn assert_matches_kind(err: &ParseError, predicate: impl FnOnce(&ParseErrorKind) -> bool) {
        assert!(predicate(&err.kind), "{err:?}");
    }

    #[test]
    fn subtable_format_is_checked() {
        let bytes = [0, 12, 0, 0, 0, 0, 0, 16, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = SegmentDeltas::parse(Cursor::new(&bytes)).unwrap_err();
        assert_matches_kind(&err, |kind| {
            matches!(kind, ParseErrorKind::UnexpectedTableFormat { format: 12 })
        });
        assert_eq!(err.offset, 0);

        let coverage = SegmentedCoverage::parse(Cursor::new(&bytes), 12).unwrap();
        assert!(coverage.groups.is_empty());
        let err = SegmentedCoverage::parse(Cursor::new(&bytes[..12]), 12).unwrap_err();
        assert_matches_kind(&err, |kind| matches!(kind, ParseErrorKind::UnexpectedEof));
    }
}
