//! Applying a [`SubsetPlan`] to a font.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    errors::Error,
    font::{Font, GlyphTable, Outlines},
    CharacterMap, ParseError, RangeSet, SubsetPlan, TableTag,
};

/// Tables describing OpenType layout features.
const LAYOUT_TABLES: [TableTag; 5] = [
    TableTag::GSUB,
    TableTag::GPOS,
    TableTag::GDEF,
    TableTag::BASE,
    TableTag::JSTF,
];
const SHAPING_TABLES: [TableTag; 3] = [TableTag::GSUB, TableTag::GPOS, TableTag::GDEF];

/// Format of a serialized subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Uncompressed sfnt with a `.ttf` extension.
    Ttf,
    /// Uncompressed sfnt with any other extension.
    Otf,
    /// WOFF 2.0 with null-transformed tables.
    Woff2,
}

impl OutputFormat {
    /// Chooses the format by the output path extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("woff2") => Self::Woff2,
            Some("ttf") => Self::Ttf,
            _ => Self::Otf,
        }
    }

    /// Lossless transformations applied when writing this format.
    fn lossless_ops(self) -> Vec<&'static str> {
        match self {
            Self::Woff2 => vec!["repack:woff2"],
            Self::Ttf | Self::Otf => vec![],
        }
    }
}

/// Source of a table in the subset font.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SubsetTable<'a> {
    /// Rebuilt from the kept codepoints.
    Cmap,
    /// Rebuilt from the retained glyphs; written together with `loca`.
    Glyf,
    Loca,
    /// Original table with a patched checksum adjustment and `loca` format.
    Head,
    /// Name table without records.
    EmptyName,
    /// Copied as is.
    Raw(&'a [u8]),
}

/// Subset of a [`Font`].
///
/// Glyph IDs are retained; glyphs outside the closure keep their metrics but lose their outlines.
/// This keeps `hmtx`, `maxp` and the layout tables valid without rewriting them.
#[derive(Debug)]
pub struct FontSubset<'a> {
    pub(crate) font: &'a Font<'a>,
    /// Kept `(codepoint, glyph_id)` mappings in ascending codepoint order.
    pub(crate) char_map: Vec<(u32, u16)>,
    /// Glyph closure.
    pub(crate) glyphs: BTreeSet<u16>,
    /// Raw `glyf` data indexed by glyph ID (empty for dropped glyphs), or `None` if the font
    /// has no TrueType outlines.
    pub(crate) glyph_data: Option<Vec<&'a [u8]>>,
    /// Output tables sorted by tag.
    pub(crate) tables: Vec<(TableTag, SubsetTable<'a>)>,
}

impl<'a> FontSubset<'a> {
    /// Applies `plan` to `font`.
    ///
    /// # Errors
    ///
    /// Returns an error if glyph data referenced by the closure is corrupt, or a kept table
    /// is stored with a WOFF2 transform.
    pub fn new(font: &'a Font<'a>, plan: &SubsetPlan) -> Result<Self, ParseError> {
        let char_map: Vec<_> = plan
            .keep_codepoints
            .iter()
            .filter_map(|&cp| Some((cp, font.char_map().glyph_id(cp)?)))
            .collect();

        let mut glyphs = plan.keep_glyphs.clone();
        glyphs.insert(0);
        if plan.preserve_features {
            // Glyphs unreachable through the cmap can only be produced by layout features.
            let mapped: BTreeSet<_> = font.char_map().iter().map(|(_, glyph_id)| glyph_id).collect();
            glyphs.extend((0..font.glyph_count()).filter(|glyph_id| !mapped.contains(glyph_id)));
        }

        let glyph_data = match &font.outlines {
            Outlines::TrueType(table) => {
                Self::close_over_components(table, &mut glyphs)?;
                let data = (0..font.glyph_count())
                    .map(|glyph_id| {
                        if glyphs.contains(&glyph_id) {
                            table.raw_glyph(glyph_id)
                        } else {
                            Ok(&[] as &[u8])
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Some(data)
            }
            Outlines::Transformed => return Err(ParseError::transformed_table(TableTag::GLYF)),
            Outlines::Cff => {
                log::warn!("font has CFF outlines, which are passed through without subsetting");
                None
            }
            Outlines::Missing => None,
        };
        glyphs.retain(|&glyph_id| glyph_id < font.glyph_count());

        let tables = Self::select_tables(font, plan, glyph_data.is_some())?;
        log::debug!(
            "subset keeps {} codepoints, {} of {} glyphs and {} tables",
            char_map.len(),
            glyphs.len(),
            font.glyph_count(),
            tables.len()
        );
        Ok(Self {
            font,
            char_map,
            glyphs,
            glyph_data,
            tables,
        })
    }

    fn close_over_components(
        table: &GlyphTable<'_>,
        glyphs: &mut BTreeSet<u16>,
    ) -> Result<(), ParseError> {
        let mut pending: Vec<_> = glyphs.iter().copied().collect();
        while let Some(glyph_id) = pending.pop() {
            let glyph = table.glyph(glyph_id)?;
            for component_id in glyph.component_ids() {
                if glyphs.insert(component_id) {
                    pending.push(component_id);
                }
            }
        }
        Ok(())
    }

    fn select_tables(
        font: &'a Font<'a>,
        plan: &SubsetPlan,
        rebuild_outlines: bool,
    ) -> Result<Vec<(TableTag, SubsetTable<'a>)>, ParseError> {
        let mut tables = vec![];
        for raw in font.tables.iter() {
            let source = match raw.tag {
                TableTag::CMAP => SubsetTable::Cmap,
                TableTag::HEAD => SubsetTable::Head,
                TableTag::GLYF if rebuild_outlines => SubsetTable::Glyf,
                TableTag::LOCA if rebuild_outlines => SubsetTable::Loca,
                TableTag::NAME if !plan.preserve_name_records => SubsetTable::EmptyName,
                TableTag::DSIG => continue,
                tag if LAYOUT_TABLES.contains(&tag) && !plan.preserve_features => continue,
                tag => SubsetTable::Raw(raw.data.ok_or_else(|| ParseError::transformed_table(tag))?),
            };
            tables.push((raw.tag, source));
        }
        Ok(tables)
    }

    /// Returns tags of the tables in the subset font.
    pub fn table_tags(&self) -> impl Iterator<Item = TableTag> + '_ {
        self.tables.iter().map(|(tag, _)| *tag)
    }

    /// Returns the number of glyphs with retained outlines, including `.notdef`.
    pub fn retained_glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Returns the number of codepoints mapped by the subset font.
    pub fn codepoint_count(&self) -> usize {
        self.char_map.len()
    }

    /// Serializes the subset in the specified format.
    pub fn to_bytes(&self, format: OutputFormat) -> Vec<u8> {
        match format {
            OutputFormat::Woff2 => self.to_woff2(),
            OutputFormat::Ttf | OutputFormat::Otf => self.to_opentype(),
        }
    }

    /// Saves the subset to `path`, choosing the format by its extension, and reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the output file cannot be written.
    pub fn save(&self, range: &RangeSet, path: &Path) -> Result<SubsetReport, Error> {
        let format = OutputFormat::from_path(path);
        let bytes = self.to_bytes(format);
        let io_err = |source| Error::Io {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, &bytes).map_err(io_err)?;
        log::info!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(self.report(range, path, format, bytes.len() as u64))
    }

    fn report(
        &self,
        range: &RangeSet,
        output_path: &Path,
        format: OutputFormat,
        file_size: u64,
    ) -> SubsetReport {
        let kept_tables: Vec<_> = self.table_tags().collect();
        let dropped_tables = self
            .font
            .table_tags()
            .filter(|tag| !kept_tables.contains(tag))
            .collect();
        let removed_shaping = !SHAPING_TABLES.iter().any(|tag| kept_tables.contains(tag));
        let preserve_names = !self
            .tables
            .iter()
            .any(|(_, source)| matches!(source, SubsetTable::EmptyName));

        SubsetReport {
            success: true,
            output_path: output_path.to_owned(),
            format,
            unicodes_requested: range.len(),
            unicodes_kept: self.codepoint_count(),
            normalized_ranges: range.normalized_ranges(),
            glyphs_before: self.font.glyph_count(),
            glyphs_after: self.retained_glyph_count(),
            kept_tables,
            dropped_tables,
            lossless_ops: format.lossless_ops(),
            removed_metadata: !preserve_names,
            removed_shaping,
            fe_safe: preserve_names,
            file_size,
        }
    }
}

/// Outcome of [`FontSubset::save()`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsetReport {
    /// Always `true`; failures are reported as errors.
    pub success: bool,
    /// Path of the written font.
    pub output_path: PathBuf,
    /// Output format.
    pub format: OutputFormat,
    /// Number of requested codepoints.
    pub unicodes_requested: u64,
    /// Number of codepoints mapped by the subset font.
    pub unicodes_kept: usize,
    /// Canonical intervals of the requested range.
    pub normalized_ranges: Vec<String>,
    /// Number of glyphs in the original font.
    pub glyphs_before: u16,
    /// Number of glyphs with retained outlines.
    pub glyphs_after: usize,
    /// Tables present in the subset font.
    pub kept_tables: Vec<TableTag>,
    /// Tables of the original font missing from the subset font.
    pub dropped_tables: Vec<TableTag>,
    /// Lossless repacking steps applied to the output, e.g. `repack:woff2`.
    pub lossless_ops: Vec<&'static str>,
    /// Whether name records were removed.
    pub removed_metadata: bool,
    /// Whether all shaping tables (`GSUB`, `GPOS`, `GDEF`) are absent.
    pub removed_shaping: bool,
    /// Whether the output keeps license metadata and can be served as is.
    pub fe_safe: bool,
    /// Size of the output file in bytes.
    pub file_size: u64,
}
