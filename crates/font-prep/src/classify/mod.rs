//! Detection of non-textual (emoji, symbol and barcode) fonts.
//!
//! Classification runs a fixed pipeline of checks ordered by cost. Each check either settles
//! a verdict, raises a candidate verdict, or is inconclusive. Settled verdicts accumulate into
//! the result flags; once a verdict is settled, only the table signature check still runs,
//! so that a color font with a barcode-like name keeps its emoji flag.
//! Glyph geometry, the only expensive check, runs only if nothing is settled before it.

use core::fmt;
use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

pub use self::checks::{Code39Profile, ScriptEvidence};
use crate::{
    config::ClassifierConfig,
    errors::{ConfigError, Error},
    CharacterMap, Font, GlyphSampler, NameStrings, ParseError, TableTag,
};

mod checks;

/// Four-flag classification of a font.
///
/// `is_non_textual` is always the disjunction of the other three flags.
///
/// # Examples
///
/// ```
/// # use font_prep::ClassificationResult;
/// let result = ClassificationResult::new(false, true, false);
/// assert!(result.is_symbol() && result.is_non_textual());
/// assert_eq!(
///     serde_json::to_string(&result)?,
///     r#"{"is_emoji":false,"is_symbol":true,"is_barcode":false,"is_non_textual":true}"#
/// );
/// # Ok::<_, serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClassificationResult {
    is_emoji: bool,
    is_symbol: bool,
    is_barcode: bool,
    is_non_textual: bool,
}

impl ClassificationResult {
    /// Result for an ordinary text font.
    pub const TEXTUAL: Self = Self::new(false, false, false);

    /// Creates a result from the three primary flags.
    pub const fn new(is_emoji: bool, is_symbol: bool, is_barcode: bool) -> Self {
        Self {
            is_emoji,
            is_symbol,
            is_barcode,
            is_non_textual: is_emoji || is_symbol || is_barcode,
        }
    }

    /// Is this an emoji (color or bitmap glyph) font?
    pub fn is_emoji(&self) -> bool {
        self.is_emoji
    }

    /// Is this a symbol / pictorial font?
    pub fn is_symbol(&self) -> bool {
        self.is_symbol
    }

    /// Is this a barcode font?
    pub fn is_barcode(&self) -> bool {
        self.is_barcode
    }

    /// Is this font unsuitable for rendering ordinary text?
    pub fn is_non_textual(&self) -> bool {
        self.is_non_textual
    }

    /// Adds the flag corresponding to `verdict`.
    const fn with_verdict(self, verdict: Verdict) -> Self {
        match verdict {
            Verdict::Emoji => Self::new(true, self.is_symbol, self.is_barcode),
            Verdict::Symbol => Self::new(self.is_emoji, true, self.is_barcode),
            Verdict::Barcode => Self::new(self.is_emoji, self.is_symbol, true),
            Verdict::Textual => self,
        }
    }
}

/// Verdict of a classification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Emoji font.
    Emoji,
    /// Symbol font.
    Symbol,
    /// Barcode font.
    Barcode,
    /// Ordinary text font.
    Textual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckOutcome {
    /// Settles the classification.
    Definitive(Verdict),
    /// Provisional verdict applied if no later check settles the classification.
    Candidate(Verdict),
    Inconclusive,
}

/// Evidence gathered by a classification check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Signal {
    /// Barcode keyword in a name string.
    NameKeyword {
        /// Name string containing the keyword.
        name: String,
        /// Matched keyword.
        keyword: String,
    },
    /// Color / bitmap glyph tables.
    TableSignature {
        /// Present emoji tables.
        tables: Vec<TableTag>,
        /// Present companion tables (`CPAL`, `CBLC`).
        companions: Vec<TableTag>,
    },
    /// Script tags and character map composition.
    ScriptTag {
        /// Collected evidence.
        evidence: ScriptEvidence,
    },
    /// Statistics over sampled glyphs.
    GlyphGeometryStat {
        /// Number of sampled non-empty glyphs.
        sampled: usize,
        /// Number of bar-like sampled glyphs.
        bar_like: usize,
        /// `bar_like / sampled`.
        bar_share: f64,
        /// Share of alphanumeric mapped codepoints.
        text_ratio: f64,
        /// Code 39 profile, if it was computed.
        code39: Option<Code39Profile>,
    },
}

/// Output of [`Classifier::classify()`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Classification flags.
    pub result: ClassificationResult,
    /// Evidence in the order it was gathered.
    pub signals: Vec<Signal>,
    /// Whether glyph geometry was sampled.
    pub geometry_sampled: bool,
}

/// Font properties consumed by the [`Classifier`].
///
/// The character map and glyph sampler are optional so that callers can supply only what's
/// cheap to obtain; classification fails with [`Error::ClassificationPrecondition`] if a step
/// needs an accessor that is missing.
pub struct FontMetadata<'a> {
    /// Identification strings from the `name` table.
    pub names: NameStrings,
    /// Tags of tables present in the font.
    pub tables: BTreeSet<TableTag>,
    /// Script tags declared in `GSUB` / `GPOS`.
    pub script_tags: Vec<String>,
    /// PANOSE family type from `OS/2`.
    pub panose_family_type: Option<u8>,
    /// x-height from `OS/2`.
    pub x_height: Option<i16>,
    /// Font units per em.
    pub units_per_em: u16,
    /// Whether the `cmap` table has a Windows Symbol (3, 0) encoding.
    pub has_symbol_cmap: bool,
    /// Whether the `cmap` table has a format 13 subtable.
    pub has_many_to_one_cmap: bool,
    /// Character map accessor.
    pub char_map: Option<&'a dyn CharacterMap>,
    /// Glyph geometry accessor.
    pub glyphs: Option<&'a dyn GlyphSampler>,
}

impl fmt::Debug for FontMetadata<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FontMetadata")
            .field("names", &self.names)
            .field("tables", &self.tables)
            .field("script_tags", &self.script_tags)
            .field("panose_family_type", &self.panose_family_type)
            .field("x_height", &self.x_height)
            .field("units_per_em", &self.units_per_em)
            .field("has_symbol_cmap", &self.has_symbol_cmap)
            .field("has_many_to_one_cmap", &self.has_many_to_one_cmap)
            .field("char_map_len", &self.char_map.map(|map| map.len()))
            .field("has_glyphs", &self.glyphs.is_some())
            .finish()
    }
}

impl<'a> FontMetadata<'a> {
    /// Collects metadata of a parsed font, with both accessors set.
    ///
    /// # Errors
    ///
    /// Returns an error if the `name` or layout tables are corrupt.
    pub fn from_font(font: &'a Font<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            names: font.names()?,
            tables: font.table_tags().collect(),
            script_tags: font.script_tags()?,
            panose_family_type: font.panose_family_type(),
            x_height: font.x_height(),
            units_per_em: font.units_per_em(),
            has_symbol_cmap: font.has_symbol_cmap(),
            has_many_to_one_cmap: font.has_many_to_one_cmap(),
            char_map: Some(font.char_map()),
            glyphs: Some(font),
        })
    }

    /// Checks whether the font contains the specified table.
    pub fn has_table(&self, tag: TableTag) -> bool {
        self.tables.contains(&tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    NameKeywords,
    TableSignature,
    ScriptCoverage,
    GlyphGeometry,
}

impl Step {
    /// Checks whether this step runs even after a verdict is settled.
    fn runs_after_settling(self) -> bool {
        matches!(self, Self::TableSignature)
    }

    const PIPELINE: [Self; 4] = [
        Self::NameKeywords,
        Self::TableSignature,
        Self::ScriptCoverage,
        Self::GlyphGeometry,
    ];
}

/// Non-textual font classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
    name_pattern: Regex,
}

impl Classifier {
    /// Creates a classifier with the specified thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the barcode name pattern is not a valid regex.
    pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
        let name_pattern = RegexBuilder::new(&config.barcode_name_pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            config,
            name_pattern,
        })
    }

    /// Returns the thresholds used by this classifier.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn run_step(
        &self,
        step: Step,
        meta: &FontMetadata<'_>,
    ) -> Result<checks::CheckResult, Error> {
        const NO_CHAR_MAP: Error = Error::ClassificationPrecondition("character map");

        Ok(match step {
            Step::NameKeywords => checks::name_keywords(&self.name_pattern, meta),
            Step::TableSignature => checks::table_signature(meta),
            Step::ScriptCoverage => {
                let char_map = meta.char_map.ok_or(NO_CHAR_MAP)?;
                checks::script_coverage(&self.config, meta, char_map)
            }
            Step::GlyphGeometry => {
                let char_map = meta.char_map.ok_or(NO_CHAR_MAP)?;
                let sampler = meta
                    .glyphs
                    .ok_or(Error::ClassificationPrecondition("glyph sampler"))?;
                checks::glyph_geometry(&self.config, meta, char_map, sampler)?
            }
        })
    }

    /// Classifies a font.
    ///
    /// # Errors
    ///
    /// - [`Error::ClassificationPrecondition`] if a step needs an accessor missing from `meta`
    /// - [`Error::FontAccess`] if sampled glyph data is corrupt
    pub fn classify(&self, meta: &FontMetadata<'_>) -> Result<Classification, Error> {
        let mut signals = vec![];
        let mut result = ClassificationResult::TEXTUAL;
        let mut settled = false;
        let mut candidate = None;
        let mut geometry_sampled = false;

        for step in Step::PIPELINE {
            if settled && !step.runs_after_settling() {
                continue;
            }
            geometry_sampled |= step == Step::GlyphGeometry;
            let check = self.run_step(step, meta)?;
            signals.extend(check.signal);
            match check.outcome {
                CheckOutcome::Definitive(verdict) => {
                    log::debug!("{step:?} check settled {verdict:?}");
                    result = result.with_verdict(verdict);
                    settled = true;
                }
                CheckOutcome::Candidate(verdict) => {
                    log::debug!("{step:?} check raised candidate {verdict:?}");
                    candidate = Some(verdict);
                }
                CheckOutcome::Inconclusive => { /* continue with the next check */ }
            }
        }

        if !settled {
            let verdict = candidate.unwrap_or(Verdict::Textual);
            log::debug!("no check settled classification; using {verdict:?}");
            result = result.with_verdict(verdict);
        }
        Ok(Classification {
            result,
            signals,
            geometry_sampled,
        })
    }
}
