//! Font preparation for web publishing: classification of non-textual fonts, Unicode range
//! coverage analysis, subsetting and width metrics.
//!
//! # Overview
//!
//! - [`RangeSet`] is a canonical set of codepoints parsed from CSS-like `unicode-range` specs
//!   (`U+0041-005A, U+00C5`).
//! - [`Font`] / [`FontFile`] read TrueType, OpenType and WOFF2 fonts. Consumers that don't need
//!   the whole font work with the [`CharacterMap`] and [`GlyphSampler`] traits.
//! - [`Classifier`] decides whether a font is an emoji, symbol or barcode font, running cheap
//!   checks first and sampling glyph shapes only if they are inconclusive.
//! - [`CoverageAnalyzer`] measures how much of a range a font maps, bucketed by Unicode
//!   general category.
//! - [`plan()`] and [`FontSubset`] reduce a font to a range, writing TrueType / OpenType or
//!   WOFF2 output.
//! - [`width_metrics()`] computes advance width statistics over a range.
//!
//! Thresholds used by the analyses are configurable via [`Config`].
//!
//! # Examples
//!
//! ```no_run
//! use font_prep::{plan, Classifier, Config, FontFile, FontMetadata, FontSubset, RangeSet};
//! # use std::path::Path;
//!
//! let config = Config::default();
//! let file = FontFile::open(Path::new("fonts/Inter.ttf"))?;
//! let font = file.font()?;
//!
//! let classifier = Classifier::new(config.classifier.clone())?;
//! let classification = classifier.classify(&FontMetadata::from_font(&font)?)?;
//! if !classification.result.is_non_textual() {
//!     let range = RangeSet::parse("U+0000-00FF, U+0131, U+0152-0153")?;
//!     let plan = plan(font.char_map(), &range, true);
//!     let report = FontSubset::new(&font, &plan)?.save(&range, Path::new("out/Inter-latin.woff2"))?;
//!     println!("kept {} codepoints", report.unicodes_kept);
//! }
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/font-prep/0.1.0")]

mod cache;
mod classify;
mod config;
mod coverage;
mod errors;
mod font;
mod metrics;
mod plan;
mod range;
mod subset;
#[cfg(test)]
pub(crate) mod tests;
mod unicode;
mod write;

pub use crate::{
    cache::{BoundedCache, CacheStats},
    classify::{
        Classification, ClassificationResult, Classifier, Code39Profile, FontMetadata,
        ScriptEvidence, Signal, Verdict,
    },
    config::{CacheConfig, ClassifierConfig, Config, CoverageConfig, CONFIG_ENV_VAR},
    coverage::{Breakdown, BucketSummary, CoverageAnalyzer, CoverageReport},
    errors::{ConfigError, Error, ErrorKind, ParseError, ParseErrorKind, RangeError},
    font::{
        BoundingBox, CharMap, CharacterMap, Font, FontFile, FontFormat, GlyphGeometry,
        GlyphSampler, NameStrings, TableTag,
    },
    metrics::{width_metrics, MetricsMethod, WidthMetrics},
    plan::{plan, SubsetPlan},
    range::{CodepointInterval, RangeParser, RangeSet, MAX_CODEPOINT},
    subset::{FontSubset, OutputFormat, SubsetReport},
    unicode::{CategoryBucket, UnicodeLookup},
};

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
