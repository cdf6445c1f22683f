//! Coverage of a Unicode range by a font's character map.

use std::{collections::BTreeMap, path::PathBuf};

use serde::Serialize;

use crate::{
    config::{Config, CoverageConfig},
    unicode::{CategoryBucket, UnicodeLookup},
    CharacterMap, RangeSet,
};

/// Codepoints of a single [`CategoryBucket`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    /// Number of codepoints in the bucket.
    pub count: u64,
    /// First codepoints of the bucket, formatted as `U+0041: LATIN CAPITAL LETTER A`.
    pub sample: Vec<String>,
    /// All codepoints of the bucket. Only present if the requested range is small enough.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<String>>,
}

/// Per-bucket summaries, always containing every bucket.
pub type Breakdown = BTreeMap<CategoryBucket, BucketSummary>;

/// Result of [`CoverageAnalyzer::analyze()`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    /// Path of the analyzed font, if the map was read from a file.
    pub font: Option<PathBuf>,
    /// Canonical intervals of the requested range.
    pub requested_ranges: Vec<String>,
    /// Number of requested codepoints.
    pub requested_total: u64,
    /// Number of requested codepoints mapped by the font.
    pub covered_total: u64,
    /// Number of requested codepoints not mapped by the font.
    pub missing_total: u64,
    /// `covered_total / requested_total` as a percentage rounded to 2 decimal places.
    pub coverage_percent: f64,
    /// Breakdown of covered codepoints.
    pub covered_breakdown: Breakdown,
    /// Breakdown of missing codepoints.
    pub missing_breakdown: Breakdown,
    /// Number of codepoints mapped by the font.
    pub font_cmap_size: usize,
    /// Whether full codepoint lists were omitted because the range is too large.
    pub truncated: bool,
}

#[derive(Debug)]
struct BreakdownBuilder {
    buckets: Breakdown,
    sample_size: usize,
}

impl BreakdownBuilder {
    fn new(sample_size: usize, with_full_lists: bool) -> Self {
        let buckets = CategoryBucket::ALL
            .into_iter()
            .map(|bucket| {
                let summary = BucketSummary {
                    all: with_full_lists.then(Vec::new),
                    ..BucketSummary::default()
                };
                (bucket, summary)
            })
            .collect();
        Self {
            buckets,
            sample_size,
        }
    }

    fn push(&mut self, lookup: &mut UnicodeLookup, bucket: CategoryBucket, cp: u32) {
        let Some(summary) = self.buckets.get_mut(&bucket) else {
            return;
        };
        summary.count += 1;
        let needs_sample = summary.sample.len() < self.sample_size;
        if !needs_sample && summary.all.is_none() {
            return;
        }

        let description = lookup.describe(cp);
        if let Some(all) = &mut summary.all {
            all.push(description.clone());
        }
        if needs_sample {
            summary.sample.push(description);
        }
    }
}

/// Computes [`CoverageReport`]s, memoizing Unicode lookups across calls.
#[derive(Debug)]
pub struct CoverageAnalyzer {
    config: CoverageConfig,
    lookup: UnicodeLookup,
}

impl Default for CoverageAnalyzer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl CoverageAnalyzer {
    /// Creates an analyzer with the specified config.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.coverage.clone(),
            lookup: UnicodeLookup::new(&config.cache),
        }
    }

    /// Returns the Unicode lookup service used by this analyzer.
    pub fn lookup(&self) -> &UnicodeLookup {
        &self.lookup
    }

    /// Analyzes coverage of `range` by `char_map`.
    ///
    /// The range is walked interval by interval; codepoints are only materialized into the
    /// report up to the configured sample size, or fully if the range has at most
    /// `full_list_threshold` codepoints.
    #[allow(clippy::cast_precision_loss)] // codepoint counts are far below 2^52
    pub fn analyze<M>(&mut self, char_map: &M, range: &RangeSet) -> CoverageReport
    where
        M: CharacterMap + ?Sized,
    {
        let requested_total = range.len();
        let with_full_lists = requested_total <= self.config.full_list_threshold;
        let mut covered = BreakdownBuilder::new(self.config.sample_size, with_full_lists);
        let mut missing = BreakdownBuilder::new(self.config.sample_size, with_full_lists);
        let mut covered_total = 0_u64;

        for interval in range.intervals() {
            for cp in interval.iter() {
                let bucket = self.lookup.bucket(cp);
                if char_map.contains(cp) {
                    covered_total += 1;
                    covered.push(&mut self.lookup, bucket, cp);
                } else {
                    missing.push(&mut self.lookup, bucket, cp);
                }
            }
        }

        let missing_total = requested_total - covered_total;
        let ratio = covered_total as f64 / requested_total.max(1) as f64;
        let coverage_percent = (ratio * 10_000.0).round() / 100.0;
        log::debug!(
            "{covered_total} of {requested_total} requested codepoints are covered \
             ({coverage_percent}%); category cache: {:?}",
            self.lookup.category_cache().stats()
        );

        CoverageReport {
            font: None,
            requested_ranges: range.normalized_ranges(),
            requested_total,
            covered_total,
            missing_total,
            coverage_percent,
            covered_breakdown: covered.buckets,
            missing_breakdown: missing.buckets,
            font_cmap_size: char_map.len(),
            truncated: !with_full_lists,
        }
    }
}
