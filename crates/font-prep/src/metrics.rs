//! Character width metrics over a Unicode range.

use serde::Serialize;

use crate::{CharacterMap, Font, ParseError, RangeSet};

/// How [`WidthMetrics`] were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricsMethod {
    /// Advances of the glyphs mapped by `cmap`, taken from `hmtx`.
    #[serde(rename = "cmap+hmtx_mean")]
    CmapHmtxMean,
    /// The font maps none of the requested codepoints; all widths are 0.
    #[serde(rename = "no_glyphs_in_subset")]
    NoGlyphsInSubset,
}

/// Advance width statistics of a font restricted to a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidthMetrics {
    /// PostScript name, or `Unknown`.
    pub postscript_name: String,
    /// Family name, or `Unknown`.
    pub family_name: String,
    /// Font units per em.
    pub units_per_em: u16,
    /// Number of codepoints whose advances were measured.
    pub processed: usize,
    /// Number of requested codepoints mapped by the font.
    pub attempted: usize,
    /// `processed / attempted`, or 0 if nothing was attempted.
    #[serde(rename = "coverage_ratio")]
    pub coverage_ratio: f64,
    /// Mean advance.
    #[serde(rename = "xAvgCharWidth")]
    pub avg_width: f64,
    /// Median advance.
    #[serde(rename = "xMedianCharWidth")]
    pub median_width: f64,
    /// Population standard deviation of advances.
    #[serde(rename = "xStdCharWidth")]
    pub std_width: f64,
    /// Computation method.
    pub method: MetricsMethod,
}

const UNKNOWN_NAME: &str = "Unknown";

#[allow(clippy::cast_precision_loss)] // sample sizes are bounded by the glyph count
fn statistics(mut widths: Vec<f64>) -> (f64, f64, f64) {
    let len = widths.len() as f64;
    let mean = widths.iter().sum::<f64>() / len;
    widths.sort_unstable_by(f64::total_cmp);
    let mid = widths.len() / 2;
    let median = if widths.len() % 2 == 0 {
        (widths[mid - 1] + widths[mid]) / 2.0
    } else {
        widths[mid]
    };
    let std = if widths.len() > 1 {
        let variance = widths.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / len;
        variance.sqrt()
    } else {
        0.0
    };
    (mean, median, std)
}

/// Computes width metrics of `font` over the codepoints of `range` that the font maps.
///
/// Iterates over the font's codepoints, so the cost doesn't depend on the range size.
///
/// # Errors
///
/// Returns an error if the `name` table or horizontal metrics are missing or corrupt.
pub fn width_metrics(font: &Font<'_>, range: &RangeSet) -> Result<WidthMetrics, ParseError> {
    let names = font.names()?;
    let char_map = font.char_map();
    let mut attempted = 0_usize;
    let mut widths = vec![];
    for cp in range.intersect_sorted(char_map.codepoints().iter().copied()) {
        attempted += 1;
        if let Some(glyph_id) = char_map.glyph_id(cp) {
            widths.push(f64::from(font.advance(glyph_id)?));
        }
    }

    let processed = widths.len();
    #[allow(clippy::cast_precision_loss)]
    let coverage_ratio = if attempted == 0 {
        0.0
    } else {
        processed as f64 / attempted as f64
    };
    let (method, (avg_width, median_width, std_width)) = if widths.is_empty() {
        (MetricsMethod::NoGlyphsInSubset, (0.0, 0.0, 0.0))
    } else {
        (MetricsMethod::CmapHmtxMean, statistics(widths))
    };
    log::debug!("measured {processed} advances of {attempted} mapped codepoints");

    Ok(WidthMetrics {
        postscript_name: names
            .postscript_name
            .unwrap_or_else(|| UNKNOWN_NAME.to_owned()),
        family_name: names.family.unwrap_or_else(|| UNKNOWN_NAME.to_owned()),
        units_per_em: font.units_per_em(),
        processed,
        attempted,
        coverage_ratio,
        avg_width,
        median_width,
        std_width,
        method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestFontBuilder;

    #[test]
    fn width_statistics() {
        let (mean, median, std) = statistics(vec![600.0, 200.0, 400.0, 400.0]);
        assert!((mean - 400.0).abs() < f64::EPSILON);
        assert!((median - 400.0).abs() < f64::EPSILON);
        assert!((std - 2.0_f64.sqrt() * 100.0).abs() < 1e-9, "{std}");

        let (mean, median, std) = statistics(vec![500.0]);
        assert_eq!((mean, median, std), (500.0, 500.0, 0.0));

        let (_, median, _) = statistics(vec![100.0, 300.0]);
        assert!((median - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_for_text_font() {
        let bytes = TestFontBuilder::text().build();
        let font = Font::new(&bytes).unwrap();
        let range = RangeSet::parse("U+0000-00FF").unwrap();
        let metrics = width_metrics(&font, &range).unwrap();

        assert_eq!(metrics.family_name, TestFontBuilder::TEXT_FAMILY);
        assert_eq!(metrics.postscript_name, "FontPrepText-Regular");
        assert_eq!(metrics.units_per_em, TestFontBuilder::UNITS_PER_EM);
        // Space, A, B and Aring
        assert_eq!((metrics.attempted, metrics.processed), (4, 4));
        assert_eq!(metrics.method, MetricsMethod::CmapHmtxMean);
        assert!((metrics.coverage_ratio - 1.0).abs() < f64::EPSILON);
        assert!(metrics.avg_width > 0.0);

        let json = serde_json::to_value(&metrics).unwrap();
        for key in [
            "postscriptName",
            "familyName",
            "unitsPerEm",
            "processed",
            "attempted",
            "coverage_ratio",
            "xAvgCharWidth",
            "xMedianCharWidth",
            "xStdCharWidth",
            "method",
        ] {
            assert!(json.get(key).is_some(), "{key}");
        }
        assert_eq!(json["method"], "cmap+hmtx_mean");
    }

    #[test]
    fn metrics_without_mapped_codepoints() {
        let bytes = TestFontBuilder::text().build();
        let font = Font::new(&bytes).unwrap();
        let range = RangeSet::parse("U+4E00-4EFF").unwrap();
        let metrics = width_metrics(&font, &range).unwrap();

        assert_eq!(metrics.attempted, 0);
        assert_eq!(metrics.coverage_ratio, 0.0);
        assert_eq!(metrics.avg_width, 0.0);
        assert_eq!(metrics.method, MetricsMethod::NoGlyphsInSubset);
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["method"], "no_glyphs_in_subset");
    }

    #[test]
    fn unnamed_font_has_unknown_names() {
        let bytes = TestFontBuilder::text().without_names().build();
        let font = Font::new(&bytes).unwrap();
        let metrics = width_metrics(&font, &RangeSet::parse("U+0041").unwrap()).unwrap();
        assert_eq!(metrics.family_name, "Unknown");
        assert_eq!(metrics.postscript_name, "Unknown");
        assert_eq!(metrics.median_width, f64::from(TestFontBuilder::LETTER_ADVANCE));
    }
}
