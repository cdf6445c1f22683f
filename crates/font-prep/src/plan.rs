//! Subset planning.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{CharacterMap, RangeSet};

/// Codepoints and glyphs to keep when subsetting a font, together with the table policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsetPlan {
    /// Requested codepoints that the font maps.
    pub keep_codepoints: BTreeSet<u32>,
    /// `.notdef` and the glyphs `keep_codepoints` map to. The subsetting backend extends
    /// this set with composite components and layout-only glyphs.
    pub keep_glyphs: BTreeSet<u16>,
    /// Keep the `name` table (license and attribution strings).
    pub preserve_name_records: bool,
    /// Keep OpenType layout tables (`GSUB`, `GPOS`, `GDEF`, `BASE`, `JSTF`).
    pub preserve_features: bool,
}

/// Computes what to keep when subsetting a font with `char_map` to `range`.
///
/// Iterates over the codepoints mapped by the font rather than over `range`, so the cost
/// doesn't depend on the range size. Requested codepoints missing from the font are dropped.
///
/// # Examples
///
/// ```
/// # use font_prep::{plan, CharMap, RangeSet};
/// let char_map: CharMap = [(0x41, 1), (0x42, 2), (0x5A, 3)].into_iter().collect();
/// let range = RangeSet::parse("U+0040-0043")?;
/// let plan = plan(&char_map, &range, true);
/// assert_eq!(plan.keep_codepoints.into_iter().collect::<Vec<_>>(), [0x41, 0x42]);
/// assert_eq!(plan.keep_glyphs.into_iter().collect::<Vec<_>>(), [0, 1, 2]);
/// assert!(plan.preserve_features);
/// # Ok::<_, font_prep::RangeError>(())
/// ```
pub fn plan<M>(char_map: &M, range: &RangeSet, preserve_names: bool) -> SubsetPlan
where
    M: CharacterMap + ?Sized,
{
    let keep_codepoints: BTreeSet<u32> = range
        .intersect_sorted(char_map.codepoints().iter().copied())
        .collect();
    let keep_glyphs = keep_codepoints
        .iter()
        .filter_map(|&cp| char_map.glyph_id(cp))
        .chain([0])
        .collect();

    log::debug!(
        "planned subset with {} of {} requested codepoints",
        keep_codepoints.len(),
        range.len()
    );
    SubsetPlan {
        keep_codepoints,
        keep_glyphs,
        preserve_name_records: preserve_names,
        preserve_features: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CharMap;

    fn ascii_map() -> CharMap {
        (0x20..0x7F_u32)
            .map(|cp| (cp, u16::try_from(cp - 0x1F).unwrap()))
            .collect()
    }

    #[test]
    fn plan_keeps_only_intersection() {
        let char_map = ascii_map();
        let range = RangeSet::parse("U+0000-0042, U+007E-00FF, U+1F600").unwrap();
        let plan = plan(&char_map, &range, false);

        let expected: Vec<u32> = (0x20..=0x42).chain([0x7E]).collect();
        assert_eq!(plan.keep_codepoints.iter().copied().collect::<Vec<_>>(), expected);
        for &cp in &plan.keep_codepoints {
            assert!(range.contains(cp) && char_map.contains(cp));
        }
        assert_eq!(plan.keep_glyphs.len(), expected.len() + 1);
        assert!(plan.keep_glyphs.contains(&0));
        assert!(!plan.preserve_name_records);
        assert!(plan.preserve_features);
    }

    #[test]
    fn shared_glyphs_are_deduplicated() {
        let char_map: CharMap = [(0x41, 1), (0x61, 1), (0x42, 2)].into_iter().collect();
        let range = RangeSet::parse("U+0041, U+0061").unwrap();
        let plan = plan(&char_map, &range, true);
        assert_eq!(plan.keep_codepoints.len(), 2);
        assert_eq!(plan.keep_glyphs.iter().copied().collect::<Vec<_>>(), [0, 1]);
    }

    #[test]
    fn full_unicode_range_against_small_font() {
        let char_map = ascii_map();
        let range = RangeSet::parse("U+0000-10FFFF").unwrap();
        let plan = plan(&char_map, &range, true);
        assert_eq!(plan.keep_codepoints.len(), char_map.len());
    }
}
