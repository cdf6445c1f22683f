//! Unicode character properties used by reports and heuristics.

use core::fmt;

use serde::Serialize;
use unicode_general_category::{get_general_category, GeneralCategory};

use crate::{cache::BoundedCache, config::CacheConfig};

/// Coarse bucket of a Unicode general category used in coverage reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBucket {
    /// Letters, numbers, punctuation, symbols and separators.
    Visible,
    /// Combining marks (`Mn`, `Mc`, `Me`).
    Combining,
    /// Controls, format characters, surrogates, private use and unassigned codepoints
    /// (`Cc`, `Cf`, `Cs`, `Co`, `Cn`); these are often missing from fonts by design.
    ControlOrFormat,
}

impl CategoryBucket {
    /// All buckets in report order.
    pub const ALL: [Self; 3] = [Self::Visible, Self::Combining, Self::ControlOrFormat];

    /// Determines the bucket of a codepoint.
    pub fn of(cp: u32) -> Self {
        // Surrogates are the only codepoints without a `char`.
        let Some(ch) = char::from_u32(cp) else {
            return Self::ControlOrFormat;
        };
        match get_general_category(ch) {
            GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::EnclosingMark => Self::Combining,
            GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned => Self::ControlOrFormat,
            _ => Self::Visible,
        }
    }

    /// Returns the snake-case name used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Combining => "combining",
            Self::ControlOrFormat => "control_or_format",
        }
    }
}

impl fmt::Display for CategoryBucket {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Name reported for codepoints without a Unicode character name.
pub(crate) const UNASSIGNED_NAME: &str = "<UNASSIGNED>";

/// Category and name lookups with bounded memoization.
#[derive(Debug)]
pub struct UnicodeLookup {
    categories: BoundedCache<u32, CategoryBucket>,
    names: BoundedCache<u32, String>,
}

impl Default for UnicodeLookup {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl UnicodeLookup {
    /// Creates a lookup with cache capacities from `config`.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            categories: BoundedCache::new(CacheConfig::capacity(config.category_capacity)),
            names: BoundedCache::new(CacheConfig::capacity(config.name_capacity)),
        }
    }

    /// Returns the category bucket of `cp`.
    pub fn bucket(&mut self, cp: u32) -> CategoryBucket {
        self.categories
            .get_or_insert_with(&cp, |&cp| CategoryBucket::of(cp))
    }

    /// Returns the Unicode name of `cp`, or `<UNASSIGNED>` for unassigned codepoints.
    pub fn name(&mut self, cp: u32) -> String {
        self.names.get_or_insert_with(&cp, |&cp| {
            char::from_u32(cp)
                .and_then(unicode_names2::name)
                .map_or_else(|| UNASSIGNED_NAME.to_owned(), |name| name.to_string())
        })
    }

    /// Formats `cp` as `U+0041: LATIN CAPITAL LETTER A`.
    pub fn describe(&mut self, cp: u32) -> String {
        let name = self.name(cp);
        format!("U+{cp:04X}: {name}")
    }

    /// Returns the category cache.
    pub fn category_cache(&self) -> &BoundedCache<u32, CategoryBucket> {
        &self.categories
    }

    /// Returns the name cache.
    pub fn name_cache(&self) -> &BoundedCache<u32, String> {
        &self.names
    }
}

/// Blocks whose characters are symbols rather than text, as `(first, last)` pairs.
const SYMBOL_BLOCKS: &[(u32, u32)] = &[
    (0x2190, 0x21FF),     // Arrows
    (0x2200, 0x22FF),     // Mathematical Operators
    (0x2300, 0x23FF),     // Miscellaneous Technical
    (0x2400, 0x243F),     // Control Pictures
    (0x2500, 0x257F),     // Box Drawing
    (0x2580, 0x259F),     // Block Elements
    (0x25A0, 0x25FF),     // Geometric Shapes
    (0x2600, 0x26FF),     // Miscellaneous Symbols
    (0x2700, 0x27BF),     // Dingbats
    (0x27F0, 0x27FF),     // Supplemental Arrows-A
    (0x2800, 0x28FF),     // Braille Patterns
    (0x2900, 0x297F),     // Supplemental Arrows-B
    (0x2B00, 0x2BFF),     // Miscellaneous Symbols and Arrows
    (0xE000, 0xF8FF),     // Private Use Area
    (0x1D100, 0x1D1FF),   // Musical Symbols
    (0x1F000, 0x1F02F),   // Mahjong Tiles
    (0x1F030, 0x1F09F),   // Domino Tiles
    (0x1F0A0, 0x1F0FF),   // Playing Cards
    (0x1F300, 0x1F5FF),   // Miscellaneous Symbols and Pictographs
    (0x1F600, 0x1F64F),   // Emoticons
    (0x1F650, 0x1F67F),   // Ornamental Dingbats
    (0x1F680, 0x1F6FF),   // Transport and Map Symbols
    (0x1F700, 0x1F77F),   // Alchemical Symbols
    (0x1F780, 0x1F7FF),   // Geometric Shapes Extended
    (0x1F800, 0x1F8FF),   // Supplemental Arrows-C
    (0x1F900, 0x1F9FF),   // Supplemental Symbols and Pictographs
    (0x1FA00, 0x1FA6F),   // Chess Symbols
    (0x1FA70, 0x1FAFF),   // Symbols and Pictographs Extended-A
    (0xF0000, 0x10FFFF),  // Supplementary Private Use Areas
];

/// Checks whether `cp` belongs to a symbol-only block.
pub(crate) fn is_symbol_block(cp: u32) -> bool {
    let idx = SYMBOL_BLOCKS.partition_point(|&(_, last)| last < cp);
    SYMBOL_BLOCKS
        .get(idx)
        .is_some_and(|&(first, _)| first <= cp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucketing_codepoints() {
        assert_eq!(CategoryBucket::of(u32::from('A')), CategoryBucket::Visible);
        assert_eq!(CategoryBucket::of(0x20), CategoryBucket::Visible);
        assert_eq!(CategoryBucket::of(0x0301), CategoryBucket::Combining);
        assert_eq!(CategoryBucket::of(0x0007), CategoryBucket::ControlOrFormat);
        assert_eq!(CategoryBucket::of(0x200D), CategoryBucket::ControlOrFormat);
        assert_eq!(CategoryBucket::of(0xD800), CategoryBucket::ControlOrFormat);
        assert_eq!(CategoryBucket::of(0xE000), CategoryBucket::ControlOrFormat);
        assert_eq!(CategoryBucket::of(0x0378), CategoryBucket::ControlOrFormat);
    }

    #[test]
    fn naming_codepoints() {
        let mut lookup = UnicodeLookup::default();
        assert_eq!(lookup.describe(0x41), "U+0041: LATIN CAPITAL LETTER A");
        assert_eq!(lookup.name(0x0378), UNASSIGNED_NAME);
        assert_eq!(lookup.name(0xD800), UNASSIGNED_NAME);

        lookup.name(0x41);
        assert_eq!(lookup.name_cache().stats().hits, 1);
    }

    #[test]
    fn category_lookups_are_cached() {
        let mut lookup = UnicodeLookup::default();
        for _ in 0..3 {
            assert_eq!(lookup.bucket(0x301), CategoryBucket::Combining);
        }
        assert_eq!(lookup.category_cache().stats().misses, 1);
        assert_eq!(lookup.category_cache().stats().hits, 2);
    }

    #[test]
    fn symbol_blocks() {
        assert!(is_symbol_block(0x2190));
        assert!(is_symbol_block(0x2665)); // BLACK HEART SUIT
        assert!(is_symbol_block(0xF041));
        assert!(is_symbol_block(0x1F600));
        assert!(is_symbol_block(0x10_FFFD));
        assert!(!is_symbol_block(u32::from('A')));
        assert!(!is_symbol_block(0x2460)); // Enclosed Alphanumerics
        assert!(!is_symbol_block(0x4E00));
    }

    #[test]
    fn symbol_blocks_are_sorted() {
        for pair in SYMBOL_BLOCKS.windows(2) {
            assert!(pair[0].1 < pair[1].0, "{pair:?}");
        }
    }
}
