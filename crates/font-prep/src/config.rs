//! Tunable thresholds.
//!
//! Every numeric cutoff used by the coverage analyzer and the classifier lives here, so that
//! the values can be adjusted against a font corpus without recompiling. Configs are read
//! from TOML; missing sections and fields fall back to the defaults.
//!
//! ```
//! # use font_prep::Config;
//! let config = Config::from_toml(r#"
//!     [classifier]
//!     glyph_sample_count = 32
//!
//!     [coverage]
//!     full_list_threshold = 500
//! "#)?;
//! assert_eq!(config.classifier.glyph_sample_count, 32);
//! assert_eq!(config.coverage.sample_size, 20); // default
//! # Ok::<_, font_prep::ConfigError>(())
//! ```

use core::num::NonZeroUsize;
use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::errors::ConfigError;

/// Environment variable with the path to a TOML config file.
pub const CONFIG_ENV_VAR: &str = "FONT_PREP_CONFIG";

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Coverage analyzer settings.
    pub coverage: CoverageConfig,
    /// Classifier thresholds.
    pub classifier: ClassifierConfig,
    /// Cache capacities.
    pub cache: CacheConfig,
}

/// Coverage report bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    /// Requested ranges up to this many codepoints get full per-bucket codepoint lists.
    pub full_list_threshold: u64,
    /// Number of codepoints listed in each bucket's sample.
    pub sample_size: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            full_list_threshold: 1_000,
            sample_size: 20,
        }
    }
}

/// Classifier thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Case-insensitive regex matched against name table strings.
    pub barcode_name_pattern: String,
    /// Number of glyphs sampled during geometry analysis.
    pub glyph_sample_count: usize,
    /// Minimum height / width ratio of a bar-like glyph.
    pub bar_min_aspect_ratio: f64,
    /// Minimum ink area / bounding box area ratio of a bar-like glyph.
    pub bar_min_fill_ratio: f64,
    /// Share of sampled glyphs that must be bar-like to flag a barcode font.
    pub bar_majority: f64,
    /// Share of mapped codepoints in symbol-only blocks that settles a symbol font.
    pub symbol_block_ratio: f64,
    /// Minimum share of alphanumeric codepoints for a font with sampled glyphs to be textual.
    pub min_text_ratio: f64,
    /// Minimum number of mapped letters for a font to be settled as textual.
    pub min_letters: usize,
    /// Minimum number of mapped lowercase letters for a font to be settled as textual.
    pub min_lowercase: usize,
    /// Minimum share of mapped printable ASCII that belongs to the Code 39 alphabet.
    pub code39_min_overlap: f64,
    /// Maximum coefficient of variation of sampled advances for "uniform widths".
    pub width_uniformity_cv: f64,
    /// Glyph height (in ems) above which a bounding box is considered tall.
    pub tall_box_ratio: f64,
    /// Share of sampled glyphs that must be tall to count as a vertical barcode hint.
    pub tall_majority: f64,
}

impl ClassifierConfig {
    /// Default pattern for barcode-indicating font names.
    pub const DEFAULT_BARCODE_PATTERN: &'static str = r"barcode|code[\s_-]?(?:39|93|128)|\b(?:ean|upc|itf|msi)|\bqr(?:\b|code)|interleaved|plessey|codabar|pdf417|datamatrix|aztec";
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            barcode_name_pattern: Self::DEFAULT_BARCODE_PATTERN.to_owned(),
            glyph_sample_count: 20,
            bar_min_aspect_ratio: 2.0,
            bar_min_fill_ratio: 0.45,
            bar_majority: 0.5,
            symbol_block_ratio: 0.9,
            min_text_ratio: 0.5,
            min_letters: 10,
            min_lowercase: 3,
            code39_min_overlap: 0.7,
            width_uniformity_cv: 0.02,
            tall_box_ratio: 0.85,
            tall_majority: 0.6,
        }
    }
}

/// Capacities of process-lifetime caches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Parsed range specifications.
    pub range_capacity: usize,
    /// Unicode general category lookups.
    pub category_capacity: usize,
    /// Unicode character name lookups.
    pub name_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            range_capacity: 512,
            category_capacity: 8_192,
            name_capacity: 8_192,
        }
    }
}

impl CacheConfig {
    pub(crate) fn capacity(value: usize) -> NonZeroUsize {
        // Validated in `Config::validate()`; configs built in code may still pass 0.
        NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Config {
    /// Parses a config from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or contains out-of-range values.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        log::debug!("loading config from {}", path.display());
        Self::from_toml(&raw)
    }

    /// Loads a config from `path` if specified, otherwise from [`CONFIG_ENV_VAR`] if set,
    /// otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or is invalid.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let cls = &self.classifier;
        let ratios = [
            ("classifier.bar_min_fill_ratio", cls.bar_min_fill_ratio),
            ("classifier.bar_majority", cls.bar_majority),
            ("classifier.symbol_block_ratio", cls.symbol_block_ratio),
            ("classifier.min_text_ratio", cls.min_text_ratio),
            ("classifier.code39_min_overlap", cls.code39_min_overlap),
            ("classifier.tall_majority", cls.tall_majority),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    message: "must be in 0..=1",
                });
            }
        }
        if cls.bar_min_aspect_ratio <= 0.0 || cls.tall_box_ratio <= 0.0 {
            let field = if cls.bar_min_aspect_ratio <= 0.0 {
                "classifier.bar_min_aspect_ratio"
            } else {
                "classifier.tall_box_ratio"
            };
            return Err(ConfigError::OutOfRange {
                field,
                message: "must be positive",
            });
        }
        if cls.glyph_sample_count == 0 {
            return Err(ConfigError::OutOfRange {
                field: "classifier.glyph_sample_count",
                message: "must be positive",
            });
        }

        let capacities = [
            ("cache.range_capacity", self.cache.range_capacity),
            ("cache.category_capacity", self.cache.category_capacity),
            ("cache.name_capacity", self.cache.name_capacity),
        ];
        for (field, value) in capacities {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    message: "must be positive",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.coverage.full_list_threshold, 1_000);
        assert_eq!(config.classifier.glyph_sample_count, 20);
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let config = Config::from_toml(
            "[classifier]\nbar_min_aspect_ratio = 3.5\n\n[cache]\nrange_capacity = 4\n",
        )
        .unwrap();
        assert!((config.classifier.bar_min_aspect_ratio - 3.5).abs() < f64::EPSILON);
        assert!((config.classifier.bar_min_fill_ratio - 0.45).abs() < f64::EPSILON);
        assert_eq!(config.cache.range_capacity, 4);
        assert_eq!(config.cache.name_capacity, 8_192);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_toml("[classifier]\nsample_cnt = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = Config::from_toml("[classifier]\nbar_majority = 1.5\n").unwrap_err();
        assert!(
            matches!(
                err,
                ConfigError::OutOfRange {
                    field: "classifier.bar_majority",
                    ..
                }
            ),
            "{err:?}"
        );

        let err = Config::from_toml("[cache]\ncategory_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }), "{err:?}");
    }

    #[test]
    fn loading_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[coverage]\nsample_size = 5").unwrap();
        let config = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(config.coverage.sample_size, 5);

        let err = Config::load(Path::new("/definitely/missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err:?}");
    }
}
