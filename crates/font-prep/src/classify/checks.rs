//! Individual classification checks, ordered from cheapest to most expensive.

use regex::Regex;
use serde::Serialize;

use super::{CheckOutcome, FontMetadata, Signal, Verdict};
use crate::{
    config::ClassifierConfig, unicode::is_symbol_block, CharacterMap, GlyphGeometry,
    GlyphSampler, ParseError, TableTag,
};

/// Tables that only occur in color / bitmap emoji fonts.
const EMOJI_TABLES: [TableTag; 4] = [TableTag::COLR, TableTag::CBDT, TableTag::SBIX, TableTag::SVG];
/// Tables accompanying [`EMOJI_TABLES`].
const EMOJI_COMPANION_TABLES: [TableTag; 2] = [TableTag::CPAL, TableTag::CBLC];
/// Script tags that don't imply an alphabet.
const NON_ALPHABETIC_SCRIPTS: [&str; 6] = ["DFLT", "zmth", "zsym", "zsye", "brai", "musc"];
/// PANOSE family type for Latin Pictorial fonts.
const PANOSE_PICTORIAL: u8 = 5;
const CODE39_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789- .$/+%";

/// Outcome of a check together with the evidence it gathered.
#[derive(Debug)]
pub(super) struct CheckResult {
    pub(super) outcome: CheckOutcome,
    pub(super) signal: Option<Signal>,
}

impl CheckResult {
    const INCONCLUSIVE: Self = Self {
        outcome: CheckOutcome::Inconclusive,
        signal: None,
    };

    fn new(outcome: CheckOutcome, signal: Signal) -> Self {
        Self {
            outcome,
            signal: Some(signal),
        }
    }
}

/// Evidence of the script / coverage check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ScriptEvidence {
    /// The character map is empty.
    EmptyCharMap,
    /// `OS/2` PANOSE family type is Latin Pictorial.
    PictorialPanose,
    /// The `cmap` table has a Windows Symbol encoding.
    SymbolEncoding,
    /// The `cmap` table has a many-to-one (format 13) subtable.
    ManyToOneCmap,
    /// Layout tables declare alphabetic scripts.
    AlphabeticScripts {
        /// Alphabetic script tags.
        scripts: Vec<String>,
    },
    /// Share of mapped codepoints in symbol-only blocks.
    SymbolBlocks {
        /// Share in `0..=1`.
        share: f64,
    },
    /// Counts of mapped letters.
    Letters {
        /// Number of mapped alphabetic codepoints.
        letters: usize,
        /// Number of mapped lowercase codepoints.
        lowercase: usize,
    },
}

/// Code 39 barcode profile of a font's Basic Latin repertoire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Code39Profile {
    /// Share of mapped printable ASCII codepoints that belong to the Code 39 alphabet.
    pub overlap: f64,
    /// Whether the repertoire looks like Code 39 (few lowercase letters, many capitals and digits).
    pub repertoire_matches: bool,
    /// Coefficient of variation of sampled advances, if enough glyphs were sampled.
    pub advance_cv: Option<f64>,
    /// Share of sampled glyphs taller than the configured fraction of the em.
    pub tall_share: f64,
    /// Whether the whole profile matches.
    pub matches: bool,
}

/// Step 1: barcode keywords in name strings.
pub(super) fn name_keywords(pattern: &Regex, meta: &FontMetadata<'_>) -> CheckResult {
    for name in meta.names.iter() {
        if let Some(found) = pattern.find(name) {
            let signal = Signal::NameKeyword {
                name: name.to_owned(),
                keyword: found.as_str().to_owned(),
            };
            return CheckResult::new(CheckOutcome::Definitive(Verdict::Barcode), signal);
        }
    }
    CheckResult::INCONCLUSIVE
}

/// Step 2: color / bitmap glyph tables.
pub(super) fn table_signature(meta: &FontMetadata<'_>) -> CheckResult {
    let tables: Vec<_> = EMOJI_TABLES
        .into_iter()
        .filter(|&tag| meta.has_table(tag))
        .collect();
    if tables.is_empty() {
        return CheckResult::INCONCLUSIVE;
    }
    let companions = EMOJI_COMPANION_TABLES
        .into_iter()
        .filter(|&tag| meta.has_table(tag))
        .collect();
    let signal = Signal::TableSignature { tables, companions };
    CheckResult::new(CheckOutcome::Definitive(Verdict::Emoji), signal)
}

#[allow(clippy::cast_precision_loss)] // counts are bounded by the number of codepoints
fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Step 3: script tags and character map composition.
pub(super) fn script_coverage(
    config: &ClassifierConfig,
    meta: &FontMetadata<'_>,
    char_map: &dyn CharacterMap,
) -> CheckResult {
    let symbol = |evidence| {
        let signal = Signal::ScriptTag { evidence };
        CheckResult::new(CheckOutcome::Definitive(Verdict::Symbol), signal)
    };

    let codepoints = char_map.codepoints();
    if codepoints.is_empty() {
        return symbol(ScriptEvidence::EmptyCharMap);
    }
    if meta.panose_family_type == Some(PANOSE_PICTORIAL) {
        return symbol(ScriptEvidence::PictorialPanose);
    }
    if meta.has_symbol_cmap {
        return symbol(ScriptEvidence::SymbolEncoding);
    }
    if meta.has_many_to_one_cmap {
        return symbol(ScriptEvidence::ManyToOneCmap);
    }

    let scripts: Vec<_> = meta
        .script_tags
        .iter()
        .filter(|tag| !NON_ALPHABETIC_SCRIPTS.contains(&tag.as_str()))
        .cloned()
        .collect();
    if !scripts.is_empty() {
        let signal = Signal::ScriptTag {
            evidence: ScriptEvidence::AlphabeticScripts { scripts },
        };
        return CheckResult::new(CheckOutcome::Definitive(Verdict::Textual), signal);
    }

    let symbol_count = codepoints.iter().filter(|&&cp| is_symbol_block(cp)).count();
    let symbol_share = share(symbol_count, codepoints.len());
    if symbol_share >= config.symbol_block_ratio {
        return symbol(ScriptEvidence::SymbolBlocks {
            share: symbol_share,
        });
    }

    let (mut letters, mut lowercase) = (0, 0);
    for ch in codepoints.iter().filter_map(|&cp| char::from_u32(cp)) {
        if ch.is_alphabetic() {
            letters += 1;
            lowercase += usize::from(ch.is_lowercase());
        }
    }
    if letters >= config.min_letters && lowercase >= config.min_lowercase {
        let signal = Signal::ScriptTag {
            evidence: ScriptEvidence::Letters { letters, lowercase },
        };
        return CheckResult::new(CheckOutcome::Definitive(Verdict::Textual), signal);
    }

    if symbol_count > 0 {
        let signal = Signal::ScriptTag {
            evidence: ScriptEvidence::SymbolBlocks {
                share: symbol_share,
            },
        };
        CheckResult::new(CheckOutcome::Candidate(Verdict::Symbol), signal)
    } else {
        CheckResult::INCONCLUSIVE
    }
}

/// Picks up to `count` evenly spaced elements of `codepoints`.
fn evenly_spaced(codepoints: &[u32], count: usize) -> impl Iterator<Item = u32> + '_ {
    let len = codepoints.len();
    let count = count.min(len);
    (0..count).map(move |i| codepoints[i * len / count])
}

fn sample_geometry(
    sampler: &dyn GlyphSampler,
    codepoints: impl Iterator<Item = u32>,
) -> Result<Vec<GlyphGeometry>, ParseError> {
    let mut samples = vec![];
    for cp in codepoints {
        if let Some(geometry) = sampler.glyph_geometry(cp)? {
            samples.push(geometry);
        }
    }
    Ok(samples)
}

#[allow(clippy::cast_precision_loss)] // sample sizes are small
fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let len = values.len() as f64;
    let mean = values.iter().sum::<f64>() / len;
    if mean <= 0.0 {
        return None;
    }
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / len;
    Some(variance.sqrt() / mean)
}

fn code39_profile(
    config: &ClassifierConfig,
    meta: &FontMetadata<'_>,
    char_map: &dyn CharacterMap,
    sampler: &dyn GlyphSampler,
) -> Result<Code39Profile, ParseError> {
    const MIN_LATIN: usize = 10;
    const MIN_ADVANCE_SAMPLES: usize = 5;

    let codepoints = char_map.codepoints();
    let start = codepoints.partition_point(|&cp| cp < 0x20);
    let end = codepoints.partition_point(|&cp| cp <= 0x7E);
    let latin = &codepoints[start..end];
    if latin.len() < MIN_LATIN {
        return Ok(Code39Profile::default());
    }

    let (mut uppers, mut lowers, mut digits, mut in_alphabet) = (0, 0, 0, 0);
    for &cp in latin {
        let Ok(byte) = u8::try_from(cp) else {
            continue;
        };
        uppers += usize::from(byte.is_ascii_uppercase());
        lowers += usize::from(byte.is_ascii_lowercase());
        digits += usize::from(byte.is_ascii_digit());
        in_alphabet += usize::from(CODE39_ALPHABET.contains(&byte));
    }
    let overlap = share(in_alphabet, latin.len());
    let repertoire_matches =
        overlap >= config.code39_min_overlap && lowers <= 2 && uppers + digits >= MIN_LATIN;
    if !repertoire_matches {
        return Ok(Code39Profile {
            overlap,
            ..Code39Profile::default()
        });
    }

    let sample_len = config.glyph_sample_count.min(latin.len());
    let samples = sample_geometry(sampler, latin[..sample_len].iter().copied())?;
    let advances: Vec<_> = samples.iter().map(|glyph| f64::from(glyph.advance)).collect();
    let advance_cv = if advances.len() >= MIN_ADVANCE_SAMPLES {
        coefficient_of_variation(&advances)
    } else {
        None
    };
    let widths_uniform = advance_cv.is_some_and(|cv| cv < config.width_uniformity_cv);

    let units_per_em = f64::from(meta.units_per_em);
    let tall_count = samples
        .iter()
        .filter(|glyph| {
            units_per_em > 0.0 && f64::from(glyph.bbox.height()) / units_per_em > config.tall_box_ratio
        })
        .count();
    let tall_share = share(tall_count, samples.len());
    // A missing x-height is treated as zero.
    let vertical_hint = meta.x_height.unwrap_or(0) == 0 || tall_share >= config.tall_majority;

    Ok(Code39Profile {
        overlap,
        repertoire_matches,
        advance_cv,
        tall_share,
        matches: widths_uniform && vertical_hint,
    })
}

/// Step 4: sampled glyph shapes.
pub(super) fn glyph_geometry(
    config: &ClassifierConfig,
    meta: &FontMetadata<'_>,
    char_map: &dyn CharacterMap,
    sampler: &dyn GlyphSampler,
) -> Result<CheckResult, ParseError> {
    let codepoints = char_map.codepoints();
    let samples = sample_geometry(
        sampler,
        evenly_spaced(codepoints, config.glyph_sample_count),
    )?;
    let bar_like = samples
        .iter()
        .filter(|glyph| {
            glyph.aspect_ratio() >= config.bar_min_aspect_ratio
                && glyph.fill_ratio() >= config.bar_min_fill_ratio
        })
        .count();
    let bar_share = share(bar_like, samples.len());
    let alphanumeric = codepoints
        .iter()
        .filter_map(|&cp| char::from_u32(cp))
        .filter(|ch| ch.is_alphanumeric())
        .count();
    let text_ratio = share(alphanumeric, codepoints.len());

    let mut signal = Signal::GlyphGeometryStat {
        sampled: samples.len(),
        bar_like,
        bar_share,
        text_ratio,
        code39: None,
    };
    log::debug!("sampled glyph geometry: {signal:?}");

    if !samples.is_empty() && bar_share > config.bar_majority {
        return Ok(CheckResult::new(
            CheckOutcome::Definitive(Verdict::Barcode),
            signal,
        ));
    }

    let profile = code39_profile(config, meta, char_map, sampler)?;
    let is_code39 = profile.matches;
    if let Signal::GlyphGeometryStat { code39, .. } = &mut signal {
        *code39 = Some(profile);
    }
    if is_code39 {
        return Ok(CheckResult::new(
            CheckOutcome::Definitive(Verdict::Barcode),
            signal,
        ));
    }

    let outcome = if !samples.is_empty() && text_ratio < config.min_text_ratio {
        CheckOutcome::Definitive(Verdict::Symbol)
    } else {
        CheckOutcome::Inconclusive
    };
    Ok(CheckResult::new(outcome, signal))
}
