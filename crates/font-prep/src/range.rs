//! Unicode range specifications (`U+0000-00FF, U+0131`) and their canonical interval form.

use core::{fmt, ops, str::FromStr};

use serde::{Serialize, Serializer};

use crate::{cache::BoundedCache, config::CacheConfig, errors::RangeError};

/// Maximum valid Unicode codepoint.
pub const MAX_CODEPOINT: u32 = 0x10_FFFF;

/// Inclusive interval of codepoints; `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodepointInterval {
    low: u32,
    high: u32,
}

impl CodepointInterval {
    /// Creates an interval.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound exceeds [`MAX_CODEPOINT`], or if `high < low`.
    pub fn new(low: u32, high: u32) -> Result<Self, RangeError> {
        for value in [low, high] {
            if value > MAX_CODEPOINT {
                return Err(RangeError::Bounds { value });
            }
        }
        if high < low {
            return Err(RangeError::Order { low, high });
        }
        Ok(Self { low, high })
    }

    /// Lower bound (inclusive).
    pub fn low(self) -> u32 {
        self.low
    }

    /// Upper bound (inclusive).
    pub fn high(self) -> u32 {
        self.high
    }

    /// Number of codepoints in this interval.
    pub fn len(self) -> u64 {
        u64::from(self.high - self.low) + 1
    }

    /// Always `false`; intervals contain at least one codepoint.
    pub fn is_empty(self) -> bool {
        false
    }

    /// Checks whether this interval contains a single codepoint.
    pub fn is_singleton(self) -> bool {
        self.low == self.high
    }

    /// Checks whether `cp` belongs to this interval.
    pub fn contains(self, cp: u32) -> bool {
        (self.low..=self.high).contains(&cp)
    }

    /// Iterates over codepoints in this interval.
    pub fn iter(self) -> ops::RangeInclusive<u32> {
        self.low..=self.high
    }
}

impl fmt::Display for CodepointInterval {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_singleton() {
            write!(formatter, "U+{:04X}", self.low)
        } else {
            write!(formatter, "U+{:04X}-{:04X}", self.low, self.high)
        }
    }
}

/// Canonical set of codepoints: sorted intervals that neither overlap nor touch.
///
/// The set is never expanded into individual codepoints; [`Self::len()`] and
/// [`Self::contains()`] work on intervals, and [`Self::iter()`] is lazy.
///
/// ```
/// # use font_prep::RangeSet;
/// let set: RangeSet = "U+0041-0043, U+0044, U+0061".parse()?;
/// assert_eq!(set.to_string(), "U+0041-0044, U+0061");
/// assert_eq!(set.len(), 5);
/// assert!(set.contains(0x42));
/// # Ok::<_, font_prep::RangeError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RangeSet {
    intervals: Vec<CodepointInterval>,
}

impl RangeSet {
    /// Parses a range specification.
    ///
    /// Tokens are separated by commas with optional whitespace; each token is `U+HHHH` or
    /// `U+HHHH-HHHH` with 1 to 6 hex digits per bound.
    ///
    /// # Errors
    ///
    /// - [`RangeError::Malformed`] if a token (including an empty one) does not follow the grammar
    /// - [`RangeError::Bounds`] if a value exceeds U+10FFFF
    /// - [`RangeError::Order`] if an interval's upper bound is less than its lower bound
    pub fn parse(spec: &str) -> Result<Self, RangeError> {
        let intervals = spec
            .split(',')
            .map(|token| parse_token(token.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_intervals(intervals))
    }

    /// Builds a canonical set from arbitrary (possibly overlapping) intervals.
    pub fn from_intervals(mut intervals: Vec<CodepointInterval>) -> Self {
        intervals.sort_unstable();
        let mut merged: Vec<CodepointInterval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                // `high < MAX_CODEPOINT` so `+ 1` doesn't overflow in practice; saturate anyway.
                Some(last) if interval.low <= last.high.saturating_add(1) => {
                    last.high = last.high.max(interval.high);
                }
                _ => merged.push(interval),
            }
        }
        Self { intervals: merged }
    }

    /// Returns canonical intervals in ascending order.
    pub fn intervals(&self) -> &[CodepointInterval] {
        &self.intervals
    }

    /// Iterates over single-codepoint intervals.
    pub fn singletons(&self) -> impl Iterator<Item = u32> + '_ {
        self.intervals
            .iter()
            .filter(|interval| interval.is_singleton())
            .map(|interval| interval.low)
    }

    /// Total number of codepoints, computed without materializing them.
    pub fn len(&self) -> u64 {
        self.intervals.iter().map(|interval| interval.len()).sum()
    }

    /// Checks whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Checks whether `cp` belongs to the set (binary search over intervals).
    pub fn contains(&self, cp: u32) -> bool {
        let idx = self.intervals.partition_point(|interval| interval.high < cp);
        self.intervals
            .get(idx)
            .is_some_and(|interval| interval.low <= cp)
    }

    /// Lazily iterates over all codepoints in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.intervals.iter().flat_map(|interval| interval.iter())
    }

    /// Filters an ascending sequence of codepoints down to those in this set.
    ///
    /// Runs in `O(n + intervals)` by walking both sequences in lockstep.
    pub fn intersect_sorted<'s, I>(&'s self, codepoints: I) -> impl Iterator<Item = u32> + 's
    where
        I: IntoIterator<Item = u32>,
        I::IntoIter: 's,
    {
        let mut intervals = self.intervals.iter().peekable();
        codepoints.into_iter().filter(move |&cp| {
            while let Some(interval) = intervals.peek() {
                if interval.high < cp {
                    intervals.next();
                } else {
                    return interval.low <= cp;
                }
            }
            false
        })
    }

    /// Renders each interval in the canonical `U+HHHH[-HHHH]` form.
    pub fn normalized_ranges(&self) -> Vec<String> {
        self.intervals.iter().map(ToString::to_string).collect()
    }
}

fn parse_token(token: &str) -> Result<CodepointInterval, RangeError> {
    let malformed = || RangeError::Malformed {
        token: token.to_owned(),
    };

    let body = token
        .strip_prefix("U+")
        .or_else(|| token.strip_prefix("u+"))
        .ok_or_else(malformed)?;
    let (low, high) = match body.split_once('-') {
        Some((low, high)) => (low, Some(high)),
        None => (body, None),
    };
    let low = parse_hex(low).ok_or_else(malformed)?;
    let high = match high {
        Some(high) => parse_hex(high).ok_or_else(malformed)?,
        None => low,
    };
    CodepointInterval::new(low, high)
}

fn parse_hex(digits: &str) -> Option<u32> {
    let is_valid = (1..=6).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_hexdigit());
    if is_valid {
        u32::from_str_radix(digits, 16).ok()
    } else {
        None
    }
}

impl FromStr for RangeSet {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                formatter.write_str(", ")?;
            }
            fmt::Display::fmt(interval, formatter)?;
        }
        Ok(())
    }
}

impl Serialize for RangeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.intervals.iter().map(ToString::to_string))
    }
}

impl FromIterator<CodepointInterval> for RangeSet {
    fn from_iter<I: IntoIterator<Item = CodepointInterval>>(iter: I) -> Self {
        Self::from_intervals(iter.into_iter().collect())
    }
}

/// Range parser memoizing results by the exact input string.
///
/// Parsing is pure, so the cache only saves work; errors are never cached.
#[derive(Debug)]
pub struct RangeParser {
    cache: BoundedCache<String, RangeSet>,
}

impl Default for RangeParser {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl RangeParser {
    /// Creates a parser with the cache capacity from `config`.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache: BoundedCache::new(CacheConfig::capacity(config.range_capacity)),
        }
    }

    /// Parses `spec`, consulting the cache first.
    ///
    /// # Errors
    ///
    /// See [`RangeSet::parse()`].
    pub fn parse(&mut self, spec: &str) -> Result<RangeSet, RangeError> {
        self.cache.get_or_try_insert_with(spec, |spec| {
            let parsed = RangeSet::parse(spec)?;
            log::debug!(
                "parsed range spec into {} interval(s), {} codepoint(s)",
                parsed.intervals.len(),
                parsed.len()
            );
            Ok(parsed)
        })
    }

    /// Returns the parse cache.
    pub fn cache(&self) -> &BoundedCache<String, RangeSet> {
        &self.cache
    }
}
