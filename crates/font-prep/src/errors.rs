use core::{fmt, ops};
use std::{io, path::PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::TableTag;

/// Kind of a font [`ParseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Unexpected end of the font data.
    #[error("unexpected end of the font data")]
    UnexpectedEof,
    /// Unexpected font version (e.g., a font collection or WOFF 1.0 file).
    #[error("unexpected font version ({0:#010x})")]
    UnexpectedFontVersion(u32),
    /// Missing required font table (e.g., `head`).
    #[error("missing required font table")]
    MissingTable,
    /// No supported subtable in the `cmap` table.
    #[error("no supported subtable in the `cmap` table")]
    NoSupportedCmap,
    /// Offset inferred from the table data is out of bounds.
    #[error("offset ({0}) inferred from the table data is out of bounds")]
    OffsetOutOfBounds(usize),
    /// Range inferred from the table data is out of bounds.
    #[error("range ({range:?}) inferred from the table data is out of bounds (..{len})")]
    RangeOutOfBounds {
        /// Inferred range.
        range: ops::Range<usize>,
        /// Length of the indexed data.
        len: usize,
    },
    /// Unexpected table version.
    #[error("unexpected table version ({version})")]
    UnexpectedTableVersion {
        /// Version read from the table data.
        version: u32,
    },
    /// Unexpected table length.
    #[error("unexpected table length: expected {expected}, got {actual}")]
    UnexpectedTableLen {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// Unexpected table format (e.g., for a `cmap` subtable).
    #[error("unexpected table format ({format})")]
    UnexpectedTableFormat {
        /// Format read from the table data.
        format: u16,
    },
    /// Unexpected `indexToLocFormat` value in the `head` table.
    #[error("unexpected `loca` format ({0})")]
    UnexpectedLocaFormat(i16),
    /// Glyph index is not covered by the `loca` table.
    #[error("glyph #{0} is out of bounds")]
    GlyphOutOfBounds(u16),
    /// Composite glyphs are nested too deeply (or form a cycle).
    #[error("composite glyph nesting exceeds {0} levels")]
    CompositeTooDeep(usize),
    /// Table is stored with a WOFF2 transform, which is not supported.
    #[error("table is stored with an unsupported WOFF2 transform")]
    TransformedTable,
    /// Invalid variable-length integer in WOFF2 data.
    #[error("invalid UIntBase128 value")]
    InvalidBase128,
    /// Brotli decompression of WOFF2 data failed.
    #[error("brotli decompression failed: {0}")]
    Decompression(String),
}

/// Errors that can occur when reading a [`Font`](crate::Font).
#[derive(Debug)]
pub struct ParseError {
    pub(crate) kind: ParseErrorKind,
    pub(crate) offset: usize,
    pub(crate) table: Option<TableTag>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = self.table {
            write!(formatter, "[{table}] ")?;
        }
        if self.offset > 0 {
            write!(formatter, "{}: ", self.offset)?;
        }
        fmt::Display::fmt(&self.kind, formatter)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind) -> Self {
        Self {
            kind,
            offset: 0,
            table: None,
        }
    }

    pub(crate) fn missing_table(tag: TableTag) -> Self {
        Self {
            kind: ParseErrorKind::MissingTable,
            offset: 0,
            table: Some(tag),
        }
    }

    pub(crate) fn transformed_table(tag: TableTag) -> Self {
        Self {
            kind: ParseErrorKind::TransformedTable,
            offset: 0,
            table: Some(tag),
        }
    }

    #[must_use]
    pub(crate) fn with_table(mut self, tag: TableTag) -> Self {
        self.table.get_or_insert(tag);
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Gets the table this error relates to.
    pub fn table(&self) -> Option<TableTag> {
        self.table
    }

    /// Gets the offset in the font data.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Errors produced when parsing a Unicode range specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RangeError {
    /// Token is neither `U+HHHH` nor `U+HHHH-HHHH`.
    #[error("malformed range token `{token}`; expected `U+HHHH` or `U+HHHH-HHHH`")]
    Malformed {
        /// Offending token, trimmed.
        token: String,
    },
    /// Upper bound of an interval is less than its lower bound.
    #[error("range upper bound U+{high:04X} is less than lower bound U+{low:04X}")]
    Order {
        /// Lower bound.
        low: u32,
        /// Upper bound.
        high: u32,
    },
    /// Value exceeds the maximum valid codepoint.
    #[error("U+{value:04X} exceeds the maximum codepoint U+10FFFF")]
    Bounds {
        /// Offending value.
        value: u32,
    },
}

impl RangeError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed { .. } => ErrorKind::MalformedRangeError,
            Self::Order { .. } => ErrorKind::RangeOrderError,
            Self::Bounds { .. } => ErrorKind::RangeBoundsError,
        }
    }
}

/// Errors produced when loading a [`Config`](crate::Config).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Config is not valid TOML or does not match the expected schema.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    /// Barcode name pattern is not a valid regular expression.
    #[error("invalid barcode name pattern: {0}")]
    Pattern(#[from] regex::Error),
    /// Value is out of its allowed range.
    #[error("invalid value for `{field}`: {message}")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Explanation.
        message: &'static str,
    },
}

/// Kind of an [`Error`] as reported across the process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Range token is malformed.
    MalformedRangeError,
    /// Range bounds are reversed.
    RangeOrderError,
    /// Range value exceeds U+10FFFF.
    RangeBoundsError,
    /// Font file cannot be read or is corrupt.
    FontAccessError,
    /// Font metadata bundle lacks an accessor required by the classifier.
    ClassificationPreconditionError,
    /// Configuration is invalid.
    ConfigError,
}

impl ErrorKind {
    /// Returns the stable name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRangeError => "MalformedRangeError",
            Self::RangeOrderError => "RangeOrderError",
            Self::RangeBoundsError => "RangeBoundsError",
            Self::FontAccessError => "FontAccessError",
            Self::ClassificationPreconditionError => "ClassificationPreconditionError",
            Self::ConfigError => "ConfigError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Top-level error type of this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid Unicode range specification.
    #[error(transparent)]
    Range(#[from] RangeError),
    /// Font data is corrupt or unsupported.
    #[error("cannot read font: {0}")]
    FontAccess(#[from] ParseError),
    /// Font file cannot be read from disk.
    #[error("cannot read font file {}: {source}", path.display())]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Font metadata bundle misses an accessor required by a classification step.
    #[error("classification precondition violated: missing {0}")]
    ClassificationPrecondition(&'static str),
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Range(err) => err.kind(),
            Self::FontAccess(_) | Self::Io { .. } => ErrorKind::FontAccessError,
            Self::ClassificationPrecondition(_) => ErrorKind::ClassificationPreconditionError,
            Self::Config(_) => ErrorKind::ConfigError,
        }
    }
}
