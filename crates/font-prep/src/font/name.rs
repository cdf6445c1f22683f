//! `name` table processing.

use serde::Serialize;

use super::{Cursor, Font, TableTag};
use crate::{errors::ParseErrorKind, ParseError};

/// Strings from the `name` table relevant for font identification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameStrings {
    /// Font family name (name ID 1).
    pub family: Option<String>,
    /// Font subfamily name (name ID 2).
    pub subfamily: Option<String>,
    /// Full font name (name ID 4).
    pub full_name: Option<String>,
    /// PostScript name (name ID 6).
    pub postscript_name: Option<String>,
}

impl NameStrings {
    const FAMILY: u16 = 1;
    const SUBFAMILY: u16 = 2;
    const FULL_NAME: u16 = 4;
    const POSTSCRIPT_NAME: u16 = 6;

    /// Iterates over present strings.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        [
            &self.family,
            &self.subfamily,
            &self.full_name,
            &self.postscript_name,
        ]
        .into_iter()
        .filter_map(Option::as_deref)
    }
}

#[derive(Debug, Clone, Copy)]
struct NameRecord {
    platform_id: u16,
    encoding_id: u16,
    language_id: u16,
    name_id: u16,
    length: u16,
    offset: u16,
}

impl NameRecord {
    /// Lower is better; `None` for encodings that cannot be decoded.
    fn priority(&self) -> Option<u8> {
        match (self.platform_id, self.encoding_id, self.language_id) {
            (3, 1, 0x409) => Some(0),
            (3, 1 | 10, _) => Some(1),
            (0, _, _) => Some(2),
            (1, 0, 0) => Some(3),
            _ => None,
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if self.platform_id == 1 {
            // Mac Roman; only the ASCII subset is decoded faithfully.
            return bytes
                .iter()
                .map(|&byte| {
                    if byte.is_ascii() {
                        char::from(byte)
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect();
        }
        let units = bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]));
        char::decode_utf16(units)
            .map(|ch| ch.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

fn parse_names(raw: &[u8]) -> Result<NameStrings, ParseError> {
    let table = Cursor::new(raw);
    let mut cursor = table;
    cursor.read_u16_checked(|format| {
        if format > 1 {
            return Err(ParseErrorKind::UnexpectedTableFormat { format });
        }
        Ok(())
    })?;
    let count = cursor.read_u16()?;
    let storage = table.at(cursor.read_u16()?.into())?;

    let mut best: [Option<(u8, String)>; 4] = Default::default();
    for _ in 0..count {
        let record = NameRecord {
            platform_id: cursor.read_u16()?,
            encoding_id: cursor.read_u16()?,
            language_id: cursor.read_u16()?,
            name_id: cursor.read_u16()?,
            length: cursor.read_u16()?,
            offset: cursor.read_u16()?,
        };
        let Some(priority) = record.priority() else {
            continue;
        };
        let slot_idx = match record.name_id {
            NameStrings::FAMILY => 0,
            NameStrings::SUBFAMILY => 1,
            NameStrings::FULL_NAME => 2,
            NameStrings::POSTSCRIPT_NAME => 3,
            _ => continue,
        };
        if best[slot_idx]
            .as_ref()
            .is_some_and(|&(best_priority, _)| best_priority <= priority)
        {
            continue;
        }

        let start = usize::from(record.offset);
        let bytes = storage.range(start..start + usize::from(record.length))?;
        best[slot_idx] = Some((priority, record.decode(bytes.bytes)));
    }

    let [family, subfamily, full_name, postscript_name] = best.map(|entry| entry.map(|(_, s)| s));
    Ok(NameStrings {
        family,
        subfamily,
        full_name,
        postscript_name,
    })
}

impl Font<'_> {
    /// Reads identification strings from the `name` table. A missing table yields empty strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the `name` table is corrupt.
    pub fn names(&self) -> Result<NameStrings, ParseError> {
        match self.tables.get(TableTag::NAME) {
            Some(Some(raw)) => parse_names(raw).map_err(|err| err.with_table(TableTag::NAME)),
            _ => Ok(NameStrings::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{name_table, utf16};

    #[test]
    fn windows_english_names_are_preferred() {
        let mac_family = b"Mac Family".as_slice();
        let win_family = utf16("Win Family");
        let full_name = utf16("Win Family Bold");
        let raw = name_table(&[
            (1, 0, 0, 1, mac_family),
            (3, 1, 0x409, 1, win_family.as_slice()),
            (3, 1, 0x407, 4, full_name.as_slice()),
            (3, 1, 0x409, 13, b"\0L".as_slice()),
        ]);
        let names = parse_names(&raw).unwrap();
        assert_eq!(names.family.as_deref(), Some("Win Family"));
        assert_eq!(names.full_name.as_deref(), Some("Win Family Bold"));
        assert_eq!(names.subfamily, None);
        assert_eq!(names.iter().count(), 2);
    }

    #[test]
    fn out_of_bounds_string_is_an_error() {
        let mut raw = name_table(&[(3, 1, 0x409, 1, utf16("Family").as_slice())]);
        raw.truncate(raw.len() - 2);
        let err = parse_names(&raw).unwrap_err();
        assert!(
            matches!(err.kind(), ParseErrorKind::RangeOutOfBounds { .. }),
            "{err}"
        );
    }
}
