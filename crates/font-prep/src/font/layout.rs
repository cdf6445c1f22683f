//! Script lists of OpenType layout tables (`GSUB`, `GPOS`).

use std::collections::BTreeSet;

use super::{Cursor, Font, TableTag};
use crate::{errors::ParseErrorKind, ParseError};

fn collect_script_tags(raw: &[u8], tags: &mut BTreeSet<String>) -> Result<(), ParseError> {
    let table = Cursor::new(raw);
    let mut cursor = table;
    cursor.read_u16_checked(|major_version| {
        if major_version != 1 {
            return Err(ParseErrorKind::UnexpectedTableVersion {
                version: major_version.into(),
            });
        }
        Ok(())
    })?;
    cursor.skip(2)?; // minor version
    let script_list_offset = cursor.read_u16()?;
    if script_list_offset == 0 {
        return Ok(());
    }

    let mut script_list = table.at(script_list_offset.into())?;
    let script_count = script_list.read_u16()?;
    for _ in 0..script_count {
        let tag = script_list.read_byte_array::<4>()?;
        script_list.skip(2)?; // script table offset
        tags.insert(String::from_utf8_lossy(&tag).into_owned());
    }
    Ok(())
}

impl Font<'_> {
    /// Returns script tags declared in the `GSUB` and `GPOS` tables, deduplicated and sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if a layout table header is corrupt.
    pub fn script_tags(&self) -> Result<Vec<String>, ParseError> {
        let mut tags = BTreeSet::new();
        for tag in [TableTag::GSUB, TableTag::GPOS] {
            if let Some(Some(raw)) = self.tables.get(tag) {
                collect_script_tags(raw, &mut tags).map_err(|err| err.with_table(tag))?;
            }
        }
        Ok(tags.into_iter().collect())
    }
}
