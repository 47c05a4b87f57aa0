//! Decoding of strings from the `name` table.

use encoding_rs::{DecoderResult, Encoding, MACINTOSH, UTF_16BE};
use log::warn;

use crate::binary::read::ReadScope;
use crate::error::ParseError;
use crate::tables::NameTable;

pub const NAME_ID_POSTSCRIPT_NAME: u16 = 6;

/// Longest name accepted by PostScript interpreters for a font.
pub const MAX_POSTSCRIPT_NAME_LEN: usize = 63;

/// Records searched for a name, most preferred first: Windows Unicode BMP US English, then
/// Macintosh Roman.
const NAME_SOURCES: [(u16, u16, Option<u16>, &Encoding); 2] =
    [(3, 1, Some(0x409), UTF_16BE), (1, 0, None, MACINTOSH)];

/// Look up `name_id` in the `name` table data, decoding it to a `String`.
///
/// Only the Windows English and Macintosh Roman records are consulted. Records that fail to
/// decode are skipped.
pub fn get_name(name_table_data: &[u8], name_id: u16) -> Result<Option<String>, ParseError> {
    let name_table = ReadScope::new(name_table_data).read::<NameTable<'_>>()?;
    for &(platform_id, encoding_id, language_id, encoding) in NAME_SOURCES.iter() {
        let record = name_table.name_records.iter().find(|record| {
            record.platform_id == platform_id
                && record.encoding_id == encoding_id
                && language_id.map_or(true, |lang| record.language_id == lang)
                && record.name_id == name_id
        });
        if let Some(record) = record {
            let data = name_table.string_data(&record)?;
            if let Some(name) = decode_name(encoding, data) {
                return Ok(Some(name));
            }
        }
    }
    Ok(None)
}

/// The PostScript name of the font, restricted to characters that are legal in a PostScript
/// name literal.
///
/// Returns an empty string, after logging, if the font does not name itself.
pub fn postscript_name(name_table_data: &[u8]) -> Result<String, ParseError> {
    let name = get_name(name_table_data, NAME_ID_POSTSCRIPT_NAME)?.unwrap_or_default();
    let filtered = filter_postscript_name(&name);
    if filtered.is_empty() {
        warn!("font has no usable PostScript name");
    }
    Ok(filtered)
}

/// Strip characters that may not appear in a PostScript name and truncate to
/// [MAX_POSTSCRIPT_NAME_LEN].
pub fn filter_postscript_name(name: &str) -> String {
    name.chars()
        .filter(|&ch| ('!'..='~').contains(&ch) && !"[](){}<>/%".contains(ch))
        .take(MAX_POSTSCRIPT_NAME_LEN)
        .collect()
}

fn decode_name(encoding: &'static Encoding, data: &[u8]) -> Option<String> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let size = decoder.max_utf8_buffer_length_without_replacement(data.len())?;
    let mut s = String::with_capacity(size);
    let (res, _read) = decoder.decode_to_string_without_replacement(data, &mut s, true);
    match res {
        DecoderResult::InputEmpty => Some(s),
        DecoderResult::OutputFull => None, // should not happen
        DecoderResult::Malformed(_, _) => None,
    }
}
