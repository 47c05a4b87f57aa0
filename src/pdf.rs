//! Names and keys for writing embedded fonts into PDF.

use std::hash::Hasher;
use std::io::{Read, Seek};

use rustc_hash::FxHasher;

use crate::bitset::GlyphBitSet;
use crate::embed::{EmbedAction, EmbeddingPlan, FontFormat};

/// The `FontDescriptor` key holding an embedded font program of `format`.
pub fn fontfile_key(format: FontFormat) -> Option<&'static str> {
    match format {
        FontFormat::TrueType => Some("FontFile2"),
        FontFormat::OpenType | FontFormat::Cff => Some("FontFile3"),
        FontFormat::Type42 | FontFormat::Standard => None,
    }
}

/// The `/Subtype` of a `FontFile3` stream.
pub fn fontfile_subtype(format: FontFormat, actions: EmbedAction) -> Option<&'static str> {
    match format {
        FontFormat::OpenType => Some("OpenType"),
        FontFormat::Cff if actions.contains(EmbedAction::MULTIBYTE) => Some("CIDFontType0C"),
        FontFormat::Cff => Some("Type1C"),
        FontFormat::TrueType | FontFormat::Type42 | FontFormat::Standard => None,
    }
}

/// The `/Subtype` of the font dictionary for `plan`, or of the descendant font when the plan
/// is multibyte. Type 42 fonts are PostScript only and have none.
pub fn font_subtype<R: Read + Seek>(plan: &EmbeddingPlan<R>) -> Option<&'static str> {
    let multibyte = plan.actions().contains(EmbedAction::MULTIBYTE);
    match plan.output_format() {
        FontFormat::TrueType if multibyte => Some("CIDFontType2"),
        FontFormat::TrueType => Some("TrueType"),
        FontFormat::OpenType | FontFormat::Cff if multibyte => Some("CIDFontType0"),
        FontFormat::OpenType | FontFormat::Cff | FontFormat::Standard => Some("Type1"),
        FontFormat::Type42 => None,
    }
}

/// Escape `name` for use as a PDF name object, without the leading `/`.
///
/// Bytes outside the printable ASCII range, delimiters and `#` are written as `#xx`.
pub fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for &byte in name.as_bytes() {
        match byte {
            b'#' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' => {
                escaped.push_str(&format!("#{:02X}", byte))
            }
            0x21..=0x7E => escaped.push(char::from(byte)),
            _ => escaped.push_str(&format!("#{:02X}", byte)),
        }
    }
    escaped
}

/// The six letter tag that prefixes the `/BaseFont` of a subset font, e.g. `EOODIA+`.
///
/// The tag depends only on the glyphs in the subset.
pub fn subset_tag(glyphs: &GlyphBitSet) -> String {
    let mut hasher = FxHasher::default();
    hasher.write_usize(glyphs.len());
    glyphs.iter().for_each(|glyph_id| hasher.write_u16(glyph_id));
    let mut hash = hasher.finish();

    let mut tag = String::with_capacity(7);
    for _ in 0..6 {
        // NOTE: hash % 26 is below 26 so the letter is ASCII upper-case
        tag.push(char::from(b'A' + (hash % 26) as u8));
        hash /= 26;
    }
    tag.push('+');
    tag
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::embed::{Destination, EmbedFont, EmbedMode};
    use crate::sfnt::{LoadOptions, SfntFont};
    use crate::tests::writer::{self, FontOptions};

    #[test]
    fn test_escape_name() {
        assert_eq!(escape_name("Test-Regular"), "Test-Regular");
        assert_eq!(escape_name("A B"), "A#20B");
        assert_eq!(escape_name("a/b#c(d)"), "a#2Fb#23c#28d#29");
        assert_eq!(escape_name("caf\u{e9}"), "caf#C3#A9");
    }

    #[test]
    fn test_subset_tag() {
        let a = GlyphBitSet::from_ids(10, [0, 3, 4]).unwrap();
        let b = GlyphBitSet::from_ids(10, [0, 3, 4]).unwrap();
        let c = GlyphBitSet::from_ids(10, [0, 3, 5]).unwrap();
        let tag = subset_tag(&a);
        assert_eq!(tag.len(), 7);
        assert!(tag[..6].bytes().all(|byte| byte.is_ascii_uppercase()));
        assert!(tag.ends_with('+'));
        assert_eq!(tag, subset_tag(&b));
        assert_ne!(tag, subset_tag(&c));
    }

    #[test]
    fn test_fontfile_keys() {
        assert_eq!(fontfile_key(FontFormat::TrueType), Some("FontFile2"));
        assert_eq!(fontfile_key(FontFormat::Cff), Some("FontFile3"));
        assert_eq!(fontfile_key(FontFormat::Standard), None);
        assert_eq!(
            fontfile_subtype(FontFormat::Cff, EmbedAction::OTF_TO_CFF),
            Some("Type1C")
        );
        assert_eq!(
            fontfile_subtype(FontFormat::Cff, EmbedAction::MULTIBYTE),
            Some("CIDFontType0C")
        );
        assert_eq!(
            fontfile_subtype(FontFormat::OpenType, EmbedAction::empty()),
            Some("OpenType")
        );
        assert_eq!(fontfile_subtype(FontFormat::TrueType, EmbedAction::empty()), None);
    }

    #[test]
    fn test_font_subtype() {
        let load = || {
            let data = writer::sample_font(&FontOptions::default()).build();
            EmbedFont::Sfnt(
                SfntFont::from_reader(Cursor::new(data), LoadOptions::default()).unwrap(),
            )
        };
        let plan = EmbeddingPlan::new(load(), Destination::Pdf16, EmbedMode::empty()).unwrap();
        assert_eq!(font_subtype(&plan), Some("TrueType"));
        let plan =
            EmbeddingPlan::new(load(), Destination::Pdf16, EmbedMode::FORCE_MULTIBYTE).unwrap();
        assert_eq!(font_subtype(&plan), Some("CIDFontType2"));
        let plan = EmbeddingPlan::new(
            EmbedFont::<Cursor<Vec<u8>>>::Standard(String::from("Times-Roman")),
            Destination::Pdf16,
            EmbedMode::empty(),
        )
        .unwrap();
        assert_eq!(font_subtype(&plan), Some("Type1"));
    }
}
