//! `post` table parsing.
//!
//! Supplies the italic angle, underline metrics and Type42 memory hints, and PostScript glyph
//! names for the formats that carry them.

use std::str;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt};
use crate::binary::{I8, U16Be};
use crate::error::ParseError;
use crate::tables::Fixed;

pub const VERSION_1: i32 = 0x00010000;
pub const VERSION_2: i32 = 0x00020000;
pub const VERSION_2_5: i32 = 0x00025000;
pub const VERSION_3: i32 = 0x00030000;
/// Apple's character code re-encoding, recognised but not interpreted.
pub const VERSION_4: i32 = 0x00040000;

pub struct PostTable<'a> {
    pub header: Header,
    pub names: Option<GlyphNames<'a>>,
}

/// The fixed-size start of the table, common to every version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: i32,
    pub italic_angle: Fixed,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
    pub min_mem_type_42: u32,
    pub max_mem_type_42: u32,
    pub min_mem_type_1: u32,
    pub max_mem_type_1: u32,
}

pub enum GlyphNames<'a> {
    /// Version 2.0: per-glyph indices into the standard names, then the font's own names.
    Indexed {
        glyph_name_index: ReadArray<'a, U16Be>,
        names: Vec<&'a [u8]>,
    },
    /// Version 2.5: per-glyph offsets into the standard names.
    Offsets { offsets: ReadArray<'a, I8> },
}

impl ReadBinary for Header {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_i32be()?;
        let italic_angle = ctxt.read::<Fixed>()?;
        let underline_position = ctxt.read_i16be()?;
        let underline_thickness = ctxt.read_i16be()?;
        let is_fixed_pitch = ctxt.read_u32be()?;
        let min_mem_type_42 = ctxt.read_u32be()?;
        let max_mem_type_42 = ctxt.read_u32be()?;
        let min_mem_type_1 = ctxt.read_u32be()?;
        let max_mem_type_1 = ctxt.read_u32be()?;

        Ok(Header {
            version,
            italic_angle,
            underline_position,
            underline_thickness,
            is_fixed_pitch,
            min_mem_type_42,
            max_mem_type_42,
            min_mem_type_1,
            max_mem_type_1,
        })
    }
}

impl Header {
    pub fn is_supported_version(&self) -> bool {
        matches!(
            self.version,
            VERSION_1 | VERSION_2 | VERSION_2_5 | VERSION_3 | VERSION_4
        )
    }

    pub fn is_fixed_pitch(&self) -> bool {
        self.is_fixed_pitch != 0
    }
}

impl ReadBinary for PostTable<'_> {
    type HostType<'a> = PostTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let header = ctxt.read::<Header>()?;
        let names = match header.version {
            VERSION_2 => {
                let num_glyphs = ctxt.read_u16be()?;
                let glyph_name_index = ctxt.read_array::<U16Be>(usize::from(num_glyphs))?;
                let mut names = Vec::new();
                while ctxt.bytes_available() {
                    let length = ctxt.read_u8()?;
                    names.push(ctxt.read_slice(usize::from(length))?);
                }
                Some(GlyphNames::Indexed {
                    glyph_name_index,
                    names,
                })
            }
            VERSION_2_5 => {
                let num_glyphs = ctxt.read_u16be()?;
                let offsets = ctxt.read_array::<I8>(usize::from(num_glyphs))?;
                Some(GlyphNames::Offsets { offsets })
            }
            VERSION_1 | VERSION_3 | VERSION_4 => None,
            _ => return Err(ParseError::BadVersion),
        };

        Ok(PostTable { header, names })
    }
}

impl<'a> PostTable<'a> {
    /// The PostScript name of `glyph_index`, if the table provides one.
    pub fn glyph_name(&self, glyph_index: u16) -> Result<Option<&'a str>, ParseError> {
        let index = usize::from(glyph_index);
        match &self.names {
            None if self.header.version == VERSION_1 => Ok(FORMAT_1_NAMES.get(index).copied()),
            None => Ok(None),
            Some(GlyphNames::Indexed {
                glyph_name_index,
                names,
            }) => {
                let name_index = match glyph_name_index.get_item(index) {
                    Some(name_index) => usize::from(name_index),
                    None => return Ok(None),
                };
                match FORMAT_1_NAMES.get(name_index) {
                    Some(name) => Ok(Some(*name)),
                    None => {
                        let bytes = names
                            .get(name_index - FORMAT_1_NAMES.len())
                            .ok_or(ParseError::BadIndex)?;
                        str::from_utf8(bytes)
                            .map(Some)
                            .map_err(|_| ParseError::BadValue)
                    }
                }
            }
            Some(GlyphNames::Offsets { offsets }) => match offsets.get_item(index) {
                Some(offset) => {
                    let name_index = usize::try_from(index as isize + isize::from(offset))
                        .map_err(|_| ParseError::BadIndex)?;
                    FORMAT_1_NAMES
                        .get(name_index)
                        .copied()
                        .map(Some)
                        .ok_or(ParseError::BadIndex)
                }
                None => Ok(None),
            },
        }
    }
}

static FORMAT_1_NAMES: &[&str; 258] = &[
    ".notdef",
    ".null",
    "nonmarkingreturn",
    "space",
    "exclam",
    "quotedbl",
    "numbersign",
    "dollar",
    "percent",
    "ampersand",
    "quotesingle",
    "parenleft",
    "parenright",
    "asterisk",
    "plus",
    "comma",
    "hyphen",
    "period",
    "slash",
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "colon",
    "semicolon",
    "less",
    "equal",
    "greater",
    "question",
    "at",
    "A",
    "B",
    "C",
    "D",
    "E",
    "F",
    "G",
    "H",
    "I",
    "J",
    "K",
    "L",
    "M",
    "N",
    "O",
    "P",
    "Q",
    "R",
    "S",
    "T",
    "U",
    "V",
    "W",
    "X",
    "Y",
    "Z",
    "bracketleft",
    "backslash",
    "bracketright",
    "asciicircum",
    "underscore",
    "grave",
    "a",
    "b",
    "c",
    "d",
    "e",
    "f",
    "g",
    "h",
    "i",
    "j",
    "k",
    "l",
    "m",
    "n",
    "o",
    "p",
    "q",
    "r",
    "s",
    "t",
    "u",
    "v",
    "w",
    "x",
    "y",
    "z",
    "braceleft",
    "bar",
    "braceright",
    "asciitilde",
    "Adieresis",
    "Aring",
    "Ccedilla",
    "Eacute",
    "Ntilde",
    "Odieresis",
    "Udieresis",
    "aacute",
    "agrave",
    "acircumflex",
    "adieresis",
    "atilde",
    "aring",
    "ccedilla",
    "eacute",
    "egrave",
    "ecircumflex",
    "edieresis",
    "iacute",
    "igrave",
    "icircumflex",
    "idieresis",
    "ntilde",
    "oacute",
    "ograve",
    "ocircumflex",
    "odieresis",
    "otilde",
    "uacute",
    "ugrave",
    "ucircumflex",
    "udieresis",
    "dagger",
    "degree",
    "cent",
    "sterling",
    "section",
    "bullet",
    "paragraph",
    "germandbls",
    "registered",
    "copyright",
    "trademark",
    "acute",
    "dieresis",
    "notequal",
    "AE",
    "Oslash",
    "infinity",
    "plusminus",
    "lessequal",
    "greaterequal",
    "yen",
    "mu",
    "partialdiff",
    "summation",
    "product",
    "pi",
    "integral",
    "ordfeminine",
    "ordmasculine",
    "Omega",
    "ae",
    "oslash",
    "questiondown",
    "exclamdown",
    "logicalnot",
    "radical",
    "florin",
    "approxequal",
    "Delta",
    "guillemotleft",
    "guillemotright",
    "ellipsis",
    "nonbreakingspace",
    "Agrave",
    "Atilde",
    "Otilde",
    "OE",
    "oe",
    "endash",
    "emdash",
    "quotedblleft",
    "quotedblright",
    "quoteleft",
    "quoteright",
    "divide",
    "lozenge",
    "ydieresis",
    "Ydieresis",
    "fraction",
    "currency",
    "guilsinglleft",
    "guilsinglright",
    "fi",
    "fl",
    "daggerdbl",
    "periodcentered",
    "quotesinglbase",
    "quotedblbase",
    "perthousand",
    "Acircumflex",
    "Ecircumflex",
    "Aacute",
    "Edieresis",
    "Egrave",
    "Iacute",
    "Icircumflex",
    "Idieresis",
    "Igrave",
    "Oacute",
    "Ocircumflex",
    "apple",
    "Ograve",
    "Uacute",
    "Ucircumflex",
    "Ugrave",
    "dotlessi",
    "circumflex",
    "tilde",
    "macron",
    "breve",
    "dotaccent",
    "ring",
    "cedilla",
    "hungarumlaut",
    "ogonek",
    "caron",
    "Lslash",
    "lslash",
    "Scaron",
    "scaron",
    "Zcaron",
    "zcaron",
    "brokenbar",
    "Eth",
    "eth",
    "Yacute",
    "yacute",
    "Thorn",
    "thorn",
    "minus",
    "multiply",
    "onesuperior",
    "twosuperior",
    "threesuperior",
    "onehalf",
    "onequarter",
    "threequarters",
    "franc",
    "Gbreve",
    "gbreve",
    "Idotaccent",
    "Scedilla",
    "scedilla",
    "Cacute",
    "cacute",
    "Ccaron",
    "ccaron",
    "dcroat",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::writer;

    #[test]
    fn test_version_1_names() {
        let data = writer::post_table(VERSION_1, -0x000C_0000, 1);
        let post = ReadScope::new(&data).read::<PostTable<'_>>().unwrap();
        assert_eq!(post.header.italic_angle.floor(), -12);
        assert!(post.header.is_fixed_pitch());
        assert_eq!(post.glyph_name(3), Ok(Some("space")));
        assert_eq!(post.glyph_name(300), Ok(None));
    }

    #[test]
    fn test_version_2_names() {
        let mut data = writer::post_table(VERSION_2, 0, 0);
        // three glyphs: .notdef, "A" (standard index 36) and a custom name
        data.extend_from_slice(&[0, 3, 0, 0, 0, 36, 0x01, 0x02]);
        data.extend_from_slice(b"\x06f_f_ij");
        let post = ReadScope::new(&data).read::<PostTable<'_>>().unwrap();
        assert_eq!(post.glyph_name(0), Ok(Some(".notdef")));
        assert_eq!(post.glyph_name(1), Ok(Some("A")));
        assert_eq!(post.glyph_name(2), Ok(Some("f_f_ij")));
        assert_eq!(post.glyph_name(3), Ok(None));
    }

    #[test]
    fn test_version_3_has_no_names() {
        let data = writer::post_table(VERSION_3, 0, 0);
        let post = ReadScope::new(&data).read::<PostTable<'_>>().unwrap();
        assert_eq!(post.glyph_name(0), Ok(None));
        assert!(post.header.is_supported_version());
    }

    #[test]
    fn test_unknown_version() {
        let data = writer::post_table(0x00050000, 0, 0);
        assert!(matches!(
            ReadScope::new(&data).read::<PostTable<'_>>(),
            Err(ParseError::BadVersion)
        ));
        let header = ReadScope::new(&data).read::<Header>().unwrap();
        assert!(!header.is_supported_version());
    }
}
