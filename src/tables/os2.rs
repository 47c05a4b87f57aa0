//! Parsing of the `OS/2` table.
//!
//! Only the fields consulted when embedding a font are retained: the embedding permissions,
//! the style classification and the vertical metrics.

use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::error::ParseError;

/// Length of the shortened version 0 table found in some legacy Apple fonts.
pub const OS2_V0_SHORT_LEN: usize = 68;

/// `OS/2` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/os2>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os2 {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub fs_type: u16,
    /// `sFamilyClass` followed by the ten `panose` bytes, as used by a PDF `/Style` entry.
    pub family_class_and_panose: [u8; 12],
    pub fs_selection: u16,

    // Apple's documentation of version 0 stops at usLastCharIndex, so the typographic metrics
    // may be absent from legacy fonts.
    pub s_typo_ascender: Option<i16>,
    pub s_typo_descender: Option<i16>,

    /// Present from version 2
    pub sx_height: Option<i16>,
    /// Present from version 2
    pub s_cap_height: Option<i16>,
}

impl ReadBinary for Os2 {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let table_len = ctxt.scope().data().len();

        let version = ctxt.read_u16be()?;
        let x_avg_char_width = ctxt.read_i16be()?;
        let us_weight_class = ctxt.read_u16be()?;
        // usWidthClass
        ctxt.skip(2)?;
        let fs_type = ctxt.read_u16be()?;
        // subscript, superscript and strikeout metrics
        ctxt.skip(10 * 2)?;
        let mut family_class_and_panose = [0; 12];
        family_class_and_panose.copy_from_slice(ctxt.read_slice(12)?);
        // ulUnicodeRange1-4 and achVendID
        ctxt.skip(4 * 4 + 4)?;
        let fs_selection = ctxt.read_u16be()?;
        // usFirstCharIndex and usLastCharIndex
        ctxt.skip(2 * 2)?;

        let (s_typo_ascender, s_typo_descender) =
            if version == 0 && table_len <= OS2_V0_SHORT_LEN {
                (None, None)
            } else {
                let ascender = ctxt.read_i16be()?;
                let descender = ctxt.read_i16be()?;
                // sTypoLineGap, usWinAscent and usWinDescent
                ctxt.skip(3 * 2)?;
                (Some(ascender), Some(descender))
            };

        let (sx_height, s_cap_height) = if version >= 2 {
            // ulCodePageRange1-2
            ctxt.skip(2 * 4)?;
            (Some(ctxt.read_i16be()?), Some(ctxt.read_i16be()?))
        } else {
            (None, None)
        };

        Ok(Os2 {
            version,
            x_avg_char_width,
            us_weight_class,
            fs_type,
            family_class_and_panose,
            fs_selection,
            s_typo_ascender,
            s_typo_descender,
            sx_height,
            s_cap_height,
        })
    }
}

impl Os2 {
    /// The high byte of `sFamilyClass`: the IBM font class.
    pub fn family_class(&self) -> u8 {
        self.family_class_and_panose[0]
    }

    pub fn is_italic(&self) -> bool {
        self.fs_selection & 0x0001 != 0
    }

    pub fn is_bold(&self) -> bool {
        self.fs_selection & 0x0020 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::writer;

    #[test]
    fn test_read_version_2() {
        let data = writer::os2_table(2, 700, 0x0008);
        let os2 = ReadScope::new(&data).read::<Os2>().unwrap();
        assert_eq!(os2.version, 2);
        assert_eq!(os2.us_weight_class, 700);
        assert_eq!(os2.fs_type, 0x0008);
        assert_eq!(os2.s_typo_ascender, Some(800));
        assert_eq!(os2.s_typo_descender, Some(-200));
        assert_eq!(os2.sx_height, Some(450));
        assert_eq!(os2.s_cap_height, Some(700));
    }

    #[test]
    fn test_read_short_version_0() {
        let data = writer::os2_table(0, 400, 0);
        let os2 = ReadScope::new(&data[..OS2_V0_SHORT_LEN]).read::<Os2>().unwrap();
        assert_eq!(os2.s_typo_ascender, None);
        assert_eq!(os2.sx_height, None);
    }

    #[test]
    fn test_truncated() {
        let data = writer::os2_table(1, 400, 0);
        assert_eq!(
            ReadScope::new(&data[..40]).read::<Os2>(),
            Err(ParseError::BadEof)
        );
    }
}
