//! SFNT table and container tags.

use std::fmt;

/// Generate a 4-byte font table tag from byte string, e.g. `tag!(b"glyf") == 0x676C7966`.
macro_rules! tag {
    ($w:expr) => {
        tag(*$w)
    };
}

/// Wrapper that formats a tag as its four characters where they are printable.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DisplayTag(pub u32);

const fn tag(chars: [u8; 4]) -> u32 {
    u32::from_be_bytes(chars)
}

impl fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().any(|&b| !b.is_ascii() || b.is_ascii_control()) {
            write!(f, "0x{:08x}", self.0)
        } else {
            bytes.iter().try_for_each(|&b| fmt::Write::write_char(f, char::from(b)))
        }
    }
}

impl fmt::Debug for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_string().fmt(f)
    }
}

pub const CFF: u32 = tag!(b"CFF ");
pub const CMAP: u32 = tag!(b"cmap");
pub const CVT: u32 = tag!(b"cvt ");
pub const DSIG: u32 = tag!(b"DSIG");
pub const FPGM: u32 = tag!(b"fpgm");
pub const GASP: u32 = tag!(b"gasp");
pub const GLYF: u32 = tag!(b"glyf");
pub const HDMX: u32 = tag!(b"hdmx");
pub const HEAD: u32 = tag!(b"head");
pub const HHEA: u32 = tag!(b"hhea");
pub const HMTX: u32 = tag!(b"hmtx");
pub const KERN: u32 = tag!(b"kern");
pub const LOCA: u32 = tag!(b"loca");
pub const LTSH: u32 = tag!(b"LTSH");
pub const MAXP: u32 = tag!(b"maxp");
pub const NAME: u32 = tag!(b"name");
pub const OS_2: u32 = tag!(b"OS/2");
pub const OTTO: u32 = tag!(b"OTTO");
pub const PCLT: u32 = tag!(b"PCLT");
pub const POST: u32 = tag!(b"post");
pub const PREP: u32 = tag!(b"prep");
/// Legacy Apple TrueType sfnt version.
pub const TRUE: u32 = tag!(b"true");
pub const TTCF: u32 = tag!(b"ttcf");
/// sfnt-wrapped Type 1 font.
pub const TYP1: u32 = tag!(b"typ1");
pub const VDMX: u32 = tag!(b"VDMX");
