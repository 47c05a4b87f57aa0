//! PostScript Type 42 font programs.
//!
//! A Type 42 font wraps the tables of a TrueType font in a PostScript font dictionary. The
//! tables are carried as hex strings in the `/sfnts` array, and glyphs are selected by name
//! through `/CharStrings`.
//!
//! <https://adobe-type-tools.github.io/font-tech-notes/pdfs/5012.Type42_Spec.pdf>

use std::borrow::Cow;
use std::fmt::Write;
use std::io::{Read, Seek};

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::binary::read::ReadScope;
use crate::binary::write::WriteContext;
use crate::bitset::GlyphBitSet;
use crate::dynstring::DynString;
use crate::error::{EmbedError, ParseError, WriteError};
use crate::name;
use crate::post::{self, PostTable};
use crate::sfnt::SfntFont;
use crate::sfnt_writer::{self, intersect_tables, Wish};
use crate::subset;
use crate::tables::{Fixed, FontTableProvider};
use crate::tag;

/// Size of the encoding vector of a Type 42 font.
pub const MAX_ENCODING_LEN: usize = 256;

/// Bytes of font data per line of hex.
const HEX_LINE_LEN: usize = 38;

/// Bytes of font data per string of the `/sfnts` array. PostScript strings are limited to
/// 65535 bytes.
const HEX_STRING_LEN: usize = 64000;

/// Write `font` as a Type 42 font program.
///
/// `encoding` maps character codes to glyph ids and must hold between 1 and 256 entries. With
/// no encoding, codes are mapped through the Unicode `cmap`. `to_unicode` gives the Unicode
/// value of each code and is used to name glyphs that the `post` table does not name; it is
/// ignored without an encoding.
///
/// Nothing is written if the arguments are rejected. Returns the number of bytes written.
pub fn emit<R: Read + Seek, C: WriteContext>(
    font: &mut SfntFont<R>,
    encoding: Option<&[u16]>,
    to_unicode: Option<&[u32]>,
    out: &mut C,
) -> Result<usize, EmbedError> {
    emit_program(font, None, encoding, to_unicode, out)
}

/// Write a Type 42 font program holding only the glyphs in `glyphs`.
///
/// `glyphs` is closed over composite glyph references as by [subset::subset]. Encoding slots
/// naming a glyph outside the subset map to `.notdef`.
pub fn emit_subset<R: Read + Seek, C: WriteContext>(
    font: &mut SfntFont<R>,
    glyphs: &mut GlyphBitSet,
    encoding: Option<&[u16]>,
    to_unicode: Option<&[u32]>,
    out: &mut C,
) -> Result<usize, EmbedError> {
    emit_program(font, Some(glyphs), encoding, to_unicode, out)
}

fn emit_program<R: Read + Seek, C: WriteContext>(
    font: &mut SfntFont<R>,
    mut glyphs: Option<&mut GlyphBitSet>,
    encoding: Option<&[u16]>,
    to_unicode: Option<&[u32]>,
    out: &mut C,
) -> Result<usize, EmbedError> {
    if let Some(encoding) = encoding {
        if encoding.len() > MAX_ENCODING_LEN {
            return Err(EmbedError::TooBigForType42);
        }
        if encoding.is_empty() {
            return Err(EmbedError::NotdefRequired);
        }
    }
    if font.is_cff() {
        return Err(EmbedError::NotImplemented);
    }

    // Resolve the encoding before anything is written.
    let slots = match encoding {
        Some(encoding) => encoding
            .iter()
            .enumerate()
            .map(|(code, &glyph_id)| Slot {
                code,
                glyph_id,
                unicode: to_unicode.and_then(|to_unicode| to_unicode.get(code).copied()),
            })
            .collect::<Vec<_>>(),
        None => default_slots(font)?,
    };

    let sfnts_tables = match glyphs.as_deref_mut() {
        Some(glyphs) => {
            let (glyf, loca) = subset::subset_glyf_and_loca(font, glyphs)?;
            intersect_tables(&*font, subset::subset_wishlist(glyf, loca))
        }
        None => intersect_tables(
            &*font,
            vec![
                (tag::CMAP, Wish::Copy),
                (tag::CVT, Wish::Copy),
                (tag::FPGM, Wish::Copy),
                (tag::GLYF, Wish::Copy),
                (tag::HEAD, Wish::Copy),
                (tag::HHEA, Wish::Copy),
                (tag::HMTX, Wish::Copy),
                (tag::LOCA, Wish::Copy),
                (tag::MAXP, Wish::Copy),
                (tag::NAME, Wish::Copy),
                (tag::PREP, Wish::Copy),
            ],
        ),
    };
    let retained = |glyph_id: u16| match &glyphs {
        Some(glyphs) => glyphs.contains(glyph_id),
        None => glyph_id < font.num_glyphs(),
    };
    let slots = slots
        .into_iter()
        .map(|slot| {
            if slot.glyph_id != 0 && !retained(slot.glyph_id) {
                Slot { glyph_id: 0, ..slot }
            } else {
                slot
            }
        })
        .collect::<Vec<_>>();

    let font_name = match font.name_data()? {
        Some(data) => name::postscript_name(data)?,
        None => {
            warn!("font has no name table, Type 42 font will be unnamed");
            String::new()
        }
    };
    let post_data = font.table_data(tag::POST)?;
    let post = match &post_data {
        Some(data) => {
            let post = ReadScope::new(data).read::<PostTable<'_>>()?;
            if post.header.version == post::VERSION_4 {
                warn!("post table version 4 glyph names are not supported");
            }
            Some(post)
        }
        None => None,
    };
    let glyph_names = name_glyphs(post.as_ref(), &slots)?;

    let mut ps = DynString::with_capacity(4096);
    write_header(&mut ps, font, &font_name, post.as_ref())?;
    write_encoding(&mut ps, &slots, &glyph_names)?;

    ps.push_str("/sfnts[\n");
    let mut hex = HexStrings::new(&mut ps);
    let sfnt_version = font.sfnt_version();
    sfnt_writer::write_sfnt(font, sfnts_tables, sfnt_version, &mut hex)?;
    debug!("{} bytes of sfnt data in Type 42 font", hex.bytes_written());
    hex.finish();
    ps.push_str("] def\n");

    write_char_strings(&mut ps, &glyph_names)?;
    ps.push_str("FontName currentdict end definefont pop\n");

    out.write_bytes(ps.as_bytes())?;
    Ok(ps.len())
}

/// An entry of the encoding vector.
#[derive(Debug, Copy, Clone)]
struct Slot {
    code: usize,
    glyph_id: u16,
    unicode: Option<u32>,
}

/// With no encoding, codes are Unicode values mapped through the `cmap`.
fn default_slots<R: Read + Seek>(font: &mut SfntFont<R>) -> Result<Vec<Slot>, ParseError> {
    if !font.has_unicode_cmap()? {
        warn!("no encoding and no Unicode cmap, Type 42 encoding will be empty");
        return Ok(Vec::new());
    }
    (0..MAX_ENCODING_LEN)
        .map(|code| {
            // NOTE: code is below 256 so the conversion is lossless
            let unicode = code as u32;
            Ok(Slot {
                code,
                glyph_id: font.from_unicode(unicode)?,
                unicode: Some(unicode),
            })
        })
        .collect()
}

/// Name every glyph referenced by `slots`, other than `.notdef`.
///
/// Names come from `post`, then the Adobe Glyph List by Unicode value, then a synthetic name
/// from the character code. A name already used for a different glyph gets an `.altNN`
/// suffix.
fn name_glyphs(
    post: Option<&PostTable<'_>>,
    slots: &[Slot],
) -> Result<FxHashMap<u16, String>, ParseError> {
    let mut glyph_names = FxHashMap::default();
    let mut seen = FxHashMap::default();
    for slot in slots {
        if slot.glyph_id == 0 || glyph_names.contains_key(&slot.glyph_id) {
            continue;
        }
        let name = match post_name(post, slot.glyph_id)? {
            Some(name) => Cow::from(name.to_owned()),
            None => match slot.unicode.filter(|&unicode| unicode != 0) {
                Some(unicode) => glyph_names::glyph_name(unicode)
                    .unwrap_or_else(|| Cow::from(format!("uni{:04X}", unicode))),
                None => Cow::from(format!("c{}", slot.code)),
            },
        };

        let alt = *seen
            .entry(name.clone().into_owned())
            .and_modify(|alt| *alt += 1)
            .or_insert(0);
        let unique_name = if alt == 0 {
            name.into_owned()
        } else {
            format!("{}.alt{:02}", name, alt)
        };
        glyph_names.insert(slot.glyph_id, unique_name);
    }
    Ok(glyph_names)
}

fn post_name<'a>(
    post: Option<&PostTable<'a>>,
    glyph_id: u16,
) -> Result<Option<&'a str>, ParseError> {
    match post {
        Some(post) => match post.glyph_name(glyph_id)? {
            Some(name) if !name.is_empty() && name != ".notdef" => {
                if name::filter_postscript_name(name) == name {
                    Ok(Some(name))
                } else {
                    warn!("glyph {} has an unusable post name {:?}", glyph_id, name);
                    Ok(None)
                }
            }
            _ => Ok(None),
        },
        None => Ok(None),
    }
}

fn write_header<R: Read + Seek>(
    ps: &mut DynString,
    font: &SfntFont<R>,
    font_name: &str,
    post: Option<&PostTable<'_>>,
) -> Result<(), WriteError> {
    let head = font.head();
    writeln!(
        ps,
        "%!PS-TrueTypeFont-1.0-{}",
        fixed_to_string(head.font_revision)
    )?;
    if let Some(post) = post {
        writeln!(
            ps,
            "%%VMusage: {} {}",
            post.header.min_mem_type_42, post.header.max_mem_type_42
        )?;
    }

    let units_per_em = f64::from(head.units_per_em.max(1));
    writeln!(ps, "11 dict begin")?;
    writeln!(ps, "/FontName /{} def", font_name)?;
    writeln!(ps, "/FontType 42 def")?;
    writeln!(ps, "/FontMatrix [1 0 0 1 0 0] def")?;
    writeln!(
        ps,
        "/FontBBox [{} {} {} {}] def",
        scaled(head.x_min, units_per_em),
        scaled(head.y_min, units_per_em),
        scaled(head.x_max, units_per_em),
        scaled(head.y_max, units_per_em)
    )?;
    writeln!(ps, "/PaintType 0 def")?;
    if let Some(post) = post {
        let header = &post.header;
        writeln!(ps, "/FontInfo 4 dict dup begin")?;
        writeln!(
            ps,
            "  /ItalicAngle {} def",
            fixed_to_string(header.italic_angle)
        )?;
        writeln!(ps, "  /isFixedPitch {} def", header.is_fixed_pitch())?;
        writeln!(ps, "  /UnderlinePosition {} def", header.underline_position)?;
        writeln!(ps, "  /UnderlineThickness {} def", header.underline_thickness)?;
        writeln!(ps, "end readonly def")?;
    }
    Ok(())
}

fn write_encoding(
    ps: &mut DynString,
    slots: &[Slot],
    glyph_names: &FxHashMap<u16, String>,
) -> Result<(), WriteError> {
    writeln!(ps, "/Encoding 256 array")?;
    writeln!(ps, "0 1 255 {{ 1 index exch /.notdef put }} for")?;
    for slot in slots {
        if let Some(name) = glyph_names.get(&slot.glyph_id) {
            writeln!(ps, "dup {} /{} put", slot.code, name)?;
        }
    }
    writeln!(ps, "readonly def")?;
    Ok(())
}

fn write_char_strings(
    ps: &mut DynString,
    glyph_names: &FxHashMap<u16, String>,
) -> Result<(), WriteError> {
    let mut entries = glyph_names.iter().collect::<Vec<_>>();
    entries.sort_by_key(|&(&glyph_id, _)| glyph_id);
    writeln!(ps, "/CharStrings {} dict dup begin", entries.len() + 1)?;
    writeln!(ps, "/.notdef 0 def")?;
    for (glyph_id, name) in entries {
        writeln!(ps, "/{} {} def", name, glyph_id)?;
    }
    writeln!(ps, "end readonly def")?;
    Ok(())
}

/// Format a 16.16 value with up to four decimal places, e.g. `1.5` or `-12`.
fn fixed_to_string(value: Fixed) -> String {
    let formatted = format!("{:.4}", f64::from(value));
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => String::from("0"),
        _ => trimmed.to_string(),
    }
}

fn scaled(value: i16, units_per_em: f64) -> String {
    let formatted = format!("{:.3}", f64::from(value) / units_per_em);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => String::from("0"),
        _ => trimmed.to_string(),
    }
}

/// A `WriteContext` that appends data to PostScript output as hex strings.
///
/// Lines hold [HEX_LINE_LEN] bytes and each string [HEX_STRING_LEN] bytes. Every string is
/// terminated by an extra zero byte, as Type 42 requires.
struct HexStrings<'a> {
    out: &'a mut DynString,
    line_len: usize,
    string_len: usize,
    count: usize,
}

impl<'a> HexStrings<'a> {
    fn new(out: &'a mut DynString) -> Self {
        HexStrings {
            out,
            line_len: 0,
            string_len: 0,
            count: 0,
        }
    }

    fn push_byte(&mut self, byte: u8) {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        if self.string_len == 0 {
            self.out.push_str("<");
        }
        self.out
            .push_bytes(&[HEX[usize::from(byte >> 4)], HEX[usize::from(byte & 0xF)]]);
        self.line_len += 1;
        self.string_len += 1;
        self.count += 1;
        if self.string_len == HEX_STRING_LEN {
            self.close_string();
        } else if self.line_len == HEX_LINE_LEN {
            self.out.push_str("\n");
            self.line_len = 0;
        }
    }

    fn close_string(&mut self) {
        self.out.push_str("00>\n");
        self.line_len = 0;
        self.string_len = 0;
    }

    fn finish(mut self) {
        if self.string_len > 0 {
            self.close_string();
        }
    }
}

impl WriteContext for HexStrings<'_> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        data.iter().for_each(|&byte| self.push_byte(byte));
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        (0..count).for_each(|_| self.push_byte(0));
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.count
    }
}
