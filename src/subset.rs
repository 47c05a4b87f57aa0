#![deny(missing_docs)]

//! Font subsetting.
//!
//! Subsetting keeps the glyph ids of the font. Glyphs that are not required become empty
//! rather than being removed, so `cmap`, `hmtx` and composite glyph references stay valid
//! without being rewritten.

use std::convert::TryFrom;
use std::io::{Read, Seek};

use log::debug;

use crate::binary::write::{self, WriteContext};
use crate::bitset::GlyphBitSet;
use crate::error::{ParseError, ReadWriteError};
use crate::sfnt::SfntFont;
use crate::sfnt_writer::{self, intersect_tables, Wish};
use crate::tables::glyf::GlyphRecord;
use crate::tables::loca::LocaTable;
use crate::tables::{FontTableProvider, IndexToLocFormat};
use crate::tag;

/// Subset `font` so that it only contains the glyphs in `glyphs`, writing the new font to
/// `ctxt`.
///
/// For TrueType outlines `glyphs` is first extended with `.notdef` and every glyph reachable
/// through composite glyphs; on return it holds the glyphs actually present in the output.
/// CFF outlines are not reduced: their tables are republished unchanged.
///
/// Returns the number of bytes written.
pub fn subset<R: Read + Seek, C: WriteContext>(
    font: &mut SfntFont<R>,
    glyphs: &mut GlyphBitSet,
    ctxt: &mut C,
) -> Result<usize, ReadWriteError> {
    if font.is_cff() {
        glyphs.insert(0)?;
        subset_cff(font, ctxt)
    } else {
        subset_ttf(font, glyphs, ctxt)
    }
}

fn subset_ttf<R: Read + Seek, C: WriteContext>(
    font: &mut SfntFont<R>,
    glyphs: &mut GlyphBitSet,
    ctxt: &mut C,
) -> Result<usize, ReadWriteError> {
    let (glyf, loca) = subset_glyf_and_loca(font, glyphs)?;
    let tables = intersect_tables(&*font, subset_wishlist(glyf, loca));
    let sfnt_version = font.sfnt_version();
    sfnt_writer::write_sfnt(font, tables, sfnt_version, ctxt)
}

/// Tables kept by a TrueType subset, sorted by tag, with `glyf` and `loca` replaced.
pub(crate) fn subset_wishlist<'a>(glyf: Vec<u8>, loca: Vec<u8>) -> Vec<(u32, Wish<'a>)> {
    vec![
        (tag::CMAP, Wish::Copy),
        (tag::CVT, Wish::Copy),
        (tag::FPGM, Wish::Copy),
        (tag::GLYF, Wish::Replace(glyf.into())),
        (tag::HEAD, Wish::Copy),
        (tag::HHEA, Wish::Copy),
        (tag::HMTX, Wish::Copy),
        (tag::LOCA, Wish::Replace(loca.into())),
        (tag::MAXP, Wish::Copy),
        (tag::NAME, Wish::Copy),
        (tag::PREP, Wish::Copy),
    ]
}

/// Build the `glyf` and `loca` tables of a TrueType subset.
///
/// `glyphs` is closed over composite references first, see [close_glyph_set]. Returns the
/// table data of `glyf` then `loca`, in the font's `indexToLocFormat`.
pub fn subset_glyf_and_loca<R: Read + Seek>(
    font: &mut SfntFont<R>,
    glyphs: &mut GlyphBitSet,
) -> Result<(Vec<u8>, Vec<u8>), ReadWriteError> {
    let glyf_len = close_glyph_set(font, glyphs)?;
    let index_to_loc_format = font.index_to_loc_format();
    let (glyf, loca) = build_glyf_and_loca(font, glyphs, glyf_len)?;
    let (_, loca) = write::buffer::<_, LocaTable>(&loca, index_to_loc_format)?;
    debug!(
        "subset keeps {} of {} glyphs, glyf {} bytes",
        glyphs.count(),
        font.num_glyphs(),
        glyf.len()
    );
    Ok((glyf, loca.into_inner()))
}

/// CFF outlines are republished without glyph-level reduction.
fn subset_cff<R: Read + Seek, C: WriteContext>(
    font: &mut SfntFont<R>,
    ctxt: &mut C,
) -> Result<usize, ReadWriteError> {
    let tables = intersect_tables(
        &*font,
        vec![
            (tag::CFF, Wish::Copy),
            (tag::CMAP, Wish::Copy),
            (tag::HEAD, Wish::Copy),
            (tag::HHEA, Wish::Copy),
            (tag::HMTX, Wish::Copy),
            (tag::MAXP, Wish::Copy),
        ],
    );
    let sfnt_version = font.sfnt_version();
    sfnt_writer::write_sfnt(font, tables, sfnt_version, ctxt)
}

/// Add `.notdef` and every glyph reachable from `glyphs` through composite glyph components
/// to `glyphs`.
///
/// Returns the size of the `glyf` table that holds exactly these glyphs. A component that
/// refers beyond the last glyph of the font is an error.
pub fn close_glyph_set<R: Read + Seek>(
    font: &mut SfntFont<R>,
    glyphs: &mut GlyphBitSet,
) -> Result<usize, ParseError> {
    if glyphs.len() != usize::from(font.num_glyphs()) {
        return Err(ParseError::BadValue);
    }
    glyphs.insert(0)?;

    let mut pending = glyphs
        .iter()
        .map(|glyph_id| font.glyph(glyph_id).map(|data| (glyph_id, data)))
        .collect::<Result<Vec<_>, _>>()?;
    let short = font.index_to_loc_format() == IndexToLocFormat::Short;
    let mut glyf_len = 0;
    while let Some((glyph_id, data)) = pending.pop() {
        // short offsets can only address even lengths
        glyf_len += if short {
            data.len() + data.len() % 2
        } else {
            data.len()
        };
        let glyph = match GlyphRecord::parse(&data)? {
            Some(glyph) => glyph,
            None => continue,
        };
        for component in glyph.components()? {
            if glyphs.insert(component.glyph_index)? {
                debug!("glyph {} pulls in {}", glyph_id, component.glyph_index);
                let component_data = font.glyph(component.glyph_index)?;
                pending.push((component.glyph_index, component_data));
            }
        }
    }

    Ok(glyf_len)
}

fn build_glyf_and_loca<R: Read + Seek>(
    font: &mut SfntFont<R>,
    glyphs: &GlyphBitSet,
    glyf_len: usize,
) -> Result<(Vec<u8>, LocaTable), ParseError> {
    let short = font.index_to_loc_format() == IndexToLocFormat::Short;
    let mut glyf = Vec::with_capacity(glyf_len);
    let mut loca = LocaTable {
        offsets: Vec::with_capacity(usize::from(font.num_glyphs()) + 1),
    };
    for glyph_id in 0..font.num_glyphs() {
        loca.offsets.push(u32::try_from(glyf.len())?);
        if glyphs.contains(glyph_id) {
            glyf.extend_from_slice(&font.glyph(glyph_id)?);
            if short && glyf.len() % 2 == 1 {
                glyf.push(0);
            }
        }
    }
    loca.offsets.push(u32::try_from(glyf.len())?);

    if glyf.len() != glyf_len {
        return Err(ParseError::BadOffset);
    }
    Ok((glyf, loca))
}

/// Write every table of `font` into a standalone font.
///
/// This extracts a font from a TrueType collection, or copies a font verbatim with a freshly
/// computed table directory.
pub fn whole_font<R: Read + Seek, C: WriteContext>(
    font: &mut SfntFont<R>,
    ctxt: &mut C,
) -> Result<usize, ReadWriteError> {
    let tables = sfnt_writer::copy_all_tables(&*font);
    let sfnt_version = font.sfnt_version();
    sfnt_writer::write_sfnt(font, tables, sfnt_version, ctxt)
}

/// Write the bare `CFF ` table of a CFF-flavoured OpenType font.
///
/// This is the form PDF 1.3 embeds as a `FontFile3` with subtype `Type1C`.
pub fn bare_cff<R: Read + Seek, C: WriteContext>(
    font: &mut SfntFont<R>,
    ctxt: &mut C,
) -> Result<usize, ReadWriteError> {
    let data = font.read_table_data(tag::CFF)?;
    ctxt.write_bytes(&data)?;
    Ok(data.len())
}
