//! PDF font metrics: width arrays and `FontDescriptor` values.
//!
//! All values are in PDF glyph space, 1000 units to the em.

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::io::{Read, Seek};

use bitflags::bitflags;
use itertools::Itertools;
use log::warn;

use crate::binary::read::ReadScope;
use crate::bitset::GlyphBitSet;
use crate::error::{EmbedError, ParseError};
use crate::name;
use crate::post;
use crate::sfnt::SfntFont;
use crate::tables::os2::Os2;
use crate::tables::{FontTableProvider, HheaTable};
use crate::tag;

/// Stem width assumed for regular fonts when nothing better is known.
const REGULAR_STEM_V: i32 = 50;
/// Stem width assumed for bold fonts when nothing better is known.
const BOLD_STEM_V: i32 = 80;

/// Runs of at least this many equal widths are written as `first last width`.
const MIN_CID_RUN: usize = 3;

bitflags! {
    /// Font descriptor flags, PDF 1.7 section 9.8.2.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct PdfFontFlags: u32 {
        const FIXED_PITCH = 1 << 0;
        const SERIF = 1 << 1;
        const SYMBOLIC = 1 << 2;
        const SCRIPT = 1 << 3;
        const NONSYMBOLIC = 1 << 5;
        const ITALIC = 1 << 6;
        const ALL_CAP = 1 << 16;
        const SMALL_CAP = 1 << 17;
        const FORCE_BOLD = 1 << 18;
    }
}

/// Glyph widths for a PDF font dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfWidths {
    /// `/FirstChar`, `/LastChar` and `/Widths` of a simple font. Codes in the range whose glyph
    /// was not retained get `missing_width`.
    Simple {
        first: u32,
        last: u32,
        widths: Vec<i32>,
        missing_width: i32,
    },
    /// `/DW` and `/W` of a CIDFont, keyed by glyph id.
    Cid {
        default: i32,
        entries: Vec<CidWidthEntry>,
    },
}

/// An element of a CIDFont `/W` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CidWidthEntry {
    /// `first last width`: every CID in `first..=last` has the same width.
    Run { first: u16, last: u16, width: i32 },
    /// `first [w0 w1 ...]`: consecutive CIDs starting at `first`.
    List { first: u16, widths: Vec<i32> },
}

/// Values for a PDF `FontDescriptor` dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFontDescriptor {
    pub font_name: String,
    pub flags: PdfFontFlags,
    /// `[x_min y_min x_max y_max]`
    pub bbox: [i32; 4],
    pub italic_angle: f64,
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub x_height: i32,
    pub avg_width: i32,
    pub stem_v: i32,
    /// `sFamilyClass` and `panose` from `OS/2`, for the `/Style` dictionary of a CIDFont.
    pub panose: Option<[u8; 12]>,
}

/// Converts font units to PDF glyph space.
#[derive(Debug, Copy, Clone)]
struct Scale(i32);

impl Scale {
    fn new(units_per_em: u16) -> Result<Self, ParseError> {
        if units_per_em == 0 {
            return Err(ParseError::BadValue);
        }
        Ok(Scale(i32::from(units_per_em)))
    }

    fn apply(self, value: impl Into<i32>) -> i32 {
        value.into() * 1000 / self.0
    }
}

/// Build the width array of a simple (single byte) font.
///
/// Character codes `0..max_code` are resolved to glyphs through `encoding` if supplied, else
/// through the Unicode `cmap`, else taken as glyph ids. Only codes whose glyph is in `filter`
/// count towards the range; with no filter every code does. `default_width` of `None` asks for
/// the most common width among the retained glyphs.
pub fn simple_widths<R: Read + Seek>(
    font: &mut SfntFont<R>,
    encoding: Option<&[u16]>,
    max_code: u32,
    default_width: Option<i32>,
    filter: Option<&GlyphBitSet>,
) -> Result<PdfWidths, EmbedError> {
    let scale = Scale::new(font.units_per_em())?;
    let use_cmap = encoding.is_none() && font.has_unicode_cmap()?;
    let max_code = match encoding {
        Some(encoding) => max_code.min(u32::try_from(encoding.len()).unwrap_or(u32::MAX)),
        None if use_cmap => max_code,
        // codes are glyph ids
        None => max_code.min(u32::from(font.num_glyphs())),
    };

    let mut glyphs = Vec::new();
    for code in 0..max_code {
        let glyph_id = match encoding {
            Some(encoding) => encoding[code as usize],
            None if use_cmap => font.from_unicode(code)?,
            None => u16::try_from(code).map_err(ParseError::from)?,
        };
        let retained = filter.map_or(true, |filter| filter.contains(glyph_id));
        glyphs.push((code, glyph_id, retained));
    }

    let first = glyphs.iter().find(|(_, _, retained)| *retained);
    let last = glyphs.iter().rev().find(|(_, _, retained)| *retained);
    let (first, last) = match (first, last) {
        (Some(&(first, _, _)), Some(&(last, _, _))) => (first, last),
        _ => {
            warn!("no character code maps to an embedded glyph");
            return Err(EmbedError::EmptyEmbeddingRange);
        }
    };

    let mut widths = Vec::with_capacity((last - first + 1) as usize);
    let mut retained_widths = Vec::new();
    for &(_, glyph_id, retained) in &glyphs[first as usize..=last as usize] {
        if retained {
            let width = scale.apply(font.advance_width(glyph_id)?);
            retained_widths.push(width);
            widths.push(Some(width));
        } else {
            widths.push(None);
        }
    }
    let missing_width = default_width.unwrap_or_else(|| most_common(&retained_widths));

    Ok(PdfWidths::Simple {
        first,
        last,
        widths: widths
            .into_iter()
            .map(|width| width.unwrap_or(missing_width))
            .collect(),
        missing_width,
    })
}

/// Build the width array of a CIDFont whose CIDs are glyph ids.
///
/// Glyphs outside `filter` are left out, as are glyphs whose width equals the default. With a
/// `default_width` of `None` the most common width is used as the default.
pub fn cid_widths<R: Read + Seek>(
    font: &mut SfntFont<R>,
    default_width: Option<i32>,
    filter: Option<&GlyphBitSet>,
) -> Result<PdfWidths, EmbedError> {
    let scale = Scale::new(font.units_per_em())?;
    let mut widths = Vec::new();
    for glyph_id in 0..font.num_glyphs() {
        if filter.map_or(true, |filter| filter.contains(glyph_id)) {
            widths.push((glyph_id, scale.apply(font.advance_width(glyph_id)?)));
        }
    }
    let default = default_width.unwrap_or_else(|| {
        most_common(&widths.iter().map(|&(_, width)| width).collect::<Vec<_>>())
    });

    // Split into groups of consecutive glyph ids, skipping default widths.
    let mut groups: Vec<Vec<(u16, i32)>> = Vec::new();
    for &(glyph_id, width) in &widths {
        if width == default {
            continue;
        }
        let follows = groups
            .last()
            .and_then(|group| group.last())
            .map_or(false, |&(prev, _)| prev + 1 == glyph_id);
        match groups.last_mut() {
            Some(group) if follows => group.push((glyph_id, width)),
            _ => groups.push(vec![(glyph_id, width)]),
        }
    }

    let mut entries = Vec::new();
    for group in groups {
        let mut list: Option<(u16, Vec<i32>)> = None;
        let mut index = 0;
        while index < group.len() {
            let (first, width) = group[index];
            let run_len = group[index..]
                .iter()
                .take_while(|&&(_, other)| other == width)
                .count();
            if run_len >= MIN_CID_RUN {
                if let Some((first, widths)) = list.take() {
                    entries.push(CidWidthEntry::List { first, widths });
                }
                entries.push(CidWidthEntry::Run {
                    first,
                    last: group[index + run_len - 1].0,
                    width,
                });
                index += run_len;
            } else {
                list.get_or_insert_with(|| (first, Vec::new())).1.push(width);
                index += 1;
            }
        }
        if let Some((first, widths)) = list {
            entries.push(CidWidthEntry::List { first, widths });
        }
    }

    Ok(PdfWidths::Cid { default, entries })
}

/// The most frequent value, the smallest one on ties. 0 for no values.
fn most_common(values: &[i32]) -> i32 {
    let mut counts = BTreeMap::new();
    for &value in values {
        *counts.entry(value).or_insert(0usize) += 1;
    }
    counts
        .into_iter()
        .fold((0, 0), |best, (value, count)| {
            if count > best.1 {
                (value, count)
            } else {
                best
            }
        })
        .0
}

impl PdfWidths {
    /// Render the array in PDF syntax: the `/Widths` array of a simple font or the `/W` array
    /// of a CIDFont.
    pub fn to_pdf_string(&self) -> String {
        let items = match self {
            PdfWidths::Simple { widths, .. } => widths.iter().join(" "),
            PdfWidths::Cid { entries, .. } => entries
                .iter()
                .map(|entry| match entry {
                    CidWidthEntry::Run { first, last, width } => {
                        format!("{} {} {}", first, last, width)
                    }
                    CidWidthEntry::List { first, widths } => {
                        format!("{} [{}]", first, widths.iter().join(" "))
                    }
                })
                .join(" "),
        };
        format!("[{}]", items)
    }
}

/// Gather the `FontDescriptor` values of `font`.
///
/// Every source table besides `head` is optional. Missing values fall back as follows:
/// ascent and descent to `hhea`, stem width to the advance of `.` and then to a constant, and
/// cap height to the ascent. Style flags come from `OS/2` or else `head.macStyle`.
pub fn font_descriptor<R: Read + Seek>(
    font: &mut SfntFont<R>,
) -> Result<PdfFontDescriptor, EmbedError> {
    let scale = Scale::new(font.units_per_em())?;
    let head = font.head().clone();

    let font_name = match font.name_data()? {
        Some(data) => name::postscript_name(data)?,
        None => String::new(),
    };

    let mut descriptor = PdfFontDescriptor {
        font_name,
        flags: PdfFontFlags::empty(),
        bbox: [
            scale.apply(head.x_min),
            scale.apply(head.y_min),
            scale.apply(head.x_max),
            scale.apply(head.y_max),
        ],
        italic_angle: 0.0,
        ascent: 0,
        descent: 0,
        cap_height: 0,
        x_height: 0,
        avg_width: 0,
        stem_v: 0,
        panose: None,
    };

    match font.table_data(tag::POST)? {
        Some(data) => {
            let header = ReadScope::new(&data).read::<post::Header>()?;
            if header.is_supported_version() {
                descriptor.italic_angle = f64::from(header.italic_angle);
                if header.is_fixed_pitch() {
                    descriptor.flags |= PdfFontFlags::FIXED_PITCH;
                }
            } else {
                warn!("unsupported post table version 0x{:08x}", header.version);
            }
        }
        None => warn!("font has no post table"),
    }

    match font.table_data(tag::OS_2)? {
        Some(data) => {
            let os2 = ReadScope::new(&data).read::<Os2>()?;
            apply_os2(&mut descriptor, &os2, scale);
        }
        None => {
            warn!("font has no OS/2 table, using macStyle");
            if head.is_italic() {
                descriptor.flags |= PdfFontFlags::ITALIC;
            }
            if head.is_bold() {
                descriptor.flags |= PdfFontFlags::FORCE_BOLD;
            }
        }
    }

    if descriptor.ascent == 0 && descriptor.descent == 0 {
        if let Some(data) = font.table_data(tag::HHEA)? {
            let hhea = ReadScope::new(&data).read::<HheaTable>()?;
            descriptor.ascent = scale.apply(hhea.ascender);
            descriptor.descent = scale.apply(hhea.descender);
        }
    }

    if descriptor.stem_v == 0 {
        descriptor.stem_v = match period_advance(font)? {
            Some(advance) => scale.apply(advance),
            None if descriptor.flags.contains(PdfFontFlags::FORCE_BOLD) => BOLD_STEM_V,
            None => REGULAR_STEM_V,
        };
    }

    if descriptor.cap_height == 0 {
        descriptor.cap_height = descriptor.ascent;
    }

    descriptor.flags |= if font.has_unicode_cmap()? {
        PdfFontFlags::NONSYMBOLIC
    } else {
        PdfFontFlags::SYMBOLIC
    };

    Ok(descriptor)
}

fn apply_os2(descriptor: &mut PdfFontDescriptor, os2: &Os2, scale: Scale) {
    let weight = i32::from(os2.us_weight_class);
    descriptor.stem_v = 50 + weight * weight / (65 * 65);
    descriptor.avg_width = scale.apply(os2.x_avg_char_width);

    match os2.family_class() {
        1..=5 | 7 => descriptor.flags |= PdfFontFlags::SERIF,
        10 => descriptor.flags |= PdfFontFlags::SCRIPT,
        _ => {}
    }
    if os2.is_italic() {
        descriptor.flags |= PdfFontFlags::ITALIC;
    }
    if os2.is_bold() && os2.us_weight_class > 600 {
        descriptor.flags |= PdfFontFlags::FORCE_BOLD;
    }

    if let (Some(ascender), Some(descender)) = (os2.s_typo_ascender, os2.s_typo_descender) {
        descriptor.ascent = scale.apply(ascender);
        descriptor.descent = scale.apply(descender);
    }
    if let Some(x_height) = os2.sx_height {
        descriptor.x_height = scale.apply(x_height);
    }
    if let Some(cap_height) = os2.s_cap_height {
        descriptor.cap_height = scale.apply(cap_height);
    }
    descriptor.panose = Some(os2.family_class_and_panose);
}

/// Advance width of the glyph for `.`, if the font can tell.
fn period_advance<R: Read + Seek>(font: &mut SfntFont<R>) -> Result<Option<u16>, ParseError> {
    if !(font.has_table(tag::HHEA) && font.has_table(tag::HMTX) && font.has_unicode_cmap()?) {
        return Ok(None);
    }
    match font.from_unicode(u32::from('.'))? {
        0 => Ok(None),
        glyph_id => font.advance_width(glyph_id).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::sfnt::LoadOptions;
    use crate::tests::writer::{self, FontOptions, TestFont};

    fn load(data: Vec<u8>) -> SfntFont<Cursor<Vec<u8>>> {
        SfntFont::from_reader(Cursor::new(data), LoadOptions::default()).unwrap()
    }

    fn sample() -> SfntFont<Cursor<Vec<u8>>> {
        load(writer::sample_font(&FontOptions::default()).build())
    }

    #[test]
    fn test_simple_widths_with_encoding() {
        let mut font = sample();
        let encoding = [0, 1, 2, 3, 7, 8];
        let widths = simple_widths(&mut font, Some(&encoding[..]), 256, Some(0), None).unwrap();
        assert_eq!(
            widths,
            PdfWidths::Simple {
                first: 0,
                last: 5,
                widths: vec![500, 1000, 250, 750, 488, 488],
                missing_width: 0,
            }
        );
    }

    #[test]
    fn test_simple_widths_filtered_by_unicode() {
        let mut font = sample();
        // 'A' -> 1, 'B' -> 3
        let filter = GlyphBitSet::from_ids(9, [1, 3]).unwrap();
        let widths = simple_widths(&mut font, None, 256, None, Some(&filter)).unwrap();
        assert_eq!(
            widths,
            PdfWidths::Simple {
                first: 0x41,
                last: 0x42,
                widths: vec![1000, 750],
                missing_width: 750,
            }
        );
        assert_eq!(widths.to_pdf_string(), "[1000 750]");
    }

    #[test]
    fn test_simple_widths_gap_uses_missing_width() {
        let mut font = sample();
        // 'A' -> 1, 'C' -> 4, 'B' is left out
        let filter = GlyphBitSet::from_ids(9, [1, 4]).unwrap();
        let widths = simple_widths(&mut font, None, 256, Some(333), Some(&filter)).unwrap();
        assert_eq!(widths.to_pdf_string(), "[1000 333 750]");
    }

    #[test]
    fn test_simple_widths_empty_range() {
        let mut font = sample();
        let filter = GlyphBitSet::from_ids(9, [6]).unwrap();
        assert_eq!(
            simple_widths(&mut font, None, 256, None, Some(&filter)),
            Err(EmbedError::EmptyEmbeddingRange)
        );
        assert_eq!(
            simple_widths(&mut font, Some(&[][..]), 256, None, None),
            Err(EmbedError::EmptyEmbeddingRange)
        );
    }

    #[test]
    fn test_simple_widths_without_cmap() {
        let data = writer::sample_font(&FontOptions::default())
            .without(b"cmap")
            .build();
        let mut font = load(data);
        let widths = simple_widths(&mut font, None, 256, Some(0), None).unwrap();
        assert_eq!(
            widths,
            PdfWidths::Simple {
                first: 0,
                last: 8,
                widths: vec![500, 1000, 250, 750, 750, 488, 488, 488, 488],
                missing_width: 0,
            }
        );
    }

    #[test]
    fn test_simple_widths_bad_glyph() {
        let mut font = sample();
        assert_eq!(
            simple_widths(&mut font, Some(&[0, 40][..]), 2, Some(0), None),
            Err(EmbedError::Read(ParseError::BadIndex))
        );
    }

    #[test]
    fn test_full_range_matches_hmtx() {
        let mut font = sample();
        let upem = i32::from(writer::SAMPLE_UNITS_PER_EM);
        let nhm = writer::SAMPLE_ADVANCES.len();
        let encoding = (0..writer::SAMPLE_NUM_GLYPHS).collect::<Vec<_>>();
        let widths = simple_widths(&mut font, Some(&encoding[..]), 256, Some(0), None).unwrap();
        let expected = (0..usize::from(writer::SAMPLE_NUM_GLYPHS))
            .map(|glyph_id| {
                let advance = writer::SAMPLE_ADVANCES[glyph_id.min(nhm - 1)];
                i32::from(advance) * 1000 / upem
            })
            .collect::<Vec<_>>();
        match widths {
            PdfWidths::Simple { first, last, widths, .. } => {
                assert_eq!((first, last), (0, 8));
                assert_eq!(widths, expected);
            }
            _ => panic!("expected simple widths"),
        }
    }

    #[test]
    fn test_cid_widths() {
        let mut font = sample();
        // widths: 500 1000 250 750 750 488 488 488 488
        let widths = cid_widths(&mut font, Some(0), None).unwrap();
        assert_eq!(
            widths,
            PdfWidths::Cid {
                default: 0,
                entries: vec![
                    CidWidthEntry::List {
                        first: 0,
                        widths: vec![500, 1000, 250, 750, 750],
                    },
                    CidWidthEntry::Run {
                        first: 5,
                        last: 8,
                        width: 488,
                    },
                ],
            }
        );
        assert_eq!(widths.to_pdf_string(), "[0 [500 1000 250 750 750] 5 8 488]");
    }

    #[test]
    fn test_cid_widths_estimated_default() {
        let mut font = sample();
        let widths = cid_widths(&mut font, None, None).unwrap();
        assert_eq!(
            widths,
            PdfWidths::Cid {
                default: 488,
                entries: vec![CidWidthEntry::List {
                    first: 0,
                    widths: vec![500, 1000, 250, 750, 750],
                }],
            }
        );

        let filter = GlyphBitSet::from_ids(9, [0, 2, 3, 4]).unwrap();
        let widths = cid_widths(&mut font, None, Some(&filter)).unwrap();
        assert_eq!(
            widths,
            PdfWidths::Cid {
                default: 750,
                entries: vec![
                    CidWidthEntry::List {
                        first: 0,
                        widths: vec![500],
                    },
                    CidWidthEntry::List {
                        first: 2,
                        widths: vec![250],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_most_common() {
        assert_eq!(most_common(&[]), 0);
        assert_eq!(most_common(&[3, 1, 3, 1, 2]), 1);
        assert_eq!(most_common(&[5, 7, 7]), 7);
    }

    #[test]
    fn test_font_descriptor() {
        let mut font = sample();
        let descriptor = font_descriptor(&mut font).unwrap();
        assert_eq!(descriptor.font_name, "Test-Regular");
        assert_eq!(descriptor.bbox, [-9, -195, 927, 878]);
        assert_eq!(descriptor.italic_angle, 0.0);
        // OS/2 typo metrics, weight 400
        assert_eq!(descriptor.ascent, 390);
        assert_eq!(descriptor.descent, -97);
        assert_eq!(descriptor.x_height, 219);
        assert_eq!(descriptor.cap_height, 341);
        assert_eq!(descriptor.avg_width, 244);
        assert_eq!(descriptor.stem_v, 50 + 400 * 400 / (65 * 65));
        // sans serif family class
        assert_eq!(descriptor.flags, PdfFontFlags::NONSYMBOLIC);
        assert!(descriptor.panose.is_some());
    }

    #[test]
    fn test_font_descriptor_without_os2() {
        let options = FontOptions {
            fs_type: None,
            post_version: None,
            ..FontOptions::default()
        };
        let mut font = load(writer::sample_font(&options).build());
        let descriptor = font_descriptor(&mut font).unwrap();
        // hhea ascender 1700, descender -450
        assert_eq!(descriptor.ascent, 830);
        assert_eq!(descriptor.descent, -219);
        assert_eq!(descriptor.cap_height, 830);
        // advance of '.' (glyph 2)
        assert_eq!(descriptor.stem_v, 250);
        assert_eq!(descriptor.panose, None);
        assert_eq!(descriptor.flags, PdfFontFlags::NONSYMBOLIC);
    }

    #[test]
    fn test_font_descriptor_minimal_font() {
        let data = TestFont::new(writer::TRUETYPE)
            .table(b"head", writer::head_table(1000, 0, [0, -200, 900, 800]))
            .table(b"maxp", writer::maxp_table(1))
            .build();
        let mut font = load(data);
        let descriptor = font_descriptor(&mut font).unwrap();
        assert_eq!(descriptor.font_name, "");
        assert_eq!(descriptor.bbox, [0, -200, 900, 800]);
        assert_eq!(descriptor.ascent, 0);
        assert_eq!(descriptor.descent, 0);
        assert_eq!(descriptor.stem_v, REGULAR_STEM_V);
        assert_eq!(descriptor.flags, PdfFontFlags::SYMBOLIC);
    }

    #[test]
    fn test_font_descriptor_post_and_style() {
        let data = writer::sample_font(&FontOptions::default())
            .table(b"post", writer::post_table(0x00020000, -12 << 16, 1))
            .table(
                b"OS/2",
                writer::os2_table_with(2, 700, 0, 0x0021, 0x0A00),
            )
            .build();
        let mut font = load(data);
        let descriptor = font_descriptor(&mut font).unwrap();
        assert_eq!(descriptor.italic_angle, -12.0);
        assert_eq!(
            descriptor.flags,
            PdfFontFlags::FIXED_PITCH
                | PdfFontFlags::SCRIPT
                | PdfFontFlags::ITALIC
                | PdfFontFlags::FORCE_BOLD
                | PdfFontFlags::NONSYMBOLIC
        );
        assert_eq!(descriptor.stem_v, 50 + 700 * 700 / (65 * 65));
    }

    #[test]
    fn test_unsupported_post_version_ignored() {
        let data = writer::sample_font(&FontOptions::default())
            .table(b"post", writer::post_table(0x00050000, 5 << 16, 1))
            .build();
        let mut font = load(data);
        let descriptor = font_descriptor(&mut font).unwrap();
        assert_eq!(descriptor.italic_angle, 0.0);
        assert!(!descriptor.flags.contains(PdfFontFlags::FIXED_PITCH));
    }
}
