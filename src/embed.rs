//! Planning and performing font embeddings.
//!
//! An [EmbeddingPlan] decides, from the font, its embedding rights, the destination and the
//! caller's [EmbedMode], how a font is to be embedded. It then writes the embedded font with
//! [EmbeddingPlan::embed].

use std::io::{Read, Seek};

use bitflags::bitflags;
use log::{debug, warn};

use crate::binary::read::ReadScope;
use crate::binary::write::{WriteBuffer, WriteContext};
use crate::bitset::GlyphBitSet;
use crate::error::{EmbedError, ParseError};
use crate::name;
use crate::sfnt::SfntFont;
use crate::subset;
use crate::tables::os2::Os2;
use crate::tables::FontTableProvider;
use crate::tag;
use crate::type42;

bitflags! {
    /// Caller policy for an embedding.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct EmbedMode: u32 {
        /// Fail rather than embed the whole font.
        const MUST_SUBSET = 0x01;
        /// The embedded subset must remain editable.
        const EDITABLE_SUBSET = 0x02;
        /// Always embed the whole font.
        const NEVER_SUBSET = 0x04;
        /// Embed as a CID-keyed font.
        const FORCE_MULTIBYTE = 0x08;
        /// Keep Type 1 fonts as Type 1.
        const KEEP_T1 = 0x20;
    }
}

bitflags! {
    /// What an [EmbeddingPlan] does to the font.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct EmbedAction: u32 {
        const MULTIBYTE = 0x01;
        const SUBSET = 0x02;
        /// Extract the bare `CFF ` table from an OpenType font.
        const OTF_TO_CFF = 0x04;
        /// Wrap a TrueType font as a PostScript Type 42 font.
        const TO_TYPE42 = 0x08;
    }
}

bitflags! {
    /// Embedding restrictions from `OS/2.fsType`. An empty set means installable embedding.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct EmbeddingRights: u16 {
        /// Restricted license embedding: the font must not be embedded.
        const NONE = 0x0002;
        /// Preview and print embedding: the document must be opened read-only.
        const READ_ONLY = 0x0004;
        const NO_SUBSET = 0x0100;
        const BITMAP_ONLY = 0x0200;
    }
}

/// Where the embedded font is going.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Keep the font's own format.
    Native,
    /// A PostScript program of the given language level.
    PostScript { level: u8 },
    /// PDF 1.3, which has no OpenType font files.
    Pdf13,
    Pdf16,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FontFormat {
    TrueType,
    /// OpenType with CFF outlines.
    OpenType,
    /// A bare CFF font program.
    Cff,
    Type42,
    /// One of the standard fonts every reader provides.
    Standard,
}

/// The font to embed.
pub enum EmbedFont<R: Read + Seek> {
    Sfnt(SfntFont<R>),
    /// The name of a standard font, which is referenced rather than embedded.
    Standard(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum PlanState {
    Planned,
    Embedded,
    PassThrough,
}

/// A decided embedding of one font.
///
/// The plan owns the font. Dropping the plan, or calling [EmbeddingPlan::close], releases it.
pub struct EmbeddingPlan<R: Read + Seek> {
    font: EmbedFont<R>,
    destination: Destination,
    mode: EmbedMode,
    input_format: FontFormat,
    output_format: FontFormat,
    actions: EmbedAction,
    rights: EmbeddingRights,
    glyphs: Option<GlyphBitSet>,
    state: PlanState,
    ps_encoding: Option<PsEncoding>,
}

struct PsEncoding {
    encoding: Vec<u16>,
    to_unicode: Option<Vec<u32>>,
}

/// Read the embedding rights of `font` from its `OS/2` table.
///
/// A font without an `OS/2` table has no restrictions.
pub fn rights<R: Read + Seek>(font: &mut SfntFont<R>) -> Result<EmbeddingRights, ParseError> {
    let data = match font.table_data(tag::OS_2)? {
        Some(data) => data,
        None => {
            warn!("font has no OS/2 table, assuming installable embedding");
            return Ok(EmbeddingRights::empty());
        }
    };
    let os2 = ReadScope::new(&data).read::<Os2>()?;
    Ok(rights_from_fs_type(os2.fs_type))
}

fn rights_from_fs_type(fs_type: u16) -> EmbeddingRights {
    if fs_type == 0x0002 {
        return EmbeddingRights::NONE;
    }
    let mut rights = EmbeddingRights::from_bits_truncate(fs_type & 0x0300);
    // editable embedding (0x0008) overrides preview & print
    if fs_type & 0x000C == 0x0004 {
        rights |= EmbeddingRights::READ_ONLY;
    }
    rights
}

impl<R: Read + Seek> EmbeddingPlan<R> {
    /// Plan the embedding of `font` into `destination`.
    ///
    /// Fails if `mode` is contradictory, if the font's embedding rights forbid what `mode`
    /// asks for, or if the destination cannot carry the font. The font is dropped on failure.
    pub fn new(
        font: EmbedFont<R>,
        destination: Destination,
        mode: EmbedMode,
    ) -> Result<Self, EmbedError> {
        check_mode(mode)?;

        let mut font = match font {
            EmbedFont::Standard(name) => {
                if mode.contains(EmbedMode::FORCE_MULTIBYTE) {
                    return Err(EmbedError::MultibyteStandardFont);
                }
                debug!("standard font {} is not embedded", name);
                return Ok(EmbeddingPlan {
                    font: EmbedFont::Standard(name),
                    destination,
                    mode,
                    input_format: FontFormat::Standard,
                    output_format: FontFormat::Standard,
                    actions: EmbedAction::empty(),
                    rights: EmbeddingRights::empty(),
                    glyphs: None,
                    state: PlanState::PassThrough,
                    ps_encoding: None,
                });
            }
            EmbedFont::Sfnt(font) => font,
        };

        let input_format = if font.is_cff() {
            FontFormat::OpenType
        } else {
            FontFormat::TrueType
        };
        let mut actions = EmbedAction::empty();
        if mode.contains(EmbedMode::FORCE_MULTIBYTE) {
            actions |= EmbedAction::MULTIBYTE;
        }
        let output_format = match (destination, input_format) {
            (Destination::Native, format) | (Destination::Pdf16, format) => format,
            (Destination::Pdf13, FontFormat::OpenType) => {
                actions |= EmbedAction::OTF_TO_CFF;
                FontFormat::Cff
            }
            (Destination::Pdf13, format) => format,
            (Destination::PostScript { level }, _) if level < 2 => {
                return Err(EmbedError::UnsupportedDestination)
            }
            (Destination::PostScript { .. }, FontFormat::TrueType) => {
                if actions.contains(EmbedAction::MULTIBYTE) {
                    // CIDFontType 2 output
                    return Err(EmbedError::NotImplemented);
                }
                actions |= EmbedAction::TO_TYPE42;
                FontFormat::Type42
            }
            // CFF to Type 1 or CIDFontType 0
            (Destination::PostScript { .. }, _) => return Err(EmbedError::NotImplemented),
        };

        let rights = rights(&mut font)?;
        check_rights(rights, mode)?;

        let glyphs = if rights.contains(EmbeddingRights::NO_SUBSET)
            || mode.contains(EmbedMode::NEVER_SUBSET)
        {
            None
        } else {
            actions |= EmbedAction::SUBSET;
            Some(GlyphBitSet::new(usize::from(font.num_glyphs())))
        };

        debug!(
            "embedding {:?} as {:?} ({:?})",
            input_format, output_format, actions
        );
        Ok(EmbeddingPlan {
            font: EmbedFont::Sfnt(font),
            destination,
            mode,
            input_format,
            output_format,
            actions,
            rights,
            glyphs,
            state: PlanState::Planned,
            ps_encoding: None,
        })
    }

    /// Write the embedded font to `ctxt`, returning the number of bytes written.
    ///
    /// Standard fonts are not embedded and write nothing. When the plan subsets, the glyphs
    /// marked in [EmbeddingPlan::glyph_set_mut] are kept, along with the glyphs they reference.
    /// Nothing is written if embedding fails. A plan embeds once; later calls fail with
    /// [EmbedError::AlreadyEmbedded].
    pub fn embed<C: WriteContext>(&mut self, ctxt: &mut C) -> Result<usize, EmbedError> {
        if self.state == PlanState::Embedded {
            return Err(EmbedError::AlreadyEmbedded);
        }
        let font = match &mut self.font {
            EmbedFont::Standard(_) => return Ok(0),
            EmbedFont::Sfnt(font) => font,
        };
        let subsetting = self.actions.contains(EmbedAction::SUBSET);

        let mut buffer = WriteBuffer::new();
        match self.output_format {
            FontFormat::TrueType | FontFormat::OpenType => match self.glyphs.as_mut() {
                Some(glyphs) if subsetting => {
                    if self.input_format == FontFormat::OpenType
                        && self.mode.contains(EmbedMode::EDITABLE_SUBSET)
                    {
                        return Err(EmbedError::NotImplemented);
                    }
                    subset::subset(font, glyphs, &mut buffer)?;
                }
                _ => {
                    subset::whole_font(font, &mut buffer)?;
                }
            },
            FontFormat::Cff => {
                subset::bare_cff(font, &mut buffer)?;
            }
            FontFormat::Type42 => {
                let (encoding, to_unicode) = match &self.ps_encoding {
                    Some(ps_encoding) => (
                        Some(ps_encoding.encoding.as_slice()),
                        ps_encoding.to_unicode.as_deref(),
                    ),
                    None => (None, None),
                };
                let mut program = WriteBuffer::new();
                match self.glyphs.as_mut() {
                    Some(glyphs) if subsetting => {
                        type42::emit_subset(font, glyphs, encoding, to_unicode, &mut program)?
                    }
                    _ => type42::emit(font, encoding, to_unicode, &mut program)?,
                };
                let font_name = match font.name_data()? {
                    Some(data) => name::postscript_name(data)?,
                    None => String::new(),
                };
                buffer.write_bytes(format!("%%BeginFont: {}\n", font_name).as_bytes())?;
                buffer.write_bytes(program.bytes())?;
                buffer.write_bytes(b"%%EndFont\n")?;
            }
            FontFormat::Standard => return Err(EmbedError::NotImplemented),
        }

        ctxt.write_bytes(buffer.bytes())?;
        self.state = PlanState::Embedded;
        Ok(buffer.len())
    }

    /// Release the plan, giving back the font.
    pub fn close(self) -> EmbedFont<R> {
        self.font
    }

    /// The glyphs to keep when subsetting, `None` if the plan does not subset.
    ///
    /// The set is sized to the font's glyph count. `.notdef` is always kept.
    pub fn glyph_set_mut(&mut self) -> Option<&mut GlyphBitSet> {
        self.glyphs.as_mut()
    }

    /// The encoding used when writing a Type 42 font. See [type42::emit].
    pub fn set_ps_encoding(&mut self, encoding: Vec<u16>, to_unicode: Option<Vec<u32>>) {
        self.ps_encoding = Some(PsEncoding {
            encoding,
            to_unicode,
        });
    }

    pub fn font(&self) -> &EmbedFont<R> {
        &self.font
    }

    pub fn font_mut(&mut self) -> &mut EmbedFont<R> {
        &mut self.font
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn mode(&self) -> EmbedMode {
        self.mode
    }

    pub fn input_format(&self) -> FontFormat {
        self.input_format
    }

    pub fn output_format(&self) -> FontFormat {
        self.output_format
    }

    pub fn actions(&self) -> EmbedAction {
        self.actions
    }

    pub fn rights(&self) -> EmbeddingRights {
        self.rights
    }

    /// `true` once the font has been written by [EmbeddingPlan::embed].
    pub fn is_embedded(&self) -> bool {
        self.state == PlanState::Embedded
    }

    /// `true` for standard fonts, which are referenced rather than embedded.
    pub fn is_pass_through(&self) -> bool {
        self.state == PlanState::PassThrough
    }
}

fn check_mode(mode: EmbedMode) -> Result<(), EmbedError> {
    if mode.contains(EmbedMode::KEEP_T1 | EmbedMode::FORCE_MULTIBYTE) {
        return Err(EmbedError::IncompatibleFlags);
    }
    if EmbedMode::from_bits(mode.bits()).is_none() {
        return Err(EmbedError::BadSubsetPolicy);
    }
    if mode.contains(EmbedMode::NEVER_SUBSET)
        && mode.intersects(EmbedMode::MUST_SUBSET | EmbedMode::EDITABLE_SUBSET)
    {
        return Err(EmbedError::BadSubsetPolicy);
    }
    Ok(())
}

fn check_rights(rights: EmbeddingRights, mode: EmbedMode) -> Result<(), EmbedError> {
    let violation = rights.intersects(EmbeddingRights::NONE | EmbeddingRights::BITMAP_ONLY)
        || (rights.contains(EmbeddingRights::READ_ONLY)
            && mode.contains(EmbedMode::EDITABLE_SUBSET))
        || (rights.contains(EmbeddingRights::NO_SUBSET) && mode.contains(EmbedMode::MUST_SUBSET));
    if violation {
        warn!("embedding rights {:?} forbid mode {:?}", rights, mode);
        Err(EmbedError::RightsViolation(rights))
    } else {
        Ok(())
    }
}
