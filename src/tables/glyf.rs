//! Inspection of `glyf` table records.
//!
//! Glyph outlines are never decoded; a glyph is carried through as opaque bytes. The only
//! structure interpreted is the component list of composite glyphs, which determines the other
//! glyphs a subset has to retain.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/glyf>

use bitflags::bitflags;

use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::binary::I16Be;
use crate::error::ParseError;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct CompositeGlyphFlag: u16 {
        /// Bit 0: If this is set, the arguments are 16-bit (uint16 or int16); otherwise, they are
        /// bytes (uint8 or int8).
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        /// Bit 1: If this is set, the arguments are signed xy values; otherwise, they are unsigned
        /// point numbers.
        const ARGS_ARE_XY_VALUES = 0x0002;
        /// Bit 2: For the xy values if the preceding is true.
        const ROUND_XY_TO_GRID = 0x0004;
        /// Bit 3: This indicates that there is a simple scale for the component. Otherwise, scale = 1.0.
        const WE_HAVE_A_SCALE = 0x0008;
        /// Bit 5: Indicates at least one more glyph after this one.
        const MORE_COMPONENTS = 0x0020;
        /// Bit 6: The x direction will use a different scale from the y direction.
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        /// Bit 7: There is a 2 by 2 transformation that will be used to scale the component.
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        /// Bit 8: Following the last component are instructions for the composite character.
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        /// Bit 9: Use the advance width and side bearing of this component for the composite.
        const USE_MY_METRICS = 0x0200;
        /// Bit 10: If set, the components of the compound glyph overlap.
        const OVERLAP_COMPOUND = 0x0400;
        /// Bit 11: The composite is designed to have the component offset scaled.
        const SCALED_COMPONENT_OFFSET = 0x0800;
        /// Bit 12: The composite is designed not to have the component offset scaled.
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BoundingBox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

/// A glyph record, split into its header and the undecoded description that follows.
#[derive(Debug, Clone, Copy)]
pub struct GlyphRecord<'a> {
    /// Negative for composite glyphs.
    pub number_of_contours: i16,
    pub bounding_box: BoundingBox,
    description: ReadScope<'a>,
}

/// One component reference of a composite glyph.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CompositeGlyphComponent {
    pub flags: CompositeGlyphFlag,
    pub glyph_index: u16,
}

impl ReadBinary for BoundingBox {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;

        Ok(BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }
}

impl ReadBinary for GlyphRecord<'_> {
    type HostType<'a> = GlyphRecord<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let number_of_contours = ctxt.read_i16be()?;
        let bounding_box = ctxt.read::<BoundingBox>()?;
        let description = ctxt.scope();

        Ok(GlyphRecord {
            number_of_contours,
            bounding_box,
            description,
        })
    }
}

impl ReadBinary for CompositeGlyphComponent {
    type HostType<'a> = Self;

    /// Read one component record, skipping over its arguments and transform.
    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let flags = CompositeGlyphFlag::from_bits_truncate(ctxt.read_u16be()?);
        let glyph_index = ctxt.read_u16be()?;

        let arguments_len = if flags.arg_1_and_2_are_words() { 4 } else { 2 };
        let transform_len = if flags.we_have_a_scale() {
            2
        } else if flags.we_have_an_x_and_y_scale() {
            4
        } else if flags.we_have_a_two_by_two() {
            8
        } else {
            0
        };
        ctxt.skip(arguments_len + transform_len)?;

        Ok(CompositeGlyphComponent { flags, glyph_index })
    }
}

impl<'a> GlyphRecord<'a> {
    /// Parse the header of the glyph stored in `data`.
    ///
    /// Returns `None` for an empty glyph, which has no header at all.
    pub fn parse(data: &'a [u8]) -> Result<Option<Self>, ParseError> {
        if data.is_empty() {
            Ok(None)
        } else {
            ReadScope::new(data).read::<GlyphRecord<'_>>().map(Some)
        }
    }

    pub fn is_composite(&self) -> bool {
        self.number_of_contours < 0
    }

    /// The components of a composite glyph, in the order they are stored.
    ///
    /// Simple glyphs have no components.
    pub fn components(&self) -> Result<Vec<CompositeGlyphComponent>, ParseError> {
        let mut components = Vec::new();
        if !self.is_composite() {
            return Ok(components);
        }

        let mut ctxt = self.description.ctxt();
        loop {
            let component = ctxt.read::<CompositeGlyphComponent>()?;
            components.push(component);
            if !component.flags.more_components() {
                break;
            }
        }
        Ok(components)
    }
}

impl CompositeGlyphFlag {
    pub fn arg_1_and_2_are_words(self) -> bool {
        self.contains(Self::ARG_1_AND_2_ARE_WORDS)
    }

    pub fn we_have_a_scale(self) -> bool {
        self.contains(Self::WE_HAVE_A_SCALE)
    }

    pub fn we_have_an_x_and_y_scale(self) -> bool {
        self.contains(Self::WE_HAVE_AN_X_AND_Y_SCALE)
    }

    pub fn we_have_a_two_by_two(self) -> bool {
        self.contains(Self::WE_HAVE_A_TWO_BY_TWO)
    }

    pub fn more_components(self) -> bool {
        self.contains(Self::MORE_COMPONENTS)
    }
}
