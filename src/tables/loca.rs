//! Parsing and writing of the `loca` table.
//!
//! > The indexToLoc table stores the offsets to the locations of the glyphs in the font, relative
//! > to the beginning of the glyphData table.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>

use std::convert::TryFrom;

use crate::binary::read::{ReadBinaryDep, ReadCtxt};
use crate::binary::write::{WriteBinary, WriteBinaryDep, WriteContext};
use crate::binary::{long_align, U16Be, U32Be};
use crate::error::{ParseError, WriteError};
use crate::tables::IndexToLocFormat;

/// `loca` table, with short offsets already scaled to byte offsets.
///
/// Holds `num_glyphs + 1` offsets, the last one marking the end of the final glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocaTable {
    pub offsets: Vec<u32>,
}

impl ReadBinaryDep for LocaTable {
    type Args<'a> = (u16, IndexToLocFormat);
    type HostType<'a> = Self;

    /// Read a `loca` table from `ctxt`
    ///
    /// * `num_glyphs` is the number of glyphs in the font, from the `maxp` table.
    /// * `index_to_loc_format` specifies whether the offsets are short or long, from the `head`
    ///   table.
    ///
    /// The table length must match the glyph count (allowing for padding) and the offsets must
    /// never decrease.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): (u16, IndexToLocFormat),
    ) -> Result<Self, ParseError> {
        let count = usize::from(num_glyphs) + 1;
        let table_len = ctxt.scope().data().len();
        if long_align(table_len) != long_align(count * index_to_loc_format.offset_size()) {
            return Err(ParseError::BadValue);
        }

        let offsets = match index_to_loc_format {
            // The actual local offset divided by 2 is stored.
            IndexToLocFormat::Short => ctxt
                .read_array::<U16Be>(count)?
                .iter()
                .map(|offset| u32::from(offset) * 2)
                .collect::<Vec<_>>(),
            IndexToLocFormat::Long => ctxt.read_array::<U32Be>(count)?.to_vec(),
        };

        if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ParseError::BadOffset);
        }

        Ok(LocaTable { offsets })
    }
}

impl LocaTable {
    /// Byte range of `glyph_id` within the `glyf` table.
    pub fn glyph_range(&self, glyph_id: u16) -> Option<(u32, u32)> {
        let index = usize::from(glyph_id);
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some((start, end))
    }

    /// Get the last offset in the table.
    ///
    /// Returns `None` if the table is empty.
    pub fn last(&self) -> Option<u32> {
        self.offsets.last().copied()
    }

    /// Number of glyphs described, one less than the number of offsets.
    pub fn num_glyphs(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

impl IndexToLocFormat {
    /// Size in bytes of each `loca` entry.
    pub fn offset_size(self) -> usize {
        match self {
            IndexToLocFormat::Short => 2,
            IndexToLocFormat::Long => 4,
        }
    }
}

impl WriteBinaryDep<&Self> for LocaTable {
    type Output = ();
    type Args = IndexToLocFormat;

    fn write_dep<C: WriteContext>(
        ctxt: &mut C,
        loca: &LocaTable,
        index_to_loc_format: Self::Args,
    ) -> Result<(), WriteError> {
        match index_to_loc_format {
            IndexToLocFormat::Short => {
                match loca.offsets.last() {
                    Some(&last) if (last / 2) > u32::from(u16::MAX) => {
                        return Err(WriteError::BadValue)
                    }
                    _ => {}
                }

                // https://docs.microsoft.com/en-us/typography/opentype/spec/loca#short-version
                for &offset in &loca.offsets {
                    if offset & 1 == 1 {
                        // odd offsets can't use this format
                        return Err(WriteError::BadValue);
                    }
                    U16Be::write(ctxt, u16::try_from(offset / 2)?)?;
                }
                Ok(())
            }
            IndexToLocFormat::Long => ctxt.write_iter::<U32Be, _>(loca.offsets.iter().copied()),
        }
    }
}
