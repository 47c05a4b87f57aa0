//! Parsing of the `cmap` table.
//!
//! The table directory is validated in full, but only the Windows Unicode BMP subtable
//! (format 4) is interpreted: it is the mapping used to resolve characters when embedding.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/cmap>

use std::convert::TryFrom;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::ParseError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
    pub const MACINTOSH_APPLE_ROMAN: EncodingId = EncodingId(0);
}

const CMAP_HEADER_SIZE: usize = 4;
const ENCODING_RECORD_SIZE: usize = 8;

pub struct Cmap<'a> {
    pub scope: ReadScope<'a>,
    encoding_records: ReadArray<'a, EncodingRecord>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

/// A format 4 "segment mapping to delta values" subtable.
pub struct Format4Subtable<'a> {
    pub language: u16,
    end_codes: ReadArray<'a, U16Be>,
    start_codes: ReadArray<'a, U16Be>,
    id_deltas: ReadArray<'a, I16Be>,
    id_range_offsets: ReadArray<'a, U16Be>,
    glyph_id_array: ReadArray<'a, U16Be>,
}

impl ReadBinary for Cmap<'_> {
    type HostType<'a> = Cmap<'a>;

    /// Read a `cmap` table, checking that every subtable lies within the table.
    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let table_len = scope.data().len();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        let header_len = CMAP_HEADER_SIZE + num_tables * ENCODING_RECORD_SIZE;
        if table_len < header_len {
            return Err(ParseError::BadEof);
        }
        let encoding_records = ctxt.read_array::<EncodingRecord>(num_tables)?;

        for record in encoding_records.iter() {
            let offset = usize::try_from(record.offset)?;
            if offset < header_len || offset >= table_len {
                return Err(ParseError::BadOffset);
            }
            let subtable_len = subtable_length(scope.offset(offset))?;
            if subtable_len > table_len - offset {
                return Err(ParseError::BadOffset);
            }
        }

        Ok(Cmap {
            scope,
            encoding_records,
        })
    }
}

/// Length of the subtable at the start of `scope`, from its format-specific header.
fn subtable_length(scope: ReadScope<'_>) -> Result<usize, ParseError> {
    let mut ctxt = scope.ctxt();
    let format = ctxt.read_u16be()?;
    match format {
        0 | 2 | 4 | 6 => Ok(usize::from(ctxt.read_u16be()?)),
        8 | 10 | 12 | 13 => {
            let _reserved = ctxt.read_u16be()?;
            Ok(usize::try_from(ctxt.read_u32be()?)?)
        }
        14 => Ok(usize::try_from(ctxt.read_u32be()?)?),
        _ => Err(ParseError::BadValue),
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);

    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id,
            encoding_id,
            offset,
        }
    }
}

impl<'a> Cmap<'a> {
    pub fn encoding_records(&self) -> impl Iterator<Item = EncodingRecord> + 'a {
        self.encoding_records.iter()
    }

    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<EncodingRecord> {
        self.encoding_records.iter().find(|record| {
            record.platform_id == platform_id.0 && record.encoding_id == encoding_id.0
        })
    }

    /// Offset of the Windows Unicode BMP (or symbol) format 4 subtable with language 0, if
    /// the font has one.
    pub fn unicode_subtable_offset(&self) -> Result<Option<u32>, ParseError> {
        for record in self.encoding_records.iter() {
            if record.platform_id != PlatformId::WINDOWS.0
                || !(record.encoding_id == EncodingId::WINDOWS_SYMBOL.0
                    || record.encoding_id == EncodingId::WINDOWS_UNICODE_BMP_UCS2.0)
            {
                continue;
            }
            let mut ctxt = self.scope.offset(usize::try_from(record.offset)?).ctxt();
            let format = ctxt.read_u16be()?;
            let _length = ctxt.read_u16be()?;
            let language = ctxt.read_u16be()?;
            if format == 4 && language == 0 {
                return Ok(Some(record.offset));
            }
        }
        Ok(None)
    }

    /// Parse the format 4 subtable at `offset` from the start of the table.
    pub fn format4_subtable(&self, offset: u32) -> Result<Format4Subtable<'a>, ParseError> {
        self.scope
            .offset(usize::try_from(offset)?)
            .read::<Format4Subtable<'_>>()
    }
}

impl ReadBinary for Format4Subtable<'_> {
    type HostType<'a> = Format4Subtable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let format = ctxt.read_u16be()?;
        ctxt.check(format == 4)?;
        let length = usize::from(ctxt.read_u16be()?);
        let language = ctxt.read_u16be()?;
        let seg_count_x2 = usize::from(ctxt.read_u16be()?);
        ctxt.check((seg_count_x2 & 1) == 0)?;
        let seg_count = seg_count_x2 >> 1;
        let _search_range = ctxt.read_u16be()?;
        let _entry_selector = ctxt.read_u16be()?;
        let _range_shift = ctxt.read_u16be()?;
        let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
        let _reserved_pad = ctxt.read_u16be()?;
        let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
        let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
        let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
        let fixed_len = (8 + 4 * seg_count) * 2;
        ctxt.check(length >= fixed_len)?;
        let num_indices = (length - fixed_len) / 2;
        let glyph_id_array = ctxt.read_array::<U16Be>(num_indices)?;

        Ok(Format4Subtable {
            language,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            glyph_id_array,
        })
    }
}

impl Format4Subtable<'_> {
    /// Look up the glyph for `ch`, `None` if no segment covers it.
    pub fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        let ch = match u16::try_from(ch) {
            Ok(ch) => ch,
            Err(_) => return Ok(None),
        };
        // Segments are sorted by end code; find the first that ends at or after `ch`.
        let segment = match self.end_codes.binary_search_by(|end| end.cmp(&ch)) {
            Ok(index) | Err(index) => index,
        };
        let (start_code, id_delta, id_range_offset) = match (
            self.start_codes.get_item(segment),
            self.id_deltas.get_item(segment),
            self.id_range_offsets.get_item(segment),
        ) {
            (Some(start), Some(delta), Some(range_offset)) => (start, delta, range_offset),
            _ => return Ok(None),
        };
        if ch < start_code {
            return Ok(None);
        }

        // The idDelta arithmetic is modulo 65536.
        if id_range_offset == 0 {
            return Ok(Some(ch.wrapping_add(id_delta as u16)));
        }

        // idRangeOffset is relative to its own position in the id_range_offsets array, which
        // the glyph id array immediately follows.
        let index = (usize::from(id_range_offset) / 2 + usize::from(ch - start_code) + segment)
            .checked_sub(self.id_range_offsets.len())
            .ok_or(ParseError::BadIndex)?;
        match self.glyph_id_array.get_item(index) {
            Some(0) => Ok(Some(0)),
            Some(glyph_id) => Ok(Some(glyph_id.wrapping_add(id_delta as u16))),
            None => Err(ParseError::BadIndex),
        }
    }
}
