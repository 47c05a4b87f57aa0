//! OpenType font table parsing.
//!
//! Only the tables needed to embed a font are interpreted here. Everything else is carried
//! through to rebuilt fonts as opaque bytes.

pub mod cmap;
pub mod glyf;
pub mod loca;
pub mod os2;

use std::convert::TryFrom;

use crate::binary::read::{ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, I32Be, U16Be, U32Be};
use crate::error::{ParseError, WriteError};
use crate::tag;

/// Magic value identifying a CFF font (`OTTO`)
pub const CFF_MAGIC: u32 = tag::OTTO;

/// Magic number identifying TrueType 1.0
///
/// The version number 1.0 as a 16.16 fixed-point value, indicating TrueType glyph data.
pub const TTF_MAGIC: u32 = 0x00010000;

/// Magic value identifying a TrueType font collection `ttcf`
pub const TTCF_MAGIC: u32 = tag::TTCF;

/// `head.magicNumber`
pub const HEAD_MAGIC: u32 = 0x5F0F3CF5;

/// Size in bytes of a `head` table.
pub const HEAD_TABLE_LEN: usize = 54;

/// Size in bytes of a `hhea` table.
pub const HHEA_TABLE_LEN: usize = 36;

/// 32-bit signed fixed-point number (16.16)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Fixed(i32);

/// Source of the raw bytes of a font's tables.
///
/// Table data is fetched on demand, so implementations may read from a file rather than hold
/// the whole font in memory.
pub trait FontTableProvider {
    /// The table directory, sorted by tag.
    fn table_records(&self) -> &[TableRecord];

    /// Read the (unpadded) data of the table described by `record`.
    fn read_table_record(&mut self, record: &TableRecord) -> Result<Vec<u8>, ParseError>;

    fn find_table_record(&self, tag: u32) -> Option<TableRecord> {
        let records = self.table_records();
        records
            .binary_search_by(|record| record.table_tag.cmp(&tag))
            .ok()
            .map(|index| records[index])
    }

    fn has_table(&self, tag: u32) -> bool {
        self.find_table_record(tag).is_some()
    }

    /// Return data for the specified table if present
    fn table_data(&mut self, tag: u32) -> Result<Option<Vec<u8>>, ParseError> {
        match self.find_table_record(tag) {
            Some(record) => self.read_table_record(&record).map(Some),
            None => Ok(None),
        }
    }

    fn read_table_data(&mut self, tag: u32) -> Result<Vec<u8>, ParseError> {
        self.table_data(tag)?.ok_or(ParseError::MissingTable(tag))
    }
}

/// The size of the offsets in the `loca` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexToLocFormat {
    /// Offsets are 16-bit. The actual local offset divided by 2 is stored.
    Short,
    /// Offsets are 32-bit. The actual local offset is stored.
    Long,
}

/// TrueType collection header
pub struct TTCHeader<'a> {
    pub major_version: u16,
    pub minor_version: u16,
    pub offset_tables: ReadArray<'a, U32Be>,
}

/// The fixed-size start of an OpenType Offset Table, which the table records follow.
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OffsetTableHeader {
    pub sfnt_version: u32,
    pub num_tables: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

/// An entry in the Offset Table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Hash)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// `head` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/head>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: Fixed,
    pub check_sum_adjustment: u32,
    pub magic_number: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    pub index_to_loc_format: IndexToLocFormat,
    pub glyph_data_format: i16,
}

/// `hhea` horizontal header table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/hhea>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub num_h_metrics: u16,
}

/// `hmtx` horizontal metrics table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx>
#[derive(Debug, Clone, PartialEq)]
pub struct HmtxTable {
    pub h_metrics: Vec<LongHorMetric>,
    pub left_side_bearings: Vec<i16>,
}

/// A `longHorMetric` record in the `hmtx` table.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

/// maxp - Maximum profile
///
/// Fonts with CFF data use version 0.5 of this table, specifying only the numGlyphs field.
/// Fonts with TrueType outlines use version 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxpTable {
    pub version: u32,
    pub num_glyphs: u16,
}

/// `name` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/name>
pub struct NameTable<'a> {
    pub string_storage: ReadScope<'a>,
    pub name_records: ReadArray<'a, NameRecord>,
}

/// Record within the `name` table
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub length: u16,
    pub offset: u16,
}

impl ReadBinary for TTCHeader<'_> {
    type HostType<'a> = TTCHeader<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let ttc_tag = ctxt.read_u32be()?;
        if ttc_tag != TTCF_MAGIC {
            return Err(ParseError::NotATrueTypeFont);
        }
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version((major_version == 1 || major_version == 2) && minor_version == 0)?;
        let num_fonts = usize::try_from(ctxt.read_u32be()?)?;
        let offset_tables = ctxt.read_array::<U32Be>(num_fonts)?;
        // version 2 digital signature fields are not needed
        Ok(TTCHeader {
            major_version,
            minor_version,
            offset_tables,
        })
    }
}

impl ReadFrom for OffsetTableHeader {
    type ReadType = ((U32Be, U16Be), ((U16Be, U16Be), U16Be));

    fn read_from(
        ((sfnt_version, num_tables), ((search_range, entry_selector), range_shift)): (
            (u32, u16),
            ((u16, u16), u16),
        ),
    ) -> Self {
        OffsetTableHeader {
            sfnt_version,
            num_tables,
            search_range,
            entry_selector,
            range_shift,
        }
    }
}

impl OffsetTableHeader {
    pub const SIZE: usize = 12;
}

impl WriteBinary<&Self> for OffsetTableHeader {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, header: &Self) -> Result<(), WriteError> {
        U32Be::write(ctxt, header.sfnt_version)?;
        U16Be::write(ctxt, header.num_tables)?;
        U16Be::write(ctxt, header.search_range)?;
        U16Be::write(ctxt, header.entry_selector)?;
        U16Be::write(ctxt, header.range_shift)?;
        Ok(())
    }
}

impl ReadFrom for TableRecord {
    type ReadType = ((U32Be, U32Be), (U32Be, U32Be));

    fn read_from(((table_tag, checksum), (offset, length)): ((u32, u32), (u32, u32))) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl WriteBinary<&Self> for TableRecord {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &TableRecord) -> Result<(), WriteError> {
        U32Be::write(ctxt, table.table_tag)?;
        U32Be::write(ctxt, table.checksum)?;
        U32Be::write(ctxt, table.offset)?;
        U32Be::write(ctxt, table.length)?;

        Ok(())
    }
}

impl TableRecord {
    pub const SIZE: usize = 16;

    /// Offset of the end of this table's data, `None` if it overflows.
    pub fn end(&self) -> Option<u64> {
        u64::from(self.offset).checked_add(u64::from(self.length))
    }
}

impl ReadBinary for HeadTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read::<U16Be>()?;
        let minor_version = ctxt.read::<U16Be>()?;
        let font_revision = ctxt.read::<Fixed>()?;
        let check_sum_adjustment = ctxt.read::<U32Be>()?;
        let magic_number = ctxt.read::<U32Be>()?;
        ctxt.check(magic_number == HEAD_MAGIC)?;
        let flags = ctxt.read::<U16Be>()?;
        let units_per_em = ctxt.read::<U16Be>()?;
        ctxt.skip(16)?; // created, modified
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;
        let mac_style = ctxt.read::<U16Be>()?;
        let lowest_rec_ppem = ctxt.read::<U16Be>()?;
        let font_direction_hint = ctxt.read::<I16Be>()?;
        let index_to_loc_format = ctxt.read::<IndexToLocFormat>()?;
        let glyph_data_format = ctxt.read::<I16Be>()?;

        Ok(HeadTable {
            major_version,
            minor_version,
            font_revision,
            check_sum_adjustment,
            magic_number,
            flags,
            units_per_em,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

impl HeadTable {
    // macStyle:
    // Bit 0: Bold (if set to 1);
    // Bit 1: Italic (if set to 1)
    // https://docs.microsoft.com/en-us/typography/opentype/spec/head
    pub fn is_bold(&self) -> bool {
        self.mac_style & 1 != 0
    }

    pub fn is_italic(&self) -> bool {
        self.mac_style & 2 != 0
    }
}

impl ReadBinary for HheaTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1 && minor_version == 0)?;
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let advance_width_max = ctxt.read_u16be()?;
        // minLeftSideBearing through the four reserved words
        ctxt.skip(10 * 2)?;
        let metric_data_format = ctxt.read_i16be()?;
        ctxt.check(metric_data_format == 0)?;
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            num_h_metrics,
        })
    }
}

impl ReadBinaryDep for HmtxTable {
    type Args<'a> = (usize, usize); // num_glyphs, num_h_metrics
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, num_h_metrics): (usize, usize),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let h_metrics = ctxt.read_array::<LongHorMetric>(num_h_metrics)?;
        let left_side_bearings =
            ctxt.read_array::<I16Be>(num_glyphs.saturating_sub(num_h_metrics))?;
        Ok(HmtxTable {
            h_metrics: h_metrics.to_vec(),
            left_side_bearings: left_side_bearings.to_vec(),
        })
    }
}

impl HmtxTable {
    /// Expected byte length of an `hmtx` table.
    pub fn expected_len(num_glyphs: usize, num_h_metrics: usize) -> usize {
        num_h_metrics * 4 + num_glyphs.saturating_sub(num_h_metrics) * 2
    }

    pub fn horizontal_advance(&self, glyph_id: u16) -> Result<u16, ParseError> {
        // As an optimization, the number of records can be less than the number of glyphs, in
        // which case the advance width value of the last record applies to all remaining glyph
        // IDs. -- https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx
        self.h_metrics
            .get(usize::from(glyph_id))
            .or_else(|| self.h_metrics.last())
            .map(|metric| metric.advance_width)
            .ok_or(ParseError::BadIndex)
    }
}

impl ReadFrom for LongHorMetric {
    type ReadType = (U16Be, I16Be);

    fn read_from((advance_width, lsb): (u16, i16)) -> Self {
        LongHorMetric { advance_width, lsb }
    }
}

impl ReadBinary for MaxpTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        let num_glyphs = ctxt.read_u16be()?;
        Ok(MaxpTable {
            version,
            num_glyphs,
        })
    }
}

impl MaxpTable {
    pub const VERSION_0_5: u32 = 0x00005000;
    pub const VERSION_1_0: u32 = 0x00010000;
    pub const VERSION_0_5_LEN: usize = 6;
    pub const VERSION_1_0_LEN: usize = 32;
}

impl ReadBinary for NameTable<'_> {
    type HostType<'a> = NameTable<'a>;

    /// Read a `name` table, checking that every record's string lies within the table.
    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let table_len = scope.data().len();

        let format = ctxt.read_u16be()?;
        ctxt.check_version(format <= 1)?;
        let count = usize::from(ctxt.read_u16be()?);
        let string_offset = usize::from(ctxt.read_u16be()?);
        let name_records = ctxt.read_array::<NameRecord>(count)?;
        if format == 1 {
            // language-tag records, only needed to resolve language ids >= 0x8000
            let langtag_count = usize::from(ctxt.read_u16be()?);
            ctxt.skip(langtag_count * 4)?;
        }
        if string_offset > table_len {
            return Err(ParseError::BadOffset);
        }
        let string_storage = scope.offset(string_offset);
        for record in name_records.iter() {
            let end = usize::from(record.offset) + usize::from(record.length);
            if end > string_storage.data().len() {
                return Err(ParseError::BadOffset);
            }
        }

        Ok(NameTable {
            string_storage,
            name_records,
        })
    }
}

impl<'a> NameTable<'a> {
    /// The raw bytes of the string referenced by `record`.
    pub fn string_data(&self, record: &NameRecord) -> Result<&'a [u8], ParseError> {
        self.string_storage
            .offset_length(usize::from(record.offset), usize::from(record.length))
            .map(|scope| scope.data())
    }
}

impl ReadFrom for NameRecord {
    type ReadType = ((U16Be, U16Be, U16Be), (U16Be, U16Be, U16Be));

    fn read_from(
        ((platform_id, encoding_id, language_id), (name_id, length, offset)): (
            (u16, u16, u16),
            (u16, u16, u16),
        ),
    ) -> Self {
        NameRecord {
            platform_id,
            encoding_id,
            language_id,
            name_id,
            length,
            offset,
        }
    }
}

impl ReadBinary for IndexToLocFormat {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let index_to_loc_format = ctxt.read_i16be()?;

        match index_to_loc_format {
            0 => Ok(IndexToLocFormat::Short),
            1 => Ok(IndexToLocFormat::Long),
            _ => Err(ParseError::BadValue),
        }
    }
}

impl Fixed {
    pub fn new(value: i32) -> Fixed {
        Fixed(value)
    }

    pub fn raw_value(self) -> i32 {
        self.0
    }

    /// The integer part, rounding towards negative infinity.
    pub fn floor(self) -> i32 {
        self.0 >> 16
    }
}

impl ReadFrom for Fixed {
    type ReadType = I32Be;

    fn read_from(value: i32) -> Self {
        Fixed(value)
    }
}

impl WriteBinary for Fixed {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, val: Self) -> Result<(), WriteError> {
        I32Be::write(ctxt, val.0)
    }
}

impl From<Fixed> for f64 {
    fn from(value: Fixed) -> f64 {
        f64::from(value.0) / 65536.0
    }
}
