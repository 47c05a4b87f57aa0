//! Writing of SFNT containers.
//!
//! A font is described as a list of [TableDescriptor]s, each naming a table and where its data
//! comes from: copied from a source font, or supplied by the caller. [write_sfnt] lays the
//! tables out, computes every checksum including `head.checkSumAdjustment`, and streams the
//! result to a [WriteContext].

use std::borrow::Cow;
use std::convert::TryFrom;
use std::num::Wrapping;

use byteorder::{BigEndian, ByteOrder};
use itertools::Itertools;
use log::debug;

use crate::binary::long_align;
use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use crate::checksum::{self, HEAD_CHECKSUM_ADJUSTMENT_OFFSET};
use crate::error::{ReadWriteError, WriteError};
use crate::tables::{FontTableProvider, OffsetTableHeader, TableRecord};
use crate::tag::{self, DisplayTag};

/// Tables in the order their data is laid out in the file. Interpreters that read a font
/// sequentially expect this order; tables not listed follow in the order given.
const TABLE_ORDER: [u32; 21] = [
    tag::HEAD,
    tag::HHEA,
    tag::MAXP,
    tag::OS_2,
    tag::HMTX,
    tag::LTSH,
    tag::VDMX,
    tag::HDMX,
    tag::CMAP,
    tag::CFF,
    tag::FPGM,
    tag::PREP,
    tag::CVT,
    tag::LOCA,
    tag::GLYF,
    tag::KERN,
    tag::NAME,
    tag::POST,
    tag::GASP,
    tag::PCLT,
    tag::DSIG,
];

/// A table to be written and the source of its data.
#[derive(Debug, Clone)]
pub struct TableDescriptor<'a> {
    pub tag: u32,
    pub action: TableAction<'a>,
}

/// Where the data of a table comes from.
#[derive(Debug, Clone)]
pub struct TableAction<'a>(Action<'a>);

#[derive(Debug, Clone)]
enum Action<'a> {
    /// Copy the table described by the record from the source font.
    Copy(TableRecord),
    /// Use the supplied bytes.
    Replace(Cow<'a, [u8]>),
    /// Emit the `head` table from `source` with `checkSumAdjustment` overwritten.
    FixupHead {
        source: Box<Action<'a>>,
        check_sum_adjustment: u32,
    },
}

/// Source of a table's data for [write_sfnt].
///
/// The writer makes two passes: it measures every table to lay the font out, then writes
/// them. Both must see the same data.
pub trait TableSource<P: FontTableProvider> {
    /// Unpadded length and checksum of the table's data.
    fn measure(&self, provider: &mut P) -> Result<(usize, Wrapping<u32>), ReadWriteError>;

    /// Write the unpadded table data to `ctxt`, returning the number of bytes written.
    fn write<C: WriteContext>(&self, provider: &mut P, ctxt: &mut C)
        -> Result<usize, ReadWriteError>;
}

/// Wishlist entry for [intersect_tables].
#[derive(Debug, Clone)]
pub enum Wish<'a> {
    /// Copy the table from the font, if present.
    Copy,
    /// Use the supplied bytes, whether or not the font has the table.
    Replace(Cow<'a, [u8]>),
    /// Leave the table out.
    Drop,
}

impl<'a> TableAction<'a> {
    pub fn copy(record: TableRecord) -> Self {
        TableAction(Action::Copy(record))
    }

    pub fn replace(data: impl Into<Cow<'a, [u8]>>) -> Self {
        TableAction(Action::Replace(data.into()))
    }

    pub fn is_copy(&self) -> bool {
        matches!(self.0, Action::Copy(_))
    }

    fn with_head_fixup(&self, check_sum_adjustment: u32) -> Self {
        TableAction(Action::FixupHead {
            source: Box::new(self.0.clone()),
            check_sum_adjustment,
        })
    }
}

impl<'a> TableDescriptor<'a> {
    pub fn copy(record: TableRecord) -> Self {
        TableDescriptor {
            tag: record.table_tag,
            action: TableAction::copy(record),
        }
    }

    pub fn replace(tag: u32, data: impl Into<Cow<'a, [u8]>>) -> Self {
        TableDescriptor {
            tag,
            action: TableAction::replace(data),
        }
    }
}

impl Action<'_> {
    fn data<P: FontTableProvider>(&self, provider: &mut P) -> Result<Cow<'_, [u8]>, ReadWriteError> {
        match self {
            Action::Copy(record) => Ok(Cow::Owned(provider.read_table_record(record)?)),
            Action::Replace(data) => Ok(Cow::Borrowed(data)),
            Action::FixupHead {
                source,
                check_sum_adjustment,
            } => {
                let mut data = source.data(provider)?.into_owned();
                let field = data
                    .get_mut(HEAD_CHECKSUM_ADJUSTMENT_OFFSET..HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4)
                    .ok_or(WriteError::BadValue)?;
                BigEndian::write_u32(field, *check_sum_adjustment);
                Ok(Cow::Owned(data))
            }
        }
    }
}

impl<P: FontTableProvider> TableSource<P> for TableDescriptor<'_> {
    fn measure(&self, provider: &mut P) -> Result<(usize, Wrapping<u32>), ReadWriteError> {
        let data = self.action.0.data(provider)?;
        // The directory checksum of head is computed as if checkSumAdjustment were zero.
        let checksum = if self.tag == tag::HEAD {
            checksum::head_checksum(&data)?
        } else {
            checksum::table_checksum(&data)?
        };
        Ok((data.len(), checksum))
    }

    fn write<C: WriteContext>(
        &self,
        provider: &mut P,
        ctxt: &mut C,
    ) -> Result<usize, ReadWriteError> {
        let data = self.action.0.data(provider)?;
        ctxt.write_bytes(&data)?;
        Ok(data.len())
    }
}

/// Calculate the maximum power of 2 that is <= num
fn max_power_of_2(num: u16) -> u16 {
    15u16.saturating_sub(num.leading_zeros() as u16)
}

/// Sort `tables` into layout order: the tables of [TABLE_ORDER] first, then the rest as given.
fn layout_order<'a>(tables: Vec<TableDescriptor<'a>>) -> Vec<TableDescriptor<'a>> {
    tables
        .into_iter()
        .enumerate()
        .sorted_by_key(|(index, table)| {
            match TABLE_ORDER.iter().position(|&tag| tag == table.tag) {
                Some(rank) => (0, rank, *index),
                None => (1, 0, *index),
            }
        })
        .map(|(_, table)| table)
        .collect()
}

/// Build the offset table header for a font of `num_tables` tables.
///
/// The binary search fields are 16-bit, which limits a font to 4095 tables.
fn offset_table_header(
    sfnt_version: u32,
    num_tables: u16,
) -> Result<OffsetTableHeader, WriteError> {
    let entry_selector = max_power_of_2(num_tables);
    let search_range = (1u32 << entry_selector) * 16;
    let range_shift = (u32::from(num_tables) * 16).saturating_sub(search_range);
    Ok(OffsetTableHeader {
        sfnt_version,
        num_tables,
        search_range: u16::try_from(search_range)?,
        entry_selector,
        range_shift: u16::try_from(range_shift)?,
    })
}

/// Write an SFNT font made of `tables` to `ctxt`, returning the number of bytes written.
///
/// Copied tables are read from `provider`. The table directory is sorted by tag while the
/// table data is laid out in the conventional order. Each table is padded to a four byte
/// boundary and `head.checkSumAdjustment` is set so the whole font sums to `0xB1B0AFBA`.
pub fn write_sfnt<P: FontTableProvider, C: WriteContext>(
    provider: &mut P,
    tables: Vec<TableDescriptor<'_>>,
    sfnt_version: u32,
    ctxt: &mut C,
) -> Result<usize, ReadWriteError> {
    if tables.iter().map(|table| table.tag).duplicates().next().is_some() {
        return Err(WriteError::BadValue.into());
    }
    let mut tables = layout_order(tables);
    let num_tables = u16::try_from(tables.len()).map_err(WriteError::from)?;

    // Layout pass
    let header_len = OffsetTableHeader::SIZE + tables.len() * TableRecord::SIZE;
    let mut offset = header_len;
    let mut tables_checksum = Wrapping(0);
    let mut records = Vec::with_capacity(tables.len());
    for table in &tables {
        let (length, table_checksum) = table.measure(provider)?;
        records.push(TableRecord {
            table_tag: table.tag,
            checksum: table_checksum.0,
            offset: u32::try_from(offset).map_err(WriteError::from)?,
            length: u32::try_from(length).map_err(WriteError::from)?,
        });
        debug!(
            "layout {} at {} length {}",
            DisplayTag(table.tag),
            offset,
            length
        );
        tables_checksum += table_checksum;
        offset += long_align(length);
    }
    let total_len = offset;
    let lengths = records
        .iter()
        .map(|record| record.length as usize)
        .collect_vec();
    records.sort_by_key(|record| record.table_tag);

    let mut header = WriteBuffer::new();
    OffsetTableHeader::write(&mut header, &offset_table_header(sfnt_version, num_tables)?)?;
    for record in &records {
        TableRecord::write(&mut header, record)?;
    }
    let font_checksum = checksum::table_checksum(header.bytes())? + tables_checksum;
    let check_sum_adjustment = checksum::checksum_adjustment(font_checksum);

    for table in tables.iter_mut() {
        if table.tag == tag::HEAD {
            table.action = table.action.with_head_fixup(check_sum_adjustment);
        }
    }

    // Emission pass
    let start = ctxt.bytes_written();
    ctxt.write_bytes(header.bytes())?;
    for (table, &length) in tables.iter().zip(lengths.iter()) {
        let written = table.write(provider, ctxt)?;
        if written != length {
            return Err(WriteError::LayoutMismatch.into());
        }
        ctxt.write_zeros(long_align(written) - written)?;
    }
    let written = ctxt.bytes_written() - start;
    if written != total_len {
        return Err(WriteError::LayoutMismatch.into());
    }

    Ok(written)
}

/// Pair a sorted wishlist of tables with the tables present in `provider`.
///
/// `Copy` wishes are kept only if the font has the table, and are wired to its record.
/// `Replace` wishes are always kept. `Drop` wishes are removed.
pub fn intersect_tables<'a, P: FontTableProvider>(
    provider: &P,
    wishlist: Vec<(u32, Wish<'a>)>,
) -> Vec<TableDescriptor<'a>> {
    wishlist
        .into_iter()
        .filter_map(|(tag, wish)| match wish {
            Wish::Copy => provider.find_table_record(tag).map(TableDescriptor::copy),
            Wish::Replace(data) => Some(TableDescriptor::replace(tag, data)),
            Wish::Drop => None,
        })
        .collect()
}

/// Descriptors copying every table of `provider`.
pub fn copy_all_tables<'a, P: FontTableProvider>(provider: &P) -> Vec<TableDescriptor<'a>> {
    provider
        .table_records()
        .iter()
        .copied()
        .map(TableDescriptor::copy)
        .collect()
}
