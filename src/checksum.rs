#![deny(missing_docs)]

//! OpenType checksums.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums>

use std::num::Wrapping;

use crate::binary::read::ReadScope;
use crate::binary::U32Be;
use crate::error::ParseError;

/// The value the checksum of a complete font file must equal once `head.checkSumAdjustment`
/// has been filled in.
pub const FONT_CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Byte offset of `checkSumAdjustment` within the `head` table.
pub const HEAD_CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;

/// Calculate a checksum of `data` according to the OpenType table checksum algorithm.
///
/// `data` need not be a multiple of four bytes long, missing trailing bytes are treated as
/// zero padding.
pub fn table_checksum(data: &[u8]) -> Result<Wrapping<u32>, ParseError> {
    let whole = data.len() & !3;
    let mut ctxt = ReadScope::new(&data[..whole]).ctxt();
    let array = ctxt.read_array::<U32Be>(whole / 4)?;
    let mut sum: Wrapping<u32> = array.iter().map(Wrapping).sum();

    let tail = &data[whole..];
    if !tail.is_empty() {
        let mut last = [0u8; 4];
        last[..tail.len()].copy_from_slice(tail);
        sum += Wrapping(u32::from_be_bytes(last));
    }
    Ok(sum)
}

/// Checksum of a `head` table as recorded in the table directory: computed as if
/// `checkSumAdjustment` were zero.
pub fn head_checksum(data: &[u8]) -> Result<Wrapping<u32>, ParseError> {
    let adjustment = ReadScope::new(data)
        .offset(HEAD_CHECKSUM_ADJUSTMENT_OFFSET)
        .read::<U32Be>()?;
    Ok(table_checksum(data)? - Wrapping(adjustment))
}

/// The value for `head.checkSumAdjustment` given the checksum of the whole font computed with
/// that field set to zero.
pub fn checksum_adjustment(font_checksum: Wrapping<u32>) -> u32 {
    (Wrapping(FONT_CHECKSUM_MAGIC) - font_checksum).0
}
