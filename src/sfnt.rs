//! Loading of SFNT containers: TrueType and CFF-flavoured OpenType fonts, either standalone
//! or selected from a TrueType collection.
//!
//! Tables are read from the underlying source on demand. The tables every embedding needs
//! (`head`, `maxp`) are validated when the font is loaded; the rest are loaded and validated
//! the first time they are used.

use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::warn;

use crate::binary::{long_align, U32Be};
use crate::binary::read::ReadScope;
use crate::checksum::{head_checksum, table_checksum, FONT_CHECKSUM_MAGIC};
use crate::error::ParseError;
use crate::tables::cmap::Cmap;
use crate::tables::loca::LocaTable;
use crate::tables::{
    FontTableProvider, HeadTable, HheaTable, HmtxTable, IndexToLocFormat, MaxpTable, NameTable,
    OffsetTableHeader, TTCHeader, TableRecord, CFF_MAGIC, HEAD_TABLE_LEN, HHEA_TABLE_LEN,
    TTCF_MAGIC, TTF_MAGIC,
};
use crate::tag::{self, DisplayTag};

/// Options controlling how a font is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Index of the font to load from a TrueType collection. Must be 0 for other fonts.
    pub ttc_index: usize,
    /// Verify table checksums as tables are read, and the whole-file checksum on load.
    pub validate_checksums: bool,
}

/// A loaded SFNT font.
///
/// The reader is retained and tables are fetched from it as they are needed, so the font must
/// be exclusively owned by whoever uses it.
pub struct SfntFont<R: Read + Seek> {
    reader: R,
    options: LoadOptions,
    sfnt_version: u32,
    is_collection: bool,
    table_records: Vec<TableRecord>,
    head: HeadTable,
    num_glyphs: u16,
    // loaded by `load_more`
    metrics: Option<HorizontalMetrics>,
    outlines: Option<GlyphLocations>,
    name_data: Option<Option<Vec<u8>>>,
    // loaded by `load_cmap`
    cmap: Option<CmapData>,
}

struct HorizontalMetrics {
    num_h_metrics: u16,
    hmtx: HmtxTable,
}

struct GlyphLocations {
    glyf_record: TableRecord,
    loca: LocaTable,
}

struct CmapData {
    data: Vec<u8>,
    unicode_subtable: Option<u32>,
}

impl SfntFont<BufReader<File>> {
    /// Open and load the font at `path`.
    pub fn load<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self, ParseError> {
        let file = File::open(path)?;
        SfntFont::from_reader(BufReader::new(file), options)
    }
}

impl<R: Read + Seek> SfntFont<R> {
    /// Load a font from `reader`.
    ///
    /// Fails if the container is not a supported SFNT font or `head` or `maxp` are missing or
    /// invalid. No font is returned unless every check passed.
    pub fn from_reader(mut reader: R, options: LoadOptions) -> Result<Self, ParseError> {
        let mut header = [0; OffsetTableHeader::SIZE];
        read_at(&mut reader, 0, &mut header)?;

        let is_collection = ReadScope::new(&header).read::<U32Be>()? == TTCF_MAGIC;
        let font_offset = if is_collection {
            let num_fonts = ReadScope::new(&header).offset(8).read::<U32Be>()?;
            let ttc_header = read_vec_at(&mut reader, 0, 12 + u64::from(num_fonts) * 4)?;
            let ttc = ReadScope::new(&ttc_header).read::<TTCHeader<'_>>()?;
            ttc.offset_tables
                .get_item(options.ttc_index)
                .ok_or(ParseError::BadSubfontIndex)?
        } else if options.ttc_index != 0 {
            return Err(ParseError::BadSubfontIndex);
        } else {
            0
        };

        if is_collection {
            read_at(&mut reader, u64::from(font_offset), &mut header)?;
        }
        let offset_table = ReadScope::new(&header).read::<OffsetTableHeader>()?;
        let is_cff = match offset_table.sfnt_version {
            TTF_MAGIC | tag::TRUE => false,
            CFF_MAGIC => true,
            tag::TYP1 => return Err(ParseError::UnsupportedFormat),
            _ => return Err(ParseError::NotATrueTypeFont),
        };

        let num_tables = usize::from(offset_table.num_tables);
        let mut directory = vec![0; num_tables * TableRecord::SIZE];
        read_at(
            &mut reader,
            u64::from(font_offset) + OffsetTableHeader::SIZE as u64,
            &mut directory,
        )?;
        let mut table_records = ReadScope::new(&directory)
            .ctxt()
            .read_array::<TableRecord>(num_tables)?
            .to_vec();
        for record in &table_records {
            if (record.table_tag == tag::CFF && !is_cff) || (record.table_tag == tag::GLYF && is_cff)
            {
                return Err(ParseError::WrongMagic);
            }
        }
        if table_records
            .windows(2)
            .any(|pair| pair[0].table_tag >= pair[1].table_tag)
        {
            warn!("table directory is not sorted by tag");
            table_records.sort_by_key(|record| record.table_tag);
        }

        let head_record = find_record(&table_records, tag::HEAD)?;
        if usize::try_from(head_record.length)? != HEAD_TABLE_LEN {
            return Err(ParseError::BadValue);
        }
        let head_data = read_record(&mut reader, &head_record, options.validate_checksums)?;
        let head = ReadScope::new(&head_data).read::<HeadTable>()?;
        if head.major_version != 1 || head.minor_version != 0 {
            return Err(ParseError::BadVersion);
        }
        if head.glyph_data_format != 0 {
            return Err(ParseError::BadValue);
        }

        if options.validate_checksums && !is_collection {
            check_file_checksum(&mut reader)?;
        }

        let maxp_record = find_record(&table_records, tag::MAXP)?;
        let maxp_data = read_record(&mut reader, &maxp_record, options.validate_checksums)?;
        let maxp = ReadScope::new(&maxp_data).read::<MaxpTable>()?;
        let (expected_version, min_len) = if is_cff {
            (MaxpTable::VERSION_0_5, MaxpTable::VERSION_0_5_LEN)
        } else {
            (MaxpTable::VERSION_1_0, MaxpTable::VERSION_1_0_LEN)
        };
        if maxp.version != expected_version {
            return Err(ParseError::BadVersion);
        }
        if maxp_data.len() < min_len {
            return Err(ParseError::BadEof);
        }

        Ok(SfntFont {
            reader,
            options,
            sfnt_version: offset_table.sfnt_version,
            is_collection,
            table_records,
            head,
            num_glyphs: maxp.num_glyphs,
            metrics: None,
            outlines: None,
            name_data: None,
            cmap: None,
        })
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    /// `true` if the font has CFF outlines (`OTTO`) rather than TrueType ones.
    pub fn is_cff(&self) -> bool {
        self.sfnt_version == CFF_MAGIC
    }

    pub fn is_collection(&self) -> bool {
        self.is_collection
    }

    pub fn ttc_index(&self) -> usize {
        self.options.ttc_index
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    pub fn head(&self) -> &HeadTable {
        &self.head
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    pub fn index_to_loc_format(&self) -> IndexToLocFormat {
        self.head.index_to_loc_format
    }

    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    /// Index of the table `tag` in the table directory.
    pub fn find_table(&self, tag: u32) -> Option<usize> {
        self.table_records
            .binary_search_by(|record| record.table_tag.cmp(&tag))
            .ok()
    }

    /// The data of table `tag`, zero padded to a multiple of four bytes.
    pub fn get_table(&mut self, tag: u32) -> Result<Vec<u8>, ParseError> {
        let mut data = self.read_table_data(tag)?;
        data.resize(long_align(data.len()), 0);
        Ok(data)
    }

    /// Load the tables needed to measure and subset glyphs: `loca` and the `glyf` location
    /// (TrueType outlines only), `hhea`, `hmtx` and `name`.
    ///
    /// Tables already loaded are not read again.
    pub fn load_more(&mut self) -> Result<(), ParseError> {
        if !self.is_cff() {
            self.load_outlines()?;
        }
        self.load_metrics()?;
        self.name_data()?;
        Ok(())
    }

    fn load_outlines(&mut self) -> Result<(), ParseError> {
        if self.outlines.is_some() {
            return Ok(());
        }
        let glyf_record = find_record(&self.table_records, tag::GLYF)?;
        let loca_data = self.read_table_data(tag::LOCA)?;
        let loca = ReadScope::new(&loca_data)
            .read_dep::<LocaTable>((self.num_glyphs, self.index_to_loc_format()))?;
        if loca.last().unwrap_or(0) > glyf_record.length {
            return Err(ParseError::BadOffset);
        }
        self.outlines = Some(GlyphLocations { glyf_record, loca });
        Ok(())
    }

    fn load_metrics(&mut self) -> Result<(), ParseError> {
        if self.metrics.is_some() {
            return Ok(());
        }
        let hhea_data = self.read_table_data(tag::HHEA)?;
        if hhea_data.len() != HHEA_TABLE_LEN {
            return Err(ParseError::BadValue);
        }
        let hhea = ReadScope::new(&hhea_data).read::<HheaTable>()?;
        if hhea.num_h_metrics == 0 {
            return Err(ParseError::BadValue);
        }

        let hmtx_data = self.read_table_data(tag::HMTX)?;
        let num_glyphs = usize::from(self.num_glyphs);
        let num_h_metrics = usize::from(hhea.num_h_metrics);
        if hmtx_data.len() != HmtxTable::expected_len(num_glyphs, num_h_metrics) {
            return Err(ParseError::BadValue);
        }
        let hmtx = ReadScope::new(&hmtx_data).read_dep::<HmtxTable>((num_glyphs, num_h_metrics))?;
        self.metrics = Some(HorizontalMetrics {
            num_h_metrics: hhea.num_h_metrics,
            hmtx,
        });
        Ok(())
    }

    /// Load the `cmap` table and locate its Unicode subtable.
    ///
    /// A font without a usable Unicode subtable is not an error until a character is looked
    /// up.
    pub fn load_cmap(&mut self) -> Result<(), ParseError> {
        if self.cmap.is_some() {
            return Ok(());
        }
        let data = match self.table_data(tag::CMAP)? {
            Some(data) => data,
            None => {
                warn!("font has no cmap table");
                self.cmap = Some(CmapData {
                    data: Vec::new(),
                    unicode_subtable: None,
                });
                return Ok(());
            }
        };
        let unicode_subtable = ReadScope::new(&data)
            .read::<Cmap<'_>>()?
            .unicode_subtable_offset()?;
        if unicode_subtable.is_none() {
            warn!("font has no Windows Unicode cmap subtable");
        }
        self.cmap = Some(CmapData {
            data,
            unicode_subtable,
        });
        Ok(())
    }

    /// `true` if characters can be looked up with [SfntFont::from_unicode].
    pub fn has_unicode_cmap(&mut self) -> Result<bool, ParseError> {
        self.load_cmap()?;
        Ok(matches!(&self.cmap, Some(CmapData { unicode_subtable: Some(_), .. })))
    }

    /// The glyph for the Unicode code point `ch`, 0 if it is not mapped.
    pub fn from_unicode(&mut self, ch: u32) -> Result<u16, ParseError> {
        self.load_cmap()?;
        match &self.cmap {
            Some(CmapData {
                data,
                unicode_subtable: Some(offset),
            }) => {
                let cmap = ReadScope::new(data).read::<Cmap<'_>>()?;
                let glyph_id = cmap.format4_subtable(*offset)?.map_glyph(ch)?;
                Ok(glyph_id.unwrap_or(0))
            }
            _ => Err(ParseError::UnsuitableCmap),
        }
    }

    /// The `numberOfHMetrics` value of `hhea`.
    pub fn num_h_metrics(&mut self) -> Result<u16, ParseError> {
        self.load_metrics()?;
        self.metrics
            .as_ref()
            .map(|metrics| metrics.num_h_metrics)
            .ok_or(ParseError::MissingValue)
    }

    /// Advance width of `glyph_id` in font units.
    pub fn advance_width(&mut self, glyph_id: u16) -> Result<u16, ParseError> {
        if glyph_id >= self.num_glyphs {
            return Err(ParseError::BadIndex);
        }
        self.load_metrics()?;
        self.metrics
            .as_ref()
            .ok_or(ParseError::MissingValue)?
            .hmtx
            .horizontal_advance(glyph_id)
    }

    /// The `loca` offsets of a TrueType font.
    pub fn loca(&mut self) -> Result<&LocaTable, ParseError> {
        if self.is_cff() {
            return Err(ParseError::MissingTable(tag::GLYF));
        }
        self.load_outlines()?;
        self.outlines
            .as_ref()
            .map(|outlines| &outlines.loca)
            .ok_or(ParseError::MissingValue)
    }

    /// Byte offset and length of `glyph_id` within `glyf`.
    pub fn glyph_offset(&mut self, glyph_id: u16) -> Result<(u32, u32), ParseError> {
        let (start, end) = self.loca()?.glyph_range(glyph_id).ok_or(ParseError::BadIndex)?;
        Ok((start, end - start))
    }

    /// The raw bytes of `glyph_id`. Empty glyphs yield an empty buffer.
    pub fn glyph(&mut self, glyph_id: u16) -> Result<Vec<u8>, ParseError> {
        let (offset, length) = self.glyph_offset(glyph_id)?;
        let glyf_record = self
            .outlines
            .as_ref()
            .map(|outlines| outlines.glyf_record)
            .ok_or(ParseError::MissingValue)?;
        let mut data = vec![0; usize::try_from(length)?];
        read_at(
            &mut self.reader,
            u64::from(glyf_record.offset) + u64::from(offset),
            &mut data,
        )?;
        Ok(data)
    }

    /// Data of the `name` table, `None` if the font has none.
    pub fn name_data(&mut self) -> Result<Option<&[u8]>, ParseError> {
        if self.name_data.is_none() {
            let data = self.table_data(tag::NAME)?;
            match &data {
                Some(data) => {
                    ReadScope::new(data).read::<NameTable<'_>>()?;
                }
                None => warn!("font has no name table"),
            }
            self.name_data = Some(data);
        }
        Ok(self.name_data.as_ref().and_then(|data| data.as_deref()))
    }

    /// Give back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> FontTableProvider for SfntFont<R> {
    fn table_records(&self) -> &[TableRecord] {
        &self.table_records
    }

    fn read_table_record(&mut self, record: &TableRecord) -> Result<Vec<u8>, ParseError> {
        read_record(&mut self.reader, record, self.options.validate_checksums)
    }
}

fn find_record(table_records: &[TableRecord], tag: u32) -> Result<TableRecord, ParseError> {
    table_records
        .binary_search_by(|record| record.table_tag.cmp(&tag))
        .map(|index| table_records[index])
        .map_err(|_| ParseError::MissingTable(tag))
}

fn read_at<R: Read + Seek>(reader: &mut R, offset: u64, buf: &mut [u8]) -> Result<(), ParseError> {
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(buf)?;
    Ok(())
}

/// Read `length` bytes at `offset`. The range is checked against the end of the stream
/// before anything is allocated.
fn read_vec_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    length: u64,
) -> Result<Vec<u8>, ParseError> {
    let stream_len = reader.seek(SeekFrom::End(0))?;
    if length > 0 && offset >= stream_len {
        return Err(ParseError::BadOffset);
    }
    if offset.saturating_add(length) > stream_len {
        return Err(ParseError::BadEof);
    }
    let mut data = vec![0; usize::try_from(length)?];
    read_at(reader, offset, &mut data)?;
    Ok(data)
}

/// Read the data of `record`, checking it against the directory checksum if `validate`.
fn read_record<R: Read + Seek>(
    reader: &mut R,
    record: &TableRecord,
    validate: bool,
) -> Result<Vec<u8>, ParseError> {
    let data = read_vec_at(
        reader,
        u64::from(record.offset),
        u64::from(record.length),
    )?;
    if validate {
        let checksum = if record.table_tag == tag::HEAD {
            head_checksum(&data)?
        } else {
            table_checksum(&data)?
        };
        if checksum.0 != record.checksum {
            warn!(
                "checksum mismatch in table {}",
                DisplayTag(record.table_tag)
            );
            return Err(ParseError::ChecksumMismatch(record.table_tag));
        }
    }
    Ok(data)
}

/// Verify that the whole file sums to the font checksum magic number.
fn check_file_checksum<R: Read + Seek>(reader: &mut R) -> Result<(), ParseError> {
    reader.seek(SeekFrom::Start(0))?;
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    if table_checksum(&data)?.0 != FONT_CHECKSUM_MAGIC {
        return Err(ParseError::ChecksumMismatch(0));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::tests::writer::{self, FontOptions, TestFont};

    fn load(data: Vec<u8>) -> Result<SfntFont<Cursor<Vec<u8>>>, ParseError> {
        SfntFont::from_reader(Cursor::new(data), LoadOptions::default())
    }

    fn sample() -> SfntFont<Cursor<Vec<u8>>> {
        load(writer::sample_font(&FontOptions::default()).build()).unwrap()
    }

    #[test]
    fn test_load_sample() {
        let mut font = sample();
        assert!(!font.is_cff());
        assert_eq!(font.units_per_em(), 2048);
        assert_eq!(font.num_glyphs(), 9);
        assert_eq!(font.index_to_loc_format(), IndexToLocFormat::Short);
        assert_eq!(font.num_h_metrics(), Ok(6));
        assert_eq!(font.advance_width(1), Ok(2048));
        assert_eq!(font.advance_width(8), Ok(1000));
        assert_eq!(font.advance_width(9), Err(ParseError::BadIndex));
    }

    #[test]
    fn test_find_table_matches_linear_scan() {
        let font = sample();
        let tags = [
            tag::CMAP, tag::CVT, tag::GLYF, tag::HEAD, tag::OS_2, tag::POST,
            u32::from_be_bytes(*b"zzzz"),
            tag::CFF, tag::KERN, 0, u32::MAX,
        ];
        for &tag in &tags {
            let linear = font
                .table_records()
                .iter()
                .position(|record| record.table_tag == tag);
            assert_eq!(font.find_table(tag), linear, "{}", DisplayTag(tag));
        }
    }

    #[test]
    fn test_get_table_is_padded() {
        let mut font = sample();
        let data = font.get_table(tag::FPGM).unwrap();
        assert_eq!(data, vec![0xB0, 0x01, 0x2C, 0]);
        assert_eq!(
            font.get_table(tag::KERN),
            Err(ParseError::MissingTable(tag::KERN))
        );
    }

    #[test]
    fn test_glyph_data() {
        let mut font = sample();
        assert_eq!(font.glyph(3).unwrap(), writer::composite_glyph(&[1, 2]));
        assert!(font.glyph(7).unwrap().is_empty());
        assert_eq!(font.glyph(9), Err(ParseError::BadIndex));
    }

    #[test]
    fn test_from_unicode() {
        let mut font = sample();
        assert_eq!(font.from_unicode(u32::from('B')), Ok(3));
        assert_eq!(font.from_unicode(u32::from('Z')), Ok(0));
        assert_eq!(font.has_unicode_cmap(), Ok(true));
    }

    #[test]
    fn test_from_unicode_without_cmap() {
        let data = writer::sample_font(&FontOptions::default())
            .without(b"cmap")
            .build();
        let mut font = load(data).unwrap();
        assert_eq!(font.has_unicode_cmap(), Ok(false));
        assert_eq!(font.from_unicode(0x41), Err(ParseError::UnsuitableCmap));
    }

    #[test]
    fn test_minimal_font() {
        let data = TestFont::new(writer::TRUETYPE)
            .table(b"head", writer::head_table(1000, 0, [0; 4]))
            .table(b"maxp", writer::maxp_table(1))
            .build();
        let mut font = load(data).unwrap();
        assert_eq!(font.num_glyphs(), 1);
        assert_eq!(font.load_more(), Err(ParseError::MissingTable(tag::GLYF)));
    }

    #[test]
    fn test_missing_head() {
        let data = TestFont::new(writer::TRUETYPE)
            .table(b"maxp", writer::maxp_table(1))
            .build();
        assert!(matches!(load(data), Err(ParseError::MissingTable(tag::HEAD))));
    }

    #[test]
    fn test_sfnt_versions() {
        let font = TestFont::new(writer::TRUETYPE)
            .table(b"head", writer::head_table(1000, 0, [0; 4]))
            .table(b"maxp", writer::maxp_table(1));

        let mut typ1 = font.clone();
        typ1.sfnt_version = tag::TYP1;
        assert!(matches!(load(typ1.build()), Err(ParseError::UnsupportedFormat)));

        let mut apple = font.clone();
        apple.sfnt_version = tag::TRUE;
        assert!(load(apple.build()).is_ok());

        let mut junk = font;
        junk.sfnt_version = 0x12345678;
        assert!(matches!(load(junk.build()), Err(ParseError::NotATrueTypeFont)));
    }

    #[test]
    fn test_wrong_magic() {
        let data = writer::sample_font(&FontOptions::default())
            .table(b"CFF ", vec![1, 0, 4, 1])
            .build();
        assert!(matches!(load(data), Err(ParseError::WrongMagic)));

        let cff = writer::sample_cff_font().table(b"glyf", vec![0; 4]);
        assert!(matches!(load(cff.build()), Err(ParseError::WrongMagic)));
    }

    #[test]
    fn test_cff_font() {
        let mut font = load(writer::sample_cff_font().build()).unwrap();
        assert!(font.is_cff());
        assert_eq!(font.num_glyphs(), 3);
        assert_eq!(font.advance_width(2), Ok(600));
        assert_eq!(font.glyph(0), Err(ParseError::MissingTable(tag::GLYF)));
    }

    #[test]
    fn test_maxp_version_must_match_outlines() {
        let data = writer::sample_font(&FontOptions::default())
            .table(b"maxp", writer::maxp_table_cff(9))
            .build();
        assert!(matches!(load(data), Err(ParseError::BadVersion)));
    }

    #[test]
    fn test_head_length() {
        let mut head = writer::head_table(1000, 0, [0; 4]);
        head.extend_from_slice(&[0, 0]);
        let data = TestFont::new(writer::TRUETYPE)
            .table(b"head", head)
            .table(b"maxp", writer::maxp_table(1))
            .build();
        assert!(matches!(load(data), Err(ParseError::BadValue)));
    }

    #[test]
    fn test_checksum_validation() {
        let options = LoadOptions {
            ttc_index: 0,
            validate_checksums: true,
        };
        let data = writer::sample_font(&FontOptions::default()).build();
        let mut font = SfntFont::from_reader(Cursor::new(data.clone()), options).unwrap();
        assert!(font.get_table(tag::GLYF).is_ok());

        // corrupt a byte of the fpgm table
        let index = font.find_table(tag::FPGM).unwrap();
        let offset = font.table_records()[index].offset as usize;
        let mut corrupt = data;
        corrupt[offset] ^= 0xFF;
        // the whole-file checksum catches it on load
        assert!(matches!(
            SfntFont::from_reader(Cursor::new(corrupt.clone()), options),
            Err(ParseError::ChecksumMismatch(0))
        ));
        // without validation the table loads as is
        let mut font = load(corrupt).unwrap();
        assert!(font.get_table(tag::FPGM).is_ok());
    }

    #[test]
    fn test_hmtx_length_checked() {
        let data = writer::sample_font(&FontOptions::default())
            .table(b"hmtx", writer::hmtx_table(&writer::SAMPLE_ADVANCES, 10))
            .build();
        let mut font = load(data).unwrap();
        assert_eq!(font.load_more(), Err(ParseError::BadValue));
    }

    #[test]
    fn test_loca_beyond_glyf() {
        let font = writer::sample_font(&FontOptions::default());
        let glyf = font.get(b"glyf").unwrap();
        let truncated = glyf[..glyf.len() - 4].to_vec();
        let mut font = load(font.table(b"glyf", truncated).build()).unwrap();
        assert_eq!(font.load_more(), Err(ParseError::BadOffset));
    }

    #[test]
    fn test_collection() {
        let first = writer::sample_font(&FontOptions::default());
        let second = writer::sample_font(&FontOptions {
            postscript_name: "Second",
            ..FontOptions::default()
        });
        let data = writer::collection(&[first, second]);
        let options = |ttc_index| LoadOptions {
            ttc_index,
            validate_checksums: false,
        };

        let mut font = SfntFont::from_reader(Cursor::new(data.clone()), options(1)).unwrap();
        assert!(font.is_collection());
        // the loca range, including the pad byte of the short format
        let mut expected = writer::simple_glyph(600);
        expected.push(0);
        assert_eq!(font.glyph(1).unwrap(), expected);
        assert!(matches!(
            SfntFont::from_reader(Cursor::new(data), options(2)),
            Err(ParseError::BadSubfontIndex)
        ));
    }

    #[test]
    fn test_collection_count_beyond_eof() {
        let mut data = b"ttcf\0\x01\0\0\xff\xff\xff\xf0".to_vec();
        data.extend_from_slice(&[0; 16]);
        assert!(matches!(load(data), Err(ParseError::BadEof)));
    }

    #[test]
    fn test_table_length_beyond_eof() {
        let data = writer::sample_font(&FontOptions::default()).build();
        let num_tables = usize::from(u16::from_be_bytes([data[4], data[5]]));
        let record = (0..num_tables)
            .map(|i| 12 + i * 16)
            .find(|&record| &data[record..record + 4] == b"maxp")
            .unwrap();

        let mut long = data.clone();
        long[record + 12..record + 16].copy_from_slice(&0xFFFF_FF00u32.to_be_bytes());
        assert!(matches!(load(long), Err(ParseError::BadEof)));

        let mut far = data;
        far[record + 8..record + 12].copy_from_slice(&0x7FFF_0000u32.to_be_bytes());
        assert!(matches!(load(far), Err(ParseError::BadOffset)));
    }

    #[test]
    fn test_bad_collection_version() {
        let mut data = writer::collection(&[writer::sample_font(&FontOptions::default())]);
        data[5] = 3;
        assert!(matches!(load(data), Err(ParseError::BadVersion)));
    }

    #[test]
    fn test_index_in_plain_font() {
        let data = writer::sample_font(&FontOptions::default()).build();
        let options = LoadOptions {
            ttc_index: 1,
            validate_checksums: false,
        };
        assert!(matches!(
            SfntFont::from_reader(Cursor::new(data), options),
            Err(ParseError::BadSubfontIndex)
        ));
    }
}
