// Shared by the integration tests and, through `include!`, by the unit tests in `src/tests.rs`.
// Only `std` may be used here.

/// Builders for synthetic font tables and whole fonts.
///
/// No binary font fixtures are shipped, so every font used by the tests is assembled here.
pub mod writer {
    #![allow(dead_code)]

    // The `TtfType` helpers are derived from ttf-parser, licenced under Apache-2.0.
    // https://github.com/RazrFalcon/ttf-parser/blob/439aaaebd50eb8aed66302e3c1b51fae047f85b2/src/writer.rs

    #[derive(Clone, Copy, Debug)]
    pub enum TtfType {
        Raw(&'static [u8]),
        Tag(&'static [u8; 4]),
        Int8(i8),
        UInt8(u8),
        Int16(i16),
        UInt16(u16),
        Int32(i32),
        UInt32(u32),
    }

    pub fn convert(values: &[TtfType]) -> Vec<u8> {
        let mut data = Vec::with_capacity(256);
        for v in values {
            convert_type(*v, &mut data);
        }

        data
    }

    pub fn convert_type(value: TtfType, data: &mut Vec<u8>) {
        match value {
            TtfType::Raw(bytes) => data.extend_from_slice(bytes),
            TtfType::Tag(tag) => data.extend_from_slice(tag),
            TtfType::Int8(n) => data.extend_from_slice(&i8::to_be_bytes(n)),
            TtfType::UInt8(n) => data.extend_from_slice(&u8::to_be_bytes(n)),
            TtfType::Int16(n) => data.extend_from_slice(&i16::to_be_bytes(n)),
            TtfType::UInt16(n) => data.extend_from_slice(&u16::to_be_bytes(n)),
            TtfType::Int32(n) => data.extend_from_slice(&i32::to_be_bytes(n)),
            TtfType::UInt32(n) => data.extend_from_slice(&u32::to_be_bytes(n)),
        }
    }

    use TtfType::*;

    pub const TRUETYPE: u32 = 0x00010000;
    pub const OTTO: u32 = 0x4F54544F;

    /// A `head` table. `index_to_loc_format` is 0 for short offsets, 1 for long.
    pub fn head_table(units_per_em: u16, index_to_loc_format: i16, bbox: [i16; 4]) -> Vec<u8> {
        convert(&[
            UInt16(1),
            UInt16(0),
            Int32(0x0001_8000), // fontRevision 1.5
            UInt32(0),          // checkSumAdjustment
            UInt32(0x5F0F3CF5),
            UInt16(0x000B),
            UInt16(units_per_em),
            Raw(&[0; 16]), // created, modified
            Int16(bbox[0]),
            Int16(bbox[1]),
            Int16(bbox[2]),
            Int16(bbox[3]),
            UInt16(0), // macStyle
            UInt16(8),
            Int16(2),
            Int16(index_to_loc_format),
            Int16(0),
        ])
    }

    pub fn hhea_table(ascender: i16, descender: i16, num_h_metrics: u16) -> Vec<u8> {
        let mut data = convert(&[
            UInt16(1),
            UInt16(0),
            Int16(ascender),
            Int16(descender),
            Int16(0),
            UInt16(2048),
        ]);
        data.extend_from_slice(&[0; 20]);
        data.extend(convert(&[Int16(0), UInt16(num_h_metrics)]));
        data
    }

    /// A version 1.0 `maxp` table.
    pub fn maxp_table(num_glyphs: u16) -> Vec<u8> {
        let mut data = convert(&[UInt32(0x00010000), UInt16(num_glyphs)]);
        data.extend_from_slice(&[0; 26]);
        data
    }

    /// A version 0.5 `maxp` table, as used by CFF fonts.
    pub fn maxp_table_cff(num_glyphs: u16) -> Vec<u8> {
        convert(&[UInt32(0x00005000), UInt16(num_glyphs)])
    }

    /// `hmtx` with one long metric per entry of `advances`, the remaining glyphs sharing the
    /// last advance.
    pub fn hmtx_table(advances: &[u16], num_glyphs: usize) -> Vec<u8> {
        let mut data = Vec::new();
        for &advance in advances {
            data.extend(convert(&[UInt16(advance), Int16(0)]));
        }
        for _ in advances.len()..num_glyphs {
            data.extend(convert(&[Int16(0)]));
        }
        data
    }

    pub fn os2_table(version: u16, weight_class: u16, fs_type: u16) -> Vec<u8> {
        os2_table_with(version, weight_class, fs_type, 0x0040, 0x0800)
    }

    pub fn os2_table_with(
        version: u16,
        weight_class: u16,
        fs_type: u16,
        fs_selection: u16,
        family_class: i16,
    ) -> Vec<u8> {
        let mut data = convert(&[
            UInt16(version),
            Int16(500), // xAvgCharWidth
            UInt16(weight_class),
            UInt16(5),
            UInt16(fs_type),
            Raw(&[0; 20]),
            Int16(family_class),
            Raw(&[2, 11, 5, 3, 2, 2, 2, 2, 2, 4]), // panose
            Raw(&[0; 16]),                         // ulUnicodeRange1-4
            Tag(b"TEST"),
            UInt16(fs_selection),
            UInt16(0x20),
            UInt16(0x44),
            Int16(800), // sTypoAscender
            Int16(-200),
            Int16(90),
            UInt16(900),
            UInt16(250),
        ]);
        if version >= 1 {
            data.extend(convert(&[UInt32(1), UInt32(0)]));
        }
        if version >= 2 {
            data.extend(convert(&[
                Int16(450), // sxHeight
                Int16(700), // sCapHeight
                UInt16(0),
                UInt16(0x20),
                UInt16(2),
            ]));
        }
        if version >= 5 {
            data.extend(convert(&[UInt16(0), UInt16(0xFFFE)]));
        }
        data
    }

    /// The 32-byte `post` header; names for version 2.0 must be appended by the caller.
    pub fn post_table(version: i32, italic_angle: i32, is_fixed_pitch: u32) -> Vec<u8> {
        convert(&[
            Int32(version),
            Int32(italic_angle),
            Int16(-100), // underlinePosition
            Int16(50),   // underlineThickness
            UInt32(is_fixed_pitch),
            UInt32(0),
            UInt32(0),
            UInt32(0),
            UInt32(0),
        ])
    }

    /// A format 0 `name` table. Windows strings are stored as UTF-16BE, everything else as
    /// single bytes.
    pub fn name_table(records: &[(u16, u16, u16, u16, &str)]) -> Vec<u8> {
        let mut header = convert(&[
            UInt16(0),
            UInt16(records.len() as u16),
            UInt16(6 + 12 * records.len() as u16),
        ]);
        let mut storage = Vec::new();
        for &(platform_id, encoding_id, language_id, name_id, text) in records {
            let encoded: Vec<u8> = if platform_id == 3 || platform_id == 0 {
                text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
            } else {
                text.as_bytes().to_vec()
            };
            header.extend(convert(&[
                UInt16(platform_id),
                UInt16(encoding_id),
                UInt16(language_id),
                UInt16(name_id),
                UInt16(encoded.len() as u16),
                UInt16(storage.len() as u16),
            ]));
            storage.extend(encoded);
        }
        header.extend(storage);
        header
    }

    /// A `cmap` table holding a single Windows Unicode BMP format 4 subtable, with one
    /// segment per mapping.
    pub fn cmap_table(mappings: &[(u16, u16)]) -> Vec<u8> {
        let mut mappings = mappings.to_vec();
        mappings.sort_unstable();
        let seg_count = mappings.len() as u16 + 1;
        let entry_selector = 15 - seg_count.leading_zeros() as u16;
        let search_range = 2 << entry_selector;

        let mut data = convert(&[
            UInt16(0),
            UInt16(1),
            UInt16(3),
            UInt16(1),
            UInt32(12),
            UInt16(4),
            UInt16(16 + 8 * seg_count),
            UInt16(0),
            UInt16(seg_count * 2),
            UInt16(search_range),
            UInt16(entry_selector),
            UInt16(seg_count * 2 - search_range),
        ]);
        for &(code, _) in &mappings {
            data.extend(convert(&[UInt16(code)]));
        }
        data.extend(convert(&[UInt16(0xFFFF), UInt16(0)]));
        for &(code, _) in &mappings {
            data.extend(convert(&[UInt16(code)]));
        }
        data.extend(convert(&[UInt16(0xFFFF)]));
        for &(code, gid) in &mappings {
            data.extend(convert(&[UInt16(gid.wrapping_sub(code))]));
        }
        data.extend(convert(&[UInt16(1)]));
        for _ in 0..seg_count {
            data.extend(convert(&[UInt16(0)]));
        }
        data
    }

    /// A one-contour, three-point glyph (23 bytes).
    pub fn simple_glyph(x_max: i16) -> Vec<u8> {
        convert(&[
            Int16(1),
            Int16(0),
            Int16(0),
            Int16(x_max),
            Int16(700),
            UInt16(2),
            UInt16(0),
            Raw(&[0x37, 0x37, 0x37]),
            Raw(&[0, 10, 10]),
            Raw(&[0, 20, 0]),
        ])
    }

    /// A composite glyph placing each of `components` with byte offsets.
    pub fn composite_glyph(components: &[u16]) -> Vec<u8> {
        let mut data = convert(&[Int16(-1), Int16(0), Int16(0), Int16(0), Int16(0)]);
        for (i, &glyph_id) in components.iter().enumerate() {
            let more = if i + 1 < components.len() { 0x0020 } else { 0 };
            data.extend(convert(&[
                UInt16(0x0002 | more),
                UInt16(glyph_id),
                Int8(0),
                Int8(0),
            ]));
        }
        data
    }

    /// Build `glyf` and `loca` for `glyphs`. With short offsets every glyph is padded to an
    /// even length.
    pub fn glyf_and_loca(glyphs: &[Vec<u8>], index_to_loc_format: i16) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = Vec::new();
        let mut offsets = vec![0u32];
        for glyph in glyphs {
            glyf.extend_from_slice(glyph);
            if index_to_loc_format == 0 && glyf.len() % 2 == 1 {
                glyf.push(0);
            }
            offsets.push(glyf.len() as u32);
        }
        let loca = offsets
            .iter()
            .flat_map(|&offset| {
                if index_to_loc_format == 0 {
                    ((offset / 2) as u16).to_be_bytes().to_vec()
                } else {
                    offset.to_be_bytes().to_vec()
                }
            })
            .collect();
        (glyf, loca)
    }

    fn checksum(data: &[u8]) -> u32 {
        data.chunks(4).fold(0u32, |sum, chunk| {
            let mut word = [0; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            sum.wrapping_add(u32::from_be_bytes(word))
        })
    }

    /// An SFNT container assembled from raw tables.
    #[derive(Clone, Debug)]
    pub struct TestFont {
        pub sfnt_version: u32,
        pub tables: Vec<([u8; 4], Vec<u8>)>,
    }

    impl TestFont {
        pub fn new(sfnt_version: u32) -> Self {
            TestFont {
                sfnt_version,
                tables: Vec::new(),
            }
        }

        /// Add or replace a table.
        pub fn table(mut self, tag: &[u8; 4], data: Vec<u8>) -> Self {
            self.tables.retain(|(t, _)| t != tag);
            self.tables.push((*tag, data));
            self
        }

        pub fn without(mut self, tag: &[u8; 4]) -> Self {
            self.tables.retain(|(t, _)| t != tag);
            self
        }

        pub fn get(&self, tag: &[u8; 4]) -> Option<&[u8]> {
            self.tables
                .iter()
                .find(|(t, _)| t == tag)
                .map(|(_, data)| data.as_slice())
        }

        pub fn build(&self) -> Vec<u8> {
            self.build_at(0)
        }

        /// Lay the font out as though it starts `base` bytes into a file.
        pub fn build_at(&self, base: usize) -> Vec<u8> {
            let mut tables = self.tables.clone();
            tables.sort_by(|a, b| a.0.cmp(&b.0));
            let num_tables = tables.len() as u16;
            let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
            let search_range = 16 << entry_selector;

            let mut data = convert(&[
                UInt32(self.sfnt_version),
                UInt16(num_tables),
                UInt16(search_range),
                UInt16(entry_selector),
                UInt16(num_tables * 16 - search_range),
            ]);
            let mut offset = base + 12 + 16 * tables.len();
            let mut body = Vec::new();
            for (tag, table) in &tables {
                data.extend_from_slice(tag);
                data.extend(convert(&[
                    UInt32(checksum(table)),
                    UInt32(offset as u32),
                    UInt32(table.len() as u32),
                ]));
                body.extend_from_slice(table);
                while body.len() % 4 != 0 {
                    body.push(0);
                }
                offset = base + 12 + 16 * tables.len() + body.len();
            }
            data.extend(body);

            if let Some(index) = tables.iter().position(|(tag, _)| tag == b"head") {
                let head_offset =
                    u32::from_be_bytes(data[12 + 16 * index + 8..][..4].try_into().unwrap())
                        as usize
                        - base;
                let adjustment = 0xB1B0AFBAu32.wrapping_sub(checksum(&data));
                data[head_offset + 8..head_offset + 12].copy_from_slice(&adjustment.to_be_bytes());
            }
            data
        }
    }

    /// A TrueType collection of `fonts`.
    pub fn collection(fonts: &[TestFont]) -> Vec<u8> {
        let mut data = convert(&[Tag(b"ttcf"), UInt16(1), UInt16(0), UInt32(fonts.len() as u32)]);
        let mut base = 12 + 4 * fonts.len();
        let mut body = Vec::new();
        for font in fonts {
            data.extend(convert(&[UInt32(base as u32)]));
            let built = font.build_at(base);
            base += built.len();
            body.extend(built);
        }
        data.extend(body);
        data
    }

    /// Adjustable parts of [sample_font].
    #[derive(Clone, Debug)]
    pub struct FontOptions {
        /// `None` leaves out the `OS/2` table.
        pub fs_type: Option<u16>,
        /// `None` leaves out the `post` table.
        pub post_version: Option<i32>,
        pub index_to_loc_format: i16,
        pub postscript_name: &'static str,
    }

    impl Default for FontOptions {
        fn default() -> Self {
            FontOptions {
                fs_type: Some(0),
                post_version: Some(0x00030000),
                index_to_loc_format: 0,
                postscript_name: "Test-Regular",
            }
        }
    }

    pub const SAMPLE_UNITS_PER_EM: u16 = 2048;
    pub const SAMPLE_NUM_GLYPHS: u16 = 9;
    /// Advances of the long metrics; glyphs 6 to 8 share the last one.
    pub const SAMPLE_ADVANCES: [u16; 6] = [1024, 2048, 512, 1536, 1536, 1000];

    /// Glyphs of the sample font:
    ///
    /// 0 `.notdef`, 1 'A', 2 '.', 3 'B' = 1 + 2, 4 'C' = 3, 5 'D' = 6, 6 simple,
    /// 7 empty (space), 8 unmapped.
    pub fn sample_glyphs() -> Vec<Vec<u8>> {
        vec![
            simple_glyph(500),
            simple_glyph(600),
            simple_glyph(300),
            composite_glyph(&[1, 2]),
            composite_glyph(&[3]),
            composite_glyph(&[6]),
            simple_glyph(700),
            Vec::new(),
            simple_glyph(800),
        ]
    }

    /// Character mappings of the sample font.
    pub const SAMPLE_CMAP: [(u16, u16); 6] = [
        (0x20, 7),
        (0x2E, 2),
        (0x41, 1),
        (0x42, 3),
        (0x43, 4),
        (0x44, 5),
    ];

    /// A complete TrueType font with composite glyphs, hinting tables and an unknown table.
    pub fn sample_font(options: &FontOptions) -> TestFont {
        let (glyf, loca) = glyf_and_loca(&sample_glyphs(), options.index_to_loc_format);
        let mut font = TestFont::new(TRUETYPE)
            .table(
                b"head",
                head_table(
                    SAMPLE_UNITS_PER_EM,
                    options.index_to_loc_format,
                    [-20, -400, 1900, 1800],
                ),
            )
            .table(b"hhea", hhea_table(1700, -450, SAMPLE_ADVANCES.len() as u16))
            .table(b"maxp", maxp_table(SAMPLE_NUM_GLYPHS))
            .table(
                b"hmtx",
                hmtx_table(&SAMPLE_ADVANCES, usize::from(SAMPLE_NUM_GLYPHS)),
            )
            .table(b"cmap", cmap_table(&SAMPLE_CMAP))
            .table(b"glyf", glyf)
            .table(b"loca", loca)
            .table(
                b"name",
                name_table(&[
                    (1, 0, 0, 6, "MacTest"),
                    (3, 1, 0x409, 1, "Test"),
                    (3, 1, 0x409, 6, options.postscript_name),
                ]),
            )
            .table(b"cvt ", vec![0, 10, 0, 20])
            .table(b"fpgm", vec![0xB0, 0x01, 0x2C])
            .table(b"prep", vec![0xB8, 0x01, 0xFF, 0x85])
            .table(b"zzzz", vec![1, 2, 3, 4, 5]);
        if let Some(fs_type) = options.fs_type {
            font = font.table(b"OS/2", os2_table(3, 400, fs_type));
        }
        if let Some(version) = options.post_version {
            font = font.table(b"post", post_table(version, 0, 0));
        }
        font
    }

    /// A minimal CFF-flavoured OpenType font. The `CFF ` table is opaque filler.
    pub fn sample_cff_font() -> TestFont {
        TestFont::new(OTTO)
            .table(b"head", head_table(1000, 0, [0, -200, 900, 800]))
            .table(b"hhea", hhea_table(800, -200, 2))
            .table(b"maxp", maxp_table_cff(3))
            .table(b"hmtx", hmtx_table(&[500, 600], 3))
            .table(b"cmap", cmap_table(&[(0x41, 1), (0x42, 2)]))
            .table(b"name", name_table(&[(3, 1, 0x409, 6, "TestCFF")]))
            .table(b"OS/2", os2_table(4, 400, 0))
            .table(b"post", post_table(0x00030000, 0, 0))
            .table(b"CFF ", vec![1, 0, 4, 1, 0, 1, 1, 1, 0x41])
    }
}
