//! Synthetic fonts and end-to-end tests.

use std::collections::{BTreeMap, BTreeSet};

use allsorts::{binary::read::ReadScope, font::MatchingPresentation, font_data::FontData};
use test_casing::{test_casing, Product};

use crate::{
    plan, CharacterMap, ClassificationResult, Classifier, ClassifierConfig, Font, FontFile,
    FontFormat, FontMetadata, FontSubset, GlyphSampler, ParseErrorKind, RangeSet, TableTag,
};

pub(crate) fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

/// Builds a `name` table from `(platform, encoding, language, name ID, bytes)` records.
pub(crate) fn name_table(records: &[(u16, u16, u16, u16, &[u8])]) -> Vec<u8> {
    let mut header = vec![];
    let mut storage = vec![];
    header.extend_from_slice(&0_u16.to_be_bytes());
    header.extend_from_slice(&u16::try_from(records.len()).unwrap().to_be_bytes());
    let storage_offset = 6 + 12 * records.len();
    header.extend_from_slice(&u16::try_from(storage_offset).unwrap().to_be_bytes());
    for &(platform_id, encoding_id, language_id, name_id, bytes) in records {
        for value in [platform_id, encoding_id, language_id, name_id] {
            header.extend_from_slice(&value.to_be_bytes());
        }
        header.extend_from_slice(&u16::try_from(bytes.len()).unwrap().to_be_bytes());
        header.extend_from_slice(&u16::try_from(storage.len()).unwrap().to_be_bytes());
        storage.extend_from_slice(bytes);
    }
    header.extend(storage);
    header
}

/// Builds a `GSUB` / `GPOS` table with the specified scripts and empty feature / lookup lists.
pub(crate) fn layout_table(scripts: &[&[u8; 4]]) -> Vec<u8> {
    let mut table = vec![0, 1, 0, 0, 0, 10, 0, 0, 0, 0]; // version 1.0, ScriptList at 10
    table.extend_from_slice(&u16::try_from(scripts.len()).unwrap().to_be_bytes());
    for &script in scripts {
        table.extend_from_slice(script);
        table.extend_from_slice(&[0, 0]);
    }
    table
}

/// Simple glyph with a single rectangular contour (`x0..x1`, `y0..y1`), points in
/// counter-clockwise order.
pub(crate) fn rectangle_glyph(x0: i16, y0: i16, x1: i16, y1: i16) -> Vec<u8> {
    let mut glyph = vec![];
    glyph.extend_from_slice(&1_i16.to_be_bytes()); // numberOfContours
    for coord in [x0, y0, x1, y1] {
        glyph.extend_from_slice(&coord.to_be_bytes());
    }
    glyph.extend_from_slice(&3_u16.to_be_bytes()); // endPtsOfContours
    glyph.extend_from_slice(&0_u16.to_be_bytes()); // instructionLength
    glyph.extend_from_slice(&[0x01; 4]); // on-curve, long coordinates
    let points = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
    let mut prev = 0;
    for (x, _) in points {
        glyph.extend_from_slice(&(x - prev).to_be_bytes());
        prev = x;
    }
    prev = 0;
    for (_, y) in points {
        glyph.extend_from_slice(&(y - prev).to_be_bytes());
        prev = y;
    }
    glyph
}

/// Composite glyph placing `components` at the origin.
pub(crate) fn composite_glyph(bbox: [i16; 4], components: &[u16]) -> Vec<u8> {
    const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
    const ARGS_ARE_XY_VALUES: u16 = 0x0002;
    const MORE_COMPONENTS: u16 = 0x0020;

    let mut glyph = vec![];
    glyph.extend_from_slice(&(-1_i16).to_be_bytes());
    for coord in bbox {
        glyph.extend_from_slice(&coord.to_be_bytes());
    }
    for (i, &glyph_id) in components.iter().enumerate() {
        let mut flags = ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES;
        if i + 1 < components.len() {
            flags |= MORE_COMPONENTS;
        }
        glyph.extend_from_slice(&flags.to_be_bytes());
        glyph.extend_from_slice(&glyph_id.to_be_bytes());
        glyph.extend_from_slice(&[0; 4]); // dx, dy
    }
    glyph
}

/// Builder of small sfnt fonts with TrueType (or stub CFF) outlines.
#[derive(Debug, Clone)]
pub(crate) struct TestFontBuilder {
    names: Option<(String, String)>,
    /// Outlines and advances.
    glyphs: Vec<(Vec<u8>, u16)>,
    char_map: Vec<(u32, u16)>,
    cmap_encodings: Vec<(u16, u16)>,
    extra_tables: BTreeMap<TableTag, Vec<u8>>,
    panose_family_type: u8,
    x_height: i16,
    cff: bool,
}

impl TestFontBuilder {
    pub(crate) const UNITS_PER_EM: u16 = 1_000;
    pub(crate) const LETTER_ADVANCE: u16 = 600;
    pub(crate) const TEXT_FAMILY: &'static str = "FontPrep Text";

    pub(crate) const A_GLYPH: u16 = 2;
    pub(crate) const RING_GLYPH: u16 = 4;
    pub(crate) const ARING_GLYPH: u16 = 5;
    /// Glyph reachable only through layout features.
    pub(crate) const LIGATURE_GLYPH: u16 = 6;

    pub(crate) fn new(family: &str) -> Self {
        let postscript_name = format!("{}-Regular", family.replace(' ', ""));
        Self {
            names: Some((family.to_owned(), postscript_name)),
            glyphs: vec![(rectangle_glyph(50, 0, 450, 700), 500)],
            char_map: vec![],
            cmap_encodings: vec![(0, 4), (3, 10)],
            extra_tables: BTreeMap::new(),
            panose_family_type: 2,
            x_height: 500,
            cff: false,
        }
    }

    /// Latin text font with a composite glyph, a layout-only glyph and `GSUB`.
    pub(crate) fn text() -> Self {
        let mut builder = Self::new(Self::TEXT_FAMILY);
        let space = builder.push_glyph(vec![], 250);
        let a = builder.push_glyph(rectangle_glyph(50, 0, 550, 700), Self::LETTER_ADVANCE);
        let b = builder.push_glyph(rectangle_glyph(60, 0, 540, 700), Self::LETTER_ADVANCE);
        let ring = builder.push_glyph(rectangle_glyph(250, 750, 350, 850), Self::LETTER_ADVANCE);
        let aring = builder.push_glyph(composite_glyph([50, 0, 550, 850], &[a, ring]), Self::LETTER_ADVANCE);
        let ligature = builder.push_glyph(rectangle_glyph(0, 0, 1_100, 700), 1_200);
        assert_eq!(
            [a, ring, aring, ligature],
            [Self::A_GLYPH, Self::RING_GLYPH, Self::ARING_GLYPH, Self::LIGATURE_GLYPH]
        );

        builder.map(0x20, space);
        builder.map(0x41, a);
        builder.map(0x42, b);
        builder.map(0x2DA, ring);
        builder.map(0xC5, aring);
        builder
            .with_table(TableTag::GSUB, layout_table(&[b"DFLT", b"latn"]))
            .with_table(TableTag::DSIG, vec![0, 0, 0, 1, 0, 0, 0, 0])
    }

    /// Font drawing digits and capitals as solid vertical bars.
    pub(crate) fn barcode() -> Self {
        let mut builder = Self::new("Stripe Mono");
        for cp in (0x30..=0x39).chain(0x41..=0x5A) {
            let glyph = builder.push_glyph(rectangle_glyph(100, 0, 200, 800), 300);
            builder.map(cp, glyph);
        }
        builder
    }

    /// Font with a Windows Symbol `cmap` encoding.
    pub(crate) fn symbol() -> Self {
        let mut builder = Self::new("Pictos");
        builder.cmap_encodings = vec![(3, 0)];
        for cp in 0xF041..=0xF05A {
            let glyph = builder.push_glyph(rectangle_glyph(100, 100, 900, 900), 1_000);
            builder.map(cp, glyph);
        }
        builder
    }

    /// Color font with `COLR` / `CPAL` tables.
    pub(crate) fn emoji() -> Self {
        let mut builder = Self::new("Smileys");
        let glyph = builder.push_glyph(rectangle_glyph(0, 0, 1_000, 1_000), 1_000);
        for cp in 0x1F600..=0x1F64F {
            builder.map(cp, glyph);
        }
        builder
            .with_table(TableTag::COLR, vec![0; 14])
            .with_table(TableTag::CPAL, vec![0; 12])
    }

    pub(crate) fn push_glyph(&mut self, outline: Vec<u8>, advance: u16) -> u16 {
        self.glyphs.push((outline, advance));
        u16::try_from(self.glyphs.len() - 1).unwrap()
    }

    pub(crate) fn map(&mut self, cp: u32, glyph_id: u16) {
        self.char_map.push((cp, glyph_id));
    }

    pub(crate) fn with_table(mut self, tag: TableTag, data: Vec<u8>) -> Self {
        self.extra_tables.insert(tag, data);
        self
    }

    pub(crate) fn without_names(mut self) -> Self {
        self.names = None;
        self
    }

    /// Replaces TrueType outlines with a stub `CFF ` table.
    pub(crate) fn with_cff(mut self) -> Self {
        self.cff = true;
        self
    }

    fn glyph_count(&self) -> u16 {
        u16::try_from(self.glyphs.len()).unwrap()
    }

    fn head_table(&self) -> Vec<u8> {
        let mut head = vec![];
        head.extend_from_slice(&0x_0001_0000_u32.to_be_bytes()); // version
        head.extend_from_slice(&0x_0001_0000_u32.to_be_bytes()); // fontRevision
        head.extend_from_slice(&0_u32.to_be_bytes()); // checksumAdjustment
        head.extend_from_slice(&0x_5F0F_3CF5_u32.to_be_bytes()); // magicNumber
        head.extend_from_slice(&0_u16.to_be_bytes()); // flags
        head.extend_from_slice(&Self::UNITS_PER_EM.to_be_bytes());
        head.extend_from_slice(&[0; 16]); // created, modified
        for coord in [0_i16, -200, 1_200, 900] {
            head.extend_from_slice(&coord.to_be_bytes());
        }
        head.extend_from_slice(&0_u16.to_be_bytes()); // macStyle
        head.extend_from_slice(&8_u16.to_be_bytes()); // lowestRecPPEM
        head.extend_from_slice(&2_i16.to_be_bytes()); // fontDirectionHint
        head.extend_from_slice(&1_i16.to_be_bytes()); // indexToLocFormat: long
        head.extend_from_slice(&0_i16.to_be_bytes()); // glyphDataFormat
        assert_eq!(head.len(), 54);
        head
    }

    fn hhea_table(&self) -> Vec<u8> {
        let max_advance = self.glyphs.iter().map(|&(_, advance)| advance).max().unwrap_or(0);
        let mut hhea = vec![];
        hhea.extend_from_slice(&0x_0001_0000_u32.to_be_bytes());
        for value in [800_i16, -200, 0] {
            hhea.extend_from_slice(&value.to_be_bytes()); // ascender, descender, lineGap
        }
        hhea.extend_from_slice(&max_advance.to_be_bytes());
        hhea.extend_from_slice(&[0; 6]); // minLeftSideBearing, minRightSideBearing, xMaxExtent
        hhea.extend_from_slice(&1_i16.to_be_bytes()); // caretSlopeRise
        hhea.extend_from_slice(&[0; 14]); // caretSlopeRun, caretOffset, reserved, metricDataFormat
        hhea.extend_from_slice(&self.glyph_count().to_be_bytes());
        assert_eq!(hhea.len(), 36);
        hhea
    }

    fn maxp_table(&self) -> Vec<u8> {
        let mut maxp = vec![];
        if self.cff {
            maxp.extend_from_slice(&0x_0000_5000_u32.to_be_bytes());
            maxp.extend_from_slice(&self.glyph_count().to_be_bytes());
        } else {
            maxp.extend_from_slice(&0x_0001_0000_u32.to_be_bytes());
            maxp.extend_from_slice(&self.glyph_count().to_be_bytes());
            maxp.extend_from_slice(&[0; 26]);
            maxp[14..16].copy_from_slice(&2_u16.to_be_bytes()); // maxZones
        }
        maxp
    }

    fn os2_table(&self) -> Vec<u8> {
        let mut os2 = vec![0; 96];
        os2[0..2].copy_from_slice(&4_u16.to_be_bytes()); // version
        os2[4..6].copy_from_slice(&400_u16.to_be_bytes()); // usWeightClass
        os2[6..8].copy_from_slice(&5_u16.to_be_bytes()); // usWidthClass
        os2[32] = self.panose_family_type;
        os2[86..88].copy_from_slice(&self.x_height.to_be_bytes());
        os2[88..90].copy_from_slice(&700_i16.to_be_bytes()); // sCapHeight
        os2
    }

    fn post_table() -> Vec<u8> {
        let mut post = vec![0; 32];
        post[0..4].copy_from_slice(&0x_0003_0000_u32.to_be_bytes());
        post
    }

    fn name_table(&self) -> Vec<u8> {
        let Some((family, postscript_name)) = &self.names else {
            return name_table(&[]);
        };
        let (family, postscript_name) = (utf16(family), utf16(postscript_name));
        name_table(&[
            (3, 1, 0x409, 1, &family),
            (3, 1, 0x409, 6, &postscript_name),
        ])
    }

    /// Writes a format 12 subtable shared by all encoding records.
    fn cmap_table(&self) -> Vec<u8> {
        let mut mappings = self.char_map.clone();
        mappings.sort_unstable();
        let record_count = u16::try_from(self.cmap_encodings.len()).unwrap();
        let subtable_offset = 4 + 8 * u32::from(record_count);

        let mut cmap = vec![];
        cmap.extend_from_slice(&0_u16.to_be_bytes());
        cmap.extend_from_slice(&record_count.to_be_bytes());
        for &(platform_id, encoding_id) in &self.cmap_encodings {
            cmap.extend_from_slice(&platform_id.to_be_bytes());
            cmap.extend_from_slice(&encoding_id.to_be_bytes());
            cmap.extend_from_slice(&subtable_offset.to_be_bytes());
        }
        cmap.extend_from_slice(&12_u16.to_be_bytes());
        cmap.extend_from_slice(&0_u16.to_be_bytes());
        let len = 16 + 12 * mappings.len();
        cmap.extend_from_slice(&u32::try_from(len).unwrap().to_be_bytes());
        cmap.extend_from_slice(&0_u32.to_be_bytes()); // language
        cmap.extend_from_slice(&u32::try_from(mappings.len()).unwrap().to_be_bytes());
        for (cp, glyph_id) in mappings {
            cmap.extend_from_slice(&cp.to_be_bytes());
            cmap.extend_from_slice(&cp.to_be_bytes());
            cmap.extend_from_slice(&u32::from(glyph_id).to_be_bytes());
        }
        cmap
    }

    fn outline_tables(&self) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = vec![];
        let mut loca = vec![];
        loca.extend_from_slice(&0_u32.to_be_bytes());
        for (outline, _) in &self.glyphs {
            glyf.extend_from_slice(outline);
            while glyf.len() % 4 != 0 {
                glyf.push(0);
            }
            loca.extend_from_slice(&u32::try_from(glyf.len()).unwrap().to_be_bytes());
        }
        (glyf, loca)
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut tables = self.extra_tables.clone();
        tables.insert(TableTag::CMAP, self.cmap_table());
        tables.insert(TableTag::HEAD, self.head_table());
        tables.insert(TableTag::HHEA, self.hhea_table());
        let hmtx = self.glyphs.iter().flat_map(|&(_, advance)| {
            let [hi, lo] = advance.to_be_bytes();
            [hi, lo, 0, 0]
        });
        tables.insert(TableTag::HMTX, hmtx.collect());
        tables.insert(TableTag::MAXP, self.maxp_table());
        tables.insert(TableTag::NAME, self.name_table());
        tables.insert(TableTag::OS2, self.os2_table());
        tables.insert(TableTag::POST, Self::post_table());

        let flavor = if self.cff {
            tables.insert(TableTag::CFF, vec![1, 0, 4, 4]);
            u32::from_be_bytes(*b"OTTO")
        } else {
            let (glyf, loca) = self.outline_tables();
            tables.insert(TableTag::GLYF, glyf);
            tables.insert(TableTag::LOCA, loca);
            Font::SFNT_VERSION
        };
        assemble_sfnt(flavor, &tables)
    }
}

fn assemble_sfnt(flavor: u32, tables: &BTreeMap<TableTag, Vec<u8>>) -> Vec<u8> {
    let table_count = u16::try_from(tables.len()).unwrap();
    let entry_selector = table_count.ilog2();
    let search_range = 16_u16 << entry_selector;

    let mut font = vec![];
    font.extend_from_slice(&flavor.to_be_bytes());
    font.extend_from_slice(&table_count.to_be_bytes());
    font.extend_from_slice(&search_range.to_be_bytes());
    font.extend_from_slice(&u16::try_from(entry_selector).unwrap().to_be_bytes());
    font.extend_from_slice(&(16 * table_count - search_range).to_be_bytes());

    let mut data = vec![];
    let data_offset = 12 + 16 * tables.len();
    let mut head_offset = None;
    for (tag, table) in tables {
        let offset = data_offset + data.len();
        if *tag == TableTag::HEAD {
            head_offset = Some(offset);
        }
        font.extend_from_slice(tag.as_bytes());
        font.extend_from_slice(&Font::checksum(table).to_be_bytes());
        font.extend_from_slice(&u32::try_from(offset).unwrap().to_be_bytes());
        font.extend_from_slice(&u32::try_from(table.len()).unwrap().to_be_bytes());
        data.extend_from_slice(table);
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }
    font.extend(data);

    let adjustment_offset = head_offset.unwrap() + Font::HEAD_CHECKSUM_OFFSET;
    let adjustment = Font::SFNT_CHECKSUM.wrapping_sub(Font::checksum(&font));
    font[adjustment_offset..adjustment_offset + 4].copy_from_slice(&adjustment.to_be_bytes());
    font
}

/// Ranges used for subsetting tests.
pub(crate) const TEST_RANGES: [&str; 3] = ["U+0020-007E", "U+0041", "U+00C5, U+1F600"];

#[derive(Debug, Clone, Copy)]
enum TestFontKind {
    Text,
    Barcode,
    Symbol,
    Emoji,
}

impl TestFontKind {
    fn builder(self) -> TestFontBuilder {
        match self {
            Self::Text => TestFontBuilder::text(),
            Self::Barcode => TestFontBuilder::barcode(),
            Self::Symbol => TestFontBuilder::symbol(),
            Self::Emoji => TestFontBuilder::emoji(),
        }
    }
}

fn allsorts_glyph_id(raw: &[u8], cp: u32) -> u16 {
    let font_file = ReadScope::new(raw).read::<FontData>().unwrap();
    let font_provider = font_file.table_provider(0).unwrap();
    let mut font = allsorts::Font::new(font_provider).unwrap();
    let ch = char::from_u32(cp).unwrap();
    let (glyph_id, _) = font.lookup_glyph_index(ch, MatchingPresentation::NotRequired, None);
    glyph_id
}

#[test]
fn reading_built_font() {
    let bytes = TestFontBuilder::text().build();
    let font = Font::new(&bytes).unwrap();

    assert_eq!(font.units_per_em(), TestFontBuilder::UNITS_PER_EM);
    assert_eq!(font.glyph_count(), 7);
    assert_eq!(font.char_map().codepoints(), [0x20, 0x41, 0x42, 0xC5, 0x2DA]);
    for cp in [0x20, 0x41, 0x42, 0xC5, 0x2DA, 0x5A] {
        let expected = allsorts_glyph_id(&bytes, cp);
        assert_eq!(font.char_map().glyph_id(cp).unwrap_or(0), expected, "{cp:#x}");
    }
    assert_eq!(font.x_height(), Some(500));
    assert_eq!(font.panose_family_type(), Some(2));
    assert_eq!(font.script_tags().unwrap(), ["DFLT", "latn"]);
    assert_eq!(Font::checksum(&bytes), Font::SFNT_CHECKSUM);
}

#[test]
fn sampling_built_glyphs() {
    let bytes = TestFontBuilder::text().build();
    let font = Font::new(&bytes).unwrap();

    let a = font.glyph_geometry(0x41).unwrap().unwrap();
    assert_eq!((a.bbox.width(), a.bbox.height()), (500, 700));
    assert!((a.ink_area - 350_000.0).abs() < 1e-6, "{a:?}");
    assert_eq!(a.advance, TestFontBuilder::LETTER_ADVANCE);

    // Composite: A + ring
    let aring = font.glyph_geometry(0xC5).unwrap().unwrap();
    assert!((aring.ink_area - 360_000.0).abs() < 1e-6, "{aring:?}");
    assert_eq!(aring.bbox.height(), 850);

    assert_eq!(font.glyph_geometry(0x20).unwrap(), None);
    assert_eq!(font.glyph_geometry(0x5A).unwrap(), None);
}

#[test_casing(6, Product(([TestFontKind::Text, TestFontKind::Barcode], TEST_RANGES)))]
fn subsetting_font(kind: TestFontKind, range: &str) {
    let bytes = kind.builder().build();
    let font = Font::new(&bytes).unwrap();
    let range = RangeSet::parse(range).unwrap();
    let plan = plan(font.char_map(), &range, true);
    let subset = FontSubset::new(&font, &plan).unwrap();

    for output in [subset.to_opentype(), subset.to_woff2()] {
        let file = FontFile::new(output.clone()).unwrap();
        let subset_font = file.font().unwrap();
        let codepoints: BTreeSet<_> = subset_font.char_map().codepoints().iter().copied().collect();
        assert_eq!(codepoints, plan.keep_codepoints);
        assert_eq!(subset_font.glyph_count(), font.glyph_count());

        for &cp in font.char_map().codepoints() {
            let glyph_id = allsorts_glyph_id(&output, cp);
            if plan.keep_codepoints.contains(&cp) {
                assert_eq!(Some(glyph_id), font.char_map().glyph_id(cp), "{cp:#x}");
            } else {
                assert_eq!(glyph_id, 0, "{cp:#x}");
            }
        }
    }
}

#[test]
fn names_are_emptied_unless_preserved() {
    let bytes = TestFontBuilder::text().build();
    let font = Font::new(&bytes).unwrap();
    let range = RangeSet::parse("U+0041").unwrap();

    let plan_without_names = plan(font.char_map(), &range, false);
    let output = FontSubset::new(&font, &plan_without_names)
        .unwrap()
        .to_opentype();
    let names = Font::new(&output).unwrap().names().unwrap();
    assert_eq!(names.iter().count(), 0);

    let plan_with_names = plan(font.char_map(), &range, true);
    let output = FontSubset::new(&font, &plan_with_names)
        .unwrap()
        .to_woff2();
    let file = FontFile::new(output).unwrap();
    let names = file.font().unwrap().names().unwrap();
    assert_eq!(names.family.as_deref(), Some(TestFontBuilder::TEXT_FAMILY));
    assert_eq!(names, font.names().unwrap());
}

#[test]
fn layout_tables_survive_subsetting() {
    let bytes = TestFontBuilder::text().build();
    let font = Font::new(&bytes).unwrap();
    let plan = plan(font.char_map(), &RangeSet::parse("U+0041").unwrap(), true);
    let output = FontSubset::new(&font, &plan).unwrap().to_opentype();
    let subset_font = Font::new(&output).unwrap();

    assert_eq!(
        subset_font.tables.get(TableTag::GSUB),
        font.tables.get(TableTag::GSUB)
    );
    assert_eq!(subset_font.script_tags().unwrap(), ["DFLT", "latn"]);
    assert!(!subset_font.has_table(TableTag::DSIG));

    // The layout-only glyph keeps its outline; unrelated glyphs are emptied.
    let glyphs = subset_font.glyph_table().unwrap();
    assert!(!glyphs.raw_glyph(TestFontBuilder::LIGATURE_GLYPH).unwrap().is_empty());
    assert!(glyphs.raw_glyph(TestFontBuilder::ARING_GLYPH).unwrap().is_empty());
    assert!(!glyphs.raw_glyph(0).unwrap().is_empty());
}

#[test]
fn woff2_subset_keeps_glyph_geometry() {
    let bytes = TestFontBuilder::text().build();
    let font = Font::new(&bytes).unwrap();
    let plan = plan(font.char_map(), &RangeSet::parse("U+00C5").unwrap(), true);
    let woff2 = FontSubset::new(&font, &plan).unwrap().to_woff2();

    let file = FontFile::new(woff2).unwrap();
    assert_eq!(file.format(), FontFormat::Woff2);
    let subset_font = file.font().unwrap();
    assert_eq!(
        subset_font.glyph_geometry(0xC5).unwrap(),
        font.glyph_geometry(0xC5).unwrap()
    );
    assert_eq!(subset_font.glyph_geometry(0x41).unwrap(), None);
}

#[test]
fn cff_outlines_are_passed_through() {
    let bytes = TestFontBuilder::text().with_cff().build();
    let font = Font::new(&bytes).unwrap();
    assert_eq!(font.glyph_geometry(0x41).unwrap(), None);

    let plan = plan(font.char_map(), &RangeSet::parse("U+0041-0042").unwrap(), true);
    let subset = FontSubset::new(&font, &plan).unwrap();
    let output = subset.to_opentype();
    assert_eq!(output[..4], *b"OTTO");

    let subset_font = Font::new(&output).unwrap();
    assert_eq!(subset_font.char_map().codepoints(), [0x41, 0x42]);
    assert_eq!(
        subset_font.tables.get(TableTag::CFF),
        Some(Some([1_u8, 0, 4, 4].as_slice()))
    );
    assert!(!subset_font.has_table(TableTag::GLYF));
}

#[test]
fn malformed_woff2_is_rejected() {
    let bytes = TestFontBuilder::text().build();
    let font = Font::new(&bytes).unwrap();
    let plan = plan(font.char_map(), &RangeSet::parse("U+0041").unwrap(), true);
    let woff2 = FontSubset::new(&font, &plan).unwrap().to_woff2();

    let mut collection = woff2.clone();
    collection[4..8].copy_from_slice(b"ttcf");
    let err = FontFile::new(collection).unwrap_err();
    assert!(
        matches!(err.kind(), ParseErrorKind::UnexpectedFontVersion(_)),
        "{err}"
    );

    let mut truncated = woff2;
    truncated.truncate(60);
    FontFile::new(truncated).unwrap_err();
}

#[test_casing(4, [
    (TestFontKind::Text, ClassificationResult::TEXTUAL),
    (TestFontKind::Barcode, ClassificationResult::new(false, false, true)),
    (TestFontKind::Symbol, ClassificationResult::new(false, true, false)),
    (TestFontKind::Emoji, ClassificationResult::new(true, false, false)),
])]
fn classifying_built_fonts(kind: TestFontKind, expected: ClassificationResult) {
    let bytes = kind.builder().build();
    let font = Font::new(&bytes).unwrap();
    let meta = FontMetadata::from_font(&font).unwrap();
    let classifier = Classifier::new(ClassifierConfig::default()).unwrap();
    let classification = classifier.classify(&meta).unwrap();
    assert_eq!(classification.result, expected, "{classification:?}");
}

#[test]
fn readme_is_in_sync() {
    version_sync::assert_markdown_deps_updated!("README.md");
}

#[test]
fn html_root_url_is_in_sync() {
    version_sync::assert_html_root_url_updated!("src/lib.rs");
}
