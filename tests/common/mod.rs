//! Shared fixtures: small PDFs authored with lopdf and a synthetic TrueType
//! font with simple and nested composite glyphs.

#![allow(dead_code)]

use std::collections::BTreeMap;

use lopdf::{dictionary, Document, Object, Stream};

/// Glyphs in the test font.
pub const GLYPH_COUNT: u16 = 10;
pub const UNITS_PER_EM: u16 = 2048;
pub const ASCENT: i16 = 1854;
pub const DESCENT: i16 = -434;

/// Character map of the test font.
///
/// `o` (4) is composite over 5 and 6, and 5 is itself composite over 7.
/// `z` (9) is composite over 8 (`x`).
pub const CMAP: [(char, u16); 6] = [('H', 1), ('e', 2), ('l', 3), ('o', 4), ('x', 8), ('z', 9)];

/// Composite structure: glyph -> direct components.
pub fn composites() -> BTreeMap<u16, Vec<u16>> {
    BTreeMap::from([(4, vec![5, 6]), (5, vec![7]), (9, vec![8])])
}

pub fn advance(gid: u16) -> u16 {
    match gid {
        0 => 1024,
        1 => 1479,
        2 => 1139,
        3 => 455,
        4 => 1139,
        _ => 1000,
    }
}

fn simple_glyph(gid: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&1i16.to_be_bytes()); // numberOfContours
    out.extend_from_slice(&[0, 0, 0, 0]); // xMin, yMin
    out.extend_from_slice(&(advance(gid) as i16).to_be_bytes()); // xMax
    out.extend_from_slice(&1400i16.to_be_bytes()); // yMax
    out.extend_from_slice(&2u16.to_be_bytes()); // endPtsOfContours[0]
    out.extend_from_slice(&0u16.to_be_bytes()); // instructionLength
    out.extend_from_slice(&[0x01, 0x01, 0x01]); // flags: on-curve, long coords
    out.extend_from_slice(&[0, 0, 0, 0, 0, 0]); // coordinates
    out.push(gid as u8); // makes every outline distinct; keeps the length even
    out
}

fn composite_glyph(components: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(-1i16).to_be_bytes());
    out.extend_from_slice(&[0, 0, 0, 0, 0x04, 0x00, 0x05, 0x78]);
    for (i, gid) in components.iter().enumerate() {
        let more = if i + 1 < components.len() { 0x0020 } else { 0 };
        // ARGS_ARE_XY_VALUES, byte arguments
        out.extend_from_slice(&(0x0002u16 | more).to_be_bytes());
        out.extend_from_slice(&gid.to_be_bytes());
        out.extend_from_slice(&[0, 0]);
    }
    out
}

/// Outline bytes of every glyph in order.
pub fn glyph_outlines() -> Vec<Vec<u8>> {
    let composites = composites();
    (0..GLYPH_COUNT)
        .map(|gid| match composites.get(&gid) {
            Some(components) => composite_glyph(components),
            None => simple_glyph(gid),
        })
        .collect()
}

/// Build the test font. `long_loca` selects 32-bit `loca` offsets,
/// `hinting` adds `cvt `, `fpgm` (odd length) and `prep`.
pub fn build_font(long_loca: bool, hinting: bool) -> Vec<u8> {
    let mut tables: BTreeMap<[u8; 4], Vec<u8>> = BTreeMap::new();

    let mut glyf = Vec::new();
    let mut offsets = Vec::new();
    for outline in glyph_outlines() {
        offsets.push(glyf.len() as u32);
        glyf.extend_from_slice(&outline);
    }
    offsets.push(glyf.len() as u32);
    let mut loca = Vec::new();
    for offset in offsets {
        if long_loca {
            loca.extend_from_slice(&offset.to_be_bytes());
        } else {
            loca.extend_from_slice(&((offset / 2) as u16).to_be_bytes());
        }
    }
    tables.insert(*b"glyf", glyf);
    tables.insert(*b"loca", loca);

    let mut head = Vec::new();
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
    head.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment
    head.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    head.extend_from_slice(&0u16.to_be_bytes()); // flags
    head.extend_from_slice(&UNITS_PER_EM.to_be_bytes());
    head.extend_from_slice(&[0; 16]); // created, modified
    for v in [-100i16, DESCENT, 2000, ASCENT] {
        head.extend_from_slice(&v.to_be_bytes());
    }
    head.extend_from_slice(&0u16.to_be_bytes()); // macStyle
    head.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
    head.extend_from_slice(&2i16.to_be_bytes()); // fontDirectionHint
    head.extend_from_slice(&(long_loca as i16).to_be_bytes()); // indexToLocFormat
    head.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat
    assert_eq!(head.len(), 54);
    tables.insert(*b"head", head);

    let mut hhea = Vec::new();
    hhea.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    hhea.extend_from_slice(&ASCENT.to_be_bytes());
    hhea.extend_from_slice(&DESCENT.to_be_bytes());
    hhea.extend_from_slice(&67i16.to_be_bytes()); // lineGap
    hhea.extend_from_slice(&1479u16.to_be_bytes()); // advanceWidthMax
    hhea.extend_from_slice(&[0; 22]); // side bearings, extent, caret, reserved, metricDataFormat
    hhea.extend_from_slice(&GLYPH_COUNT.to_be_bytes()); // numberOfHMetrics
    assert_eq!(hhea.len(), 36);
    tables.insert(*b"hhea", hhea);

    let mut maxp = Vec::new();
    maxp.extend_from_slice(&0x0000_5000u32.to_be_bytes());
    maxp.extend_from_slice(&GLYPH_COUNT.to_be_bytes());
    tables.insert(*b"maxp", maxp);

    let mut hmtx = Vec::new();
    for gid in 0..GLYPH_COUNT {
        hmtx.extend_from_slice(&advance(gid).to_be_bytes());
        hmtx.extend_from_slice(&0i16.to_be_bytes());
    }
    tables.insert(*b"hmtx", hmtx);

    let mut cmap = Vec::new();
    cmap.extend_from_slice(&0u16.to_be_bytes()); // version
    cmap.extend_from_slice(&1u16.to_be_bytes()); // numTables
    cmap.extend_from_slice(&3u16.to_be_bytes()); // Windows
    cmap.extend_from_slice(&10u16.to_be_bytes()); // Unicode full repertoire
    cmap.extend_from_slice(&12u32.to_be_bytes()); // subtable offset
    cmap.extend_from_slice(&12u16.to_be_bytes()); // format
    cmap.extend_from_slice(&0u16.to_be_bytes());
    cmap.extend_from_slice(&(16 + 12 * CMAP.len() as u32).to_be_bytes());
    cmap.extend_from_slice(&0u32.to_be_bytes()); // language
    cmap.extend_from_slice(&(CMAP.len() as u32).to_be_bytes());
    for (ch, gid) in CMAP {
        cmap.extend_from_slice(&(ch as u32).to_be_bytes());
        cmap.extend_from_slice(&(ch as u32).to_be_bytes());
        cmap.extend_from_slice(&(gid as u32).to_be_bytes());
    }
    tables.insert(*b"cmap", cmap);

    // kept out of subsets
    tables.insert(*b"name", vec![0, 0, 0, 0, 0, 6]);

    if hinting {
        tables.insert(*b"cvt ", vec![0, 10, 0, 20]);
        tables.insert(*b"fpgm", vec![0xB0, 0x01, 0x2C, 0x40, 0x01]);
        tables.insert(*b"prep", vec![0xB8, 0x01, 0xFF]);
    }

    write_sfnt(&tables)
}

fn write_sfnt(tables: &BTreeMap<[u8; 4], Vec<u8>>) -> Vec<u8> {
    let count = tables.len() as u16;
    let entry_selector = count.ilog2() as u16;
    let search_range = 16 * (1u16 << entry_selector);

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&(count * 16 - search_range).to_be_bytes());

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in tables {
        out.extend_from_slice(tag);
        out.extend_from_slice(&table_checksum(data).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    out.extend_from_slice(&body);
    out
}

/// 32-bit word sum over zero-padded bytes.
pub fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Table directory of an sfnt file: tag -> (checksum, offset, length).
pub fn read_directory(sfnt: &[u8]) -> BTreeMap<[u8; 4], (u32, usize, usize)> {
    let be32 = |at: usize| u32::from_be_bytes([sfnt[at], sfnt[at + 1], sfnt[at + 2], sfnt[at + 3]]);
    let count = u16::from_be_bytes([sfnt[4], sfnt[5]]) as usize;
    (0..count)
        .map(|i| {
            let entry = 12 + 16 * i;
            let tag = [sfnt[entry], sfnt[entry + 1], sfnt[entry + 2], sfnt[entry + 3]];
            (tag, (be32(entry + 4), be32(entry + 8) as usize, be32(entry + 12) as usize))
        })
        .collect()
}

/// A one-page document: Catalog -> Pages -> Page -> Contents stream, with
/// an Info dictionary.
pub fn one_page_pdf() -> Vec<u8> {
    pdf_with_pages(1)
}

/// A document with `count` pages, each with its own content stream. The
/// page resources are inherited from the Pages node.
pub fn pdf_with_pages(count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let helvetica = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for i in 0..count {
        let content = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET\n", i + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(count as i64),
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ],
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => helvetica },
        },
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Weekly (draft) handout"),
        "Author" => Object::string_literal("Test Author"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to write fixture PDF");
    bytes
}

/// A one-page document whose first object is never referenced, so the
/// reachable object numbers start at 2.
pub fn pdf_with_orphan() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    doc.add_object(dictionary! { "Orphan" => Object::Boolean(true) });
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET\n".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to write fixture PDF");
    bytes
}

/// A one-page document whose catalog starts a `/Next` chain of `length`
/// objects.
pub fn pdf_with_chain(length: u32) -> Vec<u8> {
    let mut doc = Document::load_mem(&one_page_pdf()).expect("Failed to reload fixture PDF");
    let first = (doc.max_id + 1, 0);
    for i in 0..length {
        let id = (doc.max_id + 1 + i, 0);
        let mut link = dictionary! { "Index" => Object::Integer(i as i64) };
        if i + 1 < length {
            link.set("Next", Object::Reference((id.0 + 1, 0)));
        }
        doc.objects.insert(id, Object::Dictionary(link));
    }
    doc.max_id += length;

    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .expect("fixture has a catalog");
    doc.get_dictionary_mut(catalog_id)
        .expect("catalog is a dictionary")
        .set("Chain", Object::Reference(first));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to write fixture PDF");
    bytes
}
