//! TrueType table access
//!
//! The sfnt table directory and the `loca` offsets are read directly since
//! subsetting needs exact byte ranges. Character mapping and metrics come
//! from `ttf-parser`.

use std::collections::BTreeMap;
use std::ops::Range;

use ttf_parser::{Face, GlyphId};

use crate::error::{Error, Result};

/// Location of one table inside the font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub offset: usize,
    pub length: usize,
}

/// Tables a font must carry to be subset.
pub const REQUIRED_TABLES: [&[u8; 4]; 6] = [b"glyf", b"head", b"hhea", b"hmtx", b"loca", b"maxp"];

/// Font-wide values needed for a FontDescriptor, in font units.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    pub x_height: i16,
    /// `[x_min, y_min, x_max, y_max]`
    pub bbox: [i16; 4],
    /// Degrees counter-clockwise from vertical.
    pub italic_angle: f32,
    pub is_monospaced: bool,
    pub is_italic: bool,
}

impl FontMetrics {
    /// FontDescriptor `/Flags`: nonsymbolic, plus fixed-pitch and italic bits.
    pub fn flags(&self) -> u32 {
        let mut flags = 32;
        if self.is_monospaced {
            flags |= 1;
        }
        if self.is_italic {
            flags |= 64;
        }
        flags
    }
}

/// A parsed TrueType font borrowing its source bytes.
pub struct TrueTypeFont<'a> {
    data: &'a [u8],
    face: Face<'a>,
    tables: BTreeMap<[u8; 4], TableRecord>,
    long_loca: bool,
    /// `num_glyphs + 1` offsets into `glyf`.
    loca: Vec<u32>,
}

impl<'a> TrueTypeFont<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let face = Face::parse(data, 0).map_err(|e| Error::FontParse(e.to_string()))?;
        let tables = read_table_directory(data)?;
        for tag in REQUIRED_TABLES {
            if !tables.contains_key(tag) {
                return Err(Error::FontParse(format!(
                    "missing required table '{}'",
                    String::from_utf8_lossy(tag)
                )));
            }
        }

        let mut font = Self {
            data,
            face,
            tables,
            long_loca: false,
            loca: Vec::new(),
        };
        let head = font.required(b"head")?;
        font.long_loca = read_i16(head, 50)? != 0;
        let num_glyphs = read_u16(font.required(b"maxp")?, 4)?;
        font.loca = read_loca(font.required(b"loca")?, num_glyphs, font.long_loca)?;
        Ok(font)
    }

    /// Whole source font.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn record(&self, tag: &[u8; 4]) -> Option<TableRecord> {
        self.tables.get(tag).copied()
    }

    /// Raw bytes of table `tag`.
    pub fn table(&self, tag: &[u8; 4]) -> Option<&'a [u8]> {
        let record = self.record(tag)?;
        self.data.get(record.offset..record.offset + record.length)
    }

    fn required(&self, tag: &[u8; 4]) -> Result<&'a [u8]> {
        self.table(tag).ok_or_else(|| {
            Error::FontParse(format!(
                "table '{}' lies outside the font data",
                String::from_utf8_lossy(tag)
            ))
        })
    }

    /// Whether `loca` holds 32-bit offsets (`indexToLocFormat` = 1).
    pub fn is_long_loca(&self) -> bool {
        self.long_loca
    }

    pub fn num_glyphs(&self) -> u16 {
        (self.loca.len() - 1) as u16
    }

    /// Byte range of glyph `gid` inside `glyf`.
    pub fn glyph_range(&self, gid: u16) -> Option<Range<usize>> {
        let start = *self.loca.get(gid as usize)? as usize;
        let end = *self.loca.get(gid as usize + 1)? as usize;
        (start <= end).then_some(start..end)
    }

    /// Outline bytes of glyph `gid`; empty for blank or unknown glyphs.
    pub fn glyph_data(&self, gid: u16) -> &'a [u8] {
        let glyf = self.table(b"glyf").unwrap_or(&[]);
        self.glyph_range(gid)
            .and_then(|range| glyf.get(range))
            .unwrap_or(&[])
    }

    pub fn glyph_index(&self, ch: char) -> Option<u16> {
        self.face.glyph_index(ch).map(|gid| gid.0)
    }

    /// Horizontal advance of `gid` in font units.
    pub fn advance(&self, gid: u16) -> u16 {
        self.face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0)
    }

    pub fn units_per_em(&self) -> u16 {
        self.face.units_per_em()
    }

    pub fn metrics(&self) -> FontMetrics {
        let bbox = self.face.global_bounding_box();
        let ascent = self.face.ascender();
        FontMetrics {
            units_per_em: self.face.units_per_em(),
            ascent,
            descent: self.face.descender(),
            cap_height: self.face.capital_height().unwrap_or(ascent),
            x_height: self.face.x_height().unwrap_or(0),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            italic_angle: self.italic_angle(),
            is_monospaced: self.face.is_monospaced(),
            is_italic: self.face.is_italic(),
        }
    }

    /// `post.italicAngle`, a 16.16 fixed-point value at offset 4.
    fn italic_angle(&self) -> f32 {
        self.table(b"post")
            .and_then(|post| read_u32(post, 4).ok())
            .map(|fixed| fixed as i32 as f32 / 65536.0)
            .unwrap_or(0.0)
    }
}

fn read_table_directory(data: &[u8]) -> Result<BTreeMap<[u8; 4], TableRecord>> {
    let num_tables = read_u16(data, 4)? as usize;
    let mut tables = BTreeMap::new();
    for i in 0..num_tables {
        let entry = 12 + i * 16;
        let tag = data
            .get(entry..entry + 4)
            .ok_or_else(|| Error::FontParse("truncated table directory".to_string()))?;
        let offset = read_u32(data, entry + 8)? as usize;
        let length = read_u32(data, entry + 12)? as usize;
        tables.insert([tag[0], tag[1], tag[2], tag[3]], TableRecord { offset, length });
    }
    Ok(tables)
}

fn read_loca(loca: &[u8], num_glyphs: u16, long: bool) -> Result<Vec<u32>> {
    (0..=num_glyphs as usize)
        .map(|i| {
            if long {
                read_u32(loca, i * 4)
            } else {
                read_u16(loca, i * 2).map(|half| half as u32 * 2)
            }
        })
        .collect()
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| Error::FontParse(format!("read past end of table at {}", offset)))
}

pub(crate) fn read_i16(data: &[u8], offset: usize) -> Result<i16> {
    read_u16(data, offset).map(|v| v as i16)
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| Error::FontParse(format!("read past end of table at {}", offset)))
}
