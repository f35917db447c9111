//! TrueType subsetting
//!
//! Only the glyphs reachable from the used set survive. Outlines of every
//! other glyph are dropped but their slots stay, so glyph IDs (and with them
//! the CIDs written into content streams) are unchanged.

use std::collections::BTreeSet;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::font::truetype::{read_i16, read_u16, TrueTypeFont};
use crate::font::SubsetFont;

/// Tables kept in the subset, in ASCII tag order.
pub const KEPT_TABLES: [&[u8; 4]; 9] = [
    b"cvt ", b"fpgm", b"glyf", b"head", b"hhea", b"hmtx", b"loca", b"maxp", b"prep",
];

/// Hinting tables that not every font carries.
const OPTIONAL_TABLES: [&[u8; 4]; 3] = [b"cvt ", b"fpgm", b"prep"];

// composite glyph component flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Result of subsetting one font.
#[derive(Debug, Clone)]
pub struct SubsetOutput {
    /// Uncompressed sfnt file.
    pub sfnt: Vec<u8>,
    /// Zlib-compressed `sfnt`, ready for a `/FlateDecode` stream.
    pub compressed: Vec<u8>,
    /// Glyph closure, `.notdef` included.
    pub glyphs: BTreeSet<u16>,
}

/// Subset `font` down to the glyphs its usage map needs.
pub fn subset(font: &SubsetFont) -> Result<SubsetOutput> {
    let ttf = TrueTypeFont::parse(&font.bytes)?;

    let mut used = Vec::with_capacity(font.glyph_usage.len());
    for ch in font.glyph_usage.keys() {
        used.push(ttf.glyph_index(*ch).ok_or(Error::GlyphNotFound(*ch))?);
    }

    let glyphs = glyph_closure(&ttf, used)?;
    let (glyf, loca) = rebuild_glyf_loca(&ttf, &glyphs);
    let sfnt = assemble(&ttf, glyf, loca)?;
    let compressed = compress(&sfnt)?;

    log::debug!(
        "Subset font {}: {} glyphs kept of {}, {} -> {} bytes ({} compressed)",
        font.font_ref,
        glyphs.len(),
        ttf.num_glyphs(),
        font.bytes.len(),
        sfnt.len(),
        compressed.len()
    );
    Ok(SubsetOutput {
        sfnt,
        compressed,
        glyphs,
    })
}

/// Every glyph needed to draw `used`: the glyphs themselves, `.notdef`, and
/// all components of composite glyphs, followed to any depth.
pub fn glyph_closure(
    font: &TrueTypeFont,
    used: impl IntoIterator<Item = u16>,
) -> Result<BTreeSet<u16>> {
    let mut closure = BTreeSet::new();
    let mut pending = Vec::new();
    for gid in std::iter::once(0).chain(used) {
        if closure.insert(gid) {
            pending.push(gid);
        }
    }

    while let Some(gid) = pending.pop() {
        for component in composite_components(font.glyph_data(gid))? {
            if component >= font.num_glyphs() {
                log::warn!("Glyph {} references missing glyph {}", gid, component);
                continue;
            }
            if closure.insert(component) {
                pending.push(component);
            }
        }
    }
    Ok(closure)
}

/// Glyph IDs referenced by a composite outline; empty for simple glyphs.
pub fn composite_components(glyph: &[u8]) -> Result<Vec<u16>> {
    let mut components = Vec::new();
    if glyph.is_empty() || read_i16(glyph, 0)? >= 0 {
        return Ok(components);
    }

    // numberOfContours, then the glyph bounding box
    let mut offset = 10;
    loop {
        let flags = read_u16(glyph, offset)?;
        components.push(read_u16(glyph, offset + 2)?);
        offset += 4;

        offset += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            offset += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            offset += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            offset += 8;
        }

        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    Ok(components)
}

/// New `glyf` and `loca` holding outlines only for glyphs in `keep`.
pub fn rebuild_glyf_loca(font: &TrueTypeFont, keep: &BTreeSet<u16>) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(font.num_glyphs() as usize + 1);
    for gid in 0..font.num_glyphs() {
        offsets.push(glyf.len());
        if keep.contains(&gid) {
            glyf.extend_from_slice(font.glyph_data(gid));
        }
    }
    offsets.push(glyf.len());

    let mut loca = Vec::new();
    for offset in offsets {
        if font.is_long_loca() {
            loca.extend_from_slice(&(offset as u32).to_be_bytes());
        } else {
            loca.extend_from_slice(&((offset / 2) as u16).to_be_bytes());
        }
    }
    (glyf, loca)
}

/// Write an sfnt file from the kept tables, with `glyf` and `loca` replaced.
pub fn assemble(font: &TrueTypeFont, mut glyf: Vec<u8>, mut loca: Vec<u8>) -> Result<Vec<u8>> {
    let mut tables: Vec<(&[u8; 4], Vec<u8>)> = Vec::with_capacity(KEPT_TABLES.len());
    for tag in KEPT_TABLES {
        let data = match tag {
            b"glyf" => std::mem::take(&mut glyf),
            b"loca" => std::mem::take(&mut loca),
            _ => match font.table(tag) {
                Some(data) => data.to_vec(),
                None if OPTIONAL_TABLES.contains(&tag) => {
                    log::debug!("Font has no '{}' table", String::from_utf8_lossy(tag));
                    continue;
                }
                None => {
                    return Err(Error::FontParse(format!(
                        "missing required table '{}'",
                        String::from_utf8_lossy(tag)
                    )))
                }
            },
        };
        tables.push((tag, data));
    }

    let num_tables = tables.len() as u16;
    let entry_selector = num_tables.ilog2() as u16;
    let search_range = 16 * (1u16 << entry_selector);
    let range_shift = num_tables * 16 - search_range;

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    let mut offset = 12 + 16 * tables.len();
    for (tag, data) in &tables {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&checksum(data).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += padded_len(data.len());
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
        out.resize(out.len() + padded_len(data.len()) - data.len(), 0);
    }
    Ok(out)
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Sum of big-endian 32-bit words, the last one zero-padded.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
