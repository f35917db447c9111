//! Embedded TrueType fonts
//!
//! A font is registered once per graph under its [`FontRef`], collects the
//! characters drawn with it, and is subset and embedded when the graph is
//! built.

pub mod embed;
pub mod subset;
pub mod truetype;

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::font::truetype::TrueTypeFont;
use crate::pdf::data::PdfData;

/// Identity of a registered font: the hex SHA-256 of its file.
///
/// Also used as the embedded font's `/BaseFont` name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontRef(String);

impl FontRef {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        FontRef(format!("{:x}", Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FontRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered font and the characters drawn with it so far.
#[derive(Debug, Clone)]
pub struct SubsetFont {
    pub font_ref: FontRef,
    pub bytes: Vec<u8>,
    /// Character to glyph ID, for every character inserted.
    pub glyph_usage: BTreeMap<char, u16>,
}

impl SubsetFont {
    pub fn new(font_ref: FontRef, bytes: Vec<u8>) -> Self {
        Self {
            font_ref,
            bytes,
            glyph_usage: BTreeMap::new(),
        }
    }

    /// Map `text` to glyph IDs and record them as used.
    ///
    /// Nothing is recorded when any character lacks a glyph.
    pub fn record(&mut self, text: &str) -> Result<Vec<u16>> {
        let font = TrueTypeFont::parse(&self.bytes)?;
        let glyphs = text
            .chars()
            .map(|ch| font.glyph_index(ch).ok_or(Error::GlyphNotFound(ch)))
            .collect::<Result<Vec<u16>>>()?;
        for (ch, gid) in text.chars().zip(&glyphs) {
            self.glyph_usage.insert(ch, *gid);
        }
        Ok(glyphs)
    }

    /// Advance width of `text` at `font_size`, in user space units.
    pub fn text_width(&self, text: &str, font_size: f32) -> Result<f32> {
        let font = TrueTypeFont::parse(&self.bytes)?;
        let units: u32 = text
            .chars()
            .filter_map(|ch| self.glyph_usage.get(&ch))
            .map(|gid| font.advance(*gid) as u32)
            .sum();
        Ok(units as f32 * font_size / font.units_per_em() as f32)
    }
}

impl PdfData {
    /// Register a TrueType font file for use by [`PdfData::insert_text`].
    ///
    /// Registering the same bytes again returns the same [`FontRef`] and
    /// keeps the characters already recorded.
    pub fn add_font_file(&mut self, bytes: Vec<u8>) -> Result<FontRef> {
        TrueTypeFont::parse(&bytes)?;
        let font_ref = FontRef::from_bytes(&bytes);
        if !self.subset_fonts.contains_key(&font_ref) {
            log::info!("Registered font {} ({} bytes)", font_ref, bytes.len());
            self.subset_fonts
                .insert(font_ref.clone(), SubsetFont::new(font_ref.clone(), bytes));
        }
        Ok(font_ref)
    }

    pub fn subset_font(&self, font_ref: &FontRef) -> Result<&SubsetFont> {
        self.subset_fonts
            .get(font_ref)
            .ok_or_else(|| Error::FontRefNotFound(font_ref.clone()))
    }

    pub(crate) fn subset_font_mut(&mut self, font_ref: &FontRef) -> Result<&mut SubsetFont> {
        self.subset_fonts
            .get_mut(font_ref)
            .ok_or_else(|| Error::FontRefNotFound(font_ref.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_ref_is_sha256_hex() {
        let font_ref = FontRef::from_bytes(b"abc");
        assert_eq!(
            font_ref.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(font_ref.to_string().len(), 64);
        assert_eq!(font_ref, FontRef::from_bytes(b"abc"));
        assert_ne!(font_ref, FontRef::from_bytes(b"abd"));
    }

    #[test]
    fn test_invalid_font_is_rejected() {
        let mut data = PdfData::new();
        assert!(matches!(
            data.add_font_file(b"not a font".to_vec()),
            Err(Error::FontParse(_))
        ));
        assert_eq!(data.pending_fonts().count(), 0);
    }

    #[test]
    fn test_unknown_font_ref() {
        let data = PdfData::new();
        let font_ref = FontRef::from_bytes(b"missing");
        assert!(matches!(
            data.subset_font(&font_ref),
            Err(Error::FontRefNotFound(_))
        ));
    }
}
