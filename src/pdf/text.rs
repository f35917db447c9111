//! Text insertion
//!
//! [`PdfData::insert_text`] only records what to draw. Content streams are
//! written by [`PdfData::build`], once every font has been subset.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::font::FontRef;
use crate::pdf::data::PdfData;
use crate::pdf::model::ObjectId;

/// Point on the page in PDF user space (origin bottom-left, 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Horizontal alignment of text relative to its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Options for inserted text
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    /// Font size in points
    pub font_size: f32,
    /// Fill color as RGB components in `0.0..=1.0`
    pub color: (f32, f32, f32),
    pub align: Align,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            color: (0.0, 0.0, 0.0),
            align: Align::Left,
        }
    }
}

/// One pending text insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentCacheEntry {
    pub page_id: ObjectId,
    pub font_ref: FontRef,
    pub text: String,
    /// Start of the baseline, alignment already applied.
    pub position: Position,
    pub options: TextOptions,
}

impl PdfData {
    /// Queue `text` for drawing on the 1-based page `page`.
    ///
    /// Every character must have a glyph in the font; on failure nothing is
    /// queued or recorded.
    pub fn insert_text(
        &mut self,
        page: usize,
        font_ref: &FontRef,
        text: &str,
        at: Position,
        options: &TextOptions,
    ) -> Result<()> {
        let (r, g, b) = options.color;
        for (what, value) in [
            ("x", at.x),
            ("y", at.y),
            ("font size", options.font_size),
            ("red", r),
            ("green", g),
            ("blue", b),
        ] {
            if !value.is_finite() {
                return Err(Error::General(format!("{} must be a finite number, got {}", what, value)));
            }
        }
        self.subset_font(font_ref)?;
        let page_id = self.page_id(page)?;

        let font = self.subset_font_mut(font_ref)?;
        font.record(text)?;
        let width = font.text_width(text, options.font_size)?;
        let x = match options.align {
            Align::Left => at.x,
            Align::Center => at.x - width / 2.0,
            Align::Right => at.x - width,
        };

        log::debug!(
            "Queued {} characters for page {} (object {}) at ({}, {})",
            text.chars().count(),
            page,
            page_id,
            x,
            at.y
        );
        self.content_cache.push(ContentCacheEntry {
            page_id,
            font_ref: font_ref.clone(),
            text: text.to_string(),
            position: Position::new(x, at.y),
            options: options.clone(),
        });
        Ok(())
    }
}

/// One `BT ... ET` block drawing `entry` with resource font `font_name`.
///
/// Glyph IDs come from `usage`, the font's recorded character map.
pub(crate) fn render_entry(
    entry: &ContentCacheEntry,
    font_name: &str,
    usage: &BTreeMap<char, u16>,
) -> Result<String> {
    let mut glyphs = String::with_capacity(entry.text.len() * 4);
    for ch in entry.text.chars() {
        let gid = usage.get(&ch).ok_or(Error::RuneNotFound(ch))?;
        glyphs.push_str(&format!("{:04X}", gid));
    }
    let (r, g, b) = entry.options.color;
    Ok(format!(
        "BT /{} {} Tf {} {} {} rg {} {} Td <{}> Tj ET\n",
        font_name,
        format_number(entry.options.font_size),
        format_number(r),
        format_number(g),
        format_number(b),
        format_number(entry.position.x),
        format_number(entry.position.y),
        glyphs
    ))
}

/// Shortest decimal form: `0`, `-12`, `-12.5`.
pub(crate) fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
