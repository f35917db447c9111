//! PDF Weave Library
//!
//! Reads a PDF into an editable object graph, embeds subset TrueType fonts,
//! places text on pages, merges documents and writes the result back out
//! with a fresh cross-reference table.
//!
//! The whole flow is four calls:
//!
//! ```no_run
//! use pdf_weave::pdf::{read_pdf, write_pdf, Position, TextOptions};
//!
//! # fn main() -> pdf_weave::Result<()> {
//! let mut data = read_pdf(&std::fs::read("handout.pdf")?)?;
//! let font = data.add_font_file(std::fs::read("LiberationSerif-Regular.ttf")?)?;
//! data.insert_text(1, &font, "Hello", Position::new(72.0, 720.0), &TextOptions::default())?;
//! std::fs::write("out.pdf", write_pdf(&mut data)?)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod font;
pub mod pdf;

// Re-export commonly used items
pub use error::{Error, Result};
pub use font::FontRef;
pub use pdf::{read_pdf, write_pdf, PdfData};
