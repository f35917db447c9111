//! PDF object graph: reading, editing and writing

pub mod build;
pub mod data;
pub mod merge;
pub mod metadata;
pub mod model;
pub mod query;
pub mod reader;
pub mod serialize;
pub mod text;
pub mod unmarshal;

use lopdf::Document;

use crate::error::Result;

// Re-export commonly used items
pub use data::PdfData;
pub use merge::{merge, merge_pdfs, MergeOptions};
pub use metadata::{extract_metadata, read_metadata, PdfMetadata};
pub use model::{ListShape, Node, NodeContent, NodeKey, NodeList, ObjectId};
pub use reader::{LopdfValue, PdfValue, ValueKind};
pub use serialize::serialize;
pub use text::{Align, Position, TextOptions};
pub use unmarshal::unmarshal;

/// Parse PDF bytes into a graph, starting from the trailer.
pub fn read_pdf(bytes: &[u8]) -> Result<PdfData> {
    let doc = Document::load_mem(bytes)?;
    let data = unmarshal(&LopdfValue::trailer(&doc))?;
    log::info!(
        "Read {} bytes into {} objects ({} indirect)",
        bytes.len(),
        data.len(),
        data.real_ids().len()
    );
    Ok(data)
}

/// Apply pending edits and serialize.
pub fn write_pdf(data: &mut PdfData) -> Result<Vec<u8>> {
    data.build()?;
    data.to_bytes()
}
