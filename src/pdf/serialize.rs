//! Writes a [`PdfData`] graph back out as a PDF 1.7 file
//!
//! Layout of the output:
//!
//! ```text
//! %PDF-1.7
//! 1 0 obj
//! ...
//! endobj
//! xref
//! 0 max+1
//! 0000000000 65535 f
//! 0000000009 00000 n
//! trailer
//! << ... >>
//! startxref
//! <offset of "xref">
//! %%EOF
//! ```
//!
//! Fake objects never get an object number; they are rendered in place
//! wherever they are referenced.

use crate::error::{Error, Result};
use crate::pdf::data::PdfData;
use crate::pdf::model::{NodeContent, NodeKey, NodeList, ObjectId};

/// Serialize the whole graph. Nothing is returned on error.
pub fn serialize(data: &PdfData) -> Result<Vec<u8>> {
    let mut buff: Vec<u8> = Vec::new();
    buff.extend_from_slice(b"%PDF-1.7\n");

    let real_ids = data.real_ids();
    let mut xref_table = Vec::with_capacity(real_ids.len());
    for id in &real_ids {
        let object = ObjectId::real(*id);
        xref_table.push((*id, buff.len()));
        buff.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        render_list(data, object, &mut buff)?;
        buff.extend_from_slice(b"\nendobj\n");
    }

    let mut trailer = Vec::new();
    if data.contains(ObjectId::TRAILER) {
        render_list(data, ObjectId::TRAILER, &mut trailer)?;
    } else {
        trailer.extend_from_slice(b"<<\n>>");
    }

    let startxref = buff.len();
    buff.extend_from_slice(b"xref\n");
    write_xref(&xref_table, &mut buff);
    buff.extend_from_slice(b"trailer\n");
    buff.extend_from_slice(&trailer);
    buff.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", startxref).as_bytes());

    log::info!(
        "Serialized {} objects into {} bytes",
        real_ids.len(),
        buff.len()
    );
    Ok(buff)
}

/// `0 max+1`, the free head entry, then one fixed 20-byte line per object
/// number. Numbers with no object (unreachable in the source) are free.
fn write_xref(offsets: &[(u32, usize)], buff: &mut Vec<u8>) {
    let max_id = offsets.last().map_or(0, |(id, _)| *id);
    buff.extend_from_slice(format!("0 {}\n", max_id + 1).as_bytes());
    buff.extend_from_slice(b"0000000000 65535 f \n");
    let mut next = 1;
    for (id, offset) in offsets {
        for _ in next..*id {
            buff.extend_from_slice(b"0000000000 65535 f \n");
        }
        buff.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        next = id + 1;
    }
}

/// Render the list owned by `id` by shape: array, bare value or dictionary
/// (followed by its stream data, if any).
fn render_list(data: &PdfData, id: ObjectId, buff: &mut Vec<u8>) -> Result<()> {
    let nodes = data.nodes(id)?;
    if nodes.is_array() {
        buff.extend_from_slice(b"[ ");
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                buff.push(b' ');
            }
            render_content(data, &node.content, buff)?;
        }
        buff.extend_from_slice(b" ]");
    } else if nodes.is_single_value() {
        for node in nodes {
            render_content(data, &node.content, buff)?;
        }
    } else {
        render_dictionary(data, nodes, buff)?;
        if let Some(stream) = nodes.stream_bytes() {
            buff.extend_from_slice(b"\nstream\n");
            buff.extend_from_slice(stream);
            if stream.last() != Some(&b'\n') {
                buff.push(b'\n');
            }
            buff.extend_from_slice(b"endstream");
        }
    }
    Ok(())
}

fn render_dictionary(data: &PdfData, nodes: &NodeList, buff: &mut Vec<u8>) -> Result<()> {
    buff.extend_from_slice(b"<<\n");
    for node in nodes {
        if let NodeKey::Name(name) = &node.key {
            buff.push(b'/');
            buff.extend_from_slice(name.as_bytes());
            buff.push(b' ');
            render_content(data, &node.content, buff)?;
            buff.push(b'\n');
        }
    }
    buff.extend_from_slice(b">>");
    Ok(())
}

fn render_content(data: &PdfData, content: &NodeContent, buff: &mut Vec<u8>) -> Result<()> {
    match content {
        NodeContent::Literal(text) | NodeContent::SingleObject(text) => {
            buff.extend_from_slice(text.as_bytes());
        }
        NodeContent::Reference(target) if target.is_real() => {
            if !data.contains(*target) {
                return Err(Error::ObjectIdNotFound(*target));
            }
            buff.extend_from_slice(format!("{} 0 R", target.id()).as_bytes());
        }
        NodeContent::Reference(target) => render_list(data, *target, buff)?,
        // stream data is written after the dictionary, never as a value
        NodeContent::Stream(_) => {}
    }
    Ok(())
}
