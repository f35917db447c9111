//! PDF metadata extraction

use std::path::Path;

use crate::error::{Error, Result};
use crate::pdf::data::PdfData;
use crate::pdf::model::{NodeContent, ObjectId};
use crate::pdf::read_pdf;

/// PDF metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Number of indirect objects
    pub object_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

/// Summarize a parsed document
pub fn extract_metadata(data: &PdfData) -> Result<PdfMetadata> {
    let page_count = data.page_ids()?.len();

    let mut title = None;
    let mut author = None;
    if let Some(NodeContent::Reference(info)) = data.get(ObjectId::TRAILER).and_then(|t| t.get("Info")) {
        title = data.literal(*info, "Title").and_then(decode_text);
        author = data.literal(*info, "Author").and_then(decode_text);
    }

    Ok(PdfMetadata {
        page_count,
        object_count: data.real_ids().len(),
        title,
        author,
    })
}

/// Read a PDF file and summarize it
pub fn read_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    extract_metadata(&read_pdf(&std::fs::read(path)?)?)
}

/// Text of a string value as the parser writes it: `(literal)` or a
/// `<FEFF...>` UTF-16 hex string.
fn decode_text(value: &str) -> Option<String> {
    if let Some(hex) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) {
        let units = hex
            .as_bytes()
            .chunks(4)
            .map(|chunk| u16::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok())
            .collect::<Option<Vec<u16>>>()?;
        let units = units.strip_prefix(&[0xFEFF]).unwrap_or(&units);
        return Some(String::from_utf16_lossy(units));
    }

    let body = value.strip_prefix('(')?.strip_suffix(')')?;
    let mut bytes = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next()? {
            'n' => bytes.push(b'\n'),
            'r' => bytes.push(b'\r'),
            't' => bytes.push(b'\t'),
            'b' => bytes.push(0x08),
            'f' => bytes.push(0x0C),
            d @ '0'..='7' => {
                let mut code = d.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                bytes.push(code as u8);
            }
            other => bytes.push(other as u8),
        }
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::model::Node;

    #[test]
    fn test_read_metadata_nonexistent_file() {
        let result = read_metadata(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text("(Plain)").as_deref(), Some("Plain"));
        assert_eq!(decode_text("(a\\(b\\) \\\\ \\101)").as_deref(), Some("a(b) \\ A"));
        assert_eq!(decode_text("<FEFF00480069>").as_deref(), Some("Hi"));
        assert_eq!(decode_text("/Name"), None);
    }

    #[test]
    fn test_extract_metadata() {
        let mut data = PdfData::new();
        data.push(ObjectId::TRAILER, Node::reference("Root", ObjectId::real(1)));
        data.push(ObjectId::TRAILER, Node::reference("Info", ObjectId::real(3)));
        data.push(ObjectId::real(1), Node::reference("Pages", ObjectId::real(2)));
        let kids = data.add_inline_array(vec![]);
        data.push(ObjectId::real(2), Node::literal("Type", "/Pages"));
        data.push(ObjectId::real(2), Node::reference("Kids", kids));
        data.push(ObjectId::real(3), Node::literal("Title", "(Handout)"));

        let metadata = extract_metadata(&data).unwrap();
        assert_eq!(metadata.page_count, 0);
        assert_eq!(metadata.object_count, 3);
        assert_eq!(metadata.title.as_deref(), Some("Handout"));
        assert_eq!(metadata.author, None);
    }
}
