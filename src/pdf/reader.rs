//! Boundary to the low-level PDF reader
//!
//! The parser walks any tree that implements [`PdfValue`]. The shipped
//! implementation, [`LopdfValue`], sits on top of a loaded
//! [`lopdf::Document`] and resolves `N 0 R` references on the fly.

use std::io::{self, Read};

use lopdf::{Dictionary, Document, Object};

/// Coarse kind of a value, as far as graph construction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Dict,
    Array,
    Stream,
    String,
    Null,
    Scalar,
}

impl ValueKind {
    pub fn is_composite(self) -> bool {
        matches!(self, ValueKind::Dict | ValueKind::Array | ValueKind::Stream)
    }
}

/// A generic, tree-shaped view of one PDF value.
///
/// Children of dictionaries and arrays come back already resolved: if the
/// slot held an indirect reference, the child is the referenced object and
/// [`PdfValue::ref_to`] reports `(number, true)`. Values stored inline report
/// the number of the indirect object they live in (0 inside the trailer)
/// with `false`.
pub trait PdfValue: Sized {
    fn kind(&self) -> ValueKind;

    /// Entry names of a dictionary or stream dictionary, in file order.
    fn keys(&self) -> Vec<String>;

    /// Entry `name`; a null value when absent.
    fn key(&self, name: &str) -> Self;

    /// Element `i` of an array; a null value when out of range.
    fn index(&self, i: usize) -> Self;

    /// Number of array elements (0 for anything else).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(object number, reached through a reference)`.
    fn ref_to(&self) -> (u32, bool);

    /// Still-encoded bytes of a stream.
    fn raw_reader(&self) -> io::Result<Box<dyn Read + '_>>;

    /// Whether a string value is UTF-16BE text (starts with the FE FF marker).
    fn is_utf16(&self) -> bool;

    /// UTF-16 code units of a string value, byte-order marker included.
    fn utf16_units(&self) -> Vec<u16>;

    /// Natural text form of a scalar. Strings come back double-quoted with
    /// backslash escapes, names with their leading slash.
    fn text(&self) -> String;
}

static NULL: Object = Object::Null;

/// Keys that only make sense in a cross-reference stream dictionary.
const XREF_STREAM_KEYS: &[&[u8]] = &[
    b"Type",
    b"W",
    b"Index",
    b"Length",
    b"Filter",
    b"DecodeParms",
    b"Prev",
    b"XRefStm",
];

/// [`PdfValue`] over a loaded lopdf document.
#[derive(Debug, Clone, Copy)]
pub struct LopdfValue<'a> {
    doc: &'a Document,
    object: &'a Object,
    trailer: Option<&'a Dictionary>,
    owner: u32,
    indirect: bool,
}

impl<'a> LopdfValue<'a> {
    /// The document trailer, as the root of the walk.
    ///
    /// Entries inherited from a cross-reference stream dictionary are
    /// hidden since the trailer is always written back in classic form.
    pub fn trailer(doc: &'a Document) -> Self {
        Self {
            doc,
            object: &NULL,
            trailer: Some(&doc.trailer),
            owner: 0,
            indirect: false,
        }
    }

    fn dict(&self) -> Option<&'a Dictionary> {
        if let Some(trailer) = self.trailer {
            return Some(trailer);
        }
        match self.object {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    fn visible(&self, key: &[u8]) -> bool {
        self.trailer.is_none() || !XREF_STREAM_KEYS.contains(&key)
    }

    fn child(&self, object: &'a Object) -> Self {
        match object {
            Object::Reference(id) => match self.doc.get_object(*id) {
                Ok(target) => Self {
                    doc: self.doc,
                    object: target,
                    trailer: None,
                    owner: id.0,
                    indirect: true,
                },
                Err(e) => {
                    log::warn!("Reference {} {} R does not resolve ({}), reading as null", id.0, id.1, e);
                    self.inline(&NULL)
                }
            },
            other => self.inline(other),
        }
    }

    fn inline(&self, object: &'a Object) -> Self {
        Self {
            doc: self.doc,
            object,
            trailer: None,
            owner: self.owner,
            indirect: false,
        }
    }

    fn string_bytes(&self) -> &'a [u8] {
        match self.object {
            Object::String(bytes, _) => bytes,
            _ => &[],
        }
    }
}

impl<'a> PdfValue for LopdfValue<'a> {
    fn kind(&self) -> ValueKind {
        if self.trailer.is_some() {
            return ValueKind::Dict;
        }
        match self.object {
            Object::Dictionary(_) => ValueKind::Dict,
            Object::Array(_) => ValueKind::Array,
            Object::Stream(_) => ValueKind::Stream,
            Object::String(..) => ValueKind::String,
            Object::Null => ValueKind::Null,
            _ => ValueKind::Scalar,
        }
    }

    fn keys(&self) -> Vec<String> {
        match self.dict() {
            Some(dict) => dict
                .iter()
                .filter(|(k, _)| self.visible(k))
                .map(|(k, _)| escape_name(k))
                .collect(),
            None => Vec::new(),
        }
    }

    fn key(&self, name: &str) -> Self {
        let found = self.dict().and_then(|dict| {
            dict.iter()
                .find(|(k, _)| self.visible(k) && escape_name(k) == name)
                .map(|(_, v)| v)
        });
        match found {
            Some(object) => self.child(object),
            None => self.inline(&NULL),
        }
    }

    fn index(&self, i: usize) -> Self {
        match self.object {
            Object::Array(items) if i < items.len() => self.child(&items[i]),
            _ => self.inline(&NULL),
        }
    }

    fn len(&self) -> usize {
        match self.object {
            Object::Array(items) if self.trailer.is_none() => items.len(),
            _ => 0,
        }
    }

    fn ref_to(&self) -> (u32, bool) {
        (self.owner, self.indirect)
    }

    fn raw_reader(&self) -> io::Result<Box<dyn Read + '_>> {
        match self.object {
            Object::Stream(stream) => Ok(Box::new(&stream.content[..])),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "value is not a stream",
            )),
        }
    }

    fn is_utf16(&self) -> bool {
        self.string_bytes().starts_with(&[0xFE, 0xFF])
    }

    fn utf16_units(&self) -> Vec<u16> {
        self.string_bytes()
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
            .collect()
    }

    fn text(&self) -> String {
        match self.object {
            Object::Null => "null".to_string(),
            Object::Boolean(b) => b.to_string(),
            Object::Integer(i) => i.to_string(),
            Object::Real(r) => r.to_string(),
            Object::Name(name) => format!("/{}", escape_name(name)),
            Object::String(bytes, _) => format!("\"{}\"", escape_literal(bytes)),
            Object::Reference(id) => format!("{} {} R", id.0, id.1),
            other => format!("{:?}", other),
        }
    }
}

/// Name bytes as they appear after the slash. Delimiters, `#` and bytes
/// outside the printable range become `#xx`; spaces are left alone.
fn escape_name(name: &[u8]) -> String {
    let mut out = String::with_capacity(name.len());
    for &b in name {
        match b {
            b' ' => out.push(' '),
            b'#' | b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%' => {
                out.push_str(&format!("#{:02X}", b))
            }
            0x21..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("#{:02X}", b)),
        }
    }
    out
}

/// Body of a literal string with backslash escapes for control and
/// non-ASCII bytes. Parentheses are escaped later, when formatting.
fn escape_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x08 => out.push_str("\\b"),
            0x0C => out.push_str("\\f"),
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\{:03o}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream, StringFormat};

    #[test]
    fn test_escape_name() {
        assert_eq!(escape_name(b"Type"), "Type");
        assert_eq!(escape_name(b"A B"), "A B");
        assert_eq!(escape_name(b"a#b"), "a#23b");
        assert_eq!(escape_name(&[0x41, 0xE9]), "A#E9");
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(b"plain"), "plain");
        assert_eq!(escape_literal(b"a\\b\n"), "a\\\\b\\n");
        assert_eq!(escape_literal(&[0x00, 0xFF]), "\\000\\377");
    }

    #[test]
    fn test_children_report_owner_and_indirection() {
        let mut doc = Document::with_version("1.7");
        let inner_id = doc.add_object(dictionary! { "Kind" => "Inner" });
        let outer_id = doc.add_object(dictionary! {
            "Ref" => inner_id,
            "Inline" => dictionary! { "X" => 1 },
        });
        doc.trailer.set("Root", outer_id);

        let trailer = LopdfValue::trailer(&doc);
        assert_eq!(trailer.kind(), ValueKind::Dict);
        assert_eq!(trailer.keys(), vec!["Root".to_string()]);

        let outer = trailer.key("Root");
        assert_eq!(outer.ref_to(), (outer_id.0, true));

        let inner = outer.key("Ref");
        assert_eq!(inner.ref_to(), (inner_id.0, true));
        assert_eq!(inner.key("Kind").text(), "/Inner");

        let inline = outer.key("Inline");
        assert_eq!(inline.kind(), ValueKind::Dict);
        assert_eq!(inline.ref_to(), (outer_id.0, false));
        assert_eq!(inline.key("X").text(), "1");
        assert_eq!(inline.key("Missing").kind(), ValueKind::Null);
    }

    #[test]
    fn test_strings_and_streams() {
        let mut doc = Document::with_version("1.7");
        let stream_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
        doc.trailer.set("S", stream_id);
        doc.trailer.set(
            "U",
            Object::String(vec![0xFE, 0xFF, 0x00, 0x41], StringFormat::Hexadecimal),
        );
        doc.trailer.set("L", Object::string_literal("a(b)"));

        let trailer = LopdfValue::trailer(&doc);
        let utf16 = trailer.key("U");
        assert!(utf16.is_utf16());
        assert_eq!(utf16.utf16_units(), vec![0xFEFF, 0x0041]);

        let literal = trailer.key("L");
        assert!(!literal.is_utf16());
        assert_eq!(literal.text(), "\"a(b)\"");

        let stream = trailer.key("S");
        let mut bytes = Vec::new();
        stream.raw_reader().unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"BT ET");
        assert!(trailer.key("L").raw_reader().is_err());
    }
}
