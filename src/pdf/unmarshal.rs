//! Turns a reader value tree into a [`PdfData`] graph
//!
//! The walk starts at the trailer (real ID 0). Every indirect object is
//! expanded exactly once, no matter how many places refer to it; inline
//! dictionaries and arrays get synthetic IDs and are referenced from their
//! container, so the graph stays acyclic even when the reader reports an
//! inline value as belonging to the object that holds it.

use std::collections::{HashSet, VecDeque};
use std::io::Read;

use crate::error::{Error, Result};
use crate::pdf::data::PdfData;
use crate::pdf::model::{ListShape, Node, NodeContent, NodeKey, ObjectId};
use crate::pdf::reader::{PdfValue, ValueKind};

/// Build a graph from the trailer value of a document.
///
/// Indirect objects are queued when first seen and expanded one at a time,
/// so the depth of the walk only follows inline nesting, never the length
/// of a reference chain.
pub fn unmarshal<V: PdfValue>(trailer: &V) -> Result<PdfData> {
    let mut helper = Unmarshaller::new();
    helper.walk(ObjectId::TRAILER, 0, trailer)?;
    while let Some((id, value)) = helper.pending.pop_front() {
        helper.expand(id, &value)?;
    }
    log::info!(
        "Unmarshalled {} objects ({} indirect)",
        helper.result.len(),
        helper.visited.len()
    );
    Ok(helper.result)
}

/// Where a child value ends up in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Composite reached through `N 0 R`
    Indirect(u32),
    /// Composite stored inline but reported as part of its own container
    SelfEmbedded,
    /// Composite with no object number at all
    Anonymous,
    /// Primitive written in place
    Inline,
    /// Indirect object whose value is a primitive
    IndirectScalar(u32),
}

fn classify(kind: ValueKind, (ref_id, is_ref): (u32, bool), enclosing_real: u32) -> Placement {
    if kind.is_composite() {
        if is_ref && ref_id != 0 {
            // a reference back to the enclosing object is an ordinary edge;
            // it is already marked visited so it is not expanded again
            Placement::Indirect(ref_id)
        } else if ref_id != 0 && ref_id == enclosing_real {
            Placement::SelfEmbedded
        } else {
            Placement::Anonymous
        }
    } else if is_ref && ref_id != 0 {
        Placement::IndirectScalar(ref_id)
    } else {
        Placement::Inline
    }
}

struct Unmarshaller<V> {
    result: PdfData,
    visited: HashSet<u32>,
    /// Indirect objects seen but not yet expanded
    pending: VecDeque<(u32, V)>,
}

impl<V: PdfValue> Unmarshaller<V> {
    fn new() -> Self {
        Self {
            result: PdfData::new(),
            visited: HashSet::new(),
            pending: VecDeque::new(),
        }
    }

    /// Fill the list of indirect object `id` from its resolved value.
    fn expand(&mut self, id: u32, value: &V) -> Result<()> {
        log::debug!("Expanding object {}", id);
        let target = ObjectId::real(id);
        self.walk(target, id, value)?;
        if value.kind() == ValueKind::Stream {
            self.push_stream(target, value)?;
        }
        Ok(())
    }

    /// Expand `value` into the list owned by `owner`.
    ///
    /// `enclosing_real` is the nearest real object around `owner` (equal to
    /// `owner` when it is real).
    fn walk(&mut self, owner: ObjectId, enclosing_real: u32, value: &V) -> Result<()> {
        let kind = value.kind();
        match kind {
            ValueKind::Dict | ValueKind::Stream => {
                for name in value.keys() {
                    let child = value.key(&name);
                    self.place(owner, enclosing_real, NodeKey::Name(name), child)?;
                }
            }
            ValueKind::Array => {
                for i in 0..value.len() {
                    let child = value.index(i);
                    self.place(owner, enclosing_real, NodeKey::Index(i), child)?;
                }
            }
            _ => {}
        }

        let shape = if kind == ValueKind::Array {
            ListShape::Array
        } else {
            ListShape::Dictionary
        };
        // an empty `<< >>` or `[ ]` still has to render
        self.result.ensure(owner, shape);
        Ok(())
    }

    fn place(&mut self, owner: ObjectId, enclosing_real: u32, key: NodeKey, child: V) -> Result<()> {
        let kind = child.kind();
        match classify(kind, child.ref_to(), enclosing_real) {
            Placement::Indirect(id) => {
                let target = ObjectId::real(id);
                log::trace!("{} {:?} '{} 0 R'", owner, key, id);
                self.result.push(owner, Node { key, content: NodeContent::Reference(target) });
                if self.visited.insert(id) {
                    self.pending.push_back((id, child));
                }
            }
            Placement::SelfEmbedded | Placement::Anonymous => {
                let fake = self.result.next_fake_id();
                self.walk(fake, enclosing_real, &child)?;
                log::trace!("{} {:?} inline {}", owner, key, fake);
                self.result.push(owner, Node { key, content: NodeContent::Reference(fake) });
            }
            Placement::IndirectScalar(id) => {
                let target = ObjectId::real(id);
                log::trace!("{} {:?} '{} 0 R' (single value)", owner, key, id);
                self.result.push(owner, Node { key, content: NodeContent::Reference(target) });
                if self.visited.insert(id) {
                    self.result.push(target, Node::single(format_value(&child)));
                }
            }
            Placement::Inline => {
                let text = format_value(&child);
                log::trace!("{} {:?} {}", owner, key, text);
                self.result.push(owner, Node { key, content: NodeContent::Literal(text) });
            }
        }
        Ok(())
    }

    fn push_stream(&mut self, id: ObjectId, value: &V) -> Result<()> {
        let mut bytes = Vec::new();
        value
            .raw_reader()
            .and_then(|mut reader| reader.read_to_end(&mut bytes))
            .map_err(|source| Error::StreamRead { object: id, source })?;
        log::trace!("{} [stream={}]", id, bytes.len());
        self.result.push(id, Node::stream(bytes));
        Ok(())
    }
}

/// PDF token text for a primitive value.
pub(crate) fn format_value<V: PdfValue>(value: &V) -> String {
    match value.kind() {
        ValueKind::String if value.is_utf16() => {
            let mut out = String::from("<");
            for unit in value.utf16_units() {
                out.push_str(&format!("{:04X}", unit));
            }
            out.push('>');
            out
        }
        ValueKind::String => {
            let text = value.text();
            let body = strip_quotes(&text);
            format!("({})", body.replace('(', "\\(").replace(')', "\\)"))
        }
        ValueKind::Null => "null".to_string(),
        _ => value.text().replace(' ', "#20"),
    }
}

fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
