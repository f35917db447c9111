//! The in-memory document graph

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::font::{FontRef, SubsetFont};
use crate::pdf::model::{ListShape, Node, NodeContent, NodeList, ObjectId, FAKE_ID_BASE};
use crate::pdf::text::ContentCacheEntry;

/// Holds every object of a PDF as node lists, plus edits waiting for
/// [`PdfData::build`].
///
/// A graph has a single owner; all mutation goes through `&mut self`.
#[derive(Debug, Clone)]
pub struct PdfData {
    pub(crate) objects: BTreeMap<ObjectId, NodeList>,
    pub(crate) subset_fonts: BTreeMap<FontRef, SubsetFont>,
    pub(crate) content_cache: Vec<ContentCacheEntry>,
    fake_id: u32,
}

impl Default for PdfData {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfData {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            subset_fonts: BTreeMap::new(),
            content_cache: Vec::new(),
            fake_id: FAKE_ID_BASE,
        }
    }

    /// Append `node` to the list owned by `id`, creating the list on first use.
    pub fn push(&mut self, id: ObjectId, node: Node) {
        self.objects
            .entry(id)
            .or_insert_with(|| NodeList::for_first(&node))
            .push(node);
    }

    /// Record an explicit empty list for `id` unless one already exists.
    pub fn ensure(&mut self, id: ObjectId, shape: ListShape) {
        self.objects.entry(id).or_insert_with(|| NodeList::new(shape));
    }

    /// Install a complete list under `id`, replacing whatever was there.
    pub fn insert(&mut self, id: ObjectId, list: NodeList) {
        self.objects.insert(id, list);
    }

    pub fn get(&self, id: ObjectId) -> Option<&NodeList> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut NodeList> {
        self.objects.get_mut(&id)
    }

    /// Like [`PdfData::get`] but a missing list is an error.
    pub fn nodes(&self, id: ObjectId) -> Result<&NodeList> {
        self.objects.get(&id).ok_or(Error::ObjectIdNotFound(id))
    }

    pub fn nodes_mut(&mut self, id: ObjectId) -> Result<&mut NodeList> {
        self.objects.get_mut(&id).ok_or(Error::ObjectIdNotFound(id))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &NodeList)> {
        self.objects.iter().map(|(id, list)| (*id, list))
    }

    /// Real object numbers in ascending order, trailer excluded.
    pub fn real_ids(&self) -> Vec<u32> {
        self.objects
            .keys()
            .filter(|id| id.is_real() && id.id() > 0)
            .map(|id| id.id())
            .collect()
    }

    /// Largest real and largest fake number in use (0 when none).
    pub fn max_ids(&self) -> (u32, u32) {
        let mut max_real = 0;
        let mut max_fake = 0;
        for id in self.objects.keys() {
            if id.is_real() {
                max_real = max_real.max(id.id());
            } else {
                max_fake = max_fake.max(id.id());
            }
        }
        (max_real, max_fake)
    }

    /// Allocate a new synthetic ID. The counter never goes backwards.
    pub fn next_fake_id(&mut self) -> ObjectId {
        self.fake_id += 1;
        ObjectId::fake(self.fake_id)
    }

    /// Allocate the next unused object number.
    pub fn next_real_id(&mut self) -> ObjectId {
        let (max_real, _) = self.max_ids();
        let id = ObjectId::real(max_real + 1);
        // reserve it so a second call before any push gets a fresh number
        self.objects.entry(id).or_insert_with(|| NodeList::new(ListShape::Dictionary));
        id
    }

    /// Make sure later fake allocations land above every fake ID present.
    pub(crate) fn sync_fake_counter(&mut self) {
        let (_, max_fake) = self.max_ids();
        self.fake_id = self.fake_id.max(max_fake);
    }

    /// New inline dictionary built from `nodes`, returned as a reference target.
    pub fn add_inline_dict(&mut self, nodes: Vec<Node>) -> ObjectId {
        let id = self.next_fake_id();
        self.insert(id, NodeList::from_nodes(ListShape::Dictionary, nodes));
        id
    }

    /// New inline array of the given contents.
    pub fn add_inline_array(&mut self, items: Vec<NodeContent>) -> ObjectId {
        let id = self.next_fake_id();
        let nodes = items
            .into_iter()
            .enumerate()
            .map(|(i, content)| Node::index(i, content))
            .collect();
        self.insert(id, NodeList::from_nodes(ListShape::Array, nodes));
        id
    }

    /// New indirect object holding `list`.
    pub fn add_object(&mut self, list: NodeList) -> ObjectId {
        let id = self.next_real_id();
        self.insert(id, list);
        id
    }

    /// Fonts registered but not yet embedded.
    pub fn pending_fonts(&self) -> impl Iterator<Item = &SubsetFont> {
        self.subset_fonts.values()
    }

    /// Text insertions not yet rendered into page content.
    pub fn pending_text(&self) -> &[ContentCacheEntry] {
        &self.content_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_creates_and_appends() {
        let mut data = PdfData::new();
        let id = ObjectId::real(1);
        data.push(id, Node::literal("Type", "/Catalog"));
        data.push(id, Node::literal("Version", "/1.7"));
        assert_eq!(data.get(id).map(NodeList::len), Some(2));
    }

    #[test]
    fn test_fake_counter_starts_above_base_and_increases() {
        let mut data = PdfData::new();
        let a = data.next_fake_id();
        let b = data.next_fake_id();
        assert!(!a.is_real());
        assert_eq!(a.id(), FAKE_ID_BASE + 1);
        assert_eq!(b.id(), FAKE_ID_BASE + 2);
    }

    #[test]
    fn test_next_real_id_reserves_number() {
        let mut data = PdfData::new();
        data.push(ObjectId::real(7), Node::literal("Type", "/Page"));
        let a = data.next_real_id();
        let b = data.next_real_id();
        assert_eq!(a, ObjectId::real(8));
        assert_eq!(b, ObjectId::real(9));
    }

    #[test]
    fn test_real_ids_exclude_trailer_and_fakes() {
        let mut data = PdfData::new();
        data.push(ObjectId::TRAILER, Node::reference("Root", ObjectId::real(2)));
        data.push(ObjectId::real(2), Node::literal("Type", "/Catalog"));
        data.push(ObjectId::real(1), Node::literal("Type", "/Pages"));
        let fake = data.add_inline_array(vec![NodeContent::Literal("0".into())]);
        assert_eq!(data.real_ids(), vec![1, 2]);
        assert_eq!(data.max_ids(), (2, fake.id()));
    }
}
