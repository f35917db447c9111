//! Structural lookups over a graph

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::pdf::data::PdfData;
use crate::pdf::model::{NodeContent, ObjectId};

impl PdfData {
    /// Content of entry `/key` in the dictionary owned by `id`.
    pub fn lookup(&self, id: ObjectId, key: &str) -> Result<&NodeContent> {
        self.nodes(id)?.get(key).ok_or_else(|| Error::KeyNameNotFound {
            object: id,
            key: key.to_string(),
        })
    }

    /// Target of entry `/key`, which must be a reference.
    pub fn lookup_ref(&self, id: ObjectId, key: &str) -> Result<ObjectId> {
        match self.lookup(id, key)? {
            NodeContent::Reference(target) => Ok(*target),
            _ => Err(Error::General(format!(
                "/{} in object {} is not a reference",
                key, id
            ))),
        }
    }

    /// Literal text of entry `/key`, `None` when absent or not a literal.
    pub fn literal(&self, id: ObjectId, key: &str) -> Option<&str> {
        match self.get(id)?.get(key)? {
            NodeContent::Literal(text) | NodeContent::SingleObject(text) => Some(text),
            NodeContent::Reference(target) => match self.get(*target)?.nodes().first() {
                Some(node) => match &node.content {
                    NodeContent::SingleObject(text) => Some(text),
                    _ => None,
                },
                None => None,
            },
            NodeContent::Stream(_) => None,
        }
    }

    /// Every object that has `/key` set to exactly `literal`.
    pub fn find_objects(&self, key: &str, literal: &str) -> Vec<ObjectId> {
        self.iter()
            .filter(|(_, nodes)| {
                matches!(nodes.get(key), Some(NodeContent::Literal(text)) if text == literal)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// The document catalog, from the trailer's `/Root`.
    pub fn catalog_id(&self) -> Result<ObjectId> {
        match self.get(ObjectId::TRAILER).and_then(|t| t.get("Root")) {
            Some(NodeContent::Reference(id)) if self.contains(*id) => Ok(*id),
            _ => Err(Error::DictionaryNotFound("Root".to_string())),
        }
    }

    /// Root of the page tree.
    pub fn pages_id(&self) -> Result<ObjectId> {
        let catalog = self.catalog_id()?;
        match self.get(catalog).and_then(|c| c.get("Pages")) {
            Some(NodeContent::Reference(id)) if self.contains(*id) => Ok(*id),
            _ => Err(Error::DictionaryNotFound("Pages".to_string())),
        }
    }

    /// Leaf pages in document order.
    pub fn page_ids(&self) -> Result<Vec<ObjectId>> {
        let root = self.pages_id()?;
        let mut pages = Vec::new();
        let mut seen = HashSet::new();
        self.collect_pages(root, &mut pages, &mut seen)?;
        Ok(pages)
    }

    fn collect_pages(
        &self,
        node: ObjectId,
        pages: &mut Vec<ObjectId>,
        seen: &mut HashSet<ObjectId>,
    ) -> Result<()> {
        if !seen.insert(node) {
            log::warn!("Page tree revisits object {}, skipping", node);
            return Ok(());
        }
        let nodes = self.nodes(node)?;
        match nodes.get("Kids") {
            Some(NodeContent::Reference(kids)) => {
                for kid in self.nodes(*kids)? {
                    if let NodeContent::Reference(kid) = kid.content {
                        self.collect_pages(kid, pages, seen)?;
                    }
                }
            }
            _ if self.literal(node, "Type") == Some("/Page") => pages.push(node),
            _ => {}
        }
        Ok(())
    }

    /// Object of the 1-based page `number`.
    pub fn page_id(&self, number: usize) -> Result<ObjectId> {
        let pages = self.page_ids()?;
        number
            .checked_sub(1)
            .and_then(|i| pages.get(i).copied())
            .ok_or(Error::PageNotFound(number))
    }

    /// Page entry `key`, following `/Parent` for inheritable attributes.
    pub fn inherited(&self, page: ObjectId, key: &str) -> Option<(ObjectId, &NodeContent)> {
        let mut current = page;
        let mut seen = HashSet::new();
        while seen.insert(current) {
            let nodes = self.get(current)?;
            if let Some(content) = nodes.get(key) {
                return Some((current, content));
            }
            match nodes.get("Parent") {
                Some(NodeContent::Reference(parent)) => current = *parent,
                _ => return None,
            }
        }
        None
    }
}
