//! Finalizing pending edits into the graph
//!
//! Fonts are subset and embedded, each touched page gets its fonts
//! registered under `/Resources /Font` and one extra content stream holding
//! the queued text. The page's original content is wrapped in `q`/`Q` so its
//! transformations cannot move the inserted text.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::font::subset::subset;
use crate::font::FontRef;
use crate::pdf::model::{ListShape, Node, NodeContent, NodeKey, NodeList, ObjectId};
use crate::pdf::serialize::serialize;
use crate::pdf::text::{render_entry, ContentCacheEntry};
use crate::pdf::data::PdfData;

impl PdfData {
    /// Apply all pending fonts and text.
    ///
    /// Either every pending edit lands or the graph is left untouched.
    pub fn build(&mut self) -> Result<()> {
        let mut staged = self.clone();
        staged.apply_pending()?;
        *self = staged;
        Ok(())
    }

    /// Serialize the graph as it stands. Pending edits are not applied.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    fn apply_pending(&mut self) -> Result<()> {
        let fonts = std::mem::take(&mut self.subset_fonts);
        let cache = std::mem::take(&mut self.content_cache);

        let mut font_objects: BTreeMap<FontRef, ObjectId> = BTreeMap::new();
        for (font_ref, font) in &fonts {
            if font.glyph_usage.is_empty() && !cache.iter().any(|e| &e.font_ref == font_ref) {
                log::debug!("Font {} was never used, not embedding it", font_ref);
                continue;
            }
            let output = subset(font)?;
            let id = self.embed_font(font, &output)?;
            font_objects.insert(font_ref.clone(), id);
        }

        if !cache.is_empty() {
            let mut registered: HashMap<(ObjectId, FontRef), String> = HashMap::new();
            let mut written = 0;
            for page in self.page_ids()? {
                let entries: Vec<&ContentCacheEntry> =
                    cache.iter().filter(|entry| entry.page_id == page).collect();
                if entries.is_empty() {
                    continue;
                }

                let resources = self.page_resources(page)?;
                let mut content = String::from("Q\n");
                for entry in &entries {
                    let key = (resources, entry.font_ref.clone());
                    let name = match registered.get(&key) {
                        Some(name) => name.clone(),
                        None => {
                            let font_id = font_objects
                                .get(&entry.font_ref)
                                .copied()
                                .ok_or_else(|| Error::FontRefNotFound(entry.font_ref.clone()))?;
                            let name = self.register_font(resources, font_id)?;
                            registered.insert(key, name.clone());
                            name
                        }
                    };
                    let usage = &fonts
                        .get(&entry.font_ref)
                        .ok_or_else(|| Error::FontRefNotFound(entry.font_ref.clone()))?
                        .glyph_usage;
                    content.push_str(&render_entry(entry, &name, usage)?);
                }

                self.wrap_page_content(page, content.into_bytes())?;
                written += entries.len();
            }
            if written != cache.len() {
                return Err(Error::General(format!(
                    "{} text insertions target pages that are no longer in the page tree",
                    cache.len() - written
                )));
            }
        }

        let (max_real, _) = self.max_ids();
        self.ensure(ObjectId::TRAILER, ListShape::Dictionary);
        self.nodes_mut(ObjectId::TRAILER)?
            .set("Size", NodeContent::Literal((max_real + 1).to_string()));

        log::info!(
            "Built {} fonts and {} text insertions, {} objects",
            font_objects.len(),
            cache.len(),
            self.len()
        );
        Ok(())
    }

    /// Resources dictionary in effect for `page`, attaching a new inline one
    /// when neither the page nor its ancestors have any.
    fn page_resources(&mut self, page: ObjectId) -> Result<ObjectId> {
        if let Some((_, NodeContent::Reference(resources))) = self.inherited(page, "Resources") {
            return Ok(*resources);
        }
        let resources = self.add_inline_dict(Vec::new());
        self.nodes_mut(page)?
            .set("Resources", NodeContent::Reference(resources));
        log::debug!("Page {} had no resources, attached {}", page, resources);
        Ok(resources)
    }

    /// Add `font_id` to the `/Font` dictionary of `resources` under a fresh
    /// `F<n>` name and return that name.
    fn register_font(&mut self, resources: ObjectId, font_id: ObjectId) -> Result<String> {
        let font_dict = match self.nodes(resources)?.get("Font") {
            Some(NodeContent::Reference(id)) => *id,
            Some(_) => return Err(Error::DictionaryNotFound("Font".to_string())),
            None => {
                let id = self.add_inline_dict(Vec::new());
                self.nodes_mut(resources)?
                    .set("Font", NodeContent::Reference(id));
                id
            }
        };

        let name = format!("F{}", next_font_number(self.nodes(font_dict)?));
        self.nodes_mut(font_dict)?
            .push(Node::reference(name.clone(), font_id));
        log::debug!("Registered font {} as /{} in {}", font_id, name, resources);
        Ok(name)
    }

    /// Put a `q` stream in front of the page's content and `content` after it.
    fn wrap_page_content(&mut self, page: ObjectId, content: Vec<u8>) -> Result<()> {
        let save = self.add_content_stream(b"q\n".to_vec());
        let text = self.add_content_stream(content);

        match self.nodes(page)?.get("Contents").cloned() {
            Some(NodeContent::Reference(contents))
                if self.get(contents).is_some_and(NodeList::is_array) =>
            {
                let mut items = vec![NodeContent::Reference(save)];
                items.extend(self.nodes(contents)?.iter().map(|node| node.content.clone()));
                items.push(NodeContent::Reference(text));
                self.insert(contents, array(items));
            }
            Some(NodeContent::Reference(stream)) => {
                let contents = self.add_inline_array(vec![
                    NodeContent::Reference(save),
                    NodeContent::Reference(stream),
                    NodeContent::Reference(text),
                ]);
                self.nodes_mut(page)?
                    .set("Contents", NodeContent::Reference(contents));
            }
            _ => {
                let contents = self.add_inline_array(vec![
                    NodeContent::Reference(save),
                    NodeContent::Reference(text),
                ]);
                self.nodes_mut(page)?
                    .set("Contents", NodeContent::Reference(contents));
            }
        }
        Ok(())
    }

    fn add_content_stream(&mut self, content: Vec<u8>) -> ObjectId {
        self.add_object(NodeList::from_nodes(
            ListShape::Dictionary,
            vec![
                Node::literal("Length", content.len().to_string()),
                Node::stream(content),
            ],
        ))
    }
}

fn array(items: Vec<NodeContent>) -> NodeList {
    NodeList::from_nodes(
        ListShape::Array,
        items
            .into_iter()
            .enumerate()
            .map(|(i, content)| Node::index(i, content))
            .collect(),
    )
}

/// One more than the largest `F<n>` already in a font dictionary.
fn next_font_number(fonts: &NodeList) -> u32 {
    fonts
        .iter()
        .filter_map(|node| match &node.key {
            NodeKey::Name(name) => name.strip_prefix('F')?.parse::<u32>().ok(),
            _ => None,
        })
        .max()
        .map_or(1, |n| n + 1)
}
