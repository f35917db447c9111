//! Merging of document graphs
//!
//! Merging is a collision-free disjoint union: every object of the second
//! graph is renumbered above the first graph's largest IDs (real and fake
//! separately) and copied across. Page trees, catalogs and shared resources
//! are not reconciled.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::pdf::data::PdfData;
use crate::pdf::model::{Node, NodeContent, NodeList, ObjectId};
use crate::pdf::{read_pdf, write_pdf};

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Merge `b` into `a`.
///
/// Real IDs of `b` are shifted by `max_real(a) + 1`, fake IDs by
/// `max_fake(a) + 1`, and every reference inside `b` is shifted the same
/// way, so the copied objects only ever point at each other. `b`'s trailer
/// (real 0) lands as an ordinary object.
pub fn merge(a: &mut PdfData, b: &PdfData) -> Result<()> {
    let (max_real, max_fake) = a.max_ids();
    let real_offset = max_real + 1;
    let fake_offset = max_fake + 1;

    for (id, nodes) in b.iter() {
        let new_id = shift_id(id, real_offset, fake_offset);
        if a.contains(new_id) {
            return Err(Error::General(format!(
                "merge produced colliding object ID {}",
                new_id
            )));
        }
        a.insert(new_id, shift_list(nodes, real_offset, fake_offset));
    }
    a.sync_fake_counter();

    log::info!(
        "Merged {} objects (real offset {}, fake offset {})",
        b.len(),
        real_offset,
        fake_offset
    );
    Ok(())
}

fn shift_id(id: ObjectId, real_offset: u32, fake_offset: u32) -> ObjectId {
    if id.is_real() {
        id.shifted(real_offset)
    } else {
        id.shifted(fake_offset)
    }
}

/// Deep copy of a node list with every reference renumbered.
fn shift_list(nodes: &NodeList, real_offset: u32, fake_offset: u32) -> NodeList {
    let shifted = nodes
        .iter()
        .map(|node| Node {
            key: node.key.clone(),
            content: match &node.content {
                NodeContent::Reference(target) => {
                    NodeContent::Reference(shift_id(*target, real_offset, fake_offset))
                }
                other => other.clone(),
            },
        })
        .collect();
    NodeList::from_nodes(nodes.shape(), shifted)
}

/// Merge multiple PDF files into a single PDF file
///
/// Every input after the first is merged into the first with [`merge`],
/// then the result is built and written.
///
/// # Example
///
/// ```no_run
/// use pdf_weave::pdf::{MergeOptions, merge_pdfs};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("1. first.pdf"),
///         PathBuf::from("2. second.pdf"),
///     ],
///     output_path: PathBuf::from("merged.pdf"),
/// };
///
/// merge_pdfs(&options).expect("Failed to merge");
/// ```
pub fn merge_pdfs(options: &MergeOptions) -> Result<()> {
    if options.input_paths.is_empty() {
        return Err(Error::General("No input files provided".to_string()));
    }

    // Validate all input files exist
    for path in &options.input_paths {
        if !path.exists() {
            return Err(Error::FileNotFound(path.clone()));
        }
    }

    let mut merged: Option<PdfData> = None;
    for path in &options.input_paths {
        let doc = read_pdf(&std::fs::read(path)?)?;
        match merged.as_mut() {
            None => merged = Some(doc),
            Some(target) => merge(target, &doc)?,
        }
    }

    let mut merged = merged.ok_or_else(|| Error::General("No input files provided".to_string()))?;
    let bytes = write_pdf(&mut merged)?;
    std::fs::write(&options.output_path, bytes)?;

    Ok(())
}
