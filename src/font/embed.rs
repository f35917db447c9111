//! Graph objects for an embedded, subset TrueType font
//!
//! Built as a composite font so any glyph can be addressed:
//!
//! ```text
//! Type0 --DescendantFonts [ ]--> CIDFontType2 --> FontDescriptor --> FontFile2
//!   \--ToUnicode--> CMap stream
//! ```

use std::collections::BTreeMap;

use crate::error::Result;
use crate::font::subset::SubsetOutput;
use crate::font::truetype::{FontMetrics, TrueTypeFont};
use crate::font::SubsetFont;
use crate::pdf::data::PdfData;
use crate::pdf::model::{ListShape, Node, NodeContent, NodeList, ObjectId};
use crate::pdf::text::format_number;

/// Entries per `beginbfchar` block; the CMap format caps a block at 100.
const BFCHAR_BLOCK: usize = 100;

/// Font units to the 1000-unit glyph space PDF metrics use.
pub fn pdf_units(value: i32, units_per_em: u16) -> i64 {
    (value as f64 * 1000.0 / units_per_em as f64).round() as i64
}

impl PdfData {
    /// Add the objects for `font`, subset as `output`, and return the ID of
    /// its Type0 font dictionary.
    pub(crate) fn embed_font(&mut self, font: &SubsetFont, output: &SubsetOutput) -> Result<ObjectId> {
        let ttf = TrueTypeFont::parse(&font.bytes)?;
        let metrics = ttf.metrics();
        let base_font = format!("/{}", font.font_ref);

        let type0_id = self.next_real_id();
        let cid_font_id = self.next_real_id();
        let descriptor_id = self.next_real_id();
        let font_file_id = self.next_real_id();
        let to_unicode_id = self.next_real_id();

        let descendants = self.add_inline_array(vec![NodeContent::Reference(cid_font_id)]);
        self.insert(
            type0_id,
            dictionary(vec![
                Node::literal("Type", "/Font"),
                Node::literal("Subtype", "/Type0"),
                Node::literal("BaseFont", base_font.clone()),
                Node::literal("Encoding", "/Identity-H"),
                Node::reference("DescendantFonts", descendants),
                Node::reference("ToUnicode", to_unicode_id),
            ]),
        );

        let system_info = self.add_inline_dict(vec![
            Node::literal("Registry", "(Adobe)"),
            Node::literal("Ordering", "(Identity)"),
            Node::literal("Supplement", "0"),
        ]);
        let widths = self.add_inline_array(
            output
                .glyphs
                .iter()
                .map(|gid| {
                    let width = pdf_units(ttf.advance(*gid) as i32, metrics.units_per_em);
                    NodeContent::Literal(format!("{}[{}]", gid, width))
                })
                .collect(),
        );
        self.insert(
            cid_font_id,
            dictionary(vec![
                Node::literal("Type", "/Font"),
                Node::literal("Subtype", "/CIDFontType2"),
                Node::literal("BaseFont", base_font.clone()),
                Node::reference("CIDSystemInfo", system_info),
                Node::reference("FontDescriptor", descriptor_id),
                Node::reference("W", widths),
                Node::literal("CIDToGIDMap", "/Identity"),
                Node::literal("DW", "1000"),
            ]),
        );

        let descriptor = self.descriptor_nodes(&metrics, base_font, font_file_id);
        self.insert(descriptor_id, dictionary(descriptor));

        self.insert(
            font_file_id,
            dictionary(vec![
                Node::literal("Length", output.compressed.len().to_string()),
                Node::literal("Filter", "/FlateDecode"),
                Node::literal("Length1", output.sfnt.len().to_string()),
                Node::stream(output.compressed.clone()),
            ]),
        );

        let cmap = to_unicode_cmap(&font.glyph_usage).into_bytes();
        self.insert(
            to_unicode_id,
            dictionary(vec![
                Node::literal("Length", cmap.len().to_string()),
                Node::stream(cmap),
            ]),
        );

        log::debug!(
            "Embedded font {} as object {} ({} glyphs)",
            font.font_ref,
            type0_id,
            output.glyphs.len()
        );
        Ok(type0_id)
    }

    fn descriptor_nodes(&mut self, metrics: &FontMetrics, font_name: String, font_file: ObjectId) -> Vec<Node> {
        let upem = metrics.units_per_em;
        let bbox = self.add_inline_array(
            metrics
                .bbox
                .iter()
                .map(|v| NodeContent::Literal(pdf_units(*v as i32, upem).to_string()))
                .collect(),
        );
        vec![
            Node::literal("Type", "/FontDescriptor"),
            Node::literal("FontName", font_name),
            Node::literal("Flags", metrics.flags().to_string()),
            Node::reference("FontBBox", bbox),
            Node::literal("ItalicAngle", format_number(metrics.italic_angle)),
            Node::literal("Ascent", pdf_units(metrics.ascent as i32, upem).to_string()),
            Node::literal("Descent", pdf_units(metrics.descent as i32, upem).to_string()),
            Node::literal("CapHeight", pdf_units(metrics.cap_height as i32, upem).to_string()),
            Node::literal("XHeight", pdf_units(metrics.x_height as i32, upem).to_string()),
            Node::literal("StemV", "80"),
            Node::reference("FontFile2", font_file),
        ]
    }
}

fn dictionary(nodes: Vec<Node>) -> NodeList {
    NodeList::from_nodes(ListShape::Dictionary, nodes)
}

/// ToUnicode CMap mapping each used glyph ID back to its character.
pub fn to_unicode_cmap(usage: &BTreeMap<char, u16>) -> String {
    let mut pairs: Vec<(u16, char)> = usage.iter().map(|(ch, gid)| (*gid, *ch)).collect();
    pairs.sort();
    pairs.dedup_by_key(|(gid, _)| *gid);

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo\n\
         << /Registry (Adobe)\n\
         /Ordering (UCS)\n\
         /Supplement 0\n\
         >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );
    for block in pairs.chunks(BFCHAR_BLOCK) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        for (gid, ch) in block {
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16_hex(*ch)));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

/// Uppercase hex of the UTF-16BE encoding; a surrogate pair outside the BMP.
fn utf16_hex(ch: char) -> String {
    let mut units = [0u16; 2];
    ch.encode_utf16(&mut units)
        .iter()
        .map(|unit| format!("{:04X}", unit))
        .collect()
}
