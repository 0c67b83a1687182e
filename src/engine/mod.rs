//! Document engines
//!
//! The primary engine (Docling) is an external program driven through the
//! [`DocumentConverter`] trait. The fallback engine reads plain text in
//! process with lopdf.

mod docling;
mod document;
mod pdf_text;

pub use docling::DoclingCli;
pub use document::{
    DocBox, DocItem, DoclingDocument, GroupNode, NodeRef, PictureNode, Provenance, TableCell,
    TableData, TableNode, TextNode,
};
pub use pdf_text::PdfTextReader;

use crate::error::Result;
use std::path::Path;

/// A document conversion engine that works on files.
///
/// Implementations block until conversion finishes; callers run them off
/// the async runtime.
pub trait DocumentConverter: Send + Sync {
    /// Engine name reported in result envelopes
    fn name(&self) -> &str;

    /// Convert the document at `path`
    fn convert(&self, path: &Path) -> Result<DoclingDocument>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    pub(crate) const DOCLING_SAMPLE: &str = r##"{
        "schema_name": "DoclingDocument",
        "version": "1.0.0",
        "name": "sample",
        "body": {
            "self_ref": "#/body",
            "children": [
                {"$ref": "#/texts/0"},
                {"$ref": "#/groups/0"},
                {"$ref": "#/tables/0"},
                {"$ref": "#/pictures/0"},
                {"$ref": "#/texts/3"}
            ],
            "label": "unspecified",
            "name": "_root_"
        },
        "groups": [
            {
                "self_ref": "#/groups/0",
                "children": [{"$ref": "#/texts/1"}, {"$ref": "#/texts/2"}],
                "label": "list",
                "name": "list"
            }
        ],
        "texts": [
            {"self_ref": "#/texts/0", "label": "title", "text": "Annual Report",
             "prov": [{"page_no": 1, "bbox": {"l": 10.0, "t": 20.0, "r": 300.0, "b": 40.0, "coord_origin": "BOTTOMLEFT"}, "charspan": [0, 13]}]},
            {"self_ref": "#/texts/1", "label": "list_item", "text": "first",
             "prov": [{"page_no": 1, "bbox": {"l": 1.0, "t": 2.0, "r": 3.0, "b": 4.0}}]},
            {"self_ref": "#/texts/2", "label": "list_item", "text": "second", "prov": []},
            {"self_ref": "#/texts/3", "label": "caption", "text": "  Figure 1  ",
             "prov": [{"page_no": 3}]}
        ],
        "tables": [
            {"self_ref": "#/tables/0", "label": "table",
             "prov": [{"page_no": 2, "bbox": {"l": 5.0, "t": 6.0, "r": 7.0, "b": 8.0}}],
             "data": {"num_rows": 2, "num_cols": 2,
                      "grid": [[{"text": "a"}, {"text": "b"}], [{"text": "1"}, {"text": "2"}]]}}
        ],
        "pictures": [
            {"self_ref": "#/pictures/0", "label": "picture", "prov": [{"page_no": 2}]}
        ]
    }"##;

    /// Build a PDF with one page per entry; empty strings give blank pages.
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}
