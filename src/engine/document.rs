//! Docling document model
//!
//! Deserializes the JSON export of a Docling `DoclingDocument` and walks its
//! body tree in reading order. Items are exposed through [`DocItem`], which
//! answers "has text" / "has bounding box" questions explicitly instead of
//! probing fields.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// JSON pointer to another node (`{"$ref": "#/texts/0"}`)
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRef {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// Bounding box as exported by Docling (left, top, right, bottom)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DocBox {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
}

/// Where an item was found in the source document
#[derive(Debug, Clone, Deserialize)]
pub struct Provenance {
    /// Page number (1-indexed)
    pub page_no: u32,
    #[serde(default)]
    pub bbox: Option<DocBox>,
}

/// Structural grouping node (body, lists, sections)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupNode {
    #[serde(default)]
    pub self_ref: String,
    #[serde(default)]
    pub children: Vec<NodeRef>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name: String,
}

/// Text-bearing item (titles, headings, paragraphs, list items, captions)
#[derive(Debug, Clone, Deserialize)]
pub struct TextNode {
    #[serde(default)]
    pub self_ref: String,
    #[serde(default)]
    pub children: Vec<NodeRef>,
    pub label: String,
    #[serde(default)]
    pub prov: Vec<Provenance>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableData {
    #[serde(default)]
    pub num_rows: usize,
    #[serde(default)]
    pub num_cols: usize,
    #[serde(default)]
    pub grid: Vec<Vec<TableCell>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableNode {
    #[serde(default)]
    pub self_ref: String,
    #[serde(default)]
    pub children: Vec<NodeRef>,
    pub label: String,
    #[serde(default)]
    pub prov: Vec<Provenance>,
    #[serde(default)]
    pub data: TableData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PictureNode {
    #[serde(default)]
    pub self_ref: String,
    #[serde(default)]
    pub children: Vec<NodeRef>,
    pub label: String,
    #[serde(default)]
    pub prov: Vec<Provenance>,
}

/// A converted document as exported by `docling --to json`
#[derive(Debug, Clone, Deserialize)]
pub struct DoclingDocument {
    #[serde(default)]
    pub name: String,
    pub body: GroupNode,
    #[serde(default)]
    pub groups: Vec<GroupNode>,
    #[serde(default)]
    pub texts: Vec<TextNode>,
    #[serde(default)]
    pub tables: Vec<TableNode>,
    #[serde(default)]
    pub pictures: Vec<PictureNode>,
}

/// Resolved target of a [`NodeRef`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Target {
    Body,
    Group(usize),
    Text(usize),
    Table(usize),
    Picture(usize),
}

impl Target {
    fn parse(reference: &str) -> Option<Self> {
        let path = reference.strip_prefix("#/")?;
        if path == "body" {
            return Some(Target::Body);
        }
        let (collection, index) = path.split_once('/')?;
        let index: usize = index.parse().ok()?;
        match collection {
            "groups" => Some(Target::Group(index)),
            "texts" => Some(Target::Text(index)),
            "tables" => Some(Target::Table(index)),
            "pictures" => Some(Target::Picture(index)),
            _ => None,
        }
    }
}

/// Borrowed view of one content item of a [`DoclingDocument`]
#[derive(Debug, Clone, Copy)]
pub enum DocItem<'a> {
    Text(&'a TextNode),
    Table(&'a TableNode),
    Picture(&'a PictureNode),
}

impl<'a> DocItem<'a> {
    /// Docling's label for the item (e.g. "title", "text", "table")
    pub fn label(&self) -> &'a str {
        match self {
            DocItem::Text(node) => &node.label,
            DocItem::Table(node) => &node.label,
            DocItem::Picture(node) => &node.label,
        }
    }

    pub fn self_ref(&self) -> &'a str {
        match self {
            DocItem::Text(node) => &node.self_ref,
            DocItem::Table(node) => &node.self_ref,
            DocItem::Picture(node) => &node.self_ref,
        }
    }

    /// Text payload; only text items carry one
    pub fn text(&self) -> Option<&'a str> {
        match self {
            DocItem::Text(node) => Some(&node.text),
            DocItem::Table(_) | DocItem::Picture(_) => None,
        }
    }

    fn provenance(&self) -> Option<&'a Provenance> {
        match self {
            DocItem::Text(node) => node.prov.first(),
            DocItem::Table(node) => node.prov.first(),
            DocItem::Picture(node) => node.prov.first(),
        }
    }

    /// Page the item starts on, if the engine reported one
    pub fn page_no(&self) -> Option<u32> {
        self.provenance().map(|p| p.page_no).filter(|&p| p > 0)
    }

    pub fn bbox(&self) -> Option<DocBox> {
        self.provenance().and_then(|p| p.bbox)
    }
}

impl fmt::Display for DocItem<'_> {
    /// String form used when an item has no text: tables render their grid
    /// as a Markdown table, pictures their document reference.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocItem::Text(node) => f.write_str(&node.text),
            DocItem::Table(node) => write_grid(f, &node.data.grid),
            DocItem::Picture(node) => f.write_str(&node.self_ref),
        }
    }
}

fn write_grid(f: &mut fmt::Formatter<'_>, grid: &[Vec<TableCell>]) -> fmt::Result {
    for (row_index, row) in grid.iter().enumerate() {
        let cells: Vec<&str> = row.iter().map(|cell| cell.text.trim()).collect();
        writeln!(f, "| {} |", cells.join(" | "))?;
        if row_index == 0 {
            writeln!(f, "|{}", "---|".repeat(row.len().max(1)))?;
        }
    }
    Ok(())
}

impl DoclingDocument {
    /// Parse a Docling JSON export
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Read a Docling JSON export from disk
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::EngineFailed {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json(&data)
    }

    /// Content items in reading order.
    ///
    /// Depth-first from `body`; groups are descended into but not yielded.
    /// Unresolvable or repeated references are skipped.
    pub fn iterate_items(&self) -> Vec<DocItem<'_>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<Target> = vec![Target::Body];

        while let Some(target) = stack.pop() {
            if !visited.insert(target) {
                continue;
            }

            let children = match target {
                Target::Body => &self.body.children,
                Target::Group(i) => match self.groups.get(i) {
                    Some(group) => &group.children,
                    None => continue,
                },
                Target::Text(i) => match self.texts.get(i) {
                    Some(node) => {
                        items.push(DocItem::Text(node));
                        &node.children
                    }
                    None => continue,
                },
                Target::Table(i) => match self.tables.get(i) {
                    Some(node) => {
                        items.push(DocItem::Table(node));
                        &node.children
                    }
                    None => continue,
                },
                Target::Picture(i) => match self.pictures.get(i) {
                    Some(node) => {
                        items.push(DocItem::Picture(node));
                        &node.children
                    }
                    None => continue,
                },
            };

            for child in children.iter().rev() {
                match Target::parse(&child.reference) {
                    Some(t) => stack.push(t),
                    None => {
                        tracing::warn!(reference = %child.reference, "skipping unresolvable reference")
                    }
                }
            }
        }

        items
    }
}
