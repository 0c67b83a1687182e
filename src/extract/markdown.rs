//! Markdown synthesis from normalized elements

use super::model::{ElementType, ExtractedElement};

/// Render one element according to its type
pub fn render_element(element: &ExtractedElement) -> String {
    let content = &element.content;
    match element.element_type {
        ElementType::Title => format!("# {}\n", content),
        ElementType::Header => format!("## {}\n", content),
        ElementType::Paragraph => format!("{}\n", content),
        ElementType::List => format!("- {}\n", content),
        ElementType::Table => format!("\n{}\n", content),
        ElementType::Figure => format!("![Figure]({})\n", content),
        ElementType::Caption => format!("*{}*\n", content),
    }
}

/// Render elements in order, separated by blank lines
pub fn render(elements: &[ExtractedElement]) -> String {
    elements
        .iter()
        .map(render_element)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one page section of a plain-text extraction
pub fn render_page_section(page: u32, text: &str) -> String {
    format!("## Page {}\n\n{}\n", page, text)
}
