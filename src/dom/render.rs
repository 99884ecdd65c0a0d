// src/dom/render.rs
// =============================================================================
// Serializes an arena document back to an HTML string.
//
// Follows the html5ever serialization rules we depend on:
// - void elements (img, br, link, ...) are written without a closing tag
// - script/style contents are emitted raw, everything else is escaped
// - attribute values are double-quoted and escaped
// =============================================================================

use super::tree::{Document, NodeData, NodeId};

// Elements that never have children and never get a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

// Elements whose text content is not entity-escaped
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Renders the whole document, doctype included.
pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    for &child in doc.children(doc.root()) {
        render_node(doc, child, &mut out, false);
    }
    out
}

/// Renders only the children of `id` (like Element.innerHTML).
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let raw = matches!(doc.tag_name(id), Some(t) if RAW_TEXT_ELEMENTS.contains(&t));
    let mut out = String::new();
    for &child in doc.children(id) {
        render_node(doc, child, &mut out, raw);
    }
    out
}

fn render_node(doc: &Document, id: NodeId, out: &mut String, raw_text: bool) {
    match doc.data(id) {
        NodeData::Document => {
            for &child in doc.children(id) {
                render_node(doc, child, out, false);
            }
        }
        NodeData::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                push_escaped_text(text, out);
            }
        }
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                push_escaped_attr(value, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&el.name.as_str()) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
            for &child in doc.children(id) {
                render_node(doc, child, out, raw);
            }

            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

fn push_escaped_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn push_escaped_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_roundtrip_simple_page() {
        let html = "<html><head><title>t</title></head><body><p class=\"x\">hi</p></body></html>";
        let doc = Document::parse(html);
        assert_eq!(to_html(&doc), html);
    }

    #[test]
    fn test_void_element_has_no_closing_tag() {
        let doc = Document::parse("<html><body><img src=\"a.png\"></body></html>");
        let rendered = to_html(&doc);
        assert!(rendered.contains("<img src=\"a.png\">"));
        assert!(!rendered.contains("</img>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut doc = Document::parse("<html><body><p></p></body></html>");
        let p = doc.find_element("p").unwrap();
        let text = doc.new_text("a < b & c");
        doc.append(p, text);
        assert!(to_html(&doc).contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_script_content_not_escaped() {
        let html = "<html><head><script>if (a < b) { go(); }</script></head><body></body></html>";
        let doc = Document::parse(html);
        assert!(to_html(&doc).contains("if (a < b) { go(); }"));
    }

    #[test]
    fn test_inner_html() {
        let doc = Document::parse("<html><body><div><p>one</p><p>two</p></div></body></html>");
        let div = doc.find_element("div").unwrap();
        assert_eq!(inner_html(&doc, div), "<p>one</p><p>two</p>");
    }
}
