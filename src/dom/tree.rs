// src/dom/tree.rs
// =============================================================================
// An arena-backed document tree.
//
// Nodes live in one Vec and address each other by index (NodeId). Each node
// stores its parent index and an ordered list of child indices, so the merge
// pass gets O(1) parent and sibling lookups while mutating freely. Detached
// nodes simply stop being referenced; the arena is dropped as a whole when
// the document goes away.
//
// Construction always goes through scraper so we inherit html5ever's
// error-tolerant parsing, and scope lookup reuses scraper's CSS selector
// engine before the copy into the arena.
// =============================================================================

use crate::error::{DiffError, Result};
use ego_tree::NodeRef;
use scraper::{Html, Node as HtmlNode, Selector};

/// Index of a node inside its document's arena.
pub type NodeId = usize;

/// An element's tag name and attributes.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    /// Appends a class to the class attribute, keeping existing classes.
    pub fn add_class(&mut self, class: &str) {
        match self.attr("class") {
            Some(existing) if !existing.split_whitespace().any(|c| c == class) => {
                let merged = format!("{existing} {class}");
                self.set_attr("class", &merged);
            }
            Some(_) => {}
            None => self.set_attr("class", class),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|v| v.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// What a node is.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Doctype(String),
    Comment(String),
    Text(String),
    Element(ElementData),
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A parsed HTML document held in an arena, mutable in place.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Parses an HTML string into an arena document.
    pub fn parse(html: &str) -> Document {
        let parsed = Html::parse_document(html);
        let (doc, _) = Self::from_scraper(&parsed, None);
        doc
    }

    /// Parses an HTML string and locates the scope element named by a CSS
    /// selector. The scope is None when the selector matches nothing.
    pub fn parse_with_scope(html: &str, selector: &str) -> Result<(Document, Option<NodeId>)> {
        let parsed = Html::parse_document(html);
        let sel = Selector::parse(selector)
            .map_err(|_| DiffError::InvalidSelector(selector.to_string()))?;
        let scope = parsed.select(&sel).next().map(|el| el.id());
        Ok(Self::from_scraper(&parsed, scope))
    }

    // Copies scraper's tree into a fresh arena, translating the ego-tree id
    // of the scope element (if any) into an arena NodeId on the way.
    fn from_scraper(
        parsed: &Html,
        scope: Option<ego_tree::NodeId>,
    ) -> (Document, Option<NodeId>) {
        let mut doc = Document {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            root: 0,
        };
        let mut scope_id = None;

        // Explicit stack of (source node, arena parent); children are pushed
        // in reverse so they are created in document order
        let mut stack: Vec<(NodeRef<HtmlNode>, NodeId)> = Vec::new();
        for child in parsed.tree.root().children().collect::<Vec<_>>().into_iter().rev() {
            stack.push((child, doc.root));
        }

        while let Some((src, parent)) = stack.pop() {
            let data = match src.value() {
                HtmlNode::Doctype(d) => NodeData::Doctype(d.name().to_string()),
                HtmlNode::Comment(c) => NodeData::Comment(String::from(&**c)),
                HtmlNode::Text(t) => NodeData::Text(String::from(&**t)),
                HtmlNode::Element(el) => NodeData::Element(ElementData {
                    name: el.name().to_string(),
                    attrs: el
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                }),
                // Nested documents/fragments/processing instructions do not
                // occur in parsed page content
                _ => continue,
            };

            let id = doc.push_node(data, Some(parent));
            if Some(src.id()) == scope {
                scope_id = Some(id);
            }

            for child in src.children().collect::<Vec<_>>().into_iter().rev() {
                stack.push((child, id));
            }
        }

        (doc, scope_id)
    }

    fn push_node(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        id
    }

    // ---- queries -----------------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// The element's tag name, None for non-element nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    /// First element with the given tag name, in document order.
    pub fn find_element(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.tag_name(id) == Some(tag))
    }

    /// All nodes below `id` in document order (`id` itself excluded).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            for &c in self.nodes[n].children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Concatenated text content of `id` and everything below it.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(t) = &self.nodes[id].data {
            out.push_str(t);
        }
        for d in self.descendants(id) {
            if let NodeData::Text(t) = &self.nodes[d].data {
                out.push_str(t);
            }
        }
        out
    }

    // ---- mutation ----------------------------------------------------------

    /// Creates a detached element node.
    pub fn new_element(&mut self, name: &str) -> NodeId {
        self.push_node(NodeData::Element(ElementData::new(name)), None)
    }

    /// Creates a detached text node.
    pub fn new_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()), None)
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Inserts a detached node as the first child of `parent`.
    pub fn insert_first(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.insert(0, child);
    }

    /// Removes `id` from its parent's child list. The node (and its subtree)
    /// stays in the arena but is no longer reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }

    /// Moves all children of `from` to the end of `to`'s child list.
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let kids = std::mem::take(&mut self.nodes[from].children);
        for &k in &kids {
            self.nodes[k].parent = Some(to);
        }
        self.nodes[to].children.extend(kids);
    }

    /// Puts the detached `wrapper` where `target` was and makes `target` its
    /// only child. No-op when `target` has no parent.
    pub fn wrap(&mut self, target: NodeId, wrapper: NodeId) {
        let Some(parent) = self.nodes[target].parent else {
            return;
        };
        let Some(pos) = self.nodes[parent].children.iter().position(|&c| c == target) else {
            return;
        };
        self.nodes[parent].children[pos] = wrapper;
        self.nodes[wrapper].parent = Some(parent);
        self.nodes[wrapper].children.push(target);
        self.nodes[target].parent = Some(wrapper);
    }

    /// Replaces `id` with its own children in its parent's child list.
    pub fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id].parent else {
            return;
        };
        let Some(pos) = self.nodes[parent].children.iter().position(|&c| c == id) else {
            return;
        };
        let kids = std::mem::take(&mut self.nodes[id].children);
        for &k in &kids {
            self.nodes[k].parent = Some(parent);
        }
        self.nodes[parent].children.splice(pos..=pos, kids);
        self.nodes[id].parent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_query() {
        let doc = Document::parse("<html><body><p class=\"x\">hi <b>there</b></p></body></html>");
        let p = doc.find_element("p").unwrap();
        assert!(doc.element(p).unwrap().has_class("x"));
        assert_eq!(doc.text_content(p), "hi there");
    }

    #[test]
    fn test_parse_with_scope() {
        let html = "<html><body><div id=\"main\"><p>in</p></div><p>out</p></body></html>";
        let (doc, scope) = Document::parse_with_scope(html, "#main").unwrap();
        let scope = scope.unwrap();
        assert_eq!(doc.tag_name(scope), Some("div"));
        assert_eq!(doc.text_content(scope), "in");
    }

    #[test]
    fn test_scope_missing() {
        let (_, scope) = Document::parse_with_scope("<html><body></body></html>", "#nope").unwrap();
        assert!(scope.is_none());
    }

    #[test]
    fn test_invalid_selector() {
        assert!(Document::parse_with_scope("<html></html>", "[[[").is_err());
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let mut doc = Document::parse("<html><body><p>text</p></body></html>");
        let p = doc.find_element("p").unwrap();
        let body = doc.find_element("body").unwrap();

        let wrapper = doc.new_element("ins");
        doc.wrap(p, wrapper);
        assert_eq!(doc.children(body), &[wrapper]);
        assert_eq!(doc.children(wrapper), &[p]);
        assert_eq!(doc.parent(p), Some(wrapper));

        doc.unwrap(wrapper);
        assert_eq!(doc.children(body), &[p]);
        assert_eq!(doc.parent(p), Some(body));
    }

    #[test]
    fn test_reparent_children() {
        let mut doc = Document::parse("<html><body><i>a</i><i>b</i></body></html>");
        let body = doc.find_element("body").unwrap();
        let first = doc.children(body)[0];
        let second = doc.children(body)[1];

        doc.reparent_children(second, first);
        doc.detach(second);
        assert_eq!(doc.children(body).len(), 1);
        assert_eq!(doc.text_content(first), "ab");
    }

    #[test]
    fn test_add_class_preserves_existing() {
        let mut doc = Document::parse("<html><body><a class=\"nav\" href=\"x.html\">x</a></body></html>");
        let a = doc.find_element("a").unwrap();
        doc.element_mut(a).unwrap().add_class("link-to-diff");
        let el = doc.element(a).unwrap();
        assert!(el.has_class("nav"));
        assert!(el.has_class("link-to-diff"));

        // adding twice does not duplicate
        doc.element_mut(a).unwrap().add_class("link-to-diff");
        assert_eq!(doc.element(a).unwrap().attr("class"), Some("nav link-to-diff"));
    }
}
