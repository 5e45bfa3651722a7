//! Minimal element-tree view used by the Netscape bookmark parser.
//!
//! The parser only needs tag names, attributes, children and text, so it is
//! written against [`MarkupNode`] rather than a concrete DOM. [`DomNode`]
//! adapts html5ever's reference-counted DOM.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// A node of a parsed markup document.
pub trait MarkupNode: Clone {
    /// Tag name for element nodes, `None` for documents, text and comments.
    fn tag_name(&self) -> Option<String>;

    /// Attribute value, matched case-insensitively on the attribute name.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Child nodes in document order.
    fn children(&self) -> Vec<Self>;

    /// Text content for text nodes, `None` otherwise.
    fn text(&self) -> Option<String>;

    fn is_element(&self, tag: &str) -> bool {
        self.tag_name()
            .map(|name| name.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    /// Child nodes that are elements.
    fn element_children(&self) -> Vec<Self> {
        self.children()
            .into_iter()
            .filter(|child| child.tag_name().is_some())
            .collect()
    }

    /// Concatenated text of every descendant text node.
    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text<N: MarkupNode>(node: &N, out: &mut String) {
    if let Some(text) = node.text() {
        out.push_str(&text);
    }
    for child in node.children() {
        collect_text(&child, out);
    }
}

/// [`MarkupNode`] over an html5ever `RcDom` handle.
#[derive(Clone)]
pub struct DomNode(Handle);

impl DomNode {
    /// Parses an HTML document with the HTML5 tree builder and returns the
    /// document node. Malformed markup is repaired, never rejected.
    pub fn parse_document(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        DomNode(dom.document)
    }
}

impl MarkupNode for DomNode {
    fn tag_name(&self) -> Option<String> {
        match &self.0.data {
            NodeData::Element { name, .. } => Some(name.local.to_string()),
            _ => None,
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match &self.0.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| {
                    let local: &str = &attr.name.local;
                    local.eq_ignore_ascii_case(name)
                })
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    fn children(&self) -> Vec<Self> {
        self.0
            .children
            .borrow()
            .iter()
            .cloned()
            .map(DomNode)
            .collect()
    }

    fn text(&self) -> Option<String> {
        match &self.0.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        }
    }
}
