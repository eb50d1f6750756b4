pub mod events;

use std::cell::RefCell;
use std::rc::Rc;

use kuchiki::traits::TendrilSink;
use kuchiki::{parse_html, NodeRef};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("document has no {0} element")]
    MissingElement(&'static str),
}

/// Identity key for a node, valid for as long as the node is alive.
/// Used to key side tables without mutating the element itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

pub fn node_key(node: &NodeRef) -> NodeKey {
    NodeKey(Rc::as_ptr(&node.0) as usize)
}

/// A live page: a parsed HTML tree plus the URL it was loaded from.
/// The URL is what relative hrefs resolve against; it advances as the
/// engine navigates in place.
pub struct Document {
    root: NodeRef,
    base_url: RefCell<Url>,
}

impl Document {
    /// Parse a full HTML document. Parsing is permissive: the parser
    /// synthesizes missing html/head/body elements and never fails.
    pub fn parse(html: &str, base_url: Url) -> Self {
        Self {
            root: parse_html().one(html),
            base_url: RefCell::new(base_url),
        }
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    pub fn base_url(&self) -> Url {
        self.base_url.borrow().clone()
    }

    pub fn set_base_url(&self, url: Url) {
        *self.base_url.borrow_mut() = url;
    }

    pub fn resolve_href(&self, href: &str) -> Result<Url, url::ParseError> {
        self.base_url.borrow().join(href)
    }

    pub fn head(&self) -> Result<NodeRef, DomError> {
        self.select_first("head")
            .ok_or(DomError::MissingElement("head"))
    }

    pub fn body(&self) -> Result<NodeRef, DomError> {
        self.select_first("body")
            .ok_or(DomError::MissingElement("body"))
    }

    /// Style elements in the document head, in source order.
    pub fn head_styles(&self) -> Vec<NodeRef> {
        self.select_all("head style")
    }

    pub fn select_first(&self, selector: &str) -> Option<NodeRef> {
        self.root
            .select_first(selector)
            .ok()
            .map(|matched| matched.as_node().clone())
    }

    pub fn select_all(&self, selector: &str) -> Vec<NodeRef> {
        match self.root.select(selector) {
            Ok(matches) => matches.map(|matched| matched.as_node().clone()).collect(),
            Err(()) => Vec::new(),
        }
    }

    pub fn html(&self) -> String {
        serialize_node(&self.root)
    }
}

/// Serialize a node and its subtree back to HTML.
pub fn serialize_node(node: &NodeRef) -> String {
    let mut bytes = Vec::new();
    node.serialize(&mut bytes)
        .expect("serializing into a Vec cannot fail");
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Build a detached element from an HTML snippet, selecting it out of the
/// permissively parsed wrapper document.
pub fn element_from_snippet(html: &str, selector: &str) -> Option<NodeRef> {
    let parsed = parse_html().one(html);
    let node = parsed.select_first(selector).ok()?.as_node().clone();
    node.detach();
    Some(node)
}

/// Deep-clone an element subtree by serializing and reparsing it.
pub fn clone_element(node: &NodeRef) -> Option<NodeRef> {
    let name = node.as_element()?.name.local.to_string();
    element_from_snippet(&serialize_node(node), &name)
}

/// Value of an attribute on an element node.
pub fn attribute(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()?
        .attributes
        .borrow()
        .get(name)
        .map(str::to_string)
}

/// Nearest enclosing anchor (inclusive) that carries an href. Delegated
/// listeners receive the actual event target, which may be a child of the
/// anchor the markup annotated.
pub fn enclosing_anchor(node: &NodeRef) -> Option<NodeRef> {
    node.inclusive_ancestors().find(|candidate| {
        candidate.as_element().is_some_and(|element| {
            &*element.name.local == "a" && element.attributes.borrow().get("href").is_some()
        })
    })
}
