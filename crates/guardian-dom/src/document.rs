//! Arena-backed element tree
//!
//! Nodes are never freed. Removing a node only detaches it, so a stale
//! [`NodeId`] stays valid to inspect but is no longer [connected].
//!
//! [connected]: Document::is_connected

use scraper::{ElementRef, Html};
use url::Url;

use crate::cookies::CookieJar;
use crate::error::DomError;
use crate::Result;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A page: its element tree, location and cookies.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    location: Url,
    cookies: CookieJar,
}

impl Document {
    /// Empty `<html><head></head><body></body></html>` page at `location`.
    pub fn new(location: Url) -> Self {
        let mut doc = Self::bare(location);
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.link(doc.root, html);
        doc.link(html, head);
        doc.link(html, body);
        doc.head = head;
        doc.body = body;
        doc
    }

    /// Build a page from full-document markup.
    pub fn parse(location: Url, html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self::bare(location);
        let html_el = doc.import_element(parsed.root_element());
        doc.link(doc.root, html_el);

        // html5ever always synthesizes head and body
        doc.head = doc.first_by_tag(html_el, "head").unwrap_or(html_el);
        doc.body = doc.first_by_tag(html_el, "body").unwrap_or(html_el);
        doc
    }

    fn bare(location: Url) -> Self {
        let root = NodeId(0);
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            root,
            head: root,
            body: root,
            location,
            cookies: CookieJar::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Host name of the page, used for same-origin checks.
    pub fn host(&self) -> Option<&str> {
        self.location.host_str()
    }

    // === Cookies ===

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// What reading `document.cookie` yields.
    pub fn cookie(&self) -> String {
        self.cookies.cookie_string(&self.location)
    }

    /// One `document.cookie = value` assignment.
    pub fn set_cookie(&mut self, value: &str) {
        self.cookies.set_cookie_string(&self.location, value);
    }

    // === Construction ===

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Parse `html` the way assigning `innerHTML` on a scratch `<div>` would
    /// and return its first top-level node, detached.
    pub fn parse_fragment(&mut self, html: &str) -> Result<NodeId> {
        let trimmed = html.trim();
        if trimmed.is_empty() {
            return Err(DomError::EmptyFragment);
        }

        let fragment = Html::parse_fragment(trimmed);
        let first = fragment
            .root_element()
            .children()
            .next()
            .ok_or(DomError::EmptyFragment)?;

        match ElementRef::wrap(first) {
            Some(element) => Ok(self.import_element(element)),
            None => Err(DomError::NotAnElement),
        }
    }

    fn import_element(&mut self, element: ElementRef<'_>) -> NodeId {
        let value = element.value();
        let id = self.alloc(NodeKind::Element {
            name: value.name().to_string(),
            attrs: value
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        for child in element.children() {
            let child_id = match child.value() {
                scraper::Node::Element(_) => match ElementRef::wrap(child) {
                    Some(child_el) => self.import_element(child_el),
                    None => continue,
                },
                scraper::Node::Text(text) => self.alloc(NodeKind::Text(String::from(&**text))),
                scraper::Node::Comment(comment) => {
                    self.alloc(NodeKind::Comment(String::from(&**comment)))
                }
                _ => continue,
            };
            self.link(id, child_id);
        }

        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn unlink(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes[id.0].parent.take()?;
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings.iter().position(|c| *c == id)?;
        siblings.remove(index);
        Some((parent, index))
    }

    fn check_hierarchy(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root || self.ancestors_inclusive(parent).any(|a| a == child) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if !matches!(
            self.nodes[parent.0].kind,
            NodeKind::Document | NodeKind::Element { .. }
        ) {
            return Err(DomError::ExpectedElement(parent));
        }
        Ok(())
    }

    // === Mutation ===

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.check_hierarchy(parent, child)?;
        self.unlink(child);
        self.link(parent, child);
        Ok(child)
    }

    /// Put `new` where `old` is and detach `old`. Returns `old`.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Result<NodeId> {
        if old == new {
            return Ok(old);
        }
        let parent = self.nodes[old.0].parent.ok_or(DomError::Detached(old))?;
        self.check_hierarchy(parent, new)?;

        self.unlink(new);
        let (parent, index) = self.unlink(old).ok_or(DomError::Detached(old))?;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, new);
        Ok(old)
    }

    /// Detach `id` from its parent. Returns false if it was already detached.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.unlink(id).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => {
                match attrs.iter_mut().find(|(k, _)| k == name) {
                    Some((_, v)) => *v = value.to_string(),
                    None => attrs.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(DomError::ExpectedElement(id)),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => {
                let before = attrs.len();
                attrs.retain(|(k, _)| k != name);
                attrs.len() != before
            }
            _ => false,
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let classes = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &classes)
    }

    // === Inspection ===

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Whether `id` was allocated by this document.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id).filter(|n| self.contains(*n)), move |n| {
            self.parent(*n)
        })
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.ancestors_inclusive(id).any(|a| a == self.root)
    }

    /// Elements under `scope` in document order, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let NodeKind::Element { .. } = self.nodes[id.0].kind {
                out.push(id);
            }
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Every connected element named `tag`.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.tag_name(*id) == Some(tag))
            .collect()
    }

    fn first_by_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.tag_name(*id) == Some(tag))
    }

    pub fn find_by_attr(&self, scope: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.attr(*id, name) == Some(value))
    }

    pub fn find_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.find_by_attr(scope, "id", id)
    }

    pub fn find_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.has_class(*id, class))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            _ => {
                for child in &self.nodes[id.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Serialize `id` and its subtree back to markup.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize(id, &mut out);
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Document => {
                for child in &node.children {
                    self.serialize(*child, out);
                }
            }
            NodeKind::Text(text) => {
                let raw = node
                    .parent
                    .and_then(|p| self.tag_name(p))
                    .map(|t| t == "script" || t == "style")
                    .unwrap_or(false);
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape(text, false));
                }
            }
            NodeKind::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            NodeKind::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape(v, true));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                for child in &node.children {
                    self.serialize(*child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

fn escape(input: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
