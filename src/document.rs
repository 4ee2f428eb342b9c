use std::{collections::BTreeMap, ops::ControlFlow};

use crate::error::MarkupError;

pub mod edit;
pub mod markup;
pub mod structure;
pub mod style;

pub const ROOT_TAG: &str = "body";

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(content.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn is_block(&self) -> bool {
        self.as_element().is_some_and(Element::is_block)
    }

    /// Number of characters this node contributes to the flattened text.
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(text) => text.chars().count(),
            Node::Element(element) => element.text_len(),
        }
    }

    fn push_text_content(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.push_text_content(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.style.insert(property.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn style_property(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    /// Copy of this element without its children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            style: self.style.clone(),
            children: Vec::new(),
        }
    }

    pub fn is_block(&self) -> bool {
        BLOCK_TAGS.contains(&self.tag.as_str())
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }

    pub fn is_list(&self) -> bool {
        matches!(self.tag.as_str(), "ul" | "ol")
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// Elements the user cannot edit into, such as mentions.
    pub fn is_atomic(&self) -> bool {
        self.attribute("contenteditable")
            .is_some_and(|value| value.eq_ignore_ascii_case("false"))
    }

    /// Same tag, attributes and style, ignoring children.
    pub fn same_shape(&self, other: &Element) -> bool {
        self.tag == other.tag && self.attributes == other.attributes && self.style == other.style
    }

    pub fn text_len(&self) -> usize {
        self.children.iter().map(Node::text_len).sum()
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text_content(&mut out);
        }
        out
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    indices: Vec<usize>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn child(&self, idx: usize) -> Self {
        let mut indices = self.indices.clone();
        indices.push(idx);
        Self { indices }
    }

    pub fn push(&mut self, idx: usize) {
        self.indices.push(idx);
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.indices.pop()
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, prefix) = self.indices.split_last()?;
        Some(Self::new(prefix.to_vec()))
    }

    pub fn last(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_root(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn is_prefix_of(&self, other: &NodePath) -> bool {
        other.indices.starts_with(&self.indices)
    }

    pub fn common_prefix(&self, other: &NodePath) -> NodePath {
        let shared = self
            .indices
            .iter()
            .zip(other.indices.iter())
            .take_while(|(a, b)| a == b)
            .count();
        Self::new(self.indices[..shared].to_vec())
    }

    /// Proper ancestors of this path, nearest first, excluding the root.
    pub fn ancestors(&self) -> Vec<NodePath> {
        (1..self.indices.len())
            .rev()
            .map(|len| Self::new(self.indices[..len].to_vec()))
            .collect()
    }
}

/// A boundary point inside the tree. For text nodes `offset` counts
/// characters, for elements it counts children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub path: NodePath,
    pub offset: usize,
}

impl Position {
    pub fn new(path: NodePath, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// A text node and the flattened range it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSegment {
    pub path: NodePath,
    pub start: usize,
    pub len: usize,
}

impl TextSegment {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            root: Element::new(ROOT_TAG),
        }
    }

    pub fn from_root(root: Element) -> Self {
        Self { root }
    }

    pub fn parse(source: &str) -> Result<Self, MarkupError> {
        markup::parse(source).map(Self::from_root)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn to_markup(&self) -> String {
        markup::serialize(&self.root)
    }

    pub fn text_len(&self) -> usize {
        self.root.text_len()
    }

    pub fn text_content(&self) -> String {
        self.root.text_content()
    }
}

pub fn node_at<'a>(root: &'a Element, path: &NodePath) -> Option<&'a Node> {
    let (last, prefix) = path.indices().split_last()?;
    let parent = element_at(root, &NodePath::new(prefix.to_vec()))?;
    parent.children.get(*last)
}

pub fn node_at_mut<'a>(root: &'a mut Element, path: &NodePath) -> Option<&'a mut Node> {
    let (last, prefix) = path.indices().split_last()?;
    let parent = element_at_mut(root, &NodePath::new(prefix.to_vec()))?;
    parent.children.get_mut(*last)
}

pub fn element_at<'a>(root: &'a Element, path: &NodePath) -> Option<&'a Element> {
    let mut element = root;
    for &idx in path.indices() {
        element = element.children.get(idx)?.as_element()?;
    }
    Some(element)
}

pub fn element_at_mut<'a>(root: &'a mut Element, path: &NodePath) -> Option<&'a mut Element> {
    let mut element = root;
    for &idx in path.indices() {
        element = element.children.get_mut(idx)?.as_element_mut()?;
    }
    Some(element)
}

/// Flattened offset at which the node at `path` starts.
pub fn node_start(root: &Element, path: &NodePath) -> Option<usize> {
    let mut element = root;
    let mut total = 0;
    let indices = path.indices();
    for (depth, &idx) in indices.iter().enumerate() {
        let child = element.children.get(idx)?;
        total += element.children[..idx]
            .iter()
            .map(Node::text_len)
            .sum::<usize>();
        match child {
            Node::Element(next) => element = next,
            Node::Text(_) if depth + 1 == indices.len() => {}
            Node::Text(_) => return None,
        }
    }
    Some(total)
}

/// Flattened `[start, end)` range covered by the node at `path`.
pub fn node_range(root: &Element, path: &NodePath) -> Option<(usize, usize)> {
    let start = node_start(root, path)?;
    let len = if path.is_root() {
        root.text_len()
    } else {
        node_at(root, path)?.text_len()
    };
    Some((start, start + len))
}

/// Visits every text node in pre-order until the visitor breaks.
pub fn visit_text<'a, F>(root: &'a Element, visitor: &mut F) -> ControlFlow<()>
where
    F: FnMut(&NodePath, &'a str) -> ControlFlow<()>,
{
    let mut path = NodePath::root();
    visit_text_in(root, &mut path, visitor)
}

fn visit_text_in<'a, F>(element: &'a Element, path: &mut NodePath, visitor: &mut F) -> ControlFlow<()>
where
    F: FnMut(&NodePath, &'a str) -> ControlFlow<()>,
{
    for (idx, child) in element.children.iter().enumerate() {
        path.push(idx);
        let flow = match child {
            Node::Text(text) => visitor(path, text),
            Node::Element(inner) => visit_text_in(inner, path, visitor),
        };
        path.pop();
        flow?;
    }
    ControlFlow::Continue(())
}

pub fn collect_segments(root: &Element) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut counter = 0;
    let _ = visit_text(root, &mut |path, text| {
        let len = text.chars().count();
        segments.push(TextSegment {
            path: path.clone(),
            start: counter,
            len,
        });
        counter += len;
        ControlFlow::Continue(())
    });
    segments
}

/// Nearest block element at or above `path`, excluding the root.
pub fn nearest_block(root: &Element, path: &NodePath) -> Option<NodePath> {
    if !path.is_root() && node_at(root, path).is_some_and(Node::is_block) {
        return Some(path.clone());
    }
    path.ancestors()
        .into_iter()
        .find(|ancestor| element_at(root, ancestor).is_some_and(Element::is_block))
}

/// Nearest ancestor (or self) element satisfying `predicate`, excluding the root.
pub fn find_ancestor(
    root: &Element,
    path: &NodePath,
    predicate: impl Fn(&Element) -> bool,
) -> Option<NodePath> {
    if let Some(Node::Element(element)) = node_at(root, path) {
        if predicate(element) {
            return Some(path.clone());
        }
    }
    path.ancestors()
        .into_iter()
        .find(|ancestor| element_at(root, ancestor).is_some_and(&predicate))
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod document_tests;
