use std::fmt;

use super::edit::first_empty_block;
use super::style::Alignment;
use super::{
    Element, Node, NodePath, TextSegment, collect_segments, element_at, element_at_mut,
    find_ancestor, nearest_block,
};

/// Block tags whose element can simply be retagged by `format_block`.
const RETAGGABLE: &[&str] = &["p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "address"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::Ordered => f.write_str("ordered"),
            ListKind::Unordered => f.write_str("unordered"),
        }
    }
}

/// Text nodes a range touches. A collapsed range touches the node holding
/// the caret, preferring the earlier node on a boundary.
pub fn touched_segments(root: &Element, start: usize, end: usize) -> Vec<TextSegment> {
    let segments = collect_segments(root);
    if start < end {
        let hits: Vec<TextSegment> = segments
            .iter()
            .filter(|segment| segment.start < end && segment.end() > start)
            .cloned()
            .collect();
        if !hits.is_empty() {
            return hits;
        }
    }
    let last = segments.last().cloned();
    segments
        .into_iter()
        .find(|segment| segment.contains(start))
        .or(last)
        .into_iter()
        .collect()
}

/// Nearest blocks of the touched text, in document order.
pub fn touched_blocks(root: &Element, start: usize, end: usize) -> Vec<NodePath> {
    let segments = touched_segments(root, start, end);
    if segments.is_empty() {
        return first_empty_block(root).into_iter().collect();
    }
    let mut blocks: Vec<NodePath> = Vec::new();
    for segment in &segments {
        if let Some(block) = nearest_block(root, &segment.path) {
            if !blocks.contains(&block) {
                blocks.push(block);
            }
        }
    }
    blocks
}

/// Wraps the run of inline siblings around `idx` in `wrapper`.
fn wrap_inline_run(
    root: &mut Element,
    container: &NodePath,
    idx: usize,
    mut wrapper: Element,
) -> Option<NodePath> {
    let element = element_at_mut(root, container)?;
    if element.children.get(idx)?.is_block() {
        return None;
    }
    let mut first = idx;
    while first > 0 && !element.children[first - 1].is_block() {
        first -= 1;
    }
    let mut last = idx;
    while last + 1 < element.children.len() && !element.children[last + 1].is_block() {
        last += 1;
    }
    wrapper.children = element.children.drain(first..=last).collect();
    element.children.insert(first, Node::Element(wrapper));
    Some(container.child(first))
}

/// Puts loose inline content touched by the range into paragraphs.
pub fn ensure_blocks(root: &mut Element, start: usize, end: usize) -> bool {
    let mut changed = false;
    loop {
        let loose = touched_segments(root, start, end)
            .into_iter()
            .find(|segment| nearest_block(root, &segment.path).is_none());
        let Some(segment) = loose else {
            break;
        };
        let Some(&top) = segment.path.indices().first() else {
            break;
        };
        if wrap_inline_run(root, &NodePath::root(), top, Element::new("p")).is_none() {
            break;
        }
        changed = true;
    }
    changed
}

/// Changes the touched blocks to `tag`. Container blocks such as list items
/// keep their identity and get the inline run holding the selection wrapped.
pub fn format_block(root: &mut Element, start: usize, end: usize, tag: &str) -> bool {
    let mut changed = ensure_blocks(root, start, end);
    let blocks = touched_blocks(root, start, end);
    for block in blocks.into_iter().rev() {
        let Some(element) = element_at_mut(root, &block) else {
            continue;
        };
        if RETAGGABLE.contains(&element.tag.as_str()) {
            if element.tag != tag {
                element.tag = tag.to_string();
                changed = true;
            }
            continue;
        }
        if element.children.is_empty() {
            element.children.push(Element::new(tag).into());
            changed = true;
            continue;
        }
        let inner = touched_segments(root, start, end)
            .into_iter()
            .find(|segment| block.is_prefix_of(&segment.path))
            .and_then(|segment| segment.path.indices().get(block.len()).copied());
        if let Some(idx) = inner {
            changed |= wrap_inline_run(root, &block, idx, Element::new(tag)).is_some();
        }
    }
    changed
}

pub fn set_alignment(root: &mut Element, start: usize, end: usize, alignment: Alignment) -> bool {
    let mut changed = ensure_blocks(root, start, end);
    for block in touched_blocks(root, start, end) {
        let Some(element) = element_at_mut(root, &block) else {
            continue;
        };
        let previous = element
            .style
            .insert("text-align".to_string(), alignment.name().to_string());
        let removed = element.attributes.remove("align");
        changed |= previous.as_deref() != Some(alignment.name()) || removed.is_some();
    }
    changed
}

fn is_list_item(element: &Element) -> bool {
    element.tag == "li"
}

/// Index of the child of `parent` on the way to `path`.
fn lift_to(parent: &NodePath, path: &NodePath) -> Option<usize> {
    if !parent.is_prefix_of(path) {
        return None;
    }
    path.indices().get(parent.len()).copied()
}

/// Range of `parent`'s children that holds all `blocks`.
fn sibling_run(parent: &NodePath, blocks: &[NodePath]) -> Option<(usize, usize)> {
    let indices: Vec<usize> = blocks.iter().filter_map(|block| lift_to(parent, block)).collect();
    Some((*indices.iter().min()?, *indices.iter().max()?))
}

fn common_parent(blocks: &[NodePath]) -> Option<NodePath> {
    let first = blocks.first()?;
    let shared = blocks
        .iter()
        .fold(first.clone(), |shared, block| shared.common_prefix(block));
    if blocks.iter().any(|block| *block == shared) {
        shared.parent()
    } else {
        Some(shared)
    }
}

/// Converts block-level nodes into list items. Paragraphs become the item
/// itself; other blocks are nested inside one.
fn list_items(nodes: Vec<Node>) -> Vec<Node> {
    let mut items: Vec<Node> = Vec::new();
    let mut loose: Vec<Node> = Vec::new();
    let flush = |loose: &mut Vec<Node>, items: &mut Vec<Node>| {
        if !loose.is_empty() {
            items.push(Element::new("li").with_children(std::mem::take(loose)).into());
        }
    };
    for node in nodes {
        match node {
            Node::Element(element) if element.is_block() => {
                flush(&mut loose, &mut items);
                if matches!(element.tag.as_str(), "p" | "div") {
                    let mut item = Element::new("li").with_children(element.children);
                    item.style = element.style;
                    items.push(item.into());
                } else {
                    items.push(Element::new("li").with_child(element).into());
                }
            }
            other => loose.push(other),
        }
    }
    flush(&mut loose, &mut items);
    items
}

/// Turns a list item back into block content. Items holding blocks give up
/// their children; plain items become paragraphs.
fn unwrap_list_item(node: Node) -> Vec<Node> {
    match node {
        Node::Element(item) if is_list_item(&item) => {
            if item.children.iter().any(Node::is_block) {
                item.children
            } else {
                let mut paragraph = Element::new("p").with_children(item.children);
                paragraph.style = item.style;
                vec![paragraph.into()]
            }
        }
        other => vec![other],
    }
}

fn unwrap_list(root: &mut Element, list_path: &NodePath) -> bool {
    let (Some(parent), Some(idx)) = (list_path.parent(), list_path.last()) else {
        return false;
    };
    let Some(container) = element_at_mut(root, &parent) else {
        return false;
    };
    if !matches!(container.children.get(idx), Some(Node::Element(list)) if list.is_list()) {
        return false;
    }
    let Node::Element(list) = container.children.remove(idx) else {
        return false;
    };
    let replacement: Vec<Node> = list.children.into_iter().flat_map(unwrap_list_item).collect();
    container.children.splice(idx..idx, replacement);
    true
}

/// Toggles a list of `kind` around the touched blocks. Inside a list of the
/// same kind the list is dissolved; inside the other kind it is retagged.
pub fn toggle_list(root: &mut Element, start: usize, end: usize, kind: ListKind) -> bool {
    let wrapped = ensure_blocks(root, start, end);
    toggle_list_blocks(root, start, end, kind) || wrapped
}

fn toggle_list_blocks(root: &mut Element, start: usize, end: usize, kind: ListKind) -> bool {
    let blocks = touched_blocks(root, start, end);
    let Some(first) = blocks.first() else {
        return false;
    };

    if let Some(item) = find_ancestor(root, first, is_list_item) {
        let Some(list_path) = item.parent() else {
            return false;
        };
        let Some(list) = element_at_mut(root, &list_path) else {
            return false;
        };
        if !list.is_list() {
            return false;
        }
        if list.tag == kind.tag() {
            return unwrap_list(root, &list_path);
        }
        list.tag = kind.tag().to_string();
        return true;
    }

    let Some(parent) = common_parent(&blocks) else {
        return false;
    };
    let Some((lo, hi)) = sibling_run(&parent, &blocks) else {
        return false;
    };
    let Some(container) = element_at_mut(root, &parent) else {
        return false;
    };
    let moved: Vec<Node> = container.children.drain(lo..=hi).collect();
    let list = Element::new(kind.tag()).with_children(list_items(moved));
    container.children.insert(lo, list.into());
    true
}

/// Moves the list item at `item` under its previous sibling, reusing a
/// trailing sub-list of the same kind.
fn nest_list_item(root: &mut Element, item: &NodePath) -> bool {
    let (Some(list_path), Some(idx)) = (item.parent(), item.last()) else {
        return false;
    };
    if idx == 0 {
        return false;
    }
    let Some(list) = element_at_mut(root, &list_path) else {
        return false;
    };
    if !matches!(list.children.get(idx - 1), Some(Node::Element(previous)) if is_list_item(previous))
    {
        return false;
    }
    let list_tag = list.tag.clone();
    let moved = list.children.remove(idx);
    let Some(Node::Element(previous)) = list.children.get_mut(idx - 1) else {
        return false;
    };
    match previous.children.last_mut() {
        Some(Node::Element(sub)) if sub.tag == list_tag => sub.children.push(moved),
        _ => previous
            .children
            .push(Element::new(&list_tag).with_child(moved).into()),
    }
    true
}

pub fn indent(root: &mut Element, start: usize, end: usize) -> bool {
    let wrapped = ensure_blocks(root, start, end);
    indent_blocks(root, start, end) || wrapped
}

fn indent_blocks(root: &mut Element, start: usize, end: usize) -> bool {
    let blocks = touched_blocks(root, start, end);
    let Some(first) = blocks.first() else {
        return false;
    };
    if let Some(item) = find_ancestor(root, first, is_list_item) {
        return nest_list_item(root, &item);
    }

    let Some(parent) = common_parent(&blocks) else {
        return false;
    };
    let Some((lo, hi)) = sibling_run(&parent, &blocks) else {
        return false;
    };
    let Some(container) = element_at_mut(root, &parent) else {
        return false;
    };
    let moved: Vec<Node> = container.children.drain(lo..=hi).collect();
    container
        .children
        .insert(lo, Element::new("blockquote").with_children(moved).into());
    true
}

/// Moves a nested list item out to follow its parent item. Items after it
/// stay nested under the lifted item.
fn lift_nested_item(
    root: &mut Element,
    item: &NodePath,
    list_path: &NodePath,
    outer_item: &NodePath,
) -> bool {
    let (Some(item_idx), Some(list_idx), Some(outer_idx), Some(outer_list)) = (
        item.last(),
        list_path.last(),
        outer_item.last(),
        outer_item.parent(),
    ) else {
        return false;
    };
    let Some(list) = element_at_mut(root, list_path) else {
        return false;
    };
    if item_idx >= list.children.len() {
        return false;
    }
    let mut moved = list.children.remove(item_idx);
    let trailing: Vec<Node> = list.children.drain(item_idx..).collect();
    let shell = list.shallow_clone();
    let emptied = list.children.is_empty();

    if !trailing.is_empty() {
        if let Node::Element(lifted) = &mut moved {
            let mut sub = shell;
            sub.children = trailing;
            lifted.children.push(sub.into());
        }
    }
    if emptied {
        if let Some(outer) = element_at_mut(root, outer_item) {
            outer.children.remove(list_idx);
        }
    }
    let Some(outer_list) = element_at_mut(root, &outer_list) else {
        return false;
    };
    outer_list.children.insert(outer_idx + 1, moved);
    true
}

/// Splits a top-level list around `item`, turning the item into block content.
fn split_list_at(root: &mut Element, item: &NodePath, list_path: &NodePath) -> bool {
    let (Some(idx), Some(list_idx), Some(parent)) = (item.last(), list_path.last(), list_path.parent())
    else {
        return false;
    };
    let Some(container) = element_at_mut(root, &parent) else {
        return false;
    };
    if !matches!(container.children.get(list_idx), Some(Node::Element(list)) if idx < list.children.len())
    {
        return false;
    }
    let Node::Element(mut list) = container.children.remove(list_idx) else {
        return false;
    };
    let after = list.children.split_off(idx + 1);
    let Some(lifted) = list.children.pop() else {
        return false;
    };
    let shell = list.shallow_clone();

    let mut replacement: Vec<Node> = Vec::new();
    if !list.children.is_empty() {
        replacement.push(list.into());
    }
    replacement.extend(unwrap_list_item(lifted));
    if !after.is_empty() {
        let mut tail = shell;
        tail.children = after;
        replacement.push(tail.into());
    }
    container.children.splice(list_idx..list_idx, replacement);
    true
}

pub fn outdent(root: &mut Element, start: usize, end: usize) -> bool {
    let wrapped = ensure_blocks(root, start, end);
    outdent_blocks(root, start, end) || wrapped
}

fn outdent_blocks(root: &mut Element, start: usize, end: usize) -> bool {
    let blocks = touched_blocks(root, start, end);
    let Some(first) = blocks.first() else {
        return false;
    };

    if let Some(item) = find_ancestor(root, first, is_list_item) {
        let Some(list_path) = item.parent() else {
            return false;
        };
        let outer_item = list_path
            .parent()
            .filter(|outer| !outer.is_root())
            .filter(|outer| element_at(root, outer).is_some_and(is_list_item));
        return match outer_item {
            Some(outer_item) => lift_nested_item(root, &item, &list_path, &outer_item),
            None => split_list_at(root, &item, &list_path),
        };
    }

    match find_ancestor(root, first, |element| element.tag == "blockquote") {
        Some(quote) => super::edit::unwrap_element(root, &quote),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::markup::{parse, serialize};

    fn apply(source: &str, edit: impl FnOnce(&mut Element) -> bool) -> (bool, String) {
        let mut root = parse(source).unwrap();
        let changed = edit(&mut root);
        (changed, serialize(&root))
    }

    #[test]
    fn caret_touches_the_earlier_block_on_a_boundary() {
        let root = parse("<p>ab</p><p>cd</p>").unwrap();
        assert_eq!(touched_blocks(&root, 2, 2), vec![NodePath::new(vec![0])]);
        assert_eq!(
            touched_blocks(&root, 1, 3),
            vec![NodePath::new(vec![0]), NodePath::new(vec![1])]
        );
    }

    #[test]
    fn loose_text_gets_a_paragraph() {
        let (changed, markup) = apply("plain <b>text</b><p>x</p>", |root| ensure_blocks(root, 1, 1));
        assert!(changed);
        assert_eq!(markup, "<p>plain <b>text</b></p><p>x</p>");
    }

    #[test]
    fn outdent_reports_wrapping_loose_text() {
        let (changed, markup) = apply("loose", |root| outdent(root, 0, 0));
        assert!(changed);
        assert_eq!(markup, "<p>loose</p>");
    }

    #[test]
    fn list_toggle_over_loose_text() {
        let (changed, markup) = apply("head", |root| toggle_list(root, 0, 0, ListKind::Ordered));
        assert!(changed);
        assert_eq!(markup, "<ol><li>head</li></ol>");
    }

    #[test]
    fn format_block_retags_paragraphs() {
        let (_, markup) = apply("<p>one</p><p>two</p><p>three</p>", |root| {
            format_block(root, 1, 4, "h2")
        });
        assert_eq!(markup, "<h2>one</h2><h2>two</h2><p>three</p>");
    }

    #[test]
    fn format_block_inside_list_item_wraps_its_content() {
        let (_, markup) = apply("<ul><li>item</li></ul>", |root| format_block(root, 1, 1, "h3"));
        assert_eq!(markup, "<ul><li><h3>item</h3></li></ul>");
    }

    #[test]
    fn format_block_on_empty_paragraph() {
        let (changed, markup) = apply("<p></p>", |root| format_block(root, 0, 0, "h2"));
        assert!(changed);
        assert_eq!(markup, "<h2></h2>");
    }

    #[test]
    fn alignment_replaces_legacy_attribute() {
        let (_, markup) = apply("<p align=\"right\">x</p>", |root| {
            set_alignment(root, 0, 0, Alignment::Center)
        });
        assert_eq!(markup, "<p style=\"text-align: center;\">x</p>");
    }

    #[test]
    fn list_wraps_selected_paragraphs() {
        let (_, markup) = apply("<p>a</p><p>b</p><p>c</p>", |root| {
            toggle_list(root, 0, 2, ListKind::Unordered)
        });
        assert_eq!(markup, "<ul><li>a</li><li>b</li></ul><p>c</p>");
    }

    #[test]
    fn same_list_kind_dissolves_the_list() {
        let (_, markup) = apply("<ul><li>a</li><li>b</li></ul>", |root| {
            toggle_list(root, 0, 0, ListKind::Unordered)
        });
        assert_eq!(markup, "<p>a</p><p>b</p>");
    }

    #[test]
    fn other_list_kind_is_retagged() {
        let (_, markup) = apply("<ul><li>a</li></ul>", |root| {
            toggle_list(root, 0, 0, ListKind::Ordered)
        });
        assert_eq!(markup, "<ol><li>a</li></ol>");
    }

    #[test]
    fn indent_nests_list_item_under_previous() {
        let (changed, markup) = apply("<ul><li>a</li><li>b</li></ul>", |root| indent(root, 1, 2));
        assert!(changed);
        assert_eq!(markup, "<ul><li>a<ul><li>b</li></ul></li></ul>");
    }

    #[test]
    fn indent_first_list_item_is_a_no_op() {
        let (changed, markup) = apply("<ul><li>a</li><li>b</li></ul>", |root| indent(root, 0, 0));
        assert!(!changed);
        assert_eq!(markup, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn indent_paragraph_wraps_in_blockquote() {
        let (_, markup) = apply("<p>a</p>", |root| indent(root, 0, 0));
        assert_eq!(markup, "<blockquote><p>a</p></blockquote>");
    }

    #[test]
    fn outdent_lifts_nested_item() {
        let (_, markup) = apply("<ul><li>a<ul><li>b</li></ul></li></ul>", |root| {
            outdent(root, 2, 2)
        });
        assert_eq!(markup, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn outdent_top_level_item_splits_the_list() {
        let (_, markup) = apply("<ol><li>a</li><li>b</li><li>c</li></ol>", |root| {
            outdent(root, 2, 2)
        });
        assert_eq!(markup, "<ol><li>a</li></ol><p>b</p><ol><li>c</li></ol>");
    }

    #[test]
    fn outdent_unwraps_blockquote() {
        let (_, markup) = apply("<blockquote><p>a</p></blockquote>", |root| outdent(root, 0, 0));
        assert_eq!(markup, "<p>a</p>");
    }

    #[test]
    fn outdent_plain_paragraph_is_a_no_op() {
        let (changed, _) = apply("<p>a</p>", |root| outdent(root, 0, 0));
        assert!(!changed);
    }
}
