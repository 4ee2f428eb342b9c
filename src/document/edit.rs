use std::ops::Range;

use super::{
    Element, Node, NodePath, collect_segments, element_at, element_at_mut, node_at, node_at_mut,
    node_range, node_start,
};

/// Inline elements that carry no meaning once they are empty.
const DISPOSABLE_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "span", "font", "sub", "sup",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strip {
    /// Replace the element by its children.
    Unwrap,
    /// The element was edited in place and no longer matches.
    Keep,
}

/// Recognizes the inline elements that apply one kind of formatting.
pub trait InlineMatcher {
    fn matches(&self, element: &Element) -> bool;
    fn strip(&self, element: &mut Element) -> Strip;
}

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte_idx, _)| byte_idx)
}

fn split_text(text: &mut String, char_idx: usize) -> String {
    let byte_idx = char_to_byte_idx(text, char_idx);
    text.split_off(byte_idx)
}

/// Outermost atomic element at or above `path`.
pub fn atomic_ancestor(root: &Element, path: &NodePath) -> Option<NodePath> {
    let mut found = None;
    let mut element = root;
    let mut current = NodePath::root();
    for &idx in path.indices() {
        let Some(Node::Element(child)) = element.children.get(idx) else {
            break;
        };
        current.push(idx);
        if child.is_atomic() {
            found = Some(current.clone());
            break;
        }
        element = child;
    }
    found
}

/// Splits the text node strictly containing `offset` so that a node boundary
/// falls there. Text inside atomic elements is never split.
pub fn split_text_at(root: &mut Element, offset: usize) -> bool {
    let segments = collect_segments(root);
    let Some(segment) = segments
        .iter()
        .find(|segment| segment.start < offset && offset < segment.end())
    else {
        return false;
    };
    if atomic_ancestor(root, &segment.path).is_some() {
        return false;
    }
    let (Some(parent_path), Some(idx)) = (segment.path.parent(), segment.path.last()) else {
        return false;
    };
    let Some(parent) = element_at_mut(root, &parent_path) else {
        return false;
    };
    let Some(Node::Text(text)) = parent.children.get_mut(idx) else {
        return false;
    };
    let right = split_text(text, offset - segment.start);
    parent.children.insert(idx + 1, Node::Text(right));
    true
}

/// Splits `node` at a local flattened offset, leaving the left half in place
/// and returning the right half. Elements are split deeply, cloning their
/// shape onto the right half.
pub fn split_node(node: &mut Node, offset: usize) -> Option<Node> {
    let len = node.text_len();
    if offset == 0 || offset >= len {
        return None;
    }
    match node {
        Node::Text(text) => Some(Node::Text(split_text(text, offset))),
        Node::Element(element) => {
            if element.is_atomic() {
                return None;
            }
            split_children_at(element, offset);
            let boundary = child_boundary(&element.children, offset);
            let mut right = element.shallow_clone();
            right.children = element.children.split_off(boundary);
            Some(Node::Element(right))
        }
    }
}

fn split_children_at(element: &mut Element, offset: usize) {
    let mut start = 0;
    for idx in 0..element.children.len() {
        let len = element.children[idx].text_len();
        if start < offset && offset < start + len {
            if let Some(right) = split_node(&mut element.children[idx], offset - start) {
                element.children.insert(idx + 1, right);
            }
            return;
        }
        start += len;
    }
}

fn child_boundary(children: &[Node], offset: usize) -> usize {
    let mut start = 0;
    for (idx, child) in children.iter().enumerate() {
        if start >= offset {
            return idx;
        }
        start += child.text_len();
    }
    children.len()
}

/// Splits the children of `container` so `[lo, hi)` maps onto whole
/// children, returning their index range.
pub fn isolate_range(
    root: &mut Element,
    container: &NodePath,
    lo: usize,
    hi: usize,
) -> Option<Range<usize>> {
    let base = node_start(root, container)?;
    let element = element_at_mut(root, container)?;
    let lo = lo.checked_sub(base)?;
    let hi = hi.checked_sub(base)?;
    split_children_at(element, hi);
    split_children_at(element, lo);

    let mut start = 0;
    let mut first = None;
    let mut last = None;
    for (idx, child) in element.children.iter().enumerate() {
        let len = child.text_len();
        let end = start + len;
        let inside = start >= lo && end <= hi && (len > 0 || (start > lo && end < hi));
        if inside {
            first.get_or_insert(idx);
            last = Some(idx);
        }
        start = end;
    }
    Some(first?..last? + 1)
}

fn common_container(root: &Element, first: &NodePath, last: &NodePath) -> NodePath {
    let shared = first.common_prefix(last);
    let container = if shared == *first {
        shared.parent().unwrap_or_default()
    } else {
        shared
    };
    match atomic_ancestor(root, &container) {
        Some(atomic) => atomic.parent().unwrap_or_default(),
        None => container,
    }
}

enum Group {
    Inline(Range<usize>),
    Block { idx: usize, start: usize, end: usize },
}

fn split_inline_child_at(element: &mut Element, offset: usize) {
    let mut start = 0;
    for idx in 0..element.children.len() {
        let len = element.children[idx].text_len();
        if start < offset && offset < start + len {
            if element.children[idx].is_block() {
                return;
            }
            if let Some(right) = split_node(&mut element.children[idx], offset - start) {
                element.children.insert(idx + 1, right);
            }
            return;
        }
        start += len;
    }
}

/// Wraps the content of `[start, end)` in copies of `template`. Inline runs
/// are wrapped directly; blocks inside the range are wrapped from within so
/// block structure is preserved.
pub fn wrap_range(root: &mut Element, start: usize, end: usize, template: &Element) -> bool {
    if start >= end {
        return false;
    }
    split_text_at(root, end);
    split_text_at(root, start);
    let inside: Vec<NodePath> = collect_segments(root)
        .into_iter()
        .filter(|segment| segment.len > 0 && segment.start >= start && segment.end() <= end)
        .map(|segment| segment.path)
        .collect();
    let (Some(first), Some(last)) = (inside.first(), inside.last()) else {
        return false;
    };
    let container = common_container(root, first, last);
    wrap_within(root, &container, start, end, template)
}

fn wrap_within(
    root: &mut Element,
    container: &NodePath,
    start: usize,
    end: usize,
    template: &Element,
) -> bool {
    let Some(base) = node_start(root, container) else {
        return false;
    };
    let Some(element) = element_at_mut(root, container) else {
        return false;
    };
    let lo = start.saturating_sub(base);
    let hi = end.saturating_sub(base);
    split_inline_child_at(element, hi);
    split_inline_child_at(element, lo);

    let mut groups: Vec<Group> = Vec::new();
    let mut offset = 0;
    for (idx, child) in element.children.iter().enumerate() {
        let len = child.text_len();
        let child_start = offset;
        offset += len;
        if child.is_block() {
            if child_start.max(lo) < offset.min(hi) {
                groups.push(Group::Block {
                    idx,
                    start: base + child_start.max(lo),
                    end: base + offset.min(hi),
                });
            }
            continue;
        }
        let inside = child_start >= lo && offset <= hi && (len > 0 || (child_start > lo && offset < hi));
        if !inside {
            continue;
        }
        match groups.last_mut() {
            Some(Group::Inline(run)) if run.end == idx => run.end = idx + 1,
            _ => groups.push(Group::Inline(idx..idx + 1)),
        }
    }

    let mut changed = false;
    for group in groups.into_iter().rev() {
        match group {
            Group::Block { idx, start, end } => {
                changed |= wrap_within(root, &container.child(idx), start, end, template);
            }
            Group::Inline(run) => {
                let Some(element) = element_at_mut(root, container) else {
                    continue;
                };
                if element.children[run.clone()]
                    .iter()
                    .all(|child| child.text_len() == 0)
                {
                    continue;
                }
                let mut wrapper = template.shallow_clone();
                wrapper.children = element.children.drain(run.clone()).collect();
                element.children.insert(run.start, Node::Element(wrapper));
                changed = true;
            }
        }
    }
    changed
}

/// Removes the formatting recognized by `matcher` from `[start, end)`,
/// splitting matching elements that extend beyond the range.
pub fn unwrap_matching<M: InlineMatcher + ?Sized>(
    root: &mut Element,
    start: usize,
    end: usize,
    matcher: &M,
) -> bool {
    if start >= end {
        return false;
    }
    let mut changed = false;
    let mut budget = count_elements(root) * 2 + 1;
    while budget > 0 {
        budget -= 1;
        let Some(path) = find_overlapping(root, start, end, matcher) else {
            break;
        };
        let (Some((node_lo, node_hi)), Some(parent)) = (node_range(root, &path), path.parent())
        else {
            break;
        };
        let lo = start.max(node_lo);
        let hi = end.min(node_hi);
        let Some(range) = isolate_range(root, &parent, lo, hi) else {
            break;
        };
        let Some(parent_element) = element_at_mut(root, &parent) else {
            break;
        };
        let Some(idx) = range.clone().find(|&idx| {
            parent_element.children[idx]
                .as_element()
                .is_some_and(|element| matcher.matches(element))
        }) else {
            break;
        };
        let Some(Node::Element(target)) = parent_element.children.get_mut(idx) else {
            break;
        };
        if matcher.strip(target) == Strip::Unwrap {
            if let Node::Element(removed) = parent_element.children.remove(idx) {
                parent_element.children.splice(idx..idx, removed.children);
            }
        }
        changed = true;
    }
    changed
}

fn count_elements(element: &Element) -> usize {
    element
        .children
        .iter()
        .map(|child| match child {
            Node::Element(inner) => 1 + count_elements(inner),
            Node::Text(_) => 0,
        })
        .sum()
}

fn find_overlapping<M: InlineMatcher + ?Sized>(
    root: &Element,
    start: usize,
    end: usize,
    matcher: &M,
) -> Option<NodePath> {
    fn walk<M: InlineMatcher + ?Sized>(
        element: &Element,
        path: &mut NodePath,
        base: usize,
        range: (usize, usize),
        matcher: &M,
    ) -> Option<NodePath> {
        let mut offset = base;
        for (idx, child) in element.children.iter().enumerate() {
            let child_start = offset;
            offset += child.text_len();
            let Node::Element(inner) = child else {
                continue;
            };
            if inner.is_atomic() || child_start >= range.1 || offset <= range.0 {
                continue;
            }
            path.push(idx);
            if !inner.is_block() && matcher.matches(inner) {
                return Some(path.clone());
            }
            if let Some(found) = walk(inner, path, child_start, range, matcher) {
                return Some(found);
            }
            path.pop();
        }
        None
    }

    let mut path = NodePath::root();
    walk(root, &mut path, 0, (start, end), matcher)
}

pub fn remove_node(root: &mut Element, path: &NodePath) -> Option<Node> {
    let (parent, idx) = (path.parent()?, path.last()?);
    let element = element_at_mut(root, &parent)?;
    (idx < element.children.len()).then(|| element.children.remove(idx))
}

/// Replaces the element at `path` by its children.
pub fn unwrap_element(root: &mut Element, path: &NodePath) -> bool {
    let (Some(parent), Some(idx)) = (path.parent(), path.last()) else {
        return false;
    };
    let Some(container) = element_at_mut(root, &parent) else {
        return false;
    };
    if !matches!(container.children.get(idx), Some(Node::Element(_))) {
        return false;
    }
    if let Node::Element(removed) = container.children.remove(idx) {
        container.children.splice(idx..idx, removed.children);
    }
    true
}

/// Removes the text of `[start, end)`. Atomic elements go as a whole or not
/// at all; blocks emptied by the deletion stay in place.
pub fn delete_range(root: &mut Element, start: usize, end: usize) -> bool {
    if start >= end {
        return false;
    }
    split_text_at(root, end);
    split_text_at(root, start);
    let mut targets: Vec<NodePath> = collect_segments(root)
        .into_iter()
        .filter(|segment| segment.len > 0 && segment.start >= start && segment.end() <= end)
        .map(|segment| atomic_ancestor(root, &segment.path).unwrap_or(segment.path))
        .collect();
    targets.sort();
    targets.dedup();
    for path in targets.iter().rev() {
        remove_node(root, path);
    }
    !targets.is_empty()
}

/// First empty block that can take content, used when the document has no
/// text to anchor on.
pub fn first_empty_block(root: &Element) -> Option<NodePath> {
    fn search(element: &Element, path: &mut NodePath) -> Option<NodePath> {
        for (idx, child) in element.children.iter().enumerate() {
            let Node::Element(inner) = child else {
                continue;
            };
            path.push(idx);
            let usable = inner.is_block() && !inner.is_void() && !inner.is_list();
            if usable && inner.children.is_empty() {
                return Some(path.clone());
            }
            if let Some(found) = search(inner, path) {
                return Some(found);
            }
            path.pop();
        }
        None
    }
    search(root, &mut NodePath::root())
}

/// Container and child index where content inserted at `offset` goes. An
/// offset on a boundary attaches to the earlier text node.
pub fn insertion_point(root: &Element, offset: usize) -> (NodePath, usize) {
    let segments = collect_segments(root);
    let segment = segments
        .iter()
        .find(|segment| segment.contains(offset))
        .or(segments.last());
    let Some(segment) = segment else {
        return match first_empty_block(root) {
            Some(block) => (block, 0),
            None => (NodePath::root(), root.children.len()),
        };
    };
    let anchor = atomic_ancestor(root, &segment.path).unwrap_or_else(|| segment.path.clone());
    let parent = anchor.parent().unwrap_or_default();
    let idx = anchor.last().unwrap_or(0);
    let before = offset == segment.start && offset != segment.end();
    (parent, if before { idx } else { idx + 1 })
}

pub fn insert_nodes(root: &mut Element, offset: usize, nodes: Vec<Node>) -> bool {
    if nodes.is_empty() {
        return false;
    }
    split_text_at(root, offset);
    let (parent, idx) = insertion_point(root, offset);
    let Some(element) = element_at_mut(root, &parent) else {
        return false;
    };
    let idx = idx.min(element.children.len());
    element.children.splice(idx..idx, nodes);
    true
}

pub fn insert_text(root: &mut Element, offset: usize, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let segments = collect_segments(root);
    if let Some(segment) = segments.iter().find(|segment| segment.contains(offset)) {
        if atomic_ancestor(root, &segment.path).is_none() {
            if let Some(Node::Text(content)) = node_at_mut(root, &segment.path) {
                let byte_idx = char_to_byte_idx(content, offset - segment.start);
                content.insert_str(byte_idx, text);
                return true;
            }
        }
    }
    insert_nodes(root, offset, vec![Node::text(text)])
}

/// Drops empty text and empty formatting elements, merges adjacent text
/// and adjacent inline elements of identical shape.
pub fn normalize(element: &mut Element) {
    for child in element.children.iter_mut() {
        if let Node::Element(inner) = child {
            normalize(inner);
        }
    }

    element.children.retain(|child| match child {
        Node::Text(text) => !text.is_empty(),
        Node::Element(inner) => {
            !(inner.children.is_empty() && DISPOSABLE_TAGS.contains(&inner.tag.as_str()))
        }
    });

    let mut idx = 0;
    while idx + 1 < element.children.len() {
        if !can_merge(&element.children[idx], &element.children[idx + 1]) {
            idx += 1;
            continue;
        }
        let right = element.children.remove(idx + 1);
        match (&mut element.children[idx], right) {
            (Node::Text(left), Node::Text(right)) => left.push_str(&right),
            (Node::Element(left), Node::Element(right)) => {
                left.children.extend(right.children);
                normalize(left);
            }
            _ => {}
        }
    }
}

fn can_merge(left: &Node, right: &Node) -> bool {
    match (left, right) {
        (Node::Text(_), Node::Text(_)) => true,
        (Node::Element(left), Node::Element(right)) => {
            left.same_shape(right) && !left.is_block() && !left.is_void() && !left.is_atomic()
        }
        _ => false,
    }
}

/// Whether any inline ancestor of `path` satisfies `matcher`.
pub fn has_inline_ancestor<M: InlineMatcher + ?Sized>(
    root: &Element,
    path: &NodePath,
    matcher: &M,
) -> bool {
    if let Some(Node::Element(element)) = node_at(root, path) {
        if !element.is_block() && matcher.matches(element) {
            return true;
        }
    }
    path.ancestors().iter().any(|ancestor| {
        element_at(root, ancestor)
            .is_some_and(|element| !element.is_block() && matcher.matches(element))
    })
}

#[cfg(test)]
#[path = "edit_tests.rs"]
mod edit_tests;
