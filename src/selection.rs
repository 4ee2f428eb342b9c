//! Conversion between tree selections and flattened text offsets.
//!
//! Formatting commands restructure the tree, so a selection held as tree
//! positions goes stale. Offsets counted over the text in document order
//! survive any restructuring that keeps the text itself intact.

use std::ops::ControlFlow;

use crate::document::{Element, Node, NodePath, Position, node_at, node_start, visit_text};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SelectionOffsets {
    pub start: usize,
    pub end: usize,
}

impl SelectionOffsets {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn normalized(self) -> Self {
        Self::new(self.start.min(self.end), self.start.max(self.end))
    }

    pub fn is_collapsed(self) -> bool {
        self.start == self.end
    }

    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }

    pub fn len(self) -> usize {
        self.start.abs_diff(self.end)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeSelection {
    pub anchor: Position,
    pub focus: Position,
}

impl TreeSelection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(position: Position) -> Self {
        Self::new(position.clone(), position)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

pub fn text_length(root: &Element) -> usize {
    root.text_len()
}

/// Flattened offset of a boundary point, or `None` when it does not resolve
/// inside the tree.
pub fn flattened_offset(root: &Element, position: &Position) -> Option<usize> {
    if position.path.is_root() {
        if position.offset > root.children.len() {
            return None;
        }
        return Some(root.children[..position.offset].iter().map(Node::text_len).sum());
    }
    let base = node_start(root, &position.path)?;
    match node_at(root, &position.path)? {
        Node::Text(text) => {
            (position.offset <= text.chars().count()).then_some(base + position.offset)
        }
        Node::Element(element) => {
            if position.offset > element.children.len() {
                return None;
            }
            let preceding: usize = element.children[..position.offset]
                .iter()
                .map(Node::text_len)
                .sum();
            Some(base + preceding)
        }
    }
}

/// Ordered offsets of a selection given as two boundary points.
pub fn save_selection(root: &Element, anchor: &Position, focus: &Position) -> Option<SelectionOffsets> {
    let anchor = flattened_offset(root, anchor)?;
    let focus = flattened_offset(root, focus)?;
    Some(SelectionOffsets::new(anchor, focus).normalized())
}

/// Maps offsets back onto text positions in a single pre-order pass. A
/// boundary offset belongs to the earlier text node; offsets past the end
/// clamp to the end of the last text node.
pub fn restore_selection(root: &Element, offsets: SelectionOffsets) -> Option<TreeSelection> {
    let SelectionOffsets { start, end } = offsets.normalized();
    let mut counter = 0;
    let mut found_start: Option<Position> = None;
    let mut found_end: Option<Position> = None;
    let mut last: Option<Position> = None;

    let _ = visit_text(root, &mut |path: &NodePath, text: &str| {
        let len = text.chars().count();
        let next = counter + len;
        if found_start.is_none() && counter <= start && start <= next {
            found_start = Some(Position::new(path.clone(), start - counter));
        }
        if found_start.is_some() && counter <= end && end <= next {
            found_end = Some(Position::new(path.clone(), end - counter));
            return ControlFlow::Break(());
        }
        last = Some(Position::new(path.clone(), len));
        counter = next;
        ControlFlow::Continue(())
    });

    let last = last.or_else(|| found_end.clone())?;
    let anchor = found_start.unwrap_or_else(|| last.clone());
    let focus = found_end.unwrap_or(last);
    Some(TreeSelection::new(anchor, focus))
}

/// Text position of a single flattened offset.
pub fn position_at(root: &Element, offset: usize) -> Option<Position> {
    restore_selection(root, SelectionOffsets::caret(offset)).map(|selection| selection.anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::markup::parse;

    fn pos(indices: &[usize], offset: usize) -> Position {
        Position::new(NodePath::new(indices.to_vec()), offset)
    }

    #[test]
    fn caret_after_bold_text() {
        let root = parse("<p>Hello <b>World</b></p>").unwrap();
        let caret = pos(&[0, 1, 0], 5);
        assert_eq!(
            save_selection(&root, &caret, &caret),
            Some(SelectionOffsets::caret(11))
        );
        assert_eq!(
            restore_selection(&root, SelectionOffsets::caret(11)),
            Some(TreeSelection::caret(caret))
        );
    }

    #[test]
    fn backwards_selection_is_ordered() {
        let root = parse("<p>Hello <b>World</b></p>").unwrap();
        let offsets = save_selection(&root, &pos(&[0, 1, 0], 3), &pos(&[0, 0], 2));
        assert_eq!(offsets, Some(SelectionOffsets::new(2, 9)));
    }

    #[test]
    fn element_positions_count_preceding_children() {
        let root = parse("<p>ab<b>cd</b>ef</p>").unwrap();
        assert_eq!(flattened_offset(&root, &pos(&[0], 2)), Some(4));
        assert_eq!(flattened_offset(&root, &pos(&[], 1)), Some(6));
        assert_eq!(flattened_offset(&root, &pos(&[0], 4)), None);
        assert_eq!(flattened_offset(&root, &pos(&[0, 0], 3)), None);
        assert_eq!(flattened_offset(&root, &pos(&[3], 0)), None);
    }

    #[test]
    fn boundary_offsets_belong_to_the_earlier_node() {
        let root = parse("<p>ab</p><p>cd</p>").unwrap();
        assert_eq!(position_at(&root, 2), Some(pos(&[0, 0], 2)));
        assert_eq!(position_at(&root, 3), Some(pos(&[1, 0], 1)));
    }

    #[test]
    fn save_restore_save_round_trips() {
        let root = parse("<h1>Title</h1><ul><li>one</li><li>t<i>w</i>o</li></ul><p>end</p>").unwrap();
        for start in 0..=root.text_len() {
            for end in start..=root.text_len() {
                let offsets = SelectionOffsets::new(start, end);
                let restored = restore_selection(&root, offsets).unwrap();
                let saved = save_selection(&root, &restored.anchor, &restored.focus);
                assert_eq!(saved, Some(offsets));
            }
        }
    }

    #[test]
    fn offsets_past_the_end_clamp_to_last_text() {
        let root = parse("<p>Hello</p><p>World</p>").unwrap();
        let total = text_length(&root);
        let restored = restore_selection(&root, SelectionOffsets::caret(total + 100)).unwrap();
        assert_eq!(restored, TreeSelection::caret(pos(&[1, 0], 5)));
        assert_eq!(
            save_selection(&root, &restored.anchor, &restored.focus),
            Some(SelectionOffsets::caret(total))
        );
    }

    #[test]
    fn empty_paragraph_has_nothing_to_restore() {
        let root = parse("<p></p>").unwrap();
        let caret = pos(&[0], 0);
        assert_eq!(
            save_selection(&root, &caret, &caret),
            Some(SelectionOffsets::caret(0))
        );
        assert_eq!(restore_selection(&root, SelectionOffsets::caret(0)), None);
    }

    #[test]
    fn mention_text_counts_like_any_other_text() {
        let root = parse(
            "<p>hi <span class=\"mention\" contenteditable=\"false\" data-person-id=\"1\">@Al</span>\u{a0}</p>",
        )
        .unwrap();
        assert_eq!(text_length(&root), 7);
        assert_eq!(position_at(&root, 7), Some(pos(&[0, 2], 1)));
    }
}
