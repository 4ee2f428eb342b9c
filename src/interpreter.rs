//! The boundary between the editing session and whatever executes editing
//! commands against the document tree.

use std::{collections::BTreeMap, fmt};

use crate::document::edit::{
    self, InlineMatcher, Strip, delete_range, has_inline_ancestor, insert_nodes, normalize,
    unwrap_matching, wrap_range,
};
use crate::document::markup::parse_fragment;
use crate::document::structure::{
    ListKind, format_block, indent, outdent, set_alignment, toggle_list, touched_segments,
};
use crate::document::style::{Alignment, decoration_has, decoration_without, is_bold_weight};
use crate::document::{Element, Node};
use crate::selection::SelectionOffsets;

/// Block tags accepted by `formatBlock`.
const BLOCK_FORMATS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "pre",
    "blockquote",
    "address",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InlineFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl InlineFormat {
    pub const ALL: [InlineFormat; 4] = [
        InlineFormat::Bold,
        InlineFormat::Italic,
        InlineFormat::Underline,
        InlineFormat::Strikethrough,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InlineFormat::Bold => "bold",
            InlineFormat::Italic => "italic",
            InlineFormat::Underline => "underline",
            InlineFormat::Strikethrough => "strikethrough",
        }
    }

    /// Tag written when the format is applied.
    pub fn tag(self) -> &'static str {
        match self {
            InlineFormat::Bold => "b",
            InlineFormat::Italic => "i",
            InlineFormat::Underline => "u",
            InlineFormat::Strikethrough => "s",
        }
    }

    fn tags(self) -> &'static [&'static str] {
        match self {
            InlineFormat::Bold => &["b", "strong"],
            InlineFormat::Italic => &["i", "em"],
            InlineFormat::Underline => &["u", "ins"],
            InlineFormat::Strikethrough => &["s", "strike", "del"],
        }
    }

    fn style_property(self) -> &'static str {
        match self {
            InlineFormat::Bold => "font-weight",
            InlineFormat::Italic => "font-style",
            InlineFormat::Underline | InlineFormat::Strikethrough => "text-decoration",
        }
    }

    fn style_matches(self, value: &str) -> bool {
        match self {
            InlineFormat::Bold => is_bold_weight(value),
            InlineFormat::Italic => {
                matches!(value.trim().to_ascii_lowercase().as_str(), "italic" | "oblique")
            }
            InlineFormat::Underline => decoration_has(value, "underline"),
            InlineFormat::Strikethrough => decoration_has(value, "line-through"),
        }
    }
}

impl fmt::Display for InlineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl InlineMatcher for InlineFormat {
    fn matches(&self, element: &Element) -> bool {
        if self.tags().contains(&element.tag.as_str()) {
            return true;
        }
        element
            .style_property(self.style_property())
            .is_some_and(|value| self.style_matches(value))
    }

    fn strip(&self, element: &mut Element) -> Strip {
        if self.tags().contains(&element.tag.as_str()) {
            return Strip::Unwrap;
        }
        let property = self.style_property();
        let remaining = match (self, element.style_property(property)) {
            (InlineFormat::Underline, Some(value)) => decoration_without(value, "underline"),
            (InlineFormat::Strikethrough, Some(value)) => decoration_without(value, "line-through"),
            _ => None,
        };
        match remaining {
            Some(value) => {
                element.style.insert(property.to_string(), value);
            }
            None => {
                element.style.remove(property);
            }
        }
        let bare = matches!(element.tag.as_str(), "span" | "font")
            && element.style.is_empty()
            && element.attributes.is_empty();
        if bare { Strip::Unwrap } else { Strip::Keep }
    }
}

/// An editing command understood by a [`CommandInterpreter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    ForeColor(String),
    BackColor(String),
    InsertOrderedList,
    InsertUnorderedList,
    Indent,
    Outdent,
    FormatBlock(String),
    InsertHtml(String),
    InsertText(String),
    Justify(Alignment),
}

impl Command {
    /// Builds a command from its conventional name. Returns `None` for
    /// unknown names and for commands missing a required value.
    pub fn parse(name: &str, value: Option<&str>) -> Option<Self> {
        let value = value.map(str::to_string);
        let command = match name.to_ascii_lowercase().as_str() {
            "bold" => Command::Bold,
            "italic" => Command::Italic,
            "underline" => Command::Underline,
            "strikethrough" => Command::Strikethrough,
            "forecolor" => Command::ForeColor(value.filter(|v| !v.trim().is_empty())?),
            "backcolor" | "hilitecolor" => {
                Command::BackColor(value.filter(|v| !v.trim().is_empty())?)
            }
            "insertorderedlist" => Command::InsertOrderedList,
            "insertunorderedlist" => Command::InsertUnorderedList,
            "indent" => Command::Indent,
            "outdent" => Command::Outdent,
            "formatblock" => {
                let tag = value?
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_ascii_lowercase();
                if !BLOCK_FORMATS.contains(&tag.as_str()) {
                    return None;
                }
                Command::FormatBlock(tag)
            }
            "inserthtml" => Command::InsertHtml(value?),
            "inserttext" => Command::InsertText(value?),
            "justifyleft" => Command::Justify(Alignment::Left),
            "justifycenter" => Command::Justify(Alignment::Center),
            "justifyright" => Command::Justify(Alignment::Right),
            "justifyfull" => Command::Justify(Alignment::Justify),
            _ => return None,
        };
        Some(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Bold => "bold",
            Command::Italic => "italic",
            Command::Underline => "underline",
            Command::Strikethrough => "strikethrough",
            Command::ForeColor(_) => "foreColor",
            Command::BackColor(_) => "backColor",
            Command::InsertOrderedList => "insertOrderedList",
            Command::InsertUnorderedList => "insertUnorderedList",
            Command::Indent => "indent",
            Command::Outdent => "outdent",
            Command::FormatBlock(_) => "formatBlock",
            Command::InsertHtml(_) => "insertHTML",
            Command::InsertText(_) => "insertText",
            Command::Justify(Alignment::Left) => "justifyLeft",
            Command::Justify(Alignment::Center) => "justifyCenter",
            Command::Justify(Alignment::Right) => "justifyRight",
            Command::Justify(Alignment::Justify) => "justifyFull",
        }
    }

    pub fn inline_format(&self) -> Option<InlineFormat> {
        match self {
            Command::Bold => Some(InlineFormat::Bold),
            Command::Italic => Some(InlineFormat::Italic),
            Command::Underline => Some(InlineFormat::Underline),
            Command::Strikethrough => Some(InlineFormat::Strikethrough),
            _ => None,
        }
    }
}

impl From<InlineFormat> for Command {
    fn from(format: InlineFormat) -> Self {
        match format {
            InlineFormat::Bold => Command::Bold,
            InlineFormat::Italic => Command::Italic,
            InlineFormat::Underline => Command::Underline,
            InlineFormat::Strikethrough => Command::Strikethrough,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Executes editing commands against a document tree.
pub trait CommandInterpreter {
    /// Applies `command` to the content covered by `range`. Returns whether
    /// the tree changed.
    fn execute(&mut self, root: &mut Element, range: SelectionOffsets, command: &Command) -> bool;

    /// Whether `format` is active for `range`.
    fn query_active(&self, root: &Element, range: SelectionOffsets, format: InlineFormat) -> bool;

    /// Called whenever the host moves the selection.
    fn selection_changed(&mut self) {}
}

/// Executes commands by editing the tree directly.
#[derive(Clone, Debug, Default)]
pub struct TreeInterpreter {
    pending: BTreeMap<InlineFormat, bool>,
}

impl TreeInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typing styles toggled at a caret, waiting for the next inserted text.
    pub fn pending_formats(&self) -> impl Iterator<Item = (InlineFormat, bool)> + '_ {
        self.pending.iter().map(|(format, on)| (*format, *on))
    }

    fn toggle_inline(
        &mut self,
        root: &mut Element,
        range: SelectionOffsets,
        format: InlineFormat,
    ) -> bool {
        let active = self.query_active(root, range, format);
        if range.is_collapsed() {
            if format_in_tree(root, range, format) == !active {
                self.pending.remove(&format);
            } else {
                self.pending.insert(format, !active);
            }
            return false;
        }
        let SelectionOffsets { start, end } = range;
        let removed = unwrap_matching(root, start, end, &format);
        if active {
            return removed;
        }
        wrap_range(root, start, end, &Element::new(format.tag())) || removed
    }

    fn insert_text(&mut self, root: &mut Element, range: SelectionOffsets, text: &str) -> bool {
        let deleted = delete_range(root, range.start, range.end);
        if !edit::insert_text(root, range.start, text) {
            return deleted;
        }
        let end = range.start + text.chars().count();
        for (format, on) in std::mem::take(&mut self.pending) {
            unwrap_matching(root, range.start, end, &format);
            if on {
                wrap_range(root, range.start, end, &Element::new(format.tag()));
            }
        }
        true
    }

    fn insert_html(&mut self, root: &mut Element, range: SelectionOffsets, markup: &str) -> bool {
        let nodes: Vec<Node> = match parse_fragment(markup) {
            Ok(nodes) => nodes,
            Err(err) => {
                tracing::warn!(target: "pure_richtext::interpreter", %err, "rejected inserted markup");
                return false;
            }
        };
        let deleted = delete_range(root, range.start, range.end);
        insert_nodes(root, range.start, nodes) || deleted
    }
}

fn format_in_tree(root: &Element, range: SelectionOffsets, format: InlineFormat) -> bool {
    let segments = touched_segments(root, range.start, range.end);
    !segments.is_empty()
        && segments
            .iter()
            .all(|segment| has_inline_ancestor(root, &segment.path, &format))
}

impl CommandInterpreter for TreeInterpreter {
    fn execute(&mut self, root: &mut Element, range: SelectionOffsets, command: &Command) -> bool {
        let range = range.normalized().clamp(root.text_len());
        let SelectionOffsets { start, end } = range;
        let changed = match command {
            Command::Bold | Command::Italic | Command::Underline | Command::Strikethrough => {
                match command.inline_format() {
                    Some(format) => self.toggle_inline(root, range, format),
                    None => false,
                }
            }
            Command::ForeColor(color) => {
                wrap_range(root, start, end, &Element::new("span").with_style("color", color.as_str()))
            }
            Command::BackColor(color) => wrap_range(
                root,
                start,
                end,
                &Element::new("span").with_style("background-color", color.as_str()),
            ),
            Command::InsertOrderedList => toggle_list(root, start, end, ListKind::Ordered),
            Command::InsertUnorderedList => toggle_list(root, start, end, ListKind::Unordered),
            Command::Indent => indent(root, start, end),
            Command::Outdent => outdent(root, start, end),
            Command::FormatBlock(tag) => format_block(root, start, end, tag),
            Command::Justify(alignment) => set_alignment(root, start, end, *alignment),
            Command::InsertHtml(markup) => self.insert_html(root, range, markup),
            Command::InsertText(text) => self.insert_text(root, range, text),
        };
        if changed {
            normalize(root);
        }
        tracing::trace!(
            target: "pure_richtext::interpreter",
            command = command.name(),
            start,
            end,
            changed,
            "executed"
        );
        changed
    }

    fn query_active(&self, root: &Element, range: SelectionOffsets, format: InlineFormat) -> bool {
        let range = range.normalized();
        if range.is_collapsed() {
            if let Some(on) = self.pending.get(&format) {
                return *on;
            }
        }
        format_in_tree(root, range, format)
    }

    fn selection_changed(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod interpreter_tests;
