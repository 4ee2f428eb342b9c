use std::{collections::BTreeSet, fmt};

use crate::config::EditorConfig;
use crate::document::style::{
    Alignment, is_default_background, is_default_text_color, parse_px, primary_font_family,
};
use crate::document::{Element, Node, NodePath, element_at, node_at};
use crate::interpreter::{CommandInterpreter, InlineFormat};
use crate::selection::{TreeSelection, save_selection};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Heading,
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
}

impl FormatFlag {
    pub const ALL: [FormatFlag; 9] = [
        FormatFlag::Bold,
        FormatFlag::Italic,
        FormatFlag::Underline,
        FormatFlag::Strikethrough,
        FormatFlag::Heading,
        FormatFlag::AlignLeft,
        FormatFlag::AlignCenter,
        FormatFlag::AlignRight,
        FormatFlag::AlignJustify,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormatFlag::Bold => "bold",
            FormatFlag::Italic => "italic",
            FormatFlag::Underline => "underline",
            FormatFlag::Strikethrough => "strikethrough",
            FormatFlag::Heading => "heading",
            FormatFlag::AlignLeft => "align-left",
            FormatFlag::AlignCenter => "align-center",
            FormatFlag::AlignRight => "align-right",
            FormatFlag::AlignJustify => "align-justify",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }

    pub fn for_alignment(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Left => FormatFlag::AlignLeft,
            Alignment::Center => FormatFlag::AlignCenter,
            Alignment::Right => FormatFlag::AlignRight,
            Alignment::Justify => FormatFlag::AlignJustify,
        }
    }

    fn for_inline(format: InlineFormat) -> Self {
        match format {
            InlineFormat::Bold => FormatFlag::Bold,
            InlineFormat::Italic => FormatFlag::Italic,
            InlineFormat::Underline => FormatFlag::Underline,
            InlineFormat::Strikethrough => FormatFlag::Strikethrough,
        }
    }
}

impl fmt::Display for FormatFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the toolbar should show as active for the current selection.
///
/// `font_size_px` and `font_family` always hold a value. When nothing on the
/// selection declares one, they carry the configured defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatState {
    pub flags: BTreeSet<FormatFlag>,
    pub text_color: Option<String>,
    pub highlight_color: Option<String>,
    pub font_size_px: u32,
    pub font_family: String,
}

impl Default for FormatState {
    fn default() -> Self {
        Self::reset(&EditorConfig::default())
    }
}

impl FormatState {
    pub fn reset(config: &EditorConfig) -> Self {
        Self {
            flags: BTreeSet::new(),
            text_color: None,
            highlight_color: None,
            font_size_px: config.default_font_size,
            font_family: config.default_font_family.clone(),
        }
    }

    pub fn is_active(&self, flag: FormatFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn active_names(&self) -> Vec<&'static str> {
        self.flags.iter().map(|flag| flag.name()).collect()
    }
}

fn heading_size(level: u8) -> u32 {
    match level {
        1 => 32,
        2 => 24,
        3 => 18,
        4 => 16,
        5 => 13,
        _ => 10,
    }
}

fn text_color_of(element: &Element) -> Option<&str> {
    element
        .style_property("color")
        .or_else(|| (element.tag == "font").then(|| element.attribute("color")).flatten())
        .filter(|value| !is_default_text_color(value))
}

fn highlight_of(element: &Element) -> Option<&str> {
    element
        .style_property("background-color")
        .filter(|value| !is_default_background(value))
}

fn alignment_of(element: &Element) -> Option<Alignment> {
    element
        .style_property("text-align")
        .or_else(|| element.attribute("align"))
        .and_then(|value| value.parse().ok())
}

fn font_size_of(element: &Element) -> Option<u32> {
    element
        .style_property("font-size")
        .and_then(parse_px)
        .or_else(|| element.heading_level().map(heading_size))
}

fn font_family_of(element: &Element) -> Option<String> {
    element
        .style_property("font-family")
        .or_else(|| (element.tag == "font").then(|| element.attribute("face")).flatten())
        .and_then(primary_font_family)
}

/// Element the inspection starts from: the container of a caret, or the
/// deepest common ancestor of both ends of a range.
fn start_element(root: &Element, selection: &TreeSelection) -> NodePath {
    let path = if selection.is_collapsed() {
        selection.anchor.path.clone()
    } else {
        selection.anchor.path.common_prefix(&selection.focus.path)
    };
    match node_at(root, &path) {
        Some(Node::Text(_)) => path.parent().unwrap_or_default(),
        _ => path,
    }
}

/// Computes the format state for `selection`. The walk goes from the start
/// element up to, but not including, the document root; the nearest element
/// declaring a property wins.
pub fn inspect<I: CommandInterpreter + ?Sized>(
    root: &Element,
    selection: Option<&TreeSelection>,
    interpreter: &I,
    config: &EditorConfig,
) -> FormatState {
    let mut state = FormatState::reset(config);
    let Some(selection) = selection else {
        return state;
    };
    let Some(offsets) = save_selection(root, &selection.anchor, &selection.focus) else {
        return state;
    };

    for format in InlineFormat::ALL {
        if interpreter.query_active(root, offsets, format) {
            state.flags.insert(FormatFlag::for_inline(format));
        }
    }

    let start = start_element(root, selection);
    let mut chain = start.ancestors();
    if !start.is_root() {
        chain.insert(0, start);
    }

    let mut alignment = None;
    let mut font_size = None;
    let mut font_family = None;
    for path in &chain {
        let Some(element) = element_at(root, path) else {
            continue;
        };
        if state.text_color.is_none() {
            state.text_color = text_color_of(element).map(str::to_string);
        }
        if state.highlight_color.is_none() {
            state.highlight_color = highlight_of(element).map(str::to_string);
        }
        if element.heading_level().is_some() {
            state.flags.insert(FormatFlag::Heading);
        }
        if alignment.is_none() {
            alignment = alignment_of(element);
        }
        if font_size.is_none() {
            font_size = font_size_of(element);
        }
        if font_family.is_none() {
            font_family = font_family_of(element);
        }
    }

    if let Some(alignment) = alignment {
        state.flags.insert(FormatFlag::for_alignment(alignment));
    }
    if let Some(size) = font_size {
        state.font_size_px = size;
    }
    if let Some(family) = font_family {
        state.font_family = family;
    }
    tracing::trace!(
        target: "pure_richtext::inspect",
        flags = ?state.active_names(),
        "format state computed"
    );
    state
}

/// Value of `property` on the nearest element at or above `path`.
pub fn resolve_style(root: &Element, path: &NodePath, property: &str) -> Option<String> {
    let own = match node_at(root, path) {
        Some(Node::Element(_)) => Some(path.clone()),
        _ => None,
    };
    own.into_iter()
        .chain(path.ancestors())
        .filter_map(|ancestor| element_at(root, &ancestor))
        .find_map(|element| element.style_property(property).map(str::to_string))
}
