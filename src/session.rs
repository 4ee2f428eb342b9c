use std::fmt;

use crossterm::event::KeyEvent;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::config::EditorConfig;
use crate::document::edit::{normalize, wrap_range};
use crate::document::markup::parse_fragment;
use crate::document::structure::ListKind;
use crate::document::style::{Alignment, quote_font_family};
use crate::document::{Document, Element, Node, Position, element_at, nearest_block};
use crate::history::{Clock, History, Snapshot, SystemClock};
use crate::inspect::{FormatState, inspect};
use crate::interpreter::{Command, CommandInterpreter, TreeInterpreter};
use crate::selection::{SelectionOffsets, TreeSelection, restore_selection, save_selection};

pub mod keymap;

pub use keymap::{KeyAction, KeyDisposition};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndentDirection {
    Increase,
    Decrease,
}

impl fmt::Display for IndentDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndentDirection::Increase => f.write_str("increase"),
            IndentDirection::Decrease => f.write_str("decrease"),
        }
    }
}

/// An editing session over one document.
///
/// Each command saves the selection as text offsets, lets the interpreter
/// mutate the tree, restores the selection onto the new tree, recomputes the
/// format state and schedules an undo snapshot.
pub struct EditingSession<I: CommandInterpreter = TreeInterpreter> {
    document: Document,
    selection: Option<TreeSelection>,
    offsets: Option<SelectionOffsets>,
    format: FormatState,
    history: History,
    interpreter: I,
    clock: Box<dyn Clock>,
    config: EditorConfig,
}

impl EditingSession<TreeInterpreter> {
    pub fn new(initial: Option<&str>) -> Self {
        Self::with_config(initial, EditorConfig::default())
    }

    pub fn with_config(initial: Option<&str>, config: EditorConfig) -> Self {
        Self::with_parts(initial, config, TreeInterpreter::new(), SystemClock)
    }
}

impl<I: CommandInterpreter> EditingSession<I> {
    pub fn with_interpreter(initial: Option<&str>, interpreter: I) -> Self {
        Self::with_parts(initial, EditorConfig::default(), interpreter, SystemClock)
    }

    pub fn with_parts(
        initial: Option<&str>,
        config: EditorConfig,
        interpreter: I,
        clock: impl Clock + 'static,
    ) -> Self {
        let document = load_document(initial, &config);
        let history = History::from_config(
            Snapshot::new(document.to_markup(), None),
            &config,
            clock.now(),
        );
        Self {
            document,
            selection: None,
            offsets: None,
            format: FormatState::reset(&config),
            history,
            interpreter,
            clock: Box::new(clock),
            config,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn markup(&self) -> String {
        self.document.to_markup()
    }

    pub fn selection(&self) -> Option<&TreeSelection> {
        self.selection.as_ref()
    }

    pub fn offsets(&self) -> Option<SelectionOffsets> {
        self.offsets
    }

    pub fn format_state(&self) -> &FormatState {
        &self.format
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    /// Selection change reported by the host. A selection that does not
    /// resolve inside the document clears it.
    pub fn set_selection(&mut self, anchor: Position, focus: Position) {
        let selection = TreeSelection::new(anchor, focus);
        self.offsets = save_selection(self.document.root(), &selection.anchor, &selection.focus);
        self.selection = self.offsets.map(|_| selection);
        self.interpreter.selection_changed();
        self.refresh_format();
    }

    /// Selects a flattened text range.
    pub fn select_offsets(&mut self, start: usize, end: usize) {
        self.place_selection(SelectionOffsets::new(start, end));
        self.interpreter.selection_changed();
        self.refresh_format();
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.offsets = None;
        self.interpreter.selection_changed();
        self.refresh_format();
    }

    /// Applies `bold`, `italic`, `underline`, `strikethrough`, `color` or
    /// `highlight`. Colors need a value; anything else is ignored.
    pub fn format_text(&mut self, format: &str, value: Option<&str>) -> bool {
        let command = match format.to_ascii_lowercase().as_str() {
            "bold" | "italic" | "underline" | "strikethrough" => Command::parse(format, None),
            "color" => Command::parse("foreColor", value),
            "highlight" => Command::parse("backColor", value),
            _ => None,
        };
        let Some(command) = command else {
            tracing::debug!(target: "pure_richtext::session", format, "ignored format request");
            return false;
        };
        self.run_command(command)
    }

    pub fn align_text(&mut self, alignment: Alignment) -> bool {
        self.run_command(Command::Justify(alignment))
    }

    pub fn format_list(&mut self, kind: ListKind) -> bool {
        match kind {
            ListKind::Ordered => self.run_command(Command::InsertOrderedList),
            ListKind::Unordered => self.run_command(Command::InsertUnorderedList),
        }
    }

    pub fn indent(&mut self, direction: IndentDirection) -> bool {
        match direction {
            IndentDirection::Increase => self.run_command(Command::Indent),
            IndentDirection::Decrease => self.run_command(Command::Outdent),
        }
    }

    /// Turns the block holding the selection into an `h2`, or back into a
    /// paragraph when it already is a top-level heading.
    pub fn toggle_heading(&mut self) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        let root = self.document.root();
        let is_heading = nearest_block(root, &selection.anchor.path)
            .and_then(|block| element_at(root, &block))
            .and_then(Element::heading_level)
            .is_some_and(|level| level <= 3);
        let tag = if is_heading { "p" } else { "h2" };
        self.run_command(Command::FormatBlock(tag.to_string()))
    }

    pub fn set_font_size(&mut self, px: u32) -> bool {
        if px == 0 {
            return false;
        }
        self.apply_font_style("font-size", format!("{px}px"), move |state| {
            state.font_size_px = px;
        })
    }

    pub fn set_font_family(&mut self, family: &str) -> bool {
        let name = family.trim().to_string();
        if name.is_empty() {
            return false;
        }
        let value = quote_font_family(&name);
        self.apply_font_style("font-family", value, move |state| state.font_family = name)
    }

    /// Inserts an atomic mention followed by a non-breaking space.
    pub fn insert_mention(&mut self, person_id: &str, person_name: &str) -> bool {
        let markup = format!(
            "<span class=\"mention\" contenteditable=\"false\" data-person-id=\"{}\">@{}</span>&nbsp;",
            encode_double_quoted_attribute(person_id),
            encode_text(person_name),
        );
        self.run_command(Command::InsertHtml(markup))
    }

    pub fn paste_plain_text(&mut self, text: &str) -> bool {
        self.run_command(Command::InsertText(text.to_string()))
    }

    pub fn type_text(&mut self, text: &str) -> bool {
        self.run_command(Command::InsertText(text.to_string()))
    }

    pub fn undo(&mut self) -> bool {
        self.history.flush(self.clock.now());
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.apply_snapshot(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.history.flush(self.clock.now());
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.apply_snapshot(snapshot);
        true
    }

    /// Host timer hook. Records the pending undo snapshot once it is due.
    pub fn tick(&mut self) -> bool {
        self.history.poll(self.clock.now())
    }

    pub fn next_deadline(&self) -> Option<std::time::Instant> {
        self.history.next_deadline()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyDisposition {
        let Some(action) = keymap::action_for(event) else {
            return KeyDisposition::Ignored;
        };
        tracing::trace!(target: "pure_richtext::session", ?action, "key shortcut");
        match action {
            KeyAction::Format(format) => {
                self.run_command(format.into());
            }
            KeyAction::Undo => {
                self.undo();
            }
            KeyAction::Redo => {
                self.redo();
            }
            KeyAction::OpenFormatMenu => return KeyDisposition::OpenFormatMenu,
        }
        KeyDisposition::Handled
    }

    fn saved_offsets(&self) -> Option<SelectionOffsets> {
        let selection = self.selection.as_ref()?;
        save_selection(self.document.root(), &selection.anchor, &selection.focus)
    }

    fn run_command(&mut self, command: Command) -> bool {
        let Some(offsets) = self.saved_offsets() else {
            tracing::debug!(target: "pure_richtext::session", %command, "no selection, command skipped");
            return false;
        };
        let changed = self
            .interpreter
            .execute(self.document.root_mut(), offsets, &command);
        let restore = match &command {
            Command::InsertText(text) => SelectionOffsets::caret(offsets.start + text.chars().count()),
            Command::InsertHtml(markup) => SelectionOffsets::caret(offsets.start + inserted_len(markup)),
            _ => offsets,
        };
        tracing::debug!(
            target: "pure_richtext::session",
            %command,
            changed,
            start = offsets.start,
            end = offsets.end,
            "command"
        );
        self.finish_edit(restore);
        changed
    }

    fn apply_font_style(
        &mut self,
        property: &str,
        value: String,
        record: impl FnOnce(&mut FormatState),
    ) -> bool {
        let Some(offsets) = self.saved_offsets() else {
            return false;
        };
        if offsets.is_collapsed() {
            record(&mut self.format);
            return false;
        }
        let span = Element::new("span").with_style(property, value);
        let root = self.document.root_mut();
        let changed = wrap_range(root, offsets.start, offsets.end, &span);
        if changed {
            normalize(root);
        }
        self.finish_edit(offsets);
        record(&mut self.format);
        changed
    }

    /// Serializes, restores the selection, refreshes the format state and
    /// schedules a snapshot.
    fn finish_edit(&mut self, offsets: SelectionOffsets) {
        let markup = self.document.to_markup();
        self.place_selection(offsets);
        self.refresh_format();
        self.history
            .notify_edit(markup, self.offsets, self.clock.now());
    }

    fn place_selection(&mut self, offsets: SelectionOffsets) {
        let root = self.document.root();
        let offsets = offsets.clamp(root.text_len());
        if let Some(selection) = restore_selection(root, offsets) {
            self.offsets = save_selection(root, &selection.anchor, &selection.focus);
            self.selection = Some(selection);
            return;
        }
        // Nothing to anchor on: keep the old boundary points while they resolve.
        let kept = self
            .selection
            .as_ref()
            .and_then(|selection| save_selection(root, &selection.anchor, &selection.focus));
        if kept.is_none() {
            self.selection = None;
        }
        self.offsets = kept;
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        match Document::parse(&snapshot.markup) {
            Ok(document) => self.document = document,
            Err(err) => {
                tracing::warn!(target: "pure_richtext::session", %err, "snapshot could not be restored");
                return;
            }
        }
        self.interpreter.selection_changed();
        match snapshot.selection.or(self.offsets) {
            Some(offsets) => self.place_selection(offsets),
            None => {
                self.selection = None;
                self.offsets = None;
            }
        }
        self.refresh_format();
    }

    fn refresh_format(&mut self) {
        self.format = inspect(
            self.document.root(),
            self.selection.as_ref(),
            &self.interpreter,
            &self.config,
        );
    }
}

fn inserted_len(markup: &str) -> usize {
    parse_fragment(markup)
        .map(|nodes| nodes.iter().map(Node::text_len).sum())
        .unwrap_or(0)
}

fn load_document(initial: Option<&str>, config: &EditorConfig) -> Document {
    if let Some(source) = initial.filter(|source| !source.trim().is_empty()) {
        match Document::parse(source) {
            Ok(document) => return document,
            Err(err) => {
                tracing::warn!(target: "pure_richtext::session", %err, "initial markup rejected, using placeholder");
            }
        }
    }
    Document::parse(&config.placeholder).unwrap_or_else(|err| {
        tracing::warn!(target: "pure_richtext::session", %err, "placeholder rejected, starting empty");
        Document::new()
    })
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
