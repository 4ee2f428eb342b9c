//! Rich-text editing core: a free-form document tree, selection mapping that
//! survives tree mutations, format state inference and debounced undo/redo.

pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod inspect;
pub mod interpreter;
pub mod selection;
pub mod session;

pub use config::EditorConfig;
pub use document::structure::ListKind;
pub use document::style::Alignment;
pub use document::{Document, Element, Node, NodePath, Position};
pub use error::{ConfigError, MarkupError};
pub use history::{Clock, History, ManualClock, Snapshot, SystemClock};
pub use inspect::{FormatFlag, FormatState, inspect, resolve_style};
pub use interpreter::{Command, CommandInterpreter, InlineFormat, TreeInterpreter};
pub use selection::{SelectionOffsets, TreeSelection, restore_selection, save_selection};
pub use session::{EditingSession, IndentDirection, KeyDisposition};
