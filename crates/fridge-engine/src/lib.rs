pub mod editing;
pub mod io;
pub mod models;
pub mod search;
pub mod selection;
pub mod text;
pub mod visual;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{
    Cmd, DocumentChanged, EditError, EditOutcome, Editor, EditorState, InputEvent, Key,
    MemorySurface, Surface,
};
pub use io::{
    IoError, StateBackup, load_editor_state, read_document, save_editor_state, write_document,
};
pub use models::*;
pub use search::{FoundSpan, MarkupOptions, Query, SearchError, SearchResult, search};
pub use selection::{Position, SerializedSelection, VisualPoint, VisualRange, locate, materialize};
pub use visual::{Element, VisualNode, reconstruct, render};
