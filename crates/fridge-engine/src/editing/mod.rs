/*!
 * # Editing Core
 *
 * Structural edits on a [`Document`](crate::models::Document) and the
 * controller that drives them from host input events.
 *
 * ## Architecture Overview
 *
 * ### 1. The document tree is authoritative
 * - Every structural change (split, merge, paste, bootstrap) is applied to the
 *   tree first, then the visual surface is re-rendered from it
 * - Ordinary typing is left to the host; the next `Input` event reconstructs
 *   the tree from the surface so both sides agree again
 *
 * ### 2. Command-Based Editing
 * - Structural edits are [`Cmd`] values applied with [`apply`]
 * - A command either succeeds completely or leaves the document untouched
 * - Each successful command reports where the caret belongs afterwards
 *
 * ### 3. Positions survive re-rendering
 * - The selection is captured as `(node id, offset)` pairs before an edit and
 *   materialized again afterwards (see [`crate::selection`])
 *
 * ### 4. IME composition is never interrupted
 * - While composing, the [`Editor`] passes events straight through and
 *   reconciles once the composition ends
 *
 * ## Module Structure
 *
 * - **`block_ops`**: pure text operations on single blocks
 * - **`commands`**: `Cmd` enum and the tree mutations behind it
 * - **`controller`**: the `Editor` state machine
 * - **`events`**: input events and edit outcomes
 * - **`surface`**: the host-facing `Surface` trait and an in-memory host
 */

pub mod block_ops;
pub mod commands;
pub mod controller;
pub mod events;
pub mod surface;

pub use commands::{Cmd, apply};
pub use controller::{Editor, EditorState};
pub use events::{DocumentChanged, EditOutcome, InputEvent, Key};
pub use surface::{MemorySurface, Surface};

use crate::models::NodeId;

/// Failures of structural edits. An edit that fails leaves the document
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node id {0} appears more than once")]
    DuplicateId(NodeId),

    #[error("visual root is not a document")]
    NotADocument,

    #[error("selection cannot be located in the document")]
    SelectionUnlocatable,

    #[error("node {0} is not a text block")]
    NotTextBlock(NodeId),
}
