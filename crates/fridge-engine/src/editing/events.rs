use crate::models::NodeId;
use crate::selection::SerializedSelection;

/// Key identity as reported by the host on key-down
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Delete,
    /// A printable character
    Char(char),
    /// Anything else (arrows, modifiers, function keys)
    Other,
}

/// Native input events, in the order the host delivers them
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    /// The host has changed the surface content (typing, default deletion)
    Input,
    Paste(String),
    CompositionStart,
    CompositionEnd,
}

/// Result of handling one input event.
///
/// The controller's counterpart of an edit patch: it tells the host whether
/// to run its own default behaviour, and whether the document moved on.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EditOutcome {
    /// The host must not apply its default handling for this event
    pub prevent_default: bool,
    /// The document was mutated
    pub changed: bool,
    /// Document version after the event
    pub version: u64,
    /// Selection restored after the edit, if the controller placed one
    pub selection: Option<SerializedSelection>,
}

impl EditOutcome {
    pub(crate) fn pass_through(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub(crate) fn suppressed(version: u64) -> Self {
        Self {
            prevent_default: true,
            version,
            ..Self::default()
        }
    }
}

/// Delivered to subscribers after every committed mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentChanged {
    pub document_id: NodeId,
    pub version: u64,
}
