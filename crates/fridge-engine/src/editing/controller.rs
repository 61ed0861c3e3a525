//! The edit controller: turns host input events into document edits.
//!
//! ```text
//!            CompositionStart
//!   Idle  ─────────────────────▶  Composing
//!    ▲                               │
//!    └─────── CompositionEnd ────────┘   (reconcile from the surface)
//! ```
//!
//! While `Idle`, Enter, multi-line paste, selection deletes and block merges
//! are structural: the controller suppresses the host default, edits the
//! document, re-renders the whole surface and puts the caret back. Anything
//! else is left to the host and picked up by the next `Input` event, which
//! rebuilds the document from the surface. While `Composing` nothing is
//! interpreted; the IME owns the content until it finishes.

use crate::editing::commands::{Cmd, apply};
use crate::editing::events::{DocumentChanged, EditOutcome, InputEvent, Key};
use crate::editing::surface::Surface;
use crate::editing::EditError;
use crate::models::{Block, Document};
use crate::selection::{Position, SerializedSelection, capture_selection, restore_selection};
use crate::text::{normalize_newlines, utf16_len};
use crate::visual::{reconstruct, render};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Idle,
    Composing,
}

type Observer = Box<dyn FnMut(&DocumentChanged)>;

/// Owns one document and keeps it in step with a [`Surface`]
pub struct Editor<S: Surface> {
    document: Document,
    surface: S,
    state: EditorState,
    version: u64,
    observers: Vec<Observer>,
}

impl<S: Surface> Editor<S> {
    /// Take ownership of `document` and render it onto `surface`
    pub fn new(document: Document, mut surface: S) -> Self {
        surface.replace_root(render(&document));
        Self {
            document,
            surface,
            state: EditorState::Idle,
            version: 0,
            observers: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Host access to the surface, for default editing and caret moves
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Current selection in logical terms
    pub fn selection(&self) -> Option<SerializedSelection> {
        self.capture().ok()
    }

    /// Register a callback run synchronously after every committed mutation
    pub fn subscribe(&mut self, observer: impl FnMut(&DocumentChanged) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Handle one host input event
    pub fn handle(&mut self, event: InputEvent) -> EditOutcome {
        match (self.state, event) {
            (_, InputEvent::CompositionStart) => {
                log::debug!("composition started");
                self.state = EditorState::Composing;
                EditOutcome::pass_through(self.version)
            }
            (_, InputEvent::CompositionEnd) => {
                log::debug!("composition ended");
                self.state = EditorState::Idle;
                self.reconcile()
            }
            (EditorState::Composing, _) => EditOutcome::pass_through(self.version),
            (EditorState::Idle, InputEvent::KeyDown(key)) => self.key_down(key),
            (EditorState::Idle, InputEvent::Input) => self.reconcile(),
            (EditorState::Idle, InputEvent::Paste(text)) => self.paste(&text),
        }
    }

    fn key_down(&mut self, key: Key) -> EditOutcome {
        if self.document.to_plain().is_empty() {
            return self.bootstrap(key);
        }

        match key {
            Key::Enter => self.enter(),
            Key::Backspace => self.backspace(),
            Key::Delete => self.delete_forward(),
            Key::Char(_) => {
                // Typing over a multi-block selection: clear it structurally,
                // then let the host insert the character at the join point
                match self.capture() {
                    Ok(selection) if selection.is_multi_block() => {
                        let mut outcome = self.delete_selection(selection);
                        outcome.prevent_default = false;
                        outcome
                    }
                    _ => EditOutcome::pass_through(self.version),
                }
            }
            Key::Other => EditOutcome::pass_through(self.version),
        }
    }

    /// Seed an empty document, then handle the key against the new blocks
    fn bootstrap(&mut self, key: Key) -> EditOutcome {
        let seeded = match self.capture() {
            Ok(_) => self.run(|doc, _| apply(doc, Cmd::Bootstrap)),
            // No block left to hold a caret: seed anyway and start in the heading
            Err(_) => {
                let mut working = self.document.clone();
                match apply(&mut working, Cmd::Bootstrap) {
                    Ok(caret) => self.commit(working, caret),
                    Err(e) => {
                        log::warn!("bootstrap failed: {e}");
                        EditOutcome::suppressed(self.version)
                    }
                }
            }
        };
        if !seeded.changed {
            return seeded;
        }
        let followup = match key {
            Key::Enter => self.enter(),
            Key::Char(c) => self.run(|doc, selection| {
                apply(
                    doc,
                    Cmd::InsertText {
                        at: selection.start.clone(),
                        text: c.to_string(),
                    },
                )
            }),
            Key::Backspace | Key::Delete | Key::Other => seeded,
        };
        EditOutcome {
            prevent_default: true,
            changed: true,
            ..followup
        }
    }

    fn enter(&mut self) -> EditOutcome {
        self.run(|doc, selection| {
            let at = if selection.is_degenerate() {
                selection.start.clone()
            } else {
                apply(
                    doc,
                    Cmd::DeleteSelection {
                        selection: selection.clone(),
                    },
                )?
            };
            apply(doc, Cmd::SplitBlock { at })
        })
    }

    fn delete_selection(&mut self, selection: SerializedSelection) -> EditOutcome {
        self.run(move |doc, _| apply(doc, Cmd::DeleteSelection { selection }))
    }

    fn backspace(&mut self) -> EditOutcome {
        let Ok(selection) = self.capture() else {
            return EditOutcome::pass_through(self.version);
        };
        if !selection.is_degenerate() {
            return self.delete_selection(selection);
        }
        if selection.start.offset > 0 {
            return EditOutcome::pass_through(self.version);
        }

        // Start of a block: join it onto the previous text block
        let current = &selection.start;
        let Some(index) = self.document.index_of(&current.node_id) else {
            return EditOutcome::suppressed(self.version);
        };
        let prev = index.checked_sub(1).and_then(|i| self.document.blocks().get(i));
        match (prev, self.document.blocks()[index].is_text()) {
            (Some(prev), true) if prev.is_text() => {
                let join = SerializedSelection::new(end_of(prev), current.clone());
                self.delete_selection(join)
            }
            _ => EditOutcome::suppressed(self.version),
        }
    }

    fn delete_forward(&mut self) -> EditOutcome {
        let Ok(selection) = self.capture() else {
            return EditOutcome::pass_through(self.version);
        };
        if !selection.is_degenerate() {
            return self.delete_selection(selection);
        }

        // End of a block: pull the next text block up into this one
        let current = &selection.start;
        let Some(index) = self.document.index_of(&current.node_id) else {
            return EditOutcome::pass_through(self.version);
        };
        let block = &self.document.blocks()[index];
        let at_end = block
            .text()
            .is_some_and(|text| current.offset >= utf16_len(text));
        match self.document.blocks().get(index + 1) {
            Some(next) if at_end && next.is_text() => {
                let join = SerializedSelection::new(
                    current.clone(),
                    Position::new(next.id().clone(), 0),
                );
                self.delete_selection(join)
            }
            // End of the last block, or an image follows: nothing to pull up
            _ if at_end => EditOutcome::suppressed(self.version),
            _ => EditOutcome::pass_through(self.version),
        }
    }

    fn paste(&mut self, text: &str) -> EditOutcome {
        let text = normalize_newlines(text);
        if !text.contains('\n') {
            return EditOutcome::pass_through(self.version);
        }
        self.run(|doc, selection| {
            let at = if selection.is_degenerate() {
                selection.start.clone()
            } else {
                apply(
                    doc,
                    Cmd::DeleteSelection {
                        selection: selection.clone(),
                    },
                )?
            };
            apply(
                doc,
                Cmd::InsertText {
                    at,
                    text: text.into_owned(),
                },
            )
        })
    }

    /// Capture the selection, run `edit` on a copy of the document and commit
    /// it only if every step succeeded
    fn run<F>(&mut self, edit: F) -> EditOutcome
    where
        F: FnOnce(&mut Document, &SerializedSelection) -> Result<Position, EditError>,
    {
        let result = self.capture().and_then(|selection| {
            let mut working = self.document.clone();
            let caret = edit(&mut working, &selection)?;
            Ok((working, caret))
        });

        match result {
            Ok((document, caret)) => self.commit(document, caret),
            Err(e) => {
                log::debug!("edit dropped: {e}");
                EditOutcome::suppressed(self.version)
            }
        }
    }

    fn capture(&self) -> Result<SerializedSelection, EditError> {
        self.surface
            .selection()
            .and_then(|range| capture_selection(self.surface.root(), &range))
            .ok_or(EditError::SelectionUnlocatable)
    }

    fn commit(&mut self, document: Document, caret: Position) -> EditOutcome {
        if let Err(e) = document.validate_ids() {
            log::error!("committing document with broken identity: {e}");
        }
        self.document = document;
        let selection = self.publish(SerializedSelection::collapsed(caret));

        EditOutcome {
            prevent_default: true,
            changed: true,
            version: self.version,
            selection,
        }
    }

    /// Rebuild the document from what the host has put on the surface
    fn reconcile(&mut self) -> EditOutcome {
        let captured = self.capture().ok();

        let mut rebuilt = match reconstruct(self.surface.root()) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("reconcile skipped: {e}");
                return EditOutcome::pass_through(self.version);
            }
        };
        rebuilt.repair_duplicate_ids();

        if rebuilt.blocks() == self.document.blocks() && rebuilt.mode == self.document.mode {
            return EditOutcome::pass_through(self.version);
        }

        rebuilt.file_path = self.document.file_path.take();
        self.document = rebuilt;
        let fallback = SerializedSelection::collapsed(self.default_caret());
        let selection = self.publish(captured.unwrap_or(fallback));

        EditOutcome {
            prevent_default: false,
            changed: true,
            version: self.version,
            selection,
        }
    }

    /// Bump the version, re-render, restore the selection and notify
    /// observers. Returns the selection actually placed.
    fn publish(&mut self, selection: SerializedSelection) -> Option<SerializedSelection> {
        self.version += 1;
        self.surface.replace_root(render(&self.document));

        let placed = match restore_selection(self.surface.root(), &selection) {
            Some(range) => {
                self.surface.set_selection(Some(range));
                Some(selection)
            }
            None => {
                log::debug!("selection lost in re-render, falling back to end of document");
                let caret = self.default_caret();
                self.surface
                    .set_caret(&caret)
                    .then(|| SerializedSelection::collapsed(caret))
            }
        };

        log::trace!(
            "document {} now at version {}",
            self.document.id(),
            self.version
        );
        let event = DocumentChanged {
            document_id: self.document.id().clone(),
            version: self.version,
        };
        for observer in &mut self.observers {
            observer(&event);
        }
        placed
    }

    fn default_caret(&self) -> Position {
        match self.document.blocks().last() {
            Some(block) => end_of(block),
            None => Position::new(self.document.id().clone(), 0),
        }
    }
}

fn end_of(block: &Block) -> Position {
    Position::new(
        block.id().clone(),
        block.text().map_or(0, utf16_len),
    )
}
