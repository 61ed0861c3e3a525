use std::collections::HashMap;

use crate::models::{Document, NodeId};
use crate::search::SearchResult;

/// The set of open documents plus which one is active.
///
/// Owned explicitly by the host application and passed to whatever needs it;
/// nothing in the engine reaches for a global document list.
#[derive(Debug, Default)]
pub struct Session {
    documents: Vec<Document>,
    active_id: Option<NodeId>,
    search_results: HashMap<NodeId, SearchResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open documents in tab order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.documents.iter().position(|d| d.id() == id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id() == id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id() == id)
    }

    pub fn active_id(&self) -> Option<&NodeId> {
        self.active_id.as_ref()
    }

    pub fn active(&self) -> Option<&Document> {
        self.active_id.as_ref().and_then(|id| self.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Document> {
        let id = self.active_id.clone()?;
        self.get_mut(&id)
    }

    /// Make `id` the active document. Returns false (and changes nothing) for
    /// an id that is not open.
    pub fn set_active(&mut self, id: Option<NodeId>) -> bool {
        match id {
            Some(id) if self.index_of(&id).is_none() => {
                log::warn!("set_active: document {id} is not open");
                false
            }
            id => {
                self.active_id = id;
                true
            }
        }
    }

    pub fn add(&mut self, doc: Document, set_active: bool) {
        let id = doc.id().clone();
        self.documents.push(doc);
        if set_active {
            self.active_id = Some(id);
        }
    }

    /// Close a document.
    ///
    /// Closing the active document activates whichever document slides into
    /// its slot, or the new last document when it was the last one.
    pub fn remove(&mut self, id: &NodeId) -> Option<Document> {
        let index = self.index_of(id)?;
        let removed = self.documents.remove(index);
        self.search_results.remove(id);

        if self.active_id.as_ref() == Some(id) {
            self.active_id = self
                .documents
                .get(index)
                .or_else(|| self.documents.last())
                .map(|d| d.id().clone());
        }
        Some(removed)
    }

    /// Swap the whole list, e.g. after restoring editor state.
    ///
    /// Falls back to the first document when `active` is absent or not in `docs`.
    pub fn replace_all(&mut self, docs: Vec<Document>, active: Option<NodeId>) {
        self.documents = docs;
        self.search_results.clear();
        self.active_id = active
            .filter(|id| self.index_of(id).is_some())
            .or_else(|| self.documents.first().map(|d| d.id().clone()));
    }

    /// Replace the document stored under `id` in place
    pub fn replace(&mut self, id: &NodeId, doc: Document) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.active_id.as_ref() == Some(id) {
            self.active_id = Some(doc.id().clone());
        }
        self.documents[index] = doc;
        true
    }

    pub fn set_search_result(&mut self, id: NodeId, result: SearchResult) {
        self.search_results.insert(id, result);
    }

    pub fn clear_search_result(&mut self, id: &NodeId) {
        self.search_results.remove(id);
    }

    pub fn search_result(&self, id: &NodeId) -> Option<&SearchResult> {
        self.search_results.get(id)
    }
}
