use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{Block, Document, NodeId};

/// Flat field list a document is persisted as.
///
/// Only the plain text survives: block ids other than the document's own are
/// regenerated on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Document {
    /// Text of the blocks after the leading heading, joined by `\n`
    pub fn content(&self) -> String {
        let body = match self.blocks().first() {
            Some(Block::Heading(_)) => &self.blocks()[1..],
            _ => self.blocks(),
        };
        body.iter()
            .map(Block::to_plain)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_serialized(&self) -> SerializedDocument {
        let title = match self.blocks().first() {
            Some(Block::Heading(h)) => Some(h.text.clone()),
            _ => None,
        };
        SerializedDocument {
            title,
            content: self.content(),
            file_path: self.file_path.clone(),
            id: Some(self.id().to_string()),
        }
    }

    pub fn from_serialized(serialized: &SerializedDocument) -> Self {
        let mut doc = Document::new(serialized.title.as_deref(), &serialized.content);
        if let Some(id) = &serialized.id {
            doc.set_id(NodeId::from(id.as_str()));
        }
        doc.file_path = serialized.file_path.clone();
        doc
    }
}

impl From<&Document> for SerializedDocument {
    fn from(doc: &Document) -> Self {
        doc.to_serialized()
    }
}
