use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::models::{Document, NodeId, SerializedDocument, Session};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid editor state: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported editor state version {0}")]
    UnsupportedVersion(u32),
}

/// Title used for documents read from a path without a file stem
pub const UNTITLED: &str = "Untitled Document";

/// Version written into every state file
pub const STATE_VERSION: u32 = 1;

fn state_version() -> u32 {
    STATE_VERSION
}

/// Open documents and the active one, as written to the state file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(rename = "v", default = "state_version")]
    pub version: u32,
    pub documents: Vec<SerializedDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_id: Option<String>,
}

impl From<&Session> for SavedState {
    fn from(session: &Session) -> Self {
        Self {
            version: STATE_VERSION,
            documents: session.documents().iter().map(Document::to_serialized).collect(),
            active_id: session.active_id().map(ToString::to_string),
        }
    }
}

impl From<SavedState> for Session {
    fn from(state: SavedState) -> Self {
        let mut session = Session::new();
        let docs = state.documents.iter().map(Document::from_serialized).collect();
        session.replace_all(docs, state.active_id.map(NodeId::from));
        session
    }
}

/// Read a plain-text file into a document titled after the file name
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let title = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(UNTITLED);

    let mut doc = Document::new(Some(title), &content);
    doc.file_path = Some(path.to_path_buf());
    log::debug!("read {} blocks from {}", doc.len(), path.display());
    Ok(doc)
}

/// Write a document's body (everything after a leading title heading)
pub fn write_document(doc: &Document, path: &Path) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, doc.content())?;
    log::debug!("wrote document {} to {}", doc.id(), path.display());
    Ok(())
}

/// Save a session. The state file is replaced atomically, so a failed write
/// leaves the previous state in place.
pub fn save_editor_state(session: &Session, path: &Path) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(&SavedState::from(session))?;
    write_atomic(path, &json)
}

/// Restore a session. A missing state file is not an error: it yields `None`.
pub fn load_editor_state(path: &Path) -> Result<Option<Session>, IoError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    parse_state(&json).map(Some)
}

fn parse_state(json: &str) -> Result<Session, IoError> {
    let state: SavedState = serde_json::from_str(json)?;
    if state.version != STATE_VERSION {
        return Err(IoError::UnsupportedVersion(state.version));
    }
    Ok(Session::from(state))
}

/// Write to a temporary file beside `path`, then rename it over `path`
fn write_atomic(path: &Path, content: &str) -> Result<(), IoError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Keeps a session backed up in one state file, skipping writes when nothing
/// changed since the last one.
#[derive(Debug)]
pub struct StateBackup {
    path: PathBuf,
    last_written: Option<String>,
}

impl StateBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_written: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the backed-up session, if there is one
    pub fn restore(&mut self) -> Result<Option<Session>, IoError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let session = parse_state(&json)?;
        self.last_written = Some(json);
        log::info!(
            "restored {} documents from {}",
            session.len(),
            self.path.display()
        );
        Ok(Some(session))
    }

    /// Back up `session`. Returns false when the file already holds it.
    pub fn save(&mut self, session: &Session) -> Result<bool, IoError> {
        let json = serde_json::to_string_pretty(&SavedState::from(session))?;
        if self.last_written.as_deref() == Some(json.as_str()) {
            return Ok(false);
        }
        write_atomic(&self.path, &json)?;
        log::debug!("backed up {} documents to {}", session.len(), self.path.display());
        self.last_written = Some(json);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;
    use crate::tests::{create_test_dir, create_test_file};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_document_titles_after_file_stem() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "groceries.txt", "milk\r\neggs");

        let doc = read_document(&path).unwrap();

        assert_eq!(doc.title(), Some("groceries"));
        assert_eq!(doc.blocks()[0].node_type(), NodeType::Heading);
        assert_eq!(doc.content(), "milk\neggs");
        assert_eq!(doc.file_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = create_test_dir();
        let result = read_document(&dir.path().join("nope.txt"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = create_test_dir();
        let path = dir.path().join("nested/deeper/out.txt");
        let doc = Document::new(Some("out"), "line 1\nline 2");

        write_document(&doc, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line 1\nline 2");
        let back = read_document(&path).unwrap();
        assert_eq!(back.to_plain(), doc.to_plain());
    }

    #[test]
    fn test_editor_state_roundtrip() {
        let dir = create_test_dir();
        let path = dir.path().join("state.json");
        let mut session = Session::new();
        session.add(Document::new(Some("One"), "first"), false);
        let second = Document::new(None, "second\nbody");
        let second_id = second.id().clone();
        session.add(second, true);

        save_editor_state(&session, &path).unwrap();
        let restored = load_editor_state(&path).unwrap().unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.active_id(), Some(&second_id));
        let plains: Vec<String> = restored.documents().iter().map(|d| d.to_plain()).collect();
        assert_eq!(plains, vec!["One\nfirst", "second\nbody"]);
    }

    #[test]
    fn test_load_missing_state_is_none() {
        let dir = create_test_dir();
        assert!(load_editor_state(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_interrupted_save_leaves_state_readable() {
        let dir = create_test_dir();
        let path = dir.path().join("state.json");
        let mut session = Session::new();
        session.add(Document::new(Some("Kept"), "safe"), true);
        save_editor_state(&session, &path).unwrap();

        // A crash mid-write only ever leaves a partial temp file behind
        create_test_file(&dir, ".tmpPartial", r#"{"v": 1, "docu"#);
        let restored = load_editor_state(&path).unwrap().unwrap();
        assert_eq!(restored.documents()[0].to_plain(), "Kept\nsafe");

        // Overwriting swaps in the whole new file
        session.add(Document::new(None, "more"), false);
        save_editor_state(&session, &path).unwrap();
        assert_eq!(load_editor_state(&path).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_save_cleans_up_temp_file() {
        let dir = create_test_dir();
        let session = Session::new();

        // A non-empty directory squatting on the target makes the rename fail
        let blocked = dir.path().join("blocked");
        fs::create_dir_all(blocked.join("inner")).unwrap();
        assert!(matches!(
            save_editor_state(&session, &blocked),
            Err(IoError::Io(_))
        ));

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("blocked")]);
    }

    #[test]
    fn test_unknown_state_version_is_rejected() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "state.json", r#"{"v": 2, "documents": []}"#);
        assert!(matches!(
            load_editor_state(&path),
            Err(IoError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_backup_skips_unchanged_session() {
        let dir = create_test_dir();
        let path = dir.path().join("backup/state.json");
        let mut backup = StateBackup::new(&path);
        let mut session = Session::new();
        session.add(Document::new(Some("Notes"), "one"), true);

        assert!(backup.save(&session).unwrap());
        assert!(!backup.save(&session).unwrap());

        session.add(Document::new(None, "two"), false);
        assert!(backup.save(&session).unwrap());

        let mut reopened = StateBackup::new(&path);
        let restored = reopened.restore().unwrap().unwrap();
        assert_eq!(restored.len(), 2);
        assert!(!reopened.save(&restored).unwrap());
    }

    #[test]
    fn test_load_corrupt_state() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "state.json", "{ not json");
        assert!(matches!(load_editor_state(&path), Err(IoError::Json(_))));
    }
}
