/// In-memory backend for tests, with switchable failures.
use std::collections::HashMap;
use std::sync::Mutex;

use super::Backend;
use crate::error::{Result, SorterError};
use crate::state::data::{Destination, MediaItem, MediaMetadata, SessionState, SortRequest, SortResult};

#[derive(Debug, Default)]
struct Inner {
    destinations: Vec<Destination>,
    folders: HashMap<String, Vec<MediaItem>>,
    content: HashMap<String, Vec<u8>>,
    sessions: HashMap<String, SessionState>,
    finalize_result: Option<SortResult>,
    finalize_requests: Vec<SortRequest>,
    opened: Vec<String>,
    fail_saves: bool,
    fail_deletes: bool,
    fail_finalize: bool,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_folder(&self, source_path: &str, items: Vec<(&str, &[u8])>) {
        let mut inner = self.inner.lock().unwrap();
        let mut listed = Vec::new();
        for (name, bytes) in items {
            let path = format!("{source_path}/{name}");
            inner.content.insert(path.clone(), bytes.to_vec());
            listed.push(MediaItem {
                path,
                name: name.to_string(),
                size: bytes.len() as u64,
            });
        }
        inner.folders.insert(source_path.to_string(), listed);
    }

    pub fn insert_session(&self, session: SessionState) {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.insert(session.source_path.clone(), session);
    }

    pub fn session(&self, source_path: &str) -> Option<SessionState> {
        self.inner.lock().unwrap().sessions.get(source_path).cloned()
    }

    pub fn stored_destinations(&self) -> Vec<Destination> {
        self.inner.lock().unwrap().destinations.clone()
    }

    pub fn set_finalize_result(&self, result: SortResult) {
        self.inner.lock().unwrap().finalize_result = Some(result);
    }

    pub fn finalize_requests(&self) -> Vec<SortRequest> {
        self.inner.lock().unwrap().finalize_requests.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.inner.lock().unwrap().opened.clone()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.lock().unwrap().fail_saves = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_deletes = fail;
    }

    pub fn fail_finalize(&self, fail: bool) {
        self.inner.lock().unwrap().fail_finalize = fail;
    }
}

impl Backend for MemoryBackend {
    fn list_destinations(&self) -> Result<Vec<Destination>> {
        Ok(self.inner.lock().unwrap().destinations.clone())
    }

    fn replace_destinations(&self, destinations: &[Destination]) -> Result<()> {
        self.inner.lock().unwrap().destinations = destinations.to_vec();
        Ok(())
    }

    fn list_items(&self, source_path: &str) -> Result<Vec<MediaItem>> {
        self.inner
            .lock()
            .unwrap()
            .folders
            .get(source_path)
            .cloned()
            .ok_or_else(|| SorterError::InvalidSource(source_path.to_string()))
    }

    fn fetch_content(&self, item_path: &str) -> Result<Vec<u8>> {
        self.inner
            .lock()
            .unwrap()
            .content
            .get(item_path)
            .cloned()
            .ok_or_else(|| SorterError::Io(format!("File not found: {item_path}")))
    }

    fn metadata(&self, item_path: &str) -> Result<MediaMetadata> {
        let size = self.fetch_content(item_path)?.len() as u64;
        Ok(MediaMetadata {
            size,
            width: None,
            height: None,
        })
    }

    fn open_externally(&self, item_path: &str) -> Result<()> {
        self.inner.lock().unwrap().opened.push(item_path.to_string());
        Ok(())
    }

    fn load_session(&self, source_path: &str) -> Result<Option<SessionState>> {
        Ok(self.session(source_path))
    }

    fn save_session(&self, session: &SessionState) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_saves {
            return Err(SorterError::Io("disk full".to_string()));
        }
        inner
            .sessions
            .insert(session.source_path.clone(), session.clone());
        Ok(())
    }

    fn delete_session(&self, source_path: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_deletes {
            return Err(SorterError::Io("permission denied".to_string()));
        }
        inner.sessions.remove(source_path);
        Ok(())
    }

    fn finalize(&self, request: &SortRequest) -> Result<SortResult> {
        let mut inner = self.inner.lock().unwrap();
        inner.finalize_requests.push(request.clone());
        if inner.fail_finalize {
            return Err(SorterError::Io("connection refused".to_string()));
        }
        Ok(inner
            .finalize_result
            .clone()
            .unwrap_or_else(|| SortResult::new(true, "Copied: all")))
    }
}
