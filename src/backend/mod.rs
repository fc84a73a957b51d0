/// Backend contract and its local implementation
///
/// The controller only ever talks to a `Backend` through the
/// `PersistenceGateway`. `LocalBackend` fulfils the contract with:
/// - `library.rs` - SQLite catalog for destinations and sessions
/// - `scanner.rs` - source folder listing and item access
/// - `sorter.rs` - copy, hash-verify, deduplicate and delete on finalize
use std::path::Path;

use crate::error::Result;
use crate::state::data::{Destination, MediaItem, MediaMetadata, SessionState, SortRequest, SortResult};

pub mod gateway;
pub mod library;
#[cfg(test)]
pub mod memory;
pub mod scanner;
pub mod sorter;

pub use gateway::PersistenceGateway;
pub use library::Library;

/// Request/response operations the sorting client depends on.
///
/// All calls are blocking; the gateway moves them off the UI thread.
pub trait Backend: Send + Sync {
    fn list_destinations(&self) -> Result<Vec<Destination>>;
    fn replace_destinations(&self, destinations: &[Destination]) -> Result<()>;

    fn list_items(&self, source_path: &str) -> Result<Vec<MediaItem>>;
    fn fetch_content(&self, item_path: &str) -> Result<Vec<u8>>;
    fn metadata(&self, item_path: &str) -> Result<MediaMetadata>;
    fn open_externally(&self, item_path: &str) -> Result<()>;

    /// `Ok(None)` when no session was ever saved for this folder
    fn load_session(&self, source_path: &str) -> Result<Option<SessionState>>;
    fn save_session(&self, session: &SessionState) -> Result<()>;
    fn delete_session(&self, source_path: &str) -> Result<()>;

    fn finalize(&self, request: &SortRequest) -> Result<SortResult>;
}

/// Catalog-backed, filesystem-operating backend
#[derive(Debug)]
pub struct LocalBackend {
    library: Library,
}

impl LocalBackend {
    pub fn new(library: Library) -> Self {
        Self { library }
    }
}

impl Backend for LocalBackend {
    fn list_destinations(&self) -> Result<Vec<Destination>> {
        self.library.destinations()
    }

    fn replace_destinations(&self, destinations: &[Destination]) -> Result<()> {
        self.library.replace_destinations(destinations)
    }

    fn list_items(&self, source_path: &str) -> Result<Vec<MediaItem>> {
        scanner::list_items(Path::new(source_path))
    }

    fn fetch_content(&self, item_path: &str) -> Result<Vec<u8>> {
        scanner::read_content(Path::new(item_path))
    }

    fn metadata(&self, item_path: &str) -> Result<MediaMetadata> {
        scanner::metadata(Path::new(item_path))
    }

    fn open_externally(&self, item_path: &str) -> Result<()> {
        scanner::open_externally(Path::new(item_path))
    }

    fn load_session(&self, source_path: &str) -> Result<Option<SessionState>> {
        self.library.session(source_path)
    }

    fn save_session(&self, session: &SessionState) -> Result<()> {
        self.library.save_session(session)
    }

    fn delete_session(&self, source_path: &str) -> Result<()> {
        self.library.delete_session(source_path)
    }

    fn finalize(&self, request: &SortRequest) -> Result<SortResult> {
        Ok(sorter::sort_media(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::ClassificationMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_local_backend_end_to_end() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.jpg"), b"alpha").unwrap();

        let backend = LocalBackend::new(Library::open(&Library::db_path_in(dir.path())).unwrap());
        let source_path = source.to_string_lossy().to_string();

        let items = backend.list_items(&source_path).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(backend.fetch_content(&items[0].path).unwrap(), b"alpha");

        let family = Destination {
            name: "Family".to_string(),
            key: 'f',
            path: dir.path().join("family").to_string_lossy().to_string(),
        };
        backend.replace_destinations(&[family.clone()]).unwrap();

        let mut classifications = ClassificationMap::new();
        classifications.insert(items[0].path.clone(), "Family".to_string());
        let session = SessionState {
            source_path: source_path.clone(),
            destinations: vec![family.clone()],
            classifications: classifications.clone(),
            ..SessionState::default()
        };
        backend.save_session(&session).unwrap();
        assert_eq!(backend.load_session(&source_path).unwrap(), Some(session));

        let result = backend
            .finalize(&SortRequest {
                source_path: source_path.clone(),
                destinations: vec![family],
                classifications,
            })
            .unwrap();
        assert!(result.success);
        assert!(dir.path().join("family").join("a.jpg").exists());

        backend.delete_session(&source_path).unwrap();
        assert!(backend.load_session(&source_path).unwrap().is_none());
    }
}
