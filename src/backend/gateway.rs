/// Async front for a `Backend`.
///
/// Every call runs the blocking backend work on tokio's blocking pool and
/// resolves exactly once with an explicit result; callers decide how failures
/// are shown. Nothing here retries.
use std::path::Path;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};

use super::Backend;
use crate::error::Result;
use crate::state::data::{Destination, MediaContent, MediaItem, MediaMetadata, SessionState, SortRequest, SortResult};
use crate::state::session::SessionSnapshot;

#[derive(Clone)]
pub struct PersistenceGateway {
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway").finish_non_exhaustive()
    }
}

impl PersistenceGateway {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn load_destinations(&self) -> Result<Vec<Destination>> {
        self.run(|backend| backend.list_destinations()).await
    }

    /// Whole-list overwrite
    pub async fn save_destinations(&self, destinations: Vec<Destination>) -> Result<()> {
        let count = destinations.len();
        let result = self
            .run(move |backend| backend.replace_destinations(&destinations))
            .await;
        match &result {
            Ok(()) => debug!("💾 Saved {} destinations", count),
            Err(e) => warn!("⚠️  Saving destinations failed: {}", e),
        }
        result
    }

    pub async fn list_items(&self, source_path: String) -> Result<Vec<MediaItem>> {
        self.run(move |backend| backend.list_items(&source_path)).await
    }

    /// Bytes plus metadata for display.
    ///
    /// Metadata failures fall back to the byte count; only a failed read is an error.
    pub async fn fetch_content(&self, item_path: String) -> Result<MediaContent> {
        self.run(move |backend| {
            let bytes = backend.fetch_content(&item_path)?;
            let metadata = backend.metadata(&item_path).unwrap_or(MediaMetadata {
                size: bytes.len() as u64,
                width: None,
                height: None,
            });
            Ok(MediaContent {
                path: item_path,
                bytes,
                metadata,
            })
        })
        .await
    }

    /// Best-effort; the result is only used for a feedback line
    pub async fn open_externally(&self, item_path: String) -> Result<()> {
        self.run(move |backend| backend.open_externally(&item_path)).await
    }

    pub async fn load_session(&self, source_path: String) -> Result<Option<SessionState>> {
        self.run(move |backend| backend.load_session(&source_path)).await
    }

    /// Write a snapshot; resolves to the revision that is now persisted.
    pub async fn save_session(&self, snapshot: SessionSnapshot) -> Result<u64> {
        let SessionSnapshot { state, revision, .. } = snapshot;
        let result = self
            .run(move |backend| backend.save_session(&state))
            .await
            .map(|()| revision);
        match &result {
            Ok(revision) => debug!("💾 Session saved at revision {}", revision),
            Err(e) => warn!("⚠️  Saving session failed: {}", e),
        }
        result
    }

    /// Best-effort cleanup after a successful finalize
    pub async fn delete_session(&self, source_path: String) -> Result<()> {
        let result = self
            .run({
                let source_path = source_path.clone();
                move |backend| backend.delete_session(&source_path)
            })
            .await;
        if let Err(e) = &result {
            warn!("⚠️  Could not delete session for {}: {}", source_path, e);
        }
        result
    }

    pub async fn finalize(&self, request: SortRequest) -> Result<SortResult> {
        info!(
            "🚚 Finalizing {} classifications from {}",
            request.classifications.len(),
            Path::new(&request.source_path).display()
        );
        self.run(move |backend| backend.finalize(&request)).await
    }

    async fn run<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&dyn Backend) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        task::spawn_blocking(move || job(backend.as_ref())).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::error::SorterError;

    fn gateway() -> (Arc<MemoryBackend>, PersistenceGateway) {
        let backend = Arc::new(MemoryBackend::new());
        let gateway = PersistenceGateway::new(backend.clone());
        (backend, gateway)
    }

    fn snapshot(revision: u64) -> SessionSnapshot {
        SessionSnapshot {
            state: SessionState {
                source_path: "/in".to_string(),
                current_index: 1,
                ..SessionState::default()
            },
            generation: 1,
            revision,
        }
    }

    #[tokio::test]
    async fn test_save_session_echoes_revision() {
        let (backend, gateway) = gateway();

        assert_eq!(gateway.save_session(snapshot(7)).await, Ok(7));
        assert_eq!(backend.session("/in").unwrap().current_index, 1);
    }

    #[tokio::test]
    async fn test_save_session_failure_is_reported() {
        let (backend, gateway) = gateway();
        backend.fail_saves(true);

        let result = gateway.save_session(snapshot(1)).await;
        assert!(matches!(result, Err(SorterError::Io(_))));
        assert!(backend.session("/in").is_none());
    }

    #[tokio::test]
    async fn test_missing_session_is_not_an_error() {
        let (_backend, gateway) = gateway();
        assert_eq!(gateway.load_session("/nowhere".to_string()).await, Ok(None));
    }

    #[tokio::test]
    async fn test_fetch_content_includes_metadata() {
        let (backend, gateway) = gateway();
        backend.add_folder("/in", vec![("a.jpg", b"abcd".as_slice())]);

        let content = gateway.fetch_content("/in/a.jpg".to_string()).await.unwrap();
        assert_eq!(content.bytes, b"abcd");
        assert_eq!(content.metadata.size, 4);

        assert!(gateway.fetch_content("/in/zzz.jpg".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_destinations_round_trip_through_backend() {
        let (backend, gateway) = gateway();
        let family = Destination {
            name: "Family".to_string(),
            key: 'f',
            path: "/sorted/family".to_string(),
        };

        gateway
            .save_destinations(vec![family.clone()])
            .await
            .unwrap();

        assert_eq!(backend.stored_destinations(), vec![family.clone()]);
        assert_eq!(gateway.load_destinations().await, Ok(vec![family]));
    }

    #[tokio::test]
    async fn test_finalize_forwards_request_and_result() {
        let (backend, gateway) = gateway();
        backend.set_finalize_result(SortResult::new(false, "Failed: 1"));
        let request = SortRequest {
            source_path: "/in".to_string(),
            destinations: Vec::new(),
            classifications: Default::default(),
        };

        let result = gateway.finalize(request.clone()).await.unwrap();

        assert!(!result.success);
        assert_eq!(backend.finalize_requests(), vec![request]);
    }

    #[tokio::test]
    async fn test_finalize_transport_failure_is_an_error() {
        let (backend, gateway) = gateway();
        backend.fail_finalize(true);

        let result = gateway
            .finalize(SortRequest {
                source_path: "/in".to_string(),
                destinations: Vec::new(),
                classifications: Default::default(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stored_session_loads_and_open_is_recorded() {
        let (backend, gateway) = gateway();
        backend.insert_session(snapshot(3).state);

        let loaded = gateway.load_session("/in".to_string()).await.unwrap();
        assert_eq!(loaded.map(|s| s.current_index), Some(1));

        gateway.open_externally("/in/a.jpg".to_string()).await.unwrap();
        assert_eq!(backend.opened(), vec!["/in/a.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_list_items_for_unknown_folder_fails() {
        let (backend, gateway) = gateway();
        backend.add_folder("/in", vec![("a.jpg", b"a".as_slice()), ("b.png", b"bb".as_slice())]);

        assert_eq!(gateway.list_items("/in".to_string()).await.unwrap().len(), 2);
        assert!(matches!(
            gateway.list_items("/other".to_string()).await,
            Err(SorterError::InvalidSource(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_session_failure_is_returned() {
        let (backend, gateway) = gateway();
        backend.fail_deletes(true);

        assert!(gateway.delete_session("/in".to_string()).await.is_err());
    }
}
