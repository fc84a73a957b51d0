/// Central mutable sorting state: items, cursor, classifications and the
/// dirty bookkeeping that drives autosave.
use chrono::{DateTime, Local};

use super::data::{ClassificationMap, Destination, MediaItem, SessionState};
use crate::error::{Result, SorterError};

/// A session as it should be written, tagged with the load generation and
/// revision it was taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub generation: u64,
    pub revision: u64,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    source_path: Option<String>,
    items: Vec<MediaItem>,
    cursor: usize,
    classifications: ClassificationMap,
    /// Bumped on every load and reset; revisions only compare within one generation
    generation: u64,
    /// Bumped on every effective mutation
    revision: u64,
    /// Highest revision known to be written by the backend
    saved_revision: u64,
    restored: bool,
    last_saved: Option<DateTime<Local>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session over `items`, discarding any previous progress.
    pub fn load(&mut self, source_path: impl Into<String>, items: Vec<MediaItem>) {
        *self = Self {
            source_path: Some(source_path.into()),
            items,
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    /// Adopt progress from a previously saved session.
    ///
    /// Sessions without destinations are skeletons and are ignored. Returns
    /// whether the session was merged. The cursor is clamped in case the
    /// folder shrank since the session was written.
    pub fn merge(&mut self, session: &SessionState) -> bool {
        if self.source_path.is_none() || session.destinations.is_empty() {
            return false;
        }

        self.classifications = session.classifications.clone();
        self.cursor = session
            .current_index
            .min(self.items.len().saturating_sub(1));
        self.restored = true;
        // The merged state is what the backend already holds
        self.saved_revision = self.revision;
        true
    }

    /// Assign the current item to `destination_name` and move to the next item.
    pub fn classify(&mut self, destination_name: &str) -> Result<()> {
        let path = self
            .current_item()
            .map(|item| item.path.clone())
            .ok_or_else(|| SorterError::Validation("No item to classify".to_string()))?;

        self.classifications
            .insert(path, destination_name.to_string());
        self.advance();
        self.touch();
        Ok(())
    }

    /// Move to the next item. Returns false at the last item.
    pub fn skip(&mut self) -> bool {
        if self.advance() {
            self.touch();
            true
        } else {
            false
        }
    }

    /// Move to the previous item. Returns false at the first item.
    pub fn previous(&mut self) -> bool {
        if self.cursor > 0 && !self.items.is_empty() {
            self.cursor -= 1;
            self.touch();
            true
        } else {
            false
        }
    }

    /// Drop everything and return to the pre-load state.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    /// Capture the state to persist, or `None` when no session is active.
    pub fn snapshot(&self, destinations: &[Destination]) -> Option<SessionSnapshot> {
        let source_path = self.source_path.clone()?;
        Some(SessionSnapshot {
            state: SessionState {
                source_path,
                destinations: destinations.to_vec(),
                classifications: self.classifications.clone(),
                current_index: self.cursor,
                last_saved: chrono::Utc::now().timestamp_millis(),
            },
            generation: self.generation,
            revision: self.revision,
        })
    }

    /// Record that the snapshot taken at `generation`/`revision` reached the backend.
    ///
    /// Mutations made after the snapshot keep the store dirty. Returns false,
    /// changing nothing, when the snapshot belongs to an earlier load.
    pub fn mark_saved(&mut self, generation: u64, revision: u64, at: DateTime<Local>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.saved_revision = self.saved_revision.max(revision);
        self.last_saved = Some(at);
        true
    }

    /// Flag the in-memory state as changed without moving anything.
    ///
    /// Used when the destination list embedded in the session changes.
    pub fn touch(&mut self) {
        if self.source_path.is_some() {
            self.revision += 1;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn is_active(&self) -> bool {
        self.source_path.is_some()
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.items.get(self.cursor)
    }

    pub fn classifications(&self) -> &ClassificationMap {
        &self.classifications
    }

    pub fn classified_count(&self) -> usize {
        self.classifications.len()
    }

    /// Destination name assigned to the current item, if any
    pub fn current_classification(&self) -> Option<&str> {
        let item = self.current_item()?;
        self.classifications.get(&item.path).map(String::as_str)
    }

    /// One-based position and total, for progress display
    pub fn progress(&self) -> (usize, usize) {
        if self.items.is_empty() {
            (0, 0)
        } else {
            (self.cursor + 1, self.items.len())
        }
    }

    /// True once the last item is on screen
    pub fn is_at_end(&self) -> bool {
        !self.items.is_empty() && self.cursor + 1 >= self.items.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn restored(&self) -> bool {
        self.restored
    }

    pub fn last_saved(&self) -> Option<DateTime<Local>> {
        self.last_saved
    }

    fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }
}
