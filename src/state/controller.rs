/// The sorting session controller.
///
/// Owns every piece of sorting state and is mutated only through named
/// commands. Commands never perform I/O themselves: they return `Effect`s for
/// the shell to run, and the results come back through the `on_*` handlers.
use chrono::Local;
use cgmath::Vector2;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::data::{Destination, MediaContent, MediaItem, SessionState, SortRequest, SortResult};
use super::destinations::DestinationRegistry;
use super::feedback::{Feedback, Level};
use super::finalize::{FinalizeCoordinator, FinalizeOutcome};
use super::input::{Command, InputDispatcher, KeyPress};
use super::session::{SessionSnapshot, SessionStore};
use super::viewer::{ScrollDirection, ViewerState};
use crate::config::Config;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Choosing a source folder and editing destinations
    Setup,
    /// Stepping through items
    Sorting,
}

/// Asks the user to approve a destructive action
pub trait Confirm {
    fn confirm(&self, title: &str, description: &str) -> bool;
}

/// Work the shell must carry out on the controller's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadDestinations,
    SaveDestinations(Vec<Destination>),
    LoadItems(String),
    LoadSession(String),
    SaveSession(SessionSnapshot),
    DeleteSession(String),
    FetchContent(String),
    OpenExternally(String),
    Finalize(SortRequest),
    /// Show a blocking message box
    Alert { title: String, message: String },
}

#[derive(Debug)]
pub struct Controller {
    mode: Mode,
    /// Folder whose items or saved session are still on their way
    loading: Option<String>,
    session: SessionStore,
    destinations: DestinationRegistry,
    viewer: ViewerState,
    input: InputDispatcher,
    finalize: FinalizeCoordinator,
    content: Option<MediaContent>,
    content_error: Option<String>,
    feedback: Option<Feedback>,
    feedback_ttl: Duration,
    error_feedback_ttl: Duration,
}

impl Controller {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: Mode::Setup,
            loading: None,
            session: SessionStore::new(),
            destinations: DestinationRegistry::new(),
            viewer: ViewerState::new(config.zoom_step),
            input: InputDispatcher::new(),
            finalize: FinalizeCoordinator::new(),
            content: None,
            content_error: None,
            feedback: None,
            feedback_ttl: Duration::from_millis(config.feedback_ms),
            error_feedback_ttl: Duration::from_millis(config.error_feedback_ms),
        }
    }

    /// Effects to run once at application start
    pub fn startup(&self) -> Vec<Effect> {
        vec![Effect::LoadDestinations]
    }

    // ========== Setup ==========

    /// Adopt the catalog's destination list.
    ///
    /// The list only fills an empty registry; destinations the user added or a
    /// restored session brought in are newer and are kept.
    pub fn on_destinations_loaded(&mut self, result: Result<Vec<Destination>>) {
        match result {
            Ok(_) if !self.destinations.is_empty() || self.session.restored() => {
                debug!("Keeping current destinations over the saved list");
            }
            Ok(destinations) if !destinations.is_empty() => {
                let count = destinations.len();
                self.destinations.replace_all(destinations);
                self.refresh_bindings();
                self.notify(format!("Loaded {count} saved destinations"), Level::Info);
            }
            Ok(_) => {}
            Err(e) => self.notify(format!("Could not load saved destinations: {e}"), Level::Warning),
        }
    }

    /// Begin loading a source folder.
    pub fn load_source(&mut self, source_path: &str) -> Option<Effect> {
        let source_path = source_path.trim();
        if self.is_processing() || self.loading.is_some() {
            return None;
        }
        if source_path.is_empty() {
            self.notify("Please enter a source path", Level::Warning);
            return None;
        }

        self.loading = Some(source_path.to_string());
        Some(Effect::LoadItems(source_path.to_string()))
    }

    /// Items for the folder being loaded. Loading continues with the saved session.
    pub fn on_items_loaded(&mut self, source_path: String, result: Result<Vec<MediaItem>>) -> Vec<Effect> {
        if self.loading.as_deref() != Some(source_path.as_str()) {
            debug!("Ignoring items for {} (load abandoned)", source_path);
            return Vec::new();
        }
        match result {
            Ok(items) => {
                info!("📂 Loaded {} images from {}", items.len(), source_path);
                self.notify(format!("Loaded {} images", items.len()), Level::Success);
                self.session.load(source_path.clone(), items);
                self.mode = Mode::Setup;
                self.clear_display();
                self.refresh_bindings();
                vec![Effect::LoadSession(source_path)]
            }
            Err(e) => {
                self.loading = None;
                self.notify_error(format!("Error loading images: {e}"));
                Vec::new()
            }
        }
    }

    /// Merge a previously saved session for the loaded folder, if one exists.
    ///
    /// This finishes the load; sorting cannot start before it arrives.
    pub fn on_session_loaded(&mut self, source_path: &str, result: Result<Option<SessionState>>) {
        if self.loading.as_deref() != Some(source_path)
            || self.session.source_path() != Some(source_path)
        {
            debug!("Ignoring session for {} (no longer loading)", source_path);
            return;
        }
        self.loading = None;
        if self.mode == Mode::Sorting {
            debug!("Ignoring session for {} (already sorting)", source_path);
            return;
        }

        match result {
            Ok(Some(remote)) => {
                if self.session.merge(&remote) {
                    self.destinations.replace_all(remote.destinations);
                    self.refresh_bindings();
                    info!(
                        "♻️  Restored session for {} ({} classified)",
                        source_path,
                        self.session.classified_count()
                    );
                    self.notify("Previous session restored", Level::Success);
                }
            }
            Ok(None) => debug!("No previous session for {}", source_path),
            Err(e) => self.notify(format!("Could not load previous session: {e}"), Level::Warning),
        }
    }

    /// Add a destination and persist the whole list.
    pub fn add_destination(&mut self, name: &str, key: &str, path: &str) -> Result<Effect> {
        if self.is_processing() {
            return Err(crate::error::SorterError::Validation(
                "Destinations are locked while processing".to_string(),
            ));
        }

        match self.destinations.add(name, key, path) {
            Ok(added) => {
                let message = format!("Added: {} ({})", added.name, added.key);
                self.session.touch();
                self.refresh_bindings();
                self.notify(message, Level::Success);
                Ok(Effect::SaveDestinations(self.destinations.list().to_vec()))
            }
            Err(e) => {
                self.notify(e.to_string(), Level::Warning);
                Err(e)
            }
        }
    }

    /// Remove a destination after the user confirms, and persist the whole list.
    ///
    /// Classifications that point at the removed name are left as they are.
    pub fn remove_destination(&mut self, key: char, confirm: &dyn Confirm) -> Option<Effect> {
        if self.is_processing() {
            return None;
        }

        let result = self.destinations.remove(key, |dest| {
            confirm.confirm(
                "Remove destination?",
                &format!(
                    "Remove destination \"{}\" ({})?\n\nPath: {}\n\nThis won't delete any files, just removes it from your saved destinations.",
                    dest.name, dest.key, dest.path
                ),
            )
        });

        match result {
            Ok(Some(removed)) => {
                info!("Removed destination {} ({})", removed.name, removed.key);
                self.session.touch();
                self.refresh_bindings();
                self.notify("Destination removed", Level::Info);
                Some(Effect::SaveDestinations(self.destinations.list().to_vec()))
            }
            Ok(None) => None,
            Err(e) => {
                self.notify(e.to_string(), Level::Warning);
                None
            }
        }
    }

    pub fn can_start(&self) -> bool {
        self.loading.is_none() && !self.session.items().is_empty() && !self.destinations.is_empty()
    }

    /// Switch to the sorting screen.
    pub fn start_sorting(&mut self) -> Vec<Effect> {
        if !self.can_start() || self.is_processing() {
            return Vec::new();
        }
        self.mode = Mode::Sorting;
        self.refresh_bindings();
        self.show_current()
    }

    /// Abandon the session and return to setup. Unsaved progress is dropped.
    pub fn reset_session(&mut self) {
        if self.is_processing() {
            return;
        }
        self.session.reset();
        self.loading = None;
        self.mode = Mode::Setup;
        self.clear_display();
        self.refresh_bindings();
        self.notify("Ready for new session", Level::Info);
    }

    // ========== Sorting ==========

    /// Resolve a key press against the current bindings.
    pub fn handle_key(&mut self, press: KeyPress) -> Vec<Effect> {
        match self.input.dispatch(press) {
            Some(Command::Previous) => self.previous(),
            Some(Command::Skip) => self.skip(),
            Some(Command::Save) => self.save().into_iter().collect(),
            Some(Command::Classify(name)) => self.classify(&name),
            None => Vec::new(),
        }
    }

    /// Assign the current item to `destination_name` and advance.
    pub fn classify(&mut self, destination_name: &str) -> Vec<Effect> {
        if !self.accepts_navigation() {
            return Vec::new();
        }
        let before = self.session.cursor();
        match self.session.classify(destination_name) {
            Ok(()) => {
                self.notify(format!("→ {destination_name}"), Level::Info);
                self.after_navigation(before)
            }
            Err(e) => {
                self.notify(e.to_string(), Level::Warning);
                Vec::new()
            }
        }
    }

    pub fn skip(&mut self) -> Vec<Effect> {
        if !self.accepts_navigation() {
            return Vec::new();
        }
        let before = self.session.cursor();
        if self.session.skip() {
            self.notify("Skipped", Level::Info);
            self.after_navigation(before)
        } else {
            Vec::new()
        }
    }

    pub fn previous(&mut self) -> Vec<Effect> {
        if !self.accepts_navigation() {
            return Vec::new();
        }
        let before = self.session.cursor();
        if self.session.previous() {
            self.after_navigation(before)
        } else {
            Vec::new()
        }
    }

    pub fn open_current(&mut self) -> Option<Effect> {
        let item = self.session.current_item()?;
        Some(Effect::OpenExternally(item.path.clone()))
    }

    pub fn on_opened(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.notify("Opened in default app", Level::Info),
            Err(e) => self.notify_error(format!("Could not open file: {e}")),
        }
    }

    pub fn on_content_loaded(&mut self, result: Result<MediaContent>, requested_path: &str) {
        // A late answer for an item we already navigated away from
        if self.session.current_item().map(|i| i.path.as_str()) != Some(requested_path) {
            return;
        }
        match result {
            Ok(content) => {
                self.content = Some(content);
                self.content_error = None;
            }
            Err(e) => {
                warn!("⚠️  Could not load {}: {}", requested_path, e);
                self.content = None;
                self.content_error = Some(e.to_string());
            }
        }
    }

    // ========== Viewer ==========

    pub fn viewer_wheel(&mut self, direction: ScrollDirection, pointer: Vector2<f32>, area: Vector2<f32>) {
        if self.content.is_some() {
            self.viewer.wheel(direction, pointer, area);
        }
    }

    pub fn viewer_press(&mut self, pointer: Vector2<f32>) -> bool {
        self.content.is_some() && self.viewer.press(pointer)
    }

    pub fn viewer_drag(&mut self, pointer: Vector2<f32>) -> bool {
        self.viewer.drag_to(pointer)
    }

    pub fn viewer_release(&mut self) -> bool {
        self.viewer.release()
    }

    pub fn reset_zoom(&mut self) {
        self.viewer.reset();
    }

    // ========== Persistence ==========

    /// Explicit save (button or Ctrl+S).
    pub fn save(&mut self) -> Option<Effect> {
        if self.is_processing() {
            return None;
        }
        if !self.session.is_dirty() {
            self.notify("No unsaved changes", Level::Info);
            return None;
        }
        self.snapshot_effect()
    }

    /// Periodic save; silent when there is nothing to write.
    pub fn autosave_tick(&mut self) -> Option<Effect> {
        if self.mode != Mode::Sorting || self.is_processing() || !self.session.is_dirty() {
            return None;
        }
        debug!("⏱️  Autosave triggered");
        self.snapshot_effect()
    }

    /// Result of a session write started in load `generation`.
    pub fn on_session_saved(&mut self, generation: u64, result: Result<u64>) {
        if generation != self.session.generation() {
            debug!("Ignoring save result from an earlier session");
            return;
        }
        match result {
            Ok(revision) => {
                self.session.mark_saved(generation, revision, Local::now());
                self.notify("Progress saved", Level::Success);
            }
            Err(e) => self.notify_error(format!("Error saving progress: {e}")),
        }
    }

    pub fn on_destinations_saved(&mut self, result: Result<()>) {
        if let Err(e) = result {
            self.notify_error(format!("Error saving destinations: {e}"));
        }
    }

    pub fn on_session_deleted(&mut self, result: Result<()>) {
        // Finalize already succeeded; a stale session file is harmless
        if let Err(e) = result {
            debug!("Session cleanup failed: {}", e);
        }
    }

    // ========== Finalize ==========

    /// Ask for confirmation and submit the commit request.
    pub fn request_finalize(&mut self, confirm: &dyn Confirm) -> Option<Effect> {
        let plan = match self.finalize.prepare(&self.session, &self.destinations) {
            Ok(plan) => plan,
            Err(e) => {
                self.notify(e.to_string(), Level::Warning);
                return None;
            }
        };

        if !confirm.confirm(plan.confirmation_title(), &plan.confirmation_text()) {
            return None;
        }

        self.finalize.begin();
        self.viewer.release();
        self.refresh_bindings();
        Some(Effect::Finalize(plan.request))
    }

    pub fn on_finalize_result(&mut self, result: Result<SortResult>) -> Vec<Effect> {
        let outcome = self.finalize.finish(result);
        let effects = match outcome {
            FinalizeOutcome::Committed(message) => {
                info!("✅ Finalize succeeded");
                let mut effects = Vec::new();
                if let Some(source_path) = self.session.source_path() {
                    effects.push(Effect::DeleteSession(source_path.to_string()));
                }
                self.session.reset();
                self.mode = Mode::Setup;
                self.clear_display();
                self.feedback = Some(Feedback::new(
                    "All files processed successfully!",
                    Level::Success,
                    self.error_feedback_ttl,
                    Instant::now(),
                ));
                effects.push(Effect::Alert {
                    title: "Success!".to_string(),
                    message,
                });
                effects
            }
            FinalizeOutcome::Failed(message) => {
                warn!("⚠️  Finalize reported problems: {}", message);
                self.notify_error(message.clone());
                vec![Effect::Alert {
                    title: "Completed with issues".to_string(),
                    message,
                }]
            }
        };
        self.refresh_bindings();
        effects
    }

    // ========== Timers ==========

    /// Drop feedback whose time is up.
    pub fn tick(&mut self, now: Instant) {
        if self.feedback.as_ref().is_some_and(|f| f.is_expired(now)) {
            self.feedback = None;
        }
    }

    // ========== Queries ==========

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_processing(&self) -> bool {
        self.finalize.is_processing()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Whether keyboard shortcuts are currently bound
    pub fn keyboard_active(&self) -> bool {
        self.input.is_active()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn destinations(&self) -> &DestinationRegistry {
        &self.destinations
    }

    pub fn viewer(&self) -> &ViewerState {
        &self.viewer
    }

    pub fn content(&self) -> Option<&MediaContent> {
        self.content.as_ref()
    }

    pub fn content_error(&self) -> Option<&str> {
        self.content_error.as_deref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Classifications pointing at destinations that were removed
    pub fn orphaned_count(&self) -> usize {
        self.session
            .classifications()
            .values()
            .filter(|name| !self.destinations.contains_name(name))
            .count()
    }

    // ========== Internals ==========

    fn accepts_navigation(&self) -> bool {
        self.mode == Mode::Sorting && !self.is_processing()
    }

    fn after_navigation(&mut self, cursor_before: usize) -> Vec<Effect> {
        self.viewer.reset();
        self.refresh_bindings();
        if self.session.cursor() != cursor_before {
            self.show_current()
        } else {
            Vec::new()
        }
    }

    fn show_current(&mut self) -> Vec<Effect> {
        self.viewer.reset();
        self.content = None;
        self.content_error = None;
        match self.session.current_item() {
            Some(item) => vec![Effect::FetchContent(item.path.clone())],
            None => Vec::new(),
        }
    }

    fn clear_display(&mut self) {
        self.viewer.reset();
        self.content = None;
        self.content_error = None;
    }

    fn snapshot_effect(&self) -> Option<Effect> {
        self.session
            .snapshot(self.destinations.list())
            .map(Effect::SaveSession)
    }

    fn refresh_bindings(&mut self) {
        let active = self.mode == Mode::Sorting && !self.is_processing();
        self.input.rebuild(&self.destinations, active);
    }

    fn notify(&mut self, text: impl Into<String>, level: Level) {
        self.feedback = Some(Feedback::new(text, level, self.feedback_ttl, Instant::now()));
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.feedback = Some(Feedback::new(
            text,
            Level::Error,
            self.error_feedback_ttl,
            Instant::now(),
        ));
    }
}
