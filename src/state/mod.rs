/// State management module
///
/// Everything the sorting screen knows lives here, owned by the `Controller`:
/// - Shared data structures (data.rs)
/// - Folder items, cursor and classifications (session.rs)
/// - Destination list and hotkeys (destinations.rs)
/// - Zoom and pan of the image viewer (viewer.rs)
/// - Keyboard bindings (input.rs)
/// - The irreversible commit step (finalize.rs)
/// - Transient status text (feedback.rs)

pub mod controller;
pub mod data;
pub mod destinations;
pub mod feedback;
pub mod finalize;
pub mod input;
pub mod session;
pub mod viewer;
