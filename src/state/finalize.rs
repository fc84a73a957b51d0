/// The irreversible commit: build the request, hold the processing lock while
/// the backend works, and release it on every outcome.
use super::data::{SortRequest, SortResult};
use super::destinations::DestinationRegistry;
use super::session::SessionStore;
use crate::error::{Result, SorterError};

/// A request ready to submit, plus what the user should be told first
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizePlan {
    pub request: SortRequest,
    /// Classifications pointing at destinations that no longer exist
    pub orphaned: usize,
}

impl FinalizePlan {
    pub fn confirmation_title(&self) -> &'static str {
        "Ready to move files?"
    }

    pub fn confirmation_text(&self) -> String {
        let mut text = format!(
            "- {} images will be copied, verified, and deleted from source\n\
             - Every copy is verified with a SHA-256 hash before the source is deleted\n\
             - Duplicates already present in a destination will be detected and skipped",
            self.request.classifications.len()
        );
        if self.orphaned > 0 {
            text.push_str(&format!(
                "\n- {} images assigned to removed destinations will be left in place",
                self.orphaned
            ));
        }
        text.push_str("\n\nThis cannot be undone. Continue?");
        text
    }
}

/// How a finished finalize should be reported
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    /// Backend reported success; session state should be discarded
    Committed(String),
    /// Backend reported problems or could not be reached; state is kept
    Failed(String),
}

#[derive(Debug, Default)]
pub struct FinalizeCoordinator {
    processing: bool,
}

impl FinalizeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the request from the current session.
    ///
    /// Entries whose destination was removed are treated as unclassified:
    /// they are left out of the request and do not count towards the
    /// "something to do" precondition.
    pub fn prepare(&self, store: &SessionStore, registry: &DestinationRegistry) -> Result<FinalizePlan> {
        if self.processing {
            return Err(SorterError::Validation("Already processing".to_string()));
        }

        let source_path = store
            .source_path()
            .ok_or_else(|| SorterError::Validation("No session loaded".to_string()))?;

        let (classifications, orphans): (Vec<_>, Vec<_>) = store
            .classifications()
            .iter()
            .map(|(path, name)| (path.clone(), name.clone()))
            .partition(|(_, name)| registry.contains_name(name));

        if classifications.is_empty() {
            return Err(SorterError::Validation("No images classified yet".to_string()));
        }

        Ok(FinalizePlan {
            request: SortRequest {
                source_path: source_path.to_string(),
                destinations: registry.list().to_vec(),
                classifications: classifications.into_iter().collect(),
            },
            orphaned: orphans.len(),
        })
    }

    /// Enter processing mode.
    pub fn begin(&mut self) {
        self.processing = true;
    }

    /// Leave processing mode and classify the backend's answer.
    pub fn finish(&mut self, result: Result<SortResult>) -> FinalizeOutcome {
        self.processing = false;
        match result {
            Ok(result) if result.success => FinalizeOutcome::Committed(result.message),
            Ok(result) => FinalizeOutcome::Failed(result.message),
            Err(err) => FinalizeOutcome::Failed(format!("Error during file operations: {err}")),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }
}
