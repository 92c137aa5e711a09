//! Document data structures
//!
//! Per-document state held by the server: the full text as last synced and
//! the tracking state rebuilt from it. Tracking is recomputed wholesale on
//! every change; nothing is diffed or cached across edits.

use slimlsp::tracker::TrackingState;

/// Configuration for the language server
#[derive(Debug, Clone)]
pub struct Configuration {
    pub suppress_semicolon_warnings: bool,
    pub suppress_undefined_warnings: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            suppress_semicolon_warnings: false,
            suppress_undefined_warnings: false,
        }
    }
}

/// Complete per-file data: content plus the model built from it.
pub struct FileData {
    pub content: String,
    pub tracking: TrackingState,
}
