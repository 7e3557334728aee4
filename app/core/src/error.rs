//! Crate-level error type.
//!
//! Each module surfaces its own precise error enum; this wrapper exists
//! for host applications that funnel every engine failure into one place
//! (a message bar, a log sink) without matching per-module types.

use thiserror::Error;

use crate::collection::CollectionError;
use crate::download::DownloadError;
use crate::pipeline::TransformError;
use crate::settings::SettingsError;

/// Any failure the engine can surface.
#[derive(Debug, Error)]
pub enum MuralError {
    /// Collection mutation or persistence failure.
    #[error("collection error: {0}")]
    Collection(#[from] CollectionError),
    /// Download manager failure.
    #[error("download error: {0}")]
    Download(#[from] DownloadError),
    /// Settings persistence failure.
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    /// Transform collaborator failure.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
}
