//! Supervisor error types

use std::path::PathBuf;

use super::key::SessionKey;

/// Error starting a converter session
///
/// Nothing is registered when either of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Output directory could not be created
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Converter process could not be spawned
    #[error("failed to spawn converter for {key}: {source}")]
    Spawn {
        key: SessionKey,
        #[source]
        source: std::io::Error,
    },
}
