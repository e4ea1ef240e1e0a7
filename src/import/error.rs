//! Import error types

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::RegistryError;
use crate::resources::{MeshError, TextureError};
use crate::scene::DecompositionError;

/// Errors raised while importing a scene.
///
/// Only [`UnsupportedAsset`](Self::UnsupportedAsset) and
/// [`ExternalParseFailure`](Self::ExternalParseFailure) abort an import. The
/// rest affect a single resource, which is logged and skipped.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported asset: {}", path.display())]
    UnsupportedAsset { path: PathBuf },

    #[error("{message}")]
    ExternalParseFailure { path: PathBuf, message: String },

    #[error("Failed to decompose transform of node \"{node}\": {source}")]
    DecompositionFailure {
        node: String,
        #[source]
        source: DecompositionError,
    },

    #[error("Failed to load texture \"{path}\": {source}")]
    ResourceLoadFailure {
        path: String,
        #[source]
        source: TextureError,
    },

    #[error("Invalid mesh \"{mesh}\": {source}")]
    InvalidMesh {
        mesh: String,
        #[source]
        source: MeshError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ImportError {
    /// Error concerns one resource; the import carries on without it
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ImportError::UnsupportedAsset { .. } | ImportError::ExternalParseFailure { .. }
        )
    }
}

/// Result type for scene import
pub type ImportResult<T> = Result<T, ImportError>;
