//! Per-submission scratch directories
//!
//! Each submission gets a fresh, uniquely named directory under a shared
//! scratch root. The directory is the only filesystem state a submission
//! touches, and it is removed when the submission finishes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use crate::workspace::manager::{Workspace, WorkspaceManager};

mod manager;

/// Errors that occur while managing workspaces
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create scratch root {path}: {source}")]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create workspace {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove workspace {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl WorkspaceError {
    fn io_source(&self) -> Option<&io::Error> {
        match self {
            WorkspaceError::CreateRoot { source, .. }
            | WorkspaceError::Create { source, .. }
            | WorkspaceError::Remove { source, .. }
            | WorkspaceError::Io(source) => Some(source),
            WorkspaceError::InvalidPath(_) => None,
        }
    }

    /// Whether the scratch filesystem ran out of space
    pub fn is_storage_full(&self) -> bool {
        self.io_source().is_some_and(|e| {
            e.kind() == io::ErrorKind::StorageFull || e.raw_os_error() == Some(libc::ENOSPC)
        })
    }
}
