//! Workspace lifecycle management
//!
//! Creates, populates, and removes per-submission scratch directories.

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::workspace::WorkspaceError;

/// Hands out fresh workspaces under a scratch root
///
/// The root itself is only ever used to derive unique children; nothing is
/// written to it directly and only a request's own child is ever deleted.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    scratch_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
        }
    }

    /// Get the scratch root directory
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Create a new, empty, uniquely named workspace
    #[instrument(skip(self), fields(root = %self.scratch_root.display()))]
    pub async fn acquire(&self) -> Result<Workspace, WorkspaceError> {
        tokio::fs::create_dir_all(&self.scratch_root)
            .await
            .map_err(|source| WorkspaceError::CreateRoot {
                path: self.scratch_root.clone(),
                source,
            })?;

        let root = self
            .scratch_root
            .join(format!("ws-{}", Uuid::new_v4().simple()));

        // create_dir (not create_dir_all) fails on an existing path, so two
        // requests can never end up sharing a directory.
        tokio::fs::create_dir(&root)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: root.clone(),
                source,
            })?;

        debug!(path = %root.display(), "workspace acquired");

        Ok(Workspace {
            root,
            released: false,
        })
    }
}

/// A scratch directory owned by exactly one submission
///
/// # Cleanup
///
/// Call [`release()`](Self::release) once the submission is done. It consumes
/// the workspace, so a second release cannot be written. If a workspace is
/// dropped without being released (for example because the task driving it
/// panicked), `Drop` removes the directory synchronously and logs a warning.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    released: bool,
}

impl Workspace {
    /// Get the path to the workspace directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Get the path to a file inside the workspace
    ///
    /// Returns an error if the path contains path traversal attempts.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        if name.is_empty() || name.contains("..") || name.starts_with('/') {
            return Err(WorkspaceError::InvalidPath(format!(
                "path traversal not allowed: {name}"
            )));
        }
        Ok(self.root.join(name))
    }

    /// Write a file into the workspace
    #[instrument(skip(self, content))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<(), WorkspaceError> {
        let path = self.file_path(name)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content).await?;
        debug!(?path, len = content.len(), "wrote file to workspace");
        Ok(())
    }

    /// Check if a file exists in the workspace
    pub async fn file_exists(&self, name: &str) -> Result<bool, WorkspaceError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Recursively remove the workspace directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory could not be removed. The workspace
    /// counts as released either way; callers log the error and move on.
    #[must_use = "cleanup errors should be logged"]
    #[instrument(skip(self), fields(path = %self.root.display()))]
    pub async fn release(mut self) -> Result<(), WorkspaceError> {
        self.released = true;

        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                // Submissions may chmod their own directories away; take them back.
                let root = self.root.clone();
                tokio::task::spawn_blocking(move || {
                    restore_permissions(&root)?;
                    std::fs::remove_dir_all(&root)
                })
                .await
                .map_err(io::Error::other)
                .and_then(|res| res)
                .map_err(|source| WorkspaceError::Remove {
                    path: self.root.clone(),
                    source,
                })?;
            }
            Err(source) => {
                return Err(WorkspaceError::Remove {
                    path: self.root.clone(),
                    source,
                });
            }
        }

        debug!("workspace released");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        warn!(
            path = %self.root.display(),
            "Workspace dropped without release, removing it synchronously"
        );

        let result = std::fs::remove_dir_all(&self.root).or_else(|e| match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            io::ErrorKind::PermissionDenied => {
                restore_permissions(&self.root)?;
                std::fs::remove_dir_all(&self.root)
            }
            _ => Err(e),
        });

        if let Err(e) = result {
            warn!(path = %self.root.display(), error = %e, "best-effort workspace removal failed");
        }
    }
}

/// Make every directory under `path` owner-accessible again
fn restore_permissions(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if !meta.is_dir() {
        return Ok(());
    }

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    for entry in std::fs::read_dir(path)? {
        restore_permissions(&entry?.path())?;
    }
    Ok(())
}
