//! Run-scoped temporary workspace for local execution
//!
//! Each local attempt gets its own directory under the scratch dir, named
//! from a UTC timestamp plus a random suffix so concurrent runs never
//! collide. The directory is removed by [`TemporaryWorkspace::release`], or
//! by `Drop` if the owning future was abandoned before reaching it.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::sandbox::profile::LanguageProfile;

/// Prefix of every workspace directory name
pub const WORKSPACE_PREFIX: &str = "run-";

/// Directory holding one attempt's source and build artifacts
#[derive(Debug)]
pub struct TemporaryWorkspace {
    dir: PathBuf,
    source_path: PathBuf,
    executable_path: Option<PathBuf>,
    released: bool,
}

impl TemporaryWorkspace {
    /// Create a fresh workspace for a language under `scratch_dir`
    pub async fn create(scratch_dir: &Path, profile: &LanguageProfile) -> Result<Self> {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!(
            "{}{}-{}",
            WORKSPACE_PREFIX,
            Utc::now().format("%Y%m%d%H%M%S%3f"),
            &suffix[..8]
        );
        // Children run with the workspace as cwd, so every path handed to
        // them must be absolute.
        let scratch_dir = if scratch_dir.is_absolute() {
            scratch_dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(scratch_dir)
        };
        let dir = scratch_dir.join(name);

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Internal(format!(
                "Failed to create workspace {}: {}",
                dir.display(),
                e
            ))
        })?;

        debug!("Created workspace {}", dir.display());

        Ok(TemporaryWorkspace {
            source_path: dir.join(profile.source_file),
            executable_path: profile.executable_file.map(|exe| dir.join(exe)),
            dir,
            released: false,
        })
    }

    /// Workspace directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the source is written to
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Path of the compiled artifact, if the language produces one
    pub fn executable_path(&self) -> Option<&Path> {
        self.executable_path.as_deref()
    }

    /// Write the program source
    pub async fn write_source(&self, program: &str) -> Result<()> {
        tokio::fs::write(&self.source_path, program).await?;
        Ok(())
    }

    /// Remove the workspace. Failures are logged, never returned.
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => debug!("Removed workspace {}", self.dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove workspace {}: {}", self.dir.display(), e),
        }
    }
}

impl Drop for TemporaryWorkspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove workspace {}: {}", self.dir.display(), e);
            }
        }
    }
}

/// Remove workspaces left behind in `scratch_dir`, e.g. after a crash.
/// Returns how many were removed.
pub async fn remove_stale(scratch_dir: &Path) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(scratch_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let is_workspace = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(WORKSPACE_PREFIX));
        if !is_workspace || !entry.file_type().await?.is_dir() {
            continue;
        }
        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove stale workspace {}: {}", entry.path().display(), e),
        }
    }

    Ok(removed)
}
