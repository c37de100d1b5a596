//! Throwaway per-run directories for isolated executions.

use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::ExecError;

/// A uniquely named temporary directory holding the script and the gem tree
/// of one isolated run.
///
/// `dispose` removes it and logs any failure. If the value is dropped instead
/// (early return, panic, cancelled future) the directory is still removed.
#[derive(Debug)]
pub struct EphemeralWorkspace {
    dir: TempDir,
}

impl EphemeralWorkspace {
    pub fn create(prefix: &str) -> Result<Self, ExecError> {
        let dir = Builder::new().prefix(prefix).tempdir().map_err(|e| {
            ExecError::Workspace(format!("Could not create temporary directory: {}", e))
        })?;
        log::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn gem_home(&self) -> PathBuf {
        self.dir.path().join(".gem")
    }

    pub fn script_path(&self, script_name: &str) -> PathBuf {
        self.dir.path().join(script_name)
    }

    pub async fn write_script(&self, script_name: &str, code: &str) -> Result<PathBuf, ExecError> {
        let path = self.script_path(script_name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(code.as_bytes()).await?;
        file.flush().await?;
        Ok(path)
    }

    pub fn dispose(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => log::debug!("Removed workspace {}", path.display()),
            Err(e) => log::error!("Failed to remove workspace {}: {}", path.display(), e),
        }
    }
}
