// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: cache  -  per-project scratch build area
//
//  <temp_root>/gamemaker-rubber/<project guid>/  holds the compiler's cache,
//  temp and output dirs plus the generated config files. It is reused by
//  every build of the same project.
// ─────────────────────────────────────────────────────────────────────────────

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::BuildEnvironment;
use crate::error::Result;
use crate::project;

/// Scratch dir for the project whose descriptor is `project_file`.
pub fn scratch_dir(env: &BuildEnvironment, project_file: &Path) -> Result<PathBuf> {
    let identity = project::locate(project_file)?;
    Ok(env.scratch_dir(&identity.guid))
}

/// Remove the project's scratch dir. A dir that is already gone is fine;
/// any other filesystem error is returned as-is.
pub fn clear(env: &BuildEnvironment, project_file: &Path) -> Result<PathBuf> {
    let dir = scratch_dir(env, project_file)?;
    match std::fs::remove_dir_all(&dir) {
        Ok(()) => info!("cleared {}", dir.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(dir)
}
