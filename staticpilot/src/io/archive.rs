//! Task archive discovery and extraction.
//!
//! Extraction shells out to the usual tools (`unzip`, `7z`, `tar`, `unrar`)
//! through the execution port, so it is subject to the same capture limits
//! as build commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, instrument};

use crate::io::shell::Shell;

/// Supported archive formats, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    SevenZip,
    TarGz,
    Rar,
}

impl ArchiveKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".7z") {
            Some(Self::SevenZip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".rar") {
            Some(Self::Rar)
        } else {
            None
        }
    }

    /// Shell command extracting `archive` into `dest`.
    pub fn extract_command(self, archive: &Path, dest: &Path) -> String {
        let archive = shell_words::quote(&archive.to_string_lossy()).into_owned();
        let dest = shell_words::quote(&dest.to_string_lossy()).into_owned();
        match self {
            Self::Zip => format!("unzip -o {archive} -d {dest}"),
            Self::SevenZip => format!("7z x {archive} -o{dest} -y"),
            Self::TarGz => format!("tar -xzf {archive} -C {dest}"),
            Self::Rar => format!("7z x {archive} -o{dest} -y || unrar x {archive} {dest}"),
        }
    }
}

/// Pick the task archive: the first supported file in `task_dir` by name.
pub fn find_task_archive(task_dir: &Path) -> Result<PathBuf> {
    if !task_dir.is_dir() {
        bail!("task directory not found: {}", task_dir.display());
    }
    let mut candidates = Vec::new();
    for entry in fs::read_dir(task_dir).with_context(|| format!("read {}", task_dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", task_dir.display()))?;
        let path = entry.path();
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false)
            && ArchiveKind::from_path(&path).is_some()
        {
            candidates.push(path);
        }
    }
    candidates.sort();
    debug!(count = candidates.len(), "task archive candidates");
    candidates.into_iter().next().ok_or_else(|| {
        anyhow!(
            "no archive found in {}; expected zip/7z/tar.gz/tgz/rar",
            task_dir.display()
        )
    })
}

/// Extract `archive` into `dest`, creating `dest` when missing.
#[instrument(skip_all, fields(archive = %archive.display()))]
pub fn extract_archive<S: Shell>(shell: &S, archive: &Path, dest: &Path) -> Result<()> {
    let kind = ArchiveKind::from_path(archive)
        .ok_or_else(|| anyhow!("unsupported archive format: {}", archive.display()))?;
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;

    let command = kind.extract_command(archive, dest);
    info!(?kind, dest = %dest.display(), "extracting task archive");
    let result = shell.run(&command, dest).context("run extraction command")?;
    if !result.success() {
        let detail = if result.stderr.trim().is_empty() {
            result.stdout.trim()
        } else {
            result.stderr.trim()
        };
        bail!(
            "extract {} failed (exit {}): {}",
            archive.display(),
            result.exit_code,
            detail
        );
    }
    Ok(())
}
