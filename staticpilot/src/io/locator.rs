//! Artifact locator: find the static-site output directory after a build.
//!
//! The oracle cannot be trusted to report where the build landed, so the
//! tree is searched for directories that directly contain an entry document.
//! Stale copies (templates, `public/`) commonly coexist with the fresh output;
//! the most recently modified candidate wins.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};
use walkdir::{DirEntry, WalkDir};

/// File whose presence marks a directory as a static-site root.
pub const ENTRY_DOCUMENT: &str = "index.html";

/// Deepest directory level examined, counting the root's children as 1.
pub const MAX_SEARCH_DEPTH: usize = 4;

/// Directory names never searched: dependency caches, VCS metadata and
/// framework caches. staticpilot's own working directories are passed to
/// [`locate`] separately since their names are configurable.
pub const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", ".next"];

/// Conventional output directories, checked under the root only when the
/// search found nothing.
pub const FALLBACK_DIRS: &[&str] = &["dist", "build", "out", "public"];

/// A directory that may hold the build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub path: PathBuf,
    /// Levels below the search root (children of the root are at depth 1).
    pub depth: usize,
    pub modified: SystemTime,
}

/// Return the most plausible output directory under `root`, if any.
///
/// Directories named in `working_dirs` are skipped like [`SKIPPED_DIRS`].
#[instrument(skip_all, fields(root = %root.display()))]
pub fn locate(root: &Path, working_dirs: &[String]) -> Result<Option<PathBuf>> {
    let mut candidates = entry_document_dirs(root, working_dirs)?;
    if candidates.is_empty() {
        debug!("no entry documents found, checking conventional output dirs");
        candidates = conventional_dirs(root)?;
    }
    debug!(count = candidates.len(), "artifact candidates");
    let best = most_recent(candidates);
    if let Some(candidate) = &best {
        debug!(path = %candidate.path.display(), depth = candidate.depth, "selected artifact directory");
    }
    Ok(best.map(|candidate| candidate.path))
}

/// Pick the newest candidate. Ties go to the shallower path, then to the
/// lexically smaller one.
pub fn most_recent(candidates: Vec<ArtifactCandidate>) -> Option<ArtifactCandidate> {
    candidates.into_iter().min_by(rank)
}

fn rank(a: &ArtifactCandidate, b: &ArtifactCandidate) -> Ordering {
    b.modified
        .cmp(&a.modified)
        .then(a.depth.cmp(&b.depth))
        .then_with(|| a.path.cmp(&b.path))
}

fn entry_document_dirs(root: &Path, working_dirs: &[String]) -> Result<Vec<ArtifactCandidate>> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_SEARCH_DEPTH)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry, working_dirs));

    let mut candidates = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(err = %err, "skipping unreadable path during artifact search");
                continue;
            }
        };
        if !entry.file_type().is_dir() || !entry.path().join(ENTRY_DOCUMENT).is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .with_context(|| format!("stat {}", entry.path().display()))?
            .modified()
            .with_context(|| format!("read mtime of {}", entry.path().display()))?;
        candidates.push(ArtifactCandidate {
            path: entry.path().to_path_buf(),
            depth: entry.depth(),
            modified,
        });
    }
    Ok(candidates)
}

fn conventional_dirs(root: &Path) -> Result<Vec<ArtifactCandidate>> {
    let mut candidates = Vec::new();
    for name in FALLBACK_DIRS {
        let path = root.join(name);
        if !path.is_dir() {
            continue;
        }
        let modified = path
            .metadata()
            .and_then(|meta| meta.modified())
            .with_context(|| format!("read mtime of {}", path.display()))?;
        candidates.push(ArtifactCandidate {
            path,
            depth: 1,
            modified,
        });
    }
    Ok(candidates)
}

fn is_skipped(entry: &DirEntry, working_dirs: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| {
            SKIPPED_DIRS.contains(&name) || working_dirs.iter().any(|dir| dir == name)
        })
}
