//! Textual survey of an extracted project, used only to build the first prompt.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const MANIFEST_FILE: &str = "package.json";
/// Rendered in place of manifests when the project has none.
pub const NO_MANIFEST: &str = "(no package.json found)";

/// List `dir` one entry per line, expanding directories `depth` levels deep.
///
/// ```text
/// source/: 2 items
/// - app/
///   package.json, src/
/// - README.md
/// ```
pub fn list_dir(dir: &Path, depth: usize) -> Result<String> {
    let entries = sorted_entries(dir)?;
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    let mut lines = vec![format!("{name}/: {} items", entries.len())];
    for (entry_name, is_dir) in &entries {
        if !is_dir {
            lines.push(format!("- {entry_name}"));
            continue;
        }
        lines.push(format!("- {entry_name}/"));
        if depth > 0 {
            let children = sorted_entries(&dir.join(entry_name))?;
            let listed: Vec<String> = children
                .iter()
                .map(|(child, child_is_dir)| {
                    if *child_is_dir {
                        format!("{child}/")
                    } else {
                        child.clone()
                    }
                })
                .collect();
            if listed.is_empty() {
                lines.push("  (empty)".to_string());
            } else {
                lines.push(format!("  {}", listed.join(", ")));
            }
        }
    }
    Ok(lines.join("\n"))
}

/// Render the project's `package.json` files.
///
/// Uses the root manifest when present, otherwise every direct child's. Each
/// block is headed by its path relative to `display_root`.
pub fn package_manifests(dir: &Path, display_root: &Path) -> Result<String> {
    let paths = manifest_paths(dir)?;
    if paths.is_empty() {
        return Ok(NO_MANIFEST.to_string());
    }
    let mut blocks = Vec::with_capacity(paths.len());
    for path in paths {
        let content =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let label = path.strip_prefix(display_root).unwrap_or(&path);
        blocks.push(format!("{}:\n{}", label.display(), content.trim()));
    }
    Ok(blocks.join("\n\n"))
}

fn manifest_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let root_manifest = dir.join(MANIFEST_FILE);
    if root_manifest.is_file() {
        return Ok(vec![root_manifest]);
    }
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|(_, is_dir)| *is_dir)
        .map(|(name, _)| dir.join(name).join(MANIFEST_FILE))
        .filter(|path| path.is_file())
        .collect())
}

fn sorted_entries(dir: &Path) -> Result<Vec<(String, bool)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    entries.sort();
    Ok(entries)
}
