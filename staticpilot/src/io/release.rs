//! Release bundle extras written next to the published output.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Fixed name of the rewrite-rule file inside the release directory.
pub const REWRITE_RULES_FILE: &str = "Pseudo-static";

/// Write `rules` (plus a trailing newline) to `<release_dir>/Pseudo-static`.
pub fn write_rewrite_rules(release_dir: &Path, rules: &str) -> Result<PathBuf> {
    fs::create_dir_all(release_dir)
        .with_context(|| format!("create release directory {}", release_dir.display()))?;
    let path = release_dir.join(REWRITE_RULES_FILE);
    let mut contents = rules.trim_end().to_string();
    contents.push('\n');
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
