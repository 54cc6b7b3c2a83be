//! Release publisher: move the build output to its release location.
//!
//! A `rename(2)` is tried first. Mounted volumes and container overlays can
//! surface `EXDEV` ("Invalid cross-device link"); in that case the tree is
//! copied (symlinks recreated, not followed) and the source removed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Name of the published directory inside the release directory.
pub const RELEASE_OUTPUT_NAME: &str = "dist";

/// Move `output_dir` to `<release_dir>/dist`, replacing any previous release.
#[instrument(skip_all, fields(output_dir = %output_dir.display()))]
pub fn publish(output_dir: &Path, release_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(release_dir)
        .with_context(|| format!("create release directory {}", release_dir.display()))?;
    let destination = release_dir.join(RELEASE_OUTPUT_NAME);
    remove_existing(&destination)?;
    move_dir(output_dir, &destination)?;
    info!(destination = %destination.display(), "release published");
    Ok(destination)
}

/// Move a directory tree, falling back to copy + delete across devices.
pub fn move_dir(source: &Path, destination: &Path) -> Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => {
            debug!("renamed output directory");
            Ok(())
        }
        Err(err) if is_cross_device(&err) => {
            warn!(err = %err, "rename crossed devices, copying instead");
            copy_then_remove(source, destination)
        }
        Err(err) => Err(err).with_context(|| {
            format!("move {} to {}", source.display(), destination.display())
        }),
    }
}

/// Copy the tree to `destination`, then delete `source`.
///
/// The source is only removed once the copy completed.
pub fn copy_then_remove(source: &Path, destination: &Path) -> Result<()> {
    copy_tree(source, destination).with_context(|| {
        format!(
            "copy {} to {} after cross-device rename failed",
            source.display(),
            destination.display()
        )
    })?;
    fs::remove_dir_all(source)
        .with_context(|| format!("copied release but failed to remove {}", source.display()))
}

/// Recursively copy `source` to `destination`, recreating symlinks as links.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.with_context(|| format!("walk {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("relativize {}", entry.path().display()))?;
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("create {}", target.display()))?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())
                .with_context(|| format!("read link {}", entry.path().display()))?;
            symlink(&link, &target)?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(link: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link, target)
        .with_context(|| format!("create symlink {}", target.display()))
}

#[cfg(not(unix))]
fn symlink(_link: &Path, target: &Path) -> Result<()> {
    bail!("cannot recreate symlink {} on this platform", target.display())
}

fn remove_existing(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err).with_context(|| format!("stat {}", path.display())),
    };
    debug!(path = %path.display(), "removing previous release");
    if meta.is_dir() {
        fs::remove_dir_all(path).with_context(|| format!("remove {}", path.display()))
    } else if meta.is_file() || meta.file_type().is_symlink() {
        fs::remove_file(path).with_context(|| format!("remove {}", path.display()))
    } else {
        bail!("cannot replace {}: unsupported file type", path.display())
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices || err.raw_os_error() == Some(18)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestProject;

    #[test]
    fn publish_moves_output_into_release() {
        let project = TestProject::new();
        project.write("source/dist/index.html", "<html>v1</html>");
        project.write("source/dist/assets/app.js", "console.log(1)");

        let dest = publish(&project.path().join("source/dist"), &project.path().join("release"))
            .expect("publish");

        assert_eq!(dest, project.path().join("release/dist"));
        assert!(!project.path().join("source/dist").exists());
        assert_eq!(project.read("release/dist/index.html"), "<html>v1</html>");
        assert_eq!(project.read("release/dist/assets/app.js"), "console.log(1)");
    }

    #[test]
    fn publish_twice_keeps_only_second_run() {
        let project = TestProject::new();
        let release = project.path().join("release");

        project.write("source/build/index.html", "first");
        project.write("source/build/old.js", "stale");
        publish(&project.path().join("source/build"), &release).expect("first publish");

        project.write("source/build/index.html", "second");
        publish(&project.path().join("source/build"), &release).expect("second publish");

        assert_eq!(project.read("release/dist/index.html"), "second");
        assert!(!release.join("dist/old.js").exists());
    }

    #[test]
    fn publish_replaces_stray_file_at_destination() {
        let project = TestProject::new();
        project.write("release/dist", "not a directory");
        project.write("out/index.html", "ok");

        publish(&project.path().join("out"), &project.path().join("release")).expect("publish");
        assert_eq!(project.read("release/dist/index.html"), "ok");
    }

    #[test]
    fn missing_source_is_an_error() {
        let project = TestProject::new();
        let err = publish(&project.path().join("nope"), &project.path().join("release"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("move"));
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_preserves_symlinks() {
        let project = TestProject::new();
        project.write("src/assets/logo.svg", "<svg/>");
        std::os::unix::fs::symlink("assets/logo.svg", project.path().join("src/logo.svg"))
            .expect("symlink");

        copy_tree(&project.path().join("src"), &project.path().join("dst")).expect("copy");

        let copied = project.path().join("dst/logo.svg");
        assert!(fs::symlink_metadata(&copied).expect("stat").file_type().is_symlink());
        assert_eq!(fs::read_link(&copied).expect("read link"), PathBuf::from("assets/logo.svg"));
        assert_eq!(project.read("dst/assets/logo.svg"), "<svg/>");
    }

    #[cfg(unix)]
    #[test]
    fn copy_then_remove_moves_full_tree_and_keeps_links() {
        let project = TestProject::new();
        project.write("source/dist/index.html", "<html>v2</html>");
        project.write("source/dist/assets/app.js", "console.log(2)");
        std::os::unix::fs::symlink("assets/app.js", project.path().join("source/dist/app.js"))
            .expect("symlink");
        let destination = project.path().join("release/dist");

        copy_then_remove(&project.path().join("source/dist"), &destination).expect("copy");

        assert!(!project.path().join("source/dist").exists());
        assert_eq!(project.read("release/dist/index.html"), "<html>v2</html>");
        assert_eq!(project.read("release/dist/assets/app.js"), "console.log(2)");
        let link = destination.join("app.js");
        assert!(fs::symlink_metadata(&link).expect("stat").file_type().is_symlink());
        assert_eq!(fs::read_link(&link).expect("read link"), PathBuf::from("assets/app.js"));
    }

    #[test]
    fn failed_copy_keeps_the_source() {
        let project = TestProject::new();
        project.write("out/index.html", "keep me");
        project.write("release/dist", "a file, not a directory");

        let err = copy_then_remove(&project.path().join("out"), &project.path().join("release/dist"))
            .unwrap_err();

        assert!(format!("{err:#}").contains("cross-device"));
        assert_eq!(project.read("out/index.html"), "keep me");
    }

    #[test]
    fn detects_cross_device_errors() {
        assert!(is_cross_device(&io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}
