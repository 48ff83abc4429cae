//! Atomic replacement of an executable on disk.
//!
//! The new bytes are copied into a sibling file (`<target>.tmp`) in the same
//! directory, then renamed over the target. A same-directory rename is atomic:
//! at every instant the target path resolves to either the complete old file
//! or the complete new file. Nothing else ever writes to the target path.

use crate::error::InstallError;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Install `new_binary` at `target`.
///
/// 1. Fails before touching any file if the target directory is missing.
/// 2. Copies `new_binary` into `<target>.tmp` (the staged file may live on a
///    different filesystem, so it is never renamed directly).
/// 3. Renames `<target>.tmp` onto `target`.
/// 4. Marks `target` executable (0755 on Unix).
///
/// Any failure before step 3 leaves `target` untouched. A failure in step 4
/// leaves the new binary installed but possibly not executable.
/// `<target>.tmp` is removed on every exit path.
///
/// # Errors
///
/// Returns the [`InstallError`] variant for the step that failed.
pub fn replace(new_binary: &Path, target: &Path) -> Result<(), InstallError> {
    let dir = target_dir(target);
    if !dir.is_dir() {
        return Err(InstallError::MissingDirectory(dir.to_path_buf()));
    }

    let staged = sibling_path(target);
    let guard = SiblingGuard(&staged);

    copy_contents(new_binary, &staged).map_err(|source| InstallError::Copy {
        from: new_binary.to_path_buf(),
        to: staged.clone(),
        source,
    })?;

    fs::rename(&staged, target).map_err(|source| InstallError::Rename {
        from: staged.clone(),
        to: target.to_path_buf(),
        source,
    })?;
    drop(guard);

    set_executable(target).map_err(|source| InstallError::Permissions {
        path: target.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %target.display(), "binary replaced");
    Ok(())
}

/// Returns `<target>.tmp`.
pub fn sibling_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Directory holding `target`; a bare file name lives in the current directory.
fn target_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Removes the sibling swap file when dropped.
struct SiblingGuard<'a>(&'a Path);

impl Drop for SiblingGuard<'_> {
    fn drop(&mut self) {
        match fs::remove_file(self.0) {
            Ok(()) => tracing::debug!(path = %self.0.display(), "removed swap file"),
            // Expected after a successful rename.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::debug!(path = %self.0.display(), error = %e, "failed to remove swap file");
            }
        }
    }
}

fn copy_contents(src: &Path, dst: &Path) -> io::Result<()> {
    let mut reader = File::open(src)?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o755);
    }
    let mut writer = options.open(dst)?;

    io::copy(&mut reader, &mut writer)?;
    writer.sync_all()
}

fn set_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn sibling_appends_tmp() {
        assert_eq!(
            sibling_path(Path::new("/usr/local/bin/myapp")),
            PathBuf::from("/usr/local/bin/myapp.tmp")
        );
        assert_eq!(
            sibling_path(Path::new("myapp.exe")),
            PathBuf::from("myapp.exe.tmp")
        );
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        assert_eq!(target_dir(Path::new("myapp")), Path::new("."));
        assert_eq!(target_dir(Path::new("/opt/myapp")), Path::new("/opt"));
    }

    #[test]
    fn replaces_contents_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("myapp");
        let staged = dir.path().join("download");
        fs::write(&target, "old-content").unwrap();
        fs::write(&staged, "new-content").unwrap();

        replace(&staged, &target).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new-content");
        assert!(!sibling_path(&target).exists());
        // The staged download is left for its owner to remove.
        assert!(staged.exists());
    }

    #[cfg(unix)]
    #[test]
    fn target_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("myapp");
        let staged = dir.path().join("download");
        fs::write(&target, "old").unwrap();
        fs::write(&staged, "new").unwrap();
        fs::set_permissions(&staged, fs::Permissions::from_mode(0o600)).unwrap();

        replace(&staged, &target).unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn creates_target_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("myapp");
        let staged = dir.path().join("download");
        fs::write(&staged, "fresh").unwrap();

        replace(&staged, &target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "fresh");
    }

    #[test]
    fn missing_directory_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-here");
        let target = missing.join("myapp");
        let staged = dir.path().join("download");
        fs::write(&staged, "new").unwrap();

        let err = replace(&staged, &target).unwrap_err();
        assert!(matches!(err, InstallError::MissingDirectory(ref p) if *p == missing));
        assert!(!missing.exists());
        assert!(!sibling_path(&target).exists());
    }

    #[test]
    fn missing_source_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("myapp");
        fs::write(&target, "old-content").unwrap();

        let err = replace(&dir.path().join("absent"), &target).unwrap_err();
        assert!(matches!(err, InstallError::Copy { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "old-content");
        assert!(!sibling_path(&target).exists());
    }

    #[test]
    fn rename_failure_leaves_target_untouched_and_removes_swap_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the target path cannot be replaced by a file.
        let target = dir.path().join("myapp");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();
        let staged = dir.path().join("download");
        fs::write(&staged, "new").unwrap();

        let err = replace(&staged, &target).unwrap_err();
        assert!(matches!(err, InstallError::Rename { .. }));
        assert!(target.join("keep").exists());
        assert!(!sibling_path(&target).exists());
    }

    #[test]
    fn stale_swap_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("myapp");
        let staged = dir.path().join("download");
        fs::write(&target, "old").unwrap();
        fs::write(sibling_path(&target), "leftover from a crash, much longer").unwrap();
        fs::write(&staged, "new").unwrap();

        replace(&staged, &target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert!(!sibling_path(&target).exists());
    }
}
