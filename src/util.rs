//! Filesystem helpers shared by the build commands.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Copies every file under `src` into `dst`, keeping relative paths and
/// overwriting what's there. A missing `src` copies nothing. A file that can't
/// be copied is logged and skipped. Returns the number of files copied.
pub fn copy_dir(src: &Path, dst: &Path) -> usize {
    if !src.is_dir() {
        tracing::debug!("no directory at `{}`; nothing to copy", src.display());
        return 0;
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("walking `{}`: {}", src.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        let result = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::copy(entry.path(), &target));
        match result {
            Ok(_) => copied += 1,
            Err(e) => tracing::warn!(
                "copying `{}` to `{}`: {}",
                entry.path().display(),
                target.display(),
                e
            ),
        }
    }
    copied
}

/// Removes the file or directory tree at `path`. Returns `false` if there was
/// nothing to remove.
pub fn remove(path: &Path) -> io::Result<bool> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
