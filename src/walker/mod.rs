//! Archive traversal: discovers message files under a root directory.
//!
//! Directory convention: `root/<user>/<folder>/…/<file>`. The first
//! path segment under the root names the owning user; the folder is
//! every remaining directory segment joined with `/`, so nested archive
//! folders (`deleted_items/archive`) stay distinct. Files shallower
//! than `root/<user>/<folder>/` do not match the convention and are not
//! yielded. Traversal order is not stable across runs; ordering is the
//! query engine's job, not the walker's.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::types::error::{Result, ShelfError};

/// One discovered message file, annotated with its inferred location.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub user: String,
    pub folder: String,
    /// Path relative to the scan root, for traceability.
    pub filename: String,
}

/// Lazily walk `root`, yielding message files with their inferred
/// user/folder. Fails up front if `root` is missing or not a directory;
/// per-entry traversal failures are yielded as errors so the caller can
/// record them without aborting.
pub fn walk_root(root: &Path) -> Result<impl Iterator<Item = Result<DiscoveredFile>>> {
    if !root.is_dir() {
        return Err(ShelfError::InvalidRoot(root.display().to_string()));
    }

    let root = root.to_path_buf();
    let entries = WalkDir::new(&root)
        .min_depth(3)
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(annotate(&root, entry.path())),
            Ok(_) => None,
            Err(err) => Some(Err(ShelfError::Io(err.to_string()))),
        });

    Ok(entries)
}

fn annotate(root: &Path, path: &Path) -> Result<DiscoveredFile> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| ShelfError::Io(format!("{}: {}", path.display(), e)))?;

    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    // min_depth(3) guarantees at least user/folder/file.
    let user = segments[0].clone();
    let folder = segments[1..segments.len() - 1].join("/");

    Ok(DiscoveredFile {
        path: path.to_path_buf(),
        user,
        folder,
        filename: segments.join("/"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"Subject: x\r\n\r\nbody\r\n").unwrap();
    }

    #[test]
    fn test_walk_infers_user_and_folder() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("alice/inbox/1."));
        touch(&dir.path().join("alice/inbox/2."));
        touch(&dir.path().join("bob/sent/1."));

        let mut found: Vec<(String, String)> = walk_root(dir.path())
            .unwrap()
            .map(|f| {
                let f = f.unwrap();
                (f.user, f.folder)
            })
            .collect();
        found.sort();

        assert_eq!(
            found,
            vec![
                ("alice".to_string(), "inbox".to_string()),
                ("alice".to_string(), "inbox".to_string()),
                ("bob".to_string(), "sent".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_folders_join_segments() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("alice/deleted_items/archive/7."));

        let files: Vec<DiscoveredFile> = walk_root(dir.path())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].user, "alice");
        assert_eq!(files[0].folder, "deleted_items/archive");
        assert_eq!(files[0].filename, "alice/deleted_items/archive/7.");
    }

    #[test]
    fn test_shallow_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("stray-at-root"));
        touch(&dir.path().join("alice/stray-in-user"));
        touch(&dir.path().join("alice/inbox/1."));

        let files: Vec<DiscoveredFile> = walk_root(dir.path())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].folder, "inbox");
    }

    #[test]
    fn test_missing_root_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("does-not-exist");
        let err = match walk_root(&bogus) {
            Ok(_) => panic!("Missing root should be rejected"),
            Err(e) => e,
        };
        assert!(matches!(err, ShelfError::InvalidRoot(_)));
    }

    #[test]
    fn test_file_root_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain-file");
        touch(&file);
        let err = match walk_root(&file) {
            Ok(_) => panic!("File root should be rejected"),
            Err(e) => e,
        };
        assert!(matches!(err, ShelfError::InvalidRoot(_)));
    }
}
