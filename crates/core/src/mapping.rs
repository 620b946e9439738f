//! Tree mapping
//!
//! Turns a [`TransferOperation`] into the concrete list of files to move. A
//! directory upload walks the local tree lazily; every other case yields one
//! mapping. Calling [`map_files`] again walks the filesystem again.
//!
//! Entries the walk cannot read come out as [`SkippedItem`]s so the driver can
//! report them alongside files that failed to open.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::direction::{Direction, TransferOperation};
use crate::error::{Error, Result};
use crate::path::{base_name, join_key, relative_key};

/// One file to transfer
///
/// For uploads `local` is the source and `key` the destination; for
/// downloads the roles are swapped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileMapping {
    pub local: PathBuf,
    pub key: String,
}

impl FileMapping {
    pub fn new(local: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            key: key.into(),
        }
    }
}

/// A file left out of a batch upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub local: PathBuf,
    pub key: String,
    pub reason: String,
}

/// One walked entry: a file to transfer, or one that had to be left out
pub type MappedFile = std::result::Result<FileMapping, SkippedItem>;

/// Lazy sequence of [`MappedFile`]s
pub struct FileMappings {
    inner: Inner,
}

enum Inner {
    Single(Option<FileMapping>),
    Walk {
        root: PathBuf,
        prefix: String,
        walker: walkdir::IntoIter,
    },
}

impl Iterator for FileMappings {
    type Item = MappedFile;

    fn next(&mut self) -> Option<MappedFile> {
        match &mut self.inner {
            Inner::Single(mapping) => mapping.take().map(Ok),
            Inner::Walk {
                root,
                prefix,
                walker,
            } => next_walked(root, prefix, walker),
        }
    }
}

fn next_walked(root: &Path, prefix: &str, walker: &mut walkdir::IntoIter) -> Option<MappedFile> {
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                let local = e.path().unwrap_or(root).to_path_buf();
                let key = walked_key(root, prefix, &local).unwrap_or_default();
                return Some(Err(SkippedItem {
                    local,
                    key,
                    reason: e.to_string(),
                }));
            }
        };

        // Symlinks report their own type since links are not followed
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(key) = walked_key(root, prefix, entry.path()) else {
            tracing::warn!(path = %entry.path().display(), "Entry outside walk root");
            continue;
        };
        return Some(Ok(FileMapping::new(entry.into_path(), key)));
    }
    None
}

fn walked_key(root: &Path, prefix: &str, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(join_key(prefix, &relative_key(relative)))
}

/// Compute the files to transfer for `operation`
pub fn map_files(operation: &TransferOperation) -> Result<FileMappings> {
    let local = &operation.local;
    let remote = &operation.remote;

    let inner = match operation.direction {
        Direction::Upload if local.is_directory => {
            if !remote.is_prefix {
                return Err(Error::InvalidOperation(format!(
                    "destination '{remote}' must end with '/' when the source is a directory"
                )));
            }
            Inner::Walk {
                root: local.path.clone(),
                prefix: remote.key.clone(),
                walker: WalkDir::new(&local.path)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter(),
            }
        }
        Direction::Upload => {
            let key = if remote.is_prefix {
                let name = local
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                join_key(&remote.key, &name)
            } else {
                remote.key.clone()
            };
            Inner::Single(Some(FileMapping::new(local.path.clone(), key)))
        }
        Direction::Download => {
            if remote.is_prefix {
                return Err(Error::InvalidOperation(format!(
                    "remote source must be a single file (got '{remote}')"
                )));
            }
            let target = if local.is_directory {
                local.path.join(base_name(&remote.key))
            } else {
                local.path.clone()
            };
            Inner::Single(Some(FileMapping::new(target, remote.key.clone())))
        }
    };

    Ok(FileMappings { inner })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::params::TransferParams;
    use crate::path::{LocalAddress, RemoteAddress};

    fn operation(direction: Direction, local: &Path, remote: RemoteAddress) -> TransferOperation {
        TransferOperation {
            direction,
            local: LocalAddress::new(local),
            remote,
            params: TransferParams {
                permission: "private".into(),
                storage_class: "STANDARD".into(),
            },
        }
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("b").join("y.txt"), b"y").unwrap();
        dir
    }

    fn keys(mappings: FileMappings) -> HashSet<String> {
        mappings.map(|m| m.unwrap().key).collect()
    }

    #[test]
    fn test_directory_upload_keys() {
        let dir = tree();
        let op = operation(
            Direction::Upload,
            dir.path(),
            RemoteAddress::s3("us-east-1", "bucket", "dest/"),
        );

        let expected: HashSet<String> = ["dest/x.txt", "dest/b/y.txt"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(keys(map_files(&op).unwrap()), expected);
    }

    #[test]
    fn test_directory_upload_local_paths() {
        let dir = tree();
        let op = operation(
            Direction::Upload,
            dir.path(),
            RemoteAddress::gcs("bucket", ""),
        );

        let mappings: HashSet<FileMapping> =
            map_files(&op).unwrap().map(|m| m.unwrap()).collect();
        assert!(mappings.contains(&FileMapping::new(dir.path().join("x.txt"), "x.txt")));
        assert!(mappings.contains(&FileMapping::new(
            dir.path().join("b").join("y.txt"),
            "b/y.txt"
        )));
    }

    #[test]
    fn test_directory_upload_is_restartable() {
        let dir = tree();
        let op = operation(
            Direction::Upload,
            dir.path(),
            RemoteAddress::gcs("bucket", "dest/"),
        );
        assert_eq!(
            keys(map_files(&op).unwrap()),
            keys(map_files(&op).unwrap())
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_upload_skips_symlinks() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path().join("x.txt"), dir.path().join("link.txt"))
            .unwrap();
        let op = operation(
            Direction::Upload,
            dir.path(),
            RemoteAddress::gcs("bucket", "dest/"),
        );
        assert!(!keys(map_files(&op).unwrap()).contains("dest/link.txt"));
    }

    #[test]
    fn test_walk_error_becomes_skipped_item() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("b").join("y.txt"), b"y").unwrap();
        std::fs::write(dir.path().join("z.txt"), b"z").unwrap();
        let op = operation(
            Direction::Upload,
            dir.path(),
            RemoteAddress::s3("us-east-1", "bucket", "dest/"),
        );

        // The root listing is read on the first step; `b` vanishes before it is opened
        let mut mappings = map_files(&op).unwrap();
        assert_eq!(mappings.next().unwrap().unwrap().key, "dest/a.txt");
        std::fs::remove_dir_all(dir.path().join("b")).unwrap();

        let rest: Vec<_> = mappings.collect();
        assert_eq!(rest.len(), 2);
        let skipped = rest[0].as_ref().unwrap_err();
        assert_eq!(skipped.local, dir.path().join("b"));
        assert_eq!(skipped.key, "dest/b");
        assert_eq!(rest[1].as_ref().unwrap().key, "dest/z.txt");
    }

    #[test]
    fn test_directory_upload_requires_prefix() {
        let dir = tree();
        let op = operation(
            Direction::Upload,
            dir.path(),
            RemoteAddress::s3("us-east-1", "bucket", "dest"),
        );
        assert!(matches!(
            map_files(&op),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_single_file_upload_exact_key() {
        let dir = tree();
        let file = dir.path().join("x.txt");
        let op = operation(
            Direction::Upload,
            &file,
            RemoteAddress::s3("us-east-1", "bucket", "renamed.txt"),
        );
        let mappings: Vec<_> = map_files(&op).unwrap().collect();
        assert_eq!(mappings, vec![Ok(FileMapping::new(&file, "renamed.txt"))]);
    }

    #[test]
    fn test_single_file_upload_to_prefix() {
        let dir = tree();
        let file = dir.path().join("x.txt");
        let op = operation(
            Direction::Upload,
            &file,
            RemoteAddress::s3("us-east-1", "bucket", "dest/"),
        );
        let mappings: Vec<_> = map_files(&op).unwrap().collect();
        assert_eq!(mappings, vec![Ok(FileMapping::new(&file, "dest/x.txt"))]);
    }

    #[test]
    fn test_download_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let op = operation(
            Direction::Download,
            &out,
            RemoteAddress::s3("us-east-1", "bucket", "path/to/report.csv"),
        );
        let mappings: Vec<_> = map_files(&op).unwrap().collect();
        assert_eq!(
            mappings,
            vec![Ok(FileMapping::new(
                out.join("report.csv"),
                "path/to/report.csv"
            ))]
        );
    }

    #[test]
    fn test_download_to_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("local.csv");

        let op = operation(
            Direction::Download,
            &target,
            RemoteAddress::gcs("bucket", "path/to/report.csv"),
        );
        let mappings: Vec<_> = map_files(&op).unwrap().collect();
        assert_eq!(
            mappings,
            vec![Ok(FileMapping::new(&target, "path/to/report.csv"))]
        );
    }
}
