use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// The full new contents of one file, next to what was there before.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileChange {
    pub path: PathBuf,
    /// `None` when the file is being created.
    pub original: Option<String>,
    pub contents: String,
}

impl FileChange {
    pub fn new(path: impl Into<PathBuf>, original: Option<String>, contents: String) -> Self {
        Self {
            path: path.into(),
            original,
            contents,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to create directory {path:?}: {cause}")]
    DirectoryCreationFailed { path: PathBuf, cause: io::Error },
    #[error("Failed to write {path:?}: {cause}")]
    WriteFailed { path: PathBuf, cause: io::Error },
}

impl Error {
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectoryCreationFailed { path, .. } | Self::WriteFailed { path, .. } => path,
        }
    }
}

/// A write that couldn't be undone, leaving `path` in its patched state (or
/// missing, if restoring it failed midway).
#[derive(Debug, Error)]
#[error("Failed to restore {path:?}: {cause}")]
pub struct RollbackFailed {
    pub path: PathBuf,
    pub cause: io::Error,
}

#[derive(Debug, Error)]
#[error("{cause}")]
pub struct ApplyFailed {
    pub cause: Error,
    pub rollback_failures: Vec<RollbackFailed>,
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.smisdk-tmp", file_name))
}

/// Writes through a sibling temp file, so `path` only ever holds complete
/// contents.
fn write_replacing(path: &Path, contents: &str) -> io::Result<()> {
    let temp = temp_path(path);
    fs::write(&temp, contents)?;
    fs::rename(&temp, path).map_err(|err| {
        let _ = fs::remove_file(&temp);
        err
    })
}

/// Creates any missing ancestors of `path`, returning the ones created,
/// outermost first.
fn create_parents(path: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut missing = path
        .ancestors()
        .skip(1)
        .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
        .map(Path::to_owned)
        .collect::<Vec<_>>();
    missing.reverse();
    for dir in &missing {
        log::info!("creating directory {:?}", dir);
        fs::create_dir(dir).map_err(|cause| Error::DirectoryCreationFailed {
            path: dir.clone(),
            cause,
        })?;
    }
    Ok(missing)
}

#[derive(Debug, Default)]
struct Journal<'a> {
    written: Vec<&'a FileChange>,
    created_dirs: Vec<PathBuf>,
}

impl<'a> Journal<'a> {
    fn roll_back(self) -> Vec<RollbackFailed> {
        let mut failures = Vec::new();
        for change in self.written.into_iter().rev() {
            log::warn!("rolling back {:?}", change.path);
            let result = match &change.original {
                Some(original) => write_replacing(&change.path, original),
                None => fs::remove_file(&change.path),
            };
            if let Err(cause) = result {
                failures.push(RollbackFailed {
                    path: change.path.clone(),
                    cause,
                });
            }
        }
        for dir in self.created_dirs.into_iter().rev() {
            if let Err(cause) = fs::remove_dir(&dir) {
                log::warn!("couldn't remove directory {:?}: {}", dir, cause);
            }
        }
        failures
    }
}

/// Writes every change, or none of them.
///
/// If any write fails, the files already written are restored from their
/// originals (and created files removed) before the error is returned.
pub fn apply(changes: &[FileChange]) -> Result<(), ApplyFailed> {
    let mut journal = Journal::default();
    for change in changes {
        let result = create_parents(&change.path).and_then(|created| {
            journal.created_dirs.extend(created);
            log::info!("writing {:?}", change.path);
            write_replacing(&change.path, &change.contents).map_err(|cause| Error::WriteFailed {
                path: change.path.clone(),
                cause,
            })
        });
        match result {
            Ok(()) => journal.written.push(change),
            Err(cause) => {
                log::error!("{}", cause);
                return Err(ApplyFailed {
                    cause,
                    rollback_failures: journal.roll_back(),
                });
            }
        }
    }
    Ok(())
}
