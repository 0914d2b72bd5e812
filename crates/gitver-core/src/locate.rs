//! Find the version file that governs a working directory.
//!
//! Every file with the configured name under the repository root is a
//! candidate. Files nested below the starting directory belong to
//! sub-projects and are ignored; of the rest, the one with the fewest path
//! segments between it and the starting directory wins.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

/// Errors from version file discovery.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No file with the name exists anywhere under the root.
    #[error("no {file_name} found under {root}")]
    NotFound {
        /// Searched file name.
        file_name: String,
        /// Directory that was scanned.
        root: Utf8PathBuf,
    },

    /// Files exist, but only in sub-projects below the starting directory.
    #[error("no {file_name} applies to {start}: only nested sub-project files were found")]
    OnlyNested {
        /// Searched file name.
        file_name: String,
        /// Starting directory.
        start: Utf8PathBuf,
    },
}

/// Result alias for discovery.
pub type LocateResult<T> = Result<T, LocateError>;

/// Find the version file closest to `start`, scanning everything under
/// `root`.
///
/// Paths are canonicalized first when possible so that symlinked temp
/// directories compare equal to what git reports.
#[instrument(fields(start = %start, root = %root))]
pub fn find_version_file(
    start: &Utf8Path,
    root: &Utf8Path,
    file_name: &str,
) -> LocateResult<Utf8PathBuf> {
    let start = canonical(start);
    let root = canonical(root);

    let candidates: Vec<Utf8PathBuf> = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
        .collect();
    debug!(count = candidates.len(), "version file candidates");

    if candidates.is_empty() {
        return Err(LocateError::NotFound {
            file_name: file_name.to_string(),
            root,
        });
    }

    let mut best: Option<(usize, &Utf8PathBuf)> = None;
    for candidate in &candidates {
        let Some(dir) = candidate.parent() else {
            continue;
        };
        if dir != start.as_path() && dir.starts_with(&start) {
            trace!(%candidate, "skipping nested sub-project file");
            continue;
        }
        let distance = segment_distance(&start, dir);
        trace!(%candidate, distance, "candidate distance");
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            best = Some((distance, candidate));
        }
    }

    match best {
        Some((distance, path)) => {
            debug!(%path, distance, "selected version file");
            Ok(path.clone())
        }
        None => Err(LocateError::OnlyNested {
            file_name: file_name.to_string(),
            start,
        }),
    }
}

/// Number of directory hops between `a` and `b` through their common
/// ancestor.
fn segment_distance(a: &Utf8Path, b: &Utf8Path) -> usize {
    let common = a
        .components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .count();
    (a.components().count() - common) + (b.components().count() - common)
}

fn canonical(path: &Utf8Path) -> Utf8PathBuf {
    path.canonicalize_utf8()
        .unwrap_or_else(|_| path.to_path_buf())
}
