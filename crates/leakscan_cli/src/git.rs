//! Local git repository operations for staged-file scanning.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use gix::bstr::ByteSlice as _;

/// Non-`Send` repository handle for single-threaded git operations.
#[derive(Debug)]
pub struct LocalRepo {
    inner: gix::Repository,
    workdir: PathBuf,
}

impl LocalRepo {
    /// Opens the repository containing `root`.
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let inner = gix::discover(root)
            .with_context(|| format!("'{}' is not inside a git repository", root.display()))?;
        let workdir = inner
            .workdir()
            .context("repository has no working directory")?
            .to_path_buf();

        Ok(Self { inner, workdir })
    }

    /// Returns absolute worktree paths of files in the index that differ
    /// from the HEAD tree.
    ///
    /// On an unborn branch every indexed file counts as staged. Entries
    /// whose worktree file no longer exists (staged deletions in progress)
    /// are skipped, since there is nothing on disk to scan.
    #[must_use]
    pub fn staged_files(&self) -> Vec<PathBuf> {
        let Ok(index) = self.inner.index_or_empty() else {
            return Vec::new();
        };

        let relative = match self.inner.head_tree_id() {
            Err(_) => Self::all_indexed_files(&index),
            Ok(head_tree_id) => match self.inner.find_tree(head_tree_id) {
                Ok(head_tree) => self.files_differing_from_tree(&index, &head_tree),
                Err(_) => Vec::new(),
            },
        };

        let mut files: Vec<PathBuf> = relative
            .into_iter()
            .map(|path| self.workdir.join(path))
            .filter(|path| path.is_file())
            .collect();
        files.sort_unstable();
        files
    }

    fn all_indexed_files(index: &gix::worktree::Index) -> Vec<PathBuf> {
        index
            .entries()
            .iter()
            .map(|e| PathBuf::from(e.path(index).to_string()))
            .collect()
    }

    fn files_differing_from_tree(&self, index: &gix::worktree::Index, head_tree: &gix::Tree<'_>) -> Vec<PathBuf> {
        let null_oid = gix::ObjectId::null(self.inner.object_hash());

        index
            .entries()
            .iter()
            .filter_map(|entry| {
                let path = entry.path(index);
                let entry_id = gix::ObjectId::from_bytes_or_panic(entry.id.as_bytes());

                let head_id = head_tree
                    .lookup_entry_by_path(path.to_str_lossy().as_ref())
                    .ok()
                    .flatten()
                    .map_or(null_oid, |e| e.object_id());

                (entry_id != head_id).then(|| PathBuf::from(path.to_string()))
            })
            .collect()
    }
}
