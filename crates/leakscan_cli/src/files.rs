//! Candidate file collection.
//!
//! Walks the scan root and gathers every regular file. Ignored path
//! prefixes are pruned during the walk so whole trees like `node_modules`
//! are never descended into; the core file filter re-applies the full
//! eligibility policy (extensions, include globs, size caps) afterwards.
//! Gitignore and hidden-file filtering are disabled and symbolic links are
//! not followed.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Walks `root` and returns every regular file beneath it, sorted by path.
///
/// `prune` holds path prefixes relative to `root`; any entry under one of
/// them is skipped without being walked. Sorting makes the downstream
/// record order independent of directory iteration order and worker
/// scheduling.
#[must_use]
pub fn collect_files(root: &Path, prune: &[String]) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let walker = build_walker(root, prune);

    let (tx, rx) = std::sync::mpsc::channel();
    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |result| {
            if let Ok(entry) = result
                && entry.file_type().is_some_and(|ft| ft.is_file())
            {
                let _ = tx.send(entry.into_path());
            }
            ignore::WalkState::Continue
        })
    });
    drop(tx);

    let mut files: Vec<PathBuf> = rx.into_iter().collect();
    files.sort_unstable();
    files
}

fn build_walker(root: &Path, prune: &[String]) -> ignore::WalkParallel {
    let root_owned = root.to_path_buf();
    let prefixes = prune.to_vec();

    WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let relative = entry.path().strip_prefix(&root_owned).unwrap_or(entry.path());
            // String-prefix semantics, matching the core filter: "dist"
            // also prunes "distribution".
            let relative = relative.to_string_lossy();
            !prefixes.iter().any(|prefix| relative.starts_with(prefix.as_str()))
        })
        .build_parallel()
}
