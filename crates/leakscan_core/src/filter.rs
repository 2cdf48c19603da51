//! File eligibility filtering.
//!
//! The [`FileFilter`] decides, per candidate path, whether the match engine
//! should look at it at all. Checks run cheapest-first: path prefixes and
//! extension suffixes need no filesystem access, include globs are matched
//! in memory, and only then is the file stat-ed for the size cap.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::{ConfigError, EffectiveConfig};
use crate::error::ScanError;

/// Compiled eligibility policy for one scan run.
///
/// Built once from the effective configuration; all per-file decisions are
/// read-only afterwards, so the filter can be shared across scan workers.
#[derive(Debug)]
pub struct FileFilter {
    root: PathBuf,
    ignore_paths: Vec<String>,
    ignore_extensions: Vec<String>,
    include: Option<GlobSet>,
    max_size_bytes: Option<u64>,
}

impl FileFilter {
    /// Compiles the filter from the effective configuration.
    ///
    /// Include globs are compiled eagerly so that a malformed glob fails the
    /// run before any file is visited.
    pub fn new(root: &Path, config: &EffectiveConfig) -> Result<Self, ConfigError> {
        let include = if config.include_patterns.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &config.include_patterns {
                let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                    pattern: pattern.clone(),
                    source,
                })?;
                builder.add(glob);
            }
            let set = builder.build().map_err(|source| ConfigError::InvalidGlob {
                pattern: config.include_patterns.join(", "),
                source,
            })?;
            Some(set)
        };

        Ok(Self {
            root: root.to_path_buf(),
            ignore_paths: config.ignore_paths.clone(),
            ignore_extensions: config
                .ignore_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            include,
            max_size_bytes: config.max_file_size_bytes(),
        })
    }

    /// Decides whether `path` should be scanned.
    ///
    /// The size-cap check stats the file; a failed stat is an error rather
    /// than a silent skip.
    pub fn is_eligible(&self, path: &Path) -> Result<bool, ScanError> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        // Plain string-prefix comparison, not component-wise: "dist" also
        // covers "distribution/app.js".
        let relative_str = relative.to_string_lossy();
        if self.ignore_paths.iter().any(|prefix| relative_str.starts_with(prefix.as_str())) {
            return Ok(false);
        }

        if self.matches_ignored_extension(relative) {
            return Ok(false);
        }

        if let Some(include) = &self.include
            && !include.is_match(relative)
        {
            return Ok(false);
        }

        if let Some(cap) = self.max_size_bytes {
            let metadata = std::fs::metadata(path).map_err(|source| ScanError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if metadata.len() > cap {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Suffix comparison against the lowercased file name, so that
    /// multi-part extensions like `.min.js` work.
    fn matches_ignored_extension(&self, relative: &Path) -> bool {
        let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let name = name.to_ascii_lowercase();
        self.ignore_extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigResolver, DefaultPolicy, Overrides};
    use crate::registry::PatternRegistry;

    fn config_from(json: &str) -> EffectiveConfig {
        let (file, _) = crate::config::ConfigFile::parse(Path::new(".gitleaksrc.json"), json)
            .expect("test config must parse");
        ConfigResolver::new(PatternRegistry::builtin(), DefaultPolicy::default())
            .resolve(Some(&file), &Overrides::default())
            .config
    }

    fn default_config() -> EffectiveConfig {
        ConfigResolver::new(PatternRegistry::builtin(), DefaultPolicy::default())
            .resolve(None, &Overrides::default())
            .config
    }

    #[test]
    fn default_ignore_paths_drop_dependency_directories() {
        let root = Path::new("/repo");
        let filter = FileFilter::new(root, &default_config()).unwrap();

        assert!(!filter.is_eligible(Path::new("/repo/node_modules/lib/index.js")).unwrap());
        assert!(!filter.is_eligible(Path::new("/repo/.git/config")).unwrap());
        assert!(!filter.is_eligible(Path::new("/repo/package-lock.json")).unwrap());
        assert!(filter.is_eligible(Path::new("/repo/src/main.js")).unwrap());
    }

    #[test]
    fn ignore_prefix_is_a_plain_string_prefix() {
        let root = Path::new("/repo");
        let filter = FileFilter::new(root, &config_from(r#"{"ignorePaths": ["dist"]}"#)).unwrap();

        assert!(!filter.is_eligible(Path::new("/repo/dist/app.js")).unwrap());
        assert!(!filter.is_eligible(Path::new("/repo/distribution/app.js")).unwrap());
        assert!(filter.is_eligible(Path::new("/repo/src/dist_helper.js")).unwrap());
    }

    #[test]
    fn ignored_extensions_are_case_insensitive_suffixes() {
        let root = Path::new("/repo");
        let filter = FileFilter::new(
            root,
            &config_from(r#"{"ignoreExtensions": [".png", ".min.js"]}"#),
        )
        .unwrap();

        assert!(!filter.is_eligible(Path::new("/repo/logo.PNG")).unwrap());
        assert!(!filter.is_eligible(Path::new("/repo/bundle.min.js")).unwrap());
        assert!(filter.is_eligible(Path::new("/repo/app.js")).unwrap());
    }

    #[test]
    fn include_globs_form_an_allow_list() {
        let root = Path::new("/repo");
        let filter =
            FileFilter::new(root, &config_from(r#"{"includePatterns": ["**/*.js"]}"#)).unwrap();

        assert!(filter.is_eligible(Path::new("/repo/src/app.js")).unwrap());
        assert!(!filter.is_eligible(Path::new("/repo/src/app.py")).unwrap());
    }

    #[test]
    fn empty_include_list_allows_everything() {
        let root = Path::new("/repo");
        let filter = FileFilter::new(root, &default_config()).unwrap();

        assert!(filter.is_eligible(Path::new("/repo/src/app.py")).unwrap());
        assert!(filter.is_eligible(Path::new("/repo/README.md")).unwrap());
    }

    #[test]
    fn malformed_include_glob_fails_construction() {
        let root = Path::new("/repo");
        let result = FileFilter::new(root, &config_from(r#"{"includePatterns": ["src/{"]}"#));
        assert!(matches!(result, Err(ConfigError::InvalidGlob { .. })));
    }

    #[test]
    fn size_cap_drops_oversized_files_and_keeps_small_ones() {
        let dir = tempfile::TempDir::new().unwrap();
        let small = dir.path().join("small.txt");
        let large = dir.path().join("large.txt");
        std::fs::write(&small, vec![b'a'; 1024]).unwrap();
        std::fs::write(&large, vec![b'a'; 600 * 1024]).unwrap();

        let filter =
            FileFilter::new(dir.path(), &config_from(r#"{"maxFileSizeKb": 500}"#)).unwrap();

        assert!(filter.is_eligible(&small).unwrap());
        assert!(!filter.is_eligible(&large).unwrap());
    }

    #[test]
    fn no_size_cap_means_no_stat_and_no_size_limit() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, vec![b'a'; 600 * 1024]).unwrap();

        let filter = FileFilter::new(dir.path(), &default_config()).unwrap();
        assert!(filter.is_eligible(&file).unwrap());
    }

    #[test]
    fn stat_failure_under_a_size_cap_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");

        let filter =
            FileFilter::new(dir.path(), &config_from(r#"{"maxFileSizeKb": 500}"#)).unwrap();

        assert!(matches!(filter.is_eligible(&missing), Err(ScanError::Io { .. })));
    }
}
