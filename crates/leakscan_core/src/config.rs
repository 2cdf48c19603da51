//! Configuration loading, validation, and resolution.
//!
//! One scan run is governed by a single [`EffectiveConfig`], produced by
//! merging three layers with fixed precedence: caller overrides win over the
//! optional `.gitleaksrc.json` document, which wins over the built-in
//! [`DefaultPolicy`]. Config-file arrays replace the defaults wholesale per
//! key; caller additions are cumulative: custom patterns and ignore paths
//! are appended to the resolved lists, and the detector exclusion set is the
//! union of the config `ignoredPatterns` list and the caller exclude list.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::registry::PatternRegistry;

/// Top-level keys recognised in the configuration document. Anything else
/// is tolerated and reported as a non-fatal warning.
const KNOWN_KEYS: &[&str] = &[
    "customPatterns",
    "ignoredPatterns",
    "ignorePaths",
    "ignoreExtensions",
    "includePatterns",
    "maxFileSizeKb",
];

/// Path prefixes ignored by default: version-control metadata, dependency
/// manager directories, and lockfiles.
const DEFAULT_IGNORE_PATHS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "vendor",
    "package-lock.json",
    "yarn.lock",
    "Cargo.lock",
];

/// The hard-coded policy applied when no config file or override says
/// otherwise.
///
/// Constructed explicitly at startup and passed into the resolver, so that
/// resolution stays deterministic and testable in isolation.
#[derive(Debug, Clone)]
pub struct DefaultPolicy {
    /// Path prefixes excluded from scanning.
    pub ignore_paths: Vec<String>,
    /// Case-insensitive filename suffixes excluded from scanning.
    pub ignore_extensions: Vec<String>,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            ignore_paths: DEFAULT_IGNORE_PATHS.iter().map(ToString::to_string).collect(),
            ignore_extensions: Vec::new(),
        }
    }
}

/// Caller-supplied overrides, typically collected from CLI flags.
///
/// These are cumulative on top of the config file: `ignore_paths` and
/// `custom_patterns` are appended to the resolved lists, and
/// `exclude_detectors` is unioned with the file's `ignoredPatterns`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Extra path prefixes to ignore, appended to the resolved list.
    pub ignore_paths: Vec<String>,
    /// Extra anonymous patterns, appended after config-file custom patterns.
    pub custom_patterns: Vec<String>,
    /// Built-in detector names to disable.
    pub exclude_detectors: Vec<String>,
}

/// A built-in detector that survived exclusion filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detector {
    /// Detector name from the registry.
    pub name: String,
    /// Regular expression source.
    pub regex: String,
}

/// The fully merged, validated policy for one scan run.
///
/// Constructed once per invocation and immutable thereafter.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// Surviving built-in detectors, in registry order.
    pub detectors: Vec<Detector>,
    /// Anonymous user patterns, appended after the built-ins when scanning.
    pub custom_patterns: Vec<String>,
    /// Path prefixes (relative to the scan root) excluded from scanning.
    pub ignore_paths: Vec<String>,
    /// Case-insensitive filename suffixes excluded from scanning.
    pub ignore_extensions: Vec<String>,
    /// Glob allow-list; when non-empty, a file must match at least one.
    pub include_patterns: Vec<String>,
    /// Maximum eligible file size in kilobytes.
    pub max_file_size_kb: Option<u64>,
}

impl EffectiveConfig {
    /// Returns the ordered pattern sources: built-ins in registry order,
    /// then custom patterns in supplied order.
    pub fn pattern_sources(&self) -> impl Iterator<Item = &str> {
        self.detectors
            .iter()
            .map(|d| d.regex.as_str())
            .chain(self.custom_patterns.iter().map(String::as_str))
    }

    /// Returns the size cap converted to bytes, if one is set.
    #[must_use]
    pub fn max_file_size_bytes(&self) -> Option<u64> {
        self.max_file_size_kb.map(|kb| kb.saturating_mul(1024))
    }
}

/// A non-fatal diagnostic produced during configuration resolution.
///
/// Warnings never alter the resolved configuration; the offending entries
/// simply have no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// The config document contained top-level keys the resolver does not
    /// recognise.
    UnknownKeys(Vec<String>),
    /// `ignoredPatterns` named detectors that do not exist in the registry.
    UnknownIgnoredPatterns(Vec<String>),
}

impl std::fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKeys(keys) => {
                write!(f, "unknown configuration keys ignored: {}", keys.join(", "))
            }
            Self::UnknownIgnoredPatterns(names) => {
                write!(
                    f,
                    "'ignoredPatterns' names unknown detectors: {}",
                    names.join(", ")
                )
            }
        }
    }
}

/// The outcome of configuration resolution: the effective policy plus any
/// non-fatal warnings collected along the way.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The merged, validated configuration.
    pub config: EffectiveConfig,
    /// Diagnostics for the caller's warning sink.
    pub warnings: Vec<ResolveWarning>,
}

/// The parsed and shape-validated `.gitleaksrc.json` document.
///
/// Every field is optional; absent keys fall through to the default policy.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Anonymous user pattern sources.
    pub custom_patterns: Option<Vec<String>>,
    /// Built-in detector names to disable.
    pub ignored_patterns: Option<Vec<String>>,
    /// Path prefixes to ignore.
    pub ignore_paths: Option<Vec<String>>,
    /// Filename suffixes to ignore.
    pub ignore_extensions: Option<Vec<String>>,
    /// Glob allow-list.
    pub include_patterns: Option<Vec<String>>,
    /// Size cap in kilobytes.
    pub max_file_size_kb: Option<u64>,
}

impl ConfigFile {
    /// Loads and validates the config document at `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist; a missing config is
    /// not an error and the default policy applies.
    pub fn load(path: &Path) -> Result<Option<(Self, Vec<ResolveWarning>)>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(path, &content).map(Some)
    }

    /// Parses and shape-validates a config document.
    ///
    /// Validation is done by hand over the JSON value so that errors name
    /// the offending field and unrecognised keys warn instead of failing.
    pub fn parse(path: &Path, content: &str) -> Result<(Self, Vec<ResolveWarning>), ConfigError> {
        let value: Value = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let Value::Object(object) = value else {
            return Err(ConfigError::NotAnObject {
                path: path.to_path_buf(),
            });
        };

        let mut warnings = Vec::new();

        let unknown: Vec<String> = object
            .keys()
            .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            warnings.push(ResolveWarning::UnknownKeys(unknown));
        }

        let file = Self {
            custom_patterns: string_array(&object, "customPatterns")?,
            ignored_patterns: string_array(&object, "ignoredPatterns")?,
            ignore_paths: string_array(&object, "ignorePaths")?,
            ignore_extensions: string_array(&object, "ignoreExtensions")?,
            include_patterns: string_array(&object, "includePatterns")?,
            max_file_size_kb: size_cap(&object)?,
        };

        Ok((file, warnings))
    }
}

fn string_array(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<Vec<String>>, ConfigError> {
    let Some(value) = object.get(field) else {
        return Ok(None);
    };

    let Value::Array(items) = value else {
        return Err(ConfigError::InvalidField { field });
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(ConfigError::InvalidField { field }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn size_cap(object: &serde_json::Map<String, Value>) -> Result<Option<u64>, ConfigError> {
    const FIELD: &str = "maxFileSizeKb";

    let Some(value) = object.get(FIELD) else {
        return Ok(None);
    };

    // Fractional or negative caps have no meaning at byte granularity.
    value
        .as_u64()
        .map(Some)
        .ok_or(ConfigError::InvalidField { field: FIELD })
}

/// Produces one [`EffectiveConfig`] per invocation from the default policy,
/// an optional config document, and caller overrides.
///
/// The resolver holds only read-only inputs, so resolving twice with the
/// same filesystem state yields identical results.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    registry: PatternRegistry,
    defaults: DefaultPolicy,
}

impl ConfigResolver {
    /// Creates a resolver over the given registry and default policy.
    #[must_use]
    pub const fn new(registry: PatternRegistry, defaults: DefaultPolicy) -> Self {
        Self { registry, defaults }
    }

    /// Loads `<root>/.gitleaksrc.json` (if present) and resolves it against
    /// the defaults and the supplied overrides.
    pub fn resolve_from_root(&self, root: &Path, overrides: &Overrides) -> Result<Resolution, ConfigError> {
        self.resolve_from_path(&root.join(crate::CONFIG_FILENAME), overrides)
    }

    /// Loads the config document at an explicit path and resolves it.
    pub fn resolve_from_path(&self, path: &Path, overrides: &Overrides) -> Result<Resolution, ConfigError> {
        match ConfigFile::load(path)? {
            Some((file, parse_warnings)) => {
                let mut resolution = self.resolve(Some(&file), overrides);
                let mut warnings = parse_warnings;
                warnings.append(&mut resolution.warnings);
                resolution.warnings = warnings;
                Ok(resolution)
            }
            None => Ok(self.resolve(None, overrides)),
        }
    }

    /// Merges the three configuration layers into an [`EffectiveConfig`].
    ///
    /// Pure with respect to its inputs; all filesystem access happens in
    /// [`ConfigFile::load`].
    #[must_use]
    pub fn resolve(&self, file: Option<&ConfigFile>, overrides: &Overrides) -> Resolution {
        let mut warnings = Vec::new();

        let excluded = self.excluded_detectors(file, overrides, &mut warnings);

        let detectors: Vec<Detector> = self
            .registry
            .all_patterns()
            .filter(|def| !excluded.contains(&def.name))
            .map(|def| Detector {
                name: def.name.to_string(),
                regex: def.regex.to_string(),
            })
            .collect();

        let mut custom_patterns = file
            .and_then(|f| f.custom_patterns.clone())
            .unwrap_or_default();
        custom_patterns.extend(overrides.custom_patterns.iter().cloned());

        let mut ignore_paths = file
            .and_then(|f| f.ignore_paths.clone())
            .unwrap_or_else(|| self.defaults.ignore_paths.clone());
        ignore_paths.extend(overrides.ignore_paths.iter().cloned());

        let ignore_extensions = file
            .and_then(|f| f.ignore_extensions.clone())
            .unwrap_or_else(|| self.defaults.ignore_extensions.clone());

        let include_patterns = file
            .and_then(|f| f.include_patterns.clone())
            .unwrap_or_default();

        let max_file_size_kb = file.and_then(|f| f.max_file_size_kb);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            detectors = detectors.len(),
            custom = custom_patterns.len(),
            "configuration resolved"
        );

        Resolution {
            config: EffectiveConfig {
                detectors,
                custom_patterns,
                ignore_paths,
                ignore_extensions,
                include_patterns,
                max_file_size_kb,
            },
            warnings,
        }
    }

    /// Unions the two detector-disabling controls and warns about names
    /// that do not exist in the registry.
    fn excluded_detectors<'a>(
        &self,
        file: Option<&'a ConfigFile>,
        overrides: &'a Overrides,
        warnings: &mut Vec<ResolveWarning>,
    ) -> Vec<&'a str> {
        let ignored = file
            .and_then(|f| f.ignored_patterns.as_deref())
            .unwrap_or_default();

        let unknown: Vec<String> = ignored
            .iter()
            .filter(|name| !self.registry.contains(name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            warnings.push(ResolveWarning::UnknownIgnoredPatterns(unknown));
        }

        ignored
            .iter()
            .chain(overrides.exclude_detectors.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Errors that can occur when reading, parsing, or validating the
/// configuration document. All of them are fatal: a malformed config is a
/// user error that must surface before any scanning happens.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read from disk.
    #[error("failed to read config '{path}': {source}")]
    Read {
        /// Path to the config file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON.
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        /// Path to the config file.
        path: PathBuf,
        /// The underlying JSON deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The config document is valid JSON but not a JSON object.
    #[error("invalid config '{path}': document must be a JSON object")]
    NotAnObject {
        /// Path to the config file.
        path: PathBuf,
    },

    /// A known key has the wrong type or an out-of-range value.
    #[error("invalid config field '{field}'")]
    InvalidField {
        /// Name of the offending top-level key.
        field: &'static str,
    },

    /// An `includePatterns` glob failed to compile.
    #[error("invalid include glob '{pattern}': {source}")]
    InvalidGlob {
        /// The glob source that failed to compile.
        pattern: String,
        /// The underlying glob compilation error.
        #[source]
        source: globset::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ConfigResolver {
        ConfigResolver::new(PatternRegistry::builtin(), DefaultPolicy::default())
    }

    fn parse(content: &str) -> Result<(ConfigFile, Vec<ResolveWarning>), ConfigError> {
        ConfigFile::parse(Path::new(".gitleaksrc.json"), content)
    }

    #[test]
    fn resolve_without_file_or_overrides_returns_default_policy() {
        let resolution = resolver().resolve(None, &Overrides::default());
        let config = resolution.config;

        assert_eq!(config.detectors.len(), PatternRegistry::builtin().len());
        assert!(config.custom_patterns.is_empty());
        assert_eq!(config.ignore_paths, DefaultPolicy::default().ignore_paths);
        assert!(config.ignore_extensions.is_empty());
        assert!(config.include_patterns.is_empty());
        assert!(config.max_file_size_kb.is_none());
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn resolve_is_idempotent() {
        let file = parse(r#"{"ignorePaths": ["dist"], "customPatterns": ["X_[0-9]+"]}"#)
            .unwrap()
            .0;
        let overrides = Overrides {
            custom_patterns: vec!["Y_[0-9]+".into()],
            ..Overrides::default()
        };

        let first = resolver().resolve(Some(&file), &overrides);
        let second = resolver().resolve(Some(&file), &overrides);

        assert_eq!(first.config.ignore_paths, second.config.ignore_paths);
        assert_eq!(first.config.custom_patterns, second.config.custom_patterns);
        let a: Vec<&str> = first.config.pattern_sources().collect();
        let b: Vec<&str> = second.config.pattern_sources().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn config_file_lists_replace_defaults_wholesale() {
        let file = parse(r#"{"ignorePaths": ["dist"]}"#).unwrap().0;
        let config = resolver().resolve(Some(&file), &Overrides::default()).config;
        assert_eq!(config.ignore_paths, vec!["dist"]);
    }

    #[test]
    fn caller_ignore_paths_append_to_the_config_file_list() {
        let file = parse(r#"{"ignorePaths": ["dist"]}"#).unwrap().0;
        let overrides = Overrides {
            ignore_paths: vec!["build".into()],
            ..Overrides::default()
        };
        let config = resolver().resolve(Some(&file), &overrides).config;
        assert_eq!(config.ignore_paths, vec!["dist", "build"]);
    }

    #[test]
    fn caller_ignore_paths_keep_the_defaults_active() {
        let overrides = Overrides {
            ignore_paths: vec!["secrets".into()],
            ..Overrides::default()
        };
        let config = resolver().resolve(None, &overrides).config;

        assert!(config.ignore_paths.iter().any(|p| p == "node_modules"));
        assert!(config.ignore_paths.iter().any(|p| p == ".git"));
        assert!(config.ignore_paths.iter().any(|p| p == "secrets"));
    }

    #[test]
    fn caller_custom_patterns_append_after_config_file_patterns() {
        let file = parse(r#"{"customPatterns": ["FIRST"]}"#).unwrap().0;
        let overrides = Overrides {
            custom_patterns: vec!["SECOND".into()],
            ..Overrides::default()
        };
        let config = resolver().resolve(Some(&file), &overrides).config;
        assert_eq!(config.custom_patterns, vec!["FIRST", "SECOND"]);
    }

    #[test]
    fn pattern_sources_lists_builtins_before_customs_in_order() {
        let file = parse(r#"{"customPatterns": ["CUSTOM_A", "CUSTOM_B"]}"#).unwrap().0;
        let config = resolver().resolve(Some(&file), &Overrides::default()).config;

        let sources: Vec<&str> = config.pattern_sources().collect();
        assert_eq!(sources[0], r"AKIA[0-9A-Z]{16}");
        assert_eq!(sources[sources.len() - 2], "CUSTOM_A");
        assert_eq!(sources[sources.len() - 1], "CUSTOM_B");
    }

    #[test]
    fn ignored_patterns_remove_builtin_detectors() {
        let file = parse(r#"{"ignoredPatterns": ["awsAccessKey"]}"#).unwrap().0;
        let config = resolver().resolve(Some(&file), &Overrides::default()).config;
        assert!(!config.detectors.iter().any(|d| d.name == "awsAccessKey"));
        assert_eq!(config.detectors.len(), PatternRegistry::builtin().len() - 1);
    }

    #[test]
    fn caller_excludes_union_with_config_ignored_patterns() {
        let file = parse(r#"{"ignoredPatterns": ["awsAccessKey"]}"#).unwrap().0;
        let overrides = Overrides {
            exclude_detectors: vec!["githubToken".into()],
            ..Overrides::default()
        };
        let config = resolver().resolve(Some(&file), &overrides).config;
        assert!(!config.detectors.iter().any(|d| d.name == "awsAccessKey"));
        assert!(!config.detectors.iter().any(|d| d.name == "githubToken"));
    }

    #[test]
    fn unknown_top_level_keys_warn_but_do_not_fail() {
        let (_, warnings) = parse(r#"{"unknownKey": "value"}"#).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().contains("unknownKey"));
    }

    #[test]
    fn unknown_ignored_pattern_names_warn_and_have_no_effect() {
        let file = parse(r#"{"ignoredPatterns": ["notADetector"]}"#).unwrap().0;
        let resolution = resolver().resolve(Some(&file), &Overrides::default());

        assert_eq!(resolution.config.detectors.len(), PatternRegistry::builtin().len());
        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].to_string().contains("notADetector"));
    }

    #[test]
    fn parse_rejects_non_object_document() {
        let result = parse(r#"["just", "an", "array"]"#);
        assert!(matches!(result, Err(ConfigError::NotAnObject { .. })));
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let result = parse("INVALID_JSON");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn parse_rejects_custom_patterns_that_are_not_an_array() {
        let result = parse(r#"{"customPatterns": "not-an-array"}"#);
        match result {
            Err(ConfigError::InvalidField { field }) => assert_eq!(field, "customPatterns"),
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_array_with_non_string_elements() {
        let result = parse(r#"{"ignorePaths": ["ok", 42]}"#);
        match result {
            Err(ConfigError::InvalidField { field }) => assert_eq!(field, "ignorePaths"),
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn parse_accepts_integer_size_cap() {
        let (file, _) = parse(r#"{"maxFileSizeKb": 500}"#).unwrap();
        assert_eq!(file.max_file_size_kb, Some(500));
    }

    #[test]
    fn parse_rejects_non_numeric_size_cap() {
        let result = parse(r#"{"maxFileSizeKb": "big"}"#);
        match result {
            Err(ConfigError::InvalidField { field }) => assert_eq!(field, "maxFileSizeKb"),
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_negative_size_cap() {
        let result = parse(r#"{"maxFileSizeKb": -1}"#);
        assert!(matches!(result, Err(ConfigError::InvalidField { field: "maxFileSizeKb" })));
    }

    #[test]
    fn max_file_size_bytes_converts_kilobytes() {
        let file = parse(r#"{"maxFileSizeKb": 2}"#).unwrap().0;
        let config = resolver().resolve(Some(&file), &Overrides::default()).config;
        assert_eq!(config.max_file_size_bytes(), Some(2048));
    }

    #[test]
    fn max_file_size_bytes_saturates_on_huge_caps() {
        let json = format!(r#"{{"maxFileSizeKb": {}}}"#, u64::MAX);
        let file = parse(&json).unwrap().0;
        let config = resolver().resolve(Some(&file), &Overrides::default()).config;
        assert_eq!(config.max_file_size_bytes(), Some(u64::MAX));
    }

    #[test]
    fn load_returns_none_when_file_absent() {
        let loaded = ConfigFile::load(Path::new("/nonexistent/.gitleaksrc.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn resolve_from_root_applies_defaults_when_file_absent() {
        let dir = tempfile::TempDir::new().unwrap();
        let resolution = resolver()
            .resolve_from_root(dir.path(), &Overrides::default())
            .unwrap();
        assert_eq!(resolution.config.ignore_paths, DefaultPolicy::default().ignore_paths);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn resolve_from_root_reads_and_merges_the_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(crate::CONFIG_FILENAME),
            r#"{"ignorePaths": ["dist"], "unknownKey": true}"#,
        )
        .unwrap();

        let resolution = resolver()
            .resolve_from_root(dir.path(), &Overrides::default())
            .unwrap();

        assert_eq!(resolution.config.ignore_paths, vec!["dist"]);
        assert_eq!(resolution.warnings.len(), 1);
    }

    #[test]
    fn config_error_display_names_the_field() {
        let error = ConfigError::InvalidField { field: "customPatterns" };
        assert!(error.to_string().contains("customPatterns"));
    }
}
