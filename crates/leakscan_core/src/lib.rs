//! Core engine for the leakscan secret scanner.
//!
//! The crate is organised around four collaborators that together turn a
//! set of candidate files into a list of match records:
//!
//! - [`registry`]: the built-in detector definitions.
//! - [`config`]: configuration loading and three-layer resolution.
//! - [`filter`]: per-file eligibility decisions.
//! - [`scanner`]: combined pattern compilation and line scanning.
//!
//! A typical run resolves an [`EffectiveConfig`], builds a [`FileFilter`]
//! and a [`MatchEngine`] from it, filters the candidate paths, and scans
//! the survivors:
//!
//! ```no_run
//! use std::path::Path;
//!
//! use leakscan_core::prelude::*;
//!
//! fn run(root: &Path, files: Vec<std::path::PathBuf>) -> Result<Vec<MatchRecord>, LeakError> {
//!     let resolver = ConfigResolver::new(PatternRegistry::builtin(), DefaultPolicy::default());
//!     let resolution = resolver.resolve_from_root(root, &Overrides::default())?;
//!
//!     let filter = FileFilter::new(root, &resolution.config)?;
//!     let engine = MatchEngine::from_config(&resolution.config)?;
//!
//!     let mut eligible = Vec::new();
//!     for path in files {
//!         if filter.is_eligible(&path)? {
//!             eligible.push(path);
//!         }
//!     }
//!     Ok(engine.scan_files(&eligible)?)
//! }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod scanner;

pub use config::{
    ConfigError, ConfigFile, ConfigResolver, DefaultPolicy, Detector, EffectiveConfig, Overrides,
    Resolution, ResolveWarning,
};
pub use error::{LeakError, PatternError, ScanError};
pub use filter::FileFilter;
pub use record::MatchRecord;
pub use registry::{BUILTIN_DETECTORS, DetectorDef, PatternRegistry};
pub use scanner::{IGNORE_MARKER, MatchEngine};

/// Name of the per-project configuration file, looked up in the scan root.
pub const CONFIG_FILENAME: &str = ".gitleaksrc.json";
