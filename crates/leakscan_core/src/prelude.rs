//! Convenience re-exports for downstream crates.

pub use crate::CONFIG_FILENAME;
pub use crate::config::{
    ConfigError, ConfigFile, ConfigResolver, DefaultPolicy, Detector, EffectiveConfig, Overrides,
    Resolution, ResolveWarning,
};
pub use crate::error::{LeakError, PatternError, ScanError};
pub use crate::filter::FileFilter;
pub use crate::record::MatchRecord;
pub use crate::registry::{BUILTIN_DETECTORS, DetectorDef, PatternRegistry};
pub use crate::scanner::{IGNORE_MARKER, MatchEngine};
