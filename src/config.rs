//! Engine configuration
//!
//! [`EngineConfig`] carries the few knobs the engines share. It is built with
//! chained `with_*` calls and validated once, before any traversal starts.
//!
//! ```rust
//! use treemirror::EngineConfig;
//!
//! let config = EngineConfig::new()
//!     .with_files_hint(50_000)
//!     .with_dirs_hint(2_000)
//!     .with_flatten_base_name("renamed");
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};
use crate::marker::IGNORE_PREFIX;

/// Default name stem for files relocated by the flattener
pub const DEFAULT_FLATTEN_BASE_NAME: &str = "dummy";

/// Default capacity hint for the file work list
pub const DEFAULT_FILES_HINT: usize = 1024;

/// Default capacity hint for the directory work list
pub const DEFAULT_DIRS_HINT: usize = 128;

/// Shared configuration for mirror, flatten, restore and report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Expected number of files; sizes traversal work lists up front
    pub files_hint: usize,
    /// Expected number of directories; sizes traversal work lists up front
    pub dirs_hint: usize,
    /// Name stem for flattened files (`dummy101`, `dummy102`, ...)
    pub flatten_base_name: String,
    /// Content prefix marking legacy files that restore and report skip
    pub ignore_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            files_hint: DEFAULT_FILES_HINT,
            dirs_hint: DEFAULT_DIRS_HINT,
            flatten_base_name: DEFAULT_FLATTEN_BASE_NAME.to_string(),
            ignore_prefix: IGNORE_PREFIX.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected number of files
    ///
    /// Only an allocation hint; a low guess costs a few reallocations.
    pub fn with_files_hint(mut self, files: usize) -> Self {
        self.files_hint = files;
        self
    }

    /// Set the expected number of directories
    pub fn with_dirs_hint(mut self, dirs: usize) -> Self {
        self.dirs_hint = dirs;
        self
    }

    /// Set the flatten name stem
    pub fn with_flatten_base_name(mut self, name: impl Into<String>) -> Self {
        self.flatten_base_name = name.into();
        self
    }

    /// Set the legacy ignore prefix
    pub fn with_ignore_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ignore_prefix = prefix.into();
        self
    }

    /// Check the configuration
    ///
    /// # Errors
    ///
    /// - [`MirrorError::InvalidConfiguration`] if a capacity hint is zero,
    ///   the flatten base name is empty or contains a path separator, or the
    ///   ignore prefix is empty
    pub fn validate(&self) -> Result<()> {
        if self.files_hint == 0 {
            return Err(MirrorError::invalid_configuration(
                "number of files must be greater than zero",
            ));
        }
        if self.dirs_hint == 0 {
            return Err(MirrorError::invalid_configuration(
                "number of directories must be greater than zero",
            ));
        }
        if self.flatten_base_name.is_empty()
            || self.flatten_base_name.contains(std::path::is_separator)
        {
            return Err(MirrorError::invalid_configuration(format!(
                "flatten base name {:?} must be a plain file name",
                self.flatten_base_name
            )));
        }
        if self.ignore_prefix.is_empty() {
            return Err(MirrorError::invalid_configuration(
                "ignore prefix must not be empty",
            ));
        }
        Ok(())
    }
}
