//! Augmentation settings
//!
//! Defaults reproduce the 18-variant benchmark grid on `3d_fullres`.
//! Settings can also come from a TOML file:
//!
//! ```toml
//! base = "3d_fullres"
//! max_features = 320
//! stride_policy = "derive"
//!
//! [grid]
//! stages = [4, 5]
//! depths = [2]
//! widths = [32]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlansError, PlansResult};
use crate::schedule::{StridePolicy, DEFAULT_MAX_FEATURES};
use crate::variant::VariantGrid;

/// Default template configuration
pub const DEFAULT_BASE: &str = "3d_fullres";

/// Settings for one augmentation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentSettings {
    /// Template configuration the variants are copied from
    pub base: String,
    /// Variant grid
    pub grid: VariantGrid,
    /// Channel cap per stage
    pub max_features: u32,
    /// Kernel size / stride selection
    pub stride_policy: StridePolicy,
    /// Regenerate variants that already exist
    pub overwrite: bool,
}

impl AugmentSettings {
    /// Create default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the TOML is malformed or has unknown keys
    pub fn from_toml_str(text: &str, origin: &Path) -> PlansResult<Self> {
        toml::from_str(text).map_err(|source| PlansError::InvalidSettingsFile {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_toml_file(path: impl AsRef<Path>) -> PlansResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PlansError::io_error(path, e))?;
        Self::from_toml_str(&text, path)
    }

    /// With template configuration
    #[inline]
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// With variant grid
    #[inline]
    #[must_use]
    pub fn with_grid(mut self, grid: VariantGrid) -> Self {
        self.grid = grid;
        self
    }

    /// With channel cap
    #[inline]
    #[must_use]
    pub fn with_max_features(mut self, max_features: u32) -> Self {
        self.max_features = max_features;
        self
    }

    /// With stride policy
    #[inline]
    #[must_use]
    pub fn with_stride_policy(mut self, policy: StridePolicy) -> Self {
        self.stride_policy = policy;
        self
    }

    /// With overwrite of existing variants
    #[inline]
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Check settings are usable
    ///
    /// # Errors
    /// Returns [`PlansError::InvalidSettings`] for an empty base, a zero cap or a bad grid
    pub fn validate(&self) -> PlansResult<()> {
        if self.base.is_empty() {
            return Err(PlansError::InvalidSettings("base configuration name is empty".into()));
        }
        if self.max_features == 0 {
            return Err(PlansError::InvalidSettings("max_features must be positive".into()));
        }
        self.grid.validate(self.max_features)
    }
}

impl Default for AugmentSettings {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE.to_string(),
            grid: VariantGrid::default(),
            max_features: DEFAULT_MAX_FEATURES,
            stride_policy: StridePolicy::Extend,
            overwrite: false,
        }
    }
}
