//! Error types for plans augmentation
//!
//! Covers the three places things go wrong:
//! - Locating and reading the plans file (ingress)
//! - Validating settings and the template configuration
//! - Writing the augmented document (egress)

use std::path::PathBuf;

/// Errors raised while reading, augmenting or writing a plans document
#[derive(Debug, thiserror::Error)]
pub enum PlansError {
    /// IO error on a specific path
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plans file is not valid JSON
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON text could not be decoded or encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document has no `configurations` object
    #[error("plans document has no 'configurations' object")]
    MissingConfigurations,

    /// Template configuration is absent
    #[error("{0} configuration not found in plans")]
    MissingBaseConfiguration(String),

    /// Template has no `architecture.arch_kwargs` object
    #[error("unexpected plans format: configuration '{0}' is missing architecture.arch_kwargs")]
    MissingArchKwargs(String),

    /// Derived strides need a patch size
    #[error("configuration '{0}' has no usable patch_size")]
    MissingPatchSize(String),

    /// Settings are out of range
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Name is not an S/D/W variant
    #[error("not an S/D/W variant name: '{0}'")]
    InvalidVariantName(String),

    /// `nnUNet_preprocessed` is unset
    #[error("nnUNet_preprocessed environment variable not set")]
    PreprocessedRootNotSet,

    /// No dataset folder matches the id
    #[error("dataset {id} not found in {root}")]
    DatasetNotFound { id: u32, root: PathBuf },

    /// Plans file missing on disk
    #[error("plans file not found: {0}")]
    PlansFileNotFound(PathBuf),

    /// Entries that existed before augmentation changed
    #[error("pre-existing configurations were modified: {}", .0.join(", "))]
    PreexistingModified(Vec<String>),

    /// Settings file is malformed
    #[error("invalid settings file {path}: {source}")]
    InvalidSettingsFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl PlansError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error comes from the template configuration rather than the environment
    #[inline]
    #[must_use]
    pub fn is_plans_format(&self) -> bool {
        matches!(
            self,
            Self::MissingConfigurations
                | Self::MissingBaseConfiguration(_)
                | Self::MissingArchKwargs(_)
                | Self::MissingPatchSize(_)
        )
    }
}

/// Result alias for plans operations
pub type PlansResult<T> = Result<T, PlansError>;
