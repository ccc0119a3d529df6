//! Dataset and plans file discovery
//!
//! nnU-Net keeps preprocessed datasets under `$nnUNet_preprocessed`, one
//! folder per dataset named `Dataset{ID:03}_{Name}`, with plans files
//! named `{plans_identifier}.json` inside.

use std::path::{Path, PathBuf};

use crate::error::{PlansError, PlansResult};

/// Environment variable nnU-Net v2 reads the preprocessed root from
pub const PREPROCESSED_ENV: &str = "nnUNet_preprocessed";

/// Default plans identifier
pub const DEFAULT_PLANS_NAME: &str = "nnUNetPlans";

/// Resolves a dataset id to its plans file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlansLocator {
    root: PathBuf,
    plans_name: String,
}

impl PlansLocator {
    /// Locator over an explicit preprocessed root
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            plans_name: DEFAULT_PLANS_NAME.to_string(),
        }
    }

    /// Locator over `$nnUNet_preprocessed`
    ///
    /// # Errors
    /// Returns [`PlansError::PreprocessedRootNotSet`] if the variable is unset or empty
    pub fn from_env() -> PlansResult<Self> {
        match std::env::var_os(PREPROCESSED_ENV) {
            Some(root) if !root.is_empty() => Ok(Self::new(root)),
            _ => Err(PlansError::PreprocessedRootNotSet),
        }
    }

    /// Locator over `root` if given, otherwise the environment
    ///
    /// # Errors
    /// Returns error if neither is available
    pub fn resolve(root: Option<PathBuf>) -> PlansResult<Self> {
        root.map_or_else(Self::from_env, |root| Ok(Self::new(root)))
    }

    /// With plans identifier (file stem)
    #[inline]
    #[must_use]
    pub fn with_plans_name(mut self, plans_name: impl Into<String>) -> Self {
        self.plans_name = plans_name.into();
        self
    }

    /// Preprocessed root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder name prefix for a dataset id
    #[inline]
    #[must_use]
    pub fn dataset_prefix(id: u32) -> String {
        format!("Dataset{id:03}_")
    }

    /// Find the dataset folder for `id`
    ///
    /// Entries are scanned in name order; the first directory with the
    /// `Dataset{ID:03}_` prefix wins.
    ///
    /// # Errors
    /// Returns error if the root cannot be listed or no folder matches
    pub fn dataset_dir(&self, id: u32) -> PlansResult<PathBuf> {
        let prefix = Self::dataset_prefix(id);
        let entries =
            std::fs::read_dir(&self.root).map_err(|e| PlansError::io_error(&self.root, e))?;

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(&prefix))
            .collect();
        names.sort();

        names
            .into_iter()
            .next()
            .map(|name| self.root.join(name))
            .ok_or_else(|| PlansError::DatasetNotFound {
                id,
                root: self.root.clone(),
            })
    }

    /// Path of the plans file for `id`, which must exist
    ///
    /// # Errors
    /// Returns error if the dataset or the plans file is missing
    pub fn plans_path(&self, id: u32) -> PlansResult<PathBuf> {
        let path = self
            .dataset_dir(id)?
            .join(format!("{}.json", self.plans_name));
        tracing::debug!(dataset = id, path = %path.display(), "resolved plans file");
        if path.is_file() {
            Ok(path)
        } else {
            Err(PlansError::PlansFileNotFound(path))
        }
    }
}
