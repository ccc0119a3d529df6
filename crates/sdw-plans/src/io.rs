//! Plans file load and save

use std::path::{Path, PathBuf};

use crate::document::PlansDocument;
use crate::error::{PlansError, PlansResult};

/// Suffix appended to the plans path for the backup copy
pub const BACKUP_SUFFIX: &str = ".bak";

/// A plans file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlansFile {
    path: PathBuf,
}

impl PlansFile {
    /// Wrap a path
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the plans file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the backup copy (`<path>.bak`)
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(BACKUP_SUFFIX);
        PathBuf::from(os)
    }

    /// Read and parse the plans file
    ///
    /// # Errors
    /// Returns error if the file is missing, unreadable or not a plans document
    pub fn load(&self) -> PlansResult<PlansDocument> {
        if !self.path.is_file() {
            return Err(PlansError::PlansFileNotFound(self.path.clone()));
        }
        let text =
            std::fs::read_to_string(&self.path).map_err(|e| PlansError::io_error(&self.path, e))?;
        let value = serde_json::from_str(&text).map_err(|source| PlansError::InvalidJson {
            path: self.path.clone(),
            source,
        })?;
        PlansDocument::new(value)
    }

    /// Write `doc` over the plans file
    ///
    /// With `backup`, the current file is first copied to [`Self::backup_path`].
    /// A failed backup is logged and does not stop the write.
    /// Returns the backup path if one was made.
    ///
    /// # Errors
    /// Returns error if serialization or the write itself fails
    pub fn save(&self, doc: &PlansDocument, backup: bool) -> PlansResult<Option<PathBuf>> {
        let json = doc.to_pretty_json()?;

        let backup_path = if backup && self.path.exists() {
            let target = self.backup_path();
            match std::fs::copy(&self.path, &target) {
                Ok(_) => {
                    tracing::info!(path = %target.display(), "backup created");
                    Some(target)
                }
                Err(e) => {
                    tracing::warn!(path = %target.display(), error = %e, "failed to create backup");
                    None
                }
            }
        } else {
            None
        };

        std::fs::write(&self.path, json).map_err(|e| PlansError::io_error(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "plans file written");
        Ok(backup_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn backup_path_appends_suffix() {
        let file = PlansFile::new("/data/Dataset005_Prostate/nnUNetPlans.json");
        assert_eq!(
            file.backup_path(),
            PathBuf::from("/data/Dataset005_Prostate/nnUNetPlans.json.bak")
        );
    }

    #[test]
    fn load_distinguishes_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nnUNetPlans.json");

        assert!(matches!(
            PlansFile::new(&path).load(),
            Err(PlansError::PlansFileNotFound(_))
        ));

        fs::write(&path, "{\"configurations\": ").unwrap();
        assert!(matches!(
            PlansFile::new(&path).load(),
            Err(PlansError::InvalidJson { .. })
        ));
    }

    #[test]
    fn save_keeps_backup_of_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nnUNetPlans.json");
        let original = "{\"configurations\": {\"2d\": {}}}";
        fs::write(&path, original).unwrap();

        let file = PlansFile::new(&path);
        let mut doc = file.load().unwrap();
        doc.insert_configuration("3d_fullres", json!({}));

        let backup = file.save(&doc, true).unwrap();
        assert_eq!(backup, Some(file.backup_path()));
        assert_eq!(fs::read_to_string(file.backup_path()).unwrap(), original);
        assert!(file.load().unwrap().contains("3d_fullres"));
    }

    #[test]
    fn save_without_backup_writes_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plans.json");
        fs::write(&path, "{\"configurations\": {}}").unwrap();

        let file = PlansFile::new(&path);
        let doc = file.load().unwrap();
        assert_eq!(file.save(&doc, false).unwrap(), None);
        assert!(!file.backup_path().exists());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n    \"configurations\": {}\n}"
        );
    }
}
