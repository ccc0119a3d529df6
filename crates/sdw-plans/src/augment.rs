//! Variant insertion
//!
//! [`Augmenter`] copies the template configuration once per grid point,
//! rewrites its stage schedule and inserts it under `configurations`.
//! Existing entries are never touched unless they are variants and
//! `overwrite` is set; this is checked with fingerprints after the run.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::document::PlansDocument;
use crate::error::{PlansError, PlansResult};
use crate::fingerprint::Fingerprint;
use crate::schedule::{arch_kwargs_mut, StageSchedule};
use crate::settings::AugmentSettings;
use crate::variant::Variant;

/// Outcome of one augmentation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AugmentReport {
    /// Template configuration used
    pub base: String,
    /// Newly inserted configurations, in grid order
    pub added: Vec<String>,
    /// Variants already present and left as they were
    pub skipped: Vec<String>,
    /// Variants regenerated with different content
    pub replaced: Vec<String>,
    /// Configuration count after the run
    pub total_configurations: usize,
}

impl AugmentReport {
    /// Check if the document changed
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.replaced.is_empty()
    }

    /// Number of configurations written (added or replaced)
    #[inline]
    #[must_use]
    pub fn written(&self) -> usize {
        self.added.len() + self.replaced.len()
    }
}

enum Pending {
    Add(String, JsonValue),
    Replace(String, JsonValue),
}

/// Inserts S/D/W variants into plans documents
#[derive(Debug, Clone, Default)]
pub struct Augmenter {
    settings: AugmentSettings,
}

impl Augmenter {
    /// Create augmenter
    #[inline]
    #[must_use]
    pub fn new(settings: AugmentSettings) -> Self {
        Self { settings }
    }

    /// Settings in use
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &AugmentSettings {
        &self.settings
    }

    /// Build the configuration block for one variant from a template
    ///
    /// # Errors
    /// Returns error if the template lacks the fields the schedule needs
    pub fn build_variant(&self, template: &JsonValue, variant: Variant) -> PlansResult<JsonValue> {
        let base = &self.settings.base;
        let schedule = StageSchedule::plan(
            variant,
            template,
            base,
            self.settings.max_features,
            self.settings.stride_policy,
        )?;

        let mut block = template.clone();
        let kwargs =
            arch_kwargs_mut(&mut block).ok_or_else(|| PlansError::MissingArchKwargs(base.clone()))?;
        schedule.apply_to(kwargs);

        tracing::debug!(
            variant = %variant,
            features = ?schedule.features_per_stage,
            strides = ?schedule.strides,
            "planned stage schedule"
        );
        Ok(block)
    }

    /// Insert every grid variant missing from `doc`
    ///
    /// Nothing is inserted if settings or the template are invalid.
    ///
    /// # Errors
    /// - [`PlansError::InvalidSettings`] if the settings do not validate
    /// - [`PlansError::MissingBaseConfiguration`] if the template is absent
    /// - [`PlansError::MissingArchKwargs`] / [`PlansError::MissingPatchSize`] if it is malformed
    /// - [`PlansError::PreexistingModified`] if an untouched entry changed
    pub fn apply(&self, doc: &mut PlansDocument) -> PlansResult<AugmentReport> {
        self.settings.validate()?;
        let base = self.settings.base.clone();
        let template = doc
            .configuration(&base)
            .cloned()
            .ok_or_else(|| PlansError::MissingBaseConfiguration(base.clone()))?;

        let mut report = AugmentReport {
            base: base.clone(),
            ..AugmentReport::default()
        };

        // Plan every block before touching the document
        let mut pending = Vec::new();
        for variant in self.settings.grid.triplets() {
            let name = variant.config_name(&base);
            match doc.configuration(&name) {
                Some(_) if !self.settings.overwrite => {
                    tracing::info!(config = %name, "skipping configuration (already exists)");
                    report.skipped.push(name);
                }
                Some(existing) => {
                    let block = self.build_variant(&template, variant)?;
                    if *existing == block {
                        tracing::info!(config = %name, "configuration already up to date");
                        report.skipped.push(name);
                    } else {
                        pending.push(Pending::Replace(name, block));
                    }
                }
                None => {
                    let block = self.build_variant(&template, variant)?;
                    pending.push(Pending::Add(name, block));
                }
            }
        }

        let mut before = doc.fingerprints();
        for item in &pending {
            if let Pending::Replace(name, _) = item {
                before.shift_remove(name);
            }
        }

        for item in pending {
            match item {
                Pending::Add(name, block) => {
                    doc.insert_configuration(name.clone(), block);
                    tracing::info!(config = %name, "added configuration");
                    report.added.push(name);
                }
                Pending::Replace(name, block) => {
                    doc.insert_configuration(name.clone(), block);
                    tracing::info!(config = %name, "replaced configuration");
                    report.replaced.push(name);
                }
            }
        }

        verify_preserved(&before, doc)?;
        report.total_configurations = doc.configuration_count();
        Ok(report)
    }
}

/// Check every fingerprinted configuration is still present and unchanged
///
/// # Errors
/// Returns [`PlansError::PreexistingModified`] listing the offending names
pub fn verify_preserved(
    before: &IndexMap<String, Fingerprint>,
    doc: &PlansDocument,
) -> PlansResult<()> {
    let after = doc.fingerprints();
    let modified: Vec<String> = before
        .iter()
        .filter(|(name, print)| after.get(name.as_str()) != Some(*print))
        .map(|(name, _)| name.clone())
        .collect();

    if modified.is_empty() {
        Ok(())
    } else {
        Err(PlansError::PreexistingModified(modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::VariantGrid;
    use serde_json::json;

    fn plans() -> PlansDocument {
        PlansDocument::new(json!({
            "dataset_name": "Dataset005_Prostate",
            "configurations": {
                "2d": {"batch_size": 12},
                "3d_fullres": {
                    "data_identifier": "nnUNetPlans_3d_fullres",
                    "patch_size": [20, 320, 256],
                    "architecture": {
                        "arch_kwargs": {
                            "n_stages": 3,
                            "features_per_stage": [32, 64, 128],
                            "kernel_sizes": [[1, 3, 3], [3, 3, 3], [3, 3, 3]],
                            "strides": [[1, 1, 1], [1, 2, 2], [2, 2, 2]],
                            "n_conv_per_stage": [2, 2, 2],
                            "n_conv_per_stage_decoder": [2, 2]
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn small_grid() -> AugmentSettings {
        AugmentSettings::new().with_grid(VariantGrid::new(vec![4], vec![2], vec![16, 32]))
    }

    #[test]
    fn adds_missing_variants_in_grid_order() {
        let mut doc = plans();
        let report = Augmenter::new(small_grid()).apply(&mut doc).unwrap();

        assert_eq!(report.added, vec!["3d_fullres_S4D2W16", "3d_fullres_S4D2W32"]);
        assert!(report.skipped.is_empty());
        assert_eq!(report.total_configurations, 4);
        assert_eq!(
            doc.get("/configurations/3d_fullres_S4D2W32/architecture/arch_kwargs/features_per_stage"),
            Some(&json!([32, 64, 128, 256]))
        );
        assert_eq!(
            doc.get("/configurations/3d_fullres_S4D2W16/data_identifier"),
            Some(&json!("nnUNetPlans_3d_fullres"))
        );
    }

    #[test]
    fn second_run_skips_everything() {
        let mut doc = plans();
        let augmenter = Augmenter::new(small_grid());
        augmenter.apply(&mut doc).unwrap();
        let snapshot = doc.clone();

        let report = augmenter.apply(&mut doc).unwrap();
        assert!(!report.changed());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn overwrite_replaces_only_stale_variants() {
        let mut doc = plans();
        doc.insert_configuration("3d_fullres_S4D2W16", json!({"stale": true}));

        let report = Augmenter::new(small_grid().with_overwrite(true))
            .apply(&mut doc)
            .unwrap();
        assert_eq!(report.replaced, vec!["3d_fullres_S4D2W16"]);
        assert_eq!(report.added, vec!["3d_fullres_S4D2W32"]);
        assert_eq!(report.written(), 2);
        assert_eq!(
            doc.get("/configurations/3d_fullres_S4D2W16/architecture/arch_kwargs/n_stages"),
            Some(&json!(4))
        );

        let again = Augmenter::new(small_grid().with_overwrite(true))
            .apply(&mut doc)
            .unwrap();
        assert!(!again.changed());
    }

    #[test]
    fn missing_base_leaves_document_alone() {
        let mut doc = plans();
        let snapshot = doc.clone();
        let err = Augmenter::new(small_grid().with_base("3d_lowres"))
            .apply(&mut doc)
            .unwrap_err();

        assert!(matches!(err, PlansError::MissingBaseConfiguration(name) if name == "3d_lowres"));
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn malformed_template_is_rejected_before_insert() {
        let mut doc = PlansDocument::new(json!({
            "configurations": {"3d_fullres": {"architecture": {"network_class_name": "x"}}}
        }))
        .unwrap();
        let err = Augmenter::new(small_grid()).apply(&mut doc).unwrap_err();

        assert!(matches!(err, PlansError::MissingArchKwargs(_)));
        assert_eq!(doc.configuration_count(), 1);
    }

    #[test]
    fn verify_preserved_reports_changed_entries() {
        let mut doc = plans();
        let before = doc.fingerprints();
        doc.insert_configuration("2d", json!({"batch_size": 13}));

        let err = verify_preserved(&before, &doc).unwrap_err();
        assert!(matches!(err, PlansError::PreexistingModified(names) if names == vec!["2d"]));
    }
}
