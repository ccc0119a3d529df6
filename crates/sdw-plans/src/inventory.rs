//! Listing of S/D/W variants already present in a plans document

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::document::PlansDocument;
use crate::schedule::{arch_kwargs, PLAIN_DEPTH_KEY, RESIDUAL_DEPTH_KEY};
use crate::variant::Variant;

/// A variant configuration found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantEntry {
    /// Full configuration name
    pub name: String,
    /// Template the name claims to derive from
    pub base: String,
    /// Parsed (S, D, W)
    pub variant: Variant,
    /// `features_per_stage` as stored
    pub features_per_stage: Vec<u64>,
    /// Stored fields that disagree with the name
    pub mismatches: Vec<String>,
}

impl VariantEntry {
    /// Check if the stored schedule agrees with the name
    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// All configurations whose names parse as variants, in document order
#[must_use]
pub fn list_variants(doc: &PlansDocument) -> Vec<VariantEntry> {
    doc.configurations()
        .iter()
        .filter_map(|(name, config)| {
            let (base, variant) = Variant::parse_config_name(name).ok()?;
            Some(inspect(name, base, variant, config))
        })
        .collect()
}

fn inspect(name: &str, base: String, variant: Variant, config: &JsonValue) -> VariantEntry {
    let mut mismatches = Vec::new();
    let mut features_per_stage = Vec::new();

    match arch_kwargs(config) {
        None => mismatches.push("architecture.arch_kwargs missing".to_string()),
        Some(kwargs) => {
            let stages = u64::from(variant.stages);
            let depth = u64::from(variant.depth);

            if kwargs.get("n_stages").and_then(JsonValue::as_u64) != Some(stages) {
                mismatches.push(format!("n_stages != {stages}"));
            }

            features_per_stage = u64_list(kwargs.get("features_per_stage"));
            if features_per_stage.first() != Some(&u64::from(variant.width)) {
                mismatches.push(format!("features_per_stage[0] != {}", variant.width));
            }

            let encoder = kwargs
                .get(RESIDUAL_DEPTH_KEY)
                .or_else(|| kwargs.get(PLAIN_DEPTH_KEY));
            let encoder = u64_list(encoder);
            if encoder.len() as u64 != stages || encoder.iter().any(|&d| d != depth) {
                mismatches.push(format!("encoder depth != [{depth}; {stages}]"));
            }
        }
    }

    VariantEntry {
        name: name.to_string(),
        base,
        variant,
        features_per_stage,
        mismatches,
    }
}

fn u64_list(value: Option<&JsonValue>) -> Vec<u64> {
    value
        .and_then(JsonValue::as_array)
        .map(|items| items.iter().filter_map(JsonValue::as_u64).collect())
        .unwrap_or_default()
}
