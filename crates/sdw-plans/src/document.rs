//! Plans document
//!
//! JSON model of an nnU-Net v2 plans file. Object key order is preserved
//! so untouched entries are written back exactly where they were.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value as JsonValue};

use crate::error::{PlansError, PlansResult};
use crate::fingerprint::Fingerprint;

/// Top-level key holding the configuration mapping
pub const CONFIGURATIONS_KEY: &str = "configurations";

/// Parsed plans document
#[derive(Debug, Clone, PartialEq)]
pub struct PlansDocument {
    root: JsonValue,
}

impl PlansDocument {
    /// Create from a JSON value
    ///
    /// # Errors
    /// Returns [`PlansError::MissingConfigurations`] if there is no `configurations` object
    pub fn new(root: JsonValue) -> PlansResult<Self> {
        if !root.get(CONFIGURATIONS_KEY).is_some_and(JsonValue::is_object) {
            return Err(PlansError::MissingConfigurations);
        }
        Ok(Self { root })
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or has no `configurations` object
    pub fn from_json(json: &str) -> PlansResult<Self> {
        let root: JsonValue = serde_json::from_str(json)?;
        Self::new(root)
    }

    /// Serialize with a four-space indent
    ///
    /// Values and key order match the parsed input exactly. Number spelling
    /// may differ from Python's `json.dump` (`1e-6` vs `1e-06`), and
    /// non-ASCII text is written unescaped.
    ///
    /// # Errors
    /// Returns error if serialization fails (rare for JSON)
    pub fn to_pretty_json(&self) -> PlansResult<String> {
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        self.root.serialize(&mut serializer)?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Root JSON value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &JsonValue {
        &self.root
    }

    /// Consume into the root JSON value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> JsonValue {
        self.root
    }

    /// Get a value by JSON pointer
    ///
    /// # Examples
    /// ```
    /// # use sdw_plans::PlansDocument;
    /// # use serde_json::json;
    /// let doc = PlansDocument::new(json!({"configurations": {"2d": {"batch_size": 12}}})).unwrap();
    /// assert_eq!(doc.get("/configurations/2d/batch_size"), Some(&json!(12)));
    /// ```
    #[inline]
    #[must_use]
    pub fn get(&self, pointer: &str) -> Option<&JsonValue> {
        self.root.pointer(pointer)
    }

    /// The configuration mapping
    #[must_use]
    pub fn configurations(&self) -> &Map<String, JsonValue> {
        match self.root.get(CONFIGURATIONS_KEY) {
            Some(JsonValue::Object(map)) => map,
            // checked in `new` and never replaced
            _ => unreachable!("plans document without configurations object"),
        }
    }

    fn configurations_mut(&mut self) -> &mut Map<String, JsonValue> {
        match self.root.get_mut(CONFIGURATIONS_KEY) {
            Some(JsonValue::Object(map)) => map,
            _ => unreachable!("plans document without configurations object"),
        }
    }

    /// Configuration by name
    #[inline]
    #[must_use]
    pub fn configuration(&self, name: &str) -> Option<&JsonValue> {
        self.configurations().get(name)
    }

    /// Check if a configuration exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.configurations().contains_key(name)
    }

    /// Configuration names in document order
    #[must_use]
    pub fn configuration_names(&self) -> Vec<&str> {
        self.configurations().keys().map(String::as_str).collect()
    }

    /// Number of configurations
    #[inline]
    #[must_use]
    pub fn configuration_count(&self) -> usize {
        self.configurations().len()
    }

    /// Insert a configuration
    ///
    /// New names are appended; existing ones are replaced in place.
    /// Returns the previous value, if any.
    pub fn insert_configuration(
        &mut self,
        name: impl Into<String>,
        value: JsonValue,
    ) -> Option<JsonValue> {
        self.configurations_mut().insert(name.into(), value)
    }

    /// Fingerprint of every configuration, in document order
    #[must_use]
    pub fn fingerprints(&self) -> IndexMap<String, Fingerprint> {
        self.configurations()
            .iter()
            .map(|(name, value)| (name.clone(), Fingerprint::of(value)))
            .collect()
    }
}

impl TryFrom<JsonValue> for PlansDocument {
    type Error = PlansError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlansDocument> for JsonValue {
    fn from(doc: PlansDocument) -> Self {
        doc.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PlansDocument {
        PlansDocument::from_json(
            r#"{
                "dataset_name": "Dataset005_Prostate",
                "configurations": {
                    "2d": {"batch_size": 12},
                    "3d_fullres": {"batch_size": 2},
                    "3d_lowres": {"batch_size": 2}
                },
                "experiment_planner_used": "ExperimentPlanner"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn rejects_document_without_configurations() {
        assert!(matches!(
            PlansDocument::new(json!({"dataset_name": "x"})),
            Err(PlansError::MissingConfigurations)
        ));
        assert!(matches!(
            PlansDocument::new(json!({"configurations": []})),
            Err(PlansError::MissingConfigurations)
        ));
    }

    #[test]
    fn invalid_json_is_error() {
        assert!(PlansDocument::from_json("{not json").is_err());
    }

    #[test]
    fn names_keep_document_order() {
        assert_eq!(sample().configuration_names(), vec!["2d", "3d_fullres", "3d_lowres"]);
    }

    #[test]
    fn insert_appends_new_and_replaces_existing_in_place() {
        let mut doc = sample();
        assert!(doc.insert_configuration("3d_fullres_S4D2W16", json!({})).is_none());
        let previous = doc.insert_configuration("2d", json!({"batch_size": 24}));

        assert_eq!(previous, Some(json!({"batch_size": 12})));
        assert_eq!(
            doc.configuration_names(),
            vec!["2d", "3d_fullres", "3d_lowres", "3d_fullres_S4D2W16"]
        );
        assert_eq!(doc.get("/configurations/2d/batch_size"), Some(&json!(24)));
    }

    #[test]
    fn pretty_json_uses_four_spaces_and_keeps_top_level_order() {
        let out = sample().to_pretty_json().unwrap();
        assert!(out.starts_with("{\n    \"dataset_name\""));
        assert!(out.contains("\n        \"2d\": {\n            \"batch_size\": 12\n        }"));
        assert!(out.trim_end().ends_with("\"experiment_planner_used\": \"ExperimentPlanner\"\n}"));
    }

    #[test]
    fn fingerprints_cover_every_configuration() {
        let prints = sample().fingerprints();
        assert_eq!(prints.len(), 3);
        assert_eq!(prints["3d_fullres"], prints["3d_lowres"]);
        assert_ne!(prints["2d"], prints["3d_fullres"]);
    }

    #[test]
    fn output_keeps_values_but_uses_rust_number_and_utf8_spelling() {
        let doc = PlansDocument::from_json(
            r#"{"configurations": {}, "eps": 1e-06, "std": 0.9259338926496359, "name": "Prostata é"}"#,
        )
        .unwrap();
        let text = doc.to_pretty_json().unwrap();

        assert!(text.contains("\"eps\": 1e-6"));
        assert!(text.contains("\"std\": 0.9259338926496359"));
        assert!(text.contains("\"name\": \"Prostata é\""));
        assert_eq!(PlansDocument::from_json(&text).unwrap(), doc);
    }
}
