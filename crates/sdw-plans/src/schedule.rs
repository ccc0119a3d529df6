//! Per-stage architecture derivation
//!
//! Turns a [`Variant`] and the template's `arch_kwargs` into the stage
//! schedule nnU-Net's `PlainConvUNet` / `ResidualEncoderUNet` expect:
//! stage count, width per stage, convs per encoder and decoder stage,
//! kernel sizes and strides.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{PlansError, PlansResult};
use crate::variant::{Variant, MAX_DEPTH, MAX_STAGES};

/// Default cap on channels per stage
pub const DEFAULT_MAX_FEATURES: u32 = 512;

/// Smallest feature-map edge a derived stride may produce
pub const MIN_FEATURE_MAP_EDGE: u64 = 4;

/// Encoder depth key used by residual-encoder plans
pub const RESIDUAL_DEPTH_KEY: &str = "n_blocks_per_stage";

/// Encoder depth key used by plain conv plans
pub const PLAIN_DEPTH_KEY: &str = "n_conv_per_stage";

/// Decoder depth key
pub const DECODER_DEPTH_KEY: &str = "n_conv_per_stage_decoder";

/// How kernel sizes and strides are chosen for the new stage count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StridePolicy {
    /// Keep the template's schedules, extended with the last entry or truncated
    #[default]
    Extend,
    /// Recompute strides from the template's patch size
    Derive,
}

impl Display for StridePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extend => f.write_str("extend"),
            Self::Derive => f.write_str("derive"),
        }
    }
}

impl FromStr for StridePolicy {
    type Err = PlansError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extend" => Ok(Self::Extend),
            "derive" => Ok(Self::Derive),
            other => Err(PlansError::InvalidSettings(format!(
                "unknown stride policy '{other}' (expected 'extend' or 'derive')"
            ))),
        }
    }
}

/// Stage schedule for one variant
#[derive(Debug, Clone, PartialEq)]
pub struct StageSchedule {
    /// Number of resolution stages
    pub n_stages: u32,
    /// Channels per stage
    pub features_per_stage: Vec<u32>,
    /// Convs (or residual blocks) per encoder stage
    pub encoder_depth: Vec<u32>,
    /// Convs per decoder stage
    pub decoder_depth: Vec<u32>,
    /// Kernel size per stage
    pub kernel_sizes: Vec<JsonValue>,
    /// Stride per stage
    pub strides: Vec<JsonValue>,
}

impl StageSchedule {
    /// Plan the schedule for `variant` against a template configuration
    ///
    /// `config_name` only labels errors.
    ///
    /// # Errors
    /// - [`PlansError::MissingArchKwargs`] if the template has no `architecture.arch_kwargs`
    /// - [`PlansError::MissingPatchSize`] if `policy` is `Derive` and `patch_size` is unusable
    /// - [`PlansError::InvalidSettings`] if `S` or `D` is above [`MAX_STAGES`] / [`MAX_DEPTH`]
    pub fn plan(
        variant: Variant,
        template: &JsonValue,
        config_name: &str,
        max_features: u32,
        policy: StridePolicy,
    ) -> PlansResult<Self> {
        if variant.stages > MAX_STAGES || variant.depth > MAX_DEPTH {
            return Err(PlansError::InvalidSettings(format!(
                "{variant} is outside S <= {MAX_STAGES}, D <= {MAX_DEPTH}"
            )));
        }
        let arch_kwargs = arch_kwargs(template)
            .ok_or_else(|| PlansError::MissingArchKwargs(config_name.to_string()))?;
        let stages = variant.stages as usize;

        let kernel_sizes = fit_to_stages(
            list_field(arch_kwargs, "kernel_sizes"),
            stages,
            &json!([3, 3, 3]),
        );
        let strides = match policy {
            StridePolicy::Extend => fit_to_stages(
                list_field(arch_kwargs, "strides"),
                stages,
                &json!([2, 2, 2]),
            ),
            StridePolicy::Derive => {
                let patch_size = patch_size(template)
                    .ok_or_else(|| PlansError::MissingPatchSize(config_name.to_string()))?;
                derive_strides(&patch_size, stages)
                    .into_iter()
                    .map(|stride| json!(stride))
                    .collect()
            }
        };

        Ok(Self {
            n_stages: variant.stages,
            features_per_stage: features_per_stage(variant, max_features),
            encoder_depth: vec![variant.depth; stages],
            decoder_depth: vec![variant.depth; stages.saturating_sub(1)],
            kernel_sizes,
            strides,
        })
    }

    /// Write the schedule into an `arch_kwargs` object
    ///
    /// Fields not owned by the schedule are left as they are.
    pub fn apply_to(&self, arch_kwargs: &mut Map<String, JsonValue>) {
        let depth_key = if arch_kwargs.contains_key(RESIDUAL_DEPTH_KEY) {
            RESIDUAL_DEPTH_KEY
        } else {
            PLAIN_DEPTH_KEY
        };

        arch_kwargs.insert("n_stages".into(), json!(self.n_stages));
        arch_kwargs.insert("features_per_stage".into(), json!(self.features_per_stage));
        arch_kwargs.insert(depth_key.into(), json!(self.encoder_depth));
        arch_kwargs.insert(DECODER_DEPTH_KEY.into(), json!(self.decoder_depth));
        arch_kwargs.insert("kernel_sizes".into(), JsonValue::Array(self.kernel_sizes.clone()));
        arch_kwargs.insert("strides".into(), JsonValue::Array(self.strides.clone()));
    }
}

/// Width per stage: `W` doubled each stage, capped at `max_features`
#[must_use]
pub fn features_per_stage(variant: Variant, max_features: u32) -> Vec<u32> {
    let mut features = Vec::with_capacity(variant.stages as usize);
    let mut current = variant.width.min(max_features);
    for _ in 0..variant.stages {
        features.push(current);
        current = current.saturating_mul(2).min(max_features);
    }
    features
}

/// Fit a per-stage list to `stages` entries
///
/// Longer lists are truncated, shorter ones repeat their last entry.
/// An empty list is filled with `fallback`.
#[must_use]
pub fn fit_to_stages(list: &[JsonValue], stages: usize, fallback: &JsonValue) -> Vec<JsonValue> {
    if list.len() >= stages {
        return list[..stages].to_vec();
    }
    let filler = list.last().unwrap_or(fallback).clone();
    let mut fitted = list.to_vec();
    fitted.resize(stages, filler);
    fitted
}

/// Strides halving each axis until it would drop below [`MIN_FEATURE_MAP_EDGE`]
///
/// Stage 0 always has unit stride.
#[must_use]
pub fn derive_strides(patch_size: &[u64], stages: usize) -> Vec<Vec<u64>> {
    let mut feature_map = patch_size.to_vec();
    let mut strides = Vec::with_capacity(stages);
    for stage in 0..stages {
        if stage == 0 {
            strides.push(vec![1; feature_map.len()]);
            continue;
        }
        let stride: Vec<u64> = feature_map
            .iter_mut()
            .map(|edge| {
                if *edge / 2 >= MIN_FEATURE_MAP_EDGE {
                    *edge /= 2;
                    2
                } else {
                    1
                }
            })
            .collect();
        strides.push(stride);
    }
    strides
}

/// `architecture.arch_kwargs` of a configuration, if it is an object
pub(crate) fn arch_kwargs(config: &JsonValue) -> Option<&Map<String, JsonValue>> {
    config.get("architecture")?.get("arch_kwargs")?.as_object()
}

/// Mutable `architecture.arch_kwargs` of a configuration
pub(crate) fn arch_kwargs_mut(config: &mut JsonValue) -> Option<&mut Map<String, JsonValue>> {
    config
        .get_mut("architecture")?
        .get_mut("arch_kwargs")?
        .as_object_mut()
}

fn list_field<'a>(object: &'a Map<String, JsonValue>, key: &str) -> &'a [JsonValue] {
    object
        .get(key)
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn patch_size(config: &JsonValue) -> Option<Vec<u64>> {
    let edges = config.get("patch_size")?.as_array()?;
    if edges.is_empty() {
        return None;
    }
    edges.iter().map(JsonValue::as_u64).collect()
}
