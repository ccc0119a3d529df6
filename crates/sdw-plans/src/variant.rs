//! S/D/W variant identity
//!
//! A [`Variant`] is one point of the scaling grid: resolution stages `S`,
//! convolutions per stage `D` and initial width `W`. Its configuration
//! name is `{base}_S{S}D{D}W{W}`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PlansError, PlansResult};

static SHORT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^S(?P<s>\d+)D(?P<d>\d+)W(?P<w>\d+)$").expect("static regex")
});

static CONFIG_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<base>.+)_S(?P<s>\d+)D(?P<d>\d+)W(?P<w>\d+)$").expect("static regex")
});

/// One U-Net scaling variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Variant {
    /// Number of resolution stages (S)
    pub stages: u32,
    /// Convolution layers per stage (D)
    pub depth: u32,
    /// Channel width of the first stage (W)
    pub width: u32,
}

impl Variant {
    /// Create variant
    #[inline]
    #[must_use]
    pub const fn new(stages: u32, depth: u32, width: u32) -> Self {
        Self {
            stages,
            depth,
            width,
        }
    }

    /// Full configuration name under `base`
    ///
    /// # Examples
    /// ```
    /// # use sdw_plans::Variant;
    /// assert_eq!(Variant::new(4, 2, 16).config_name("3d_fullres"), "3d_fullres_S4D2W16");
    /// ```
    #[inline]
    #[must_use]
    pub fn config_name(&self, base: &str) -> String {
        format!("{base}_{self}")
    }

    /// Split a configuration name into its base and variant
    ///
    /// # Errors
    /// Returns [`PlansError::InvalidVariantName`] if the name has no `_S{S}D{D}W{W}` suffix
    pub fn parse_config_name(name: &str) -> PlansResult<(String, Self)> {
        let caps = CONFIG_NAME
            .captures(name)
            .ok_or_else(|| PlansError::InvalidVariantName(name.to_string()))?;
        let variant = Self::from_captures(name, &caps)?;
        Ok((caps["base"].to_string(), variant))
    }

    fn from_captures(name: &str, caps: &regex::Captures<'_>) -> PlansResult<Self> {
        let field = |key: &str| {
            caps[key]
                .parse::<u32>()
                .map_err(|_| PlansError::InvalidVariantName(name.to_string()))
        };
        Ok(Self::new(field("s")?, field("d")?, field("w")?))
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "S{}D{}W{}", self.stages, self.depth, self.width)
    }
}

impl FromStr for Variant {
    type Err = PlansError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = SHORT_NAME
            .captures(s)
            .ok_or_else(|| PlansError::InvalidVariantName(s.to_string()))?;
        Self::from_captures(s, &caps)
    }
}

/// Largest accepted stage count
pub const MAX_STAGES: u32 = 16;

/// Largest accepted convolutions per stage
pub const MAX_DEPTH: u32 = 16;

/// The cartesian grid of stage counts, depths and widths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantGrid {
    /// Resolution stage counts
    pub stages: Vec<u32>,
    /// Convolutions per stage
    pub depths: Vec<u32>,
    /// Initial widths
    pub widths: Vec<u32>,
}

impl VariantGrid {
    /// Grid with explicit axes
    #[inline]
    #[must_use]
    pub fn new(stages: Vec<u32>, depths: Vec<u32>, widths: Vec<u32>) -> Self {
        Self {
            stages,
            depths,
            widths,
        }
    }

    /// All variants, S outermost and W innermost
    #[must_use]
    pub fn triplets(&self) -> Vec<Variant> {
        self.stages
            .iter()
            .flat_map(|&s| {
                self.depths.iter().flat_map(move |&d| {
                    self.widths.iter().map(move |&w| Variant::new(s, d, w))
                })
            })
            .collect()
    }

    /// Number of variants in the grid
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len() * self.depths.len() * self.widths.len()
    }

    /// Check if any axis is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check axes are non-empty, distinct, positive and within their caps
    ///
    /// Widths are capped by `max_features`, stages by [`MAX_STAGES`] and
    /// depths by [`MAX_DEPTH`].
    ///
    /// # Errors
    /// Returns [`PlansError::InvalidSettings`] on the first offending axis
    pub fn validate(&self, max_features: u32) -> PlansResult<()> {
        for (axis, values, limit) in [
            ("stages", &self.stages, Some(MAX_STAGES)),
            ("depths", &self.depths, Some(MAX_DEPTH)),
            ("widths", &self.widths, None),
        ] {
            if values.is_empty() {
                return Err(PlansError::InvalidSettings(format!("{axis} must not be empty")));
            }
            if values.contains(&0) {
                return Err(PlansError::InvalidSettings(format!(
                    "{axis} must be positive, got {values:?}"
                )));
            }
            if let Some((i, dup)) = values
                .iter()
                .enumerate()
                .find(|&(i, v)| values[..i].contains(v))
            {
                return Err(PlansError::InvalidSettings(format!(
                    "{axis} has duplicate value {dup} at position {i}"
                )));
            }
            if let Some(limit) = limit {
                if let Some(value) = values.iter().find(|&&v| v > limit) {
                    return Err(PlansError::InvalidSettings(format!(
                        "{axis} value {value} exceeds limit {limit}"
                    )));
                }
            }
        }
        if let Some(width) = self.widths.iter().find(|&&w| w > max_features) {
            return Err(PlansError::InvalidSettings(format!(
                "width {width} exceeds max_features {max_features}"
            )));
        }
        Ok(())
    }
}

impl Default for VariantGrid {
    fn default() -> Self {
        Self::new(vec![4, 5, 6], vec![2, 3], vec![16, 32, 64])
    }
}
