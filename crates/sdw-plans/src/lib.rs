//! SDW Plans
//!
//! Adds U-Net scaling variants to nnU-Net v2 plans files. Each variant is
//! a copy of a template configuration (normally `3d_fullres`) with its
//! stage count `S`, convolutions per stage `D` and initial width `W`
//! rewritten, stored as `{base}_S{S}D{D}W{W}`.
//!
//! # Core Concepts
//!
//! - [`Variant`] / [`VariantGrid`]: the (S, D, W) points to generate
//! - [`StageSchedule`]: per-stage widths, depths, kernel sizes and strides
//! - [`PlansDocument`]: order-preserving JSON model of the plans file
//! - [`Augmenter`]: inserts missing variants, leaving other entries intact
//! - [`PlansLocator`] / [`PlansFile`]: find, load and save plans on disk
//!
//! # Example
//!
//! ```rust,no_run
//! use sdw_plans::{AugmentSettings, Augmenter, PlansFile, PlansLocator};
//!
//! # fn main() -> sdw_plans::PlansResult<()> {
//! let path = PlansLocator::from_env()?.plans_path(5)?;
//! let file = PlansFile::new(path);
//! let mut doc = file.load()?;
//!
//! let report = Augmenter::new(AugmentSettings::new()).apply(&mut doc)?;
//! if report.changed() {
//!     file.save(&doc, true)?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

mod augment;
mod document;
mod error;
mod fingerprint;
mod inventory;
mod io;
mod locate;
mod schedule;
mod settings;
mod variant;

pub use augment::{verify_preserved, AugmentReport, Augmenter};
pub use document::{PlansDocument, CONFIGURATIONS_KEY};
pub use error::{PlansError, PlansResult};
pub use fingerprint::Fingerprint;
pub use inventory::{list_variants, VariantEntry};
pub use io::{PlansFile, BACKUP_SUFFIX};
pub use locate::{PlansLocator, DEFAULT_PLANS_NAME, PREPROCESSED_ENV};
pub use schedule::{
    derive_strides, features_per_stage, fit_to_stages, StageSchedule, StridePolicy,
    DEFAULT_MAX_FEATURES, MIN_FEATURE_MAP_EDGE,
};
pub use settings::{AugmentSettings, DEFAULT_BASE};
pub use variant::{Variant, VariantGrid, MAX_DEPTH, MAX_STAGES};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
