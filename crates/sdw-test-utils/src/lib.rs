//! Testing utilities for SDW workspace
//!
//! Plans fixtures modelled on real nnU-Net v2 output and a throwaway
//! `nnUNet_preprocessed` tree to run against.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

pub const DATASET_FOLDER: &str = "Dataset005_Prostate";

/// Plain-conv plans with 2d, 3d_lowres, 3d_fullres and a cascade entry
pub fn plain_plans() -> Value {
    json!({
        "dataset_name": DATASET_FOLDER,
        "plans_name": "nnUNetPlans",
        "original_median_spacing_after_transp": [3.5999999046325684, 0.625, 0.625],
        "original_median_shape_after_transp": [20, 320, 319],
        "image_reader_writer": "SimpleITKIO",
        "transpose_forward": [0, 1, 2],
        "transpose_backward": [0, 1, 2],
        "configurations": {
            "2d": {
                "data_identifier": "nnUNetPlans_2d",
                "preprocessor_name": "DefaultPreprocessor",
                "batch_size": 32,
                "patch_size": [320, 320],
                "median_image_size_in_voxels": [320.0, 319.0],
                "spacing": [0.625, 0.625],
                "normalization_schemes": ["ZScoreNormalization", "ZScoreNormalization"],
                "use_mask_for_norm": [false, false],
                "architecture": {
                    "network_class_name": "dynamic_network_architectures.architectures.unet.PlainConvUNet",
                    "arch_kwargs": {
                        "n_stages": 7,
                        "features_per_stage": [32, 64, 128, 256, 512, 512, 512],
                        "conv_op": "torch.nn.modules.conv.Conv2d",
                        "kernel_sizes": [[3, 3], [3, 3], [3, 3], [3, 3], [3, 3], [3, 3], [3, 3]],
                        "strides": [[1, 1], [2, 2], [2, 2], [2, 2], [2, 2], [2, 2], [2, 2]],
                        "n_conv_per_stage": [2, 2, 2, 2, 2, 2, 2],
                        "n_conv_per_stage_decoder": [2, 2, 2, 2, 2, 2],
                        "conv_bias": true,
                        "norm_op": "torch.nn.modules.instancenorm.InstanceNorm2d",
                        "norm_op_kwargs": {"eps": 1e-05, "affine": true},
                        "dropout_op": null,
                        "dropout_op_kwargs": null,
                        "nonlin": "torch.nn.LeakyReLU",
                        "nonlin_kwargs": {"inplace": true}
                    },
                    "_kw_requires_import": ["conv_op", "norm_op", "dropout_op", "nonlin"]
                },
                "batch_dice": true
            },
            "3d_fullres": {
                "data_identifier": "nnUNetPlans_3d_fullres",
                "preprocessor_name": "DefaultPreprocessor",
                "batch_size": 2,
                "patch_size": [20, 320, 256],
                "median_image_size_in_voxels": [20.0, 320.0, 319.0],
                "spacing": [3.5999999046325684, 0.625, 0.625],
                "normalization_schemes": ["ZScoreNormalization", "ZScoreNormalization"],
                "use_mask_for_norm": [false, false],
                "resampling_fn_data": "resample_data_or_seg_to_shape",
                "resampling_fn_data_kwargs": {"is_seg": false, "order": 3, "order_z": 0, "force_separate_z": null},
                "architecture": {
                    "network_class_name": "dynamic_network_architectures.architectures.unet.PlainConvUNet",
                    "arch_kwargs": {
                        "n_stages": 7,
                        "features_per_stage": [32, 64, 128, 256, 320, 320, 320],
                        "conv_op": "torch.nn.modules.conv.Conv3d",
                        "kernel_sizes": [[1, 3, 3], [1, 3, 3], [3, 3, 3], [3, 3, 3], [3, 3, 3], [3, 3, 3], [3, 3, 3]],
                        "strides": [[1, 1, 1], [1, 2, 2], [1, 2, 2], [2, 2, 2], [2, 2, 2], [1, 2, 2], [1, 2, 2]],
                        "n_conv_per_stage": [2, 2, 2, 2, 2, 2, 2],
                        "n_conv_per_stage_decoder": [2, 2, 2, 2, 2, 2],
                        "conv_bias": true,
                        "norm_op": "torch.nn.modules.instancenorm.InstanceNorm3d",
                        "norm_op_kwargs": {"eps": 1e-05, "affine": true},
                        "dropout_op": null,
                        "dropout_op_kwargs": null,
                        "nonlin": "torch.nn.LeakyReLU",
                        "nonlin_kwargs": {"inplace": true}
                    },
                    "_kw_requires_import": ["conv_op", "norm_op", "dropout_op", "nonlin"]
                },
                "batch_dice": false
            },
            "3d_cascade_fullres": {
                "inherits_from": "3d_fullres",
                "previous_stage": "3d_lowres"
            }
        },
        "experiment_planner_used": "ExperimentPlanner",
        "label_manager": "LabelManager"
    })
}

/// Residual-encoder plans (`n_blocks_per_stage` instead of `n_conv_per_stage`)
pub fn residual_encoder_plans() -> Value {
    let mut plans = plain_plans();
    let arch = &mut plans["configurations"]["3d_fullres"]["architecture"];
    arch["network_class_name"] =
        json!("dynamic_network_architectures.architectures.unet.ResidualEncoderUNet");

    if let Some(kwargs) = arch["arch_kwargs"].as_object_mut() {
        kwargs.shift_remove("n_conv_per_stage");
        kwargs.insert("n_blocks_per_stage".into(), json!([1, 3, 4, 6, 6, 6, 6]));
    }
    plans
}

/// A temporary `nnUNet_preprocessed` root with one dataset folder
pub struct PreprocessedTree {
    dir: TempDir,
}

impl PreprocessedTree {
    /// Create tree with `plans` written as `Dataset005_Prostate/<plans_name>.json`
    pub fn with_plans(plans_name: &str, plans: &Value) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let dataset = dir.path().join(DATASET_FOLDER);
        fs::create_dir(&dataset).expect("create dataset dir");
        write_json(&dataset.join(format!("{plans_name}.json")), plans);
        Self { dir }
    }

    /// Create tree with the default plain plans as `nnUNetPlans.json`
    pub fn new() -> Self {
        Self::with_plans("nnUNetPlans", &plain_plans())
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn plans_path(&self) -> PathBuf {
        self.plans_path_named("nnUNetPlans")
    }

    pub fn plans_path_named(&self, plans_name: &str) -> PathBuf {
        self.root()
            .join(DATASET_FOLDER)
            .join(format!("{plans_name}.json"))
    }

    pub fn read_plans(&self) -> Value {
        read_json(&self.plans_path())
    }
}

impl Default for PreprocessedTree {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_json(path: &Path, value: &Value) {
    let text = serde_json::to_string_pretty(value).expect("serialize fixture");
    fs::write(path, text).expect("write fixture");
}

pub fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read plans");
    serde_json::from_str(&text).expect("parse plans")
}

/// The 18 configuration names of the default grid, in insertion order
pub fn default_variant_names() -> Vec<String> {
    let mut names = Vec::new();
    for s in [4, 5, 6] {
        for d in [2, 3] {
            for w in [16, 32, 64] {
                names.push(format!("3d_fullres_S{s}D{d}W{w}"));
            }
        }
    }
    names
}
