//! Typed inspection parameters.
//!
//! The configuration is a tree of named parameter groups that is snapshotted
//! once per pipeline run. JSON keys are snake_case; the labels written by the
//! legacy teaching tool (`"Gaussian Blur"`, `"EXTERNAL"`, `"HOUGH_GRADIENT"`,
//! `c_index`, `shapes`, ...) are accepted as aliases so old model files load.

use crate::align::MarkerPose;
use crate::geometry::Rect;
use crate::util::math::normalize_odd;
use crate::util::{MarkAlignError, MarkAlignResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub mod store;

pub use store::ModelStore;

/// Top-level sections a stored model must contain before it is accepted.
/// Largest absolute coordinate or size accepted for an anchor region.
pub const MAX_REGION_EXTENT: i32 = 1 << 20;

pub const REQUIRED_SECTIONS: [&str; 5] =
    ["blur", "threshold", "morphological", "contour", "detection"];

/// Smoothing kernel family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurKind {
    #[serde(alias = "Gaussian Blur")]
    Gaussian,
    #[serde(alias = "Median Blur")]
    Median,
    #[serde(alias = "Average Blur")]
    Average,
}

/// Blur stage parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    #[serde(alias = "type")]
    pub kind: BlurKind,
    /// Kernel size; even values are bumped to the next odd value.
    pub ksize: u32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            kind: BlurKind::Gaussian,
            ksize: 9,
        }
    }
}

/// How the local threshold level is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveMethod {
    #[serde(alias = "Gaussian")]
    Gaussian,
    #[serde(alias = "Mean")]
    Mean,
}

/// How a pixel is mapped once compared with its local threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    #[serde(alias = "Binary")]
    Binary,
    #[serde(alias = "Binary Inverted")]
    BinaryInverted,
    #[serde(alias = "Truncate")]
    Truncate,
    #[serde(alias = "To Zero")]
    ToZero,
    #[serde(alias = "To Zero Inverted")]
    ToZeroInverted,
}

/// Adaptive threshold stage parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    #[serde(alias = "adaptive_type")]
    pub adaptive: AdaptiveMethod,
    #[serde(alias = "thresh_type")]
    pub kind: ThresholdKind,
    /// Neighborhood size; must be at least 3 once normalized to odd.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    #[serde(alias = "c_index")]
    pub c: i32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            adaptive: AdaptiveMethod::Gaussian,
            kind: ThresholdKind::Binary,
            block_size: 125,
            c: 9,
        }
    }
}

/// Morphological operation on the binary mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphOp {
    #[serde(alias = "Erode")]
    Erode,
    #[serde(alias = "Dilate")]
    Dilate,
    #[serde(alias = "Open")]
    Open,
    #[serde(alias = "Close")]
    Close,
}

/// Morphology stage parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyConfig {
    #[serde(alias = "type")]
    pub op: MorphOp,
    pub kernel_size: u32,
    /// Repetitions for erode and dilate; open and close run once.
    pub iterations: u32,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            op: MorphOp::Erode,
            kernel_size: 5,
            iterations: 5,
        }
    }
}

/// Which borders the contour extractor reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    #[serde(alias = "EXTERNAL")]
    External,
    #[serde(alias = "LIST")]
    List,
    #[serde(rename = "ccomp", alias = "CCOMP")]
    CComp,
    #[serde(alias = "TREE")]
    Tree,
}

/// How border chains are compressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproximationMode {
    #[serde(alias = "NONE")]
    None,
    #[serde(alias = "SIMPLE")]
    Simple,
    #[serde(rename = "tc89_l1", alias = "TC89_L1")]
    Tc89L1,
    #[serde(rename = "tc89_kcos", alias = "TC89_KCOS")]
    Tc89Kcos,
}

/// Contour extraction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    pub retrieval_mode: RetrievalMode,
    pub approximation_mode: ApproximationMode,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            retrieval_mode: RetrievalMode::External,
            approximation_mode: ApproximationMode::Simple,
        }
    }
}

/// Blob acceptance filter on bounding boxes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Inclusive lower bound on `w * h`.
    #[serde(deserialize_with = "number_or_string")]
    pub area_min: f64,
    /// Inclusive upper bound on `w * h`.
    #[serde(deserialize_with = "number_or_string")]
    pub area_max: f64,
    /// Exclusive upper bound on `|w - h|`.
    #[serde(alias = "distance", deserialize_with = "number_or_string")]
    pub max_aspect_skew: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            area_min: 100_000.0,
            area_max: 150_000.0,
            max_aspect_skew: 15.0,
        }
    }
}

/// Shape of the anchor-region grid; `rows * columns` is the slot count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub columns: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            columns: 5,
        }
    }
}

/// A taught rectangle expected to contain one inspection target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRegion {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "box")]
    pub rect: Rect,
}

/// Circle transform identifiers.
///
/// Only the gradient variants detect circles; the other identifiers name line
/// transforms and are rejected by the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoughMethod {
    #[serde(alias = "HOUGH_STANDARD")]
    Standard,
    #[serde(alias = "HOUGH_PROBABILISTIC")]
    Probabilistic,
    #[serde(alias = "HOUGH_MULTI_SCALE")]
    MultiScale,
    #[serde(alias = "HOUGH_GRADIENT")]
    Gradient,
    #[serde(alias = "HOUGH_GRADIENT_ALT")]
    GradientAlt,
}

impl HoughMethod {
    /// Stable lowercase name, as serialized.
    pub fn name(self) -> &'static str {
        match self {
            HoughMethod::Standard => "standard",
            HoughMethod::Probabilistic => "probabilistic",
            HoughMethod::MultiScale => "multi_scale",
            HoughMethod::Gradient => "gradient",
            HoughMethod::GradientAlt => "gradient_alt",
        }
    }
}

/// Per-region circle detection parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    #[serde(alias = "type_blur_hough")]
    pub blur: BlurKind,
    #[serde(alias = "ksize_hough")]
    pub ksize: u32,
    #[serde(alias = "type_hough")]
    pub method: HoughMethod,
    /// Inverse accumulator resolution.
    pub dp: f64,
    /// Minimum distance between detected centers.
    pub min_dist: f64,
    /// Upper Canny threshold.
    pub param1: f64,
    /// Accumulator threshold (`gradient`) or circle perfectness (`gradient_alt`).
    pub param2: f64,
    pub min_radius: i32,
    /// Values `<= 0` mean "up to the larger crop side".
    pub max_radius: i32,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            blur: BlurKind::Median,
            ksize: 5,
            method: HoughMethod::Gradient,
            dp: 1.0,
            min_dist: 20.0,
            param1: 100.0,
            param2: 30.0,
            min_radius: 0,
            max_radius: 0,
        }
    }
}

/// Complete parameter snapshot for one pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    pub blur: BlurConfig,
    pub threshold: ThresholdConfig,
    #[serde(alias = "morphology")]
    pub morphological: MorphologyConfig,
    pub contour: ContourConfig,
    pub detection: DetectionConfig,
    pub grid: GridConfig,
    /// Anchor regions keyed by region id, iterated in id order.
    #[serde(alias = "shapes")]
    pub regions: BTreeMap<usize, AnchorRegion>,
    #[serde(alias = "hough_circle")]
    pub hough: HoughConfig,
    /// Reference poses captured while teaching, keyed by region id.
    #[serde(alias = "blobs")]
    pub origins: BTreeMap<usize, MarkerPose>,
}

impl InspectionConfig {
    /// Number of result slots, `rows * columns`.
    pub fn slot_count(&self) -> usize {
        self.grid.rows * self.grid.columns
    }

    /// Parses and validates a JSON document.
    ///
    /// The five required sections must be present before typed
    /// deserialization is attempted.
    pub fn from_json_str(text: &str) -> MarkAlignResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let object = value.as_object().ok_or_else(|| MarkAlignError::ConfigParse {
            reason: "top-level value must be an object".to_string(),
        })?;
        for section in REQUIRED_SECTIONS {
            if !object.contains_key(section) {
                return Err(MarkAlignError::MissingSection(section));
            }
        }
        let config: InspectionConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> MarkAlignResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> MarkAlignResult<()> {
        let detection = &self.detection;
        if !detection.area_min.is_finite() || !detection.area_max.is_finite() {
            return invalid("detection areas must be finite");
        }
        if detection.area_min > detection.area_max {
            return Err(MarkAlignError::ConfigInvalid {
                reason: format!(
                    "area_min {} exceeds area_max {}",
                    detection.area_min, detection.area_max
                ),
            });
        }
        if detection.max_aspect_skew < 0.0 || detection.max_aspect_skew.is_nan() {
            return invalid("max_aspect_skew must be non-negative");
        }
        if normalize_odd(self.threshold.block_size) < 3 {
            return invalid("threshold block_size must be at least 3");
        }
        if self.grid.rows == 0 || self.grid.columns == 0 {
            return invalid("grid rows and columns must be at least 1");
        }
        if !(self.hough.dp > 0.0) || !self.hough.dp.is_finite() {
            return invalid("hough dp must be positive and finite");
        }
        let slots = self.slot_count();
        for (&id, region) in &self.regions {
            if id >= slots {
                return Err(MarkAlignError::ConfigInvalid {
                    reason: format!("region id {id} outside grid of {slots} slots"),
                });
            }
            if region.rect.width < 0 || region.rect.height < 0 {
                return Err(MarkAlignError::ConfigInvalid {
                    reason: format!("region {id} has a negative size"),
                });
            }
            let r = region.rect;
            if [r.x, r.y, r.width, r.height]
                .iter()
                .any(|v| v.unsigned_abs() > MAX_REGION_EXTENT as u32)
            {
                return Err(MarkAlignError::ConfigInvalid {
                    reason: format!("region {id} exceeds +/-{MAX_REGION_EXTENT} pixels"),
                });
            }
        }
        if let Some(&id) = self.origins.keys().find(|&&id| id >= slots) {
            return Err(MarkAlignError::ConfigInvalid {
                reason: format!("origin id {id} outside grid of {slots} slots"),
            });
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> MarkAlignResult<()> {
    Err(MarkAlignError::ConfigInvalid {
        reason: reason.to_string(),
    })
}

/// Older model files store numeric fields as strings (`"100000"`).
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
