//! Heuristic gatekeeper that decides whether an upload looks like a chest X-ray.
//!
//! The validator never runs a learned model. It runs three cheap stages in a
//! fixed order, stopping at the first failure:
//!
//! ```text
//! bytes → header → geometry → decode → medical likeness → edge density → Accepted
//!            │         │         │              │                 │
//!            └─────────┴─────────┴──────────────┴─────────────────┴──→ Rejected(reason)
//! ```
//!
//! Geometry looks at the dimensions in the file header, before any pixel data
//! is decoded. The remaining stages look at the RGB-normalized copy that is
//! handed to the caller on acceptance.

use std::panic::{self, AssertUnwindSafe};

use image::RgbImage;

use crate::config::ValidatorConfig;
use crate::error::PipelineError;

use super::decode::{DecodedImage, ImageDecoder};

/// Why an image was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Bytes could not be decoded as an image
    Decode,
    /// Dimensions outside the configured bounds
    Geometry,
    /// Too much chroma to be a radiograph
    Color,
    /// Mean luminance outside the configured bounds
    Brightness,
    /// Luminance spread below the configured floor
    Contrast,
    /// Edge texture outside the expected range
    Texture,
    /// A stage panicked; reported like a decode failure
    Internal,
}

/// A rejected upload, with a message suitable for showing to the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reason: String,
}

impl Rejection {
    fn new(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    fn invalid_file(kind: RejectionKind, detail: impl std::fmt::Display) -> Self {
        Self::new(kind, format!("Invalid image file: {detail}"))
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Outcome of validating one upload.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The image passed every stage and is ready for classification
    Accepted(DecodedImage),
    /// The image failed a stage
    Rejected(Rejection),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted(_))
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Validation::Accepted(_) => None,
            Validation::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn into_result(self) -> Result<DecodedImage, Rejection> {
        match self {
            Validation::Accepted(image) => Ok(image),
            Validation::Rejected(rejection) => Err(rejection),
        }
    }
}

/// Whole-image color statistics used by the medical-likeness stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStats {
    /// Mean of the per-pixel |R-G|, |R-B| and |G-B| means
    pub avg_color_diff: f64,
    /// Mean ITU-R 601-2 luminance (0-255)
    pub mean_brightness: f64,
    /// Population standard deviation of the luminance
    pub std_brightness: f64,
}

impl ColorStats {
    /// Measure an RGB buffer in a single pass.
    pub fn measure(pixels: &RgbImage) -> Self {
        let mut diff_sum: u64 = 0;
        let mut luma_sum: u64 = 0;
        let mut luma_sq_sum: u128 = 0;
        let mut count: u64 = 0;

        for pixel in pixels.as_raw().chunks_exact(3) {
            let (r, g, b) = (pixel[0] as i32, pixel[1] as i32, pixel[2] as i32);
            diff_sum += ((r - g).abs() + (r - b).abs() + (g - b).abs()) as u64;

            let luma = luma_601(pixel[0], pixel[1], pixel[2]) as u64;
            luma_sum += luma;
            luma_sq_sum += (luma * luma) as u128;
            count += 1;
        }

        if count == 0 {
            return Self {
                avg_color_diff: 0.0,
                mean_brightness: 0.0,
                std_brightness: 0.0,
            };
        }

        let n = count as f64;
        // n * Σx² - (Σx)² is exact in integers and never negative.
        let n_wide = count as u128;
        let spread = n_wide * luma_sq_sum - (luma_sum as u128) * (luma_sum as u128);
        let variance = spread as f64 / (n * n);

        Self {
            avg_color_diff: diff_sum as f64 / (3.0 * n),
            mean_brightness: luma_sum as f64 / n,
            std_brightness: variance.sqrt(),
        }
    }
}

/// ITU-R 601-2 luma transform in 16-bit fixed point, rounded.
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    ((19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + 0x8000) >> 16) as u8
}

type StageResult = Result<(), Rejection>;

/// Rule-based chest X-ray validator.
///
/// Holds only its immutable thresholds, so one instance can serve any number
/// of concurrent validations.
#[derive(Debug, Clone, Default)]
pub struct ImageValidator {
    config: ValidatorConfig,
}

impl ImageValidator {
    /// Create a new validator with the given thresholds.
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run the full pipeline on raw image bytes.
    ///
    /// Never panics: a panic inside decoding or any stage becomes an
    /// "Invalid image file" rejection.
    pub fn validate(&self, bytes: &[u8]) -> Validation {
        let validation = catch_validation_panic(|| self.run(bytes));

        match &validation {
            Validation::Accepted(_) => tracing::info!("Image passed all validation checks"),
            Validation::Rejected(rejection) => {
                tracing::info!(kind = ?rejection.kind, "Image rejected: {}", rejection.reason)
            }
        }
        validation
    }

    fn run(&self, bytes: &[u8]) -> Validation {
        let decode_failed = |e: PipelineError| {
            tracing::warn!("Image decode failed: {e}");
            Validation::Rejected(Rejection::invalid_file(RejectionKind::Decode, e))
        };

        // Size bounds come from the header so oversized files never reach
        // the pixel decoder.
        let header = match ImageDecoder::read_header(bytes) {
            Ok(header) => header,
            Err(e) => return decode_failed(e),
        };
        if let Err(rejection) = self.check_geometry(header.width, header.height) {
            return Validation::Rejected(rejection);
        }

        match ImageDecoder::decode_bytes(bytes) {
            Ok(decoded) => self.validate_decoded(decoded),
            Err(e) => decode_failed(e),
        }
    }

    /// Run the stages on an image that has already been decoded.
    pub fn validate_decoded(&self, decoded: DecodedImage) -> Validation {
        let stages = self
            .check_geometry(decoded.width, decoded.height)
            .and_then(|_| self.check_aspect_ratio(decoded.width, decoded.height))
            .and_then(|_| self.check_medical_likeness(&decoded.pixels))
            .and_then(|_| self.check_edge_density(&decoded.pixels));

        match stages {
            Ok(()) => Validation::Accepted(decoded),
            Err(rejection) => Validation::Rejected(rejection),
        }
    }

    /// Stage 1: size bounds on the raw dimensions.
    pub fn check_geometry(&self, width: u32, height: u32) -> StageResult {
        let c = &self.config;
        tracing::debug!(width, height, "Checking image geometry");

        if width < c.min_width || height < c.min_height {
            return Err(Rejection::new(
                RejectionKind::Geometry,
                format!(
                    "Image too small. Minimum size: {}x{}px",
                    c.min_width, c.min_height
                ),
            ));
        }
        if width > c.max_width || height > c.max_height {
            return Err(Rejection::new(
                RejectionKind::Geometry,
                format!(
                    "Image too large. Maximum size: {}x{}px",
                    c.max_width, c.max_height
                ),
            ));
        }
        Ok(())
    }

    /// Aspect-ratio check. Disabled: radiographs come in too many formats, so
    /// `aspect_ratio_range` is recorded in the config but never enforced.
    pub fn check_aspect_ratio(&self, _width: u32, _height: u32) -> StageResult {
        Ok(())
    }

    /// Stage 2: grayscale-ness, brightness and contrast.
    pub fn check_medical_likeness(&self, pixels: &RgbImage) -> StageResult {
        let c = &self.config;
        let stats = ColorStats::measure(pixels);
        tracing::debug!(
            avg_color_diff = stats.avg_color_diff,
            mean_brightness = stats.mean_brightness,
            std_brightness = stats.std_brightness,
            "Measured color statistics"
        );

        if stats.avg_color_diff > c.max_color_diff {
            return Err(Rejection::new(
                RejectionKind::Color,
                "Image appears to be a color photo, not a medical X-ray. \
                 Please upload a chest X-ray image.",
            ));
        }
        if stats.mean_brightness < c.min_brightness || stats.mean_brightness > c.max_brightness {
            return Err(Rejection::new(
                RejectionKind::Brightness,
                "Image brightness unusual for chest X-ray. Please upload a valid medical image.",
            ));
        }
        if stats.std_brightness < c.min_contrast {
            return Err(Rejection::new(
                RejectionKind::Contrast,
                "Image lacks contrast typical of chest X-rays. Please upload a valid medical image.",
            ));
        }
        Ok(())
    }

    /// Stage 3: edge density. Always passes for now.
    ///
    /// Gradient-magnitude thresholds rejected too many genuine radiographs, so
    /// the stage is kept as a boundary for a future texture check.
    pub fn check_edge_density(&self, _pixels: &RgbImage) -> StageResult {
        Ok(())
    }
}

/// Run `validate`, turning a panic into an `Internal` rejection.
fn catch_validation_panic(validate: impl FnOnce() -> Validation) -> Validation {
    match panic::catch_unwind(AssertUnwindSafe(validate)) {
        Ok(validation) => validation,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            tracing::error!("Image validation error: {detail}");
            Validation::Rejected(Rejection::invalid_file(RejectionKind::Internal, detail))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected failure during validation".to_string()
    }
}
