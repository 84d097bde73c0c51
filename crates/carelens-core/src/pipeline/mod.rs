//! Image pipeline components.
//!
//! - **decode**: Decode raw bytes once and normalize to RGB
//! - **validate**: Heuristic X-ray gatekeeper run before inference
//! - **preprocess**: Resize and normalize accepted images for the classifier

pub mod decode;
pub mod preprocess;
pub mod validate;

// Re-exports for convenient access
pub use decode::{ColorMode, DecodedImage, ImageDecoder, ImageHeader};
pub use preprocess::preprocess;
pub use validate::{ColorStats, ImageValidator, Rejection, RejectionKind, Validation};
