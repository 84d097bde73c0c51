//! CareLens Core - healthcare AI services behind the CareLens API.
//!
//! The centerpiece is the chest X-ray intake check: uploaded bytes are
//! decoded once and run through a short list of cheap heuristics before any
//! model sees them.
//!
//! # Architecture
//!
//! ```text
//! bytes → Decode → Geometry → Aspect ratio → Medical likeness → Edge density
//!                                                   │
//!                    Accepted(image) ───────────────┴──→ Preprocess → Classifier
//! ```
//!
//! Alongside it live the symptom-based diagnosis model, the LLM-backed
//! medical assistant and a SQLite event log that feeds the dashboard charts.
//! [`Services`] wires them together from a [`Config`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use carelens_core::{ImageValidator, Validation};
//!
//! let validator = ImageValidator::default();
//! match validator.validate(&std::fs::read("chest.png")?) {
//!     Validation::Accepted(image) => println!("ok: {}x{}", image.width, image.height),
//!     Validation::Rejected(rejection) => println!("rejected: {rejection}"),
//! }
//! ```

// Links Accelerate for ndarray's `blas` feature on macOS.
#[cfg(target_os = "macos")]
extern crate blas_src;

// Module declarations
pub mod analytics;
pub mod assistant;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod scan;
pub mod service;
pub mod symptom;
pub mod types;

// Re-exports for convenient access
pub use analytics::AnalyticsStore;
pub use assistant::Assistant;
pub use config::Config;
pub use error::{
    CareLensError, ConfigError, PipelineError, PipelineResult, Result, ServiceError,
    ServiceResult, StorageError,
};
pub use pipeline::{ColorStats, DecodedImage, ImageValidator, Rejection, RejectionKind, Validation};
pub use scan::ScanAnalyzer;
pub use service::Services;
pub use symptom::SymptomPredictor;
pub use types::{
    ChartData, ChatRequest, ChatResponse, ScanAnalysis, ScanRequest, SummarizeRequest,
    SummarizeResponse, SymptomRequest, SymptomResponse,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
