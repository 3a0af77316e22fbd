//! Scan pipeline: upload staging, image encoding, and the per-session
//! analyze → simplify state machine.

pub mod codec;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod staging;

pub use pipeline::{AnalysisReady, Session};
pub use schema::{EncodedPayload, ImageFormat, Phase, SimplifyChoice, UploadedImage};
pub use staging::{ImageStaging, StagedImage};
