//! medscan — send a medical scan image to a vision model for analysis, and
//! optionally have the findings restated in plain language.

pub mod cli;
pub mod config;
pub mod error;
pub mod markdown;
pub mod providers;
pub mod scan;

pub use config::Config;
pub use error::{ScanError, ScanResult, ServiceCall};
pub use providers::{AnalysisService, OpenAiClient};
pub use scan::{ImageStaging, Phase, Session, SimplifyChoice, UploadedImage};
