//! Generation service seam.
//!
//! The session state machine only sees [`AnalysisService`]; the HTTP client in
//! [`openai`] is one implementation of it.

pub mod openai;

use crate::error::ScanResult;
use crate::scan::EncodedPayload;
use async_trait::async_trait;
use std::sync::Arc;

pub use openai::OpenAiClient;

/// The two independent, stateless calls a session makes.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Detailed findings for an encoded image.
    async fn analyze(&self, payload: &EncodedPayload) -> ScanResult<String>;

    /// Restate an analysis in simple language.
    async fn simplify(&self, analysis: &str) -> ScanResult<String>;
}

#[async_trait]
impl<T: AnalysisService + ?Sized> AnalysisService for Arc<T> {
    async fn analyze(&self, payload: &EncodedPayload) -> ScanResult<String> {
        (**self).analyze(payload).await
    }

    async fn simplify(&self, analysis: &str) -> ScanResult<String> {
        (**self).simplify(analysis).await
    }
}
