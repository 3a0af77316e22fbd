use super::codec;
use super::schema::{Phase, SimplifyChoice, UploadedImage};
use super::staging::{ImageStaging, StagedImage};
use crate::error::{ScanError, ScanResult};
use crate::providers::AnalysisService;
use tracing::{info, warn};

/// State of one interactive session: staged image, analysis text, simplified text.
///
/// Created empty, mutated only by [`Session::upload`], [`Session::analyze`] and
/// [`AnalysisReady::choose`], and torn down with [`Session::close`].
pub struct Session<S> {
    service: S,
    staging: ImageStaging,
    phase: Phase,
    staged: Option<StagedImage>,
    superseded: Vec<StagedImage>,
    analysis: Option<String>,
    simplified: Option<String>,
}

impl<S: AnalysisService> Session<S> {
    pub fn new(service: S, staging: ImageStaging) -> Self {
        Self {
            service,
            staging,
            phase: Phase::Idle,
            staged: None,
            superseded: Vec::new(),
            analysis: None,
            simplified: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn staged(&self) -> Option<&StagedImage> {
        self.staged.as_ref()
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn simplified(&self) -> Option<&str> {
        self.simplified.as_deref()
    }

    /// Stage a new upload. A previously staged file is superseded, not deleted;
    /// the prior analysis stays available until a new one replaces it.
    pub async fn upload(&mut self, image: UploadedImage) -> ScanResult<&StagedImage> {
        let staged = self.staging.stage(&image).await?;
        if let Some(previous) = self.staged.take() {
            if !previous.is_released() {
                self.superseded.push(previous);
            }
        }
        self.phase = Phase::ImageStaged;
        Ok(self.staged.insert(staged))
    }

    /// Send the staged image for detailed analysis.
    ///
    /// Fails with `MissingInput` before any call if nothing is staged or the
    /// staged file is gone. The staged file is deleted only after the service
    /// returns successfully; on any failure it stays for a retry.
    pub async fn analyze(&mut self) -> ScanResult<&str> {
        let Some(staged) = self.staged.as_ref() else {
            warn!("analyze requested before any upload");
            return Err(ScanError::MissingInput);
        };
        if !staged.exists().await {
            warn!(path = %staged.path().display(), "staged image is no longer on disk");
            return Err(ScanError::MissingInput);
        }

        let payload = codec::encode_file(staged.path()).await.inspect_err(|e| {
            warn!(error = %e, "could not encode staged image");
        })?;

        let prior = self.phase;
        self.phase = Phase::Analyzing;
        info!(file = staged.original_name(), "requesting analysis");

        let text = match self.service.analyze(&payload).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "analysis failed; staged image kept for retry");
                self.phase = prior;
                return Err(e);
            }
        };

        if let Some(staged) = self.staged.as_mut() {
            staged.mark_consumed();
            if let Err(e) = staged.release().await {
                warn!(error = %e, path = %staged.path().display(), "could not remove staged image");
            }
        }
        self.simplified = None;
        self.phase = Phase::AnalysisReady;
        info!(chars = text.len(), "analysis ready");
        Ok(self.analysis.insert(text).as_str())
    }

    /// Handle for the simplify step; `None` until a non-empty analysis exists.
    pub fn ready(&mut self) -> Option<AnalysisReady<'_, S>> {
        if self.analysis.as_deref().is_some_and(|text| !text.is_empty()) {
            Some(AnalysisReady { session: self })
        } else {
            None
        }
    }

    /// End the session, removing any staged files no analysis consumed.
    pub async fn close(mut self) {
        let leftovers = self.superseded.iter_mut().chain(self.staged.as_mut());
        for staged in leftovers {
            if let Err(e) = staged.release().await {
                warn!(error = %e, path = %staged.path().display(), "could not remove staged image");
            }
        }
    }
}

/// A session that holds an analysis, so the simplify step can be offered.
pub struct AnalysisReady<'s, S> {
    session: &'s mut Session<S>,
}

impl<'s, S: AnalysisService> AnalysisReady<'s, S> {
    pub fn analysis(&self) -> &str {
        self.session.analysis.as_deref().unwrap_or_default()
    }

    /// Apply the user's yes/no answer. `No` makes no call and changes nothing.
    pub async fn choose(self, choice: SimplifyChoice) -> ScanResult<Option<String>> {
        match choice {
            SimplifyChoice::No => Ok(None),
            SimplifyChoice::Yes => self.simplify().await.map(Some),
        }
    }

    /// Ask for the simplified explanation. The analysis itself is never replaced.
    pub async fn simplify(self) -> ScanResult<String> {
        let session = self.session;
        let analysis = session.analysis.clone().unwrap_or_default();

        let prior = session.phase;
        session.phase = Phase::Simplifying;
        info!("requesting simplified explanation");

        match session.service.simplify(&analysis).await {
            Ok(text) => {
                session.simplified = Some(text.clone());
                session.phase = Phase::SimplifiedReady;
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "simplification failed");
                session.phase = prior;
                Err(e)
            }
        }
    }
}
