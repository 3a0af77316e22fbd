use thiserror::Error;

/// Result alias for pipeline operations.
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Which external call a [`ScanError::Service`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCall {
    Analysis,
    Simplification,
}

/// Every failure a session can surface to the user.
///
/// Only [`ScanError::Configuration`] is fatal; the rest abort the current
/// action and leave the session in its prior state.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("no valid image uploaded or file path is incorrect")]
    MissingInput,

    #[error("unsupported image type '{0}' (allowed: jpg, jpeg, png)")]
    UnsupportedFormat(String),

    #[error("{call:?} request failed: {message}")]
    Service { call: ServiceCall, message: String },
}

impl ScanError {
    pub fn service(call: ServiceCall, message: impl Into<String>) -> Self {
        Self::Service {
            call,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Sentence shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(msg) => msg.clone(),
            Self::Io(e) => format!("Could not read the image: {e}"),
            Self::MissingInput => "No valid image uploaded or file path is incorrect.".to_string(),
            Self::UnsupportedFormat(ext) => {
                format!("Unsupported file type '{ext}'. Upload a jpg, jpeg or png image.")
            }
            Self::Service {
                call: ServiceCall::Analysis,
                ..
            } => "Unable to analyze the image at this moment.".to_string(),
            Self::Service {
                call: ServiceCall::Simplification,
                ..
            } => "Unable to simplify the explanation.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_is_fatal() {
        assert!(ScanError::Configuration("missing".into()).is_fatal());
        assert!(!ScanError::MissingInput.is_fatal());
        assert!(!ScanError::service(ServiceCall::Analysis, "timeout").is_fatal());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!ScanError::from(io).is_fatal());
    }

    #[test]
    fn service_messages_name_the_failed_step() {
        let analysis = ScanError::service(ServiceCall::Analysis, "503");
        let simplify = ScanError::service(ServiceCall::Simplification, "503");
        assert_eq!(
            analysis.user_message(),
            "Unable to analyze the image at this moment."
        );
        assert_eq!(simplify.user_message(), "Unable to simplify the explanation.");
        assert!(analysis.to_string().contains("503"));
    }
}
