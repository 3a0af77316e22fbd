use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Image types the upload control accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub const ALLOWED_EXTENSIONS: [&'static str; 3] = ["jpg", "jpeg", "png"];

    /// Match a bare extension (no dot), case-insensitive.
    pub fn from_extension(ext: &str) -> ScanResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(ScanError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_filename(filename: &str) -> ScanResult<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "JPEG"),
            Self::Png => write!(f, "PNG"),
        }
    }
}

/// Raw bytes of a user-selected file whose extension is in the allowed set.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    /// Extension as the user supplied it, kept for the staged file name.
    pub extension: String,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> ScanResult<Self> {
        let filename = filename.into();
        let extension = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        let format = ImageFormat::from_extension(&extension)?;
        Ok(Self {
            filename,
            extension,
            format,
            bytes,
        })
    }
}

/// Base64 body of an image, tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPayload {
    pub mime_type: String,
    pub data: String,
}

/// Where a session currently sits in the upload → analyze → simplify flow.
///
/// `Analyzing` and `Simplifying` only exist while a service call is awaited;
/// no other action can observe them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    ImageStaged,
    Analyzing,
    AnalysisReady,
    Simplifying,
    SimplifiedReady,
}

/// Answer to "Would you like a simplified explanation?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimplifyChoice {
    #[default]
    No,
    Yes,
}

impl SimplifyChoice {
    pub const ALL: [SimplifyChoice; 2] = [SimplifyChoice::No, SimplifyChoice::Yes];
}

impl fmt::Display for SimplifyChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No => write!(f, "No"),
            Self::Yes => write!(f, "Yes"),
        }
    }
}
