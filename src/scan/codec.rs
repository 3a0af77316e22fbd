use super::schema::{EncodedPayload, ImageFormat};
use crate::error::ScanResult;
use base64::Engine;
use std::path::Path;
use tokio::fs;

/// Encode image bytes as standard base64, tagged with the format's MIME type.
pub fn encode(data: &[u8], format: ImageFormat) -> EncodedPayload {
    EncodedPayload {
        mime_type: format.mime_type().to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(data),
    }
}

/// Read a staged image from disk and encode it.
///
/// The format comes from the file's extension; the bytes are not sniffed.
/// A vanished or unreadable file yields `ScanError::Io`.
pub async fn encode_file(path: &Path) -> ScanResult<EncodedPayload> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let format = ImageFormat::from_filename(name)?;
    let data = fs::read(path).await?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "encoding staged image");
    Ok(encode(&data, format))
}

pub fn decode(payload: &EncodedPayload) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(&payload.data)
}

impl EncodedPayload {
    /// `data:<mime>;base64,<body>` form used for inline image content.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
