//! `data:` URI parsing and encoding (RFC 2397).

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use percent_encoding::percent_decode_str;
use std::io;

use crate::error::IntensifyError;

/// Standard alphabet, padded on encode, padding optional on decode
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Media type without parameters, lowercased (e.g. `image/png`)
    pub mime: String,
    /// Decoded payload bytes
    pub data: Vec<u8>,
}

impl DataUri {
    /// Parse `data:<mime>[;param]*[;base64],<payload>`.
    ///
    /// A URI without the `data:` scheme or without a comma is a
    /// [`IntensifyError::Validation`]; a payload that fails to decode is an
    /// [`IntensifyError::Io`] with kind `InvalidData`.
    pub fn parse(uri: &str) -> Result<Self, IntensifyError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| IntensifyError::Validation("expected a data: URI".to_string()))?;

        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            IntensifyError::Validation("data URI is missing the ',' separator".to_string())
        })?;

        let mut parts = header.split(';');
        let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let is_base64 = parts.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        let data = if is_base64 {
            let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            let compact = percent_decode_str(&compact).decode_utf8().map_err(invalid_data)?;
            BASE64.decode(compact.as_bytes()).map_err(invalid_data)?
        } else {
            percent_decode_str(payload).collect()
        };

        Ok(Self { mime, data })
    }

    /// Encode bytes as `data:<mime>;base64,<payload>`
    pub fn encode(mime: &str, data: &[u8]) -> String {
        format!("data:{mime};base64,{}", BASE64.encode(data))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

fn invalid_data(e: impl std::error::Error + Send + Sync + 'static) -> IntensifyError {
    IntensifyError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Guess an image MIME type from a file name's extension
pub fn mime_for_file_name(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "tga" => "image/x-tga",
        "avif" => "image/avif",
        _ => "image/octet-stream",
    }
}
