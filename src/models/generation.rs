use serde::Serialize;

/// Final output of one generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// `data:image/gif;base64,...`
    pub gif_url: String,
    /// `<base>_intensifies.gif`
    pub file_name: String,
    /// Raw GIF bytes (same content as `gif_url`)
    #[serde(skip)]
    pub gif_bytes: Vec<u8>,
    #[serde(skip)]
    pub frame_count: usize,
    /// Lossy level of the returned candidate
    #[serde(skip)]
    pub lossy_level: u32,
}

impl GenerationResult {
    /// Whether the GIF fits `max_bytes`
    pub fn fits(&self, max_bytes: usize) -> bool {
        self.gif_bytes.len() <= max_bytes
    }
}
