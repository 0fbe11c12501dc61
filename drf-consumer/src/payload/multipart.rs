//! Binary multipart parts.

use std::fmt;

use crate::{
    error::{ConsumerError, Result},
    payload::UnwrappedJson,
};

/// Part name under which the JSON portion of a multipart body travels.
pub const MULTIPART_JSON_KEY: &str = "data";

/// Content types a multipart part may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    /// `application/json`
    ApplicationJson,
    /// `image/jpeg`
    ImageJpeg,
    /// `image/png`
    ImagePng,
    /// `image/gif`
    ImageGif,
    /// `application/pdf`
    ApplicationPdf,
    /// `text/plain`
    TextPlain,
    /// `application/octet-stream`
    OctetStream,
}

impl ContentType {
    /// Every supported content type.
    pub const ALL: [Self; 7] = [
        Self::ApplicationJson,
        Self::ImageJpeg,
        Self::ImagePng,
        Self::ImageGif,
        Self::ApplicationPdf,
        Self::TextPlain,
        Self::OctetStream,
    ];

    /// MIME string for the `Content-Type` header of the part.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationJson => "application/json",
            Self::ImageJpeg => "image/jpeg",
            Self::ImagePng => "image/png",
            Self::ImageGif => "image/gif",
            Self::ApplicationPdf => "application/pdf",
            Self::TextPlain => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }

    /// Placeholder part for a field that is intentionally empty but must still
    /// appear in the multipart envelope.
    #[must_use]
    pub fn null(self) -> MultipartValue {
        MultipartValue::null(self)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One binary part: raw bytes plus their declared content type.
#[derive(Clone, PartialEq, Eq)]
pub struct MultipartValue {
    /// Raw part body.
    pub bytes: Vec<u8>,
    /// Declared content type.
    pub content_type: ContentType,
}

impl MultipartValue {
    /// Creates a part.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: ContentType) -> Self {
        Self { bytes: bytes.into(), content_type }
    }

    /// The `"null"` placeholder part for `content_type`.
    #[must_use]
    pub fn null(content_type: ContentType) -> Self {
        Self { bytes: b"null".to_vec(), content_type }
    }

    /// Returns true if this is the `"null"` placeholder.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.bytes == b"null"
    }
}

// Prints the byte count, not the bytes.
impl fmt::Debug for MultipartValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartValue")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Lays out a multipart envelope: the JSON fields as one `application/json`
/// part under [`MULTIPART_JSON_KEY`], then the binary parts in order.
///
/// The JSON part is left out when `json` is empty.
///
/// # Errors
///
/// Returns [`ConsumerError::SerializationError`] if a binary part is named
/// [`MULTIPART_JSON_KEY`] while JSON fields are present, or if `json` cannot be
/// serialized.
pub fn envelope(
    json: &UnwrappedJson,
    parts: impl IntoIterator<Item = (String, MultipartValue)>,
) -> Result<Vec<(String, MultipartValue)>> {
    let parts: Vec<(String, MultipartValue)> = parts.into_iter().collect();
    if json.is_empty() {
        return Ok(parts);
    }
    if parts.iter().any(|(name, _)| name == MULTIPART_JSON_KEY) {
        return Err(ConsumerError::SerializationError(format!(
            "binary field '{MULTIPART_JSON_KEY}' collides with the JSON part"
        )));
    }

    let blob =
        serde_json::to_vec(json).map_err(|e| ConsumerError::SerializationError(e.to_string()))?;
    let mut envelope = Vec::with_capacity(parts.len() + 1);
    let json_part = MultipartValue::new(blob, ContentType::ApplicationJson);
    envelope.push((MULTIPART_JSON_KEY.to_owned(), json_part));
    envelope.extend(parts);
    Ok(envelope)
}
