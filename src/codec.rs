//! Encoded diagram codec.
//!
//! A [`Document`] travels as an [`EncodedDiagram`]: the document's JSON,
//! compressed with raw DEFLATE, then base64 (URL-safe alphabet, no padding).
//! The result is plain ASCII, so the same string works as clipboard text, a URL
//! fragment, or a JSON field value in the outbound change event.
//!
//! Decoding never yields a partial graph: every stage either succeeds or
//! returns a [`CodecError`], and the parsed document must pass
//! [`Document::validate`] before it is handed back.

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

use std::fmt;
use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_DECODED_BYTES;
use crate::doc::{Document, DocumentError};

/// Error returned by [`decode`] and [`parse_json`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input was empty or whitespace.
    #[error("encoded diagram is empty")]
    Empty,
    /// The input is not valid URL-safe base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The base64 payload is not a valid DEFLATE stream.
    #[error("failed to inflate diagram: {0}")]
    Inflate(#[source] std::io::Error),
    /// The inflated payload exceeds [`MAX_DECODED_BYTES`].
    #[error("decoded diagram exceeds {} bytes", MAX_DECODED_BYTES)]
    TooLarge,
    /// The inflated payload is not a JSON document.
    #[error("invalid diagram JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON parsed but does not describe a valid graph.
    #[error("invalid diagram: {0}")]
    Invalid(#[from] DocumentError),
}

/// Compressed, transport-safe form of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedDiagram(String);

impl EncodedDiagram {
    /// Borrow the encoded text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the encoded text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for EncodedDiagram {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for EncodedDiagram {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a document into its transport string.
#[must_use]
pub fn encode(doc: &Document) -> EncodedDiagram {
    // Serializing string-keyed maps and plain structs cannot fail.
    let json = serde_json::to_vec(doc).unwrap_or_default();

    let mut encoder = DeflateEncoder::new(Vec::with_capacity(json.len() / 2), Compression::best());
    // Writing into a growable Vec is infallible.
    let compressed = encoder
        .write_all(&json)
        .and_then(|()| encoder.finish())
        .unwrap_or_default();

    EncodedDiagram(URL_SAFE_NO_PAD.encode(compressed))
}

/// Decode a transport string back into a validated document.
///
/// Surrounding whitespace is ignored, so text pasted with a trailing newline
/// still decodes.
///
/// # Errors
///
/// Returns a [`CodecError`] naming the first stage that failed.
pub fn decode(input: &str) -> Result<Document, CodecError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CodecError::Empty);
    }

    let compressed = URL_SAFE_NO_PAD.decode(trimmed)?;

    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_DECODED_BYTES + 1)
        .read_to_end(&mut json)
        .map_err(CodecError::Inflate)?;
    if u64::try_from(json.len()).unwrap_or(u64::MAX) > MAX_DECODED_BYTES {
        return Err(CodecError::TooLarge);
    }

    let doc: Document = serde_json::from_slice(&json)?;
    doc.validate()?;
    Ok(doc)
}

/// Parse and validate a plain JSON document.
///
/// # Errors
///
/// Returns [`CodecError::Json`] or [`CodecError::Invalid`].
pub fn parse_json(input: &str) -> Result<Document, CodecError> {
    let doc: Document = serde_json::from_str(input)?;
    doc.validate()?;
    Ok(doc)
}

/// Render a document as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn to_json_pretty(doc: &Document) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(doc)?)
}
