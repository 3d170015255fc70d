// Provider-agnostic request/response types
//
// These decouple the pipeline from any particular vendor payload. Adapters in
// this module translate them to and from the wire format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Binary media carried inline as base64 (images, audio).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 (standard alphabet) payload
    pub data: String,
}

impl InlineData {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Approximate decoded size in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len() / 4 * 3
    }

    /// `data:` URL form, as used by browsers.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Expected shape of a text completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// A text-generation request, optionally multimodal.
#[derive(Debug, Clone, Default)]
pub struct TextRequest {
    pub prompt: String,
    /// Inline media sent alongside the prompt (e.g. an image under critique)
    pub attachments: Vec<InlineData>,
    pub response_format: ResponseFormat,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::Json;
        self
    }

    pub fn with_attachment(mut self, data: InlineData) -> Self {
        self.attachments.push(data);
        self
    }
}

/// Parameters for an image-to-video submission.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub source_image: InlineData,
    /// e.g. "9:16"
    pub aspect_ratio: String,
}

/// Opaque handle to a provider-side long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle(pub String);

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a single poll of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Done { uri: String },
    Failed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_data_from_bytes() {
        let data = InlineData::from_bytes("image/png", b"abc");
        assert_eq!(data.data, "YWJj");
        assert_eq!(data.byte_len(), 3);
        assert_eq!(data.to_data_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_text_request_builder() {
        let request = TextRequest::new("describe")
            .json()
            .with_attachment(InlineData::new("image/png", "AAAA"));
        assert_eq!(request.response_format, ResponseFormat::Json);
        assert_eq!(request.attachments.len(), 1);
    }

    #[test]
    fn test_inline_data_serializes_camel_case() {
        let json = serde_json::to_value(InlineData::new("audio/mpeg", "AA==")).unwrap();
        assert_eq!(json["mimeType"], "audio/mpeg");
    }
}
