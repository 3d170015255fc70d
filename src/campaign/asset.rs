// Per-scene asset record and its status state machine
//
//   ready -> generating -> complete | failed
//   complete -> generating      (regeneration, after archiving the current version)
//   complete -> accepted        (terminal)
//   failed -> generating        (manual retry)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::critic::Critique;
use crate::errors::TransitionError;
use crate::providers::InlineData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
    Voiceover,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
            AssetKind::Voiceover => "voiceover",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Ready,
    Generating,
    Complete,
    Failed,
    Accepted,
}

impl AssetStatus {
    /// Complete, accepted, or failed: the stage has finished with this asset.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AssetStatus::Complete | AssetStatus::Accepted | AssetStatus::Failed
        )
    }

    /// Has a usable generated version.
    pub fn is_usable(self) -> bool {
        matches!(self, AssetStatus::Complete | AssetStatus::Accepted)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssetStatus::Ready => "ready",
            AssetStatus::Generating => "generating",
            AssetStatus::Complete => "complete",
            AssetStatus::Failed => "failed",
            AssetStatus::Accepted => "accepted",
        })
    }
}

/// Handle to generated content: inline bytes or a provider-hosted URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentRef {
    Inline(InlineData),
    Remote { uri: String, mime_type: String },
}

impl ContentRef {
    pub fn as_inline(&self) -> Option<&InlineData> {
        match self {
            ContentRef::Inline(data) => Some(data),
            ContentRef::Remote { .. } => None,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            ContentRef::Inline(data) => &data.mime_type,
            ContentRef::Remote { mime_type, .. } => mime_type,
        }
    }

    /// Short reference suitable for reports (never the raw payload).
    pub fn describe(&self) -> String {
        match self {
            ContentRef::Inline(data) => {
                format!("inline:{} ({} bytes)", data.mime_type, data.byte_len())
            }
            ContentRef::Remote { uri, .. } => uri.clone(),
        }
    }
}

/// A superseded (or accepted) version of an asset with the critique it received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub content: ContentRef,
    /// Absent when an unjudged version was accepted by the operator
    pub critique: Option<Critique>,
    pub iteration: u32,
}

/// One generated artifact for one scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    kind: AssetKind,
    status: AssetStatus,
    iterations: u32,
    content: Option<ContentRef>,
    critique: Option<Critique>,
    history: Vec<HistoryEntry>,
    last_error: Option<String>,
}

impl Asset {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            status: AssetStatus::Ready,
            iterations: 0,
            content: None,
            critique: None,
            history: Vec::new(),
            last_error: None,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn status(&self) -> AssetStatus {
        self.status
    }

    /// Regeneration attempts beyond the first generation.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn content(&self) -> Option<&ContentRef> {
        self.content.as_ref()
    }

    /// Critique of the active version, if one was produced.
    pub fn critique(&self) -> Option<&Critique> {
        self.critique.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn transition_error(&self, to: AssetStatus) -> TransitionError {
        TransitionError {
            kind: self.kind,
            from: self.status,
            to,
        }
    }

    /// Enter the generate phase. Any active content must already be archived or discarded.
    pub(crate) fn begin_generation(&mut self) -> Result<(), TransitionError> {
        match self.status {
            AssetStatus::Accepted | AssetStatus::Generating => {
                Err(self.transition_error(AssetStatus::Generating))
            }
            _ => {
                self.status = AssetStatus::Generating;
                self.last_error = None;
                Ok(())
            }
        }
    }

    pub(crate) fn complete(&mut self, content: ContentRef) -> Result<(), TransitionError> {
        if self.status != AssetStatus::Generating {
            return Err(self.transition_error(AssetStatus::Complete));
        }
        self.status = AssetStatus::Complete;
        self.content = Some(content);
        self.critique = None;
        Ok(())
    }

    pub(crate) fn fail(&mut self, error: impl fmt::Display) -> Result<(), TransitionError> {
        if self.status != AssetStatus::Generating {
            return Err(self.transition_error(AssetStatus::Failed));
        }
        self.status = AssetStatus::Failed;
        self.last_error = Some(error.to_string());
        Ok(())
    }

    pub(crate) fn attach_critique(&mut self, critique: Critique) {
        self.critique = Some(critique);
    }

    /// Move the active version and its critique into history ahead of a regeneration.
    ///
    /// Returns the archived critique, which drives the feedback-augmented prompt.
    pub(crate) fn archive_for_regeneration(&mut self) -> Option<Critique> {
        let critique = self.critique.take()?;
        if let Some(content) = self.content.take() {
            self.history.push(HistoryEntry {
                content,
                critique: Some(critique.clone()),
                iteration: self.iterations,
            });
        }
        self.iterations += 1;
        Some(critique)
    }

    /// Lock the active version and record it in history, critiqued or not.
    /// Idempotent once accepted.
    pub(crate) fn accept(&mut self) -> Result<(), TransitionError> {
        match self.status {
            AssetStatus::Accepted => Ok(()),
            AssetStatus::Complete => {
                if let Some(content) = &self.content {
                    self.history.push(HistoryEntry {
                        content: content.clone(),
                        critique: self.critique.clone(),
                        iteration: self.iterations,
                    });
                }
                self.status = AssetStatus::Accepted;
                Ok(())
            }
            _ => Err(self.transition_error(AssetStatus::Accepted)),
        }
    }

    /// Drop the active version and return to `ready` (operator rejection).
    pub(crate) fn reset(&mut self) -> Result<(), TransitionError> {
        match self.status {
            AssetStatus::Accepted | AssetStatus::Generating => {
                Err(self.transition_error(AssetStatus::Ready))
            }
            _ => {
                self.status = AssetStatus::Ready;
                self.content = None;
                self.critique = None;
                Ok(())
            }
        }
    }
}
