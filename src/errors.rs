// Error taxonomy for the generation pipeline
//
// Failures are local to one (scene, asset kind) unit. None of these abort a
// campaign run; the orchestrator records them and moves on.

use std::time::Duration;
use thiserror::Error;

use crate::campaign::{AssetKind, AssetStatus};

/// A call to an external content or judgment provider failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error talking to {provider}: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider answered but produced no usable media (safety block, empty candidate).
    #[error("{0}")]
    Blocked(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// A long-running operation reached a terminal error state.
    #[error("operation failed: {0}")]
    Operation(String),
}

/// An asset could not be produced.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("provider returned unusable output: {0}")]
    Malformed(String),

    #[error("video operation did not finish within {waited:?}")]
    TimedOut { waited: Duration },

    #[error("generation cancelled")]
    Cancelled,
}

/// The automated critic could not produce a well-formed judgment.
///
/// Never fatal: callers treat this as "no critique available".
#[derive(Debug, Error)]
pub enum CritiqueError {
    #[error("critic provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("malformed critique: {0}")]
    Malformed(String),
}

/// A required input is missing; rejected before any provider call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("scene {scene_id} has no generated image to animate")]
    MissingSourceImage { scene_id: u32 },

    #[error("no scene at index {index}")]
    UnknownScene { index: usize },

    #[error("scene count must be between 1 and {max}, got {requested}")]
    InvalidSceneCount { requested: usize, max: usize },
}

/// An asset state transition that the state machine does not allow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot move {kind} asset from {from} to {to}")]
pub struct TransitionError {
    pub kind: AssetKind,
    pub from: AssetStatus,
    pub to: AssetStatus,
}

/// A controller entry point was invoked on an unknown scene or in a state that forbids it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}
