// Long-running video generation
//
//   submitted -> polling -> done | failed | timed out | cancelled
//
// Sleeps go through tokio::time so tests can run the loop on a paused clock.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::{GenerationError, ProviderError};
use crate::providers::{OperationHandle, OperationStatus, VideoProvider, VideoRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Wall-clock budget from submission to a terminal state
    pub max_wait: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoPhase {
    Submitted,
    Polling { polls: u32 },
    Done { uri: String },
    Failed { message: String },
    TimedOut,
    Cancelled,
}

impl VideoPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VideoPhase::Submitted | VideoPhase::Polling { .. })
    }
}

/// A submitted video operation being driven to completion.
pub struct VideoJob<'a> {
    provider: &'a dyn VideoProvider,
    handle: OperationHandle,
    settings: PollSettings,
    phase: VideoPhase,
    started: Instant,
}

impl<'a> VideoJob<'a> {
    pub async fn submit(
        provider: &'a dyn VideoProvider,
        request: &VideoRequest,
        settings: PollSettings,
    ) -> Result<VideoJob<'a>, GenerationError> {
        let handle = provider.submit(request).await?;
        tracing::info!(operation = %handle, "Video operation submitted");
        Ok(Self {
            provider,
            handle,
            settings,
            phase: VideoPhase::Submitted,
            started: Instant::now(),
        })
    }

    pub fn handle(&self) -> &OperationHandle {
        &self.handle
    }

    pub fn phase(&self) -> &VideoPhase {
        &self.phase
    }

    /// Poll until a terminal phase; returns the video URI on success.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> Result<String, GenerationError> {
        let mut polls = 0u32;
        loop {
            let elapsed = self.started.elapsed();
            if elapsed + self.settings.interval > self.settings.max_wait {
                self.phase = VideoPhase::TimedOut;
                tracing::warn!(operation = %self.handle, ?elapsed, "Video operation timed out");
                return Err(GenerationError::TimedOut { waited: elapsed });
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.phase = VideoPhase::Cancelled;
                    return Err(GenerationError::Cancelled);
                }
                _ = sleep(self.settings.interval) => {}
            }

            polls += 1;
            self.phase = VideoPhase::Polling { polls };
            tracing::debug!(operation = %self.handle, polls, "Polling video operation");

            match self.provider.poll(&self.handle).await {
                Ok(OperationStatus::Pending) => continue,
                Ok(OperationStatus::Done { uri }) => {
                    self.phase = VideoPhase::Done { uri: uri.clone() };
                    return Ok(uri);
                }
                Ok(OperationStatus::Failed { message }) => {
                    self.phase = VideoPhase::Failed {
                        message: message.clone(),
                    };
                    return Err(ProviderError::Operation(message).into());
                }
                Err(e) => {
                    self.phase = VideoPhase::Failed {
                        message: e.to_string(),
                    };
                    return Err(e.into());
                }
            }
        }
    }
}
