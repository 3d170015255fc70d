// Critique logger: append-only JSONL record of every judgment

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::critic::{Critique, DimensionScores};

/// A single logged critique
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueLogEntry {
    pub campaign_id: Uuid,

    pub timestamp: DateTime<Utc>,

    /// "image", "video", or "copy"
    pub subject: String,

    /// 1-based scene id (None for campaign copy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<u32>,

    pub iteration: u32,

    pub overall_score: f64,

    pub scores: DimensionScores,

    pub deployment_ready: bool,

    pub issue_count: usize,
}

impl CritiqueLogEntry {
    pub fn new(
        campaign_id: Uuid,
        subject: &str,
        scene: Option<u32>,
        critique: &Critique,
    ) -> Self {
        Self {
            campaign_id,
            timestamp: critique.critiqued_at,
            subject: subject.to_string(),
            scene,
            iteration: critique.iteration.unwrap_or(0),
            overall_score: critique.overall_score,
            scores: critique.scores,
            deployment_ready: critique.deployment_ready,
            issue_count: critique.feedback.issues.len(),
        }
    }
}

/// Buffered JSONL writer, flushed every `flush_threshold` entries and on drop
pub struct CritiqueLogger {
    log_path: PathBuf,
    buffer: Vec<CritiqueLogEntry>,
    flush_threshold: usize,
}

impl CritiqueLogger {
    pub fn new(log_path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create critique log directory")?;
            }
        }

        Ok(Self {
            log_path,
            buffer: Vec::new(),
            flush_threshold: 10,
        })
    }

    pub fn log(&mut self, entry: CritiqueLogEntry) -> Result<()> {
        self.buffer.push(entry);
        if self.buffer.len() >= self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush buffered entries to disk
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        debug!("Flushing {} critique log entries to disk", self.buffer.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .context("Failed to open critique log file")?;

        for entry in &self.buffer {
            let json = serde_json::to_string(entry).context("Failed to serialize critique entry")?;
            writeln!(file, "{}", json).context("Failed to write critique entry")?;
        }

        self.buffer.clear();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Drop for CritiqueLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush critique log on drop: {}", e);
        }
    }
}
