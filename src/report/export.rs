// Report export: pretty JSON written to a caller-chosen path

use anyhow::{Context, Result};
use std::path::Path;

use super::CampaignReport;

pub fn to_json(report: &CampaignReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize campaign report")
}

pub fn write_report(report: &CampaignReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let json = to_json(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    tracing::info!(path = %path.display(), "Campaign report exported");
    Ok(())
}
