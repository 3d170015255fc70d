// Campaign readiness aggregate
//
// A pure projection over the currently active critiques. Missing critiques are
// excluded, never counted as zero.

use serde::Serialize;
use std::fmt;

use crate::campaign::Campaign;
use crate::critic::{meets_threshold, Critique, DEPLOYMENT_THRESHOLD};

pub const EXCELLENT_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityStatus {
    Excellent,
    Good,
    NeedsImprovement,
}

impl QualityStatus {
    pub fn from_score(score: f64) -> Self {
        if meets_threshold(score, EXCELLENT_THRESHOLD) {
            QualityStatus::Excellent
        } else if meets_threshold(score, DEPLOYMENT_THRESHOLD) {
            QualityStatus::Good
        } else {
            QualityStatus::NeedsImprovement
        }
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QualityStatus::Excellent => "excellent",
            QualityStatus::Good => "good",
            QualityStatus::NeedsImprovement => "needs-improvement",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    /// No critique has been produced yet
    NoData,
    Scored {
        mean_score: f64,
        all_deployment_ready: bool,
        status: QualityStatus,
        critique_count: usize,
    },
}

impl Readiness {
    pub fn from_critiques<'a>(critiques: impl IntoIterator<Item = &'a Critique>) -> Self {
        let mut sum = 0.0;
        let mut count = 0usize;
        let mut all_ready = true;
        for critique in critiques {
            sum += critique.overall_score;
            count += 1;
            all_ready &= critique.deployment_ready;
        }

        if count == 0 {
            return Readiness::NoData;
        }
        let mean_score = sum / count as f64;
        Readiness::Scored {
            mean_score,
            all_deployment_ready: all_ready,
            status: QualityStatus::from_score(mean_score),
            critique_count: count,
        }
    }

    /// Readiness over every active image, video, and copy critique.
    pub fn of(campaign: &Campaign) -> Self {
        Self::from_critiques(current_critiques(campaign))
    }

    pub fn mean_score(&self) -> Option<f64> {
        match self {
            Readiness::NoData => None,
            Readiness::Scored { mean_score, .. } => Some(*mean_score),
        }
    }

    pub fn status(&self) -> Option<QualityStatus> {
        match self {
            Readiness::NoData => None,
            Readiness::Scored { status, .. } => Some(*status),
        }
    }
}

/// Active (non-superseded) critiques: scene images, scene videos, then copy.
pub fn current_critiques(campaign: &Campaign) -> Vec<&Critique> {
    let mut critiques: Vec<&Critique> = (0..campaign.scene_count())
        .filter_map(|i| campaign.scene_assets(i))
        .flat_map(|assets| [assets.image.critique(), assets.video.critique()])
        .flatten()
        .collect();
    if let Some(critique) = campaign.copy().and_then(|c| c.critique.as_ref()) {
        critiques.push(critique);
    }
    critiques
}
