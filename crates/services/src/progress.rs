//! Progress math for the objective -> key result -> KPI hierarchy.
//!
//! Every stored `progress` is in `[0, 100]`, rounded to two decimals, and its
//! `status` is always `status_for(progress)`.

use okrhub_db::models::{Milestone, ProgressStatus};

const ON_TRACK_THRESHOLD: f64 = 70.0;
const AT_RISK_THRESHOLD: f64 = 40.0;

fn normalize(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

/// `current / target * 100`; a non-positive target yields 0.
pub fn kpi_progress(current: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    normalize(current / target * 100.0)
}

/// Progress of `current` along the `start -> target` range. Works for
/// decreasing targets (e.g. churn from 8 to 2).
pub fn key_result_progress(start: f64, current: f64, target: f64) -> f64 {
    let span = target - start;
    if span == 0.0 {
        return if current == target { 100.0 } else { 0.0 };
    }
    normalize((current - start) / span * 100.0)
}

/// Share of completed milestone weight, or `None` without usable milestones.
pub fn milestone_progress(milestones: &[Milestone]) -> Option<f64> {
    let total: f64 = milestones.iter().map(|m| m.weight.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let completed: f64 = milestones
        .iter()
        .filter(|m| m.completed)
        .map(|m| m.weight.max(0.0))
        .sum();
    Some(normalize(completed / total * 100.0))
}

/// Objective progress: milestone-weighted when milestones exist, otherwise the
/// mean of the key results' stored progress.
pub fn objective_progress(milestones: &[Milestone], key_results: &[f64]) -> f64 {
    if let Some(progress) = milestone_progress(milestones) {
        return progress;
    }
    if key_results.is_empty() {
        return 0.0;
    }
    normalize(key_results.iter().sum::<f64>() / key_results.len() as f64)
}

pub fn status_for(progress: f64) -> ProgressStatus {
    match progress {
        p if p >= 100.0 => ProgressStatus::Completed,
        p if p >= ON_TRACK_THRESHOLD => ProgressStatus::OnTrack,
        p if p >= AT_RISK_THRESHOLD => ProgressStatus::AtRisk,
        p if p > 0.0 => ProgressStatus::OffTrack,
        _ => ProgressStatus::NotStarted,
    }
}
