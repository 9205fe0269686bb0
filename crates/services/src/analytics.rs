use bson::oid::ObjectId;
use okrhub_db::models::{Kpi, OperationalKeyResult, ProgressStatus, StrategicObjective};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub not_started: u64,
    pub off_track: u64,
    pub at_risk: u64,
    pub on_track: u64,
    pub completed: u64,
}

impl StatusBreakdown {
    pub fn from_statuses(statuses: impl IntoIterator<Item = ProgressStatus>) -> Self {
        let mut breakdown = Self::default();
        for status in statuses {
            breakdown.add(status);
        }
        breakdown
    }

    fn add(&mut self, status: ProgressStatus) {
        let slot = match status {
            ProgressStatus::NotStarted => &mut self.not_started,
            ProgressStatus::OffTrack => &mut self.off_track,
            ProgressStatus::AtRisk => &mut self.at_risk,
            ProgressStatus::OnTrack => &mut self.on_track,
            ProgressStatus::Completed => &mut self.completed,
        };
        *slot += 1;
    }

    fn merge(&mut self, other: &StatusBreakdown) {
        self.not_started += other.not_started;
        self.off_track += other.off_track;
        self.at_risk += other.at_risk;
        self.on_track += other.on_track;
        self.completed += other.completed;
    }

    pub fn total(&self) -> u64 {
        self.not_started + self.off_track + self.at_risk + self.on_track + self.completed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamAnalytics {
    pub team_id: String,
    pub team_name: String,
    pub objectives: StatusBreakdown,
    pub key_results: StatusBreakdown,
    pub kpis: StatusBreakdown,
    pub average_objective_progress: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationAnalytics {
    pub organization_id: String,
    pub teams: Vec<TeamAnalytics>,
    pub objectives: StatusBreakdown,
    pub key_results: StatusBreakdown,
    pub kpis: StatusBreakdown,
    pub average_objective_progress: f64,
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u64), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64 * 100.0).round() / 100.0
}

pub fn summarize_team(
    team_id: ObjectId,
    team_name: &str,
    objectives: &[StrategicObjective],
    key_results: &[OperationalKeyResult],
    kpis: &[Kpi],
) -> TeamAnalytics {
    TeamAnalytics {
        team_id: team_id.to_hex(),
        team_name: team_name.to_string(),
        objectives: StatusBreakdown::from_statuses(objectives.iter().map(|o| o.status)),
        key_results: StatusBreakdown::from_statuses(key_results.iter().map(|k| k.status)),
        kpis: StatusBreakdown::from_statuses(kpis.iter().map(|k| k.status)),
        average_objective_progress: average(objectives.iter().map(|o| o.progress)),
    }
}

/// Organization totals; the average is weighted by objective count, not per team.
pub fn summarize_organization(
    organization_id: ObjectId,
    teams: Vec<TeamAnalytics>,
    objectives: &[StrategicObjective],
) -> OrganizationAnalytics {
    let mut totals = (
        StatusBreakdown::default(),
        StatusBreakdown::default(),
        StatusBreakdown::default(),
    );
    for team in &teams {
        totals.0.merge(&team.objectives);
        totals.1.merge(&team.key_results);
        totals.2.merge(&team.kpis);
    }
    OrganizationAnalytics {
        organization_id: organization_id.to_hex(),
        teams,
        objectives: totals.0,
        key_results: totals.1,
        kpis: totals.2,
        average_objective_progress: average(objectives.iter().map(|o| o.progress)),
    }
}
