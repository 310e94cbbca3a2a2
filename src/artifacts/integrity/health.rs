//! Health score and criticality
//!
//! Health starts at 100 and decays with corruption history: recent events
//! weigh more than old ones. Blueprints also lose points for the size of
//! their dependency surface. The score never drops below zero.

use crate::artifacts::analyzer::AssetInfo;
use crate::artifacts::integrity::event::CorruptionEvent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Importance tier of an asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Criticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Low => "low",
            Criticality::Medium => "medium",
            Criticality::High => "high",
            Criticality::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityPolicy {
    pub max_health: f64,
    pub day_event_penalty: f64,
    pub week_event_penalty: f64,
    pub old_event_penalty: f64,
    pub blueprint_dependency_penalty: f64,
    pub max_blueprint_penalty: f64,
    /// Dependency count above which an asset is `High`.
    pub high_dependency_threshold: usize,
    /// Dependency count above which an asset is `Medium`.
    pub medium_dependency_threshold: usize,
}

impl Default for IntegrityPolicy {
    fn default() -> Self {
        IntegrityPolicy {
            max_health: 100.0,
            day_event_penalty: 20.0,
            week_event_penalty: 10.0,
            old_event_penalty: 5.0,
            blueprint_dependency_penalty: 0.5,
            max_blueprint_penalty: 15.0,
            high_dependency_threshold: 10,
            medium_dependency_threshold: 5,
        }
    }
}

impl IntegrityPolicy {
    pub fn health_score(
        &self,
        events: &[CorruptionEvent],
        is_blueprint: bool,
        dependency_count: usize,
        now: DateTime<Utc>,
    ) -> f64 {
        let history = events
            .iter()
            .map(|event| {
                let age = now - event.detected_at;
                if age < Duration::hours(24) {
                    self.day_event_penalty
                } else if age < Duration::days(7) {
                    self.week_event_penalty
                } else {
                    self.old_event_penalty
                }
            })
            .sum::<f64>();

        let complexity = if is_blueprint {
            (dependency_count as f64 * self.blueprint_dependency_penalty).min(self.max_blueprint_penalty)
        } else {
            0.0
        };

        (self.max_health - history - complexity).max(0.0)
    }

    pub fn criticality(&self, info: &AssetInfo) -> Criticality {
        let dependencies = info.dependencies.len();

        if info.is_blueprint && info.gameplay_critical {
            Criticality::Critical
        } else if info.is_blueprint || dependencies > self.high_dependency_threshold {
            Criticality::High
        } else if dependencies > self.medium_dependency_threshold {
            Criticality::Medium
        } else {
            Criticality::Low
        }
    }
}
