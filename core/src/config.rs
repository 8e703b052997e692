use crate::types::{AssignmentType, Percent};
use serde::{Deserialize, Serialize};

/// Assignment policy. The per-type percentages and the backup rule are
/// business policy inferred from field data, so they live in config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadPolicy {
    pub primary_percent:   Percent,
    pub secondary_percent: Percent,
    pub backup_percent:    Percent,
    /// Capacity for workers whose profile does not state one.
    pub default_max_capacity: Percent,
    /// Backups may be added to a fully assigned role (contingency staffing).
    pub backup_may_exceed_headcount: bool,
    /// New assignments start `pending` and need a confirm step.
    #[serde(default)]
    pub require_confirmation: bool,
}

impl WorkloadPolicy {
    pub fn percent_for(&self, assignment_type: AssignmentType) -> Percent {
        match assignment_type {
            AssignmentType::Primary   => self.primary_percent,
            AssignmentType::Secondary => self.secondary_percent,
            AssignmentType::Backup    => self.backup_percent,
        }
    }
}

impl Default for WorkloadPolicy {
    fn default() -> Self {
        Self {
            primary_percent:             50,
            secondary_percent:           30,
            backup_percent:              30,
            default_max_capacity:        100,
            backup_may_exceed_headcount: true,
            require_confirmation:        false,
        }
    }
}

/// Weights for the recommendation heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Skill score used when a role lists no required skills.
    pub neutral_skill_score: f64,
    pub available_weight: f64,
    pub busy_weight: f64,
    /// Utilisation (percent of capacity) above which a worker is down-weighted.
    pub high_workload_threshold: f64,
    pub high_workload_weight: f64,
    /// How much a 0 performance score can cost, 0.0..=1.0.
    pub performance_weight: f64,
    /// Suggestions scoring below this are dropped.
    pub min_confidence: f64,
    pub max_per_role: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            neutral_skill_score:     0.5,
            available_weight:        1.0,
            busy_weight:             0.6,
            high_workload_threshold: 80.0,
            high_workload_weight:    0.5,
            performance_weight:      0.2,
            min_confidence:          0.25,
            max_per_role:            3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    pub workload:       WorkloadPolicy,
    pub recommendation: RecommendationConfig,
}

impl MappingConfig {
    /// Load from the data/ directory.
    /// In tests, use MappingConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let policy_path = format!("{data_dir}/mapping/workload_policy.json");
        let policy_content = std::fs::read_to_string(&policy_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {policy_path}: {e}"))?;
        let workload: WorkloadPolicy = serde_json::from_str(&policy_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {policy_path}: {e}"))?;

        let rec_path = format!("{data_dir}/mapping/recommendation.json");
        let rec_content = std::fs::read_to_string(&rec_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {rec_path}: {e}"))?;
        let recommendation: RecommendationConfig = serde_json::from_str(&rec_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {rec_path}: {e}"))?;

        let config = Self { workload, recommendation };
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let w = &self.workload;
        for (name, value) in [
            ("primary_percent", w.primary_percent),
            ("secondary_percent", w.secondary_percent),
            ("backup_percent", w.backup_percent),
            ("default_max_capacity", w.default_max_capacity),
        ] {
            if value > 100 {
                anyhow::bail!("workload policy {name} must be within 0..=100, got {value}");
            }
        }

        let r = &self.recommendation;
        for (name, value) in [
            ("neutral_skill_score", r.neutral_skill_score),
            ("available_weight", r.available_weight),
            ("busy_weight", r.busy_weight),
            ("high_workload_weight", r.high_workload_weight),
            ("performance_weight", r.performance_weight),
            ("min_confidence", r.min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("recommendation {name} must be within 0.0..=1.0, got {value}");
            }
        }
        if !(0.0..=100.0).contains(&r.high_workload_threshold) {
            anyhow::bail!(
                "recommendation high_workload_threshold must be a percentage, got {}",
                r.high_workload_threshold
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_field_policy() {
        let config = MappingConfig::default_test();
        assert_eq!(config.workload.percent_for(AssignmentType::Primary), 50);
        assert_eq!(config.workload.percent_for(AssignmentType::Secondary), 30);
        assert_eq!(config.workload.percent_for(AssignmentType::Backup), 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_percent_rejected() {
        let mut config = MappingConfig::default_test();
        config.workload.primary_percent = 150;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = MappingConfig::load("/nonexistent-mapping-data").unwrap_err();
        assert!(err.to_string().contains("workload_policy.json"));
    }
}
