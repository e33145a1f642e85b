//! Metrics collection for AI simulation

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::SimConfig;

/// Statistics for a single agent during a match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentStats {
    /// Profile the agent played with
    pub profile: String,
    /// Total distance traveled (world units)
    pub distance: f32,
    /// Total jumps
    pub jumps: u32,
    /// Routes computed over the ledge graph
    pub replans: u32,
    /// Ledge nodes arrived at
    pub nodes_reached: u32,
    /// Times the agent fell out of the level
    pub falls: u32,
    /// Seconds spent holding inside the stand-off band
    pub time_in_band: f32,
    /// Share of the match spent inside the band (finalized after match)
    pub band_ratio: f32,
}

impl AgentStats {
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            ..default()
        }
    }

    /// Calculate derived statistics
    pub fn finalize(&mut self, duration: f32) {
        if duration > 0.0 {
            self.band_ratio = (self.time_in_band / duration).min(1.0);
        }
    }
}

/// Result of a single match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// Level name
    pub level: String,
    /// Simulated match duration (seconds)
    pub duration: f32,
    /// Frames simulated
    pub frames: u32,
    /// RNG seed used
    pub seed: u64,
    pub left: AgentStats,
    pub right: AgentStats,
}

/// Per-profile averages over a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub matches: u32,
    pub avg_band_ratio: f32,
    pub avg_distance: f32,
    pub avg_replans: f32,
    pub avg_falls: f32,
}

/// Everything one simulation run writes out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    /// UTC time the report was produced (RFC 3339)
    pub timestamp: String,
    pub config: SimConfig,
    pub matches: Vec<MatchResult>,
    pub profiles: BTreeMap<String, ProfileSummary>,
}

impl SimReport {
    pub fn new(config: &SimConfig, matches: Vec<MatchResult>) -> Self {
        let mut report = Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            config: config.clone(),
            matches,
            profiles: BTreeMap::new(),
        };
        report.summarize();
        report
    }

    /// Average every agent's stats per profile
    fn summarize(&mut self) {
        let mut totals: BTreeMap<String, ProfileSummary> = BTreeMap::new();
        for stats in self.matches.iter().flat_map(|m| [&m.left, &m.right]) {
            let entry = totals.entry(stats.profile.clone()).or_default();
            entry.matches += 1;
            entry.avg_band_ratio += stats.band_ratio;
            entry.avg_distance += stats.distance;
            entry.avg_replans += stats.replans as f32;
            entry.avg_falls += stats.falls as f32;
        }
        for summary in totals.values_mut() {
            let n = summary.matches as f32;
            summary.avg_band_ratio /= n;
            summary.avg_distance /= n;
            summary.avg_replans /= n;
            summary.avg_falls /= n;
        }
        self.profiles = totals;
    }

    /// Human-readable summary table
    pub fn format_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "\nProfile summary ({} matches):\n\n",
            self.matches.len()
        ));
        output.push_str(&format!(
            "{:>12} | {:>7} | {:>7} | {:>9} | {:>7} | {:>6}\n",
            "Profile", "Agents", "In band", "Distance", "Replans", "Falls"
        ));
        output.push_str(&format!(
            "{:-<12}-+-{:-<7}-+-{:-<7}-+-{:-<9}-+-{:-<7}-+-{:-<6}\n",
            "", "", "", "", "", ""
        ));
        for (name, summary) in &self.profiles {
            output.push_str(&format!(
                "{:>12} | {:>7} | {:>6.1}% | {:>9.1} | {:>7.1} | {:>6.2}\n",
                &name[..name.len().min(12)],
                summary.matches,
                summary.avg_band_ratio * 100.0,
                summary.avg_distance,
                summary.avg_replans,
                summary.avg_falls
            ));
        }
        output
    }
}

/// Live stats of the match being simulated
#[derive(Resource, Debug, Default)]
pub struct SimMetrics {
    pub left: AgentStats,
    pub right: AgentStats,
    /// Simulated time so far
    pub elapsed: f32,
    pub frames: u32,
    pub match_ended: bool,
}

impl SimMetrics {
    pub fn new(left_profile: &str, right_profile: &str) -> Self {
        Self {
            left: AgentStats::new(left_profile),
            right: AgentStats::new(right_profile),
            ..default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(profile: &str, band_ratio: f32, falls: u32) -> AgentStats {
        AgentStats {
            band_ratio,
            falls,
            ..AgentStats::new(profile)
        }
    }

    #[test]
    fn test_finalize_band_ratio() {
        let mut stats = AgentStats::new("Rusher");
        stats.time_in_band = 5.0;
        stats.finalize(20.0);
        assert_eq!(stats.band_ratio, 0.25);

        let mut empty = AgentStats::new("Rusher");
        empty.finalize(0.0);
        assert_eq!(empty.band_ratio, 0.0);
    }

    #[test]
    fn test_report_averages_per_profile() {
        let matches = vec![
            MatchResult {
                level: "Flat".to_string(),
                duration: 10.0,
                frames: 600,
                seed: 1,
                left: stats("Rusher", 0.5, 0),
                right: stats("Keeper", 0.2, 1),
            },
            MatchResult {
                level: "Flat".to_string(),
                duration: 10.0,
                frames: 600,
                seed: 2,
                left: stats("Keeper", 0.4, 3),
                right: stats("Rusher", 0.1, 0),
            },
        ];
        let report = SimReport::new(&SimConfig::default(), matches);

        let keeper = &report.profiles["Keeper"];
        assert_eq!(keeper.matches, 2);
        assert!((keeper.avg_band_ratio - 0.3).abs() < 1e-5);
        assert_eq!(keeper.avg_falls, 2.0);
        assert!(report.format_table().contains("Rusher"));
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }
}
