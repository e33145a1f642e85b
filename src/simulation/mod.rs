//! AI Simulation module - headless duels for AI testing
//!
//! Runs agents against each other without rendering, collecting metrics
//! on how well each profile closes in, holds range and follows ledge routes.

pub mod app_builder;
pub mod config;
pub mod metrics;
pub mod parallel;
pub mod runner;

pub use app_builder::HeadlessAppBuilder;
pub use config::SimConfig;
pub use metrics::{AgentStats, MatchResult, ProfileSummary, SimMetrics, SimReport};
pub use parallel::{MatchConfig, plan_matches, run_matches_parallel};
pub use runner::{Side, run_match, run_simulation};
