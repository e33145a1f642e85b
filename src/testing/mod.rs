//! Scenario testing system for deterministic AI testing
//!
//! Runs scripted scenarios against a headless simulation to verify what
//! the rush policy decides, frame by frame.

use std::fs;
use std::path::{Path, PathBuf};

pub mod assertions;
pub mod parser;
pub mod runner;

pub use assertions::{AgentState, AssertionError, OpponentState, WorldState, check_state};
pub use parser::{
    AgentDef, FrameEvent, OpponentDef, OpponentKind, StateAssertion, TestDefinition,
    TestExpectations, TestSetup, parse_test_file,
};
pub use runner::{TestResult, run_test, run_test_with};

/// Default path for test scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";

/// All scenario files under `base` whose relative path contains `filter`, sorted
pub fn discover_tests(base: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut tests = Vec::new();
    discover_tests_recursive(base, base, filter, &mut tests);
    tests.sort();
    tests
}

fn discover_tests_recursive(
    base: &Path,
    current: &Path,
    filter: Option<&str>,
    tests: &mut Vec<PathBuf>,
) {
    let Ok(entries) = fs::read_dir(current) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            discover_tests_recursive(base, &path, filter, tests);
        } else if path.extension().is_some_and(|e| e == "toml") {
            if let Some(f) = filter {
                let rel = path.strip_prefix(base).unwrap_or(&path).to_string_lossy();
                if !rel.contains(f) {
                    continue;
                }
            }
            tests.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_files_pass() {
        let tests = discover_tests(Path::new(SCENARIOS_DIR), None);
        assert!(!tests.is_empty(), "no scenarios under {}", SCENARIOS_DIR);

        for path in tests {
            let test = parse_test_file(&path).unwrap();
            match run_test(&test) {
                TestResult::Pass { .. } => {}
                TestResult::Fail { error } => panic!("{}: {}", path.display(), error),
                TestResult::Error { message } => panic!("{}: {}", path.display(), message),
            }
        }
    }

    #[test]
    fn test_discover_filters_by_path() {
        let combat = discover_tests(Path::new(SCENARIOS_DIR), Some("combat/"));
        assert!(!combat.is_empty());
        assert!(combat.iter().all(|p| p.to_string_lossy().contains("combat")));
    }
}
