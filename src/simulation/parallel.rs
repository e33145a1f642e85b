//! Parallel simulation execution
//!
//! Uses Rayon to run multiple matches concurrently.
//! Each match runs in its own Bevy app with minimal threading
//! to avoid hitting OS thread limits.

use bevy::log::warn;
use rayon::prelude::*;

use crate::ai::AiProfileDatabase;
use crate::levels::LevelDatabase;

use super::config::SimConfig;
use super::metrics::MatchResult;
use super::runner::run_match;

/// Configuration for a single match in a batch
#[derive(Clone, Debug, PartialEq)]
pub struct MatchConfig {
    /// Level to play on, by name
    pub level: String,
    /// Left agent profile name
    pub left_profile: String,
    /// Right agent profile name
    pub right_profile: String,
    /// RNG seed for this match
    pub seed: u64,
}

/// Build the list of matches a config asks for.
///
/// Every selected level hosts every ordered pairing of distinct selected
/// profiles (a lone profile plays itself), `runs` times each. Seeds count up
/// from the base seed. Unknown names are skipped with a warning.
pub fn plan_matches(
    config: &SimConfig,
    base_seed: u64,
    level_db: &LevelDatabase,
    profile_db: &AiProfileDatabase,
) -> Result<Vec<MatchConfig>, String> {
    let levels: Vec<String> = if config.levels.is_empty() {
        level_db.names().into_iter().map(String::from).collect()
    } else {
        config
            .levels
            .iter()
            .filter(|name| {
                let known = level_db.get_by_name(name).is_some();
                if !known {
                    warn!("Unknown level {}, skipping", name);
                }
                known
            })
            .cloned()
            .collect()
    };

    let profiles: Vec<String> = if config.profiles.is_empty() {
        profile_db
            .profiles()
            .iter()
            .map(|p| p.name.clone())
            .collect()
    } else {
        config
            .profiles
            .iter()
            .filter(|name| {
                let known = profile_db.get_by_name(name).is_some();
                if !known {
                    warn!("Unknown profile {}, skipping", name);
                }
                known
            })
            .cloned()
            .collect()
    };

    if levels.is_empty() {
        return Err("No levels to play".to_string());
    }
    if profiles.is_empty() {
        return Err("No profiles to play".to_string());
    }

    let pairings: Vec<(&String, &String)> = if profiles.len() == 1 {
        vec![(&profiles[0], &profiles[0])]
    } else {
        profiles
            .iter()
            .flat_map(|left| profiles.iter().map(move |right| (left, right)))
            .filter(|(left, right)| left != right)
            .collect()
    };

    let mut configs = Vec::new();
    let mut match_num = 0u64;
    for level in &levels {
        for (left, right) in &pairings {
            for _ in 0..config.runs {
                configs.push(MatchConfig {
                    level: level.clone(),
                    left_profile: (*left).clone(),
                    right_profile: (*right).clone(),
                    seed: base_seed.wrapping_add(match_num),
                });
                match_num += 1;
            }
        }
    }

    Ok(configs)
}

/// Run matches on a dedicated pool of `threads` workers.
///
/// Returns outcomes in the same order as configs.
pub fn run_matches_parallel(
    config: &SimConfig,
    configs: &[MatchConfig],
    threads: usize,
    level_db: &LevelDatabase,
    profile_db: &AiProfileDatabase,
) -> Result<Vec<Result<MatchResult, String>>, String> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| format!("Failed to initialize Rayon thread pool: {}", e))?;

    Ok(pool.install(|| {
        configs
            .par_iter()
            .map(|setup| run_match(config, setup, level_db, profile_db))
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiProfile;

    fn profiles(names: &[&str]) -> AiProfileDatabase {
        AiProfileDatabase::from_profiles(
            names
                .iter()
                .map(|name| AiProfile {
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[test]
    fn test_plan_covers_levels_pairings_and_runs() {
        let config = SimConfig {
            runs: 2,
            ..Default::default()
        };
        let levels = LevelDatabase::default_levels();
        let plan = plan_matches(&config, 100, &levels, &profiles(&["A", "B", "C"])).unwrap();

        // levels x 6 ordered pairings x 2 runs
        assert_eq!(plan.len(), levels.len() * 6 * 2);
        assert!(plan.iter().all(|m| m.left_profile != m.right_profile));
        assert_eq!(plan[0].seed, 100);
        assert_eq!(plan[plan.len() - 1].seed, 100 + plan.len() as u64 - 1);
    }

    #[test]
    fn test_lone_profile_mirrors_and_unknown_names_skip() {
        let config = SimConfig {
            levels: vec!["Flat".to_string(), "Moon".to_string()],
            profiles: vec!["solo".to_string(), "Nobody".to_string()],
            ..Default::default()
        };
        let plan = plan_matches(
            &config,
            0,
            &LevelDatabase::default_levels(),
            &profiles(&["Solo", "Other"]),
        )
        .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].level, "Flat");
        assert_eq!(plan[0].left_profile, plan[0].right_profile);
    }

    #[test]
    fn test_nothing_to_play_is_an_error() {
        let config = SimConfig {
            levels: vec!["Moon".to_string()],
            ..Default::default()
        };
        let levels = LevelDatabase::default_levels();
        assert!(plan_matches(&config, 0, &levels, &profiles(&["A"])).is_err());
    }

    #[test]
    fn test_parallel_matches_keep_order() {
        let config = SimConfig {
            duration: 1.0,
            parallel: 2,
            ..Default::default()
        };
        let levels = LevelDatabase::default_levels();
        let profile_db = profiles(&["A", "B"]);
        let plan = plan_matches(&config, 5, &levels, &profile_db).unwrap();
        let outcomes = run_matches_parallel(&config, &plan, 2, &levels, &profile_db).unwrap();

        assert_eq!(outcomes.len(), plan.len());
        for (setup, outcome) in plan.iter().zip(&outcomes) {
            let result = outcome.as_ref().unwrap();
            assert_eq!(result.seed, setup.seed);
            assert_eq!(result.level, setup.level);
        }
    }
}
