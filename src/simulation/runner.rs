//! Headless simulation runner

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

use crate::ai::{Agent, AgentPolicy, AiProfileDatabase, RushPolicy};
use crate::constants::*;
use crate::levels::LevelDatabase;
use crate::player::{CombatTarget, Health, MotionStats, Position, body_bundle, respawn_fallen};

use super::app_builder::HeadlessAppBuilder;
use super::config::SimConfig;
use super::metrics::{MatchResult, SimMetrics, SimReport};
use super::parallel::{MatchConfig, plan_matches, run_matches_parallel};

/// Horizontal spread applied to spawn points, seeded per match
const SPAWN_JITTER: f32 = 0.5;

/// Which of the two duelists an agent is
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Resource to control simulation
#[derive(Resource)]
pub struct SimControl {
    /// Simulated seconds after which the match ends
    pub duration: f32,
}

/// Run a single match and return the result
pub fn run_match(
    config: &SimConfig,
    setup: &MatchConfig,
    level_db: &LevelDatabase,
    profile_db: &AiProfileDatabase,
) -> Result<MatchResult, String> {
    if !config.duration.is_finite() || config.duration < 0.0 {
        return Err(format!("Invalid match duration {}", config.duration));
    }
    let level = level_db
        .get_by_name(&setup.level)
        .ok_or_else(|| format!("Unknown level {}", setup.level))?;
    let left_profile = profile_db
        .get_by_name(&setup.left_profile)
        .ok_or_else(|| format!("Unknown profile {}", setup.left_profile))?;
    let right_profile = profile_db
        .get_by_name(&setup.right_profile)
        .ok_or_else(|| format!("Unknown profile {}", setup.right_profile))?;

    let mut builder = HeadlessAppBuilder::new()
        .with_level(level)
        .with_fps(config.fps)
        .with_ai();
    if config.parallel > 0 {
        builder = builder.with_minimal_threads();
    }
    let mut app = builder.build()?;

    app.insert_resource(SimControl {
        duration: config.duration,
    });
    app.insert_resource(SimMetrics::new(&left_profile.name, &right_profile.name));
    app.add_systems(
        Update,
        (metrics_update, sim_check_end_conditions)
            .chain()
            .after(respawn_fallen),
    );

    let mut rng = StdRng::seed_from_u64(setup.seed);
    let mut jitter = |spawn: Vec2| spawn + Vec2::X * rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);

    let world = app.world_mut();
    let left = world
        .spawn((
            body_bundle(jitter(level.spawn_point(0))),
            Side::Left,
            Health::default(),
            Agent,
            AgentPolicy::Rush(RushPolicy::from_profile(left_profile)),
        ))
        .id();
    let right = world
        .spawn((
            body_bundle(jitter(level.spawn_point(1))),
            Side::Right,
            Health::default(),
            Agent,
            AgentPolicy::Rush(RushPolicy::from_profile(right_profile)),
        ))
        .id();
    world.entity_mut(left).insert(CombatTarget(Some(right)));
    world.entity_mut(right).insert(CombatTarget(Some(left)));

    debug!(
        "Match on {}: {} vs {} (seed {})",
        level.name, left_profile.name, right_profile.name, setup.seed
    );

    // First update has a zero delta; every later one advances one frame
    loop {
        app.update();
        if app.world().resource::<SimMetrics>().match_ended {
            break;
        }
    }

    let mut metrics = std::mem::take(&mut *app.world_mut().resource_mut::<SimMetrics>());
    metrics.left.finalize(metrics.elapsed);
    metrics.right.finalize(metrics.elapsed);

    Ok(MatchResult {
        level: level.name.clone(),
        duration: metrics.elapsed,
        frames: metrics.frames,
        seed: setup.seed,
        left: metrics.left,
        right: metrics.right,
    })
}

/// Copy each agent's running totals into the match stats and time its stand-off band
fn metrics_update(
    time: Res<Time>,
    mut metrics: ResMut<SimMetrics>,
    agents: Query<(&Side, &Position, &CombatTarget, &AgentPolicy, &MotionStats)>,
    positions: Query<&Position>,
) {
    let dt = time.delta_secs();
    let metrics = &mut *metrics;
    metrics.elapsed += dt;
    metrics.frames += 1;

    for (side, position, target, policy, motion) in &agents {
        let stats = match side {
            Side::Left => &mut metrics.left,
            Side::Right => &mut metrics.right,
        };
        stats.distance = motion.distance;
        stats.jumps = motion.jumps;
        stats.falls = motion.falls;

        let Some(rush) = policy.as_rush() else {
            continue;
        };
        stats.replans = rush.replans();
        stats.nodes_reached = rush.nodes_reached();

        let gap = target
            .0
            .and_then(|e| positions.get(e).ok())
            .map(|t| (t.0.x - position.0.x).abs());
        let stand_off = rush.stand_off();
        if gap.is_some_and(|g| g <= stand_off && g >= RETREAT_DISTANCE.min(stand_off)) {
            stats.time_in_band += dt;
        }
    }
}

/// End the match once its simulated duration has elapsed
fn sim_check_end_conditions(control: Res<SimControl>, mut metrics: ResMut<SimMetrics>) {
    if metrics.elapsed >= control.duration {
        metrics.match_ended = true;
    }
}

/// Main simulation entry point
pub fn run_simulation(config: SimConfig) -> Result<(), String> {
    let level_db = LevelDatabase::load_from_file(LEVELS_FILE);
    let profile_db = AiProfileDatabase::default();

    let base_seed = config.seed.unwrap_or_else(|| rand::thread_rng().r#gen());
    let plan = plan_matches(&config, base_seed, &level_db, &profile_db)?;
    if !config.quiet {
        println!(
            "Running {} matches ({} s each, base seed {})",
            plan.len(),
            config.duration,
            base_seed
        );
    }

    let outcomes = if config.parallel > 0 {
        run_matches_parallel(&config, &plan, config.parallel, &level_db, &profile_db)?
    } else {
        plan.iter()
            .enumerate()
            .map(|(i, setup)| {
                if !config.quiet {
                    print!(
                        "\rMatch {}/{}: {} vs {} on {}...",
                        i + 1,
                        plan.len(),
                        setup.left_profile,
                        setup.right_profile,
                        setup.level
                    );
                    std::io::stdout().flush().ok();
                }
                run_match(&config, setup, &level_db, &profile_db)
            })
            .collect()
    };

    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => warn!("Match skipped: {}", e),
        }
    }
    if !config.quiet {
        println!("\rCompleted {} matches.", results.len());
    }

    let report = SimReport::new(&config, results);
    output_report(&report, &config)
}

fn output_report(report: &SimReport, config: &SimConfig) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;

    if let Some(output_file) = &config.output_file {
        std::fs::write(output_file, &json)
            .map_err(|e| format!("Failed to write {}: {}", output_file, e))?;
        if !config.quiet {
            println!("{}", report.format_table());
            println!("Results written to {}", output_file);
        }
    } else {
        println!("{}", json);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiProfile;

    fn databases() -> (LevelDatabase, AiProfileDatabase) {
        let profiles = AiProfileDatabase::from_profiles(vec![
            AiProfile {
                name: "Rusher".to_string(),
                stand_off: 2.0,
                ..default()
            },
            AiProfile {
                name: "Keeper".to_string(),
                stand_off: 6.0,
                ..default()
            },
        ]);
        (LevelDatabase::default_levels(), profiles)
    }

    fn setup(level: &str, seed: u64) -> MatchConfig {
        MatchConfig {
            level: level.to_string(),
            left_profile: "Rusher".to_string(),
            right_profile: "Keeper".to_string(),
            seed,
        }
    }

    fn short_config() -> SimConfig {
        SimConfig {
            duration: 5.0,
            quiet: true,
            ..default()
        }
    }

    #[test]
    fn test_match_runs_for_its_duration() {
        let (levels, profiles) = databases();
        let result = run_match(&short_config(), &setup("Flat", 3), &levels, &profiles).unwrap();

        assert_eq!(result.level, "Flat");
        assert!(result.duration >= 5.0 && result.duration < 5.1);
        assert!(result.frames >= 300);
        assert_eq!(result.left.profile, "Rusher");
        assert_eq!(result.right.profile, "Keeper");
        // Spawned 16 apart, both close in
        assert!(result.left.distance > 1.0);
        assert!(result.left.time_in_band > 0.0 || result.right.time_in_band > 0.0);
        assert!(result.left.band_ratio <= 1.0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let (levels, profiles) = databases();
        let config = short_config();
        let a = run_match(&config, &setup("Shelves", 11), &levels, &profiles).unwrap();
        let b = run_match(&config, &setup("Shelves", 11), &levels, &profiles).unwrap();
        assert_eq!(a.left.distance, b.left.distance);
        assert_eq!(a.right.jumps, b.right.jumps);
        assert_eq!(a.frames, b.frames);
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let (levels, profiles) = databases();
        let config = short_config();
        assert!(run_match(&config, &setup("Nowhere", 1), &levels, &profiles).is_err());

        let mut bad = setup("Flat", 1);
        bad.right_profile = "Ghost".to_string();
        let err = run_match(&config, &bad, &levels, &profiles).unwrap_err();
        assert!(err.contains("Ghost"));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let (levels, profiles) = databases();
        let config = SimConfig {
            duration: -1.0,
            ..short_config()
        };
        assert!(run_match(&config, &setup("Flat", 1), &levels, &profiles).is_err());
    }
}
