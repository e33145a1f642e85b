//! Test execution engine

use bevy::prelude::*;

use crate::ai::{
    Agent, AgentPolicy, AiProfile, AiProfileDatabase, MotionIntent, RushPolicy, TargetKind,
    sync_ledge_graph,
};
use crate::constants::LEVELS_FILE;
use crate::levels::LevelDatabase;
use crate::player::{
    CombatTarget, Grounded, Health, MotionStats, Position, Velocity, body_bundle,
};
use crate::simulation::HeadlessAppBuilder;

use super::assertions::{AgentState, AssertionError, OpponentState, WorldState, check_state};
use super::parser::{FrameEvent, StateAssertion, TestDefinition};

/// Frames run when a scenario has no expectations
const DEFAULT_FRAMES: u64 = 60;

/// Result of running a test
#[derive(Debug)]
pub enum TestResult {
    Pass { frames: u64 },
    Fail { error: AssertionError },
    Error { message: String },
}

/// The body whose policy is under test
#[derive(Component)]
struct ScenarioAgent;

/// The scripted target
#[derive(Component)]
struct ScenarioOpponent;

/// Resource to track test state
#[derive(Resource)]
struct TestControl {
    current_frame: u64,
    /// Sorted by frame
    events: Vec<FrameEvent>,
    next_event: usize,
}

/// Run a single test against the level and profile files
pub fn run_test(test: &TestDefinition) -> TestResult {
    let level_db = LevelDatabase::load_from_file(LEVELS_FILE);
    let profile_db = AiProfileDatabase::default();
    run_test_with(test, &level_db, &profile_db)
}

/// Run a single test against the given databases
pub fn run_test_with(
    test: &TestDefinition,
    level_db: &LevelDatabase,
    profile_db: &AiProfileDatabase,
) -> TestResult {
    let Some(level) = level_db.get_by_name(&test.setup.level) else {
        return TestResult::Error {
            message: format!(
                "Level '{}' not found. Available: {:?}",
                test.setup.level,
                level_db.names()
            ),
        };
    };

    let agent_def = &test.setup.agent;
    let profile = match &agent_def.profile {
        Some(name) => match profile_db.get_by_name(name) {
            Some(profile) => profile.clone(),
            None => {
                return TestResult::Error {
                    message: format!("Profile '{}' not found", name),
                };
            }
        },
        None => AiProfile::default(),
    };
    let mut policy = RushPolicy::from_profile(&profile);
    if let Some(stand_off) = agent_def.stand_off {
        policy = policy.with_stand_off(stand_off);
    }

    let mut app = match HeadlessAppBuilder::new().with_level(level).with_ai().build() {
        Ok(app) => app,
        Err(message) => return TestResult::Error { message },
    };

    let mut events = test.events.clone();
    events.sort_by_key(|e| e.frame);
    let last_event = events.last().map_or(0, |e| e.frame);
    app.insert_resource(TestControl {
        current_frame: 0,
        events,
        next_event: 0,
    });
    app.add_systems(Update, event_injection.before(sync_ledge_graph));

    let world = app.world_mut();
    let opponent = test.setup.opponent.as_ref().map(|def| {
        world
            .spawn((
                body_bundle(Vec2::new(def.x, def.y)),
                Health(def.health),
                TargetKind::from(def.kind),
                ScenarioOpponent,
            ))
            .id()
    });
    world.spawn((
        body_bundle(Vec2::new(agent_def.x, agent_def.y)),
        Health::default(),
        Agent,
        AgentPolicy::Rush(policy),
        CombatTarget(opponent),
        ScenarioAgent,
    ));

    let mut assertions: Vec<&StateAssertion> = test.expect.state.iter().collect();
    assertions.sort_by_key(|a| a.after_frame);
    let max_frame = assertions
        .last()
        .map_or(DEFAULT_FRAMES, |a| a.after_frame)
        .max(last_event);

    // Frame N is the Nth update; assertions run once their frame has completed
    let mut next_assertion = 0;
    for frame in 1..=max_frame {
        app.update();

        while next_assertion < assertions.len() && assertions[next_assertion].after_frame <= frame {
            let Some(state) = extract_world_state(app.world_mut(), frame) else {
                return TestResult::Error {
                    message: "Scenario agent disappeared".to_string(),
                };
            };
            if let Err(error) = check_state(assertions[next_assertion], &state) {
                return TestResult::Fail { error };
            }
            next_assertion += 1;
        }
    }

    TestResult::Pass { frames: max_frame }
}

/// Apply scripted opponent changes at the start of their frame
fn event_injection(
    mut control: ResMut<TestControl>,
    mut opponents: Query<(&mut Position, &mut Velocity, &mut Health), With<ScenarioOpponent>>,
) {
    control.current_frame += 1;
    let frame = control.current_frame;

    while let Some(event) = control.events.get(control.next_event).cloned() {
        if event.frame > frame {
            break;
        }
        for (mut position, mut velocity, mut health) in &mut opponents {
            if let Some(x) = event.opponent_x {
                position.0.x = x;
                velocity.0 = Vec2::ZERO;
            }
            if let Some(y) = event.opponent_y {
                position.0.y = y;
                velocity.0 = Vec2::ZERO;
            }
            if let Some(h) = event.opponent_health {
                health.0 = h;
            }
        }
        control.next_event += 1;
    }
}

/// Extract world state for assertions
fn extract_world_state(world: &mut World, frame: u64) -> Option<WorldState> {
    let mut agent_query = world.query_filtered::<(
        &Position,
        &MotionIntent,
        &AgentPolicy,
        &Grounded,
        &MotionStats,
    ), With<ScenarioAgent>>();
    let agent = agent_query
        .iter(world)
        .next()
        .map(|(position, intent, policy, grounded, stats)| AgentState {
            x: position.0.x,
            y: position.0.y,
            speed: intent.desired_horizontal_speed,
            jump: intent.jump,
            slide: intent.slide,
            routing: policy.as_rush().is_some_and(|r| r.is_routing()),
            grounded: grounded.0,
            jumps: stats.jumps,
            falls: stats.falls,
        })?;

    let mut opponent_query =
        world.query_filtered::<(&Position, &Health), With<ScenarioOpponent>>();
    let opponent = opponent_query
        .iter(world)
        .next()
        .map(|(position, health)| OpponentState {
            x: position.0.x,
            y: position.0.y,
            health: health.0,
        });

    Some(WorldState {
        frame,
        agent,
        opponent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(toml: &str) -> TestDefinition {
        toml::from_str(toml).unwrap()
    }

    fn run(test: &TestDefinition) -> TestResult {
        run_test_with(
            test,
            &LevelDatabase::default_levels(),
            &AiProfileDatabase::builtin(),
        )
    }

    #[test]
    fn test_chase_then_stop_on_defeat() {
        let test = scenario(
            r#"
name = "defeat"
[setup]
level = "Flat"
[setup.agent]
x = -6.0
y = 0.0
[setup.opponent]
x = 6.0
y = 0.0

[[events]]
frame = 30
opponent_health = 0.0

[[expect.state]]
after_frame = 20
checks = ["agent.speed > 0", "agent.routing = false"]

[[expect.state]]
after_frame = 40
checks = ["agent.speed = 0", "opponent.health = 0"]
"#,
        );
        assert!(matches!(run(&test), TestResult::Pass { frames: 40 }));
    }

    #[test]
    fn test_failed_check_reports_fail() {
        let test = scenario(
            r#"
name = "wrong"
[setup]
level = "Flat"
[setup.agent]
x = -6.0
y = 0.0
[setup.opponent]
x = 6.0
y = 0.0

[[expect.state]]
after_frame = 10
checks = ["agent.speed < 0"]
"#,
        );
        assert!(matches!(run(&test), TestResult::Fail { .. }));
    }

    #[test]
    fn test_unknown_level_and_profile_are_errors() {
        let test = scenario(
            r#"
name = "nowhere"
[setup]
level = "Atlantis"
[setup.agent]
x = 0.0
y = 0.0
"#,
        );
        assert!(matches!(run(&test), TestResult::Error { .. }));

        let test = scenario(
            r#"
name = "nobody"
[setup]
level = "Flat"
[setup.agent]
profile = "Nobody"
x = 0.0
y = 0.0
"#,
        );
        assert!(matches!(run(&test), TestResult::Error { .. }));
    }

    #[test]
    fn test_without_opponent_agent_idles() {
        let test = scenario(
            r#"
name = "alone"
[setup]
level = "Flat"
[setup.agent]
x = 0.0
y = 0.0

[[expect.state]]
after_frame = 30
checks = ["agent.speed = 0", "agent.jump = false", "agent.grounded = true"]
"#,
        );
        assert!(matches!(run(&test), TestResult::Pass { .. }));
    }
}
