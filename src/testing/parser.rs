//! TOML test file parsing

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::ai::TargetKind;

/// Complete test definition from TOML file
#[derive(Debug, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    pub description: Option<String>,
    pub setup: TestSetup,
    /// Scripted changes to the opponent, applied at the start of their frame
    #[serde(default)]
    pub events: Vec<FrameEvent>,
    #[serde(default)]
    pub expect: TestExpectations,
}

/// Test setup configuration
#[derive(Debug, Deserialize)]
pub struct TestSetup {
    pub level: String,
    pub agent: AgentDef,
    pub opponent: Option<OpponentDef>,
}

/// The agent under test
#[derive(Debug, Clone, Deserialize)]
pub struct AgentDef {
    /// Profile name (default profile when absent)
    pub profile: Option<String>,
    /// Overrides the profile's stand-off
    pub stand_off: Option<f32>,
    pub x: f32,
    pub y: f32,
}

/// What the agent targets; it never moves on its own
#[derive(Debug, Clone, Deserialize)]
pub struct OpponentDef {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_health")]
    pub health: f32,
    #[serde(default)]
    pub kind: OpponentKind,
}

fn default_health() -> f32 {
    3.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    #[default]
    Combatant,
    Collectible,
    Prop,
}

impl From<OpponentKind> for TargetKind {
    fn from(kind: OpponentKind) -> Self {
        match kind {
            OpponentKind::Combatant => TargetKind::Combatant,
            OpponentKind::Collectible => TargetKind::Collectible,
            OpponentKind::Prop => TargetKind::Prop,
        }
    }
}

/// Opponent changes at a specific frame
#[derive(Debug, Clone, Deserialize)]
pub struct FrameEvent {
    pub frame: u64,
    pub opponent_health: Option<f32>,
    pub opponent_x: Option<f32>,
    pub opponent_y: Option<f32>,
}

/// Expected test outcomes
#[derive(Debug, Default, Deserialize)]
pub struct TestExpectations {
    /// Multiple state assertions at different frames (uses [[expect.state]] TOML syntax)
    #[serde(default)]
    pub state: Vec<StateAssertion>,
}

/// State assertion after simulation
#[derive(Debug, Clone, Deserialize)]
pub struct StateAssertion {
    pub after_frame: u64,
    #[serde(default)]
    pub checks: Vec<String>,
}

/// Parse a test file from path
pub fn parse_test_file(path: &Path) -> Result<TestDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let toml = r#"
name = "Test"
[setup]
level = "Flat"
[setup.agent]
profile = "Rusher"
x = -5.0
y = 0.0
[setup.opponent]
x = 5.0
y = 0.0
kind = "collectible"

[[events]]
frame = 30
opponent_health = 0.0

[[expect.state]]
after_frame = 40
checks = ["agent.speed = 0"]
"#;
        let def: TestDefinition = toml::from_str(toml).unwrap();
        assert_eq!(def.name, "Test");
        assert_eq!(def.setup.level, "Flat");
        assert_eq!(def.setup.agent.profile.as_deref(), Some("Rusher"));
        let opponent = def.setup.opponent.unwrap();
        assert_eq!(opponent.health, 3.0);
        assert_eq!(TargetKind::from(opponent.kind), TargetKind::Collectible);
        assert_eq!(def.events[0].opponent_health, Some(0.0));
        assert!(def.events[0].opponent_x.is_none());
        assert_eq!(def.expect.state[0].checks.len(), 1);
    }

    #[test]
    fn test_opponent_and_expectations_are_optional() {
        let toml = r#"
name = "Alone"
[setup]
level = "Flat"
[setup.agent]
x = 0.0
y = 0.0
"#;
        let def: TestDefinition = toml::from_str(toml).unwrap();
        assert!(def.setup.opponent.is_none());
        assert!(def.events.is_empty());
        assert!(def.expect.state.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let toml = r#"
name = "Bad"
[setup]
level = "Flat"
[setup.agent]
x = 0.0
y = 0.0
[setup.opponent]
x = 1.0
y = 0.0
kind = "dragon"
"#;
        assert!(toml::from_str::<TestDefinition>(toml).is_err());
    }
}
