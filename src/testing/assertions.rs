//! Assertion checking for test expectations

use super::parser::StateAssertion;

/// Error when an assertion fails
#[derive(Debug, Clone)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n    Expected: {}\n    Actual: {}",
            self.message, self.expected, self.actual
        )
    }
}

/// World state for assertions
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    pub frame: u64,
    pub agent: AgentState,
    pub opponent: Option<OpponentState>,
}

/// The agent's body plus the intent it chose on the last frame
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub jump: bool,
    pub slide: bool,
    pub routing: bool,
    pub grounded: bool,
    pub jumps: u32,
    pub falls: u32,
}

#[derive(Debug, Clone, Default)]
pub struct OpponentState {
    pub x: f32,
    pub y: f32,
    pub health: f32,
}

enum Value {
    Number(f32),
    Flag(bool),
}

/// Parse a check string into (path, operator, value)
fn parse_check(check: &str) -> Option<(&str, &str, &str)> {
    // Try operators in order of specificity (>= before >, etc.)
    for op in [">=", "<=", "!=", "=", ">", "<"] {
        if let Some(idx) = check.find(op) {
            let path = check[..idx].trim();
            let value = check[idx + op.len()..].trim();
            return Some((path, op, value));
        }
    }
    None
}

fn lookup(path: &str, state: &WorldState) -> Result<Value, AssertionError> {
    let missing = |what: &str| AssertionError {
        message: format!("Unknown property {}", path),
        expected: what.to_string(),
        actual: path.to_string(),
    };

    match path.split_once('.') {
        Some(("agent", property)) => {
            let agent = &state.agent;
            Ok(match property {
                "x" => Value::Number(agent.x),
                "y" => Value::Number(agent.y),
                "speed" => Value::Number(agent.speed),
                "jumps" => Value::Number(agent.jumps as f32),
                "falls" => Value::Number(agent.falls as f32),
                "jump" => Value::Flag(agent.jump),
                "slide" => Value::Flag(agent.slide),
                "routing" => Value::Flag(agent.routing),
                "grounded" => Value::Flag(agent.grounded),
                _ => {
                    return Err(missing(
                        "agent.{x,y,speed,jumps,falls,jump,slide,routing,grounded}",
                    ));
                }
            })
        }
        Some(("opponent", property)) => {
            let opponent = state.opponent.as_ref().ok_or_else(|| AssertionError {
                message: format!("Check on {} failed", path),
                expected: "an opponent".to_string(),
                actual: "no opponent in this scenario".to_string(),
            })?;
            Ok(match property {
                "x" => Value::Number(opponent.x),
                "y" => Value::Number(opponent.y),
                "health" => Value::Number(opponent.health),
                _ => return Err(missing("opponent.{x,y,health}")),
            })
        }
        _ => Err(missing("agent.<property> or opponent.<property>")),
    }
}

/// Check state assertions against world state
pub fn check_state(assertion: &StateAssertion, state: &WorldState) -> Result<(), AssertionError> {
    for check in &assertion.checks {
        let (path, operator, expected_value) = parse_check(check).ok_or_else(|| AssertionError {
            message: format!("Invalid check syntax: {}", check),
            expected: "format: 'agent.property = value' or 'agent.property > value'".to_string(),
            actual: check.clone(),
        })?;

        match lookup(path, state)? {
            Value::Number(actual) => check_float_comparison(path, actual, operator, expected_value)?,
            Value::Flag(actual) => check_flag(path, actual, operator, expected_value)?,
        }
    }

    Ok(())
}

/// Check float comparison with operator
fn check_float_comparison(
    path: &str,
    actual: f32,
    operator: &str,
    expected_str: &str,
) -> Result<(), AssertionError> {
    let value: f32 = expected_str.trim().parse().map_err(|_| AssertionError {
        message: format!("Invalid value for {}", path),
        expected: "number".to_string(),
        actual: expected_str.to_string(),
    })?;

    let pass = match operator {
        ">=" => actual >= value,
        "<=" => actual <= value,
        ">" => actual > value,
        "<" => actual < value,
        "=" => (actual - value).abs() < 0.1,
        "!=" => (actual - value).abs() >= 0.1,
        _ => false,
    };

    if !pass {
        return Err(AssertionError {
            message: format!(
                "Check failed: {} {} {} (actual: {:.2})",
                path, operator, expected_str, actual
            ),
            expected: format!("{} {} {}", path, operator, value),
            actual: format!("{:.2}", actual),
        });
    }

    Ok(())
}

/// Flags only support = and !=
fn check_flag(
    path: &str,
    actual: bool,
    operator: &str,
    expected_str: &str,
) -> Result<(), AssertionError> {
    let value: bool = expected_str.parse().map_err(|_| AssertionError {
        message: format!("Invalid value for {}", path),
        expected: "true or false".to_string(),
        actual: expected_str.to_string(),
    })?;

    let pass = match operator {
        "=" => actual == value,
        "!=" => actual != value,
        _ => {
            return Err(AssertionError {
                message: format!("Operator {} does not apply to {}", operator, path),
                expected: "= or !=".to_string(),
                actual: operator.to_string(),
            });
        }
    };

    if !pass {
        return Err(AssertionError {
            message: format!("Check failed: {} {} {}", path, operator, expected_str),
            expected: format!("{} {} {}", path, operator, value),
            actual: actual.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> WorldState {
        WorldState {
            frame: 10,
            agent: AgentState {
                x: 2.0,
                speed: -1.0,
                jump: true,
                ..Default::default()
            },
            opponent: Some(OpponentState {
                x: 5.0,
                y: 0.0,
                health: 3.0,
            }),
        }
    }

    fn checks(list: &[&str]) -> StateAssertion {
        StateAssertion {
            after_frame: 10,
            checks: list.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_check_prefers_two_char_operators() {
        assert_eq!(parse_check("agent.x >= 3"), Some(("agent.x", ">=", "3")));
        assert_eq!(parse_check("agent.x != 3"), Some(("agent.x", "!=", "3")));
        assert_eq!(parse_check("agent.x<3"), Some(("agent.x", "<", "3")));
        assert_eq!(parse_check("agent.x"), None);
    }

    #[test]
    fn test_passing_checks() {
        let assertion = checks(&[
            "agent.x = 2",
            "agent.speed < 0",
            "agent.jump = true",
            "agent.slide != true",
            "agent.routing = false",
            "opponent.health >= 3",
        ]);
        assert!(check_state(&assertion, &state()).is_ok());
    }

    #[test]
    fn test_failing_checks() {
        let err = check_state(&checks(&["agent.speed > 0"]), &state()).unwrap_err();
        assert!(err.message.contains("agent.speed"));
        assert!(check_state(&checks(&["agent.jump = false"]), &state()).is_err());
        assert!(check_state(&checks(&["agent.jump > true"]), &state()).is_err());
        assert!(check_state(&checks(&["agent.height = 1"]), &state()).is_err());
        assert!(check_state(&checks(&["agent.x = far"]), &state()).is_err());

        let alone = WorldState {
            opponent: None,
            ..state()
        };
        assert!(check_state(&checks(&["opponent.x = 5"]), &alone).is_err());
    }
}
