//! Tunable constants for arenabot
//!
//! World units: 1.0 is roughly a third of an agent's height, y points up.

use bevy::prelude::*;

// =============================================================================
// BODY
// =============================================================================

pub const AGENT_SIZE: Vec2 = Vec2::new(0.8, 1.5);
/// Height of the body center above the feet (positions are at the feet)
pub const BODY_CENTER_HEIGHT: f32 = 0.75;

// =============================================================================
// TERRAIN PROBES
// =============================================================================

/// Maximum distance of every downward probe
pub const PROBE_DISTANCE: f32 = 30.0;
/// Probes for platform lookups start this far above the queried point
pub const PROBE_LIFT: f32 = 0.5;

// =============================================================================
// LEDGE ROUTING
// =============================================================================

/// Nodes higher than the query point plus this are never picked as a route endpoint
pub const CLOSEST_NODE_HEADROOM: f32 = 1.5;
/// Nodes higher than a falling agent plus this are never picked for recovery
pub const RECOVERY_NODE_HEADROOM: f32 = 1.0;
/// Stand-off band tolerance used while heading for a ledge node
pub const ROUTE_DISTANCE_TOLERANCE: f32 = 0.1;
/// Below this vertical offset the aim point is not biased outward from the ledge
pub const LEDGE_BIAS_MIN_OFFSET: f32 = -2.0;
/// The agent only jumps for a ledge node that is higher than this relative offset
pub const LEDGE_JUMP_MIN_OFFSET: f32 = -0.75;

// =============================================================================
// COMBAT POSITIONING
// =============================================================================

/// Retreat once closer than this to the opponent (stand-off minus tolerance)
pub const RETREAT_DISTANCE: f32 = 1.0;
/// Horizontal alignment under which the agent counts as standing on the opponent
pub const STACK_ALIGN_DISTANCE: f32 = 1.0;

// =============================================================================
// DEFAULT PROFILE VALUES
// =============================================================================

pub const DEFAULT_STAND_OFF: f32 = 4.0;
pub const DEFAULT_LEDGE_GRAB_DISTANCE: f32 = 0.6;
pub const DEFAULT_REPLAN_INTERVAL: f32 = 2.0;
pub const DEFAULT_TURN_COOLDOWN: f32 = 1.0;
pub const DEFAULT_RUN_SPEED: f32 = 1.0;

// =============================================================================
// REFERENCE CONTROLLER PHYSICS
// =============================================================================

pub const GRAVITY: f32 = 30.0;
pub const JUMP_VELOCITY: f32 = 13.0;
/// Horizontal velocity at full intent speed
pub const MOVE_SPEED: f32 = 7.0;
pub const SLIDE_SPEED_MULT: f32 = 1.5;
pub const GROUND_ACCEL: f32 = 60.0;
pub const AIR_ACCEL: f32 = 30.0;
pub const COLLISION_EPSILON: f32 = 0.01;
/// Levels without a kill plane use this
pub const DEFAULT_KILL_Y: f32 = -30.0;

// =============================================================================
// FILES
// =============================================================================

pub const LEVELS_FILE: &str = "assets/levels.txt";
