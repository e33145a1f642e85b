//! Player-related components

use bevy::prelude::*;

/// Marker for bodies moved by the character controller
#[derive(Component)]
pub struct Player;

/// Feet position in world units
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position(pub Vec2);

/// 2D velocity vector
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Velocity(pub Vec2);

/// Whether player is on ground
#[derive(Component, Default)]
pub struct Grounded(pub bool);

/// Direction player faces (-1.0 = left, 1.0 = right)
#[derive(Component)]
pub struct Facing(pub f32);

impl Default for Facing {
    fn default() -> Self {
        Self(1.0) // Default facing right
    }
}

impl Facing {
    pub fn is_right(&self) -> bool {
        self.0 > 0.0
    }
}

/// Whether the body is in a slide
#[derive(Component, Default)]
pub struct Sliding(pub bool);

/// Remaining health; 0 or less means defeated
#[derive(Component, Clone, Copy, Debug)]
pub struct Health(pub f32);

impl Default for Health {
    fn default() -> Self {
        Self(3.0)
    }
}

/// Entity this agent is fighting or chasing
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct CombatTarget(pub Option<Entity>);

/// Where the body returns after falling out of the level
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct SpawnPoint(pub Vec2);

/// Running movement totals
#[derive(Component, Clone, Debug, Default)]
pub struct MotionStats {
    /// Distance travelled (world units)
    pub distance: f32,
    pub jumps: u32,
    pub falls: u32,
}
