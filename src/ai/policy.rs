//! Policy seam - snapshots in, one motion intent out per tick

use bevy::prelude::*;

use crate::ai::{LedgeGraph, PathPlanner, RushPolicy};
use crate::world::{PlatformLookup, TerrainQuery};

/// What an agent wants its body to do this tick
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionIntent {
    /// Signed, +x is right. Magnitude is a fraction of full run speed.
    pub desired_horizontal_speed: f32,
    pub jump: bool,
    pub slide: bool,
    pub facing_right: bool,
}

impl MotionIntent {
    /// Stand still, keeping the current facing
    pub fn idle(facing_right: bool) -> Self {
        Self {
            facing_right,
            ..default()
        }
    }
}

/// Receiver of motion intents (the character controller)
pub trait Actuation {
    fn set_intent(&mut self, intent: MotionIntent);
}

impl Actuation for MotionIntent {
    fn set_intent(&mut self, intent: MotionIntent) {
        *self = intent;
    }
}

/// What kind of thing a target is
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetKind {
    /// A body with its own controller and health
    #[default]
    Combatant,
    /// A pickup the agent reaches by touching it
    Collectible,
    Prop,
}

/// Read-only facts about a target
pub trait OpponentProvider {
    fn position(&self) -> Vec2;
    /// None for targets without health
    fn health(&self) -> Option<f32>;
    fn kind(&self) -> TargetKind;

    fn snapshot(&self) -> TargetView {
        TargetView {
            position: self.position(),
            health: self.health(),
            kind: self.kind(),
        }
    }
}

/// Per-tick copy of a target's state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetView {
    pub position: Vec2,
    pub health: Option<f32>,
    pub kind: TargetKind,
}

impl TargetView {
    pub fn combatant(position: Vec2, health: f32) -> Self {
        Self {
            position,
            health: Some(health),
            kind: TargetKind::Combatant,
        }
    }

    pub fn collectible(position: Vec2) -> Self {
        Self {
            position,
            health: None,
            kind: TargetKind::Collectible,
        }
    }

    /// Targets without health never count as defeated
    pub fn is_alive(&self) -> bool {
        self.health.is_none_or(|h| h > 0.0)
    }
}

impl OpponentProvider for TargetView {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn health(&self) -> Option<f32> {
        self.health
    }

    fn kind(&self) -> TargetKind {
        self.kind
    }
}

/// Per-tick copy of the acting agent's body state
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgentView {
    /// Feet position
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing_right: bool,
    pub sliding: bool,
}

/// Shared, read-only inputs of one tick
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    /// Seconds since the previous tick
    pub dt: f32,
    pub graph: &'a LedgeGraph,
    pub terrain: &'a dyn TerrainQuery,
    pub platforms: &'a dyn PlatformLookup,
}

impl<'a> TickContext<'a> {
    pub fn new(
        dt: f32,
        graph: &'a LedgeGraph,
        terrain: &'a dyn TerrainQuery,
        platforms: &'a dyn PlatformLookup,
    ) -> Self {
        Self {
            dt,
            graph,
            terrain,
            platforms,
        }
    }

    pub fn planner(&self) -> PathPlanner<'a> {
        PathPlanner::new(self.graph, self.terrain, self.platforms)
    }
}

/// A behavior that picks one motion intent per tick
pub trait Policy {
    fn choose_action(
        &mut self,
        ctx: &TickContext,
        agent: &AgentView,
        target: Option<&TargetView>,
    ) -> MotionIntent;
}

/// The behaviors an agent can run
#[derive(Component, Clone, Debug)]
pub enum AgentPolicy {
    Rush(RushPolicy),
    /// Stand still
    Idle,
}

impl Default for AgentPolicy {
    fn default() -> Self {
        AgentPolicy::Rush(RushPolicy::default())
    }
}

impl AgentPolicy {
    pub fn as_rush(&self) -> Option<&RushPolicy> {
        match self {
            AgentPolicy::Rush(rush) => Some(rush),
            AgentPolicy::Idle => None,
        }
    }
}

impl Policy for AgentPolicy {
    fn choose_action(
        &mut self,
        ctx: &TickContext,
        agent: &AgentView,
        target: Option<&TargetView>,
    ) -> MotionIntent {
        match self {
            AgentPolicy::Rush(rush) => rush.choose_action(ctx, agent, target),
            AgentPolicy::Idle => MotionIntent::idle(agent.facing_right),
        }
    }
}

/// Evaluate a policy once and hand the result to the actuator
pub fn drive<P: Policy + ?Sized, A: Actuation + ?Sized>(
    policy: &mut P,
    ctx: &TickContext,
    agent: &AgentView,
    target: Option<&dyn OpponentProvider>,
    actuation: &mut A,
) -> MotionIntent {
    let snapshot = target.map(|t| t.snapshot());
    let intent = policy.choose_action(ctx, agent, snapshot.as_ref());
    actuation.set_intent(intent);
    intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ColliderTag, LevelGeometry};

    #[derive(Default)]
    struct Recorder(Vec<MotionIntent>);

    impl Actuation for Recorder {
        fn set_intent(&mut self, intent: MotionIntent) {
            self.0.push(intent);
        }
    }

    fn floor() -> LevelGeometry {
        let mut geo = LevelGeometry::new();
        geo.add_collider(
            "floor",
            ColliderTag::Ground,
            None,
            Vec2::new(0.0, -0.5),
            Vec2::new(40.0, 1.0),
        );
        geo
    }

    #[test]
    fn test_idle_policy_stands_still() {
        let geo = floor();
        let graph = LedgeGraph::default();
        let ctx = TickContext::new(0.1, &graph, &geo, &geo);
        let agent = AgentView {
            facing_right: true,
            ..default()
        };
        let target = TargetView::combatant(Vec2::new(8.0, 0.0), 3.0);

        let mut policy = AgentPolicy::Idle;
        let intent = policy.choose_action(&ctx, &agent, Some(&target));
        assert_eq!(intent, MotionIntent::idle(true));
    }

    #[test]
    fn test_drive_forwards_one_intent_per_tick() {
        let geo = floor();
        let graph = LedgeGraph::default();
        let ctx = TickContext::new(0.1, &graph, &geo, &geo);
        let agent = AgentView::default();
        let target = TargetView::combatant(Vec2::new(8.0, 0.0), 3.0);

        let mut policy = AgentPolicy::default();
        let mut recorder = Recorder::default();
        for _ in 0..3 {
            drive(&mut policy, &ctx, &agent, Some(&target), &mut recorder);
        }
        assert_eq!(recorder.0.len(), 3);
        assert!(recorder.0[0].desired_horizontal_speed > 0.0);

        drive(&mut policy, &ctx, &agent, None, &mut recorder);
        assert_eq!(recorder.0[3].desired_horizontal_speed, 0.0);
    }

    #[test]
    fn test_target_liveness() {
        assert!(TargetView::collectible(Vec2::ZERO).is_alive());
        assert!(TargetView::combatant(Vec2::ZERO, 0.5).is_alive());
        assert!(!TargetView::combatant(Vec2::ZERO, 0.0).is_alive());
    }
}
