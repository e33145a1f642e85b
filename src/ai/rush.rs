//! Rush policy - close to stand-off range and hold it
//!
//! Each tick the policy runs one pass over these stages, in order:
//! idle check, replan, ledge advance, line-of-sight early exit, route aim,
//! fall recovery, horizontal pursuit, edge guard, anti-stacking, anti-thrash
//! and collectible reach. Later stages only adjust what earlier ones chose.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::ai::{
    AgentView, AiProfile, LedgeGraph, MotionIntent, NodeId, PathPlanner, Policy, TargetKind,
    TargetView, TickContext,
};
use crate::constants::*;

/// Per-agent state of the rush behavior
#[derive(Clone, Debug)]
pub struct RushPolicy {
    stand_off: f32,
    grab_distance: f32,
    replan_interval: f32,
    turn_cooldown: f32,
    run_speed: f32,

    /// Remaining route after the current node
    path: VecDeque<NodeId>,
    current_node: Option<NodeId>,
    replan_timer: f32,
    turn_timer: f32,
    /// Sign of the speed moved at on the last tick that was not held back
    /// by the turn guard (0 after standing still)
    heading: f32,

    replans: u32,
    nodes_reached: u32,
}

impl Default for RushPolicy {
    fn default() -> Self {
        Self::from_profile(&AiProfile::default())
    }
}

impl RushPolicy {
    /// Default tuning with a given stand-off distance
    pub fn new(stand_off: f32) -> Self {
        Self::default().with_stand_off(stand_off)
    }

    pub fn from_profile(profile: &AiProfile) -> Self {
        Self {
            stand_off: profile.stand_off,
            grab_distance: profile.ledge_grab_distance,
            replan_interval: profile.replan_interval,
            turn_cooldown: profile.turn_cooldown,
            run_speed: profile.run_speed,
            path: VecDeque::new(),
            current_node: None,
            replan_timer: 0.0,
            turn_timer: profile.turn_cooldown,
            heading: 0.0,
            replans: 0,
            nodes_reached: 0,
        }
    }

    pub fn with_stand_off(mut self, stand_off: f32) -> Self {
        self.stand_off = stand_off.max(0.0);
        self
    }

    pub fn stand_off(&self) -> f32 {
        self.stand_off
    }

    /// Ledge node currently headed for
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    /// Nodes still queued after the current one
    pub fn path(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.path.iter().copied()
    }

    pub fn is_routing(&self) -> bool {
        self.current_node.is_some()
    }

    /// Routes computed so far
    pub fn replans(&self) -> u32 {
        self.replans
    }

    /// Ledge nodes arrived at so far
    pub fn nodes_reached(&self) -> u32 {
        self.nodes_reached
    }

    /// Drop the route and force a replan on the next tick
    pub fn reset_route(&mut self) {
        self.path.clear();
        self.current_node = None;
        self.replan_timer = 0.0;
    }

    fn load_next_ledge(&mut self) {
        match self.path.pop_front() {
            Some(node) => self.current_node = Some(node),
            None => {
                self.current_node = None;
                self.replan_timer = 0.0;
            }
        }
    }

    /// Where the route goes after the current node
    fn next_position(&self, graph: &LedgeGraph, target: &TargetView) -> Vec2 {
        self.path
            .front()
            .and_then(|&n| graph.position(n))
            .unwrap_or(target.position)
    }

    fn replan(&mut self, planner: &PathPlanner, pos: Vec2, target: &TargetView) {
        self.replan_timer = self.replan_interval;
        self.replans += 1;
        self.path = planner.route(pos, target.position).into();
        // An empty route keeps heading for the node already chosen
        if let Some(node) = self.path.pop_front() {
            self.current_node = Some(node);
        }
        debug!(
            "Replanned: {:?} then {} more nodes",
            self.current_node,
            self.path.len()
        );
    }

    /// Arrival, line-of-sight early exit and route smoothing
    fn advance_route(
        &mut self,
        planner: &PathPlanner,
        node: NodeId,
        pos: Vec2,
        target: &TargetView,
    ) {
        let Some(node_pos) = planner.graph.position(node) else {
            self.reset_route();
            return;
        };
        let center = pos + Vec2::Y * BODY_CENTER_HEIGHT;
        let current_offset = node_pos - pos;
        let next_pos = self.next_position(planner.graph, target);
        let ascending = next_pos.y - node_pos.y >= 0.0;

        let arrived = if ascending {
            current_offset.x.abs() <= self.grab_distance && current_offset.y <= 0.0
        } else {
            current_offset.y >= 0.0
        };
        if arrived {
            self.nodes_reached += 1;
            self.load_next_ledge();
            return;
        }

        let same_platform = matches!(
            (planner.platform_of(pos), planner.platform_of(target.position)),
            (Some(a), Some(b)) if a == b
        );
        if self.path.is_empty() || same_platform {
            if planner.has_clear_line(center, target.position - pos) {
                self.current_node = None;
                self.replan_timer = 0.0;
            }
            return;
        }

        if ascending && current_offset.y > 0.0 {
            return;
        }
        let Some(&next_node) = self.path.front() else {
            return;
        };
        // Skip the current node when the next one is on the platform straight ahead
        let to_next = next_pos - center;
        let Some(hit) = planner.terrain.probe_ray(center, to_next, to_next.length()) else {
            return;
        };
        if planner
            .platforms
            .nodes_on_platform(hit.collider)
            .contains(&next_node)
        {
            self.load_next_ledge();
        }
    }

    /// Aim offset toward the current node, biased outward from its platform
    fn route_aim(&self, planner: &PathPlanner, node: NodeId, pos: Vec2) -> Option<(Vec2, bool)> {
        let node_pos = planner.graph.position(node)?;
        let mut aim = node_pos - pos;
        if aim.y.abs() < ROUTE_DISTANCE_TOLERANCE {
            aim.y = 0.0;
        }
        if aim.y > LEDGE_BIAS_MIN_OFFSET {
            if let Some(platform_center) = planner.node_platform_center(node) {
                if node_pos.x - platform_center.x > 0.0 {
                    aim.x += self.grab_distance;
                } else {
                    aim.x -= self.grab_distance;
                }
            }
        }
        let jump = aim.y > LEDGE_JUMP_MIN_OFFSET && aim.x.abs() <= self.grab_distance / 2.0;
        Some((aim, jump))
    }

    fn run_toward(&self, dx: f32) -> f32 {
        if dx == 0.0 {
            0.0
        } else {
            dx.signum() * self.run_speed
        }
    }

    /// Hold back a reversal until the turn cooldown has elapsed. Ticks the
    /// guard zeroes keep the old heading; a tick that chose to stand still
    /// clears it.
    fn guard_turn(&mut self, speed: f32, dt: f32) -> f32 {
        if speed == 0.0 {
            self.heading = 0.0;
            self.turn_timer = self.turn_cooldown;
            return 0.0;
        }
        let sign = speed.signum();
        if self.heading != 0.0 && sign != self.heading {
            self.turn_timer -= dt;
            if self.turn_timer > 0.0 {
                return 0.0;
            }
        }
        self.heading = sign;
        self.turn_timer = self.turn_cooldown;
        speed
    }
}

impl Policy for RushPolicy {
    fn choose_action(
        &mut self,
        ctx: &TickContext,
        agent: &AgentView,
        target: Option<&TargetView>,
    ) -> MotionIntent {
        let mut intent = MotionIntent::idle(agent.facing_right);
        let Some(target) = target.filter(|t| t.is_alive()) else {
            self.heading = 0.0;
            self.turn_timer = self.turn_cooldown;
            return intent;
        };

        let planner = ctx.planner();
        let pos = agent.position;
        let center = pos + Vec2::Y * BODY_CENTER_HEIGHT;
        let opponent_offset = target.position - pos;
        let mut aim = opponent_offset;
        let mut stand_off = self.stand_off;
        let mut tolerance = self.stand_off - RETREAT_DISTANCE;

        self.replan_timer -= ctx.dt;
        if self.replan_timer <= 0.0 {
            self.replan(&planner, pos, target);
        }

        if let Some(node) = self.current_node {
            self.advance_route(&planner, node, pos, target);
        }

        if let Some(node) = self.current_node {
            if let Some((node_aim, jump)) = self.route_aim(&planner, node, pos) {
                aim = node_aim;
                intent.jump = jump;
                stand_off = 0.0;
                tolerance = ROUTE_DISTANCE_TOLERANCE;
            }
        }

        // Falling: jump, and head for the nearest reachable node if there is one
        let ground_below = planner.terrain.probe_down(center, PROBE_DISTANCE).is_some();
        let mut recovery = None;
        if !ground_below {
            intent.jump = true;
            recovery = planner.recovery_node(pos);
            let recovery_dx = recovery
                .and_then(|n| planner.graph.position(n))
                .map(|p| p.x - pos.x);
            if let Some(dx) = recovery_dx.filter(|dx| dx.abs() > self.grab_distance) {
                let speed = self.run_toward(dx);
                self.heading = speed.signum();
                self.turn_timer = self.turn_cooldown;
                intent.desired_horizontal_speed = speed;
                return intent;
            }
        }

        let horizontal = aim.x.abs();
        let mut speed = 0.0;
        if horizontal > stand_off {
            speed = self.run_toward(aim.x);
        } else if horizontal < stand_off - tolerance {
            speed = self.run_toward(-aim.x);
        } else if self.current_node.is_none() && ground_below {
            intent.facing_right = opponent_offset.x > 0.0;
        }

        // Don't chase off the map
        if speed != 0.0 {
            let near = pos + Vec2::new(speed / 2.0, PROBE_LIFT);
            let far = near + Vec2::new(speed, 0.0);
            let ground_ahead = planner.terrain.probe_down(near, PROBE_DISTANCE).is_some()
                || planner.terrain.probe_down(far, PROBE_DISTANCE).is_some();
            if ground_ahead {
                intent.facing_right = opponent_offset.x > 0.0;
                intent.slide = horizontal > self.stand_off * 2.0 && self.current_node.is_none();
            } else {
                if agent.sliding {
                    speed = self.run_toward(-opponent_offset.x);
                } else if recovery.is_none() {
                    speed = 0.0;
                }
                intent.slide = false;
            }
        }

        // Don't sit on top of the opponent
        if speed == 0.0
            && opponent_offset.x.abs() < STACK_ALIGN_DISTANCE
            && opponent_offset.y < 0.0
            && target.kind == TargetKind::Combatant
            && agent.velocity.y <= f32::EPSILON
        {
            speed = self.run_toward(-pos.x);
        }

        speed = self.guard_turn(speed, ctx.dt);

        if self.stand_off == 0.0 && speed == 0.0 && target.kind == TargetKind::Collectible {
            intent.jump = true;
        }

        intent.desired_horizontal_speed = speed;
        intent
    }
}
