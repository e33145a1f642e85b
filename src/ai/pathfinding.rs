//! Path planning queries over the ledge graph
//!
//! Stateless: resolves route endpoints against the terrain and extracts routes
//! from the precomputed graph tables.

use bevy::prelude::*;

use crate::ai::ledge_graph::{LedgeGraph, NodeId};
use crate::constants::*;
use crate::world::{ColliderId, PlatformLookup, TerrainQuery};

/// Read-only view combining the ledge graph with the level's terrain
#[derive(Clone, Copy)]
pub struct PathPlanner<'a> {
    pub graph: &'a LedgeGraph,
    pub terrain: &'a dyn TerrainQuery,
    pub platforms: &'a dyn PlatformLookup,
}

impl<'a> PathPlanner<'a> {
    pub fn new(
        graph: &'a LedgeGraph,
        terrain: &'a dyn TerrainQuery,
        platforms: &'a dyn PlatformLookup,
    ) -> Self {
        Self {
            graph,
            terrain,
            platforms,
        }
    }

    /// Closest ledge node to a point, preferring nodes on the platform below it.
    ///
    /// Nodes more than `CLOSEST_NODE_HEADROOM` above the point are never picked.
    pub fn closest_node(&self, point: Vec2) -> Option<NodeId> {
        let candidates: Vec<NodeId> = match self.terrain.probe_down(point + Vec2::Y * PROBE_LIFT, PROBE_DISTANCE) {
            Some(hit) => self.platforms.nodes_on_platform(hit.collider),
            None => self.graph.nodes().iter().map(|n| n.id).collect(),
        };

        candidates
            .into_iter()
            .filter_map(|id| self.graph.node(id))
            .filter(|node| node.position.y <= point.y + CLOSEST_NODE_HEADROOM)
            .min_by(|a, b| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
            .map(|node| node.id)
    }

    /// Ground platform directly below a point
    pub fn platform_of(&self, point: Vec2) -> Option<ColliderId> {
        let hit = self
            .terrain
            .probe_down(point + Vec2::Y * PROBE_LIFT, PROBE_DISTANCE)?;
        self.platforms.ground_of(hit.collider)
    }

    /// Horizontally nearest node a falling body can still reach
    pub fn recovery_node(&self, point: Vec2) -> Option<NodeId> {
        self.graph
            .nodes()
            .iter()
            .filter(|node| node.position.y <= point.y + RECOVERY_NODE_HEADROOM)
            .min_by(|a, b| {
                (a.position.x - point.x)
                    .abs()
                    .total_cmp(&(b.position.x - point.x).abs())
            })
            .map(|node| node.id)
    }

    /// Route between the nodes closest to two points (empty if none)
    pub fn route(&self, from: Vec2, to: Vec2) -> Vec<NodeId> {
        self.graph
            .get_path(self.closest_node(from), self.closest_node(to))
    }

    /// Whether nothing in the terrain blocks the segment `origin -> origin + offset`
    pub fn has_clear_line(&self, origin: Vec2, offset: Vec2) -> bool {
        let length = offset.length();
        if length <= f32::EPSILON {
            return true;
        }
        self.terrain.probe_ray(origin, offset, length).is_none()
    }

    /// Position of a node's owning platform, or of its anchor when no ground
    /// collider owns it
    pub fn node_platform_center(&self, node: NodeId) -> Option<Vec2> {
        let node = self.graph.node(node)?;
        self.platforms
            .platform_center(node.platform.unwrap_or(node.anchor))
    }
}
