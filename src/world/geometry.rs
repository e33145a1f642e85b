//! Box-collider level model
//!
//! Deterministic stand-in for a physics scene: axis-aligned boxes arranged in a
//! parent hierarchy. Implements TerrainQuery and PlatformLookup so the AI can be
//! driven headless and in tests.

use bevy::prelude::*;

use crate::ai::{LedgeGraph, NodeId};
use crate::world::{ColliderId, ColliderTag, PlatformLookup, ProbeHit, TerrainQuery};

/// An axis-aligned collider box
#[derive(Clone, Debug)]
pub struct Collider {
    pub id: ColliderId,
    pub name: String,
    pub tag: ColliderTag,
    pub parent: Option<ColliderId>,
    pub center: Vec2,
    pub size: Vec2,
}

impl Collider {
    pub fn min(&self) -> Vec2 {
        self.center - self.size / 2.0
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.size / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center.y + self.size.y / 2.0
    }

    /// Distance along a normalized ray to the box, None when missed or when the
    /// origin is inside the box
    fn ray_entry(&self, origin: Vec2, direction: Vec2) -> Option<f32> {
        let min = self.min();
        let max = self.max();
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..2 {
            let (o, d, lo, hi) = (origin[axis], direction[axis], min[axis], max[axis]);
            if d == 0.0 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let t1 = (lo - o) / d;
            let t2 = (hi - o) / d;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }

        if t_exit < t_enter || t_enter < 0.0 {
            return None;
        }
        Some(t_enter)
    }
}

/// All colliders of the active level plus the ledge nodes attached to them
#[derive(Resource, Clone, Debug, Default)]
pub struct LevelGeometry {
    colliders: Vec<Collider>,
    /// (node, collider it is attached under)
    ledges: Vec<(NodeId, ColliderId)>,
}

impl LevelGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider and return its handle
    pub fn add_collider(
        &mut self,
        name: &str,
        tag: ColliderTag,
        parent: Option<ColliderId>,
        center: Vec2,
        size: Vec2,
    ) -> ColliderId {
        let id = ColliderId(self.colliders.len());
        self.colliders.push(Collider {
            id,
            name: name.to_string(),
            tag,
            parent,
            center,
            size: size.abs(),
        });
        id
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id.0)
    }

    pub fn find_by_name(&self, name: &str) -> Option<ColliderId> {
        self.colliders.iter().find(|c| c.name == name).map(|c| c.id)
    }

    /// Attach the nodes of a graph to the colliders they are anchored under
    pub fn index_ledges(&mut self, graph: &LedgeGraph) {
        self.ledges = graph.nodes().iter().map(|n| (n.id, n.anchor)).collect();
    }

    /// Whether `collider` is `ancestor` or lies below it in the hierarchy
    pub fn is_within(&self, collider: ColliderId, ancestor: ColliderId) -> bool {
        let mut current = Some(collider);
        // Bounded walk so a malformed hierarchy cannot loop forever
        for _ in 0..=self.colliders.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.get(id).and_then(|c| c.parent),
                None => return false,
            }
        }
        false
    }

    /// Nodes attached at or below a collider
    fn nodes_under(&self, collider: ColliderId) -> Vec<NodeId> {
        self.ledges
            .iter()
            .filter(|(_, anchor)| self.is_within(*anchor, collider))
            .map(|(node, _)| *node)
            .collect()
    }
}

impl TerrainQuery for LevelGeometry {
    fn probe_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<ProbeHit> {
        let direction = direction.try_normalize()?;
        self.colliders
            .iter()
            .filter_map(|c| {
                let t = c.ray_entry(origin, direction)?;
                (t <= max_distance).then_some((t, c.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, id)| ProbeHit {
                point: origin + direction * t,
                collider: id,
                distance: t,
            })
    }
}

impl PlatformLookup for LevelGeometry {
    fn nodes_on_platform(&self, collider: ColliderId) -> Vec<NodeId> {
        let Some(hit) = self.get(collider) else {
            return Vec::new();
        };

        let nodes = match (hit.tag, hit.parent) {
            (ColliderTag::Ledge, Some(parent)) => self.nodes_under(parent),
            _ => self.nodes_under(collider),
        };

        match (nodes.is_empty(), hit.parent) {
            (true, Some(parent)) => self.nodes_under(parent),
            _ => nodes,
        }
    }

    fn ground_of(&self, collider: ColliderId) -> Option<ColliderId> {
        let mut current = Some(collider);
        for _ in 0..=self.colliders.len() {
            let c = self.get(current?)?;
            if c.tag == ColliderTag::Ground {
                return Some(c.id);
            }
            current = c.parent;
        }
        None
    }

    fn platform_center(&self, platform: ColliderId) -> Option<Vec2> {
        self.get(platform).map(|c| c.center)
    }
}
