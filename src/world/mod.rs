//! World queries consumed by the AI: terrain probes and the platform hierarchy

mod geometry;

pub use geometry::*;

use bevy::prelude::*;

use crate::ai::NodeId;

/// Stable handle of a collider within its level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub usize);

/// Tag carried by a collider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColliderTag {
    /// A platform ledge nodes attach to
    Ground,
    /// Grab marker along a platform edge (its parent owns the nodes)
    Ledge,
    #[default]
    Untagged,
}

/// Result of a terrain probe
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub point: Vec2,
    pub collider: ColliderId,
    pub distance: f32,
}

/// Point and ray queries against level terrain
pub trait TerrainQuery {
    /// First terrain hit along `direction` within `max_distance` of `origin`
    fn probe_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<ProbeHit>;

    /// First terrain hit straight below `origin`
    fn probe_down(&self, origin: Vec2, max_distance: f32) -> Option<ProbeHit> {
        self.probe_ray(origin, Vec2::NEG_Y, max_distance)
    }
}

/// Queries over the collider hierarchy and the ledge nodes attached to it
pub trait PlatformLookup {
    /// Ledge nodes belonging to the platform a collider is part of.
    ///
    /// Ledge-tagged colliders resolve through their parent; a collider with no
    /// nodes falls back to its parent group.
    fn nodes_on_platform(&self, collider: ColliderId) -> Vec<NodeId>;

    /// Nearest ground-tagged collider at or above `collider` in the hierarchy
    fn ground_of(&self, collider: ColliderId) -> Option<ColliderId>;

    /// Center of a platform's collider box
    fn platform_center(&self, platform: ColliderId) -> Option<Vec2>;
}
