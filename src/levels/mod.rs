//! Levels module - database, building, and the active level

mod database;
mod spawning;

pub use database::*;
pub use spawning::*;

use bevy::prelude::*;

use crate::ai::{LedgeNodeDef, LevelId};

/// The level bodies currently play in
#[derive(Resource, Clone, Debug)]
pub struct CurrentLevel {
    pub id: LevelId,
    /// Node definitions the ledge graph is built from
    pub nodes: Vec<LedgeNodeDef>,
    pub spawns: Vec<Vec2>,
    pub kill_y: f32,
}

impl CurrentLevel {
    /// Spawn point for the nth body, wrapping around (origin if none are defined)
    pub fn spawn_point(&self, index: usize) -> Vec2 {
        if self.spawns.is_empty() {
            return Vec2::ZERO;
        }
        self.spawns[index % self.spawns.len()]
    }
}

/// Make a built level the active one: its geometry and its identity
pub fn install_level(world: &mut World, level: LoadedLevel) {
    info!(
        "Installing level {} ({} colliders, {} ledge nodes)",
        level.id,
        level.geometry.colliders().len(),
        level.nodes.len()
    );
    world.insert_resource(level.geometry);
    world.insert_resource(CurrentLevel {
        id: level.id,
        nodes: level.nodes,
        spawns: level.spawns,
        kill_y: level.kill_y,
    });
}
