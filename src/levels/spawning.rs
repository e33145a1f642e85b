//! Turning level data into the runtime world model

use bevy::prelude::*;

use crate::ai::{LedgeNodeDef, LevelId};
use crate::levels::database::LevelData;
use crate::world::{LevelGeometry, PlatformLookup};

/// A level resolved into geometry and ledge node definitions
#[derive(Clone, Debug)]
pub struct LoadedLevel {
    pub id: LevelId,
    pub geometry: LevelGeometry,
    pub nodes: Vec<LedgeNodeDef>,
    pub spawns: Vec<Vec2>,
    pub kill_y: f32,
}

/// Resolve collider parents and node anchors by name
pub fn build_level(level: &LevelData) -> Result<LoadedLevel, String> {
    let mut geometry = LevelGeometry::new();

    for def in &level.colliders {
        if geometry.find_by_name(&def.name).is_some() {
            return Err(format!(
                "Level {}: duplicate collider '{}'",
                level.name, def.name
            ));
        }
        let parent = match &def.parent {
            Some(name) => Some(geometry.find_by_name(name).ok_or_else(|| {
                format!(
                    "Level {}: collider '{}' has unknown parent '{}'",
                    level.name, def.name, name
                )
            })?),
            None => None,
        };
        geometry.add_collider(&def.name, def.tag, parent, def.center, def.size);
    }

    let mut nodes = Vec::with_capacity(level.nodes.len());
    for def in &level.nodes {
        if nodes.iter().any(|n: &LedgeNodeDef| n.name == def.name) {
            return Err(format!("Level {}: duplicate node '{}'", level.name, def.name));
        }
        let anchor = geometry.find_by_name(&def.anchor).ok_or_else(|| {
            format!(
                "Level {}: node '{}' has unknown anchor '{}'",
                level.name, def.name, def.anchor
            )
        })?;
        let platform = geometry.ground_of(anchor);
        if platform.is_none() {
            warn!(
                "Level {}: node '{}' is not under a ground collider",
                level.name, def.name
            );
        }
        nodes.push(LedgeNodeDef {
            name: def.name.clone(),
            position: def.position,
            anchor,
            platform,
            links: def.links.clone(),
        });
    }

    Ok(LoadedLevel {
        id: LevelId::new(&level.name),
        geometry,
        nodes,
        spawns: level.spawns.clone(),
        kill_y: level.kill_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LedgeGraph;
    use crate::levels::LevelDatabase;

    #[test]
    fn test_build_default_levels() {
        let db = LevelDatabase::default_levels();
        for level in &db.levels {
            let loaded = build_level(level).unwrap();
            assert_eq!(loaded.nodes.len(), level.nodes.len());
            assert!(loaded.nodes.iter().all(|n| n.platform.is_some()));
            let graph = LedgeGraph::build(&loaded.nodes);
            assert_eq!(graph.len(), level.nodes.len());
        }
    }

    #[test]
    fn test_ledge_node_resolves_to_parent_platform() {
        let db = LevelDatabase::default_levels();
        let loaded = build_level(db.get_by_name("Shelves").unwrap()).unwrap();
        let shelf = loaded.geometry.find_by_name("shelf_w").unwrap();
        let node = loaded
            .nodes
            .iter()
            .find(|n| n.name == "shelf_w_in")
            .unwrap();
        assert_eq!(node.platform, Some(shelf));
        assert_ne!(node.anchor, shelf);
    }

    #[test]
    fn test_unknown_references_are_errors() {
        let level = LevelDatabase::parse("level: Bad\nground: floor 0 0 10 1 nowhere\n");
        let err = build_level(level.get(0).unwrap()).unwrap_err();
        assert!(err.contains("unknown parent"));

        let level = LevelDatabase::parse("level: Bad\nground: floor 0 0 10 1\nnode: a roof 0 0\n");
        let err = build_level(level.get(0).unwrap()).unwrap_err();
        assert!(err.contains("unknown anchor"));
    }

    #[test]
    fn test_duplicate_names_are_errors() {
        let level =
            LevelDatabase::parse("level: Dup\nground: floor 0 0 10 1\nground: floor 0 5 10 1\n");
        assert!(build_level(level.get(0).unwrap()).is_err());
    }
}
