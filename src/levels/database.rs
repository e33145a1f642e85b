//! Level database - parsing and storage

use bevy::prelude::*;
use std::fs;

use crate::constants::*;
use crate::world::ColliderTag;

/// Collider box in level data. Parents must be declared before their children.
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderDef {
    pub name: String,
    pub tag: ColliderTag,
    pub parent: Option<String>,
    pub center: Vec2,
    pub size: Vec2,
}

/// Ledge node in level data
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDef {
    pub name: String,
    /// Collider the node is attached under
    pub anchor: String,
    pub position: Vec2,
    /// Names of linked nodes (links are undirected)
    pub links: Vec<String>,
}

/// Single level definition
#[derive(Clone, Debug, PartialEq)]
pub struct LevelData {
    pub name: String,
    /// Bodies below this height are out of the level
    pub kill_y: f32,
    pub spawns: Vec<Vec2>,
    pub colliders: Vec<ColliderDef>,
    pub nodes: Vec<NodeDef>,
}

impl LevelData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kill_y: DEFAULT_KILL_Y,
            spawns: Vec::new(),
            colliders: Vec::new(),
            nodes: Vec::new(),
        }
    }

    fn with_collider(
        mut self,
        name: &str,
        tag: ColliderTag,
        parent: Option<&str>,
        center: (f32, f32),
        size: (f32, f32),
    ) -> Self {
        self.colliders.push(ColliderDef {
            name: name.to_string(),
            tag,
            parent: parent.map(str::to_string),
            center: Vec2::new(center.0, center.1),
            size: Vec2::new(size.0, size.1),
        });
        self
    }

    fn with_node(mut self, name: &str, anchor: &str, x: f32, y: f32, links: &[&str]) -> Self {
        self.nodes.push(NodeDef {
            name: name.to_string(),
            anchor: anchor.to_string(),
            position: Vec2::new(x, y),
            links: links.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Spawn point for the nth body, wrapping around (origin if none are defined)
    pub fn spawn_point(&self, index: usize) -> Vec2 {
        if self.spawns.is_empty() {
            return Vec2::ZERO;
        }
        self.spawns[index % self.spawns.len()]
    }
}

/// Database of all loaded levels
#[derive(Resource, Clone, Debug, Default)]
pub struct LevelDatabase {
    pub levels: Vec<LevelData>,
}

impl LevelDatabase {
    /// Load levels from file, returns default hardcoded levels on error
    pub fn load_from_file(path: &str) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!("Failed to load levels from {}: {}, using defaults", path, e);
                Self::default_levels()
            }
        }
    }

    /// Parse level data from string
    pub fn parse(content: &str) -> Self {
        let mut levels = Vec::new();
        let mut current_level: Option<LevelData> = None;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix("level:") {
                if let Some(level) = current_level.take() {
                    levels.push(level);
                }
                current_level = Some(LevelData::new(name.trim()));
                continue;
            }

            let Some(level) = current_level.as_mut() else {
                warn!("Line {}: '{}' outside of a level block", line_no + 1, line);
                continue;
            };

            if let Err(e) = parse_line(level, line) {
                warn!("Line {}: {} (in level {})", line_no + 1, e, level.name);
            }
        }

        // Don't forget the last level
        if let Some(level) = current_level {
            levels.push(level);
        }

        if levels.is_empty() {
            warn!("No levels parsed, using defaults");
            return Self::default_levels();
        }

        info!("Loaded {} levels from file", levels.len());
        Self { levels }
    }

    /// Hardcoded fallback levels
    pub fn default_levels() -> Self {
        let flat = LevelData {
            kill_y: -20.0,
            spawns: vec![Vec2::new(-8.0, 0.0), Vec2::new(8.0, 0.0)],
            ..LevelData::new("Flat")
        }
        .with_collider("floor", ColliderTag::Ground, None, (0.0, -0.5), (30.0, 1.0))
        .with_node("floor_w", "floor", -14.5, 0.0, &["floor_e"])
        .with_node("floor_e", "floor", 14.5, 0.0, &[]);

        let shelves = LevelData {
            kill_y: -20.0,
            spawns: vec![Vec2::new(-12.0, 0.0), Vec2::new(7.0, 2.5)],
            ..LevelData::new("Shelves")
        }
        .with_collider("floor", ColliderTag::Ground, None, (0.0, -0.5), (30.0, 1.0))
        .with_collider("shelf_w", ColliderTag::Ground, None, (-7.0, 2.25), (6.0, 0.5))
        .with_collider("shelf_e", ColliderTag::Ground, None, (7.0, 2.25), (6.0, 0.5))
        .with_collider("lip_w", ColliderTag::Ledge, Some("shelf_w"), (-4.1, 2.4), (0.2, 0.2))
        .with_collider("lip_e", ColliderTag::Ledge, Some("shelf_e"), (4.1, 2.4), (0.2, 0.2))
        .with_node("floor_w", "floor", -3.0, 0.0, &["floor_e", "shelf_w_in"])
        .with_node("floor_e", "floor", 3.0, 0.0, &["shelf_e_in"])
        .with_node("shelf_w_in", "lip_w", -4.0, 2.5, &["shelf_w_out"])
        .with_node("shelf_w_out", "shelf_w", -10.0, 2.5, &[])
        .with_node("shelf_e_in", "lip_e", 4.0, 2.5, &["shelf_e_out"])
        .with_node("shelf_e_out", "shelf_e", 10.0, 2.5, &[]);

        Self {
            levels: vec![flat, shelves],
        }
    }

    /// Get level by index
    pub fn get(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index)
    }

    /// Get level by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Option<&LevelData> {
        self.levels
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.levels.iter().map(|l| l.name.as_str()).collect()
    }

    /// Get number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

fn parse_floats(parts: &[&str]) -> Result<Vec<f32>, String> {
    parts
        .iter()
        .map(|p| p.parse::<f32>().map_err(|_| format!("bad number '{}'", p)))
        .collect()
}

/// Apply one `key: values` line to a level
fn parse_line(level: &mut LevelData, line: &str) -> Result<(), String> {
    let (key, rest) = line
        .split_once(':')
        .ok_or_else(|| format!("expected 'key: value', got '{}'", line))?;
    let parts: Vec<&str> = rest.split_whitespace().collect();

    match key.trim() {
        "kill_y" => {
            let v = parse_floats(&parts)?;
            level.kill_y = *v.first().ok_or("kill_y needs a value")?;
        }
        "spawn" => {
            if parts.len() != 2 {
                return Err("spawn needs x y".to_string());
            }
            let v = parse_floats(&parts)?;
            level.spawns.push(Vec2::new(v[0], v[1]));
        }
        "ground" => {
            if parts.len() != 5 && parts.len() != 6 {
                return Err("ground needs name cx cy w h [parent]".to_string());
            }
            let v = parse_floats(&parts[1..5])?;
            level.colliders.push(ColliderDef {
                name: parts[0].to_string(),
                tag: ColliderTag::Ground,
                parent: parts.get(5).map(|p| p.to_string()),
                center: Vec2::new(v[0], v[1]),
                size: Vec2::new(v[2], v[3]),
            });
        }
        key @ ("ledge" | "block") => {
            if parts.len() != 6 {
                return Err(format!("{} needs name parent cx cy w h", key));
            }
            let v = parse_floats(&parts[2..6])?;
            let tag = if key == "ledge" {
                ColliderTag::Ledge
            } else {
                ColliderTag::Untagged
            };
            // '-' marks a block without a parent
            let parent = match parts[1] {
                "-" if tag == ColliderTag::Untagged => None,
                "-" => return Err("ledge markers need a parent".to_string()),
                p => Some(p.to_string()),
            };
            level.colliders.push(ColliderDef {
                name: parts[0].to_string(),
                tag,
                parent,
                center: Vec2::new(v[0], v[1]),
                size: Vec2::new(v[2], v[3]),
            });
        }
        "node" => {
            if parts.len() < 4 {
                return Err("node needs name anchor x y [neighbor ...]".to_string());
            }
            let v = parse_floats(&parts[2..4])?;
            level.nodes.push(NodeDef {
                name: parts[0].to_string(),
                anchor: parts[1].to_string(),
                position: Vec2::new(v[0], v[1]),
                links: parts[4..].iter().map(|s| s.to_string()).collect(),
            });
        }
        other => return Err(format!("unknown key '{}'", other)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# two platforms
level: Sample
kill_y: -12
spawn: -4 0
spawn: 4 0
ground: floor 0 -0.5 20 1
ground: shelf 0 2.75 4 0.5
ledge: lip shelf 1.9 3.1 0.2 0.2
block: crate - 6 0.5 1 1
node: a floor -10 0 b
node: b shelf -2 3

level: Empty
";

    #[test]
    fn test_parse_levels() {
        let db = LevelDatabase::parse(SAMPLE);
        assert_eq!(db.len(), 2);

        let level = db.get_by_name("sample").unwrap();
        assert_eq!(level.kill_y, -12.0);
        assert_eq!(level.spawns, vec![Vec2::new(-4.0, 0.0), Vec2::new(4.0, 0.0)]);
        assert_eq!(level.colliders.len(), 4);
        assert_eq!(level.colliders[2].tag, ColliderTag::Ledge);
        assert_eq!(level.colliders[2].parent.as_deref(), Some("shelf"));
        assert_eq!(level.colliders[3].parent, None);
        assert_eq!(level.nodes[0].links, vec!["b".to_string()]);
        assert!(level.nodes[1].links.is_empty());

        let empty = db.get(1).unwrap();
        assert_eq!(empty.kill_y, DEFAULT_KILL_Y);
        assert_eq!(empty.spawn_point(3), Vec2::ZERO);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let db = LevelDatabase::parse(
            "level: Broken\nground: floor 0 x 20 1\nspawn: 1\nnode: a floor 0\nwobble: 3\nground: ok 0 0 2 2\n",
        );
        let level = db.get(0).unwrap();
        assert_eq!(level.colliders.len(), 1);
        assert_eq!(level.colliders[0].name, "ok");
        assert!(level.spawns.is_empty());
        assert!(level.nodes.is_empty());
    }

    #[test]
    fn test_ledge_requires_parent() {
        let db = LevelDatabase::parse("level: L\nledge: lip - 0 0 1 1\n");
        assert!(db.get(0).unwrap().colliders.is_empty());
    }

    #[test]
    fn test_empty_content_uses_defaults() {
        let db = LevelDatabase::parse("# nothing here\n");
        assert_eq!(db.names(), vec!["Flat", "Shelves"]);
    }

    #[test]
    fn test_spawn_point_wraps() {
        let db = LevelDatabase::default_levels();
        let flat = db.get(0).unwrap();
        assert_eq!(flat.spawn_point(2), flat.spawn_point(0));
    }
}
