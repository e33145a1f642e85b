//! Ledge graph - level-scoped traversal graph for AI routing
//!
//! Each ledge node marks a grabbable platform edge. The graph is built once per
//! level, runs an all-pairs shortest path pass (Floyd-Warshall) and is then
//! shared read-only by every agent in that level.

use std::sync::Arc;

use bevy::prelude::*;

use crate::world::ColliderId;

/// Dense index of a ledge node within its level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Identity of a level (graphs are cached per identity)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LevelId(pub String);

impl LevelId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authoring-side description of a ledge node, as placed in the level
#[derive(Clone, Debug)]
pub struct LedgeNodeDef {
    pub name: String,
    pub position: Vec2,
    /// Collider the node is attached under
    pub anchor: ColliderId,
    /// Ground platform that owns the node
    pub platform: Option<ColliderId>,
    /// Names of adjacent nodes
    pub links: Vec<String>,
}

/// A node in the ledge graph
#[derive(Clone, Debug)]
pub struct LedgeNode {
    pub id: NodeId,
    pub name: String,
    pub position: Vec2,
    pub anchor: ColliderId,
    pub platform: Option<ColliderId>,
    /// Adjacent nodes with their Euclidean edge weight
    pub neighbors: Vec<(NodeId, f32)>,
}

/// Static traversal graph plus its precomputed shortest-path tables
#[derive(Clone, Debug, Default)]
pub struct LedgeGraph {
    nodes: Vec<LedgeNode>,
    /// Row-major N×N shortest distances
    dist: Vec<f32>,
    /// Row-major N×N next hop on the shortest path (None = unreachable)
    next: Vec<Option<NodeId>>,
}

impl LedgeGraph {
    /// Build the graph from the level's node list and precompute all routes
    pub fn build(defs: &[LedgeNodeDef]) -> Self {
        let mut nodes: Vec<LedgeNode> = defs
            .iter()
            .enumerate()
            .map(|(i, def)| LedgeNode {
                id: NodeId(i),
                name: def.name.clone(),
                position: def.position,
                anchor: def.anchor,
                platform: def.platform,
                neighbors: Vec::new(),
            })
            .collect();

        for (i, def) in defs.iter().enumerate() {
            for link in &def.links {
                let Some(j) = defs.iter().position(|d| d.name == *link) else {
                    warn!("Ledge node '{}' links to unknown node '{}'", def.name, link);
                    continue;
                };
                if i == j {
                    continue;
                }
                // Adjacency is undirected regardless of which side declared it
                let weight = nodes[i].position.distance(nodes[j].position);
                if !nodes[i].neighbors.iter().any(|(n, _)| n.0 == j) {
                    nodes[i].neighbors.push((NodeId(j), weight));
                }
                if !nodes[j].neighbors.iter().any(|(n, _)| n.0 == i) {
                    nodes[j].neighbors.push((NodeId(i), weight));
                }
            }
        }

        let mut graph = Self {
            nodes,
            dist: Vec::new(),
            next: Vec::new(),
        };
        graph.precompute();
        graph
    }

    /// All-pairs shortest paths (Floyd-Warshall). O(n³), run once per level.
    fn precompute(&mut self) {
        let n = self.nodes.len();
        self.dist = vec![f32::INFINITY; n * n];
        self.next = vec![None; n * n];

        for node in &self.nodes {
            let i = node.id.0;
            self.dist[i * n + i] = 0.0;
            self.next[i * n + i] = Some(node.id);
            for &(neighbor, weight) in &node.neighbors {
                self.dist[i * n + neighbor.0] = weight;
                self.next[i * n + neighbor.0] = Some(neighbor);
            }
        }

        for k in 0..n {
            for i in 0..n {
                let dik = self.dist[i * n + k];
                if dik == f32::INFINITY {
                    continue;
                }
                for j in 0..n {
                    let through_k = dik + self.dist[k * n + j];
                    if through_k < self.dist[i * n + j] {
                        self.dist[i * n + j] = through_k;
                        self.next[i * n + j] = self.next[i * n + k];
                    }
                }
            }
        }
    }

    pub fn nodes(&self) -> &[LedgeNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&LedgeNode> {
        self.nodes.get(id.0)
    }

    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        self.node(id).map(|n| n.position)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbors.len()).sum::<usize>() / 2
    }

    fn index(&self, from: NodeId, to: NodeId) -> Option<usize> {
        let n = self.nodes.len();
        (from.0 < n && to.0 < n).then_some(from.0 * n + to.0)
    }

    /// Shortest route distance between two nodes (infinite when unreachable)
    pub fn distance(&self, from: NodeId, to: NodeId) -> f32 {
        self.index(from, to)
            .map(|idx| self.dist[idx])
            .unwrap_or(f32::INFINITY)
    }

    /// Shortest path from `start` to `end`, both inclusive.
    ///
    /// Empty when either endpoint is missing or `end` is unreachable.
    pub fn get_path(&self, start: Option<NodeId>, end: Option<NodeId>) -> Vec<NodeId> {
        let (Some(start), Some(end)) = (start, end) else {
            return Vec::new();
        };
        let Some(idx) = self.index(start, end) else {
            return Vec::new();
        };
        if self.next[idx].is_none() {
            return Vec::new();
        }

        let mut path = vec![start];
        let mut current = start;
        while current != end {
            let Some(step) = self.index(current, end).and_then(|i| self.next[i]) else {
                // Tables are consistent after precompute; bail out rather than loop
                return Vec::new();
            };
            current = step;
            path.push(current);
            if path.len() > self.nodes.len() {
                return Vec::new();
            }
        }
        path
    }

    /// Summed edge length of a path
    pub fn path_length(&self, path: &[NodeId]) -> f32 {
        path.windows(2)
            .map(|pair| match (self.position(pair[0]), self.position(pair[1])) {
                (Some(a), Some(b)) => a.distance(b),
                _ => f32::INFINITY,
            })
            .sum()
    }
}

/// Level-scoped cache of the active level's ledge graph.
///
/// Lives as a resource of the world that owns the level; a graph is built only
/// when the requested level differs from the cached one.
#[derive(Resource, Default)]
pub struct LedgeGraphRegistry {
    active: Option<(LevelId, Arc<LedgeGraph>)>,
    builds: u32,
}

impl LedgeGraphRegistry {
    /// Graph for `level`, building it from `nodes` if another level (or none) is cached
    pub fn get_or_build<F>(&mut self, level: &LevelId, nodes: F) -> Arc<LedgeGraph>
    where
        F: FnOnce() -> Vec<LedgeNodeDef>,
    {
        if let Some((cached, graph)) = &self.active {
            if cached == level {
                return Arc::clone(graph);
            }
        }

        let graph = Arc::new(LedgeGraph::build(&nodes()));
        self.builds += 1;
        info!(
            "Ledge graph built for level {}: {} nodes, {} edges",
            level,
            graph.len(),
            graph.edge_count()
        );
        for node in graph.nodes() {
            debug!(
                "  Node {} '{}' @ ({:.2}, {:.2}) -> {:?}",
                node.id.0,
                node.name,
                node.position.x,
                node.position.y,
                node.neighbors.iter().map(|(n, _)| n.0).collect::<Vec<_>>()
            );
        }

        self.active = Some((level.clone(), Arc::clone(&graph)));
        graph
    }

    /// The cached graph, if any
    pub fn current(&self) -> Option<&Arc<LedgeGraph>> {
        self.active.as_ref().map(|(_, graph)| graph)
    }

    pub fn current_level(&self) -> Option<&LevelId> {
        self.active.as_ref().map(|(level, _)| level)
    }

    pub fn is_cached(&self, level: &LevelId) -> bool {
        self.current_level() == Some(level)
    }

    /// Drop the cached graph (level unloaded)
    pub fn discard(&mut self) {
        self.active = None;
    }

    /// Number of graph constructions so far
    pub fn builds(&self) -> u32 {
        self.builds
    }
}
