//! Arenabot - ledge-routing combat AI for 2D platform arenas, built on Bevy
//!
//! This crate provides the routing graph, the rush policy, a small character
//! controller to drive it, and headless tools to simulate and test agents.

// Core modules
pub mod constants;
pub mod helpers;
pub mod simulation;
pub mod testing;

// Game logic modules
pub mod ai;
pub mod levels;
pub mod player;
pub mod world;

// Re-export commonly used types for convenience
pub use ai::{
    AI_PROFILES_FILE, Actuation, Agent, AgentPolicy, AgentView, AiProfile, AiProfileDatabase,
    LedgeGraph, LedgeGraphRegistry, LedgeNodeDef, LevelId, MotionIntent, NodeId, OpponentProvider,
    PathPlanner, Policy, RushPolicy, TargetKind, TargetView, TickContext, ai_policy_update, drive,
    sync_ledge_graph,
};
pub use constants::*;
pub use helpers::*;
pub use levels::{CurrentLevel, LevelData, LevelDatabase, LoadedLevel, build_level, install_level};
pub use player::{
    CombatTarget, Facing, Grounded, Health, MotionStats, Player, Position, Sliding, SpawnPoint,
    Velocity,
};
pub use world::{
    Collider, ColliderId, ColliderTag, LevelGeometry, PlatformLookup, ProbeHit, TerrainQuery,
};
