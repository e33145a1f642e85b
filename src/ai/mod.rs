//! AI module - ledge routing and the per-tick combat policy

mod ledge_graph;
mod pathfinding;
mod policy;
mod profiles;
mod rush;

pub use ledge_graph::*;
pub use pathfinding::*;
pub use policy::*;
pub use profiles::*;
pub use rush::*;

use bevy::prelude::*;

use crate::levels::CurrentLevel;
use crate::player::{CombatTarget, Facing, Health, Player, Position, Sliding, Velocity};
use crate::world::LevelGeometry;

/// Marker for bodies whose motion intent comes from an AgentPolicy
#[derive(Component, Default)]
pub struct Agent;

/// Target facts read straight from the ECS
struct TargetRef<'a> {
    position: &'a Position,
    health: Option<&'a Health>,
    kind: Option<&'a TargetKind>,
}

impl OpponentProvider for TargetRef<'_> {
    fn position(&self) -> Vec2 {
        self.position.0
    }

    fn health(&self) -> Option<f32> {
        self.health.map(|h| h.0)
    }

    fn kind(&self) -> TargetKind {
        self.kind.copied().unwrap_or_default()
    }
}

/// Build (or reuse) the ledge graph of the current level and attach its nodes
/// to the level geometry. Runs before ai_policy_update.
pub fn sync_ledge_graph(
    level: Option<Res<CurrentLevel>>,
    mut registry: ResMut<LedgeGraphRegistry>,
    mut geometry: ResMut<LevelGeometry>,
) {
    let Some(level) = level else {
        return;
    };

    let level_changed = !registry.is_cached(&level.id);
    if !level_changed && !geometry.is_changed() {
        return;
    }

    let graph = registry.get_or_build(&level.id, || level.nodes.clone());
    geometry.index_ledges(&graph);
}

/// Run every agent's policy for this tick and store the resulting intent.
/// Agents without a target, or whose target is gone, get an empty target.
pub fn ai_policy_update(
    time: Res<Time>,
    registry: Res<LedgeGraphRegistry>,
    geometry: Res<LevelGeometry>,
    mut agents: Query<
        (
            &mut AgentPolicy,
            &mut MotionIntent,
            &Position,
            &Velocity,
            &Facing,
            &Sliding,
            &CombatTarget,
        ),
        (With<Agent>, With<Player>),
    >,
    targets: Query<(&Position, Option<&Health>, Option<&TargetKind>)>,
) {
    let empty = LedgeGraph::default();
    let graph = registry.current().map(|g| g.as_ref()).unwrap_or(&empty);
    let ctx = TickContext::new(time.delta_secs(), graph, &*geometry, &*geometry);

    for (mut policy, mut intent, position, velocity, facing, sliding, target) in &mut agents {
        let view = AgentView {
            position: position.0,
            velocity: velocity.0,
            facing_right: facing.is_right(),
            sliding: sliding.0,
        };

        let target_ref = target
            .0
            .and_then(|e| targets.get(e).ok())
            .map(|(position, health, kind)| TargetRef {
                position,
                health,
                kind,
            });

        drive(
            &mut *policy,
            &ctx,
            &view,
            target_ref.as_ref().map(|t| t as &dyn OpponentProvider),
            &mut *intent,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{LevelDatabase, build_level, install_level};
    use crate::player::body_bundle;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn ai_app(level: &str) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            1.0 / 60.0,
        )));
        app.init_resource::<LedgeGraphRegistry>();
        let db = LevelDatabase::default_levels();
        let loaded = build_level(db.get_by_name(level).unwrap()).unwrap();
        install_level(app.world_mut(), loaded);
        app.add_systems(Update, (sync_ledge_graph, ai_policy_update).chain());
        app
    }

    #[test]
    fn test_graph_built_once_per_level() {
        let mut app = ai_app("Shelves");
        for _ in 0..5 {
            app.update();
        }
        let registry = app.world().resource::<LedgeGraphRegistry>();
        assert_eq!(registry.builds(), 1);
        assert_eq!(registry.current().map(|g| g.len()), Some(6));

        let db = LevelDatabase::default_levels();
        let flat = build_level(db.get_by_name("Flat").unwrap()).unwrap();
        install_level(app.world_mut(), flat);
        app.update();
        app.update();
        let registry = app.world().resource::<LedgeGraphRegistry>();
        assert_eq!(registry.builds(), 2);
        assert_eq!(registry.current_level(), Some(&LevelId::new("Flat")));
    }

    #[test]
    fn test_agents_chase_their_target() {
        let mut app = ai_app("Flat");
        let target = app
            .world_mut()
            .spawn((body_bundle(Vec2::new(10.0, 0.0)), Health(3.0)))
            .id();
        let agent = app
            .world_mut()
            .spawn((
                body_bundle(Vec2::new(-10.0, 0.0)),
                Agent,
                AgentPolicy::Rush(RushPolicy::new(4.0)),
                CombatTarget(Some(target)),
            ))
            .id();
        app.update();
        app.update();

        let intent = app.world().get::<MotionIntent>(agent).unwrap();
        assert!(intent.desired_horizontal_speed > 0.0);

        // Defeated target: the agent stops
        app.world_mut().get_mut::<Health>(target).unwrap().0 = 0.0;
        app.update();
        let intent = app.world().get::<MotionIntent>(agent).unwrap();
        assert_eq!(intent.desired_horizontal_speed, 0.0);

        // Despawned target behaves like no target
        app.world_mut().get_mut::<Health>(target).unwrap().0 = 3.0;
        app.world_mut().despawn(target);
        app.update();
        let intent = app.world().get::<MotionIntent>(agent).unwrap();
        assert_eq!(intent.desired_horizontal_speed, 0.0);
    }
}
