//! Player physics systems
//!
//! A small kinematic controller: motion intents set target velocities, gravity
//! pulls, and bodies are pushed out of level boxes along the axis of least
//! overlap.

use bevy::prelude::*;

use crate::ai::MotionIntent;
use crate::constants::*;
use crate::helpers::{box_overlap, move_toward};
use crate::levels::CurrentLevel;
use crate::player::components::*;
use crate::world::{ColliderTag, LevelGeometry};

/// Components every controller-driven body carries
pub fn body_bundle(position: Vec2) -> impl Bundle {
    (
        Player,
        Position(position),
        Velocity::default(),
        Grounded(false),
        Facing::default(),
        Sliding::default(),
        SpawnPoint(position),
        MotionStats::default(),
        MotionIntent::default(),
    )
}

/// Turn each body's motion intent into velocity, facing, slide and jumps
pub fn apply_intent(
    mut players: Query<
        (
            &MotionIntent,
            &mut Velocity,
            &mut Facing,
            &mut Sliding,
            &Grounded,
            &mut MotionStats,
        ),
        With<Player>,
    >,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (intent, mut velocity, mut facing, mut sliding, grounded, mut stats) in &mut players {
        let moving = intent.desired_horizontal_speed != 0.0;
        // A slide starts on the ground and lasts while the intent keeps it
        sliding.0 = intent.slide && moving && (sliding.0 || grounded.0);

        let boost = if sliding.0 { SLIDE_SPEED_MULT } else { 1.0 };
        let target_speed = intent.desired_horizontal_speed * MOVE_SPEED * boost;
        let rate = if grounded.0 { GROUND_ACCEL } else { AIR_ACCEL };
        velocity.0.x = move_toward(velocity.0.x, target_speed, rate * dt);

        facing.0 = if intent.facing_right { 1.0 } else { -1.0 };

        if intent.jump && grounded.0 {
            velocity.0.y = JUMP_VELOCITY;
            stats.jumps += 1;
        }
    }
}

/// Apply gravity to airborne bodies
pub fn apply_gravity(
    mut query: Query<(&mut Velocity, &Grounded), With<Player>>,
    time: Res<Time>,
) {
    for (mut velocity, grounded) in &mut query {
        if !grounded.0 {
            velocity.0.y -= GRAVITY * time.delta_secs();
        }
    }
}

/// Integrate velocity into position
pub fn apply_velocity(
    mut query: Query<(&mut Position, &Velocity, &mut MotionStats), With<Player>>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (mut position, velocity, mut stats) in &mut query {
        let step = velocity.0 * dt;
        position.0 += step;
        stats.distance += step.length();
    }
}

/// Push bodies out of level boxes and update grounded state.
/// Ledge markers are grab zones, not solid.
pub fn check_collisions(
    geometry: Res<LevelGeometry>,
    mut player_query: Query<(&mut Position, &mut Velocity, &mut Grounded), With<Player>>,
) {
    let half = AGENT_SIZE / 2.0;
    for (mut position, mut velocity, mut grounded) in &mut player_query {
        // Assume not grounded until we find a floor beneath us
        grounded.0 = false;

        for collider in geometry.colliders() {
            if collider.tag == ColliderTag::Ledge {
                continue;
            }
            let collider_half = collider.size / 2.0;
            let body_center = position.0 + Vec2::Y * half.y;
            let overlap = box_overlap(body_center, half, collider.center, collider_half);

            // No collision
            if overlap.x <= 0.0 || overlap.y <= 0.0 {
                continue;
            }

            let diff = body_center - collider.center;
            // Resolve collision along the smallest overlap axis
            if overlap.y < overlap.x {
                if diff.y > 0.0 {
                    // Land, staying EPSILON inside so the next frame still detects the floor
                    position.0.y = collider.top() - COLLISION_EPSILON;
                    if velocity.0.y <= 0.0 {
                        velocity.0.y = 0.0;
                        grounded.0 = true;
                    }
                } else {
                    // Ceiling
                    position.0.y = collider.min().y - AGENT_SIZE.y + COLLISION_EPSILON;
                    if velocity.0.y > 0.0 {
                        velocity.0.y = 0.0;
                    }
                }
            } else if diff.x > 0.0 {
                position.0.x = collider.max().x + half.x - COLLISION_EPSILON;
            } else {
                position.0.x = collider.min().x - half.x + COLLISION_EPSILON;
            }
        }
    }
}

/// Return bodies that fell below the kill plane to their spawn point
pub fn respawn_fallen(
    level: Res<CurrentLevel>,
    mut query: Query<
        (
            Entity,
            &mut Position,
            &mut Velocity,
            &SpawnPoint,
            &mut MotionStats,
        ),
        With<Player>,
    >,
) {
    for (entity, mut position, mut velocity, spawn, mut stats) in &mut query {
        if position.0.y >= level.kill_y {
            continue;
        }
        debug!(
            "{:?} fell out of {} at x={:.1}, respawning",
            entity, level.id, position.0.x
        );
        position.0 = spawn.0;
        velocity.0 = Vec2::ZERO;
        stats.falls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LevelId;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn physics_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            1.0 / 60.0,
        )));
        let mut geometry = LevelGeometry::new();
        geometry.add_collider(
            "floor",
            ColliderTag::Ground,
            None,
            Vec2::new(0.0, -0.5),
            Vec2::new(20.0, 1.0),
        );
        app.insert_resource(geometry);
        app.insert_resource(CurrentLevel {
            id: LevelId::new("physics"),
            nodes: Vec::new(),
            spawns: vec![Vec2::ZERO],
            kill_y: -10.0,
        });
        app.add_systems(
            Update,
            (
                apply_intent,
                apply_gravity,
                apply_velocity,
                check_collisions,
                respawn_fallen,
            )
                .chain(),
        );
        app
    }

    fn run(app: &mut App, frames: usize) {
        for _ in 0..frames {
            app.update();
        }
    }

    #[test]
    fn test_body_lands_on_floor() {
        let mut app = physics_app();
        let body = app.world_mut().spawn(body_bundle(Vec2::new(0.0, 3.0))).id();
        run(&mut app, 120);

        let world = app.world();
        assert!(world.get::<Grounded>(body).unwrap().0);
        let y = world.get::<Position>(body).unwrap().0.y;
        assert!(y.abs() < 0.05, "feet at {}", y);
    }

    #[test]
    fn test_intent_moves_and_jumps() {
        let mut app = physics_app();
        let body = app.world_mut().spawn(body_bundle(Vec2::ZERO)).id();
        run(&mut app, 30);

        app.world_mut().entity_mut(body).insert(MotionIntent {
            desired_horizontal_speed: 1.0,
            jump: true,
            slide: false,
            facing_right: true,
        });
        run(&mut app, 10);

        let world = app.world();
        let position = world.get::<Position>(body).unwrap().0;
        assert!(position.x > 0.1);
        assert!(position.y > 0.5);
        assert!(world.get::<MotionStats>(body).unwrap().jumps >= 1);
        assert!(world.get::<Facing>(body).unwrap().is_right());
    }

    #[test]
    fn test_wall_blocks_horizontal_motion() {
        let mut app = physics_app();
        app.world_mut()
            .resource_mut::<LevelGeometry>()
            .add_collider("wall", ColliderTag::Untagged, None, Vec2::new(2.0, 2.0), Vec2::new(1.0, 4.0));
        let body = app.world_mut().spawn(body_bundle(Vec2::ZERO)).id();
        app.world_mut().entity_mut(body).insert(MotionIntent {
            desired_horizontal_speed: 1.0,
            facing_right: true,
            ..default()
        });
        run(&mut app, 120);

        let x = app.world().get::<Position>(body).unwrap().0.x;
        assert!(x < 1.5 - AGENT_SIZE.x / 2.0 + 0.05, "body at {}", x);
    }

    #[test]
    fn test_fall_below_kill_plane_respawns() {
        let mut app = physics_app();
        let body = app.world_mut().spawn(body_bundle(Vec2::new(15.0, 0.0))).id();
        run(&mut app, 120);

        let world = app.world();
        assert!(world.get::<MotionStats>(body).unwrap().falls >= 1);
        assert!(world.get::<Position>(body).unwrap().0.y > -10.0);
    }
}
