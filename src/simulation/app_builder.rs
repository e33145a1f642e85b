//! Headless App Builder
//!
//! Provides a reusable builder for creating headless Bevy apps.
//! Used by the simulation runner, scenario tests and parallel execution.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use crate::ai::{LedgeGraphRegistry, ai_policy_update, sync_ledge_graph};
use crate::levels::{LevelData, build_level, install_level};
use crate::player::{
    apply_gravity, apply_intent, apply_velocity, check_collisions, respawn_fallen,
};

/// Builder for creating headless Bevy apps
pub struct HeadlessAppBuilder {
    level: Option<LevelData>,
    fps: f32,
    minimal_threads: bool,
    include_ai: bool,
}

impl Default for HeadlessAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAppBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            level: None,
            fps: 60.0,
            minimal_threads: false,
            include_ai: false,
        }
    }

    /// Level to install before the first frame
    pub fn with_level(mut self, level: &LevelData) -> Self {
        self.level = Some(level.clone());
        self
    }

    /// Set the simulated FPS (default: 60)
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    ///
    /// Use this when running many apps in parallel to avoid hitting OS thread limits.
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Include the ledge graph registry and the policy systems
    pub fn with_ai(mut self) -> Self {
        self.include_ai = true;
        self
    }

    /// Build the app with minimal plugins, the level and the body systems.
    /// A level is required.
    ///
    /// Every `app.update()` advances time by exactly one frame (the very first
    /// update has a zero delta). Callers add their own bodies and any extra
    /// systems ordered after `respawn_fallen`.
    pub fn build(self) -> Result<App, String> {
        if self.fps.is_nan() || self.fps <= 0.0 {
            return Err(format!("fps must be positive, got {}", self.fps));
        }
        let frame = Duration::from_secs_f32(1.0 / self.fps);

        let mut app = App::new();
        if self.minimal_threads {
            app.add_plugins(
                MinimalPlugins
                    .set(ScheduleRunnerPlugin::run_loop(frame))
                    .set(TaskPoolPlugin {
                        task_pool_options: TaskPoolOptions::with_num_threads(1),
                    }),
            );
        } else {
            app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)));
        }
        app.insert_resource(TimeUpdateStrategy::ManualDuration(frame));

        let level = self.level.ok_or("no level set for headless app")?;
        install_level(app.world_mut(), build_level(&level)?);

        if self.include_ai {
            app.init_resource::<LedgeGraphRegistry>();
            app.add_systems(
                Update,
                (sync_ledge_graph, ai_policy_update)
                    .chain()
                    .before(apply_intent),
            );
        }

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

        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{CurrentLevel, LevelDatabase};
    use crate::world::LevelGeometry;

    #[test]
    fn test_builder_installs_level() {
        let db = LevelDatabase::default_levels();
        let app = HeadlessAppBuilder::new()
            .with_level(db.get_by_name("Shelves").unwrap())
            .with_ai()
            .build()
            .unwrap();
        let world = app.world();
        assert!(world.contains_resource::<LevelGeometry>());
        assert!(world.contains_resource::<LedgeGraphRegistry>());
        assert_eq!(world.resource::<CurrentLevel>().id.to_string(), "Shelves");
    }

    #[test]
    fn test_minimal_threads_creates_app() {
        let db = LevelDatabase::default_levels();
        let mut app = HeadlessAppBuilder::new()
            .with_level(db.get_by_name("Flat").unwrap())
            .with_minimal_threads()
            .build()
            .unwrap();
        app.update();
        assert!(app.world().contains_resource::<CurrentLevel>());
    }

    #[test]
    fn test_rejects_zero_fps() {
        assert!(HeadlessAppBuilder::new().with_fps(0.0).build().is_err());
        assert!(HeadlessAppBuilder::new().build().is_err());
    }
}
