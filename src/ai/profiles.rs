//! AI profiles - tuning values for the rush policy
//!
//! Each profile defines the numbers that shape how an agent closes distance and
//! follows ledge routes. Loaded from assets/ai_profiles.txt.

use bevy::prelude::*;
use std::fs;

use crate::constants::*;

/// Path to AI profiles file
pub const AI_PROFILES_FILE: &str = "assets/ai_profiles.txt";

/// Rush policy parameters loaded from config file
#[derive(Debug, Clone, PartialEq)]
pub struct AiProfile {
    /// Profile name for display and lookup
    pub name: String,
    /// Desired horizontal gap to the target during direct pursuit
    pub stand_off: f32,
    /// Horizontal tolerance for reaching a ledge node
    pub ledge_grab_distance: f32,
    /// Seconds between route recomputations
    pub replan_interval: f32,
    /// Seconds a reversal is held back after the heading flips
    pub turn_cooldown: f32,
    /// Magnitude of the emitted horizontal speed
    pub run_speed: f32,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self {
            name: "Balanced".to_string(),
            stand_off: DEFAULT_STAND_OFF,
            ledge_grab_distance: DEFAULT_LEDGE_GRAB_DISTANCE,
            replan_interval: DEFAULT_REPLAN_INTERVAL,
            turn_cooldown: DEFAULT_TURN_COOLDOWN,
            run_speed: DEFAULT_RUN_SPEED,
        }
    }
}

/// Database of AI profiles loaded from file
#[derive(Debug, Clone)]
pub struct AiProfileDatabase {
    profiles: Vec<AiProfile>,
}

impl Default for AiProfileDatabase {
    fn default() -> Self {
        Self::load_from_file(AI_PROFILES_FILE)
    }
}

impl AiProfileDatabase {
    /// Load profiles from file, or return default if file doesn't exist
    pub fn load_from_file(path: &str) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not read AI profiles file {}: {}, using defaults", path, e);
                return Self::builtin();
            }
        };

        let profiles = parse_profiles(&content);
        if profiles.is_empty() {
            warn!("No profiles parsed from {}, using defaults", path);
            return Self::builtin();
        }

        info!("Loaded {} AI profiles from {}", profiles.len(), path);
        Self { profiles }
    }

    /// Single default profile
    pub fn builtin() -> Self {
        Self {
            profiles: vec![AiProfile::default()],
        }
    }

    /// Build a database from already parsed profiles (defaults if empty)
    pub fn from_profiles(profiles: Vec<AiProfile>) -> Self {
        if profiles.is_empty() {
            return Self::builtin();
        }
        Self { profiles }
    }

    /// Get profile by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Option<&AiProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn profiles(&self) -> &[AiProfile] {
        &self.profiles
    }

    /// Get number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Parse profiles from file content
pub fn parse_profiles(content: &str) -> Vec<AiProfile> {
    let mut profiles = Vec::new();
    let mut current: Option<AiProfile> = None;

    for line in content.lines() {
        let line = line.trim();

        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // New profile starts
        if let Some(name) = line.strip_prefix("profile:") {
            if let Some(p) = current.take() {
                profiles.push(p);
            }
            current = Some(AiProfile {
                name: name.trim().to_string(),
                ..default()
            });
            continue;
        }

        let Some(profile) = current.as_mut() else {
            continue;
        };

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Ok(v) = value.trim().parse::<f32>() else {
            warn!("Profile {}: bad value for {}: {}", profile.name, key.trim(), value.trim());
            continue;
        };

        match key.trim() {
            "stand_off" => profile.stand_off = v.max(0.0),
            "ledge_grab_distance" => profile.ledge_grab_distance = v.max(0.0),
            "replan_interval" => profile.replan_interval = v.max(0.0),
            "turn_cooldown" => profile.turn_cooldown = v.max(0.0),
            "run_speed" => profile.run_speed = v,
            _ => {}
        }
    }

    // Don't forget the last profile
    if let Some(p) = current {
        profiles.push(p);
    }

    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profiles() {
        let content = "\
# comment
profile: Brawler
stand_off: 0
turn_cooldown: 0.5

profile: Sniper
stand_off: 8
replan_interval: 1.5
unknown_key: 3
";
        let profiles = parse_profiles(content);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "Brawler");
        assert_eq!(profiles[0].stand_off, 0.0);
        assert_eq!(profiles[0].turn_cooldown, 0.5);
        assert_eq!(profiles[0].replan_interval, DEFAULT_REPLAN_INTERVAL);
        assert_eq!(profiles[1].stand_off, 8.0);
        assert_eq!(profiles[1].replan_interval, 1.5);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let profiles = parse_profiles("profile: Odd\nstand_off: far\nrun_speed: 0.5\n");
        assert_eq!(profiles[0].stand_off, DEFAULT_STAND_OFF);
        assert_eq!(profiles[0].run_speed, 0.5);
    }

    #[test]
    fn test_lookup_by_name() {
        let db = AiProfileDatabase::from_profiles(parse_profiles(
            "profile: A\nprofile: B\n",
        ));
        assert_eq!(db.len(), 2);
        assert_eq!(db.profiles()[1].name, "B");
        assert_eq!(db.get_by_name("a").map(|p| p.name.as_str()), Some("A"));
        assert!(db.get_by_name("missing").is_none());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let db = AiProfileDatabase::load_from_file("does/not/exist.txt");
        assert_eq!(db.len(), 1);
        assert_eq!(db.profiles()[0], AiProfile::default());
    }
}
