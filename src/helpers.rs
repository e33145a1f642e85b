//! Utility functions for arenabot

use bevy::prelude::*;

/// Move a value toward a target by at most max_delta
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Overlap of two boxes given by center and half extents, per axis.
/// A component <= 0 means the boxes are apart on that axis.
pub fn box_overlap(a_center: Vec2, a_half: Vec2, b_center: Vec2, b_half: Vec2) -> Vec2 {
    a_half + b_half - (a_center - b_center).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_toward() {
        assert_eq!(move_toward(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_toward(9.0, 10.0, 3.0), 10.0);
        assert_eq!(move_toward(0.0, -10.0, 4.0), -4.0);
    }

    #[test]
    fn test_box_overlap() {
        let overlap = box_overlap(Vec2::ZERO, Vec2::ONE, Vec2::new(1.5, 0.0), Vec2::ONE);
        assert_eq!(overlap, Vec2::new(0.5, 2.0));
        let apart = box_overlap(Vec2::ZERO, Vec2::ONE, Vec2::new(5.0, 0.0), Vec2::ONE);
        assert!(apart.x <= 0.0);
    }
}
