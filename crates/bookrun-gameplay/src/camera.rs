//! Camera-relative spawn and exit geometry.
//!
//! Every spawn and exit position an NPC uses is resolved here, from the
//! camera's current scroll offset and viewport width. Nothing in the crate
//! compares an NPC position against fixed world coordinates: the player can
//! walk left before the camera starts following, and thresholds pinned to
//! `0` / `viewport_width` then drift away from what is actually on screen.

use bookrun_common::{ConfigError, Side};
use serde::{Deserialize, Serialize};

/// Distance beyond the viewport edge at which NPCs spawn.
pub const SPAWN_OFFSET: f32 = 100.0;

/// Distance beyond the viewport edge past which an NPC counts as exited.
pub const EXIT_BUFFER: f32 = 100.0;

/// The visible horizontal strip of the world, read once per frame.
///
/// Owned by the camera collaborator; NPC code only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    /// World X of the viewport's left edge
    pub scroll_x: f32,
    /// Viewport width in world units
    pub viewport_width: f32,
}

impl CameraFrame {
    /// Creates a camera frame.
    #[must_use]
    pub const fn new(scroll_x: f32, viewport_width: f32) -> Self {
        Self {
            scroll_x,
            viewport_width,
        }
    }

    /// World X of the viewport's right edge.
    #[must_use]
    pub fn right_edge(&self) -> f32 {
        self.scroll_x + self.viewport_width
    }

    /// Returns this frame with the scroll moved by `dx`.
    #[must_use]
    pub fn scrolled_by(self, dx: f32) -> Self {
        Self {
            scroll_x: self.scroll_x + dx,
            ..self
        }
    }

    /// Rejects frames the driver must never hand to the NPC core.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport_width <= 0.0 || !self.viewport_width.is_finite() {
            return Err(ConfigError::ZeroViewport);
        }
        Ok(())
    }

    /// Whether `x` lies within the viewport widened by `margin` on both sides.
    #[must_use]
    pub fn contains_x(&self, x: f32, margin: f32) -> bool {
        !has_exited_left(self, x, margin) && !has_exited_right(self, x, margin)
    }
}

impl Default for CameraFrame {
    fn default() -> Self {
        Self::new(0.0, 800.0)
    }
}

/// Spawn X for an NPC entering from `side`, using [`SPAWN_OFFSET`].
#[must_use]
pub fn spawn_x(frame: &CameraFrame, side: Side) -> f32 {
    spawn_x_with_offset(frame, side, SPAWN_OFFSET)
}

/// Spawn X for an NPC entering from `side`, `offset` units off screen.
#[must_use]
pub fn spawn_x_with_offset(frame: &CameraFrame, side: Side, offset: f32) -> f32 {
    match side {
        Side::Right => frame.scroll_x + frame.viewport_width + offset,
        Side::Left => frame.scroll_x - offset,
    }
}

/// Whether `x` is further left than the viewport's left edge minus `buffer`.
#[must_use]
pub fn has_exited_left(frame: &CameraFrame, x: f32, buffer: f32) -> bool {
    x < frame.scroll_x - buffer
}

/// Whether `x` is further right than the viewport's right edge plus `buffer`.
#[must_use]
pub fn has_exited_right(frame: &CameraFrame, x: f32, buffer: f32) -> bool {
    x > frame.scroll_x + frame.viewport_width + buffer
}

/// Exit test for an entity moving toward `heading`.
///
/// Only the edge the entity is walking toward counts. An entity parked just
/// past the left edge while heading right has not exited.
#[must_use]
pub fn has_exited_toward(frame: &CameraFrame, x: f32, heading: Side, buffer: f32) -> bool {
    match heading {
        Side::Left => has_exited_left(frame, x, buffer),
        Side::Right => has_exited_right(frame, x, buffer),
    }
}

/// Whether something at `x` with horizontal velocity `velocity_x` is outside
/// the viewport widened by `margin` and not coming back.
///
/// Objects released off screen but flying toward the viewport are inbound,
/// not outbound.
#[must_use]
pub fn is_outbound(frame: &CameraFrame, x: f32, velocity_x: f32, margin: f32) -> bool {
    (has_exited_left(frame, x, margin) && velocity_x <= 0.0)
        || (has_exited_right(frame, x, margin) && velocity_x >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_spawn_x_right_and_left() {
        let frame = CameraFrame::new(0.0, 800.0);
        assert_eq!(spawn_x(&frame, Side::Right), 900.0);
        assert_eq!(spawn_x(&frame, Side::Left), -100.0);

        let scrolled = CameraFrame::new(1200.0, 800.0);
        assert_eq!(spawn_x(&scrolled, Side::Right), 2100.0);
        assert_eq!(spawn_x(&scrolled, Side::Left), 1100.0);
    }

    #[test]
    fn test_spawn_with_custom_offset() {
        let frame = CameraFrame::new(0.0, 800.0);
        assert_eq!(spawn_x_with_offset(&frame, Side::Right, 180.0), 980.0);
    }

    #[test]
    fn test_exit_thresholds_use_buffer() {
        let frame = CameraFrame::new(0.0, 800.0);
        assert!(!has_exited_left(&frame, -100.0, EXIT_BUFFER));
        assert!(has_exited_left(&frame, -100.5, EXIT_BUFFER));
        assert!(!has_exited_right(&frame, 900.0, EXIT_BUFFER));
        assert!(has_exited_right(&frame, 900.5, EXIT_BUFFER));
    }

    #[test]
    fn test_player_walks_left_before_camera_follows() {
        // Spawned on the right at scroll 0, then the camera pulls back 150
        // while the NPC stays put relative to the screen.
        let frame = CameraFrame::new(0.0, 800.0);
        let x = spawn_x_with_offset(&frame, Side::Right, 180.0);
        assert_eq!(x, 980.0);
        // Not exited under a 200 buffer at scroll 0.
        assert!(!has_exited_right(&frame, x, 200.0));

        let moved = frame.scrolled_by(-150.0);
        // Entity kept its screen-relative position.
        assert!(!has_exited_right(&moved, x - 150.0, 200.0));
        // Holding the world X fixed while the camera moves is what changes
        // the answer, which is the point: only `x - scroll_x` matters.
        assert!(has_exited_right(&moved, x, 200.0));
    }

    #[test]
    fn test_directional_exit_ignores_far_edge() {
        let frame = CameraFrame::new(0.0, 800.0);
        let left_spawn = spawn_x(&frame, Side::Left) - 1.0;
        assert!(has_exited_left(&frame, left_spawn, EXIT_BUFFER));
        assert!(!has_exited_toward(&frame, left_spawn, Side::Right, EXIT_BUFFER));
    }

    #[test]
    fn test_outbound_needs_both_position_and_direction() {
        let frame = CameraFrame::new(0.0, 800.0);
        // Right spawn point, flying back toward the screen.
        assert!(!is_outbound(&frame, 900.0, -320.0, 64.0));
        assert!(is_outbound(&frame, 900.0, 320.0, 64.0));
        assert!(!is_outbound(&frame, -200.0, 320.0, 64.0));
        assert!(is_outbound(&frame, -200.0, -320.0, 64.0));
        assert!(is_outbound(&frame, -200.0, 0.0, 64.0));
        // Inside the margin nothing is outbound.
        assert!(!is_outbound(&frame, 850.0, 320.0, 64.0));
    }

    #[test]
    fn test_validate_rejects_zero_viewport() {
        assert!(CameraFrame::new(0.0, 0.0).validate().is_err());
        assert!(CameraFrame::new(-50.0, 640.0).validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_right_spawn_is_never_already_exited(
            scroll in -10_000.0f32..10_000.0,
            width in 1.0f32..4_000.0,
            buffer in 0.0f32..500.0,
        ) {
            let frame = CameraFrame::new(scroll, width);
            let x = spawn_x(&frame, Side::Right);
            prop_assert!(!has_exited_left(&frame, x, buffer));
            let x = spawn_x(&frame, Side::Left);
            prop_assert!(!has_exited_right(&frame, x, buffer));
        }

        #[test]
        fn prop_exit_depends_only_on_screen_offset(
            scroll in -5_000i32..5_000,
            shift in -2_000i32..2_000,
            screen_x in -1_000i32..2_000,
            buffer in 0i32..300,
        ) {
            // Integer-valued inputs keep the f32 arithmetic exact.
            let frame = CameraFrame::new(scroll as f32, 800.0);
            let moved = frame.scrolled_by(shift as f32);
            let x = (scroll + screen_x) as f32;
            let shifted_x = x + shift as f32;
            let buffer = buffer as f32;
            prop_assert_eq!(
                has_exited_left(&frame, x, buffer),
                has_exited_left(&moved, shifted_x, buffer)
            );
            prop_assert_eq!(
                has_exited_right(&frame, x, buffer),
                has_exited_right(&moved, shifted_x, buffer)
            );
        }
    }
}
