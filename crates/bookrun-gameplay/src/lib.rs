//! # Bookrun Gameplay
//!
//! Street-level NPCs for the Bookrun side-scroller.
//!
//! This crate provides:
//! - Camera-relative spawn and exit geometry
//! - Owner-tagged timers with cancellation on disposal
//! - The shared patrol/attack state machine and its tuning
//! - The Old Man and Bully archetypes
//! - Projectiles, trails and dropped hazards
//! - The zone driver and its event bus

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod bully;
pub mod camera;
pub mod events;
pub mod old_man;
pub mod patrol;
pub mod projectile;
pub mod timers;
pub mod tuning;
pub mod zone;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bully::*;
    pub use crate::camera::*;
    pub use crate::events::*;
    pub use crate::old_man::*;
    pub use crate::patrol::*;
    pub use crate::projectile::*;
    pub use crate::timers::*;
    pub use crate::tuning::*;
    pub use crate::zone::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use bookrun_common::Side;
    use glam::Vec2;

    #[test]
    fn test_spawn_points_flank_the_viewport() {
        let frame = CameraFrame::new(1000.0, 800.0);
        assert_eq!(spawn_x(&frame, Side::Left), 900.0);
        assert_eq!(spawn_x(&frame, Side::Right), 1900.0);
    }

    #[test]
    fn test_zone_round_trip() {
        let frame = CameraFrame::default();
        let mut zone = Zone::new(ZoneTuning::default(), 42);
        let old_man = zone
            .spawn_old_man(frame, 400.0, Side::Right)
            .expect("spawn old man");
        let bully = zone
            .spawn_bully(frame, 400.0, Side::Left)
            .expect("spawn bully");

        for _ in 0..600 {
            zone.tick(frame, Some(Vec2::new(400.0, 400.0)), 16.0);
        }
        assert!(zone.npc(old_man).is_some());
        assert!(zone.npc(bully).is_some());
        assert!(zone
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::AttackIssued { .. })));

        zone.deactivate();
        assert_eq!(zone.pending_timers(), 0);
    }
}
