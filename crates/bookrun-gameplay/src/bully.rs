//! Bully archetype.
//!
//! Fast, throws often, never stops mid-crossing, and comes back from
//! either side with equal odds.

use bookrun_common::{BookrunResult, EntityId, Side};

use crate::camera::{CameraFrame, EXIT_BUFFER, SPAWN_OFFSET};
use crate::patrol::ArchetypeKind;
use crate::tuning::{DurationRange, EntryPolicy, PatrolTuning};
use crate::zone::Zone;

/// Walking speed in world units per second.
pub const BULLY_SPEED: f32 = 150.0;

/// Time between throws.
pub const BULLY_ATTACK_INTERVAL_MS: f32 = 1200.0;

/// Throws per crossing.
pub const BULLY_ATTACK_BUDGET: u32 = 6;

/// Chance of re-entering from the home side.
pub const BULLY_HOME_WEIGHT: f32 = 0.5;

impl PatrolTuning {
    /// Built-in Bully parameters.
    #[must_use]
    pub fn bully() -> Self {
        Self {
            speed: BULLY_SPEED,
            attack_interval_ms: BULLY_ATTACK_INTERVAL_MS,
            attack_budget: BULLY_ATTACK_BUDGET,
            initial_delay_ms: 800.0,
            enter_transit_ms: 400.0,
            wait_ms: DurationRange::new(2500.0, 5000.0),
            entry: EntryPolicy::Weighted {
                home_weight: BULLY_HOME_WEIGHT,
            },
            phase_stall: None,
            spawn_offset: SPAWN_OFFSET,
            exit_buffer: EXIT_BUFFER,
            exit_clearance: 50.0,
            target_jitter: 60.0,
            max_cycles: None,
        }
    }
}

impl Zone {
    /// Spawns a Bully with the zone's Bully tuning.
    pub fn spawn_bully(
        &mut self,
        frame: CameraFrame,
        anchor_y: f32,
        home_side: Side,
    ) -> BookrunResult<EntityId> {
        self.spawn(ArchetypeKind::Bully, frame, anchor_y, home_side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameEvent;
    use crate::patrol::PatrolState;
    use crate::tuning::ZoneTuning;
    use glam::Vec2;

    const FRAME: CameraFrame = CameraFrame::new(0.0, 800.0);
    const GROUND: f32 = 400.0;
    const STEP_MS: f32 = 10.0;

    #[test]
    fn test_bully_defaults() {
        let tuning = PatrolTuning::bully();
        tuning.validate().expect("defaults should be valid");
        assert!(tuning.phase_stall.is_none());

        let old_man = PatrolTuning::old_man();
        assert!(tuning.speed > old_man.speed);
        assert!(tuning.attack_interval_ms < old_man.attack_interval_ms);
        assert!(tuning.attack_budget > old_man.attack_budget);
        assert!(tuning.wait_ms.max_ms < old_man.wait_ms.max_ms);
        assert_eq!(ArchetypeKind::Bully.default_tuning(), tuning);
    }

    #[test]
    fn test_bully_spends_full_budget_then_leaves() {
        let mut zone = Zone::new(ZoneTuning::default(), 8);
        let id = zone
            .spawn_bully(FRAME, GROUND, Side::Right)
            .expect("spawn");
        // Standing well above the throws so nothing is absorbed.
        let player = Some(Vec2::new(400.0, GROUND - 300.0));

        let mut attacks = 0;
        let mut ticks = 0;
        while zone.npc(id).expect("npc").completed_traversals() == 0 {
            zone.tick(FRAME, player, STEP_MS);
            attacks += zone
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::AttackIssued { .. }))
                .count();
            ticks += 1;
            assert!(ticks < 5_000, "bully never left");
        }
        assert_eq!(attacks as u32, BULLY_ATTACK_BUDGET);
    }

    #[test]
    fn test_bully_never_stalls() {
        let mut zone = Zone::new(ZoneTuning::default(), 21);
        let id = zone
            .spawn_bully(FRAME, GROUND, Side::Left)
            .expect("spawn");
        let player = Some(Vec2::new(400.0, GROUND));

        let mut ticks = 0;
        while zone.npc(id).expect("npc").completed_traversals() < 3 {
            zone.tick(FRAME, player, STEP_MS);
            let npc = zone.npc(id).expect("npc");
            assert_ne!(npc.state(), PatrolState::Recovering);
            assert!(!zone
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::PhaseStallStarted { .. })));
            ticks += 1;
            assert!(ticks < 10_000, "bully never finished three crossings");
        }
        assert_eq!(zone.npc(id).expect("npc").lifetime_stalls(), 0);
        assert!(zone.spawns().hazards().is_empty());
    }

    #[test]
    fn test_bully_reentry_is_even() {
        let mut zone = Zone::new(ZoneTuning::default(), 77);
        let tuning = PatrolTuning {
            speed: 100_000.0,
            initial_delay_ms: 0.0,
            enter_transit_ms: 0.0,
            wait_ms: DurationRange::fixed(0.0),
            ..PatrolTuning::bully()
        };
        let id = zone
            .spawn_with_tuning(ArchetypeKind::Bully, tuning, FRAME, GROUND, Side::Left)
            .expect("spawn");

        let mut home = 0usize;
        let mut total = 0usize;
        let mut ticks = 0;
        while zone.npc(id).expect("npc").completed_traversals() < 1000 {
            zone.tick(FRAME, None, STEP_MS);
            for event in zone.drain_events() {
                if let GameEvent::NpcEntering { side, .. } = event {
                    total += 1;
                    if side == Side::Left {
                        home += 1;
                    }
                }
            }
            ticks += 1;
            assert!(ticks < 20_000, "re-entries stalled");
        }

        // Discount the first entry, which is always from home.
        let share = (home - 1) as f32 / (total - 1) as f32;
        assert!(
            (share - BULLY_HOME_WEIGHT).abs() < 0.05,
            "home share {share} too far from {BULLY_HOME_WEIGHT}"
        );
    }

    #[test]
    fn test_bully_outpaces_old_man() {
        let mut zone = Zone::new(ZoneTuning::default(), 4);
        let bully = zone
            .spawn_bully(FRAME, GROUND, Side::Right)
            .expect("spawn");
        let old_man = zone
            .spawn_old_man(FRAME, GROUND, Side::Right)
            .expect("spawn");

        let mut ticks = 0;
        loop {
            zone.tick(FRAME, None, STEP_MS);
            ticks += 1;
            assert!(ticks < 10_000, "neither NPC finished");
            let bully_done = zone.npc(bully).expect("bully").completed_traversals();
            let old_man_done = zone.npc(old_man).expect("old man").completed_traversals();
            if bully_done > 0 || old_man_done > 0 {
                assert_eq!(bully_done, 1);
                assert_eq!(old_man_done, 0);
                break;
            }
        }
    }
}
