//! Old Man archetype.
//!
//! Walks slowly, throws rarely, and mostly comes back from the side he
//! left home on. Part way through each crossing he stops to catch his
//! breath, leaves something on the ground, and only then carries on.

use bookrun_common::{BookrunResult, EntityId, Side};

use crate::camera::{CameraFrame, EXIT_BUFFER, SPAWN_OFFSET};
use crate::patrol::ArchetypeKind;
use crate::tuning::{DurationRange, EntryPolicy, PatrolTuning, PhaseStallTuning};
use crate::zone::Zone;

/// Walking speed in world units per second.
pub const OLD_MAN_SPEED: f32 = 60.0;

/// Time between throws.
pub const OLD_MAN_ATTACK_INTERVAL_MS: f32 = 2500.0;

/// Throws per crossing.
pub const OLD_MAN_ATTACK_BUDGET: u32 = 5;

/// Chance of re-entering from the home side.
pub const OLD_MAN_HOME_WEIGHT: f32 = 0.8;

impl PatrolTuning {
    /// Built-in Old Man parameters.
    #[must_use]
    pub fn old_man() -> Self {
        Self {
            speed: OLD_MAN_SPEED,
            attack_interval_ms: OLD_MAN_ATTACK_INTERVAL_MS,
            attack_budget: OLD_MAN_ATTACK_BUDGET,
            initial_delay_ms: 1500.0,
            enter_transit_ms: 800.0,
            wait_ms: DurationRange::new(4000.0, 8000.0),
            entry: EntryPolicy::Weighted {
                home_weight: OLD_MAN_HOME_WEIGHT,
            },
            phase_stall: Some(PhaseStallTuning {
                pre_phase_ms: DurationRange::new(2500.0, 4500.0),
                stall_ms: DurationRange::new(2500.0, 4000.0),
                hazard_at: 0.5,
            }),
            spawn_offset: SPAWN_OFFSET,
            exit_buffer: EXIT_BUFFER,
            exit_clearance: 50.0,
            target_jitter: 40.0,
            max_cycles: None,
        }
    }
}

impl Zone {
    /// Spawns an Old Man with the zone's Old Man tuning.
    pub fn spawn_old_man(
        &mut self,
        frame: CameraFrame,
        anchor_y: f32,
        home_side: Side,
    ) -> BookrunResult<EntityId> {
        self.spawn(ArchetypeKind::OldMan, frame, anchor_y, home_side)
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

    fn stall_tuning(speed: f32, pre_phase_ms: f32, stall_ms: f32) -> PatrolTuning {
        PatrolTuning {
            speed,
            attack_interval_ms: 1000.0,
            attack_budget: 100,
            initial_delay_ms: 100.0,
            enter_transit_ms: 100.0,
            wait_ms: DurationRange::fixed(100.0),
            entry: EntryPolicy::Fixed,
            phase_stall: Some(PhaseStallTuning {
                pre_phase_ms: DurationRange::fixed(pre_phase_ms),
                stall_ms: DurationRange::fixed(stall_ms),
                hazard_at: 0.5,
            }),
            target_jitter: 0.0,
            ..PatrolTuning::old_man()
        }
    }

    fn spawn(zone: &mut Zone, tuning: PatrolTuning) -> EntityId {
        zone.spawn_with_tuning(ArchetypeKind::OldMan, tuning, FRAME, GROUND, Side::Right)
            .expect("spawn should succeed")
    }

    /// Ticks until `ms` has elapsed, collecting every event.
    fn run(zone: &mut Zone, player: Option<Vec2>, ms: f32, seen: &mut Vec<GameEvent>) {
        let steps = (ms / STEP_MS).round() as u32;
        for _ in 0..steps {
            zone.tick(FRAME, player, STEP_MS);
            seen.extend(zone.drain_events());
        }
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(*e)).count()
    }

    #[test]
    fn test_old_man_defaults() {
        let tuning = PatrolTuning::old_man();
        tuning.validate().expect("defaults should be valid");
        assert!(tuning.phase_stall.is_some());
        assert_eq!(
            tuning.entry,
            EntryPolicy::Weighted {
                home_weight: OLD_MAN_HOME_WEIGHT
            }
        );
        assert!(tuning.speed < PatrolTuning::bully().speed);
        assert_eq!(ArchetypeKind::OldMan.default_tuning(), tuning);
    }

    #[test]
    fn test_stall_freezes_and_drops_hazard() {
        let mut zone = Zone::new(ZoneTuning::default(), 3);
        let id = spawn(&mut zone, stall_tuning(200.0, 1500.0, 2000.0));
        let player = Some(Vec2::new(100.0, GROUND));
        let mut seen = Vec::new();

        // Traversal starts at 200ms; throws at 200 and 1200; stall at 1700.
        run(&mut zone, player, 1800.0, &mut seen);
        let npc = zone.npc(id).expect("npc");
        assert_eq!(npc.state(), PatrolState::Recovering);
        assert_eq!(npc.attack_count(), 2);
        assert_eq!(npc.velocity_x(), 0.0);
        let frozen_x = npc.position().x;

        // Hazard lands half way through the stall.
        run(&mut zone, player, 800.0, &mut seen);
        assert!(zone.spawns().hazards().is_empty());
        run(&mut zone, player, 200.0, &mut seen);
        assert_eq!(zone.spawns().hazards().len(), 1);
        assert_eq!(zone.spawns().hazards()[0].position().x, frozen_x);

        run(&mut zone, player, 800.0, &mut seen);
        let npc = zone.npc(id).expect("npc");
        assert_eq!(npc.state(), PatrolState::Recovering);
        assert_eq!(npc.attack_count(), 2);
        assert_eq!(npc.position().x, frozen_x);

        assert_eq!(
            count(&seen, |e| matches!(e, GameEvent::HazardDropped { entity_id, .. } if *entity_id == id)),
            1
        );
    }

    #[test]
    fn test_no_immediate_attack_after_recovery() {
        let mut zone = Zone::new(ZoneTuning::default(), 3);
        let id = spawn(&mut zone, stall_tuning(200.0, 1500.0, 2000.0));
        let player = Some(Vec2::new(100.0, GROUND));
        let mut seen = Vec::new();

        // Recovery fires at 3700ms.
        run(&mut zone, player, 3800.0, &mut seen);
        let npc = zone.npc(id).expect("npc");
        assert_eq!(npc.state(), PatrolState::Attacking);
        assert_eq!(npc.attack_count(), 2);
        assert!(npc.velocity_x() < 0.0);

        // Next throw one full interval later.
        run(&mut zone, player, 800.0, &mut seen);
        assert_eq!(zone.npc(id).expect("npc").attack_count(), 2);
        run(&mut zone, player, 200.0, &mut seen);
        assert_eq!(zone.npc(id).expect("npc").attack_count(), 3);
    }

    #[test]
    fn test_stalls_once_per_traversal_however_long() {
        let mut zone = Zone::new(ZoneTuning::default(), 5);
        // A crossing of roughly 50 seconds with a stall due after 500ms.
        let id = spawn(&mut zone, stall_tuning(20.0, 500.0, 500.0));
        let mut seen = Vec::new();

        let mut elapsed = 0.0;
        while zone.npc(id).expect("npc").completed_traversals() == 0 {
            run(&mut zone, None, STEP_MS, &mut seen);
            elapsed += STEP_MS;
            assert!(elapsed < 120_000.0, "traversal never finished");
        }

        assert_eq!(
            count(&seen, |e| matches!(e, GameEvent::PhaseStallStarted { .. })),
            1
        );
        assert_eq!(zone.npc(id).expect("npc").lifetime_stalls(), 1);
    }

    #[test]
    fn test_hint_only_on_first_stall() {
        let mut zone = Zone::new(ZoneTuning::default(), 11);
        let id = spawn(&mut zone, stall_tuning(1000.0, 100.0, 100.0));
        let mut seen = Vec::new();

        let mut elapsed = 0.0;
        while zone.npc(id).expect("npc").completed_traversals() < 3 {
            run(&mut zone, None, STEP_MS, &mut seen);
            elapsed += STEP_MS;
            assert!(elapsed < 30_000.0, "traversals never finished");
        }

        let npc = zone.npc(id).expect("npc");
        assert_eq!(npc.lifetime_stalls(), 3);
        assert!(npc.stalls_this_traversal() <= 1);
        assert_eq!(
            count(&seen, |e| matches!(e, GameEvent::PhaseStallStarted { .. })),
            3
        );
        assert_eq!(
            count(&seen, |e| matches!(e, GameEvent::PhaseStallHint { .. })),
            1
        );
    }

    #[test]
    fn test_reentry_mostly_from_home() {
        let mut zone = Zone::new(ZoneTuning::default(), 2024);
        let tuning = PatrolTuning {
            speed: 100_000.0,
            initial_delay_ms: 0.0,
            enter_transit_ms: 0.0,
            wait_ms: DurationRange::fixed(0.0),
            phase_stall: None,
            ..PatrolTuning::old_man()
        };
        let id = spawn(&mut zone, tuning);

        let mut entries = Vec::new();
        let mut ticks = 0;
        while zone.npc(id).expect("npc").completed_traversals() < 1000 {
            zone.tick(FRAME, None, STEP_MS);
            for event in zone.drain_events() {
                if let GameEvent::NpcEntering { side, .. } = event {
                    entries.push(side);
                }
            }
            ticks += 1;
            assert!(ticks < 20_000, "re-entries stalled");
        }

        assert_eq!(entries[0], Side::Right);
        let reentries = &entries[1..];
        assert!(reentries.len() >= 999);
        let home = reentries.iter().filter(|s| **s == Side::Right).count();
        let share = home as f32 / reentries.len() as f32;
        assert!(
            (share - OLD_MAN_HOME_WEIGHT).abs() < 0.05,
            "home share {share} too far from {OLD_MAN_HOME_WEIGHT}"
        );
    }

    #[test]
    fn test_spawn_old_man_uses_zone_tuning() {
        let mut tuning = ZoneTuning::default();
        tuning.old_man.attack_budget = 2;
        let mut zone = Zone::new(tuning, 1);
        let id = zone
            .spawn_old_man(FRAME, GROUND, Side::Left)
            .expect("spawn");
        let npc = zone.npc(id).expect("npc");
        assert_eq!(npc.kind(), ArchetypeKind::OldMan);
        assert_eq!(npc.tuning().attack_budget, 2);
        assert_eq!(npc.entry_side(), Side::Left);
    }
}
