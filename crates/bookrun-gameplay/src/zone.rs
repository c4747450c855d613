//! Zone driver: owns the NPCs, timers and spawns of one stretch of road.
//!
//! The game loop calls [`Zone::tick`] once per frame. Timers due this frame
//! are dispatched before any per-frame update, so a timer-driven transition
//! always wins over an exit check in the same tick.

use bookrun_common::{BookrunResult, EntityId, Side, ZoneError, ZoneResult};
use glam::Vec2;
use tracing::{debug, info, trace};

use crate::camera::CameraFrame;
use crate::events::{EventBus, GameEvent};
use crate::patrol::{ArchetypeKind, PatrolContext, PatrolEntity, PatrolSnapshot};
use crate::projectile::{ProjectileSet, Spawner};
use crate::timers::TimerQueue;
use crate::tuning::{PatrolTuning, ZoneTuning};

/// One active stretch of the level and everything patrolling it.
#[derive(Debug)]
pub struct Zone {
    tuning: ZoneTuning,
    npcs: Vec<PatrolEntity>,
    timers: TimerQueue,
    spawns: ProjectileSet,
    events: EventBus,
    active: bool,
    rng: fastrand::Rng,
    confidence_lost: u32,
}

impl Zone {
    /// Creates an empty, active zone.
    #[must_use]
    pub fn new(tuning: ZoneTuning, seed: u64) -> Self {
        let spawns = ProjectileSet::new(tuning.projectile, tuning.hazard);
        let events = EventBus::new(tuning.event_capacity);
        Self {
            tuning,
            npcs: Vec::new(),
            timers: TimerQueue::new(),
            spawns,
            events,
            active: true,
            rng: fastrand::Rng::with_seed(seed),
            confidence_lost: 0,
        }
    }

    /// Spawns an NPC of `kind` with the zone's tuning for that archetype.
    pub fn spawn(
        &mut self,
        kind: ArchetypeKind,
        frame: CameraFrame,
        anchor_y: f32,
        side: Side,
    ) -> BookrunResult<EntityId> {
        let tuning = match kind {
            ArchetypeKind::OldMan => self.tuning.old_man.clone(),
            ArchetypeKind::Bully => self.tuning.bully.clone(),
        };
        self.spawn_with_tuning(kind, tuning, frame, anchor_y, side)
    }

    /// Spawns an NPC with explicit tuning.
    pub fn spawn_with_tuning(
        &mut self,
        kind: ArchetypeKind,
        tuning: PatrolTuning,
        frame: CameraFrame,
        anchor_y: f32,
        side: Side,
    ) -> BookrunResult<EntityId> {
        if !self.active {
            return Err(ZoneError::Inactive.into());
        }
        tuning.validate()?;
        frame.validate()?;

        let mut npc = PatrolEntity::new(kind, tuning, anchor_y, side, self.rng.u64(..));
        let mut ctx = PatrolContext::new(
            frame,
            &mut self.timers,
            Some(&mut self.spawns as &mut dyn Spawner),
            &self.events,
        );
        npc.start(&mut ctx);

        let id = npc.id();
        info!("Spawned {} {:?} on the {:?}", kind.display_name(), id, side);
        self.npcs.push(npc);
        Ok(id)
    }

    /// Advances the zone by one frame. Returns the confidence the player
    /// lost this frame.
    pub fn tick(&mut self, frame: CameraFrame, player: Option<Vec2>, dt_ms: f32) -> u32 {
        if !self.active {
            return 0;
        }
        debug_assert!(frame.validate().is_ok(), "invalid camera frame: {frame:?}");

        self.timers.advance(dt_ms);
        while let Some(fired) = self.timers.pop_due() {
            let Some(npc) = self.npcs.iter_mut().find(|n| n.id() == fired.owner) else {
                trace!("Dropping timer {:?} for departed {:?}", fired.id, fired.owner);
                continue;
            };
            let mut ctx = PatrolContext::new(
                frame,
                &mut self.timers,
                Some(&mut self.spawns as &mut dyn Spawner),
                &self.events,
            );
            npc.on_timer(fired.id, &mut ctx, player);
        }

        {
            let mut ctx = PatrolContext::new(
                frame,
                &mut self.timers,
                Some(&mut self.spawns as &mut dyn Spawner),
                &self.events,
            );
            for npc in &mut self.npcs {
                npc.update(&mut ctx, player, dt_ms);
            }
        }

        let lost = self.spawns.update(&frame, player, dt_ms, &self.events);
        self.confidence_lost += lost;

        let before = self.npcs.len();
        self.npcs.retain(|npc| !npc.is_disposed());
        if self.npcs.len() != before {
            debug!("Removed {} retired NPCs", before - self.npcs.len());
        }

        lost
    }

    /// Disposes and removes one NPC. Siblings are untouched.
    pub fn dispose_npc(&mut self, id: EntityId) -> ZoneResult<()> {
        let index = self
            .npcs
            .iter()
            .position(|n| n.id() == id)
            .ok_or(ZoneError::NpcNotFound(id))?;
        let mut npc = self.npcs.remove(index);
        npc.dispose(&mut self.timers, &self.events);
        Ok(())
    }

    /// Disposes every NPC and clears all spawns. The zone stays inert
    /// afterwards.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        for npc in &mut self.npcs {
            npc.dispose(&mut self.timers, &self.events);
        }
        info!("Zone deactivated, disposed {} NPCs", self.npcs.len());
        self.npcs.clear();
        self.spawns.clear();
    }

    /// Whether the zone still runs.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Tuning in use.
    #[must_use]
    pub fn tuning(&self) -> &ZoneTuning {
        &self.tuning
    }

    /// Looks up an NPC.
    #[must_use]
    pub fn npc(&self, id: EntityId) -> Option<&PatrolEntity> {
        self.npcs.iter().find(|n| n.id() == id)
    }

    /// Iterates live NPCs.
    pub fn npcs(&self) -> impl Iterator<Item = &PatrolEntity> {
        self.npcs.iter()
    }

    /// Number of live NPCs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    /// Whether the zone has no NPCs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    /// Projectiles and hazards in flight.
    #[must_use]
    pub fn spawns(&self) -> &ProjectileSet {
        &self.spawns
    }

    /// Outgoing event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drains pending events.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Simulated time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    /// Timers outstanding across all NPCs.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Total confidence lost since the zone was created.
    #[must_use]
    pub fn confidence_lost(&self) -> u32 {
        self.confidence_lost
    }

    /// Snapshots of every live NPC.
    #[must_use]
    pub fn snapshots(&self) -> Vec<PatrolSnapshot> {
        self.npcs.iter().map(PatrolEntity::snapshot).collect()
    }
}

impl Drop for Zone {
    fn drop(&mut self) {
        self.deactivate();
    }
}
