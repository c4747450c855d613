//! Patrol/attack state machine shared by every screen-crossing NPC.
//!
//! An NPC waits off screen, walks in from one side, throws things at the
//! player on a fixed cadence while crossing, and leaves on the far side:
//!
//! ```text
//! Waiting --entry timer--> Entering --transit timer--> Attacking
//! Attacking --exit threshold | budget spent--> Exiting --further--> Waiting
//! Attacking --stall timer (once per traversal)--> Recovering --recovery--> Attacking
//! ```
//!
//! Disposal is possible from every state. Archetypes differ only in their
//! [`PatrolTuning`]; there is no per-archetype code path in here.

use bookrun_common::{EntityId, Side, TimerId};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::camera::{self, CameraFrame};
use crate::events::{EventBus, GameEvent};
use crate::projectile::Spawner;
use crate::timers::{Scheduler, TimerEvent, TimerRegistry};
use crate::tuning::PatrolTuning;

/// Stalls allowed per traversal.
pub const MAX_STALLS_PER_TRAVERSAL: u32 = 1;

/// Which kind of NPC this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchetypeKind {
    /// Slow walker that stalls mid-crossing
    OldMan,
    /// Fast walker that throws more often
    Bully,
}

impl ArchetypeKind {
    /// Get display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::OldMan => "Old Man",
            Self::Bully => "Bully",
        }
    }

    /// Built-in tuning for this archetype.
    #[must_use]
    pub fn default_tuning(self) -> PatrolTuning {
        match self {
            Self::OldMan => PatrolTuning::old_man(),
            Self::Bully => PatrolTuning::bully(),
        }
    }
}

/// Where an NPC is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatrolState {
    /// Off screen, entry timer pending
    Waiting,
    /// Walking in, not yet at the viewport edge
    Entering,
    /// Crossing the screen and throwing
    Attacking,
    /// Stalled mid-crossing
    Recovering,
    /// Done throwing, walking off
    Exiting,
    /// Gone for good
    Disposed,
}

impl PatrolState {
    /// Whether the NPC is visible and moving through the viewport.
    #[must_use]
    pub const fn is_on_screen(self) -> bool {
        matches!(self, Self::Attacking | Self::Recovering | Self::Exiting)
    }
}

/// Collaborators an NPC needs for one update or timer callback.
pub struct PatrolContext<'a> {
    /// Camera as of this frame
    pub frame: CameraFrame,
    /// Timer facility
    pub scheduler: &'a mut dyn Scheduler,
    /// Spawn capability; `None` while unavailable
    pub spawner: Option<&'a mut dyn Spawner>,
    /// Outgoing signals
    pub events: &'a EventBus,
}

impl<'a> PatrolContext<'a> {
    /// Bundles the collaborators.
    pub fn new(
        frame: CameraFrame,
        scheduler: &'a mut dyn Scheduler,
        spawner: Option<&'a mut dyn Spawner>,
        events: &'a EventBus,
    ) -> Self {
        Self {
            frame,
            scheduler,
            spawner,
            events,
        }
    }
}

/// Read-only view of an NPC for overlays and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolSnapshot {
    /// Entity ID
    pub id: EntityId,
    /// Archetype
    pub kind: ArchetypeKind,
    /// World position (feet)
    pub position: Vec2,
    /// Facing
    pub facing: Side,
    /// Direction of travel
    pub heading: Side,
    /// State
    pub state: PatrolState,
    /// Attacks this traversal
    pub attack_count: u32,
    /// Stalls this traversal
    pub stalls_this_traversal: u32,
    /// Stalls over the NPC's lifetime
    pub lifetime_stalls: u32,
    /// Finished traversals
    pub completed_traversals: u32,
    /// Timers outstanding
    pub pending_timers: usize,
}

/// One patrolling NPC.
#[derive(Debug)]
pub struct PatrolEntity {
    id: EntityId,
    kind: ArchetypeKind,
    tuning: PatrolTuning,
    position: Vec2,
    velocity_x: f32,
    facing: Side,
    heading: Side,
    home_side: Side,
    entry_side: Side,
    state: PatrolState,
    attack_count: u32,
    stalls_this_traversal: u32,
    /// Only feeds the one-time tutorial hint; never reset.
    lifetime_stalls: u32,
    completed_traversals: u32,
    timers: TimerRegistry,
    attached: bool,
    rng: fastrand::Rng,
}

impl PatrolEntity {
    /// Creates an NPC standing at ground level `anchor_y`, first entering
    /// from `home_side`. Nothing happens until [`PatrolEntity::start`].
    #[must_use]
    pub fn new(
        kind: ArchetypeKind,
        tuning: PatrolTuning,
        anchor_y: f32,
        home_side: Side,
        seed: u64,
    ) -> Self {
        let id = EntityId::new();
        let heading = home_side.travel_heading();
        Self {
            id,
            kind,
            tuning,
            position: Vec2::new(0.0, anchor_y),
            velocity_x: 0.0,
            facing: heading,
            heading,
            home_side,
            entry_side: home_side,
            state: PatrolState::Waiting,
            attack_count: 0,
            stalls_this_traversal: 0,
            lifetime_stalls: 0,
            completed_traversals: 0,
            timers: TimerRegistry::new(id),
            attached: true,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Entity ID.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Archetype.
    #[must_use]
    pub fn kind(&self) -> ArchetypeKind {
        self.kind
    }

    /// Tuning in use.
    #[must_use]
    pub fn tuning(&self) -> &PatrolTuning {
        &self.tuning
    }

    /// World position of the NPC's feet.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Facing, for sprite flipping.
    #[must_use]
    pub fn facing(&self) -> Side {
        self.facing
    }

    /// Facing as -1 / +1.
    #[must_use]
    pub fn facing_direction(&self) -> f32 {
        self.facing.sign()
    }

    /// Direction of the current traversal.
    #[must_use]
    pub fn heading(&self) -> Side {
        self.heading
    }

    /// Traversal direction as -1 / +1.
    #[must_use]
    pub fn patrol_direction(&self) -> f32 {
        self.heading.sign()
    }

    /// Horizontal velocity in units per second.
    #[must_use]
    pub fn velocity_x(&self) -> f32 {
        self.velocity_x
    }

    /// Side the current or next traversal enters from.
    #[must_use]
    pub fn entry_side(&self) -> Side {
        self.entry_side
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PatrolState {
        self.state
    }

    /// Attacks issued this traversal.
    #[must_use]
    pub fn attack_count(&self) -> u32 {
        self.attack_count
    }

    /// Stalls taken this traversal.
    #[must_use]
    pub fn stalls_this_traversal(&self) -> u32 {
        self.stalls_this_traversal
    }

    /// Stalls taken over the NPC's lifetime.
    #[must_use]
    pub fn lifetime_stalls(&self) -> u32 {
        self.lifetime_stalls
    }

    /// Traversals finished.
    #[must_use]
    pub fn completed_traversals(&self) -> u32 {
        self.completed_traversals
    }

    /// Timers outstanding.
    #[must_use]
    pub fn pending_timer_count(&self) -> usize {
        self.timers.pending_count()
    }

    /// Whether [`PatrolEntity::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.timers.is_disposed()
    }

    /// Whether the NPC is still attached to a scene.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether the renderer should draw this NPC.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.is_live() && self.state.is_on_screen()
    }

    /// Read-only view.
    #[must_use]
    pub fn snapshot(&self) -> PatrolSnapshot {
        PatrolSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            facing: self.facing,
            heading: self.heading,
            state: self.state,
            attack_count: self.attack_count,
            stalls_this_traversal: self.stalls_this_traversal,
            lifetime_stalls: self.lifetime_stalls,
            completed_traversals: self.completed_traversals,
            pending_timers: self.timers.pending_count(),
        }
    }

    fn is_live(&self) -> bool {
        !self.timers.is_disposed() && self.attached
    }

    /// Parks the NPC off screen and arms its first entry.
    pub fn start(&mut self, ctx: &mut PatrolContext<'_>) {
        if !self.is_live()
            || self.state != PatrolState::Waiting
            || self.timers.has_pending(TimerEvent::Entry)
        {
            return;
        }
        self.park(&ctx.frame);
        self.timers
            .schedule_once(ctx.scheduler, self.tuning.initial_delay_ms, TimerEvent::Entry);
        debug!(
            "{} {:?} waiting {}ms before first entry from {:?}",
            self.kind.display_name(),
            self.id,
            self.tuning.initial_delay_ms,
            self.entry_side
        );
    }

    /// Handles a fired timer.
    ///
    /// Stale timers (cancelled, foreign, or arriving after disposal or
    /// detachment) are ignored without touching any state.
    pub fn on_timer(&mut self, id: TimerId, ctx: &mut PatrolContext<'_>, player: Option<Vec2>) {
        if !self.is_live() {
            trace!("{:?} ignoring timer {:?}: no longer live", self.id, id);
            return;
        }
        let Some(event) = self.timers.claim(id) else {
            trace!("{:?} ignoring untracked timer {:?}", self.id, id);
            return;
        };

        match (event, self.state) {
            (TimerEvent::Entry, PatrolState::Waiting) => self.begin_entering(ctx),
            (TimerEvent::EnterTransit, PatrolState::Entering) => self.begin_traversal(ctx, player),
            (TimerEvent::Attack, PatrolState::Attacking) => self.attack(ctx, player),
            (TimerEvent::PhaseStall, PatrolState::Attacking) => self.try_stall(ctx),
            (TimerEvent::StallHazard, PatrolState::Recovering) => self.drop_hazard(ctx),
            (TimerEvent::Recovery, PatrolState::Recovering) => self.recover(ctx),
            (event, state) => trace!("{:?} ignoring {:?} while {:?}", self.id, event, state),
        }
    }

    /// Advances one frame: moves, turns toward the player, checks for exit.
    ///
    /// A negative `dt_ms` counts as zero, as in [`TimerQueue::advance`].
    ///
    /// [`TimerQueue::advance`]: crate::timers::TimerQueue::advance
    pub fn update(&mut self, ctx: &mut PatrolContext<'_>, player: Option<Vec2>, dt_ms: f32) {
        if !self.is_live() {
            return;
        }
        let dt_ms = dt_ms.max(0.0);

        match self.state {
            PatrolState::Attacking => {
                self.step(dt_ms);
                if let Some(target) = player {
                    self.facing = Side::from_delta(target.x - self.position.x, self.heading);
                }
                if camera::has_exited_toward(
                    &ctx.frame,
                    self.position.x,
                    self.heading,
                    self.tuning.exit_buffer,
                ) {
                    self.begin_exiting(ctx, "crossed the exit threshold");
                }
            },
            PatrolState::Exiting => {
                self.step(dt_ms);
                if camera::has_exited_toward(
                    &ctx.frame,
                    self.position.x,
                    self.heading,
                    self.tuning.exit_buffer + self.tuning.exit_clearance,
                ) {
                    self.finish_traversal(ctx);
                }
            },
            PatrolState::Waiting
            | PatrolState::Entering
            | PatrolState::Recovering
            | PatrolState::Disposed => {},
        }
    }

    /// Cancels every timer and detaches. Safe to call repeatedly and from
    /// any state; returns false if already disposed.
    pub fn dispose(&mut self, scheduler: &mut dyn Scheduler, events: &EventBus) -> bool {
        // The registry raises its disposed flag before cancelling anything.
        if !self.timers.dispose(scheduler) {
            return false;
        }
        self.attached = false;
        self.state = PatrolState::Disposed;
        self.velocity_x = 0.0;
        events.publish(GameEvent::NpcDisposed { entity_id: self.id });
        debug!("{} {:?} disposed", self.kind.display_name(), self.id);
        true
    }

    /// Marks the NPC as removed from its scene without disposing it.
    /// Timers that still fire afterwards are ignored.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    fn step(&mut self, dt_ms: f32) {
        self.position.x += self.velocity_x * (dt_ms / 1000.0);
    }

    fn park(&mut self, frame: &CameraFrame) {
        self.heading = self.entry_side.travel_heading();
        self.facing = self.heading;
        self.velocity_x = 0.0;
        self.position.x =
            camera::spawn_x_with_offset(frame, self.entry_side, self.tuning.spawn_offset);
    }

    fn begin_entering(&mut self, ctx: &mut PatrolContext<'_>) {
        self.attack_count = 0;
        self.stalls_this_traversal = 0;
        self.state = PatrolState::Entering;
        self.park(&ctx.frame);
        self.timers.schedule_once(
            ctx.scheduler,
            self.tuning.enter_transit_ms,
            TimerEvent::EnterTransit,
        );
        ctx.events.publish(GameEvent::NpcEntering {
            entity_id: self.id,
            kind: self.kind,
            side: self.entry_side,
        });
        debug!("{:?} entering from {:?}", self.id, self.entry_side);
    }

    fn begin_traversal(&mut self, ctx: &mut PatrolContext<'_>, player: Option<Vec2>) {
        // Snap again: the camera may have scrolled during the walk-in.
        self.park(&ctx.frame);
        self.velocity_x = self.heading.sign() * self.tuning.speed;
        self.state = PatrolState::Attacking;
        ctx.events.publish(GameEvent::NpcTraversing {
            entity_id: self.id,
            x: self.position.x,
        });
        debug!(
            "{:?} traversing from x={} heading {:?}",
            self.id, self.position.x, self.heading
        );

        if let Some(stall) = self.tuning.phase_stall {
            let delay = stall.pre_phase_ms.sample(&mut self.rng);
            self.timers
                .schedule_once(ctx.scheduler, delay, TimerEvent::PhaseStall);
        }

        // First attack of a traversal is immediate, then on the cadence.
        self.attack(ctx, player);
        if self.state == PatrolState::Attacking {
            self.timers.schedule_repeating(
                ctx.scheduler,
                self.tuning.attack_interval_ms,
                TimerEvent::Attack,
            );
        }
    }

    fn attack(&mut self, ctx: &mut PatrolContext<'_>, player: Option<Vec2>) {
        if self.attack_count >= self.tuning.attack_budget {
            self.begin_exiting(ctx, "attack budget spent");
            return;
        }
        let Some(target) = player else {
            trace!("{:?} has no player to aim at", self.id);
            return;
        };
        let Some(spawner) = ctx.spawner.as_deref_mut() else {
            trace!("{:?} has no spawner, skipping attack", self.id);
            return;
        };

        let jitter = if self.tuning.target_jitter > 0.0 {
            (self.rng.f32() * 2.0 - 1.0) * self.tuning.target_jitter
        } else {
            0.0
        };
        let target_x = target.x + jitter;
        self.facing = Side::from_delta(target.x - self.position.x, self.heading);
        let projectile = spawner.spawn_projectile(self.position, target_x);
        self.attack_count += 1;

        ctx.events.publish(GameEvent::AttackIssued {
            entity_id: self.id,
            projectile,
            target_x,
        });
        debug!(
            "{:?} attack {}/{} aimed at x={target_x}",
            self.id, self.attack_count, self.tuning.attack_budget
        );

        if self.attack_count >= self.tuning.attack_budget {
            self.begin_exiting(ctx, "attack budget spent");
        }
    }

    fn begin_exiting(&mut self, ctx: &mut PatrolContext<'_>, reason: &str) {
        self.timers.cancel_event(ctx.scheduler, TimerEvent::Attack);
        self.timers.cancel_event(ctx.scheduler, TimerEvent::PhaseStall);
        self.state = PatrolState::Exiting;
        self.facing = self.heading;
        self.velocity_x = self.heading.sign() * self.tuning.speed;
        debug!("{:?} exiting: {reason}", self.id);
    }

    fn try_stall(&mut self, ctx: &mut PatrolContext<'_>) {
        let Some(stall) = self.tuning.phase_stall else {
            return;
        };
        if self.stalls_this_traversal >= MAX_STALLS_PER_TRAVERSAL {
            trace!("{:?} already stalled this traversal", self.id);
            return;
        }

        self.stalls_this_traversal += 1;
        self.lifetime_stalls += 1;
        self.timers.cancel_event(ctx.scheduler, TimerEvent::Attack);
        self.velocity_x = 0.0;
        self.state = PatrolState::Recovering;

        let duration = stall.stall_ms.sample(&mut self.rng);
        self.timers.schedule_once(
            ctx.scheduler,
            duration * stall.hazard_at,
            TimerEvent::StallHazard,
        );
        self.timers
            .schedule_once(ctx.scheduler, duration, TimerEvent::Recovery);

        ctx.events.publish(GameEvent::PhaseStallStarted {
            entity_id: self.id,
            duration_ms: duration,
        });
        if self.lifetime_stalls == 1 {
            ctx.events
                .publish(GameEvent::PhaseStallHint { entity_id: self.id });
        }
        debug!("{:?} stalled for {duration}ms", self.id);
    }

    fn drop_hazard(&mut self, ctx: &mut PatrolContext<'_>) {
        let Some(spawner) = ctx.spawner.as_deref_mut() else {
            trace!("{:?} has no spawner, skipping hazard", self.id);
            return;
        };
        let hazard = spawner.spawn_hazard(self.position);
        ctx.events.publish(GameEvent::HazardDropped {
            entity_id: self.id,
            hazard,
        });
    }

    fn recover(&mut self, ctx: &mut PatrolContext<'_>) {
        self.state = PatrolState::Attacking;
        self.velocity_x = self.heading.sign() * self.tuning.speed;
        self.timers.schedule_repeating(
            ctx.scheduler,
            self.tuning.attack_interval_ms,
            TimerEvent::Attack,
        );
        debug!("{:?} recovered", self.id);
    }

    fn finish_traversal(&mut self, ctx: &mut PatrolContext<'_>) {
        for event in [
            TimerEvent::Attack,
            TimerEvent::PhaseStall,
            TimerEvent::StallHazard,
            TimerEvent::Recovery,
        ] {
            self.timers.cancel_event(ctx.scheduler, event);
        }
        self.completed_traversals += 1;
        self.state = PatrolState::Waiting;
        self.velocity_x = 0.0;
        ctx.events.publish(GameEvent::NpcExited {
            entity_id: self.id,
            traversals: self.completed_traversals,
        });

        if let Some(max) = self.tuning.max_cycles {
            if self.completed_traversals >= max {
                info!(
                    "{} {:?} retiring after {} traversals",
                    self.kind.display_name(),
                    self.id,
                    self.completed_traversals
                );
                self.dispose(ctx.scheduler, ctx.events);
                return;
            }
        }

        self.entry_side = self.tuning.entry.roll(self.home_side, &mut self.rng);
        let wait = self.tuning.wait_ms.sample(&mut self.rng);
        self.timers
            .schedule_once(ctx.scheduler, wait, TimerEvent::Entry);
        debug!(
            "{:?} left the screen, re-entering from {:?} in {wait}ms",
            self.id, self.entry_side
        );
    }
}
