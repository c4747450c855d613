//! End-of-run summary printed as JSON.

use bookrun_gameplay::{GameEvent, PatrolSnapshot};
use serde::Serialize;
use tracing::{debug, info};

/// Counts of every event seen during a run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EventTally {
    /// NPCs starting to walk in
    pub entries: u64,
    /// Traversals started
    pub traversals: u64,
    /// Projectiles thrown
    pub attacks: u64,
    /// Mid-crossing stalls
    pub stalls: u64,
    /// Tutorial hints shown
    pub hints: u64,
    /// Hazards dropped
    pub hazards_dropped: u64,
    /// Traversals finished
    pub exits: u64,
    /// NPCs disposed
    pub disposals: u64,
    /// Projectiles that hit the player
    pub projectile_hits: u64,
    /// Hazards the player stepped on
    pub hazard_hits: u64,
}

impl EventTally {
    /// Counts and logs one event.
    pub fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::NpcEntering {
                entity_id,
                kind,
                side,
            } => {
                self.entries += 1;
                info!("{} {:?} entering from {:?}", kind.display_name(), entity_id, side);
            },
            GameEvent::NpcTraversing { entity_id, x } => {
                self.traversals += 1;
                debug!("{:?} on screen at x={x}", entity_id);
            },
            GameEvent::AttackIssued {
                entity_id,
                target_x,
                ..
            } => {
                self.attacks += 1;
                debug!("{:?} threw at x={target_x}", entity_id);
            },
            GameEvent::PhaseStallStarted {
                entity_id,
                duration_ms,
            } => {
                self.stalls += 1;
                info!("{:?} stalled for {duration_ms}ms", entity_id);
            },
            GameEvent::PhaseStallHint { entity_id } => {
                self.hints += 1;
                info!("Hint: {:?} has stopped to rest, get past now", entity_id);
            },
            GameEvent::HazardDropped { entity_id, hazard } => {
                self.hazards_dropped += 1;
                debug!("{:?} dropped {:?}", entity_id, hazard);
            },
            GameEvent::NpcExited {
                entity_id,
                traversals,
            } => {
                self.exits += 1;
                info!("{:?} left the screen ({traversals} crossings)", entity_id);
            },
            GameEvent::NpcDisposed { entity_id } => {
                self.disposals += 1;
                info!("{:?} disposed", entity_id);
            },
            GameEvent::ProjectileHit { projectile, damage } => {
                self.projectile_hits += 1;
                info!("Player hit by {:?}, -{damage} confidence", projectile);
            },
            GameEvent::HazardHit { hazard, damage } => {
                self.hazard_hits += 1;
                info!("Player stepped on {:?}, -{damage} confidence", hazard);
            },
        }
    }
}

/// Result of one simulator run.
#[derive(Debug, Serialize)]
pub struct SimReport {
    /// Seed used
    pub seed: u64,
    /// Simulated time in milliseconds
    pub simulated_ms: f64,
    /// Render frames stood in for
    pub frames: u64,
    /// Fixed steps run
    pub steps: u64,
    /// Confidence the player lost
    pub confidence_lost: u32,
    /// NPC state at the end of the run
    pub npcs: Vec<PatrolSnapshot>,
    /// Events seen
    pub events: EventTally,
}
