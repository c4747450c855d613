//! Event bus for signals leaving the gameplay core.
//!
//! The HUD, audio and tutorial layers read these; nothing inside the core
//! subscribes to its own events.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use bookrun_common::{EntityId, HazardId, ProjectileId, Side};

use crate::patrol::ArchetypeKind;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// NPC began walking in from off screen
    NpcEntering {
        /// Entity ID
        entity_id: EntityId,
        /// Archetype
        kind: ArchetypeKind,
        /// Side it enters from
        side: Side,
    },
    /// NPC reached the viewport edge and started its traversal
    NpcTraversing {
        /// Entity ID
        entity_id: EntityId,
        /// World X where it appeared
        x: f32,
    },
    /// NPC threw something
    AttackIssued {
        /// Entity ID
        entity_id: EntityId,
        /// Spawned projectile
        projectile: ProjectileId,
        /// X the projectile was aimed at
        target_x: f32,
    },
    /// NPC stalled mid-traversal
    PhaseStallStarted {
        /// Entity ID
        entity_id: EntityId,
        /// Stall length
        duration_ms: f32,
    },
    /// First stall of this NPC's lifetime; shown once as a tutorial hint
    PhaseStallHint {
        /// Entity ID
        entity_id: EntityId,
    },
    /// A stall dropped its side hazard
    HazardDropped {
        /// Entity ID
        entity_id: EntityId,
        /// Spawned hazard
        hazard: HazardId,
    },
    /// NPC left the screen and went back to waiting
    NpcExited {
        /// Entity ID
        entity_id: EntityId,
        /// Traversals completed so far
        traversals: u32,
    },
    /// NPC was disposed
    NpcDisposed {
        /// Entity ID
        entity_id: EntityId,
    },
    /// A projectile reached the player
    ProjectileHit {
        /// Projectile
        projectile: ProjectileId,
        /// Confidence lost
        damage: u32,
    },
    /// The player stepped on a hazard
    HazardHit {
        /// Hazard
        hazard: HazardId,
        /// Confidence lost
        damage: u32,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GameEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: GameEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        let entity_id = EntityId::new();
        bus.publish(GameEvent::NpcDisposed { entity_id });
        bus.publish(GameEvent::PhaseStallHint { entity_id });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GameEvent::NpcDisposed { entity_id });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_events() {
        let bus = EventBus::new(1);
        let entity_id = EntityId::new();
        bus.publish(GameEvent::NpcDisposed { entity_id });
        bus.publish(GameEvent::NpcDisposed { entity_id });
        assert_eq!(bus.drain().len(), 1);
    }
}
