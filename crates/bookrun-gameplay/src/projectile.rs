//! Thrown projectiles and dropped hazards.
//!
//! NPCs never own what they throw. They call into a [`Spawner`] and forget
//! about it; the [`ProjectileSet`] moves everything, culls what leaves the
//! screen and reports player contact.

use bookrun_common::{HazardId, ProjectileId, Side};
use glam::Vec2;
use std::collections::VecDeque;
use tracing::{debug, trace};

use crate::camera::{self, CameraFrame};
use crate::events::{EventBus, GameEvent};
use crate::tuning::{HazardTuning, ProjectileTuning};

/// Spawn capability handed to NPCs.
pub trait Spawner {
    /// Throws a projectile from `origin` (thrower's feet) toward `target_x`.
    fn spawn_projectile(&mut self, origin: Vec2, target_x: f32) -> ProjectileId;

    /// Drops a hazard on the ground at `origin`.
    fn spawn_hazard(&mut self, origin: Vec2) -> HazardId;
}

/// Recent positions of a projectile, newest last.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<Vec2>,
    capacity: usize,
}

impl Trail {
    /// Creates an empty trail keeping at most `capacity` points.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a point, dropping the oldest when full.
    pub fn push(&mut self, point: Vec2) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Iterates oldest to newest.
    pub fn points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points.iter().copied()
    }

    /// Number of recorded points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no points are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A thrown object flying in a straight line.
#[derive(Debug, Clone)]
pub struct Projectile {
    id: ProjectileId,
    position: Vec2,
    velocity: Vec2,
    target_x: f32,
    trail: Trail,
}

impl Projectile {
    /// Creates a projectile at `origin` heading toward `target_x`.
    #[must_use]
    pub fn new(
        id: ProjectileId,
        origin: Vec2,
        target_x: f32,
        speed: f32,
        trail_len: usize,
    ) -> Self {
        // Aimed straight at the thrower's own X: keep flying left.
        let heading = Side::from_delta(target_x - origin.x, Side::Left);
        Self {
            id,
            position: origin,
            velocity: Vec2::new(heading.sign() * speed, 0.0),
            target_x,
            trail: Trail::new(trail_len),
        }
    }

    /// Handle.
    #[must_use]
    pub fn id(&self) -> ProjectileId {
        self.id
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity in units per second.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// X the projectile was aimed at.
    #[must_use]
    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    /// Trail left behind.
    #[must_use]
    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Moves one frame, updating the trail in place.
    pub fn update(&mut self, dt_ms: f32) {
        self.trail.push(self.position);
        self.position += self.velocity * (dt_ms / 1000.0);
    }
}

/// Something left on the ground for a while.
#[derive(Debug, Clone)]
pub struct Hazard {
    id: HazardId,
    position: Vec2,
    remaining_ms: f32,
}

impl Hazard {
    /// Handle.
    #[must_use]
    pub fn id(&self) -> HazardId {
        self.id
    }

    /// Ground position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Time left before it disappears.
    #[must_use]
    pub fn remaining_ms(&self) -> f32 {
        self.remaining_ms
    }
}

/// Whether `point` lies in the box standing on `feet`.
fn touches(feet: Vec2, point: Vec2, half_width: f32, half_height: f32) -> bool {
    let centre = feet - Vec2::new(0.0, half_height);
    (point.x - centre.x).abs() <= half_width && (point.y - centre.y).abs() <= half_height
}

/// Owns every live projectile and hazard in a zone.
#[derive(Debug)]
pub struct ProjectileSet {
    projectile_tuning: ProjectileTuning,
    hazard_tuning: HazardTuning,
    projectiles: Vec<Projectile>,
    hazards: Vec<Hazard>,
    next_id: u64,
}

impl ProjectileSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(projectile_tuning: ProjectileTuning, hazard_tuning: HazardTuning) -> Self {
        Self {
            projectile_tuning,
            hazard_tuning,
            projectiles: Vec::new(),
            hazards: Vec::new(),
            next_id: 0,
        }
    }

    /// Live projectiles.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Live hazards.
    #[must_use]
    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.hazards.clear();
    }

    /// Advances every projectile and hazard by one frame.
    ///
    /// Projectiles are removed on touching the player or once outside the
    /// viewport (plus the cull margin) and flying away from it. A throw
    /// released off screen toward the player survives until it crosses.
    /// Hazards go on expiry, when scrolled off screen, or on touching the
    /// player. Returns the confidence lost this frame.
    pub fn update(
        &mut self,
        frame: &CameraFrame,
        player: Option<Vec2>,
        dt_ms: f32,
        events: &EventBus,
    ) -> u32 {
        let dt_ms = dt_ms.max(0.0);
        let mut damage = 0;
        let p = self.projectile_tuning;

        self.projectiles.retain_mut(|projectile| {
            projectile.update(dt_ms);
            if let Some(feet) = player {
                if touches(
                    feet,
                    projectile.position,
                    p.contact_half_width,
                    p.contact_half_height,
                ) {
                    debug!("Projectile {:?} hit the player", projectile.id);
                    events.publish(GameEvent::ProjectileHit {
                        projectile: projectile.id,
                        damage: p.damage,
                    });
                    damage += p.damage;
                    return false;
                }
            }
            if camera::is_outbound(
                frame,
                projectile.position.x,
                projectile.velocity.x,
                p.cull_margin,
            ) {
                trace!("Projectile {:?} left the screen", projectile.id);
                return false;
            }
            true
        });

        let h = self.hazard_tuning;
        self.hazards.retain_mut(|hazard| {
            hazard.remaining_ms -= dt_ms;
            if hazard.remaining_ms <= 0.0 {
                return false;
            }
            if let Some(feet) = player {
                if touches(
                    feet,
                    hazard.position,
                    h.contact_half_width,
                    h.contact_half_height,
                ) {
                    debug!("Hazard {:?} hit the player", hazard.id);
                    events.publish(GameEvent::HazardHit {
                        hazard: hazard.id,
                        damage: h.damage,
                    });
                    damage += h.damage;
                    return false;
                }
            }
            frame.contains_x(hazard.position.x, h.cull_margin)
        });

        damage
    }

    fn next_raw_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Spawner for ProjectileSet {
    fn spawn_projectile(&mut self, origin: Vec2, target_x: f32) -> ProjectileId {
        let id = ProjectileId::from_raw(self.next_raw_id());
        let release = origin - Vec2::new(0.0, self.projectile_tuning.release_height);
        self.projectiles.push(Projectile::new(
            id,
            release,
            target_x,
            self.projectile_tuning.speed,
            self.projectile_tuning.trail_len,
        ));
        trace!("Spawned projectile {:?} at {:?} aimed at x={target_x}", id, release);
        id
    }

    fn spawn_hazard(&mut self, origin: Vec2) -> HazardId {
        let id = HazardId::from_raw(self.next_raw_id());
        self.hazards.push(Hazard {
            id,
            position: origin,
            remaining_ms: self.hazard_tuning.linger_ms,
        });
        trace!("Spawned hazard {:?} at {:?}", id, origin);
        id
    }
}
