//! Tuning parameters for patrolling NPCs and their spawns.
//!
//! Tuning can be loaded from a TOML file. Missing tables fall back to the
//! built-in OldMan/Bully parameter sets.

use bookrun_common::{BookrunResult, ConfigError, Side};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::camera::{EXIT_BUFFER, SPAWN_OFFSET};

/// Inclusive range of durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    /// Shortest duration
    pub min_ms: f32,
    /// Longest duration
    pub max_ms: f32,
}

impl DurationRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(min_ms: f32, max_ms: f32) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that always yields `ms`.
    #[must_use]
    pub const fn fixed(ms: f32) -> Self {
        Self::new(ms, ms)
    }

    /// Draws a duration uniformly from the range.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> f32 {
        self.min_ms + (self.max_ms - self.min_ms) * rng.f32()
    }

    /// Whether `ms` falls within the range.
    #[must_use]
    pub fn contains(&self, ms: f32) -> bool {
        ms >= self.min_ms && ms <= self.max_ms
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min_ms < 0.0 || !self.min_ms.is_finite() {
            return Err(ConfigError::NonPositive {
                field,
                value: self.min_ms,
            });
        }
        if self.min_ms > self.max_ms || !self.max_ms.is_finite() {
            return Err(ConfigError::InvalidRange {
                field,
                min: self.min_ms,
                max: self.max_ms,
            });
        }
        Ok(())
    }
}

/// How an NPC picks the side it enters from on each re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EntryPolicy {
    /// Always the side it was created on
    Fixed,
    /// Home side with probability `home_weight`, otherwise the other side
    Weighted {
        /// Probability of entering from the home side
        home_weight: f32,
    },
}

impl EntryPolicy {
    /// Picks the next entry side.
    pub fn roll(&self, home: Side, rng: &mut fastrand::Rng) -> Side {
        match *self {
            Self::Fixed => home,
            Self::Weighted { home_weight } => {
                if rng.f32() < home_weight {
                    home
                } else {
                    home.opposite()
                }
            },
        }
    }
}

/// Parameters of the mid-traversal stall branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseStallTuning {
    /// Patrol time before the stall kicks in
    pub pre_phase_ms: DurationRange,
    /// How long the stall lasts
    pub stall_ms: DurationRange,
    /// Fraction of the stall after which the side hazard drops
    pub hazard_at: f32,
}

/// Everything that distinguishes one NPC archetype from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolTuning {
    /// Walking speed in world units per second
    pub speed: f32,
    /// Time between attacks while attacking
    pub attack_interval_ms: f32,
    /// Maximum attacks per traversal
    pub attack_budget: u32,
    /// Delay before the very first entry
    pub initial_delay_ms: f32,
    /// Time between starting to enter and appearing at the edge
    pub enter_transit_ms: f32,
    /// Time spent off screen between traversals
    pub wait_ms: DurationRange,
    /// Re-entry side selection
    pub entry: EntryPolicy,
    /// Stall branch; `None` for archetypes that never stall
    #[serde(default)]
    pub phase_stall: Option<PhaseStallTuning>,
    /// How far past the viewport edge the NPC appears
    #[serde(default = "default_spawn_offset")]
    pub spawn_offset: f32,
    /// How far past the viewport edge the NPC counts as leaving
    #[serde(default = "default_exit_buffer")]
    pub exit_buffer: f32,
    /// Extra distance walked after leaving before the traversal ends
    #[serde(default = "default_exit_clearance")]
    pub exit_clearance: f32,
    /// Maximum random offset added to the player's X when aiming
    #[serde(default)]
    pub target_jitter: f32,
    /// Traversals before the NPC retires itself; `None` loops forever
    #[serde(default)]
    pub max_cycles: Option<u32>,
}

fn default_spawn_offset() -> f32 {
    SPAWN_OFFSET
}

fn default_exit_buffer() -> f32 {
    EXIT_BUFFER
}

fn default_exit_clearance() -> f32 {
    50.0
}

impl PatrolTuning {
    /// Checks every value for something the state machine can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("speed", self.speed)?;
        positive("attack_interval_ms", self.attack_interval_ms)?;
        non_negative("initial_delay_ms", self.initial_delay_ms)?;
        non_negative("enter_transit_ms", self.enter_transit_ms)?;
        non_negative("spawn_offset", self.spawn_offset)?;
        non_negative("exit_buffer", self.exit_buffer)?;
        non_negative("exit_clearance", self.exit_clearance)?;
        non_negative("target_jitter", self.target_jitter)?;
        self.wait_ms.validate("wait_ms")?;

        if let EntryPolicy::Weighted { home_weight } = self.entry {
            unit("entry.home_weight", home_weight)?;
        }
        if let Some(stall) = &self.phase_stall {
            stall.pre_phase_ms.validate("phase_stall.pre_phase_ms")?;
            stall.stall_ms.validate("phase_stall.stall_ms")?;
            unit("phase_stall.hazard_at", stall.hazard_at)?;
        }
        Ok(())
    }

    /// Longest possible traversal at this speed across `viewport_width`.
    ///
    /// Covers the walk from one spawn point to past the far exit threshold,
    /// plus the longest stall.
    #[must_use]
    pub fn max_traversal_ms(&self, viewport_width: f32) -> f32 {
        let distance =
            viewport_width + self.spawn_offset + self.exit_buffer + self.exit_clearance;
        let walk = distance / self.speed * 1000.0;
        let stall = self.phase_stall.map_or(0.0, |s| s.stall_ms.max_ms);
        walk + stall
    }
}

/// Projectile parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Flight speed in world units per second
    pub speed: f32,
    /// Half width of the contact box around the player
    pub contact_half_width: f32,
    /// Half height of the contact box around the player
    pub contact_half_height: f32,
    /// Distance past the viewport edge before the projectile is removed
    pub cull_margin: f32,
    /// Confidence lost on contact
    pub damage: u32,
    /// Number of past positions kept for the trail
    pub trail_len: usize,
    /// Height above the thrower's feet at which projectiles leave the hand
    pub release_height: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 320.0,
            contact_half_width: 24.0,
            contact_half_height: 48.0,
            cull_margin: 64.0,
            damage: 10,
            trail_len: 8,
            release_height: 40.0,
        }
    }
}

/// Side hazard parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// How long the hazard stays on the ground
    pub linger_ms: f32,
    /// Half width of the contact box around the player
    pub contact_half_width: f32,
    /// Half height of the contact box; jumping clears it
    pub contact_half_height: f32,
    /// Distance past the viewport edge before a scrolled-away hazard is removed
    pub cull_margin: f32,
    /// Confidence lost on contact
    pub damage: u32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            linger_ms: 4000.0,
            contact_half_width: 20.0,
            contact_half_height: 16.0,
            cull_margin: 32.0,
            damage: 5,
        }
    }
}

/// All tuning for one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneTuning {
    /// Slow, stalling archetype
    pub old_man: PatrolTuning,
    /// Fast, attack-heavy archetype
    pub bully: PatrolTuning,
    /// Thrown objects
    pub projectile: ProjectileTuning,
    /// Stall side hazard
    pub hazard: HazardTuning,
    /// Bounded event bus capacity
    pub event_capacity: usize,
}

impl Default for ZoneTuning {
    fn default() -> Self {
        Self {
            old_man: PatrolTuning::old_man(),
            bully: PatrolTuning::bully(),
            projectile: ProjectileTuning::default(),
            hazard: HazardTuning::default(),
            event_capacity: 1024,
        }
    }
}

impl ZoneTuning {
    /// Parses and validates tuning from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let tuning: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Loads tuning from a file.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read is an I/O error; one that does not parse or validate is a config
    /// error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> BookrunResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Tuning file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read tuning file {}: {e}", path.display());
            e
        })?;
        let tuning = Self::from_toml_str(&contents)?;
        info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validates both archetypes and the spawn parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.old_man.validate()?;
        self.bully.validate()?;
        positive("projectile.speed", self.projectile.speed)?;
        non_negative("projectile.contact_half_width", self.projectile.contact_half_width)?;
        non_negative("projectile.contact_half_height", self.projectile.contact_half_height)?;
        non_negative("projectile.cull_margin", self.projectile.cull_margin)?;
        non_negative("hazard.linger_ms", self.hazard.linger_ms)?;
        non_negative("hazard.contact_half_width", self.hazard.contact_half_width)?;
        non_negative("hazard.contact_half_height", self.hazard.contact_half_height)?;
        non_negative("hazard.cull_margin", self.hazard.cull_margin)?;
        if self.event_capacity == 0 {
            return Err(ConfigError::NonPositive {
                field: "event_capacity",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}
