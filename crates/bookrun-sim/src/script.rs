//! Scripted player and camera for headless runs.
//!
//! Scripts are JSON arrays of actions, played in order and looped.

use anyhow::{Context, Result};
use bookrun_gameplay::CameraFrame;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Upward speed at the start of a jump, units per second.
const JUMP_SPEED: f32 = 520.0;

/// Downward acceleration, units per second squared.
const GRAVITY: f32 = 1400.0;

/// A single scripted player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptAction {
    /// Stand still
    Wait {
        /// Duration in milliseconds
        duration_ms: f32,
    },
    /// Walk at a signed horizontal speed
    Walk {
        /// Units per second (negative = left)
        speed: f32,
        /// Duration in milliseconds
        duration_ms: f32,
    },
    /// Jump if standing on the ground
    Jump,
    /// Leave the scene (no player to aim at)
    Away {
        /// Duration in milliseconds
        duration_ms: f32,
    },
}

impl ScriptAction {
    fn duration_ms(&self) -> f32 {
        match self {
            Self::Wait { duration_ms }
            | Self::Walk { duration_ms, .. }
            | Self::Away { duration_ms } => *duration_ms,
            Self::Jump => 0.0,
        }
    }
}

/// Loads a script from JSON.
pub fn load_script(path: &Path) -> Result<Vec<ScriptAction>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let actions = parse_script(&text)
        .with_context(|| format!("failed to parse script {}", path.display()))?;
    info!("Loaded {} script actions from {:?}", actions.len(), path);
    Ok(actions)
}

/// Parses a script from JSON text.
pub fn parse_script(text: &str) -> Result<Vec<ScriptAction>> {
    let actions: Vec<ScriptAction> = serde_json::from_str(text)?;
    anyhow::ensure!(!actions.is_empty(), "script has no actions");
    Ok(actions)
}

/// Built-in script: idle, stroll right, double back before the camera
/// catches up, hop, then run.
#[must_use]
pub fn default_script() -> Vec<ScriptAction> {
    vec![
        ScriptAction::Wait { duration_ms: 2000.0 },
        ScriptAction::Walk {
            speed: -80.0,
            duration_ms: 1500.0,
        },
        ScriptAction::Walk {
            speed: 120.0,
            duration_ms: 5000.0,
        },
        ScriptAction::Jump,
        ScriptAction::Wait { duration_ms: 3000.0 },
        ScriptAction::Jump,
        ScriptAction::Walk {
            speed: 180.0,
            duration_ms: 6000.0,
        },
        ScriptAction::Away { duration_ms: 2000.0 },
    ]
}

/// Player driven by a looping script, with a camera that follows it.
#[derive(Debug)]
pub struct ScriptedPlayer {
    actions: Vec<ScriptAction>,
    index: usize,
    elapsed_ms: f32,
    position: Vec2,
    vertical_speed: f32,
    ground_y: f32,
    present: bool,
    viewport_width: f32,
}

impl ScriptedPlayer {
    /// Creates a player standing at `start_x` on `ground_y`.
    #[must_use]
    pub fn new(actions: Vec<ScriptAction>, start_x: f32, ground_y: f32, viewport_width: f32) -> Self {
        Self {
            actions,
            index: 0,
            elapsed_ms: 0.0,
            position: Vec2::new(start_x, ground_y),
            vertical_speed: 0.0,
            ground_y,
            present: true,
            viewport_width,
        }
    }

    /// Player feet, or `None` while away.
    #[must_use]
    pub fn position(&self) -> Option<Vec2> {
        self.present.then_some(self.position)
    }

    /// Whether the player stands on the ground.
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.position.y >= self.ground_y
    }

    /// Camera centred on the player, never scrolled left of the level start.
    #[must_use]
    pub fn camera(&self) -> CameraFrame {
        let scroll_x = (self.position.x - self.viewport_width * 0.5).max(0.0);
        CameraFrame::new(scroll_x, self.viewport_width)
    }

    /// Advances the script and physics by one step.
    pub fn update(&mut self, dt_ms: f32) {
        if let Some(action) = self.actions.get(self.index).cloned() {
            match action {
                ScriptAction::Wait { .. } => self.present = true,
                ScriptAction::Walk { speed, .. } => {
                    self.present = true;
                    self.position.x += speed * dt_ms / 1000.0;
                },
                ScriptAction::Jump => {
                    if self.is_grounded() {
                        self.vertical_speed = -JUMP_SPEED;
                    }
                },
                ScriptAction::Away { .. } => self.present = false,
            }

            self.elapsed_ms += dt_ms;
            if self.elapsed_ms >= action.duration_ms() {
                self.elapsed_ms = 0.0;
                self.index = (self.index + 1) % self.actions.len();
                debug!("Player script moved to action {}", self.index);
            }
        }

        let dt = dt_ms / 1000.0;
        self.vertical_speed += GRAVITY * dt;
        self.position.y += self.vertical_speed * dt;
        if self.position.y >= self.ground_y {
            self.position.y = self.ground_y;
            self.vertical_speed = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_moves_and_camera_follows() {
        let mut player = ScriptedPlayer::new(
            vec![ScriptAction::Walk {
                speed: 100.0,
                duration_ms: 10_000.0,
            }],
            400.0,
            400.0,
            800.0,
        );
        assert_eq!(player.camera().scroll_x, 0.0);
        for _ in 0..100 {
            player.update(10.0);
        }
        let position = player.position().expect("present");
        assert!((position.x - 500.0).abs() < 1e-3);
        assert!((player.camera().scroll_x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_camera_holds_at_level_start() {
        let mut player = ScriptedPlayer::new(
            vec![ScriptAction::Walk {
                speed: -100.0,
                duration_ms: 1000.0,
            }],
            300.0,
            400.0,
            800.0,
        );
        for _ in 0..100 {
            player.update(10.0);
        }
        assert_eq!(player.camera().scroll_x, 0.0);
    }

    #[test]
    fn test_jump_leaves_and_returns_to_ground() {
        let mut player = ScriptedPlayer::new(
            vec![ScriptAction::Jump, ScriptAction::Wait { duration_ms: 5000.0 }],
            100.0,
            400.0,
            800.0,
        );
        player.update(10.0);
        player.update(10.0);
        assert!(!player.is_grounded());
        for _ in 0..200 {
            player.update(10.0);
        }
        assert!(player.is_grounded());
    }

    #[test]
    fn test_away_hides_player() {
        let mut player = ScriptedPlayer::new(
            vec![
                ScriptAction::Away { duration_ms: 100.0 },
                ScriptAction::Wait { duration_ms: 100.0 },
            ],
            100.0,
            400.0,
            800.0,
        );
        player.update(10.0);
        assert!(player.position().is_none());
        for _ in 0..10 {
            player.update(10.0);
        }
        assert!(player.position().is_some());
    }

    #[test]
    fn test_parse_script_json() {
        let actions = parse_script(
            r#"[
                {"type": "walk", "speed": 50.0, "duration_ms": 200.0},
                {"type": "jump"},
                {"type": "away", "duration_ms": 1000.0}
            ]"#,
        )
        .expect("parse");
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[1], ScriptAction::Jump);
    }

    #[test]
    fn test_empty_script_rejected() {
        assert!(parse_script("[]").is_err());
    }

    #[test]
    fn test_load_script_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("script.json");
        let text = serde_json::to_string(&default_script()).expect("serialize");
        fs::write(&path, text).expect("write");
        assert_eq!(load_script(&path).expect("load"), default_script());
    }
}
