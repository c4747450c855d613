//! Screen sides and horizontal headings.

use serde::{Deserialize, Serialize};

/// A horizontal side of the viewport, also used as a heading or facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Left edge / moving or facing left
    Left,
    /// Right edge / moving or facing right
    Right,
}

impl Side {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Returns -1.0 for left, +1.0 for right.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Heading of an entity that entered from this side.
    #[must_use]
    pub const fn travel_heading(self) -> Self {
        self.opposite()
    }

    /// Side that a signed horizontal delta points to. Zero maps to `fallback`.
    #[must_use]
    pub fn from_delta(dx: f32, fallback: Self) -> Self {
        if dx > 0.0 {
            Self::Right
        } else if dx < 0.0 {
            Self::Left
        } else {
            fallback
        }
    }
}
