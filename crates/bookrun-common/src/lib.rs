//! # Bookrun Common
//!
//! Common types shared by every Bookrun crate:
//! - ID types (EntityId, TimerId, ProjectileId, HazardId)
//! - Screen-side vocabulary used for spawning and facing
//! - Error taxonomy
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod side;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::side::*;
}

pub use prelude::*;
