//! Dungeon Physics -- the two simulation engines behind the demo scenes.
//!
//! This crate has no windowing or input dependencies. Each engine owns its
//! bodies in a plain `Vec` and advances them one frame per `step()` call,
//! using frame-relative units (pixels per frame) rather than a time delta.
//!
//! - [`collision`] -- many-body elastic collisions between discs, broad phase
//!   via a uniform spatial grid, wall bounces against the viewport.
//! - [`gravity`] -- brute-force O(N²) N-body gravity with merge-on-contact,
//!   per-body trails and merge flashes.
//!
//! # Quick Start
//!
//! ```
//! use dungeon_physics::prelude::*;
//!
//! let mut world = CollisionWorld::new(800.0, 600.0);
//! world.spawn(Ball::new(100.0, 100.0, 3.0, 0.0, 20.0, Rgba::WHITE));
//! world.spawn(Ball::new(140.0, 100.0, -3.0, 0.0, 20.0, Rgba::WHITE));
//! let stats = world.step();
//! assert_eq!(stats.collisions, 1);
//!
//! let mut gravity = GravityWorld::new(DEFAULT_G);
//! gravity.spawn(GravityBody::new(0.0, 0.0, 2.0, 0.0, 100.0));
//! gravity.spawn(GravityBody::new(0.0, 0.0, -1.0, 0.0, 300.0));
//! assert_eq!(gravity.step(), 1);
//! assert_eq!(gravity.bodies()[0].mass, 400.0);
//! ```

#![deny(unsafe_code)]

pub mod collision;
pub mod color;
pub mod gravity;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::collision::{
        resolve_pair, Ball, CollisionWorld, SpatialGrid, StepStats, BALL_DENSITY,
        DEFAULT_CELL_SIZE,
    };
    pub use crate::color::Rgba;
    pub use crate::gravity::{
        mass_to_color, mass_to_radius, merge_into, GravityBody, GravityWorld, TrailPoint,
        COMET_TRAIL_LENGTH, DEFAULT_G, MAX_MASS, MERGE_FLASH_FRAMES, MIN_MASS, TRAIL_LENGTH,
    };
}
