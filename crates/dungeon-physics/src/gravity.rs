//! Brute-force N-body gravity with merge-on-contact.
//!
//! The world is unbounded. Each [`GravityWorld::step`] runs five phases in
//! order: accumulate pairwise forces into velocities, integrate positions,
//! append to trails, tick down merge flashes, then merge touching bodies.
//!
//! Merging scans `i` ascending and `j = i + 1` ascending. When `j` touches
//! `i` it is folded into `i` and removed with an order-preserving
//! `Vec::remove`, and the *same* `j` index is examined again (it now holds
//! the next body). The lower index always survives.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Default gravitational constant.
pub const DEFAULT_G: f64 = 1.0;
/// Lower end of the random spawn mass and of the colour ramp.
pub const MIN_MASS: f64 = 10.0;
/// Upper end of the random spawn mass and of the colour ramp.
pub const MAX_MASS: f64 = 500.0;
/// Trail capacity of an ordinary body.
pub const TRAIL_LENGTH: usize = 80;
/// Trail capacity of a comet.
pub const COMET_TRAIL_LENGTH: usize = 150;
/// Frames a body stays highlighted after absorbing another.
pub const MERGE_FLASH_FRAMES: u32 = 10;

/// Squared distances below this are clamped to avoid singular forces.
const MIN_DIST_SQ: f64 = 1.0;

/// Display radius of a body: `6 + 1.5·√m`. Strictly increasing in `m`.
pub fn mass_to_radius(mass: f64) -> f64 {
    6.0 + mass.sqrt() * 1.5
}

/// Blue for light bodies, red for heavy ones.
pub fn mass_to_color(mass: f64) -> Rgba {
    let t = ((mass - MIN_MASS) / (MAX_MASS - MIN_MASS)).clamp(0.0, 1.0);
    Rgba::rgb(
        (80.0 + 175.0 * t) as u8,
        (80.0 + 40.0 * (1.0 - t)) as u8,
        (255.0 * (1.0 - t)) as u8,
    )
}

/// A past position of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
}

// ---------------------------------------------------------------------------
// GravityBody
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GravityBody {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Always positive; only grows, through merges.
    pub mass: f64,
    pub color: Rgba,
    /// Oldest point at the front.
    pub trail: VecDeque<TrailPoint>,
    /// Frames of merge highlight remaining.
    pub flash: u32,
    pub is_comet: bool,
}

impl GravityBody {
    /// An ordinary body coloured by its mass.
    ///
    /// # Panics
    ///
    /// Panics if `mass` is not positive and finite.
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, mass: f64) -> Self {
        assert!(
            mass > 0.0 && mass.is_finite(),
            "body mass must be positive and finite, got {mass}"
        );
        Self {
            x,
            y,
            vx,
            vy,
            mass,
            color: mass_to_color(mass),
            trail: VecDeque::new(),
            flash: 0,
            is_comet: false,
        }
    }

    /// A white, long-trailed body.
    pub fn comet(x: f64, y: f64, vx: f64, vy: f64, mass: f64) -> Self {
        Self {
            color: Rgba::WHITE,
            is_comet: true,
            ..Self::new(x, y, vx, vy, mass)
        }
    }

    pub fn radius(&self) -> f64 {
        mass_to_radius(self.mass)
    }

    pub fn trail_capacity(&self) -> usize {
        if self.is_comet {
            COMET_TRAIL_LENGTH
        } else {
            TRAIL_LENGTH
        }
    }

    /// Whether this body's disc touches `other`'s.
    pub fn touches(&self, other: &GravityBody) -> bool {
        (self.x - other.x).hypot(self.y - other.y) < self.radius() + other.radius()
    }

    fn record_trail(&mut self) {
        self.trail.push_back(TrailPoint {
            x: self.x,
            y: self.y,
        });
        let cap = self.trail_capacity();
        while self.trail.len() > cap {
            self.trail.pop_front();
        }
    }
}

/// Fold `absorbed` into `survivor`.
///
/// Mass is summed; velocity is the momentum-weighted mean and position the
/// centre of mass. The colour is recomputed from the new mass, the longer of
/// the two trails is kept, and the survivor starts flashing.
pub fn merge_into(survivor: &mut GravityBody, absorbed: GravityBody) {
    let (m1, m2) = (survivor.mass, absorbed.mass);
    let total = m1 + m2;

    survivor.vx = (survivor.vx * m1 + absorbed.vx * m2) / total;
    survivor.vy = (survivor.vy * m1 + absorbed.vy * m2) / total;
    survivor.x = (survivor.x * m1 + absorbed.x * m2) / total;
    survivor.y = (survivor.y * m1 + absorbed.y * m2) / total;
    survivor.mass = total;
    survivor.color = mass_to_color(total);
    if survivor.trail.len() < absorbed.trail.len() {
        survivor.trail = absorbed.trail;
    }
    survivor.flash = MERGE_FLASH_FRAMES;
}

// ---------------------------------------------------------------------------
// GravityWorld
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GravityWorld {
    bodies: Vec<GravityBody>,
    g: f64,
}

impl Default for GravityWorld {
    fn default() -> Self {
        Self::new(DEFAULT_G)
    }
}

impl GravityWorld {
    pub fn new(g: f64) -> Self {
        Self {
            bodies: Vec::new(),
            g,
        }
    }

    /// Current gravitational constant.
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Multiply `G` by `factor` if the result stays strictly inside
    /// `(0.01, 100)`; otherwise leave it unchanged. Returns whether it changed.
    pub fn scale_gravity(&mut self, factor: f64) -> bool {
        let next = self.g * factor;
        if next > 0.01 && next < 100.0 {
            self.g = next;
            true
        } else {
            false
        }
    }

    pub fn spawn(&mut self, body: GravityBody) {
        self.bodies.push(body);
    }

    pub fn bodies(&self) -> &[GravityBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.mass).sum()
    }

    /// Whether any body's disc covers the point.
    pub fn body_at(&self, x: f64, y: f64) -> bool {
        self.bodies
            .iter()
            .any(|b| (b.x - x).hypot(b.y - y) < b.radius())
    }

    /// Remove every body whose centre lies within `radius + margin` of the
    /// point. Returns how many were removed.
    pub fn remove_within(&mut self, x: f64, y: f64, margin: f64) -> usize {
        let before = self.bodies.len();
        self.bodies
            .retain(|b| (b.x - x).hypot(b.y - y) >= b.radius() + margin);
        before - self.bodies.len()
    }

    /// Advance one frame. Returns the number of merges performed.
    pub fn step(&mut self) -> usize {
        self.apply_forces();

        for body in &mut self.bodies {
            body.x += body.vx;
            body.y += body.vy;
            body.record_trail();
            body.flash = body.flash.saturating_sub(1);
        }

        let merges = self.merge_touching();
        if merges > 0 {
            tracing::debug!(merges, bodies = self.bodies.len(), "gravity merges");
        }
        merges
    }

    /// Phase 1: every body is accelerated by every other. Positions are not
    /// touched here, so the result does not depend on iteration order.
    fn apply_forces(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            let (xi, yi, mi) = {
                let b = &self.bodies[i];
                (b.x, b.y, b.mass)
            };
            let mut ax = 0.0;
            let mut ay = 0.0;
            for (j, other) in self.bodies.iter().enumerate() {
                if i == j {
                    continue;
                }
                let dx = other.x - xi;
                let dy = other.y - yi;
                if dx == 0.0 && dy == 0.0 {
                    // No direction to pull in.
                    continue;
                }
                let dist_sq = (dx * dx + dy * dy).max(MIN_DIST_SQ);
                let force = self.g * mi * other.mass / dist_sq;
                let angle = dy.atan2(dx);
                ax += force * angle.cos() / mi;
                ay += force * angle.sin() / mi;
            }
            let body = &mut self.bodies[i];
            body.vx += ax;
            body.vy += ay;
        }
    }

    /// Phase 5.
    fn merge_touching(&mut self) -> usize {
        let mut merges = 0;
        let mut i = 0;
        while i < self.bodies.len() {
            let mut j = i + 1;
            while j < self.bodies.len() {
                if self.bodies[i].touches(&self.bodies[j]) {
                    let absorbed = self.bodies.remove(j);
                    merge_into(&mut self.bodies[i], absorbed);
                    merges += 1;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        merges
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn momentum(bodies: &[GravityBody]) -> (f64, f64) {
        bodies
            .iter()
            .fold((0.0, 0.0), |(px, py), b| (px + b.mass * b.vx, py + b.mass * b.vy))
    }

    // -- 1. radius and colour ------------------------------------------------

    #[test]
    fn radius_formula() {
        assert_eq!(mass_to_radius(0.0), 6.0);
        assert_eq!(mass_to_radius(100.0), 21.0);
        assert_eq!(mass_to_radius(400.0), 36.0);
    }

    #[test]
    fn colour_ramp_endpoints() {
        assert_eq!(mass_to_color(MIN_MASS), Rgba::rgb(80, 120, 255));
        assert_eq!(mass_to_color(MAX_MASS), Rgba::rgb(255, 80, 0));
        // Clamped outside the range.
        assert_eq!(mass_to_color(1.0), mass_to_color(MIN_MASS));
        assert_eq!(mass_to_color(10_000.0), mass_to_color(MAX_MASS));
    }

    #[test]
    fn comet_is_white_with_long_trail() {
        let c = GravityBody::comet(0.0, 0.0, 20.0, 0.0, 20.0);
        assert!(c.is_comet);
        assert_eq!(c.color, Rgba::WHITE);
        assert_eq!(c.trail_capacity(), COMET_TRAIL_LENGTH);
    }

    // -- 2. forces -----------------------------------------------------------

    #[test]
    fn two_bodies_attract_along_the_axis() {
        let mut world = GravityWorld::new(1.0);
        world.spawn(GravityBody::new(0.0, 0.0, 0.0, 0.0, 10.0));
        world.spawn(GravityBody::new(100.0, 0.0, 0.0, 0.0, 10.0));
        world.apply_forces();
        let [a, b] = world.bodies() else {
            panic!("expected two bodies")
        };
        // F = 1 * 10 * 10 / 10000 = 0.01; a = F / m = 0.001
        assert!((a.vx - 0.001).abs() < 1e-12);
        assert!((b.vx + 0.001).abs() < 1e-12);
        assert!(a.vy.abs() < 1e-12);
    }

    #[test]
    fn close_pairs_clamp_distance() {
        let mut world = GravityWorld::new(1.0);
        world.spawn(GravityBody::new(0.0, 0.0, 0.0, 0.0, 10.0));
        world.spawn(GravityBody::new(0.5, 0.0, 0.0, 0.0, 10.0));
        world.apply_forces();
        // d² = 0.25 clamps to 1: a = G * m_other = 10.
        assert!((world.bodies()[0].vx - 10.0).abs() < 1e-9);
    }

    #[test]
    fn coincident_pair_feels_no_force() {
        let mut world = GravityWorld::new(1.0);
        world.spawn(GravityBody::new(5.0, 5.0, 0.0, 0.0, 10.0));
        world.spawn(GravityBody::new(5.0, 5.0, 0.0, 0.0, 10.0));
        world.apply_forces();
        for b in world.bodies() {
            assert_eq!((b.vx, b.vy), (0.0, 0.0));
        }
    }

    // -- 3. trails and flash -------------------------------------------------

    #[test]
    fn trail_is_capped_oldest_first() {
        let mut world = GravityWorld::new(0.0);
        world.spawn(GravityBody::new(0.0, 0.0, 1.0, 0.0, 10.0));
        for _ in 0..(TRAIL_LENGTH + 5) {
            world.step();
        }
        let trail = &world.bodies()[0].trail;
        assert_eq!(trail.len(), TRAIL_LENGTH);
        assert_eq!(trail.front().map(|p| p.x), Some(6.0));
        assert_eq!(trail.back().map(|p| p.x), Some((TRAIL_LENGTH + 5) as f64));
    }

    #[test]
    fn flash_counts_down_to_zero() {
        let mut world = GravityWorld::new(0.0);
        let mut b = GravityBody::new(0.0, 0.0, 0.0, 0.0, 10.0);
        b.flash = 2;
        world.spawn(b);
        world.step();
        assert_eq!(world.bodies()[0].flash, 1);
        world.step();
        world.step();
        assert_eq!(world.bodies()[0].flash, 0);
    }

    // -- 4. merging ----------------------------------------------------------

    #[test]
    fn coincident_merge_scenario() {
        let mut world = GravityWorld::new(DEFAULT_G);
        world.spawn(GravityBody::new(0.0, 0.0, 2.0, 0.0, 100.0));
        world.spawn(GravityBody::new(0.0, 0.0, -1.0, 0.0, 300.0));
        assert_eq!(world.step(), 1);
        let [merged] = world.bodies() else {
            panic!("expected one body")
        };
        assert_eq!(merged.mass, 400.0);
        assert!((merged.vx + 0.25).abs() < 1e-12);
        assert_eq!(merged.vy, 0.0);
        assert_eq!(merged.flash, MERGE_FLASH_FRAMES);
        assert_eq!(merged.color, mass_to_color(400.0));
    }

    #[test]
    fn merge_conserves_mass_and_momentum() {
        let mut a = GravityBody::new(10.0, 0.0, 1.5, -0.5, 120.0);
        let b = GravityBody::new(12.0, 3.0, -2.0, 1.0, 45.0);
        let before = momentum(&[a.clone(), b.clone()]);
        merge_into(&mut a, b);
        let after = momentum(std::slice::from_ref(&a));
        assert_eq!(a.mass, 165.0);
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
    }

    #[test]
    fn merge_keeps_longer_trail() {
        let mut a = GravityBody::new(0.0, 0.0, 0.0, 0.0, 50.0);
        let mut b = GravityBody::new(0.0, 0.0, 0.0, 0.0, 50.0);
        a.trail.push_back(TrailPoint { x: 1.0, y: 1.0 });
        for i in 0..3 {
            b.trail.push_back(TrailPoint {
                x: i as f64,
                y: 0.0,
            });
        }
        merge_into(&mut a, b);
        assert_eq!(a.trail.len(), 3);
    }

    #[test]
    fn chain_merge_reexamines_same_index() {
        // Three stacked bodies all collapse into index 0 in one step.
        let mut world = GravityWorld::new(0.0);
        world.spawn(GravityBody::new(0.0, 0.0, 0.0, 0.0, 10.0));
        world.spawn(GravityBody::new(1.0, 0.0, 0.0, 0.0, 20.0));
        world.spawn(GravityBody::new(2.0, 0.0, 0.0, 0.0, 30.0));
        world.spawn(GravityBody::new(10_000.0, 0.0, 0.0, 0.0, 40.0));
        assert_eq!(world.step(), 2);
        assert_eq!(world.len(), 2);
        assert_eq!(world.bodies()[0].mass, 60.0);
        assert_eq!(world.bodies()[1].mass, 40.0);
    }

    #[test]
    fn distant_bodies_do_not_merge() {
        let mut world = GravityWorld::new(0.0);
        world.spawn(GravityBody::new(0.0, 0.0, 0.0, 0.0, 100.0));
        world.spawn(GravityBody::new(43.0, 0.0, 0.0, 0.0, 100.0));
        // R(100) + R(100) = 42.
        assert_eq!(world.step(), 0);
        assert_eq!(world.len(), 2);
    }

    // -- 5. world helpers ----------------------------------------------------

    #[test]
    fn scale_gravity_respects_bounds() {
        let mut world = GravityWorld::new(1.0);
        assert!(world.scale_gravity(1.2));
        assert!((world.g() - 1.2).abs() < 1e-12);
        assert!(!world.scale_gravity(1000.0));
        assert!((world.g() - 1.2).abs() < 1e-12);
        assert!(!world.scale_gravity(0.0));
    }

    #[test]
    fn body_at_and_remove_within() {
        let mut world = GravityWorld::new(1.0);
        world.spawn(GravityBody::new(0.0, 0.0, 0.0, 0.0, 100.0));
        world.spawn(GravityBody::new(500.0, 0.0, 0.0, 0.0, 100.0));
        assert!(world.body_at(10.0, 10.0));
        assert!(!world.body_at(250.0, 0.0));

        // R(100) = 21, margin 24: reach 45.
        assert_eq!(world.remove_within(40.0, 0.0, 24.0), 1);
        assert_eq!(world.len(), 1);
        assert_eq!(world.bodies()[0].x, 500.0);
    }
}
