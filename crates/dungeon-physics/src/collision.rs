//! Uniform-grid collision engine for many elastic discs in a walled viewport.
//!
//! Each [`CollisionWorld::step`]:
//!
//! 1. Moves every ball by its velocity and bounces it off the viewport walls
//!    (perfectly elastic: the velocity component of each clamped axis is
//!    negated).
//! 2. Rebuilds the [`SpatialGrid`]: every ball index goes into every cell its
//!    bounding square touches, so a ball straddling a boundary sits in up to
//!    four cells (more for balls wider than a cell).
//! 3. Walks each cell's bucket and resolves every unordered pair once per
//!    frame (a checked-pairs set removes the duplicates created in step 2).
//! 4. Bounces every ball off the walls again, since the positional
//!    separation in step 3 can push a ball through a wall. This uses the same
//!    rule as step 1, so a velocity component is negated exactly when its
//!    axis is clamped, in either pass.
//!
//! [`CollisionWorld::step`] runs the three public phases
//! [`integrate`](CollisionWorld::integrate),
//! [`resolve_collisions`](CollisionWorld::resolve_collisions) and
//! [`enforce_walls`](CollisionWorld::enforce_walls) in that order.
//!
//! Pairs are only tested when they share a cell. Because a ball is bucketed
//! into the full range of cells its bounding square covers, two overlapping
//! discs always share at least the cell holding their intersection, whatever
//! their size relative to the cell.
//!
//! Cells live in a `BTreeMap`, so pair resolution order (and therefore the
//! outcome of three-body pile-ups) is deterministic for the same input.

use std::collections::{BTreeMap, HashSet};
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Density used to derive a ball's mass from its area (arbitrary units).
pub const BALL_DENSITY: f64 = 0.001;

/// Edge length of a grid cell in pixels.
pub const DEFAULT_CELL_SIZE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Ball
// ---------------------------------------------------------------------------

/// A disc taking part in elastic collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Centre, horizontal.
    pub x: f64,
    /// Centre, vertical (screen space, grows downwards).
    pub y: f64,
    /// Pixels per frame.
    pub vx: f64,
    /// Pixels per frame.
    pub vy: f64,
    /// Always positive.
    pub radius: f64,
    pub color: Rgba,
}

impl Ball {
    /// Create a ball.
    ///
    /// # Panics
    ///
    /// Panics if `radius` is not positive and finite.
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, radius: f64, color: Rgba) -> Self {
        assert!(
            radius > 0.0 && radius.is_finite(),
            "ball radius must be positive and finite, got {radius}"
        );
        Self {
            x,
            y,
            vx,
            vy,
            radius,
            color,
        }
    }

    /// Mass proportional to the disc's area.
    pub fn mass(&self) -> f64 {
        BALL_DENSITY * PI * self.radius * self.radius
    }

    /// Linear momentum `(m·vx, m·vy)`.
    pub fn momentum(&self) -> (f64, f64) {
        let m = self.mass();
        (m * self.vx, m * self.vy)
    }
}

// ---------------------------------------------------------------------------
// Walls
// ---------------------------------------------------------------------------

/// Clamp a ball inside `[r, width - r] × [r, height - r]`, negating the
/// velocity component of every axis that was clamped.
///
/// Returns which axes were clamped as `(x, y)`.
pub fn bounce_off_walls(ball: &mut Ball, width: f64, height: f64) -> (bool, bool) {
    let r = ball.radius;
    let mut hit_x = false;
    let mut hit_y = false;

    if ball.x < r {
        ball.x = r;
        ball.vx = -ball.vx;
        hit_x = true;
    } else if ball.x > width - r {
        ball.x = width - r;
        ball.vx = -ball.vx;
        hit_x = true;
    }

    if ball.y < r {
        ball.y = r;
        ball.vy = -ball.vy;
        hit_y = true;
    } else if ball.y > height - r {
        ball.y = height - r;
        ball.vy = -ball.vy;
        hit_y = true;
    }

    (hit_x, hit_y)
}

// ---------------------------------------------------------------------------
// Pair resolution
// ---------------------------------------------------------------------------

/// Resolve a potential collision between two balls.
///
/// Does nothing (and returns `false`) when the discs do not overlap, when
/// their centres coincide (no collision normal), or when they are already
/// moving apart along the normal. Otherwise applies an elastic impulse along
/// the normal, weighted by the other ball's mass, pushes each ball half the
/// overlap apart, and returns `true`.
pub fn resolve_pair(a: &mut Ball, b: &mut Ball) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dist = dx.hypot(dy);
    let min_dist = a.radius + b.radius;

    if !(dist < min_dist && dist > 0.0) {
        return false;
    }

    let m1 = a.mass();
    let m2 = b.mass();

    // Collision normal points from b to a.
    let nx = dx / dist;
    let ny = dy / dist;

    let vn = (a.vx - b.vx) * nx + (a.vy - b.vy) * ny;
    if vn > 0.0 {
        return false;
    }

    let impulse = 2.0 * vn / (m1 + m2);
    a.vx -= impulse * m2 * nx;
    a.vy -= impulse * m2 * ny;
    b.vx += impulse * m1 * nx;
    b.vy += impulse * m1 * ny;

    let half_overlap = (min_dist - dist) / 2.0;
    a.x += nx * half_overlap;
    a.y += ny * half_overlap;
    b.x -= nx * half_overlap;
    b.y -= ny * half_overlap;

    true
}

/// Two distinct mutable elements of a slice, `i < j`.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j, "pair_mut requires i < j, got {i} and {j}");
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

// ---------------------------------------------------------------------------
// SpatialGrid
// ---------------------------------------------------------------------------

/// Integer cell coordinate `(column, row)`.
pub type CellKey = (i32, i32);

/// Uniform grid mapping cells to the indices of the balls overlapping them.
///
/// Transient: the collision world clears and refills it every frame.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: BTreeMap<CellKey, Vec<usize>>,
}

impl SpatialGrid {
    /// # Panics
    ///
    /// Panics if `cell_size` is not positive and finite.
    pub fn new(cell_size: f64) -> Self {
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "cell_size must be positive and finite, got {cell_size}"
        );
        Self {
            cell_size,
            cells: BTreeMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Remove every bucket.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Inclusive cell range `(min, max)` covered by the bounding square of a
    /// disc at `(x, y)` with radius `r`.
    pub fn cell_range(&self, x: f64, y: f64, r: f64) -> (CellKey, CellKey) {
        let c = self.cell_size;
        let min = (((x - r) / c).floor() as i32, ((y - r) / c).floor() as i32);
        let max = (((x + r) / c).floor() as i32, ((y + r) / c).floor() as i32);
        (min, max)
    }

    /// Add `index` to every cell the disc overlaps.
    pub fn insert(&mut self, index: usize, x: f64, y: f64, r: f64) {
        let ((min_x, min_y), (max_x, max_y)) = self.cell_range(x, y, r);
        for gx in min_x..=max_x {
            for gy in min_y..=max_y {
                self.cells.entry((gx, gy)).or_default().push(index);
            }
        }
    }

    /// Indices bucketed into one cell (empty if the cell is unused).
    pub fn cell(&self, key: CellKey) -> &[usize] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterate non-empty cells in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &[usize])> {
        self.cells.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

// ---------------------------------------------------------------------------
// StepStats
// ---------------------------------------------------------------------------

/// Counters from the last [`CollisionWorld::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Non-empty grid cells.
    pub cells: usize,
    /// Distinct pairs examined (after de-duplication across cells).
    pub pairs_checked: usize,
    /// Pairs that received an impulse.
    pub collisions: usize,
}

// ---------------------------------------------------------------------------
// CollisionWorld
// ---------------------------------------------------------------------------

/// Owns the balls of one scene and advances them frame by frame.
///
/// Balls are only ever appended; indices are stable for the life of the
/// world.
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    balls: Vec<Ball>,
    width: f64,
    height: f64,
    grid: SpatialGrid,
    checked: HashSet<(usize, usize)>,
    last_stats: StepStats,
}

impl CollisionWorld {
    /// Empty world bounded by a `width × height` viewport, default cell size.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_cell_size(width, height, DEFAULT_CELL_SIZE)
    }

    pub fn with_cell_size(width: f64, height: f64, cell_size: f64) -> Self {
        Self {
            balls: Vec::new(),
            width,
            height,
            grid: SpatialGrid::new(cell_size),
            checked: HashSet::new(),
            last_stats: StepStats::default(),
        }
    }

    /// Add a ball; returns its index.
    pub fn spawn(&mut self, ball: Ball) -> usize {
        self.balls.push(ball);
        self.balls.len() - 1
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    /// Direct access for setup and tests.
    pub fn balls_mut(&mut self) -> &mut [Ball] {
        &mut self.balls
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Resize the viewport; balls outside are pulled back in on the next step.
    pub fn set_bounds(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// The grid as built by the last step.
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    /// Advance one frame. See the module docs for the phase order.
    pub fn step(&mut self) -> StepStats {
        self.integrate();
        let stats = self.resolve_collisions();
        self.enforce_walls();

        tracing::trace!(
            balls = self.balls.len(),
            cells = stats.cells,
            pairs = stats.pairs_checked,
            collisions = stats.collisions,
            "collision step"
        );

        self.last_stats = stats;
        stats
    }

    /// Phase 1: move every ball by its velocity and bounce it off the walls.
    pub fn integrate(&mut self) {
        let (width, height) = (self.width, self.height);
        for ball in &mut self.balls {
            ball.x += ball.vx;
            ball.y += ball.vy;
            bounce_off_walls(ball, width, height);
        }
    }

    /// Phases 2 and 3: rebuild the grid, then resolve every pair sharing a
    /// cell exactly once.
    pub fn resolve_collisions(&mut self) -> StepStats {
        self.grid.clear();
        for (i, ball) in self.balls.iter().enumerate() {
            self.grid.insert(i, ball.x, ball.y, ball.radius);
        }

        self.checked.clear();
        let mut stats = StepStats {
            cells: self.grid.cell_count(),
            ..StepStats::default()
        };
        for (_, indices) in self.grid.iter() {
            for a in 0..indices.len() {
                for b in (a + 1)..indices.len() {
                    let (i, j) = (indices[a], indices[b]);
                    let key = (i.min(j), i.max(j));
                    if !self.checked.insert(key) {
                        continue;
                    }
                    stats.pairs_checked += 1;
                    let (first, second) = pair_mut(&mut self.balls, key.0, key.1);
                    if resolve_pair(first, second) {
                        stats.collisions += 1;
                    }
                }
            }
        }
        stats
    }

    /// Phase 4: bounce anything separation pushed through a wall.
    ///
    /// Returns the number of balls that were clamped.
    pub fn enforce_walls(&mut self) -> usize {
        let (width, height) = (self.width, self.height);
        let mut clamped = 0;
        for ball in &mut self.balls {
            let (hit_x, hit_y) = bounce_off_walls(ball, width, height);
            if hit_x || hit_y {
                clamped += 1;
            }
        }
        if clamped > 0 {
            tracing::trace!(clamped, "balls pushed back inside the walls");
        }
        clamped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
