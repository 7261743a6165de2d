//! Horizontal runs of evenly spaced sample points.
//!
//! A [`Span`] is `count` points starting at `start`, advancing along x by
//! `length / (count - 1)`. Stages that have no fast path for a span fall
//! back to [`span_fallback`], which feeds the points four at a time.

use crate::basics::{F32x4, Point};
use crate::processor::PointProcessor;

/// `count` points from `start` to `start + (length, 0)` inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    start: Point,
    length: f32,
    count: usize,
}

impl Span {
    pub const fn new(start: Point, length: f32, count: usize) -> Self {
        Self {
            start,
            length,
            count,
        }
    }

    pub const fn empty() -> Self {
        Self::new(Point::new(0.0, 0.0), 0.0, 0)
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn start_x(&self) -> f32 {
        self.start.x
    }

    pub fn start_y(&self) -> f32 {
        self.start.y
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn end_x(&self) -> f32 {
        self.start.x + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Distance between neighboring points. Zero for one point.
    pub fn step(&self) -> f32 {
        if self.count > 1 {
            self.length / (self.count - 1) as f32
        } else {
            0.0
        }
    }

    /// Both ends lie in `[x_min, x_max)`.
    pub fn completely_within(&self, x_min: f32, x_max: f32) -> bool {
        let (lo, hi) = if self.length >= 0.0 {
            (self.start.x, self.end_x())
        } else {
            (self.end_x(), self.start.x)
        };
        x_min <= lo && hi < x_max
    }

    /// The same span moved by `(dx, dy)`.
    pub fn translated(&self, dx: f32, dy: f32) -> Span {
        Span::new(
            Point::new(self.start.x + dx, self.start.y + dy),
            self.length,
            self.count,
        )
    }

    /// Shift the start along x in place.
    pub fn offset(&mut self, dx: f32) {
        self.start.x += dx;
    }

    /// Split off the points before `break_x` and return them.
    ///
    /// `dx` is the spacing between points. With a positive `dx` a point
    /// landing exactly on `break_x` stays in `self`. Returns an empty span
    /// when no point precedes the break; takes the whole span when every
    /// point does.
    pub fn break_at(&mut self, break_x: f32, dx: f32) -> Span {
        debug_assert!(break_x.is_finite());
        debug_assert!(dx.is_finite() && dx != 0.0);

        if self.is_empty() {
            return Span::empty();
        }

        let mut dx_steps = ((break_x - self.start.x) / dx).floor() as i64;
        if dx_steps < 0 {
            return Span::empty();
        }
        if dx_steps >= self.count as i64 {
            let answer = *self;
            *self = Span::empty();
            return answer;
        }

        let mut new_length = dx_steps as f32 * dx;
        if dx > 0.0 && self.start.x + new_length == break_x {
            if dx_steps == 0 {
                return Span::empty();
            }
            dx_steps -= 1;
            new_length -= dx;
        }

        let new_count = (dx_steps + 1) as usize;
        let answer = Span::new(self.start, new_length, new_count);

        let to_rest = new_length + dx;
        self.start.x += to_rest;
        self.length -= to_rest;
        self.count -= new_count;
        answer
    }
}

/// Feed a span to `stage` as point groups: fours, then one group of the
/// remaining one to three.
pub fn span_fallback<P: PointProcessor + ?Sized>(span: Span, stage: &mut P) {
    let count = span.count();
    if count == 0 {
        return;
    }
    let Point { x: start_x, y } = span.start();
    let dx = span.step();
    let ys = F32x4::splat(y);

    let mut i = 0;
    while count - i >= 4 {
        let x = start_x + i as f32 * dx;
        let xs = F32x4::new([x, x + dx, x + 2.0 * dx, x + 3.0 * dx]);
        stage.point_list4(xs, ys);
        i += 4;
    }
    if i < count {
        let x = start_x + i as f32 * dx;
        let xs = F32x4::new([x, x + dx, x + 2.0 * dx, x + 3.0 * dx]);
        stage.point_list_few(count - i, xs, ys);
    }
}

// ============================================================================
// Tests
// ============================================================================
