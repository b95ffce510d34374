//! Exact-shape subdivision of cubic Bezier splines.
//!
//! [`BezierSpline::subdivide`] multiplies a curve's vertex density without
//! changing its geometry: every arc is cut into parametrically equal pieces
//! via [`CubicSegment::section`], and the vertex/handle lists are rebuilt
//! with correct handle continuity. Useful after replacing a coarse curve's
//! control polygon with a denser one while keeping the drawn shape intact.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use teragon_spline::BezierSpline;
//!
//! let spline = BezierSpline::new(
//!     vec![Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0)],
//!     vec![Vec3::ZERO, Vec3::new(2.0, 1.0, 0.0)],
//!     vec![Vec3::new(1.0, 1.0, 0.0), Vec3::new(3.0, 0.0, 0.0)],
//!     false,
//! )
//! .unwrap();
//!
//! let dense = spline.subdivide(4);
//! assert_eq!(dense.segments().len(), 4);
//! assert_eq!(dense.points.len(), 5);
//! ```

use glam::Vec3;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors from assembling a Bezier spline.
#[derive(Debug, Clone, Error)]
pub enum SplineError {
    /// A spline needs at least two vertices.
    #[error("spline needs at least two points, got {0}")]
    TooFewPoints(usize),

    /// Every vertex needs exactly one handle on each side.
    #[error("handle counts must match points: {points} points, {left} left, {right} right")]
    MismatchedHandles {
        /// Number of vertices.
        points: usize,
        /// Number of incoming handles.
        left: usize,
        /// Number of outgoing handles.
        right: usize,
    },
}

/// One cubic Bezier arc: start point, two control points, end point.
///
/// Transient by design: segments are reconstructed from spline vertices,
/// sectioned, and folded back into a new spline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CubicSegment {
    /// Start point.
    pub start: Vec3,
    /// First control point (the start's outgoing handle).
    pub ctrl1: Vec3,
    /// Second control point (the end's incoming handle).
    pub ctrl2: Vec3,
    /// End point.
    pub end: Vec3,
}

impl CubicSegment {
    /// Creates a new cubic arc.
    pub fn new(start: Vec3, ctrl1: Vec3, ctrl2: Vec3, end: Vec3) -> Self {
        Self {
            start,
            ctrl1,
            ctrl2,
            end,
        }
    }

    /// Evaluates the arc at parameter `t` (0 to 1).
    pub fn evaluate(&self, t: f32) -> Vec3 {
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let t2 = t * t;
        self.start * (mt2 * mt)
            + self.ctrl1 * (3.0 * mt2 * t)
            + self.ctrl2 * (3.0 * mt * t2)
            + self.end * (t2 * t)
    }

    /// Both control points coincide with their endpoints: a straight line
    /// written as a cubic.
    fn is_linear(&self) -> bool {
        self.start == self.ctrl1 && self.ctrl2 == self.end
    }

    /// Returns the portion of the arc between parameters `t0` and `t1` as a
    /// new arc with identical geometry. Parameters given in reverse order
    /// are swapped.
    ///
    /// Straight segments are sectioned by plain linear interpolation so
    /// they stay exactly straight instead of picking up cubic round-off.
    pub fn section(&self, t0: f32, t1: f32) -> CubicSegment {
        let (t0, t1) = if t0 > t1 { (t1, t0) } else { (t0, t1) };

        if self.is_linear() {
            let p0 = self.start.lerp(self.ctrl2, t0);
            let p1 = self.start.lerp(self.ctrl2, t1);
            return CubicSegment::new(p0, p0, p1, p1);
        }

        let u0 = 1.0 - t0;
        let u1 = 1.0 - t1;

        // Two-parameter de Casteljau blend: quadratic blends of each
        // control-point triple at t0 and t1, then pairwise recombination.
        let qa = self.start * (u0 * u0) + self.ctrl1 * (2.0 * t0 * u0) + self.ctrl2 * (t0 * t0);
        let qb = self.start * (u1 * u1) + self.ctrl1 * (2.0 * t1 * u1) + self.ctrl2 * (t1 * t1);
        let qc = self.ctrl1 * (u0 * u0) + self.ctrl2 * (2.0 * t0 * u0) + self.end * (t0 * t0);
        let qd = self.ctrl1 * (u1 * u1) + self.ctrl2 * (2.0 * t1 * u1) + self.end * (t1 * t1);

        CubicSegment::new(
            qa * u0 + qc * t0,
            qa * u1 + qc * t1,
            qb * u0 + qd * t0,
            qb * u1 + qd * t1,
        )
    }

    /// Splits the arc into `count` parametrically equal sections whose
    /// union reproduces the original shape. `count <= 1` returns the arc
    /// unchanged.
    pub fn split_even(&self, count: usize) -> Vec<CubicSegment> {
        if count < 2 {
            return vec![*self];
        }
        (0..count)
            .map(|i| {
                self.section(
                    i as f32 / count as f32,
                    (i + 1) as f32 / count as f32,
                )
            })
            .collect()
    }
}

/// A cubic Bezier spline as parallel vertex/handle lists.
///
/// Vertex `i` sits at `points[i]` with incoming handle `handles_left[i]`
/// and outgoing handle `handles_right[i]`. When `cyclic`, an extra arc
/// closes the curve from the last vertex back to the first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BezierSpline {
    /// Vertex positions.
    pub points: Vec<Vec3>,
    /// Incoming handle per vertex.
    pub handles_left: Vec<Vec3>,
    /// Outgoing handle per vertex.
    pub handles_right: Vec<Vec3>,
    /// Whether the spline closes back onto its first vertex.
    pub cyclic: bool,
}

impl BezierSpline {
    /// Creates a spline, validating that every vertex has both handles and
    /// that there are at least two vertices.
    pub fn new(
        points: Vec<Vec3>,
        handles_left: Vec<Vec3>,
        handles_right: Vec<Vec3>,
        cyclic: bool,
    ) -> Result<Self, SplineError> {
        if points.len() < 2 {
            return Err(SplineError::TooFewPoints(points.len()));
        }
        if handles_left.len() != points.len() || handles_right.len() != points.len() {
            return Err(SplineError::MismatchedHandles {
                points: points.len(),
                left: handles_left.len(),
                right: handles_right.len(),
            });
        }
        Ok(Self {
            points,
            handles_left,
            handles_right,
            cyclic,
        })
    }

    /// Reconstructs the cubic arcs between consecutive vertices, including
    /// the wrap-around arc when cyclic.
    pub fn segments(&self) -> Vec<CubicSegment> {
        let mut segments = Vec::with_capacity(self.points.len());
        for i in 1..self.points.len() {
            segments.push(CubicSegment::new(
                self.points[i - 1],
                self.handles_right[i - 1],
                self.handles_left[i],
                self.points[i],
            ));
        }
        if self.cyclic {
            let last = self.points.len() - 1;
            segments.push(CubicSegment::new(
                self.points[last],
                self.handles_right[last],
                self.handles_left[0],
                self.points[0],
            ));
        }
        segments
    }

    /// Splits every arc into `per_segment` parametrically equal pieces and
    /// rebuilds the vertex/handle lists, multiplying vertex density while
    /// leaving the drawn shape untouched.
    ///
    /// Each piece's start becomes a vertex whose outgoing handle is the
    /// piece's first control point and whose incoming handle is the
    /// previous piece's second control point. The first vertex of an open
    /// result gets a zero-length incoming handle, and the appended closing
    /// vertex a zero-length outgoing one; a cyclic result takes its first
    /// incoming handle from the final piece instead.
    pub fn subdivide(&self, per_segment: usize) -> BezierSpline {
        let pieces: Vec<CubicSegment> = self
            .segments()
            .iter()
            .flat_map(|segment| segment.split_even(per_segment))
            .collect();

        let mut points = Vec::with_capacity(pieces.len() + 1);
        let mut handles_left = Vec::with_capacity(pieces.len() + 1);
        let mut handles_right = Vec::with_capacity(pieces.len() + 1);

        for (i, piece) in pieces.iter().enumerate() {
            let incoming = if i == 0 {
                if self.cyclic {
                    pieces[pieces.len() - 1].ctrl2
                } else {
                    piece.start
                }
            } else {
                pieces[i - 1].ctrl2
            };
            points.push(piece.start);
            handles_left.push(incoming);
            handles_right.push(piece.ctrl1);
        }

        if !self.cyclic {
            let last = pieces[pieces.len() - 1];
            points.push(last.end);
            handles_left.push(last.ctrl2);
            handles_right.push(last.end);
        }

        BezierSpline {
            points,
            handles_left,
            handles_right,
            cyclic: self.cyclic,
        }
    }
}

/// Linearly resamples a polyline, inserting evenly spaced points into every
/// span while keeping the original vertices.
pub fn densify_polyline(points: &[Vec3], per_segment: usize) -> Vec<Vec3> {
    let per_segment = per_segment.max(1);
    let Some((&last, rest)) = points.split_last() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(rest.len() * per_segment + 1);
    for (i, &p) in rest.iter().enumerate() {
        let next = points[i + 1];
        for j in 0..per_segment {
            out.push(p.lerp(next, j as f32 / per_segment as f32));
        }
    }
    out.push(last);
    out
}
