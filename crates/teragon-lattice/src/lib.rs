//! Integer lattices for self-similar curve generation.
//!
//! Provides [`LatticePoint`], an integer pair over one of two fixed planar
//! lattices:
//!
//! - [`Lattice::Square`] - the Gaussian integers, tag `G`
//! - [`Lattice::Triangular`] - the Eisenstein integers, tag `E`
//!
//! Each lattice carries its own planar embedding and integer norm. Points
//! embed into the XY plane as [`Vec3`] with z = 0 so downstream consumers can
//! feed them straight into 3D curve pipelines.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use teragon_lattice::{Lattice, LatticePoint};
//!
//! let p = LatticePoint::new(1, 1, Lattice::Square);
//! assert_eq!(p.norm(), 2);
//! assert_eq!(p.coordinate(), Vec3::new(1.0, 1.0, 0.0));
//!
//! let q = LatticePoint::new(0, 1, Lattice::Triangular);
//! assert_eq!(q.norm(), 1);
//! ```

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use glam::Vec3;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// sqrt(3) / 2, the y-step of the triangular lattice embedding.
pub const SQRT_3_OVER_2: f32 = 0.866_025_4;

/// One of the two supported planar integer lattices.
///
/// The tag renders and parses as the single letter used in gene strings:
/// `G` for [`Lattice::Square`], `E` for [`Lattice::Triangular`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Lattice {
    /// The Gaussian integers: unit square grid.
    Square,
    /// The Eisenstein integers: unit triangular grid.
    Triangular,
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lattice::Square => write!(f, "G"),
            Lattice::Triangular => write!(f, "E"),
        }
    }
}

/// Error for a lattice tag that is neither `G` nor `E`.
#[derive(Debug, Clone, Error)]
#[error("unknown lattice tag {0:?}")]
pub struct UnknownLatticeError(pub String);

impl FromStr for Lattice {
    type Err = UnknownLatticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "G" => Ok(Lattice::Square),
            "E" => Ok(Lattice::Triangular),
            other => Err(UnknownLatticeError(other.to_string())),
        }
    }
}

/// An integer pair `(a, b)` tagged with the lattice it lives on.
///
/// Equality is exact integer equality; components may be negative. The
/// 64-bit width keeps running sums exact for any realistic expansion depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatticePoint {
    /// First integer component.
    pub a: i64,
    /// Second integer component.
    pub b: i64,
    /// The lattice this point lives on.
    pub lattice: Lattice,
}

impl LatticePoint {
    /// Creates a new lattice point.
    pub fn new(a: i64, b: i64, lattice: Lattice) -> Self {
        Self { a, b, lattice }
    }

    /// The additive identity of the given lattice.
    pub fn zero(lattice: Lattice) -> Self {
        Self { a: 0, b: 0, lattice }
    }

    /// Embeds the point into the XY plane (z = 0).
    ///
    /// Square: `(a, b)`. Triangular: `(a - b/2, b * sqrt(3)/2)`.
    pub fn coordinate(&self) -> Vec3 {
        match self.lattice {
            Lattice::Square => Vec3::new(self.a as f32, self.b as f32, 0.0),
            Lattice::Triangular => Vec3::new(
                self.a as f32 - self.b as f32 / 2.0,
                self.b as f32 * SQRT_3_OVER_2,
                0.0,
            ),
        }
    }

    /// The lattice norm of the point.
    ///
    /// Square: `a^2 + b^2`. Triangular: `a^2 - a*b + b^2`. Always
    /// non-negative; used for identification and display, never for
    /// control flow.
    pub fn norm(&self) -> i64 {
        match self.lattice {
            Lattice::Square => self.a * self.a + self.b * self.b,
            Lattice::Triangular => self.a * self.a - self.a * self.b + self.b * self.b,
        }
    }
}

impl Add for LatticePoint {
    type Output = LatticePoint;

    fn add(self, rhs: LatticePoint) -> LatticePoint {
        debug_assert_eq!(self.lattice, rhs.lattice);
        LatticePoint::new(self.a + rhs.a, self.b + rhs.b, self.lattice)
    }
}

impl fmt::Display for LatticePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.lattice, self.a, self.b)
    }
}
