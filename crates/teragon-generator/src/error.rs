//! Error types for teragon-generator.

use teragon_lattice::{Lattice, UnknownLatticeError};
use thiserror::Error;

/// A transform source or target segment with zero length.
///
/// Raised when a generator element repeats the previous running coordinate,
/// when a family's total displacement is zero, or when two consecutive
/// initiator points coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("zero-length segment in transform computation")]
pub struct DegenerateSegmentError;

/// Errors from assembling a generator out of elements.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    /// A generator needs at least one element.
    #[error("generator has no elements")]
    Empty,

    /// All elements must share a single lattice.
    #[error("mixed lattices in generator: expected {expected}, got {got}")]
    LatticeMismatch {
        /// Lattice of the first element.
        expected: Lattice,
        /// The offending element's lattice.
        got: Lattice,
    },

    /// An element's transform could not be derived.
    #[error(transparent)]
    Degenerate(#[from] DegenerateSegmentError),
}

/// Errors from parsing a gene string.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The gene string has no tokens.
    #[error("empty gene string")]
    Empty,

    /// The lattice tag is not recognized.
    #[error(transparent)]
    UnknownLattice(#[from] UnknownLatticeError),

    /// Element values must come in groups of four.
    #[error("gene has {count} values, expected a multiple of four")]
    TruncatedGene {
        /// Number of values after the lattice tag.
        count: usize,
    },

    /// A token failed integer parsing.
    #[error("invalid integer {token:?} in gene")]
    InvalidInteger {
        /// The offending token.
        token: String,
    },

    /// The parsed elements do not form a valid generator.
    #[error(transparent)]
    Invalid(#[from] GeneratorError),
}

/// A level cache read past the expanded depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("level {requested} not computed yet (expanded up to {max})")]
pub struct LevelError {
    /// The level that was asked for.
    pub requested: usize,
    /// The deepest level currently in the cache.
    pub max: usize,
}

/// Errors from mapping a generator onto an initiator polyline.
#[derive(Debug, Clone, Error)]
pub enum InitiatorError {
    /// An initiator needs at least two points.
    #[error("initiator needs at least two points, got {0}")]
    TooFewPoints(usize),

    /// Two consecutive initiator points coincide.
    #[error(transparent)]
    Degenerate(#[from] DegenerateSegmentError),

    /// The requested level has not been expanded.
    #[error(transparent)]
    Level(#[from] LevelError),
}
