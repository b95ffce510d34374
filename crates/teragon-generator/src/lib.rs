//! Self-similar "teragon" curve generators over integer lattices.
//!
//! A [`Generator`] is an ordered list of [`GeneratorElement`]s on one lattice.
//! The running sum of the elements is the family's total displacement; each
//! element owns an affine transform mapping the base segment (origin to that
//! total) onto its own sub-segment. Expanding the generator replaces every
//! unit segment of the previous level with a transformed copy of the whole
//! motif, which is how curves such as the Koch curve or the dragon curve
//! grow out of a handful of integers.
//!
//! Generators round-trip through a compact textual "gene" form (see
//! [`Generator::parse`]), and [`map_initiator`] replays a family along an
//! arbitrary open or closed polyline.
//!
//! # Example
//!
//! ```
//! use teragon_generator::{map_initiator, Generator};
//!
//! // Two square-lattice elements, the second traversed in reverse:
//! // the Harter-Heighway dragon family.
//! let mut dragon = Generator::parse("G 1 0 0 0 0 1 1 0").unwrap();
//! assert_eq!(dragon.total().norm(), 2);
//!
//! dragon.expand(3);
//! assert_eq!(dragon.points(3).unwrap().len(), 8);
//!
//! // Replay the family along its own base segment.
//! let initiator = dragon.base_initiator();
//! let curve = map_initiator(&initiator, &dragon, false, 3).unwrap();
//! assert_eq!(curve.len(), 9);
//! ```

use std::f32::consts::PI;
use std::fmt;

use glam::{Mat4, Vec3};
use teragon_lattice::{Lattice, LatticePoint};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod error;

pub use error::{
    DegenerateSegmentError, GeneratorError, InitiatorError, LevelError, ParseError,
};

/// Tolerance in radians for treating two directions as exactly antiparallel.
const ANGLE_EPSILON: f32 = 0.001;

/// One motif element: a lattice step plus its traversal flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneratorElement {
    /// The lattice step this element contributes to the family total.
    pub point: LatticePoint,
    /// Traverse the source point sequence back-to-front before transforming.
    pub reverse: bool,
    /// Reflect the source points about the family total before transforming.
    pub mirror: bool,
}

impl GeneratorElement {
    /// Creates a new element.
    pub fn new(point: LatticePoint, reverse: bool, mirror: bool) -> Self {
        Self {
            point,
            reverse,
            mirror,
        }
    }
}

/// Builds the affine transform mapping one segment onto another.
///
/// The result scales uniformly by the length ratio, rotates about +Z to align
/// the source direction with the target direction, and translates the source
/// start onto the target start, applied in that order. `reversed` negates the
/// source direction before the alignment (a pre-rotation by half a turn),
/// which lets one transform serve either traversal direction of the base
/// segment.
///
/// Directions within 0.001 rad of exactly antiparallel take a fixed half-turn
/// rotation; the general alignment is undefined there.
///
/// Fails when either segment has zero length.
pub fn segment_transform(
    src_start: Vec3,
    src_end: Vec3,
    tgt_start: Vec3,
    tgt_end: Vec3,
    reversed: bool,
) -> Result<Mat4, DegenerateSegmentError> {
    let src_dir = (src_end - src_start).truncate();
    let tgt_dir = (tgt_end - tgt_start).truncate();
    if src_dir.length_squared() == 0.0 || tgt_dir.length_squared() == 0.0 {
        return Err(DegenerateSegmentError);
    }
    let scale = tgt_dir.length() / src_dir.length();

    let (dir, pre_rotation) = if reversed { (-src_dir, PI) } else { (src_dir, 0.0) };
    // Signed angle from the (possibly negated) source direction to the target.
    let angle = dir.perp_dot(tgt_dir).atan2(dir.dot(tgt_dir));
    let rotation = if (angle.abs() - PI).abs() < ANGLE_EPSILON {
        Mat4::from_rotation_z(PI)
    } else {
        Mat4::from_rotation_z(angle + pre_rotation)
    };

    Ok(Mat4::from_translation(tgt_start - src_start)
        * rotation
        * Mat4::from_scale(Vec3::splat(scale)))
}

/// Reflects `point` across the line through the origin along `axis`.
fn reflect_across(point: Vec3, axis: Vec3) -> Vec3 {
    let u = axis.normalize();
    u * (2.0 * point.dot(u)) - point
}

/// An ordered motif of lattice elements and its level-by-level expansion.
///
/// Construction derives the family total, the first two point levels and one
/// transform per element. [`Generator::expand`] then grows the level cache;
/// the cache only ever grows, so a `&Generator` snapshot taken after the
/// desired `expand` call is safe to read from anywhere.
#[derive(Debug, Clone)]
pub struct Generator {
    elements: Vec<GeneratorElement>,
    total: LatticePoint,
    matrices: Vec<Mat4>,
    levels: Vec<Vec<Vec3>>,
}

impl Generator {
    /// Builds a generator from its elements.
    ///
    /// Fails when the list is empty, when the elements do not share a single
    /// lattice, or when an element's segment degenerates (a zero family
    /// total, or an element that repeats the previous running coordinate).
    pub fn new(elements: Vec<GeneratorElement>) -> Result<Self, GeneratorError> {
        let first = elements.first().ok_or(GeneratorError::Empty)?;
        let lattice = first.point.lattice;
        for elem in &elements {
            if elem.point.lattice != lattice {
                return Err(GeneratorError::LatticeMismatch {
                    expected: lattice,
                    got: elem.point.lattice,
                });
            }
        }

        // Level 1 is the running prefix sum of the element steps; the last
        // entry is the family total.
        let mut total = LatticePoint::zero(lattice);
        let mut level_one = Vec::with_capacity(elements.len());
        for elem in &elements {
            total = total + elem.point;
            level_one.push(total.coordinate());
        }

        let base_end = total.coordinate();
        let mut matrices = Vec::with_capacity(elements.len());
        for (i, elem) in elements.iter().enumerate() {
            let seg_start = if i == 0 { Vec3::ZERO } else { level_one[i - 1] };
            let seg_end = level_one[i];
            // Reversal swaps which target endpoint the source start maps to.
            let (tgt_start, tgt_end) = if elem.reverse {
                (seg_end, seg_start)
            } else {
                (seg_start, seg_end)
            };
            matrices.push(segment_transform(
                Vec3::ZERO,
                base_end,
                tgt_start,
                tgt_end,
                elem.reverse,
            )?);
        }

        let levels = vec![vec![base_end], level_one];
        Ok(Self {
            elements,
            total,
            matrices,
            levels,
        })
    }

    /// Parses a gene string: a lattice tag (`G` or `E`) followed by groups
    /// of four integers `a b reverse mirror` per element.
    ///
    /// ```
    /// use teragon_generator::Generator;
    ///
    /// let koch = Generator::parse("E 1 0 0 0 1 1 0 0 0 -1 0 0 1 0 0 0").unwrap();
    /// assert_eq!(koch.element_count(), 4);
    /// assert_eq!(koch.total().norm(), 9);
    /// ```
    pub fn parse(gene: &str) -> Result<Self, ParseError> {
        let mut tokens = gene.split_whitespace();
        let tag = tokens.next().ok_or(ParseError::Empty)?;
        let lattice: Lattice = tag.parse()?;

        let numbers = tokens
            .map(|token| {
                token.parse::<i64>().map_err(|_| ParseError::InvalidInteger {
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if numbers.len() % 4 != 0 {
            return Err(ParseError::TruncatedGene {
                count: numbers.len(),
            });
        }

        let elements = numbers
            .chunks_exact(4)
            .map(|group| {
                GeneratorElement::new(
                    LatticePoint::new(group[0], group[1], lattice),
                    group[2] != 0,
                    group[3] != 0,
                )
            })
            .collect();
        Ok(Self::new(elements)?)
    }

    /// Serializes the generator back to its gene form.
    ///
    /// The inverse of [`Generator::parse`]: parsing the returned string
    /// yields an equal generator.
    pub fn gene(&self) -> String {
        let mut out = self.total.lattice.to_string();
        for elem in &self.elements {
            out.push_str(&format!(
                " {} {} {} {}",
                elem.point.a, elem.point.b, elem.reverse as u8, elem.mirror as u8
            ));
        }
        out
    }

    /// The motif elements, in declaration order.
    pub fn elements(&self) -> &[GeneratorElement] {
        &self.elements
    }

    /// Number of motif elements (the fractal's branching factor).
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// The family's total displacement: the sum of all element steps.
    pub fn total(&self) -> LatticePoint {
        self.total
    }

    /// The lattice all elements live on.
    pub fn lattice(&self) -> Lattice {
        self.total.lattice
    }

    /// The deepest level currently in the cache.
    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// The default initiator: the base segment from the origin to the
    /// family total.
    pub fn base_initiator(&self) -> [Vec3; 2] {
        [Vec3::ZERO, self.total.coordinate()]
    }

    /// Grows the level cache up to `level`.
    ///
    /// A no-op at or below [`Generator::max_level`]; lower levels are never
    /// recomputed. Each new level k holds `element_count^k` points, so both
    /// time and retained memory are O(element_count^level) - callers must
    /// bound `level` (hosts typically cap it around 20).
    pub fn expand(&mut self, level: usize) {
        for _ in self.levels.len()..=level {
            let next = {
                let prev = &self.levels[self.levels.len() - 1];
                let mirror_axis = self.total.coordinate();
                let mut next = Vec::with_capacity(prev.len() * self.elements.len());
                for (elem, matrix) in self.elements.iter().zip(&self.matrices) {
                    // The implicit origin leads every level; reversal walks
                    // the previous level backward with that origin restored.
                    let mut points: Vec<Vec3> = if elem.reverse {
                        std::iter::once(Vec3::ZERO)
                            .chain(prev[..prev.len() - 1].iter().copied())
                            .rev()
                            .collect()
                    } else {
                        prev.clone()
                    };
                    if elem.mirror {
                        for p in &mut points {
                            *p = reflect_across(*p, mirror_axis);
                        }
                    }
                    next.extend(points.iter().map(|p| matrix.transform_point3(*p)));
                }
                next
            };
            self.levels.push(next);
        }
    }

    /// Reads the cached points of one level.
    ///
    /// Level 0 is the single family-total coordinate; level k holds
    /// `element_count^k` points. Fails when the level was never expanded.
    pub fn points(&self, level: usize) -> Result<&[Vec3], LevelError> {
        self.levels
            .get(level)
            .map(Vec::as_slice)
            .ok_or(LevelError {
                requested: level,
                max: self.max_level(),
            })
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "family {} norm {}", self.total, self.total.norm())?;
        for elem in &self.elements {
            writeln!(
                f,
                "  {} reverse={} mirror={}",
                elem.point, elem.reverse, elem.mirror
            )?;
        }
        Ok(())
    }
}

/// Computes one transform per consecutive initiator point pair.
///
/// Each transform maps the generator's base segment (origin to the family
/// total) onto one polyline segment; `closed` adds the wrap-around segment
/// from the last point back to the first.
pub fn initiator_transforms(
    points: &[Vec3],
    generator: &Generator,
    closed: bool,
) -> Result<Vec<Mat4>, InitiatorError> {
    if points.len() < 2 {
        return Err(InitiatorError::TooFewPoints(points.len()));
    }
    let base_end = generator.total().coordinate();
    let mut transforms = Vec::with_capacity(points.len());
    for pair in points.windows(2) {
        transforms.push(segment_transform(
            Vec3::ZERO,
            base_end,
            pair[0],
            pair[1],
            false,
        )?);
    }
    if closed {
        transforms.push(segment_transform(
            Vec3::ZERO,
            base_end,
            points[points.len() - 1],
            points[0],
            false,
        )?);
    }
    Ok(transforms)
}

/// Replays one expanded level of the family along an initiator polyline.
///
/// Applies each segment transform to the level's point set and concatenates
/// the results behind the first initiator point. For closed initiators the
/// duplicated closing vertex is dropped, so a level-L run over an n-point
/// closed initiator yields exactly `n * element_count^L` points.
pub fn map_initiator(
    points: &[Vec3],
    generator: &Generator,
    closed: bool,
    level: usize,
) -> Result<Vec<Vec3>, InitiatorError> {
    let transforms = initiator_transforms(points, generator, closed)?;
    let level_points = generator.points(level)?;

    let mut out = Vec::with_capacity(1 + transforms.len() * level_points.len());
    out.push(points[0]);
    for matrix in &transforms {
        out.extend(level_points.iter().map(|p| matrix.transform_point3(*p)));
    }
    if closed {
        out.pop();
    }
    Ok(out)
}

/// Named generators for well-known teragon families.
pub mod presets {
    use super::Generator;

    /// Harter-Heighway dragon: two square-lattice steps, the second
    /// traversed in reverse. Norm-2 family.
    pub fn dragon() -> Generator {
        Generator::parse("G 1 0 0 0 0 1 1 0").expect("preset gene is valid")
    }

    /// Levy C curve: the dragon's two steps, both traversed forward.
    pub fn levy_c() -> Generator {
        Generator::parse("G 1 0 0 0 0 1 0 0").expect("preset gene is valid")
    }

    /// Koch curve: four triangular-lattice steps. Norm-9 family.
    pub fn koch() -> Generator {
        Generator::parse("E 1 0 0 0 1 1 0 0 0 -1 0 0 1 0 0 0").expect("preset gene is valid")
    }

    /// Terdragon: three triangular-lattice steps. Norm-3 family.
    pub fn terdragon() -> Generator {
        Generator::parse("E 1 1 0 0 0 -1 0 0 1 1 0 0").expect("preset gene is valid")
    }

    /// Gosper flowsnake: seven triangular-lattice steps, three of them
    /// reversed and mirrored. Norm-7 family.
    pub fn flowsnake() -> Generator {
        Generator::parse("E 1 0 0 0 0 -1 1 1 -1 0 1 1 -1 -1 0 0 1 0 0 0 1 0 0 0 1 1 1 1")
            .expect("preset gene is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.001
    }

    #[test]
    fn test_parse_dragon() {
        let dragon = Generator::parse("G 1 0 0 0 0 1 1 0").unwrap();
        assert_eq!(dragon.element_count(), 2);
        assert_eq!(dragon.lattice(), Lattice::Square);
        assert_eq!(dragon.total(), LatticePoint::new(1, 1, Lattice::Square));
        assert_eq!(dragon.total().norm(), 2);

        let level_one = dragon.points(1).unwrap();
        assert!(close(level_one[0], Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(level_one[1], Vec3::new(1.0, 1.0, 0.0)));

        let mut dragon = dragon;
        dragon.expand(2);
        assert_eq!(dragon.points(2).unwrap().len(), 4);
    }

    #[test]
    fn test_level_point_counts() {
        let mut koch = presets::koch();
        koch.expand(3);
        assert_eq!(koch.points(0).unwrap().len(), 1);
        for k in 1..=3 {
            assert_eq!(koch.points(k).unwrap().len(), 4usize.pow(k as u32));
        }
    }

    #[test]
    fn test_expand_is_idempotent() {
        let mut dragon = presets::dragon();
        dragon.expand(3);
        let snapshot = dragon.points(3).unwrap().to_vec();
        assert_eq!(dragon.max_level(), 3);

        dragon.expand(2);
        dragon.expand(3);
        assert_eq!(dragon.max_level(), 3);
        assert_eq!(dragon.points(3).unwrap(), snapshot.as_slice());
    }

    #[test]
    fn test_level_not_computed() {
        let dragon = presets::dragon();
        let err = dragon.points(4).unwrap_err();
        assert_eq!(err, LevelError { requested: 4, max: 1 });
    }

    #[test]
    fn test_transforms_reproduce_segment_endpoints() {
        // Includes a reversed element (dragon), mirrored elements
        // (flowsnake) and an element antiparallel to the family total.
        for gene in [
            "G 1 0 0 0 0 1 1 0",
            "E 1 0 0 0 1 1 0 0 0 -1 0 0 1 0 0 0",
            "E 1 1 0 0 0 -1 0 0 1 1 0 0",
            "E 1 0 0 0 0 -1 1 1 -1 0 1 1 -1 -1 0 0 1 0 0 0 1 0 0 0 1 1 1 1",
            "G 2 0 0 0 -1 0 0 0",
        ] {
            let generator = Generator::parse(gene).unwrap();
            let base_end = generator.total().coordinate();
            let level_one = generator.points(1).unwrap().to_vec();
            for (i, (elem, matrix)) in generator
                .elements()
                .iter()
                .zip(&generator.matrices)
                .enumerate()
            {
                let seg_start = if i == 0 { Vec3::ZERO } else { level_one[i - 1] };
                let seg_end = level_one[i];
                let (expect_start, expect_end) = if elem.reverse {
                    (seg_end, seg_start)
                } else {
                    (seg_start, seg_end)
                };
                let mapped_start = matrix.transform_point3(Vec3::ZERO);
                let mapped_end = matrix.transform_point3(base_end);
                assert!(
                    close(mapped_start, expect_start),
                    "{gene} element {i}: start {mapped_start:?} != {expect_start:?}"
                );
                assert!(
                    close(mapped_end, expect_end),
                    "{gene} element {i}: end {mapped_end:?} != {expect_end:?}"
                );
            }
        }
    }

    #[test]
    fn test_single_element_stays_a_straight_line() {
        let mut line = Generator::parse("E 1 0 0 0").unwrap();
        line.expand(5);
        let level_one = line.points(1).unwrap().to_vec();
        for k in 2..=5 {
            assert_eq!(line.points(k).unwrap().len(), 1);
            assert!(close(line.points(k).unwrap()[0], level_one[0]));
        }
    }

    #[test]
    fn test_mirror_reflects_about_family_total() {
        // First element mirrored: its copy of the motif flips across the
        // diagonal family total instead of dipping below the base segment.
        let mut mirrored = Generator::parse("G 1 0 0 1 0 1 0 0").unwrap();
        mirrored.expand(2);
        let expected = [
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.5, 0.5, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        for (p, e) in mirrored.points(2).unwrap().iter().zip(expected) {
            assert!(close(*p, e), "{p:?} != {e:?}");
        }

        // Without the flag the first copy bends the other way.
        let mut plain = Generator::parse("G 1 0 0 0 0 1 0 0").unwrap();
        plain.expand(2);
        assert!(close(
            plain.points(2).unwrap()[0],
            Vec3::new(0.5, -0.5, 0.0)
        ));
    }

    #[test]
    fn test_gene_round_trip() {
        for gene in [
            "G 1 0 0 0 0 1 1 0",
            "G 1 0 0 1 0 1 1 1",
            "E 1 0 0 0 1 1 0 0 0 -1 0 0 1 0 0 0",
            "E 1 0 0 0 0 -1 1 1 -1 0 1 1 -1 -1 0 0 1 0 0 0 1 0 0 0 1 1 1 1",
        ] {
            let generator = Generator::parse(gene).unwrap();
            assert_eq!(generator.gene(), gene);
            let reparsed = Generator::parse(&generator.gene()).unwrap();
            assert_eq!(reparsed.elements(), generator.elements());
            assert_eq!(reparsed.total(), generator.total());
        }
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(Generator::parse(""), Err(ParseError::Empty)));
        assert!(matches!(
            Generator::parse("X 1 0 0 0"),
            Err(ParseError::UnknownLattice(_))
        ));
        assert!(matches!(
            Generator::parse("G 1 0 0"),
            Err(ParseError::TruncatedGene { count: 3 })
        ));
        assert!(matches!(
            Generator::parse("G one 0 0 0"),
            Err(ParseError::InvalidInteger { .. })
        ));
        assert!(matches!(
            Generator::parse("G"),
            Err(ParseError::Invalid(GeneratorError::Empty))
        ));
    }

    #[test]
    fn test_degenerate_generators() {
        // Zero family total: the base segment has no direction.
        assert!(matches!(
            Generator::parse("G 0 0 0 0"),
            Err(ParseError::Invalid(GeneratorError::Degenerate(_)))
        ));
        // An element that repeats the previous running coordinate.
        assert!(matches!(
            Generator::parse("G 1 0 0 0 0 0 0 0"),
            Err(ParseError::Invalid(GeneratorError::Degenerate(_)))
        ));
    }

    #[test]
    fn test_mixed_lattices_rejected() {
        let elements = vec![
            GeneratorElement::new(LatticePoint::new(1, 0, Lattice::Square), false, false),
            GeneratorElement::new(LatticePoint::new(0, 1, Lattice::Triangular), false, false),
        ];
        assert!(matches!(
            Generator::new(elements),
            Err(GeneratorError::LatticeMismatch { .. })
        ));
    }

    #[test]
    fn test_open_initiator_mapping() {
        let mut dragon = presets::dragon();
        dragon.expand(2);
        let initiator = dragon.base_initiator();

        // The base segment maps onto itself, so the teragon is the level
        // point set with the origin prefixed.
        let curve = map_initiator(&initiator, &dragon, false, 2).unwrap();
        assert_eq!(curve.len(), 5);
        assert!(close(curve[0], Vec3::ZERO));
        for (mapped, cached) in curve[1..].iter().zip(dragon.points(2).unwrap()) {
            assert!(close(*mapped, *cached));
        }
    }

    #[test]
    fn test_closed_initiator_drops_duplicate_vertex() {
        let mut dragon = presets::dragon();
        dragon.expand(3);
        let square = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 4.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
        ];
        for level in 1..=3 {
            let curve = map_initiator(&square, &dragon, true, level).unwrap();
            assert_eq!(curve.len(), 4 * 2usize.pow(level as u32));
        }
    }

    #[test]
    fn test_initiator_errors() {
        let dragon = presets::dragon();
        assert!(matches!(
            initiator_transforms(&[Vec3::ZERO], &dragon, false),
            Err(InitiatorError::TooFewPoints(1))
        ));
        // Coincident consecutive points degenerate the target segment.
        let pinched = [Vec3::ZERO, Vec3::ZERO, Vec3::X];
        assert!(matches!(
            initiator_transforms(&pinched, &dragon, false),
            Err(InitiatorError::Degenerate(_))
        ));
        // Unexpanded level.
        assert!(matches!(
            map_initiator(&dragon.base_initiator(), &dragon, false, 4),
            Err(InitiatorError::Level(_))
        ));
    }

    #[test]
    fn test_presets_are_valid_families() {
        let families = [
            (presets::dragon(), 2, 2),
            (presets::levy_c(), 2, 2),
            (presets::koch(), 4, 9),
            (presets::terdragon(), 3, 3),
            (presets::flowsnake(), 7, 7),
        ];
        for (generator, count, norm) in families {
            assert_eq!(generator.element_count(), count);
            assert_eq!(generator.total().norm(), norm);
            let reparsed = Generator::parse(&generator.gene()).unwrap();
            assert_eq!(reparsed.elements(), generator.elements());
        }
    }

    #[test]
    fn test_display_lists_family_and_elements() {
        let dragon = presets::dragon();
        let text = dragon.to_string();
        assert!(text.starts_with("family G(1, 1) norm 2"));
        assert!(text.contains("G(0, 1) reverse=true"));
    }
}
