use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Every shape the widget can display, in the fixed cycling order used by
/// [`ShapeKind::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    #[serde(rename = "circle")]
    Circle,
    #[serde(rename = "square")]
    Square,
    #[serde(rename = "triangle")]
    Triangle,
    #[serde(rename = "waterTriangle")]
    InvertedTriangle,
    #[serde(rename = "pentagram")]
    FivePointStar,
    #[serde(rename = "hexagram")]
    SixPointStar,
    #[serde(rename = "philosopherStone")]
    MarkedCircle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Triangle,
        ShapeKind::InvertedTriangle,
        ShapeKind::FivePointStar,
        ShapeKind::SixPointStar,
        ShapeKind::MarkedCircle,
    ];

    /// Position of the shape within [`ShapeKind::ALL`].
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|shape| *shape == self)
            .unwrap_or_default()
    }

    /// Next shape in cyclic order, wrapping after the last one.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Uniform pick among all shapes. The current shape may come up again.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Name used in persisted records and log output.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Triangle => "triangle",
            ShapeKind::InvertedTriangle => "waterTriangle",
            ShapeKind::FivePointStar => "pentagram",
            ShapeKind::SixPointStar => "hexagram",
            ShapeKind::MarkedCircle => "philosopherStone",
        }
    }

    /// Inverse of [`ShapeKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| shape.name() == name)
    }

    /// Vector outline of the shape inside a 100x100 view box.
    pub fn outline(self) -> Outline {
        match self {
            ShapeKind::Circle => Outline::Circle,
            ShapeKind::Square => Outline::Square,
            ShapeKind::Triangle => Outline::Polygons(&[TRIANGLE]),
            ShapeKind::InvertedTriangle => Outline::Polygons(&[INVERTED_TRIANGLE]),
            ShapeKind::FivePointStar => Outline::Polygons(&[PENTAGRAM]),
            ShapeKind::SixPointStar => Outline::Polygons(&HEXAGRAM),
            ShapeKind::MarkedCircle => Outline::MarkedCircle,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in the 100x100 view box.
pub type Point = (f32, f32);

const TRIANGLE: &[Point] = &[(50.0, 10.0), (90.0, 90.0), (10.0, 90.0)];
const INVERTED_TRIANGLE: &[Point] = &[(50.0, 90.0), (90.0, 10.0), (10.0, 10.0)];
const PENTAGRAM: &[Point] = &[
    (50.0, 5.0),
    (61.0, 38.0),
    (98.0, 38.0),
    (67.0, 58.0),
    (78.0, 91.0),
    (50.0, 70.0),
    (22.0, 91.0),
    (33.0, 58.0),
    (2.0, 38.0),
    (39.0, 38.0),
];
const HEXAGRAM: [&[Point]; 2] = [
    &[(50.0, 5.0), (90.0, 80.0), (10.0, 80.0)],
    &[(50.0, 95.0), (90.0, 20.0), (10.0, 20.0)],
];

/// Geometry handed to render surfaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outline {
    /// Filled disc covering the whole box, bordered.
    Circle,
    /// Filled box, bordered.
    Square,
    /// One or more stroked polygons drawn on a transparent box.
    Polygons(&'static [&'static [Point]]),
    /// Bordered disc with a centered dot a tenth of the size, filled with
    /// the border color.
    MarkedCircle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn next_follows_fixed_order_and_wraps() {
        assert_eq!(ShapeKind::Circle.next(), ShapeKind::Square);
        assert_eq!(ShapeKind::Square.next(), ShapeKind::Triangle);
        assert_eq!(ShapeKind::MarkedCircle.next(), ShapeKind::Circle);

        let mut shape = ShapeKind::Circle;
        for _ in 0..ShapeKind::ALL.len() {
            shape = shape.next();
        }
        assert_eq!(shape, ShapeKind::Circle);
    }

    #[test]
    fn serialises_with_legacy_names() {
        assert_eq!(
            serde_json::to_string(&ShapeKind::InvertedTriangle).unwrap(),
            "\"waterTriangle\""
        );
        let parsed: ShapeKind = serde_json::from_str("\"philosopherStone\"").unwrap();
        assert_eq!(parsed, ShapeKind::MarkedCircle);

        for shape in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_name(shape.name()), Some(shape));
        }
        assert_eq!(ShapeKind::from_name("dodecahedron"), None);
    }

    #[test]
    fn random_pick_reaches_every_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 7];
        for _ in 0..500 {
            seen[ShapeKind::random(&mut rng).index()] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn hexagram_is_two_triangles() {
        match ShapeKind::SixPointStar.outline() {
            Outline::Polygons(polys) => {
                assert_eq!(polys.len(), 2);
                assert!(polys.iter().all(|poly| poly.len() == 3));
            }
            other => panic!("unexpected outline {other:?}"),
        }
    }
}
