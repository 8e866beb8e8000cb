/// CSS-style cubic Bézier timing function with fixed end points (0,0) and
/// (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CubicBezier {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Eased value at progress `t`. `t` is clamped to 0.0-1.0; the result is
    /// not, so overshooting curves can exceed 1.0.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let s = self.solve_x(t);
        bezier(s, self.y1, self.y2)
    }

    pub fn css(&self) -> String {
        format!(
            "cubic-bezier({}, {}, {}, {})",
            self.x1, self.y1, self.x2, self.y2
        )
    }

    /// Finds the curve parameter whose x equals `x`. Newton first, bisection
    /// when the slope gets too flat.
    fn solve_x(&self, x: f64) -> f64 {
        let mut s = x;
        for _ in 0..8 {
            let err = bezier(s, self.x1, self.x2) - x;
            if err.abs() < 1e-7 {
                return s;
            }
            let slope = bezier_slope(s, self.x1, self.x2);
            if slope.abs() < 1e-6 {
                break;
            }
            s -= err / slope;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        s = x;
        for _ in 0..64 {
            let value = bezier(s, self.x1, self.x2);
            if (value - x).abs() < 1e-7 {
                break;
            }
            if value < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
        s
    }
}

fn bezier(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_slope(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// The two curve families the widget animates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Gentle back-out used while shrinking.
    Settle,
    /// Springy overshoot used when growing back.
    ElasticOvershoot,
}

impl Easing {
    pub fn curve(self) -> CubicBezier {
        match self {
            Easing::Settle => CubicBezier::new(0.34, 1.3, 0.64, 1.0),
            Easing::ElasticOvershoot => CubicBezier::new(0.34, 1.56, 0.64, 1.0),
        }
    }

    pub fn apply(self, t: f64) -> f64 {
        self.curve().apply(t)
    }

    pub fn css(self) -> String {
        self.curve().css()
    }

    /// Both curves overshoot; kept as a query so surfaces that clamp can ask.
    pub fn can_overshoot(self) -> bool {
        self.curve().y1 > 1.0 || self.curve().y2 > 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_fixed() {
        for easing in [Easing::Settle, Easing::ElasticOvershoot] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(-3.0), 0.0);
            assert_eq!(easing.apply(7.0), 1.0);
        }
    }

    #[test]
    fn linear_curve_is_identity() {
        let linear = CubicBezier::new(0.25, 0.25, 0.75, 0.75);
        for step in 1..10 {
            let t = step as f64 / 10.0;
            assert!((linear.apply(t) - t).abs() < 1e-5);
        }
    }

    #[test]
    fn elastic_overshoots_more_than_settle() {
        let peak = |easing: Easing| {
            (1..100)
                .map(|step| easing.apply(step as f64 / 100.0))
                .fold(f64::MIN, f64::max)
        };
        let settle = peak(Easing::Settle);
        let elastic = peak(Easing::ElasticOvershoot);

        assert!(settle > 1.0);
        assert!(elastic > settle);
        assert!(Easing::ElasticOvershoot.can_overshoot());
    }
}
