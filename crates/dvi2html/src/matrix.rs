//! Affine transforms in the layout used by SVG's `matrix(a b c d e f)`.

use std::fmt;

/// A 2D affine transform.
///
/// The values `[a, b, c, d, e, f]` describe the matrix
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
///
/// All of the mutating operations post-multiply, so `m.translate(x, y)`
/// replaces `m` with `m * T(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    values: [f64; 6],
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        values: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub fn new(values: [f64; 6]) -> Self {
        Matrix { values }
    }

    pub fn values(&self) -> [f64; 6] {
        self.values
    }

    pub fn is_identity(&self) -> bool {
        self.values
            .iter()
            .zip(Matrix::IDENTITY.values.iter())
            .all(|(v, i)| (v - i).abs() < f64::EPSILON)
    }

    /// Returns `self * other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.values;
        let [oa, ob, oc, od, oe, of] = other.values;
        Matrix {
            values: [
                a * oa + c * ob,
                b * oa + d * ob,
                a * oc + c * od,
                b * oc + d * od,
                a * oe + c * of + e,
                b * oe + d * of + f,
            ],
        }
    }

    pub fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.values[0] *= x;
        self.values[1] *= x;
        self.values[2] *= y;
        self.values[3] *= y;
        self
    }

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        let [a, b, c, d, e, f] = self.values;
        self.values[4] = a * x + c * y + e;
        self.values[5] = b * x + d * y + f;
        self
    }

    /// Rotates by the angle, which is in degrees.
    pub fn rotate(&mut self, degrees: f64) -> &mut Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let [a, b, c, d, _, _] = self.values;
        self.values[0] = a * cos + c * sin;
        self.values[1] = b * cos + d * sin;
        self.values[2] = c * cos - a * sin;
        self.values[3] = d * cos - b * sin;
        self
    }

    /// Maps a point through the transform.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.values;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Returns the transform as an SVG attribute with a leading space,
    /// or the empty string for the identity.
    pub fn to_svg_transform(&self) -> String {
        if self.is_identity() {
            return String::new();
        }
        let [a, b, c, d, e, f] = self.values.map(Num);
        format!(r#" transform="matrix({a} {b} {c} {d} {e} {f})""#)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.values.map(Num);
        write!(f, "[{a},{b},{c},{d},{e},{g}]")
    }
}

/// Formats a number for markup output.
///
/// Negative zero is written as `0`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Num(pub f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            write!(f, "0")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(got: Matrix, want: [f64; 6]) {
        for (g, w) in got.values().iter().zip(want.iter()) {
            assert!((g - w).abs() < 1e-9, "got {got}, want {want:?}");
        }
    }

    #[test]
    fn identity_has_no_transform_attribute() {
        assert!(Matrix::default().is_identity());
        assert_eq!(Matrix::default().to_svg_transform(), "");
    }

    #[test]
    fn scale_then_translate() {
        let mut m = Matrix::default();
        m.scale(2.0, 3.0).translate(1.0, 1.0);
        assert_eq!(m.values(), [2.0, 0.0, 0.0, 3.0, 2.0, 3.0]);
        assert_eq!(
            m.to_svg_transform(),
            r#" transform="matrix(2 0 0 3 2 3)""#
        );
    }

    #[test]
    fn rotate_quarter_turn() {
        let mut m = Matrix::default();
        m.rotate(90.0);
        assert_close(m, [0.0, 1.0, -1.0, 0.0, 0.0, 0.0]);
        let (x, y) = m.apply(1.0, 0.0);
        assert!((x - 0.0).abs() < 1e-9 && (y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rotate_after_scale_uses_original_values() {
        let mut m = Matrix::default();
        m.scale(2.0, 1.0).rotate(90.0);
        assert_close(m, [0.0, 1.0, -2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn multiply_matches_chained_operations() {
        let mut chained = Matrix::default();
        chained.translate(5.0, -2.0).scale(3.0, 0.5);
        let mut t = Matrix::default();
        t.translate(5.0, -2.0);
        let mut s = Matrix::default();
        s.scale(3.0, 0.5);
        assert_close(t.multiply(&s), chained.values());
    }

    fn run_inverse_test(values: [f64; 6], x: f64, y: f64) {
        let mut m = Matrix::new(values);
        m.translate(x, y);
        m.translate(-x, -y);
        assert_close(m, values);

        let mut m = Matrix::new(values);
        m.scale(1.0, 1.0);
        assert_close(m, values);

        let mut m = Matrix::new(values);
        m.rotate(0.0);
        assert_close(m, values);
    }

    macro_rules! inverse_tests {
        ( $( ($name: ident, $values: expr, $x: expr, $y: expr), )+ ) => {
            $(
                #[test]
                fn $name() {
                    run_inverse_test($values, $x, $y);
                }
            )+
        };
    }

    inverse_tests!(
        (inverse_on_translation, [1.0, 0.0, 0.0, 1.0, 7.0, -3.0], 2.5, 4.0),
        (inverse_on_scale, [2.0, 0.0, 0.0, 0.5, 0.0, 0.0], -1.0, 8.0),
        (inverse_on_rotation, [0.0, 1.0, -1.0, 0.0, 10.0, 20.0], 3.0, -3.0),
        (inverse_on_shear, [1.0, 0.25, -0.5, 1.0, -4.0, 1.5], 0.125, 100.0),
        (inverse_on_reflection, [-1.0, 0.0, 0.0, -3.0, 1.0, 1.0], -7.5, -0.5),
    );

    #[test]
    fn negative_zero_is_written_as_zero() {
        assert_eq!(format!("{}", Num(-0.0)), "0");
        assert_eq!(format!("{}", Num(-1.5)), "-1.5");
    }

    #[test]
    fn display() {
        let mut m = Matrix::default();
        m.translate(1.0, 2.0);
        assert_eq!(format!("{m}"), "[1,0,0,1,1,2]");
    }
}
