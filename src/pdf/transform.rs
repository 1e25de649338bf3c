//! Affine transforms for content streams and form matrices

use lopdf::Object;

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl TransformMatrix {
    /// Identity matrix (no transformation)
    pub fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self { e: tx, f: ty, ..Self::identity() }
    }

    /// Counter-clockwise rotation about the origin
    pub fn rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    /// `self` applied first, then `other` (the order `cm` operators compose in)
    pub fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Check if this is (approximately) the identity matrix
    pub fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 0.001 &&
        self.b.abs() < 0.001 &&
        self.c.abs() < 0.001 &&
        (self.d - 1.0).abs() < 0.001 &&
        self.e.abs() < 0.001 &&
        self.f.abs() < 0.001
    }

    /// The six numbers as `cm` operands or a `/Matrix` array
    pub fn to_operands(&self) -> Vec<Object> {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .into_iter()
            .map(Object::Real)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Map `(x, y)` through `m` and compare with the expected point
    fn assert_maps(m: &TransformMatrix, (x, y): (f32, f32), (ex, ey): (f32, f32)) {
        let (px, py) = (m.a * x + m.c * y + m.e, m.b * x + m.d * y + m.f);
        assert!((px - ex).abs() < 1e-3 && (py - ey).abs() < 1e-3, "({px}, {py}) != ({ex}, {ey})");
    }

    #[test]
    fn test_rotation_is_counter_clockwise() {
        let quarter = TransformMatrix::rotate(90.0);
        assert_maps(&quarter, (1.0, 0.0), (0.0, 1.0));
    }

    #[test]
    fn test_rotate_then_translate_keeps_origin_on_anchor() {
        // `x y cm` followed by a rotation `cm`: the inner (rotation) matrix
        // is applied to points first
        let ctm = TransformMatrix::rotate(45.0).then(&TransformMatrix::translate(300.0, 400.0));
        assert_maps(&ctm, (0.0, 0.0), (300.0, 400.0));

        let step = 10.0 * std::f32::consts::FRAC_1_SQRT_2;
        assert_maps(&ctm, (10.0, 0.0), (300.0 + step, 400.0 + step));
    }

    #[test]
    fn test_identity_detection() {
        assert!(TransformMatrix::identity().is_identity());
        assert!(TransformMatrix::rotate(0.0).is_identity());
        assert!(!TransformMatrix::translate(0.0, 12.0).is_identity());
    }
}
