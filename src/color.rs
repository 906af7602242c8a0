//! YUV to RGB conversion matrices.
//!
//! The conversion itself runs in the fragment shader; this module only owns
//! the coefficients and a CPU version of the same arithmetic.

/// Chroma offset subtracted from U and V before the matrix multiply.
pub const CHROMA_OFFSET: f32 = 0.5;

/// Coefficient set used to turn YUV samples into RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMatrix {
    /// ITU-R BT.601 (standard definition).
    #[default]
    Bt601,
    /// ITU-R BT.709 (high definition).
    Bt709,
}

impl ColorMatrix {
    /// The matrix in column-major order, ready for `glUniformMatrix3fv`
    /// without transposition.
    ///
    /// Columns are the contributions of Y, U and V respectively.
    #[must_use]
    pub fn columns(self) -> [f32; 9] {
        match self {
            Self::Bt601 => [
                1.0, 1.0, 1.0, //
                0.0, -0.394_65, 2.032_11, //
                1.139_83, -0.580_60, 0.0,
            ],
            Self::Bt709 => [
                1.0, 1.0, 1.0, //
                0.0, -0.214_82, 2.127_98, //
                1.280_33, -0.380_59, 0.0,
            ],
        }
    }

    /// Convert one normalized YUV sample to RGB the way the shader does.
    ///
    /// Results are not clamped; GL clamps when writing to a normalized
    /// color buffer.
    #[must_use]
    pub fn apply(self, [y, u, v]: [f32; 3]) -> [f32; 3] {
        let m = self.columns();
        let yuv = [y, u - CHROMA_OFFSET, v - CHROMA_OFFSET];
        let mut rgb = [0.0; 3];
        for (row, out) in rgb.iter_mut().enumerate() {
            *out = (0..3).map(|col| m[col * 3 + row] * yuv[col]).sum();
        }
        rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rgb_near(actual: [f32; 3], expected: [f32; 3]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn neutral_chroma_is_gray() {
        for matrix in [ColorMatrix::Bt601, ColorMatrix::Bt709] {
            assert_rgb_near(matrix.apply([0.0, 0.5, 0.5]), [0.0, 0.0, 0.0]);
            assert_rgb_near(matrix.apply([0.5, 0.5, 0.5]), [0.5, 0.5, 0.5]);
            assert_rgb_near(matrix.apply([1.0, 0.5, 0.5]), [1.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn bt601_red_axis() {
        // V above neutral pushes red up and green down, blue untouched.
        let [r, g, b] = ColorMatrix::Bt601.apply([0.5, 0.5, 1.0]);
        assert!((r - (0.5 + 0.5 * 1.139_83)).abs() < 1e-5);
        assert!((g - (0.5 - 0.5 * 0.580_60)).abs() < 1e-5);
        assert!((b - 0.5).abs() < 1e-5);
    }

    #[test]
    fn bt709_blue_axis() {
        let [r, g, b] = ColorMatrix::Bt709.apply([0.25, 1.0, 0.5]);
        assert!((r - 0.25).abs() < 1e-5);
        assert!((g - (0.25 - 0.5 * 0.214_82)).abs() < 1e-5);
        assert!((b - (0.25 + 0.5 * 2.127_98)).abs() < 1e-5);
    }

    #[test]
    fn luma_column_is_identity() {
        for matrix in [ColorMatrix::Bt601, ColorMatrix::Bt709] {
            assert_eq!(&matrix.columns()[..3], &[1.0, 1.0, 1.0]);
        }
    }
}
