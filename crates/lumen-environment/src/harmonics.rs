//! Diffuse irradiance as order-2 spherical harmonics

use lumen_core::Vec3;

/// Band normalization constants, applied once when coefficients are parsed
pub const SH_BAND_CONSTANTS: [f32; 9] = {
    // 1/(2*sqrt(pi)), sqrt(3/pi)/2, sqrt(15/pi)/2, sqrt(5/pi)/4, sqrt(15/pi)/4
    const C0: f32 = 0.282_094_8;
    const C1: f32 = 0.488_602_5;
    const C4: f32 = 1.092_548_4;
    const C6: f32 = 0.315_391_57;
    const C8: f32 = 0.546_274_2;
    [C0, -C1, C1, -C1, C4, -C4, C6, -C4, C8]
};

/// Nine RGB coefficients in uniform-ready (pre-scaled) form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalHarmonics {
    coefficients: [[f32; 3]; 9],
}

impl SphericalHarmonics {
    /// Scale raw manifest coefficients by the band constants
    pub fn from_raw(raw: &[[f32; 3]; 9]) -> Self {
        let mut coefficients = *raw;
        for (coef, k) in coefficients.iter_mut().zip(SH_BAND_CONSTANTS) {
            for c in coef.iter_mut() {
                *c *= k;
            }
        }
        Self { coefficients }
    }

    /// Wrap coefficients that are already scaled
    pub fn from_scaled(coefficients: [[f32; 3]; 9]) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[[f32; 3]; 9] {
        &self.coefficients
    }

    /// Coefficients flattened to 27 floats
    pub fn to_flat(&self) -> [f32; 27] {
        let mut out = [0.0; 27];
        for (chunk, coef) in out.chunks_exact_mut(3).zip(self.coefficients.iter()) {
            chunk.copy_from_slice(coef);
        }
        out
    }

    /// Irradiance arriving along `normal`, clamped at zero
    pub fn irradiance(&self, normal: Vec3) -> [f32; 3] {
        let n = normal.normalized();
        let (x, y, z) = (n.x, n.y, n.z);
        let basis = [
            1.0,
            y,
            z,
            x,
            y * x,
            y * z,
            3.0 * z * z - 1.0,
            z * x,
            x * x - y * y,
        ];

        let mut out = [0.0f32; 3];
        for (coef, b) in self.coefficients.iter().zip(basis) {
            for c in 0..3 {
                out[c] += coef[c] * b;
            }
        }
        out.map(|v| v.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_band_constants() {
        let c0 = 1.0 / (2.0 * PI.sqrt());
        let c1 = (3.0 / PI).sqrt() * 0.5;
        let c4 = (15.0 / PI).sqrt() * 0.5;
        let c6 = (5.0 / PI).sqrt() * 0.25;
        let c8 = (15.0 / PI).sqrt() * 0.25;
        let expected = [c0, -c1, c1, -c1, c4, -c4, c6, -c4, c8];
        for (a, b) in SH_BAND_CONSTANTS.iter().zip(expected) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_constant_term_only() {
        let mut raw = [[0.0f32; 3]; 9];
        raw[0] = [1.0, 2.0, 3.0];
        let sh = SphericalHarmonics::from_raw(&raw);
        let c0 = SH_BAND_CONSTANTS[0];
        for normal in [Vec3::UP, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0)] {
            let e = sh.irradiance(normal);
            assert!((e[0] - c0).abs() < 1e-6);
            assert!((e[2] - 3.0 * c0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_linear_band_is_directional_and_clamped() {
        let mut raw = [[0.0f32; 3]; 9];
        raw[0] = [1.0; 3];
        raw[1] = [-2.0; 3];
        let sh = SphericalHarmonics::from_raw(&raw);
        let up = sh.irradiance(Vec3::UP);
        let down = sh.irradiance(-Vec3::UP);
        assert!(up[0] > down[0]);
        assert_eq!(down[0], 0.0);
    }

    #[test]
    fn test_flat_layout() {
        let mut raw = [[0.0f32; 3]; 9];
        raw[8] = [1.0, 1.0, 1.0];
        let flat = SphericalHarmonics::from_raw(&raw).to_flat();
        assert_eq!(flat[24], SH_BAND_CONSTANTS[8]);
        assert_eq!(flat[0], 0.0);
    }
}
