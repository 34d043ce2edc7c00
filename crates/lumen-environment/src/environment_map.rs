//! Specular and background environment maps

use crate::backend::EnvironmentFormat;
use crate::payload::{CubeFace, PackedCubemap, PackedPanorama};
use lumen_core::Vec3;
use std::f32::consts::PI;
use std::sync::Arc;

/// Columns of the LogLuv to linear RGB matrix
const LUV_INVERSE: [[f32; 3]; 3] = [
    [6.0014, -2.7008, -1.7996],
    [-1.3320, 3.1029, -5.7721],
    [0.3008, -1.0882, 5.6268],
];

/// Decode one LogLuv-encoded RGBA8 texel to linear RGB
pub fn decode_luv(texel: [u8; 4]) -> [f32; 3] {
    let n = texel.map(|c| c as f32 / 255.0);
    decode_luv_normalized(n)
}

fn decode_luv_normalized(luv: [f32; 4]) -> [f32; 3] {
    if luv[1] <= 0.0 {
        return [0.0; 3];
    }
    let le = luv[2] * 255.0 + luv[3];
    let y = ((le - 127.0) / 2.0).exp2();
    let z = y / luv[1];
    let x = luv[0] * z;

    let mut rgb = [0.0f32; 3];
    for (i, out) in rgb.iter_mut().enumerate() {
        let v = LUV_INVERSE[0][i] * x + LUV_INVERSE[1][i] * y + LUV_INVERSE[2][i] * z;
        *out = v.max(0.0);
    }
    rgb
}

/// An environment texture in one of the two supported layouts.
///
/// Both variants keep the packed payload next to the backend texture so
/// lighting can also be evaluated on the CPU.
#[derive(Debug, Clone)]
pub enum EnvironmentMap<T> {
    Cubemap {
        texture: T,
        payload: Arc<PackedCubemap>,
    },
    Panorama {
        texture: T,
        payload: Arc<PackedPanorama>,
    },
}

impl<T> EnvironmentMap<T> {
    pub fn format(&self) -> EnvironmentFormat {
        match self {
            EnvironmentMap::Cubemap { .. } => EnvironmentFormat::Cubemap,
            EnvironmentMap::Panorama { .. } => EnvironmentFormat::Panorama,
        }
    }

    pub fn texture(&self) -> &T {
        match self {
            EnvironmentMap::Cubemap { texture, .. } | EnvironmentMap::Panorama { texture, .. } => texture,
        }
    }

    /// Width of the largest level
    pub fn size(&self) -> u32 {
        match self {
            EnvironmentMap::Cubemap { payload, .. } => payload.size(),
            EnvironmentMap::Panorama { payload, .. } => payload.width(),
        }
    }

    pub fn level_count(&self) -> u32 {
        match self {
            EnvironmentMap::Cubemap { payload, .. } => payload.level_count(),
            EnvironmentMap::Panorama { payload, .. } => payload.level_count(),
        }
    }

    /// Nearest raw texel in `direction` at mip `lod`
    pub fn lookup(&self, direction: Vec3, lod: f32) -> Option<[u8; 4]> {
        if !direction.is_finite() || direction.length() == 0.0 {
            return None;
        }
        let d = direction.normalized();
        let level = self.level_index(lod);

        match self {
            EnvironmentMap::Cubemap { payload, .. } => {
                let (face, u, v) = cube_face_uv(d);
                let mip = payload.levels().get(level)?;
                payload.texel(level, face, to_texel(u, mip.width), to_texel(v, mip.height))
            }
            EnvironmentMap::Panorama { payload, .. } => {
                let (u, v) = panorama_uv(d);
                let mip = payload.levels().get(level)?;
                payload.texel(level, to_texel(u, mip.width), to_texel(v, mip.height))
            }
        }
    }

    /// Decoded linear radiance in `direction` at mip `lod`
    pub fn sample(&self, direction: Vec3, lod: f32) -> [f32; 3] {
        self.lookup(direction, lod).map_or([0.0; 3], decode_luv)
    }

    fn level_index(&self, lod: f32) -> usize {
        let last = self.level_count().saturating_sub(1) as f32;
        let lod = if lod.is_finite() { lod } else { 0.0 };
        lod.round().clamp(0.0, last) as usize
    }
}

/// Major-axis face selection with GL cubemap orientation
fn cube_face_uv(d: Vec3) -> (CubeFace, f32, f32) {
    let (ax, ay, az) = (d.x.abs(), d.y.abs(), d.z.abs());
    let (face, sc, tc, ma) = if ax >= ay && ax >= az {
        if d.x > 0.0 {
            (CubeFace::PositiveX, -d.z, -d.y, ax)
        } else {
            (CubeFace::NegativeX, d.z, -d.y, ax)
        }
    } else if ay >= az {
        if d.y > 0.0 {
            (CubeFace::PositiveY, d.x, d.z, ay)
        } else {
            (CubeFace::NegativeY, d.x, -d.z, ay)
        }
    } else if d.z > 0.0 {
        (CubeFace::PositiveZ, d.x, -d.y, az)
    } else {
        (CubeFace::NegativeZ, -d.x, -d.y, az)
    };
    (face, 0.5 * (sc / ma + 1.0), 0.5 * (tc / ma + 1.0))
}

/// Equirectangular mapping, +Y at the top row
fn panorama_uv(d: Vec3) -> (f32, f32) {
    let u = d.z.atan2(d.x) / (2.0 * PI) + 0.5;
    let v = d.y.clamp(-1.0, 1.0).acos() / PI;
    (u, v)
}

fn to_texel(coord: f32, extent: u32) -> u32 {
    let max = extent.saturating_sub(1);
    ((coord * extent as f32) as u32).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LUV_FORWARD: [[f32; 3]; 3] = [
        [0.2209, 0.3390, 0.4184],
        [0.1138, 0.6780, 0.7319],
        [0.0102, 0.1130, 0.2969],
    ];

    fn encode_luv(rgb: [f32; 3]) -> [f32; 4] {
        let mut xyz = [0.0f32; 3];
        for (i, out) in xyz.iter_mut().enumerate() {
            let v = LUV_FORWARD[0][i] * rgb[0] + LUV_FORWARD[1][i] * rgb[1] + LUV_FORWARD[2][i] * rgb[2];
            *out = v.max(1e-6);
        }
        let le = 2.0 * xyz[1].log2() + 127.0;
        let w = le.fract();
        let z = (le - (w * 255.0).floor() / 255.0) / 255.0;
        [xyz[0] / xyz[2], xyz[1] / xyz[2], z, w]
    }

    #[test]
    fn test_luv_decode_inverts_encode() {
        for rgb in [[1.0, 1.0, 1.0], [0.25, 0.5, 0.75], [4.0, 2.0, 1.0]] {
            let decoded = decode_luv_normalized(encode_luv(rgb));
            for c in 0..3 {
                assert!(
                    (decoded[c] - rgb[c]).abs() < 0.02 * rgb[c].max(1.0),
                    "{rgb:?} decoded to {decoded:?}"
                );
            }
        }
    }

    #[test]
    fn test_luv_zero_chroma_is_black() {
        assert_eq!(decode_luv([10, 0, 127, 0]), [0.0; 3]);
    }

    fn face_coded_cube() -> EnvironmentMap<()> {
        let size = 4u32;
        let mut data = Vec::new();
        for level in 0..3u32 {
            let s = (size >> level) as usize;
            for face in 0..6u8 {
                for _ in 0..s * s {
                    data.extend_from_slice(&[face, level as u8, 0, 255]);
                }
            }
        }
        let payload = PackedCubemap::from_bytes("cube", size, data).unwrap();
        EnvironmentMap::Cubemap {
            texture: (),
            payload: Arc::new(payload),
        }
    }

    #[test]
    fn test_cube_face_selection() {
        let cube = face_coded_cube();
        let cases = [
            (Vec3::new(1.0, 0.1, 0.2), 0u8),
            (Vec3::new(-1.0, 0.1, 0.2), 1),
            (Vec3::new(0.1, 1.0, 0.2), 2),
            (Vec3::new(0.1, -1.0, 0.2), 3),
            (Vec3::new(0.1, 0.2, 1.0), 4),
            (Vec3::new(0.1, 0.2, -1.0), 5),
        ];
        for (dir, face) in cases {
            assert_eq!(cube.lookup(dir, 0.0).unwrap()[0], face, "{dir:?}");
        }
    }

    #[test]
    fn test_lod_selects_and_clamps_level() {
        let cube = face_coded_cube();
        let dir = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(cube.lookup(dir, 0.0).unwrap()[1], 0);
        assert_eq!(cube.lookup(dir, 1.2).unwrap()[1], 1);
        assert_eq!(cube.lookup(dir, 9.0).unwrap()[1], 2);
        assert_eq!(cube.lookup(dir, -3.0).unwrap()[1], 0);
        assert_eq!(cube.lookup(dir, f32::NAN).unwrap()[1], 0);
    }

    #[test]
    fn test_degenerate_direction() {
        let cube = face_coded_cube();
        assert!(cube.lookup(Vec3::ZERO, 0.0).is_none());
        assert_eq!(cube.sample(Vec3::ZERO, 0.0), [0.0; 3]);
    }

    #[test]
    fn test_panorama_rows_follow_elevation() {
        let width = 8u32;
        let height = 4u32;
        let mut data = Vec::new();
        for row in 0..height {
            for _ in 0..width {
                data.extend_from_slice(&[row as u8, 0, 0, 255]);
            }
        }
        let payload = PackedPanorama::from_bytes("pano", width, data).unwrap();
        let pano = EnvironmentMap::Panorama {
            texture: (),
            payload: Arc::new(payload),
        };
        assert_eq!(pano.format(), EnvironmentFormat::Panorama);
        assert_eq!(pano.lookup(Vec3::UP, 0.0).unwrap()[0], 0);
        assert_eq!(pano.lookup(-Vec3::UP, 0.0).unwrap()[0], 3);
        assert_eq!(pano.size(), 8);
    }
}
