//! Packed texture payload layouts
//!
//! Cubemap payloads are RGBA8 texels stored mip-major: level 0 holds all six
//! faces in +X, -X, +Y, -Y, +Z, -Z order, followed by level 1, and so on.
//! Panorama payloads are an equirectangular mip chain where level `i` is
//! `(w >> i) x max(1, w >> (i + 1))`.

use lumen_core::ProbeError;

const BYTES_PER_TEXEL: usize = 4;

/// Cubemap face, in payload order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Layer index, matching GPU cube array layer order
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Placement of one mip image inside a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    /// Byte offset of the level's first image
    pub offset: usize,
}

impl MipLevel {
    /// Bytes in one image (one face for cubemaps)
    pub fn image_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_TEXEL
    }
}

fn invalid(path: &str, reason: String) -> ProbeError {
    ProbeError::InvalidPayload {
        path: path.to_string(),
        reason,
    }
}

/// Walk a mip chain and lay it over `len` bytes.
///
/// `dims(i)` gives the size of level `i` or `None` past the smallest level;
/// `images` is the number of images per level.
fn split_levels(
    path: &str,
    len: usize,
    images: usize,
    dims: impl Fn(u32) -> Option<(u32, u32)>,
) -> Result<Vec<MipLevel>, ProbeError> {
    let mut levels = Vec::new();
    let mut offset = 0usize;
    let mut index = 0u32;

    while offset < len {
        let Some((width, height)) = dims(index) else {
            return Err(invalid(
                path,
                format!("{} trailing bytes after the last mip level", len - offset),
            ));
        };
        let level = MipLevel {
            width,
            height,
            offset,
        };
        let level_len = level.image_len() * images;
        if offset + level_len > len {
            return Err(invalid(
                path,
                format!(
                    "mip level {} ({}x{}) needs {} bytes but only {} remain",
                    index,
                    width,
                    height,
                    level_len,
                    len - offset
                ),
            ));
        }
        offset += level_len;
        levels.push(level);
        index += 1;
    }

    if levels.is_empty() {
        return Err(invalid(path, "payload is empty".to_string()));
    }
    Ok(levels)
}

fn check_power_of_two(path: &str, size: u32) -> Result<(), ProbeError> {
    if size == 0 || !size.is_power_of_two() {
        return Err(invalid(path, format!("size {} is not a power of two", size)));
    }
    Ok(())
}

/// A cubemap mip chain in packed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedCubemap {
    size: u32,
    levels: Vec<MipLevel>,
    data: Vec<u8>,
}

impl PackedCubemap {
    /// Split `data` into whole cubemap levels starting at `size`
    pub fn from_bytes(path: &str, size: u32, data: Vec<u8>) -> Result<Self, ProbeError> {
        check_power_of_two(path, size)?;
        let levels = split_levels(path, data.len(), CubeFace::ALL.len(), |i| {
            let s = size.checked_shr(i).filter(|s| *s > 0)?;
            Some((s, s))
        })?;
        Ok(Self { size, levels, data })
    }

    /// A uniform cubemap, one texel value everywhere
    pub fn filled(size: u32, level_count: u32, texel: [u8; 4]) -> Self {
        let size = size.max(1);
        let mut levels = Vec::new();
        let mut offset = 0;
        for i in 0..level_count.max(1) {
            let s = (size >> i).max(1);
            let level = MipLevel {
                width: s,
                height: s,
                offset,
            };
            offset += level.image_len() * CubeFace::ALL.len();
            levels.push(level);
            if s == 1 {
                break;
            }
        }
        let data = texel.iter().copied().cycle().take(offset).collect();
        Self { size, levels, data }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Texels of one face at one mip level
    pub fn face(&self, level: usize, face: CubeFace) -> Option<&[u8]> {
        let mip = self.levels.get(level)?;
        let start = mip.offset + face.index() * mip.image_len();
        self.data.get(start..start + mip.image_len())
    }

    pub fn texel(&self, level: usize, face: CubeFace, x: u32, y: u32) -> Option<[u8; 4]> {
        let mip = self.levels.get(level)?;
        let pixels = self.face(level, face)?;
        texel_at(pixels, mip, x, y)
    }
}

/// An equirectangular mip chain in packed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPanorama {
    width: u32,
    levels: Vec<MipLevel>,
    data: Vec<u8>,
}

impl PackedPanorama {
    pub fn from_bytes(path: &str, width: u32, data: Vec<u8>) -> Result<Self, ProbeError> {
        check_power_of_two(path, width)?;
        let levels = split_levels(path, data.len(), 1, |i| panorama_dims(width, i))?;
        Ok(Self {
            width,
            levels,
            data,
        })
    }

    pub fn filled(width: u32, level_count: u32, texel: [u8; 4]) -> Self {
        let width = width.max(1);
        let mut levels = Vec::new();
        let mut offset = 0;
        for i in 0..level_count.max(1) {
            let Some((w, h)) = panorama_dims(width, i) else {
                break;
            };
            let level = MipLevel {
                width: w,
                height: h,
                offset,
            };
            offset += level.image_len();
            levels.push(level);
        }
        let data = texel.iter().copied().cycle().take(offset).collect();
        Self {
            width,
            levels,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn image(&self, level: usize) -> Option<&[u8]> {
        let mip = self.levels.get(level)?;
        self.data.get(mip.offset..mip.offset + mip.image_len())
    }

    pub fn texel(&self, level: usize, x: u32, y: u32) -> Option<[u8; 4]> {
        let mip = self.levels.get(level)?;
        texel_at(self.image(level)?, mip, x, y)
    }
}

fn panorama_dims(width: u32, level: u32) -> Option<(u32, u32)> {
    let w = width.checked_shr(level).filter(|w| *w > 0)?;
    let h = width.checked_shr(level + 1).unwrap_or(0).max(1);
    Some((w, h))
}

fn texel_at(pixels: &[u8], mip: &MipLevel, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= mip.width || y >= mip.height {
        return None;
    }
    let i = (y as usize * mip.width as usize + x as usize) * BYTES_PER_TEXEL;
    let t = pixels.get(i..i + BYTES_PER_TEXEL)?;
    Some([t[0], t[1], t[2], t[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_chain_len(size: u32, levels: u32) -> usize {
        (0..levels)
            .map(|i| {
                let s = (size >> i) as usize;
                s * s * 4 * 6
            })
            .sum()
    }

    #[test]
    fn test_cubemap_full_chain() {
        let data = vec![0u8; cube_chain_len(8, 4)];
        let cube = PackedCubemap::from_bytes("specular.bin", 8, data).unwrap();
        assert_eq!(cube.level_count(), 4);
        assert_eq!(cube.levels()[3].width, 1);
        assert_eq!(cube.face(1, CubeFace::NegativeZ).unwrap().len(), 4 * 4 * 4);
    }

    #[test]
    fn test_cubemap_truncated_chain_is_accepted() {
        let data = vec![0u8; cube_chain_len(16, 2)];
        let cube = PackedCubemap::from_bytes("specular.bin", 16, data).unwrap();
        assert_eq!(cube.level_count(), 2);
    }

    #[test]
    fn test_cubemap_partial_level_is_rejected() {
        let data = vec![0u8; cube_chain_len(8, 1) + 10];
        let err = PackedCubemap::from_bytes("specular.bin", 8, data).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidPayload { ref path, .. } if path == "specular.bin"));
    }

    #[test]
    fn test_cubemap_trailing_bytes_after_1x1() {
        let data = vec![0u8; cube_chain_len(2, 2) + 24];
        assert!(PackedCubemap::from_bytes("specular.bin", 2, data).is_err());
    }

    #[test]
    fn test_empty_and_non_power_of_two() {
        assert!(PackedCubemap::from_bytes("a", 8, Vec::new()).is_err());
        assert!(PackedCubemap::from_bytes("a", 6, vec![0; 6 * 6 * 4 * 6]).is_err());
    }

    #[test]
    fn test_face_order() {
        let mut data = Vec::new();
        for face in 0..6u8 {
            data.extend(std::iter::repeat([face, 0, 0, 255]).take(4).flatten());
        }
        let cube = PackedCubemap::from_bytes("bg.bin", 2, data).unwrap();
        assert_eq!(cube.texel(0, CubeFace::PositiveY, 1, 1), Some([2, 0, 0, 255]));
        assert_eq!(cube.texel(0, CubeFace::NegativeZ, 0, 0), Some([5, 0, 0, 255]));
        assert_eq!(cube.texel(0, CubeFace::NegativeZ, 2, 0), None);
    }

    #[test]
    fn test_panorama_levels() {
        // 8x4, 4x2, 2x1, 1x1
        let len = (8 * 4 + 4 * 2 + 2 + 1) * 4;
        let pano = PackedPanorama::from_bytes("pano.bin", 8, vec![0; len]).unwrap();
        let dims: Vec<(u32, u32)> = pano.levels().iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_panorama_partial_level_is_rejected() {
        let len = (8 * 4 + 3) * 4;
        assert!(PackedPanorama::from_bytes("pano.bin", 8, vec![0; len]).is_err());
    }

    #[test]
    fn test_filled_payloads_round_trip_through_parser() {
        let cube = PackedCubemap::filled(4, 3, [1, 2, 3, 4]);
        let parsed = PackedCubemap::from_bytes("x", 4, cube.data().to_vec()).unwrap();
        assert_eq!(parsed, cube);

        let pano = PackedPanorama::filled(8, 10, [9, 9, 9, 9]);
        assert_eq!(pano.level_count(), 4);
        let parsed = PackedPanorama::from_bytes("y", 8, pano.data().to_vec()).unwrap();
        assert_eq!(parsed, pano);
    }
}
