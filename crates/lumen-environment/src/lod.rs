//! Specular LOD range derivation

use lumen_core::ProbeError;

/// Mip range of a prefiltered specular map.
///
/// `max_lod` is `log2(width)`; `min_lod` is `max_lod - log2(limit_size)`,
/// the last level whose dimension is still at least `limit_size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodRange {
    pub max_lod: f32,
    pub min_lod: f32,
}

impl LodRange {
    pub fn from_dimensions(width: u32, limit_size: u32) -> Result<Self, ProbeError> {
        let valid = width.is_power_of_two() && limit_size.is_power_of_two() && limit_size <= width;
        if !valid {
            return Err(ProbeError::InvalidDimensions { width, limit_size });
        }

        // Exact for powers of two
        let max_lod = width.trailing_zeros() as f32;
        let min_lod = max_lod - limit_size.trailing_zeros() as f32;
        Ok(Self { max_lod, min_lod })
    }

    /// `log2(limit_size)`, the mip distance from `min_lod` up to the 1px level
    pub fn span(&self) -> f32 {
        self.max_lod - self.min_lod
    }

    /// Mip levels a specular map needs so the shader can sample `0..=min_lod`
    pub fn required_levels(&self) -> u32 {
        self.min_lod as u32 + 1
    }

    /// `[max_lod, min_lod]`, the uniform layout
    pub fn to_array(&self) -> [f32; 2] {
        [self.max_lod, self.min_lod]
    }
}
