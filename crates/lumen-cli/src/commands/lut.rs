//! BRDF LUT bake command

use crate::config::LumenConfig;
use anyhow::{Context, Result};
use lumen_environment::{generate_brdf_lut, BrdfLutSource, DEFAULT_LUT_SAMPLES, DEFAULT_LUT_SIZE, MAX_LUT_SIZE};

pub fn run(config: &LumenConfig, out: &str, size: Option<u32>, samples: Option<u32>) -> Result<()> {
    let (size, samples) = table_dimensions(&config.brdf, size, samples)?;

    let lut = generate_brdf_lut(size, samples);
    let rgba = lut
        .to_image()
        .context("Generated BRDF table does not match its dimensions")?;
    rgba
        .save_with_format(out, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", out))?;

    println!("Wrote {}x{} BRDF LUT ({} samples) to {}", size, size, samples, out);
    Ok(())
}

/// Command-line values win over a configured generated source
fn table_dimensions(source: &BrdfLutSource, size: Option<u32>, samples: Option<u32>) -> Result<(u32, u32)> {
    let (config_size, config_samples) = match source {
        BrdfLutSource::Generated { size, samples } => (*size, *samples),
        BrdfLutSource::Precomputed { .. } => (DEFAULT_LUT_SIZE, DEFAULT_LUT_SAMPLES),
    };
    let size = size.unwrap_or(config_size);
    let samples = samples.unwrap_or(config_samples);
    if size == 0 || samples == 0 {
        anyhow::bail!("LUT size and sample count must be non-zero");
    }
    if size > MAX_LUT_SIZE {
        anyhow::bail!("LUT size {} exceeds the maximum of {}", size, MAX_LUT_SIZE);
    }
    Ok((size, samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_layering() {
        let configured = BrdfLutSource::Generated { size: 64, samples: 32 };
        assert_eq!(table_dimensions(&configured, None, None).unwrap(), (64, 32));
        assert_eq!(table_dimensions(&configured, Some(16), None).unwrap(), (16, 32));

        let precomputed = BrdfLutSource::Precomputed {
            path: "brdf_ue4.png".to_string(),
        };
        assert_eq!(
            table_dimensions(&precomputed, None, None).unwrap(),
            (DEFAULT_LUT_SIZE, DEFAULT_LUT_SAMPLES)
        );
        assert!(table_dimensions(&configured, Some(0), None).is_err());
    }

    #[test]
    fn test_oversized_table_rejected() {
        let configured = BrdfLutSource::Generated { size: 64, samples: 32 };
        let err = table_dimensions(&configured, Some(40_000), None).unwrap_err();
        assert!(err.to_string().contains("40000"));
        assert_eq!(
            table_dimensions(&configured, Some(MAX_LUT_SIZE), None).unwrap(),
            (MAX_LUT_SIZE, 32)
        );
    }

    #[test]
    fn test_bake_writes_png() {
        let dir = std::env::temp_dir().join(format!("lumen_lut_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("lut.png");
        let config = LumenConfig::default();

        run(&config, out.to_str().unwrap(), Some(8), Some(16)).unwrap();
        let decoded = image::open(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
