//! Defines command

use crate::config::LumenConfig;
use anyhow::{Context, Result};
use lumen_render::{preprocess, PBR_IBL_SHADER};
use lumen_shading::{DefineSet, PermutationCompiler, ShadingChange, ShadingConfiguration};

pub struct DefinesArgs {
    pub changes: Vec<ShadingChange>,
    pub preamble: bool,
    pub wgsl: bool,
}

pub fn run(config: &LumenConfig, args: DefinesArgs) -> Result<()> {
    let (shading, defines) = compile(&config.shading, &args.changes)?;
    log::debug!(
        "Compiled {} defines for env rotation {} brightness {}",
        defines.len(),
        shading.env_rotation(),
        shading.env_brightness()
    );

    if args.wgsl {
        let wgsl = preprocess(PBR_IBL_SHADER, &defines).context("Failed to resolve shader conditionals")?;
        print!("{}", wgsl);
    } else if args.preamble {
        print!("{}", defines.preamble());
    } else {
        for symbol in &defines {
            println!("{}", symbol);
        }
    }

    Ok(())
}

/// Apply `changes` to a copy of `base` and compile the result
fn compile(
    base: &ShadingConfiguration,
    changes: &[ShadingChange],
) -> Result<(ShadingConfiguration, DefineSet)> {
    let mut shading = base.clone();
    shading
        .apply(changes)
        .context("Invalid shading change")?;
    let defines = PermutationCompiler::new().compile(&shading, &DefineSet::new());
    Ok((shading, defines))
}
