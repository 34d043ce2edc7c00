//! Compiled shader permutations keyed by define set

use crate::context::RenderError;
use crate::preprocess::preprocess;
use lumen_core::ContentHash;
use lumen_shading::DefineSet;
use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// The PBR/IBL shading library, before preprocessing
pub const PBR_IBL_SHADER: &str = include_str!("shaders/pbr_ibl.wgsl");

/// One compiled module per distinct [`DefineSet`].
///
/// Surfaces that share a define set share the module; the key is the
/// set's content hash, so insertion order of symbols never matters.
pub struct PermutationCache<M> {
    source: Cow<'static, str>,
    entries: HashMap<ContentHash, M>,
    hits: u64,
}

impl<M> PermutationCache<M> {
    pub fn new(source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            source: source.into(),
            entries: HashMap::new(),
            hits: 0,
        }
    }

    /// Cache over [`PBR_IBL_SHADER`]
    pub fn pbr_ibl() -> Self {
        Self::new(PBR_IBL_SHADER)
    }

    /// Look up the module for `defines`, preprocessing and compiling on a miss
    pub fn get_or_compile<E>(
        &mut self,
        defines: &DefineSet,
        compile: impl FnOnce(&str) -> Result<M, E>,
    ) -> Result<&M, E>
    where
        E: From<RenderError>,
    {
        let key = defines.content_hash();
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                log::debug!("Shader permutation {} reused", key.short());
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let wgsl = preprocess(&self.source, defines)?;
                let module = compile(&wgsl)?;
                log::debug!("Compiled shader permutation {} [{}]", key.short(), defines);
                Ok(entry.insert(module))
            }
        }
    }

    pub fn contains(&self, defines: &DefineSet) -> bool {
        self.entries.contains_key(&defines.content_hash())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered without compiling
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl PermutationCache<wgpu::ShaderModule> {
    /// Compile on `device`, surfacing validation errors instead of panicking
    pub fn shader_module(
        &mut self,
        device: &wgpu::Device,
        defines: &DefineSet,
    ) -> Result<&wgpu::ShaderModule, RenderError> {
        self.get_or_compile(defines, |wgsl| {
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("PBR IBL Shader"),
                source: wgpu::ShaderSource::Wgsl(wgsl.into()),
            });
            match pollster::block_on(device.pop_error_scope()) {
                Some(err) => Err(RenderError::ShaderCompilation(err.to_string())),
                None => Ok(module),
            }
        })
    }
}
