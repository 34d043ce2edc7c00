//! Lumen Material - PBR material binding
//!
//! The [`MaterialBinder`] turns a source surface material plus a
//! [`LightingBundle`](lumen_environment::LightingBundle) into a
//! [`MaterialInstance`]: a uniform table, a define set, and a recompile
//! flag. Configuration changes patch instances in place through
//! [`MaterialBinder::refresh`].

mod binder;
mod controls;
mod groups;
mod instance;
mod set;
mod surface;
mod uniforms;

pub use binder::{MaterialBinder, SharedUniforms, SYNC_MAPS, SYNC_UNIFORMS};
pub use controls::EnvironmentControls;
pub use groups::{pbr_defaults, StandardGroup};
pub use instance::MaterialInstance;
pub use set::{MaterialSet, SurfaceId, SurfaceSlot};
pub use surface::{ParamValue, SourceMaterial, SpecularGlossiness, SurfaceMaterial};
pub use uniforms::{names, UniformTable, UniformValue};
