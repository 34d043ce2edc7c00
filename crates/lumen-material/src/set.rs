//! Scene-level collection of bound surfaces

use crate::binder::{MaterialBinder, SharedUniforms};
use crate::instance::MaterialInstance;
use crate::surface::SourceMaterial;
use lumen_core::MaterialError;
use lumen_environment::LightingBundle;
use lumen_shading::ShadingConfiguration;

/// Index of a surface within a [`MaterialSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(usize);

/// Binding state of one surface
#[derive(Debug, Clone)]
pub enum SurfaceSlot<T> {
    Unbound,
    Bound(MaterialInstance<T>),
}

impl<T> SurfaceSlot<T> {
    pub fn is_bound(&self) -> bool {
        matches!(self, SurfaceSlot::Bound(_))
    }
}

/// Every surface of a scene, lit by one environment.
///
/// Source materials are retained so an environment switch can rebuild
/// each instance from scratch.
pub struct MaterialSet<T, S> {
    binder: MaterialBinder,
    shared: SharedUniforms,
    surfaces: Vec<(S, SurfaceSlot<T>)>,
}

impl<T, S> MaterialSet<T, S>
where
    T: Clone,
    S: SourceMaterial<T>,
{
    pub fn new(binder: MaterialBinder, shared: SharedUniforms) -> Self {
        Self {
            binder,
            shared,
            surfaces: Vec::new(),
        }
    }

    /// Register a surface; it stays unbound until the next environment switch
    pub fn add_surface(&mut self, source: S) -> SurfaceId {
        self.surfaces.push((source, SurfaceSlot::Unbound));
        SurfaceId(self.surfaces.len() - 1)
    }

    pub fn state(&self, id: SurfaceId) -> Option<&SurfaceSlot<T>> {
        self.surfaces.get(id.0).map(|(_, slot)| slot)
    }

    pub fn instance(&self, id: SurfaceId) -> Option<&MaterialInstance<T>> {
        match self.state(id)? {
            SurfaceSlot::Bound(instance) => Some(instance),
            SurfaceSlot::Unbound => None,
        }
    }

    pub fn instance_mut(&mut self, id: SurfaceId) -> Option<&mut MaterialInstance<T>> {
        match self.surfaces.get_mut(id.0)? {
            (_, SurfaceSlot::Bound(instance)) => Some(instance),
            (_, SurfaceSlot::Unbound) => None,
        }
    }

    /// Rebind every surface against `bundle`.
    ///
    /// Instances are built first and swapped in together; a failing
    /// surface leaves every slot as it was.
    pub fn switch_environment(&mut self, bundle: &LightingBundle<T>) -> Result<(), MaterialError> {
        let rebuilt = self
            .surfaces
            .iter()
            .map(|(source, _)| self.binder.bind(source, bundle, &self.shared))
            .collect::<Result<Vec<_>, _>>()?;

        for ((_, slot), instance) in self.surfaces.iter_mut().zip(rebuilt) {
            *slot = SurfaceSlot::Bound(instance);
        }
        log::info!("Rebound {} surfaces to the new environment", self.surfaces.len());
        Ok(())
    }

    /// Refresh every bound surface from one configuration snapshot.
    ///
    /// Returns the number of surfaces whose defines changed.
    pub fn reconfigure(&mut self, config: ShadingConfiguration) -> usize {
        let mut changed = 0;
        for (_, slot) in &mut self.surfaces {
            if let SurfaceSlot::Bound(instance) = slot {
                if self.binder.refresh(instance, &config) {
                    changed += 1;
                }
            }
        }
        self.binder.set_configuration(config);
        changed
    }

    /// Surfaces whose shader must be rebuilt before the next draw
    pub fn pending_recompiles(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.surfaces
            .iter()
            .enumerate()
            .filter(|(_, (_, slot))| matches!(slot, SurfaceSlot::Bound(i) if i.needs_recompile()))
            .map(|(index, _)| SurfaceId(index))
    }

    pub fn binder(&self) -> &MaterialBinder {
        &self.binder
    }

    pub fn shared(&self) -> &SharedUniforms {
        &self.shared
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::tests::bundle;
    use crate::surface::{ParamValue, SurfaceMaterial};
    use crate::uniforms::names;
    use lumen_environment::EnvironmentFormat;

    fn scene() -> (MaterialSet<u32, SurfaceMaterial<u32>>, SurfaceId, SurfaceId) {
        let mut set = MaterialSet::new(MaterialBinder::default(), SharedUniforms::default());
        let a = set.add_surface(SurfaceMaterial::new("floor").with_param("map", ParamValue::Texture(4)));
        let b = set.add_surface(SurfaceMaterial::new("wall"));
        (set, a, b)
    }

    #[test]
    fn test_surfaces_start_unbound() {
        let (set, a, _) = scene();
        assert!(!set.state(a).unwrap().is_bound());
        assert!(set.instance(a).is_none());
        assert_eq!(set.pending_recompiles().count(), 0);
    }

    #[test]
    fn test_switch_environment_binds_everything() {
        let (mut set, a, b) = scene();
        set.switch_environment(&bundle(EnvironmentFormat::Cubemap, true)).unwrap();
        assert!(set.state(a).unwrap().is_bound());
        assert!(set.state(b).unwrap().is_bound());
        assert_eq!(set.instance(a).unwrap().uniforms().texture("map"), Some(&4));
        assert_eq!(set.pending_recompiles().count(), 2);

        set.switch_environment(&bundle(EnvironmentFormat::Panorama, true)).unwrap();
        assert!(set.instance(b).unwrap().defines().contains("ENVMAP_PANORAMA"));
    }

    #[test]
    fn test_failed_switch_keeps_previous_instances() {
        let (mut set, a, _) = scene();
        set.switch_environment(&bundle(EnvironmentFormat::Cubemap, true)).unwrap();
        set.add_surface(SurfaceMaterial::new("sticker").unlit());

        let err = set.switch_environment(&bundle(EnvironmentFormat::Panorama, true));
        assert!(matches!(err, Err(MaterialError::UnsupportedWorkflow(_))));
        assert!(!set.instance(a).unwrap().defines().contains("ENVMAP_PANORAMA"));
        assert!(!set.state(SurfaceId(2)).unwrap().is_bound());
    }

    #[test]
    fn test_reconfigure_counts_define_churn() {
        let (mut set, a, b) = scene();
        set.switch_environment(&bundle(EnvironmentFormat::Cubemap, true)).unwrap();
        for id in [a, b] {
            set.instance_mut(id).unwrap().mark_compiled();
        }

        let same = set.binder().configuration().clone();
        assert_eq!(set.reconfigure(same.clone()), 0);
        assert_eq!(set.pending_recompiles().count(), 0);

        let mut next = same;
        next.set_equation("ndf", "Beckmann").unwrap();
        next.set_metalness_override(Some(1.0)).unwrap();
        assert_eq!(set.reconfigure(next), 2);
        assert_eq!(set.pending_recompiles().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(set.instance(a).unwrap().uniforms().float(names::METALNESS), Some(1.0));
        assert!(set.binder().configuration().equation("ndf") == Some("Beckmann"));
    }

    #[test]
    fn test_shared_handles_span_the_set() {
        let (mut set, a, b) = scene();
        set.switch_environment(&bundle(EnvironmentFormat::Cubemap, true)).unwrap();
        set.shared().environment_brightness.set(0.3);
        assert_eq!(set.instance(a).unwrap().environment_brightness(), 0.3);
        assert_eq!(set.instance(b).unwrap().environment_brightness(), 0.3);
    }
}
