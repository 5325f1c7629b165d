use std::{
    collections::BTreeMap,
    sync::Arc,
};

/// Vacuum constants the solver's update equations are written in.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalConstants {
    pub vacuum_permittivity: f64,
    pub vacuum_permeability: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::REDUCED
    }
}

impl PhysicalConstants {
    pub const SI: Self = Self {
        vacuum_permittivity: 8.8541878188e-12,
        vacuum_permeability: 1.25663706127e-6,
    };

    /// Length-normalized units with `c = 1`. This is what the solvers work in.
    pub const REDUCED: Self = Self {
        vacuum_permittivity: 1.0,
        vacuum_permeability: 1.0,
    };

    pub fn speed_of_light(&self) -> f64 {
        (self.vacuum_permittivity * self.vacuum_permeability).powf(-0.5)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    /// mu_r
    pub relative_permeability: f64,
    /// sigma_m
    pub magnetic_conductivity: f64,

    /// epsilon_r
    pub relative_permittivity: f64,
    /// sigma
    pub electrical_conductivity: f64,
}

impl Material {
    pub const VACUUM: Self = Self {
        relative_permeability: 1.0,
        magnetic_conductivity: 0.0,
        relative_permittivity: 1.0,
        electrical_conductivity: 0.0,
    };

    /// Non-magnetic dielectric with refractive index `n` (`epsilon_r = n^2`).
    pub fn from_index(index: f64) -> Self {
        Self::from_permittivity(index * index)
    }

    pub fn from_permittivity(relative_permittivity: f64) -> Self {
        Self {
            relative_permittivity,
            ..Self::VACUUM
        }
    }

    pub fn conductor(electrical_conductivity: f64) -> Self {
        Self {
            electrical_conductivity,
            ..Self::VACUUM
        }
    }

    pub fn refractive_index(&self) -> f64 {
        (self.relative_permittivity * self.relative_permeability).sqrt()
    }

    pub fn is_lossy(&self) -> bool {
        self.electrical_conductivity > 0.0 || self.magnetic_conductivity > 0.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::VACUUM
    }
}

/// A named material.
///
/// Media are shared between shapes via [`Arc`], so two shapes built from the
/// same catalog entry compare equal with [`Arc::ptr_eq`].
#[derive(Clone, Debug, PartialEq)]
pub struct Medium {
    pub name: String,
    pub material: Material,
}

impl Medium {
    pub fn new(name: impl Into<String>, material: Material) -> Self {
        Self {
            name: name.into(),
            material,
        }
    }

    pub fn refractive_index(&self) -> f64 {
        self.material.refractive_index()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown medium: {name}")]
    UnknownMedium { name: String },
}

/// Lookup table for named media.
#[derive(Clone, Debug, Default)]
pub struct MaterialCatalog {
    media: BTreeMap<String, Arc<Medium>>,
}

impl MaterialCatalog {
    pub const SILICON_INDEX: f64 = 3.5;
    pub const SILICON_LOW_INDEX: f64 = 2.5;
    pub const SILICA_INDEX: f64 = 1.44;
    pub const METAL_CONDUCTIVITY: f64 = 1e7;

    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the media used by the bundled scenarios.
    pub fn with_presets() -> Self {
        let mut catalog = Self::new();
        catalog.insert(Medium::new("vacuum", Material::VACUUM));
        catalog.insert(Medium::new("air", Material::from_permittivity(1.0)));
        catalog.insert(Medium::new(
            "silicon",
            Material::from_index(Self::SILICON_INDEX),
        ));
        // the bend and mode scenarios model the core with a lower index
        catalog.insert(Medium::new(
            "silicon_low",
            Material::from_index(Self::SILICON_LOW_INDEX),
        ));
        catalog.insert(Medium::new(
            "silica",
            Material::from_index(Self::SILICA_INDEX),
        ));
        catalog.insert(Medium::new(
            "metal",
            Material::conductor(Self::METAL_CONDUCTIVITY),
        ));
        catalog
    }

    /// Inserts a medium, replacing any previous medium with the same name.
    pub fn insert(&mut self, medium: Medium) -> Arc<Medium> {
        let medium = Arc::new(medium);
        self.media.insert(medium.name.clone(), medium.clone());
        medium
    }

    pub fn get(&self, name: &str) -> Result<Arc<Medium>, CatalogError> {
        self.media
            .get(name)
            .cloned()
            .ok_or_else(|| {
                CatalogError::UnknownMedium {
                    name: name.to_owned(),
                }
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Medium>> {
        self.media.values()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::material::{
        CatalogError,
        Material,
        MaterialCatalog,
        Medium,
        PhysicalConstants,
    };

    #[test]
    fn reduced_units_have_unit_speed_of_light() {
        assert_eq!(PhysicalConstants::REDUCED.speed_of_light(), 1.0);
        let c = PhysicalConstants::SI.speed_of_light();
        assert!((c - 299_792_458.0).abs() < 1.0);
    }

    #[test]
    fn index_round_trips_through_permittivity() {
        let material = Material::from_index(3.5);
        assert!((material.relative_permittivity - 12.25).abs() < 1e-12);
        assert!((material.refractive_index() - 3.5).abs() < 1e-12);
        assert!(!material.is_lossy());
        assert!(Material::conductor(1e7).is_lossy());
    }

    #[test]
    fn lookups_share_the_same_medium() {
        let catalog = MaterialCatalog::with_presets();
        let a = catalog.get("silica").unwrap();
        let b = catalog.get("silica").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!((a.refractive_index() - 1.44).abs() < 1e-12);
    }

    #[test]
    fn unknown_medium_is_reported_by_name() {
        let catalog = MaterialCatalog::with_presets();
        match catalog.get("unobtainium") {
            Err(CatalogError::UnknownMedium { name }) => assert_eq!(name, "unobtainium"),
            Ok(_) => panic!("expected lookup to fail"),
        }
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let mut catalog = MaterialCatalog::with_presets();
        catalog.insert(Medium::new("silicon", Material::from_index(3.48)));
        let silicon = catalog.get("silicon").unwrap();
        assert!((silicon.refractive_index() - 3.48).abs() < 1e-12);
    }
}
