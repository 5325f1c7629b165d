//! Scenario files.
//!
//! A scenario is a TOML file describing either a time domain run (domain,
//! geometry, sources, stop condition, probes) or a mode solve.

use std::path::Path;

use cem_guide::{
    analysis::modes::ModeAnalysis,
    boundary::{
        AbsorbingBoundary,
        Axis,
        Side,
    },
    domain::SimulationDomain,
    excitation::{
        Band,
        ExcitationMode,
        Source,
        Waveform,
        continuous_from_hz,
    },
    geometry::{
        Geometry,
        builder::{
            ClosedCavity,
            FedCavity,
            GeometryBuilder,
            StraightWaveguide,
            WaveguideBend,
        },
    },
    material::{
        Material,
        MaterialCatalog,
        Medium,
    },
    mode::{
        Polarization,
        slab::SlabModeSolver,
    },
    solver::{
        FieldComponent,
        runner::StopCondition,
    },
    units::UnitSystem,
};
use color_eyre::eyre::{
    Context,
    Error,
    bail,
    eyre,
};
use nalgebra::{
    Point2,
    Point3,
    Vector2,
    Vector3,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    /// Additional media, on top of the catalog presets.
    #[serde(default)]
    pub media: Vec<MediumSpec>,

    #[serde(flatten)]
    pub kind: ScenarioKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioKind {
    TimeDomain(TimeDomainScenario),
    Modes(ModesScenario),
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let toml = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read scenario: {}", path.display()))?;
        Self::from_toml(&toml)
            .with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    pub fn from_toml(toml: &str) -> Result<Self, Error> {
        Ok(toml::from_str(toml)?)
    }

    /// Catalog presets plus the scenario's own media.
    pub fn catalog(&self) -> MaterialCatalog {
        let mut catalog = MaterialCatalog::with_presets();
        for medium in &self.media {
            catalog.insert(medium.to_medium());
        }
        catalog
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediumSpec {
    pub name: String,
    #[serde(default)]
    pub index: Option<f64>,
    #[serde(default)]
    pub permittivity: Option<f64>,
    #[serde(default)]
    pub conductivity: f64,
}

impl MediumSpec {
    pub fn to_medium(&self) -> Medium {
        let mut material = match (self.index, self.permittivity) {
            (Some(index), _) => Material::from_index(index),
            (None, Some(permittivity)) => Material::from_permittivity(permittivity),
            (None, None) => Material::VACUUM,
        };
        material.electrical_conductivity = self.conductivity;
        Medium::new(&self.name, material)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Micrometer,
    Centimeter,
    Meter,
}

impl Units {
    pub fn system(&self) -> UnitSystem {
        match self {
            Self::Micrometer => UnitSystem::MICROMETER,
            Self::Centimeter => UnitSystem::CENTIMETER,
            Self::Meter => UnitSystem::METER,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeDomainScenario {
    #[serde(default)]
    pub units: Units,
    pub resolution: f64,
    pub background: String,
    /// Safety limit for runs that never meet their stop condition.
    #[serde(default)]
    pub time_limit: Option<f64>,
    pub geometry: GeometrySpec,
    #[serde(default)]
    pub boundary: BoundarySpec,
    pub sources: Vec<SourceSpec>,
    pub stop: StopCondition,
    #[serde(default)]
    pub probes: Vec<ProbeSpec>,
    #[serde(default)]
    pub animation: Option<AnimationSpec>,
}

impl TimeDomainScenario {
    pub fn build(&self, catalog: &MaterialCatalog) -> Result<SimulationDomain, cem_guide::Error> {
        let (geometry, extent) = self.geometry.build(catalog)?;
        let units = self.units.system();

        let mut domain = SimulationDomain::new(extent, self.resolution, catalog.get(&self.background)?)
            .with_geometry(geometry)
            .with_boundary(self.boundary.build(self.resolution));
        for source in &self.sources {
            domain = domain.with_source(source.build(&units)?);
        }

        Ok(domain)
    }
}

/// Parametric geometry of the scenario. It also fixes the domain extent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometrySpec {
    Empty {
        domain: Vector2<f64>,
    },
    StraightWaveguide {
        width: f64,
        #[serde(default = "infinite")]
        height: f64,
        core: String,
        domain: Vector2<f64>,
    },
    Bend {
        width: f64,
        radius: f64,
        #[serde(default = "infinite")]
        height: f64,
        guide: String,
        surround: String,
        domain: Vector2<f64>,
    },
    ClosedCavity {
        size: Vector2<f64>,
        wall_thickness: f64,
        wall: String,
    },
    FedCavity {
        cavity_size: Vector2<f64>,
        wall_thickness: f64,
        feed_width: f64,
        feed_length: f64,
        wall: String,
    },
}

fn infinite() -> f64 {
    f64::INFINITY
}

impl GeometrySpec {
    pub fn build(&self, catalog: &MaterialCatalog) -> Result<(Geometry, Vector3<f64>), cem_guide::Error> {
        let builder: Box<dyn GeometryBuilder> = match self {
            Self::Empty { domain } => {
                return Ok((Geometry::new(), Vector3::new(domain.x, domain.y, 0.0)));
            }
            Self::StraightWaveguide {
                width,
                height,
                core,
                domain,
            } => {
                Box::new(StraightWaveguide {
                    width: *width,
                    height: *height,
                    core: catalog.get(core)?,
                    domain: *domain,
                })
            }
            Self::Bend {
                width,
                radius,
                height,
                guide,
                surround,
                domain,
            } => {
                Box::new(WaveguideBend {
                    width: *width,
                    radius: *radius,
                    height: *height,
                    guide: catalog.get(guide)?,
                    surround: catalog.get(surround)?,
                    domain: *domain,
                })
            }
            Self::ClosedCavity {
                size,
                wall_thickness,
                wall,
            } => {
                Box::new(ClosedCavity {
                    size: *size,
                    center: Point2::origin(),
                    wall_thickness: *wall_thickness,
                    wall: catalog.get(wall)?,
                })
            }
            Self::FedCavity {
                cavity_size,
                wall_thickness,
                feed_width,
                feed_length,
                wall,
            } => {
                Box::new(FedCavity {
                    cavity_size: *cavity_size,
                    wall_thickness: *wall_thickness,
                    feed_width: *feed_width,
                    feed_length: *feed_length,
                    wall: catalog.get(wall)?,
                })
            }
        };

        Ok((builder.build()?, builder.extent()))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundarySpec {
    /// Closed resonator.
    #[default]
    None,
    /// Absorbing layer on every side, `cells` lattice cells thick unless a
    /// thickness is given.
    Surrounding {
        #[serde(default)]
        cells: Option<usize>,
        #[serde(default)]
        thickness: Option<f64>,
    },
    /// One absorbing side, for semi-open cavities.
    Single {
        thickness: f64,
        axis: Axis,
        side: Side,
    },
}

impl BoundarySpec {
    pub fn build(&self, resolution: f64) -> AbsorbingBoundary {
        match self {
            Self::None => AbsorbingBoundary::none(),
            Self::Surrounding {
                thickness: Some(thickness),
                ..
            } => AbsorbingBoundary::surrounding(*thickness),
            Self::Surrounding {
                cells,
                thickness: None,
            } => {
                AbsorbingBoundary::surrounding_cells(
                    cells.unwrap_or(AbsorbingBoundary::DEFAULT_CELLS),
                    resolution,
                )
            }
            Self::Single {
                thickness,
                axis,
                side,
            } => AbsorbingBoundary::single(*thickness, *axis, *side),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceSpec {
    pub waveform: WaveformSpec,
    pub center: Point3<f64>,
    #[serde(default = "zero_size")]
    pub size: Vector3<f64>,
    #[serde(default = "default_mode")]
    pub mode: ExcitationMode,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
}

fn zero_size() -> Vector3<f64> {
    Vector3::zeros()
}

fn default_mode() -> ExcitationMode {
    ExcitationMode::Component(FieldComponent::Ez)
}

fn default_amplitude() -> f64 {
    1.0
}

impl SourceSpec {
    pub fn build(&self, units: &UnitSystem) -> Result<Source, cem_guide::Error> {
        let waveform = self.waveform.build(units)?;
        Ok(Source::new(waveform, self.center, self.size, self.mode)?.with_amplitude(self.amplitude))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaveformSpec {
    /// Gaussian pulse covering a band.
    Pulse { band: Band },
    /// Continuous wave at a native frequency.
    Continuous { frequency: f64 },
    /// Continuous wave at a frequency in Hz.
    ContinuousHz { frequency: f64 },
}

impl WaveformSpec {
    pub fn build(&self, units: &UnitSystem) -> Result<Waveform, cem_guide::Error> {
        let waveform = match self {
            Self::Pulse { band } => band.to_pulse(units)?,
            Self::Continuous { frequency } => Waveform::continuous(*frequency)?,
            Self::ContinuousHz { frequency } => continuous_from_hz(units, *frequency)?,
        };
        Ok(waveform)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeSpec {
    #[serde(default = "default_component")]
    pub component: FieldComponent,
    pub point: Point3<f64>,
    pub interval: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnimationSpec {
    #[serde(default = "default_component")]
    pub component: FieldComponent,
    pub interval: f64,
}

fn default_component() -> FieldComponent {
    FieldComponent::Ez
}

/// Guided modes of a dielectric slab.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModesScenario {
    /// Vacuum wavelength, in native length units.
    pub wavelength: f64,
    pub width: f64,
    pub core: String,
    pub cladding: String,
    #[serde(default = "default_bands")]
    pub bands: usize,
    #[serde(default)]
    pub polarization: Polarization,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_profile_samples")]
    pub profile_samples: usize,
}

fn default_bands() -> usize {
    1
}

fn default_tolerance() -> f64 {
    ModeAnalysis::DEFAULT_TOLERANCE
}

fn default_profile_samples() -> usize {
    201
}

impl ModesScenario {
    pub fn build(
        &self,
        catalog: &MaterialCatalog,
    ) -> Result<(ModeAnalysis, SlabModeSolver), Error> {
        if self.wavelength.is_nan() || self.wavelength <= 0.0 {
            bail!("Wavelength must be positive, but is {}", self.wavelength);
        }
        let core_index = catalog.get(&self.core)?.refractive_index();
        let cladding_index = catalog.get(&self.cladding)?.refractive_index();

        let mut analysis = ModeAnalysis::new(
            UnitSystem::wavelength_to_native_frequency(self.wavelength),
            core_index,
            cladding_index,
            self.bands,
        )
        .with_polarization(self.polarization);
        analysis.tolerance = self.tolerance;

        let mut solver = SlabModeSolver::new(self.width, core_index, cladding_index);
        solver.profile_samples = self.profile_samples;

        Ok((analysis, solver))
    }
}

/// Sets the number at a dotted path like `geometry.radius` or
/// `sources.0.amplitude` in a parsed scenario.
pub fn set_parameter(table: &mut toml::Table, path: &str, value: f64) -> Result<(), Error> {
    let missing = || eyre!("{path} doesn't name a value in the scenario");

    let mut keys = path.split('.');
    let first = keys.next().unwrap_or_default();
    let mut slot = table.get_mut(first).ok_or_else(missing)?;
    for key in keys {
        slot = match slot {
            toml::Value::Table(table) => table.get_mut(key),
            toml::Value::Array(array) => {
                key.parse::<usize>()
                    .ok()
                    .and_then(|index| array.get_mut(index))
            }
            _ => None,
        }
        .ok_or_else(missing)?;
    }

    match slot {
        toml::Value::Float(_) => *slot = toml::Value::Float(value),
        toml::Value::Integer(_) => {
            // counts like `bands` or `boundary.cells` must stay integers
            if !value.is_finite() || value.fract() != 0.0 {
                bail!("{path} is an integer, but {value} isn't");
            }
            *slot = toml::Value::Integer(value as i64);
        }
        _ => bail!("{path} is not a number"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use cem_guide::solver::runner::StopCondition;

    use crate::scenario::{
        Scenario,
        ScenarioKind,
        set_parameter,
    };

    fn bundled() -> Vec<(PathBuf, Scenario)> {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../scenarios");
        let mut scenarios = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|extension| extension == "toml"))
            .map(|path| {
                let scenario = Scenario::from_path(&path).unwrap();
                (path, scenario)
            })
            .collect::<Vec<_>>();
        scenarios.sort_by(|a, b| a.0.cmp(&b.0));
        scenarios
    }

    #[test]
    fn bundled_scenarios_build() {
        let scenarios = bundled();
        assert_eq!(scenarios.len(), 6);

        for (path, scenario) in &scenarios {
            let catalog = scenario.catalog();
            match &scenario.kind {
                ScenarioKind::TimeDomain(time_domain) => {
                    let domain = time_domain.build(&catalog).unwrap();
                    domain
                        .validate()
                        .unwrap_or_else(|error| panic!("{}: {error}", path.display()));
                    if matches!(time_domain.stop, StopCondition::Decay(_)) {
                        assert!(!domain.boundary.is_empty(), "{}", path.display());
                    }
                }
                ScenarioKind::Modes(modes) => {
                    modes.build(&catalog).unwrap();
                }
            }
        }
    }

    #[test]
    fn oven_feed_is_fifteen_centimeters() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../scenarios/oven.toml");
        let scenario = Scenario::from_path(&path).unwrap();
        let ScenarioKind::TimeDomain(time_domain) = &scenario.kind
        else {
            panic!("expected a time domain scenario");
        };
        let domain = time_domain.build(&scenario.catalog()).unwrap();

        assert_eq!(domain.resolution, 5.0);
        assert_eq!(domain.size.x, 30.0);
        assert_eq!(domain.size.y, 45.0);
        assert_eq!(domain.lattice_size().x, 150);
        assert_eq!(domain.lattice_size().y, 225);

        // the source feeds through the channel, clear of the absorber
        let source = domain.sources[0].center;
        assert!(source.y > -21.5 && source.y < -7.5);
        assert_eq!(domain.medium_at(&source).name, "air");
    }

    #[test]
    fn parameters_can_be_swept() {
        let toml = r#"
            name = "bend"
            kind = "time_domain"
            resolution = 10.0
            background = "silica"

            [geometry]
            kind = "bend"
            width = 0.5
            radius = 5.0
            guide = "silicon_low"
            surround = "silica"
            domain = [15.0, 15.0]

            [[sources]]
            center = [4.75, -7.0, 0.0]
            amplitude = 1.0
            waveform = { kind = "continuous", frequency = 0.645 }

            [stop]
            kind = "fixed_duration"
            until = 10.0
        "#;
        let mut table: toml::Table = toml::from_str(toml).unwrap();
        set_parameter(&mut table, "geometry.radius", 4.0).unwrap();
        set_parameter(&mut table, "sources.0.amplitude", 2.0).unwrap();
        assert!(set_parameter(&mut table, "geometry.guide", 1.0).is_err());
        assert!(set_parameter(&mut table, "geometry.missing", 1.0).is_err());

        let scenario: Scenario = toml::Value::Table(table).try_into().unwrap();
        let ScenarioKind::TimeDomain(time_domain) = &scenario.kind
        else {
            panic!("expected a time domain scenario");
        };
        assert_eq!(time_domain.sources[0].amplitude, 2.0);
        let domain = time_domain.build(&scenario.catalog()).unwrap();
        assert_eq!(domain.geometry.len(), 4);
    }

    #[test]
    fn integer_parameters_stay_integers() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../scenarios/slab_modes.toml");
        let table: toml::Table = toml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        let mut fractional = table.clone();
        assert!(set_parameter(&mut fractional, "bands", 2.5).is_err());

        let mut swept = table;
        set_parameter(&mut swept, "bands", 2.0).unwrap();
        set_parameter(&mut swept, "width", 0.6).unwrap();
        assert_eq!(swept["bands"], toml::Value::Integer(2));

        let scenario: Scenario = toml::Value::Table(swept).try_into().unwrap();
        let ScenarioKind::Modes(modes) = &scenario.kind
        else {
            panic!("expected a modes scenario");
        };
        assert_eq!(modes.bands, 2);
        assert_eq!(modes.width, 0.6);
        modes.build(&scenario.catalog()).unwrap();
    }
}
