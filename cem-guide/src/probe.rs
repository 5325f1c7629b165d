//! Point probes that record a field component over time.

use nalgebra::Point3;

use crate::{
    analysis::{
        AnalysisError,
        spectrum::Spectrum,
    },
    solver::{
        FieldComponent,
        FieldView,
        SolverInstance,
        runner::{
            StepError,
            StepFunction,
        },
    },
    units::UnitSystem,
};

#[derive(Debug, thiserror::Error)]
#[error("probe at {point:?} is outside of the domain")]
pub struct ProbeOutsideDomain {
    pub point: Point3<f64>,
}

/// Samples one field component at a fixed point.
///
/// The probe is a step function: the run controller calls it at its interval.
/// The interval actually used is rounded to a whole number of solver steps and
/// stored in the probe, so the recorded series always knows its true sample
/// spacing.
#[derive(Clone, Debug)]
pub struct Probe {
    component: FieldComponent,
    point: Point3<f64>,
    interval: f64,
    effective_interval: Option<f64>,
    samples: Vec<f64>,
}

impl Probe {
    pub fn new(component: FieldComponent, point: Point3<f64>, interval: f64) -> Self {
        Self {
            component,
            point,
            interval,
            effective_interval: None,
            samples: vec![],
        }
    }

    pub fn component(&self) -> FieldComponent {
        self.component
    }

    pub fn point(&self) -> &Point3<f64> {
        &self.point
    }

    /// Sample spacing. This is the requested interval until the probe was
    /// attached to a run.
    pub fn interval(&self) -> f64 {
        self.effective_interval.unwrap_or(self.interval)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Ends sampling.
    pub fn finish(self) -> TimeSeries {
        TimeSeries {
            component: self.component,
            point: self.point,
            interval: self.interval(),
            samples: self.samples,
        }
    }
}

impl<I> StepFunction<I> for Probe
where
    I: SolverInstance,
{
    fn interval(&self) -> f64 {
        self.interval
    }

    fn location(&self) -> Option<Point3<f64>> {
        Some(self.point)
    }

    fn begin(&mut self, effective_interval: f64) {
        self.effective_interval = Some(effective_interval);
    }

    fn call(&mut self, view: &FieldView<I>) -> Result<(), StepError> {
        let value = view
            .at(self.component, &self.point)
            .ok_or(ProbeOutsideDomain { point: self.point })?;
        self.samples.push(value);
        Ok(())
    }
}

/// Samples recorded by a finished [`Probe`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeries {
    pub component: FieldComponent,
    pub point: Point3<f64>,
    /// Time between samples, in native units.
    pub interval: f64,
    pub samples: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 * self.interval
    }

    /// Spectrum with native frequencies.
    pub fn spectrum(&self) -> Result<Spectrum, AnalysisError> {
        Spectrum::from_samples(&self.samples, self.interval, 1.0)
    }

    /// Spectrum with frequencies in Hz.
    pub fn spectrum_hz(&self, units: &UnitSystem) -> Result<Spectrum, AnalysisError> {
        Spectrum::from_samples(&self.samples, self.interval, units.speed)
    }
}
