//! Drives a solver from the initial state to a stop condition.

use nalgebra::Point3;

use crate::{
    domain::{
        DomainError,
        SimulationDomain,
    },
    solver::{
        FieldComponent,
        FieldView,
        SolverBackend,
        SolverInstance,
        Time,
    },
    util::format_size,
};

/// Errors returned by step functions. They abort the run.
pub type StepError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Callback invoked by the run controller at a fixed cadence.
///
/// Step functions only get a [`FieldView`], so they can observe but never
/// alter the solver state.
pub trait StepFunction<I>
where
    I: SolverInstance,
{
    /// Requested time between calls.
    fn interval(&self) -> f64;

    /// Point the step function samples, if any. Used to reject points
    /// outside the domain before the run starts.
    fn location(&self) -> Option<Point3<f64>> {
        None
    }

    /// Called once before the first step with the interval that will
    /// actually be used. It's the requested interval rounded to a whole number
    /// of solver steps.
    fn begin(&mut self, effective_interval: f64) {
        let _ = effective_interval;
    }

    fn call(&mut self, view: &FieldView<I>) -> Result<(), StepError>;
}

/// Stop once the field at a monitor point has decayed.
///
/// Checking starts after all sources are off. From then on, every `window`
/// the maximum of `|f|²` over the last window is compared against the
/// maximum of `|f|²` over the whole run. The run stops once the former is at
/// most `decay_by` times the latter.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecayCondition {
    pub window: f64,
    pub component: FieldComponent,
    pub point: Point3<f64>,
    pub decay_by: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum StopCondition {
    Decay(DecayCondition),
    FixedDuration { until: f64 },
    StepLimit { limit: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopReason {
    Decayed,
    DurationReached,
    StepLimitReached,
    /// The safety limit set with [`RunController::with_time_limit`] was hit
    /// before the stop condition held.
    TimeLimitReached,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub steps: usize,
    pub time: f64,
    pub stop_reason: StopReason,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("decay-based termination needs an absorbing boundary")]
    DecayWithoutAbsorber,

    #[error("decay-based termination needs sources that end")]
    SourcesNeverEnd,

    #[error("monitor point {point:?} is outside of the domain")]
    MonitorOutsideDomain { point: Point3<f64> },

    #[error("step function {index} samples at {point:?}, which is outside of the domain")]
    ProbeOutsideDomain { index: usize, point: Point3<f64> },

    #[error("decay factor {decay_by} must be smaller than 1")]
    DecayFactorTooLarge { decay_by: f64 },

    #[error("{parameter} must be positive, but is {value}")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("interval {interval} is shorter than the solver time step {time_step}")]
    IntervalBelowTimeStep { interval: f64, time_step: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum RunError<E>
where
    E: std::error::Error + 'static,
{
    #[error("invalid run configuration")]
    Config(#[from] ConfigError),

    #[error("solver failed")]
    Solver(#[source] E),

    #[error("step function {index} failed")]
    StepFunction {
        index: usize,
        #[source]
        source: StepError,
    },
}

fn ensure_positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    }
    else {
        Err(ConfigError::NonPositive { parameter, value })
    }
}

/// Tracks `|f|²` at the monitor point for [`DecayCondition`].
#[derive(Clone, Debug)]
pub struct DecayTracker {
    window: f64,
    decay_by: f64,
    window_start: f64,
    next_check: f64,
    window_max: f64,
    overall_max: f64,
}

impl DecayTracker {
    pub fn new(condition: &DecayCondition, sources_end: f64) -> Self {
        Self {
            window: condition.window,
            decay_by: condition.decay_by,
            window_start: sources_end,
            next_check: sources_end + condition.window,
            window_max: 0.0,
            overall_max: 0.0,
        }
    }

    /// Feeds one sample. Returns `true` once the field has decayed.
    pub fn observe(&mut self, time: f64, value: f64) -> bool {
        let squared = value * value;
        self.overall_max = self.overall_max.max(squared);
        if time >= self.window_start {
            self.window_max = self.window_max.max(squared);
        }

        if time < self.next_check {
            return false;
        }

        // a field that never reached the monitor hasn't decayed
        let decayed =
            self.overall_max > 0.0 && self.window_max <= self.decay_by * self.overall_max;
        tracing::trace!(
            time,
            window_max = self.window_max,
            overall_max = self.overall_max,
            decayed,
            "decay check"
        );
        self.window_max = 0.0;
        self.next_check += self.window;
        decayed
    }
}

struct Scheduled<'a, I>
where
    I: SolverInstance,
{
    every: usize,
    step_function: &'a mut dyn StepFunction<I>,
}

/// Owns a [`SimulationDomain`] and runs it to a stop condition.
///
/// The domain is moved into the controller. Once a run started, nothing can
/// change it anymore.
pub struct RunController<'a, B>
where
    B: SolverBackend,
{
    domain: SimulationDomain,
    stop_condition: StopCondition,
    time_limit: Option<f64>,
    step_functions: Vec<&'a mut dyn StepFunction<B::Instance>>,
}

impl<'a, B> RunController<'a, B>
where
    B: SolverBackend,
{
    pub fn new(domain: SimulationDomain, stop_condition: StopCondition) -> Self {
        Self {
            domain,
            stop_condition,
            time_limit: None,
            step_functions: vec![],
        }
    }

    /// End the run after this much simulated time, even if the stop condition
    /// doesn't hold yet.
    pub fn with_time_limit(mut self, time_limit: f64) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn add_step_function(&mut self, step_function: &'a mut dyn StepFunction<B::Instance>) {
        self.step_functions.push(step_function);
    }

    pub fn with_step_function(
        mut self,
        step_function: &'a mut dyn StepFunction<B::Instance>,
    ) -> Self {
        self.add_step_function(step_function);
        self
    }

    pub fn domain(&self) -> &SimulationDomain {
        &self.domain
    }

    /// Checks everything that can be checked without a solver.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.domain.validate()?;

        match &self.stop_condition {
            StopCondition::Decay(condition) => {
                if self.domain.boundary.is_empty() {
                    return Err(ConfigError::DecayWithoutAbsorber);
                }
                if self.domain.sources_end_time().is_none() {
                    return Err(ConfigError::SourcesNeverEnd);
                }
                ensure_positive("decay window", condition.window)?;
                ensure_positive("decay factor", condition.decay_by)?;
                if condition.decay_by >= 1.0 {
                    return Err(ConfigError::DecayFactorTooLarge {
                        decay_by: condition.decay_by,
                    });
                }
                if !self.domain.contains(&condition.point) {
                    return Err(ConfigError::MonitorOutsideDomain {
                        point: condition.point,
                    });
                }
            }
            StopCondition::FixedDuration { until } => {
                ensure_positive("run duration", *until)?;
            }
            StopCondition::StepLimit { .. } => {}
        }

        if let Some(time_limit) = self.time_limit {
            ensure_positive("time limit", time_limit)?;
        }

        for (index, step_function) in self.step_functions.iter().enumerate() {
            ensure_positive("step function interval", step_function.interval())?;
            if let Some(point) = step_function.location()
                && !self.domain.contains(&point)
            {
                return Err(ConfigError::ProbeOutsideDomain { index, point });
            }
        }

        Ok(())
    }

    pub fn run(self, backend: &B) -> Result<RunSummary, RunError<B::Error>> {
        self.validate()?;

        let Self {
            domain,
            stop_condition,
            time_limit,
            step_functions,
        } = self;

        let lattice_size = domain.lattice_size();
        let memory_required = backend
            .memory_required(&domain)
            .map_or_else(|| "unknown".to_owned(), |bytes| format_size(bytes).to_string());
        tracing::debug!(
            size = ?domain.size,
            ?lattice_size,
            %memory_required,
            "creating solver instance"
        );

        let instance = backend
            .create_instance(&domain)
            .map_err(RunError::Solver)?;
        let time_step = instance.time_step();

        let mut scheduled = Vec::with_capacity(step_functions.len());
        for step_function in step_functions {
            let interval = step_function.interval();
            let every = (interval / time_step).round() as usize;
            if every == 0 {
                return Err(ConfigError::IntervalBelowTimeStep {
                    interval,
                    time_step,
                }
                .into());
            }
            step_function.begin(every as f64 * time_step);
            scheduled.push(Scheduled {
                every,
                step_function,
            });
        }

        let mut decay_tracker = match &stop_condition {
            StopCondition::Decay(condition) => {
                // validated above
                let sources_end = domain.sources_end_time().unwrap_or_default();
                Some((
                    condition,
                    DecayTracker::new(condition, sources_end),
                ))
            }
            _ => None,
        };

        tracing::info!(?stop_condition, time_step, "starting run");

        let mut state = instance.create_state();
        let stop_reason = loop {
            let tick = state.tick();
            let time = state.time();

            {
                let view = FieldView::new(&instance, &state, &domain);
                for (index, scheduled) in scheduled.iter_mut().enumerate() {
                    if tick % scheduled.every == 0 {
                        scheduled
                            .step_function
                            .call(&view)
                            .map_err(|source| RunError::StepFunction { index, source })?;
                    }
                }
            }

            if let Some((condition, tracker)) = &mut decay_tracker {
                let value = instance
                    .field_at(&state, condition.component, &condition.point)
                    .unwrap_or_default();
                if tracker.observe(time, value) {
                    break StopReason::Decayed;
                }
            }

            match stop_condition {
                StopCondition::FixedDuration { until } if time + 0.5 * time_step >= until => {
                    break StopReason::DurationReached;
                }
                StopCondition::StepLimit { limit } if tick >= limit => {
                    break StopReason::StepLimitReached;
                }
                _ => {}
            }

            if time_limit.is_some_and(|limit| time + 0.5 * time_step >= limit) {
                tracing::warn!(time, "time limit reached before the stop condition held");
                break StopReason::TimeLimitReached;
            }

            instance.update(&mut state).map_err(RunError::Solver)?;
        };

        let summary = RunSummary {
            steps: state.tick(),
            time: state.time(),
            stop_reason,
        };
        tracing::info!(
            steps = summary.steps,
            time = summary.time,
            stop_reason = ?summary.stop_reason,
            "run finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use crate::solver::{
        FieldComponent,
        runner::{
            DecayCondition,
            DecayTracker,
        },
    };

    fn condition(window: f64, decay_by: f64) -> DecayCondition {
        DecayCondition {
            window,
            component: FieldComponent::Ez,
            point: Point3::origin(),
            decay_by,
        }
    }

    #[test]
    fn decay_is_only_checked_after_sources_end() {
        let mut tracker = DecayTracker::new(&condition(1.0, 1e-2), 10.0);
        // quiet field before the sources end never stops the run
        for step in 0..100 {
            assert!(!tracker.observe(step as f64 * 0.1, 0.0));
        }
    }

    #[test]
    fn decaying_field_stops_the_run() {
        let mut tracker = DecayTracker::new(&condition(1.0, 1e-4), 2.0);
        let mut stopped_at = None;
        for step in 0..1000 {
            let time = step as f64 * 0.1;
            let value = (-time).exp();
            if tracker.observe(time, value) {
                stopped_at = Some(time);
                break;
            }
        }
        // |f|² = exp(-2t) <= 1e-4 once t >= 4.6, checks happen at 3, 4, 5, ...
        // and look at the window before the check
        let stopped_at = stopped_at.unwrap();
        assert!((stopped_at - 6.0).abs() < 0.15, "stopped at {stopped_at}");
    }

    #[test]
    fn steady_field_never_decays() {
        let mut tracker = DecayTracker::new(&condition(1.0, 1e-3), 0.0);
        for step in 0..1000 {
            let time = step as f64 * 0.05;
            assert!(!tracker.observe(time, (time * 7.0).sin()));
        }
    }
}
