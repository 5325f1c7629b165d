//! Runs scenarios and writes their results into output directories.

use std::{
    fs::File,
    io::BufWriter,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use cem_guide::{
    analysis::spectrum::SpectralPeak,
    domain::SimulationDomain,
    fdtd::{
        FdtdBackend,
        FdtdConfig,
    },
    material::MaterialCatalog,
    probe::Probe,
    solver::{
        FieldComponent,
        observer::RecordFrames,
        runner::{
            RunController,
            RunSummary,
            StopCondition,
        },
    },
};
use color_eyre::eyre::{
    Context,
    Error,
};
use nalgebra::{
    Point3,
    Vector2,
};
use serde::Serialize;

use crate::{
    args::{
        CommonArgs,
        RunArgs,
        SweepArgs,
    },
    config::AppConfig,
    files::{
        AppFiles,
        create_run_dir,
    },
    output::{
        gif::GifOutput,
        snapshot,
        spectrum,
        write_json,
    },
    scenario::{
        AnimationSpec,
        ModesScenario,
        Scenario,
        ScenarioKind,
        TimeDomainScenario,
        set_parameter,
    },
};

/// Result of one scenario, as written to `summary.json` and `sweep.json`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    TimeDomain {
        summary: RunSummary,
        /// Simulated time in seconds.
        time_s: f64,
        probes: Vec<ProbeReport>,
    },
    Modes {
        effective_indices: Vec<f64>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct ProbeReport {
    pub component: FieldComponent,
    pub point: Point3<f64>,
    pub samples: usize,
    pub peak: Option<SpectralPeak>,
    pub peak_frequency_hz: Option<f64>,
}

fn load_config(common: &CommonArgs) -> Result<(AppConfig, PathBuf), Error> {
    let files = AppFiles::open()?;
    let config: AppConfig = if common.ignore_config {
        AppConfig::default()
    }
    else {
        files.read_config_or_create()?
    };
    let parent = common
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| files.runs_dir());
    Ok((config, parent))
}

pub fn run(args: RunArgs) -> Result<(), Error> {
    let (config, parent) = load_config(&args.common)?;
    let scenario = Scenario::from_path(&args.scenario)?;

    let output = create_run_dir(&parent, &scenario.name)?;
    tracing::info!(scenario = %scenario.name, output = %output.display(), "running scenario");
    std::fs::copy(&args.scenario, output.join("scenario.toml"))
        .with_context(|| format!("Could not copy scenario: {}", args.scenario.display()))?;

    let outcome = execute(&scenario, &config, &output, args.common.no_animation)?;
    write_json(&output.join("summary.json"), &outcome)?;

    println!("{}", output.display());
    Ok(())
}

pub fn execute(
    scenario: &Scenario,
    config: &AppConfig,
    output: &Path,
    no_animation: bool,
) -> Result<Outcome, Error> {
    let catalog = scenario.catalog();
    match &scenario.kind {
        ScenarioKind::TimeDomain(time_domain) => {
            run_time_domain(time_domain, &catalog, config, output, no_animation)
        }
        ScenarioKind::Modes(modes) => run_modes(modes, &catalog, output),
    }
}

/// Size of animation frames with `width` pixels and the domain's aspect
/// ratio.
fn frame_size(domain: &SimulationDomain, width: u32) -> Vector2<u32> {
    let width = width.max(1);
    let height = (f64::from(width) * domain.size.y / domain.size.x).round() as u32;
    Vector2::new(width, height.max(1))
}

/// Frame interval, stretched so a run of known length stays below
/// `max_frames`.
fn frame_interval(
    animation: &AnimationSpec,
    scenario: &TimeDomainScenario,
    max_frames: usize,
) -> f64 {
    let duration = match scenario.stop {
        StopCondition::FixedDuration { until } => Some(until),
        _ => scenario.time_limit,
    };
    if let Some(duration) = duration
        && max_frames > 0
        && duration / animation.interval > max_frames as f64
    {
        let interval = duration / max_frames as f64;
        tracing::debug!(requested = animation.interval, interval, "stretching frame interval");
        interval
    }
    else {
        animation.interval
    }
}

fn run_time_domain(
    scenario: &TimeDomainScenario,
    catalog: &MaterialCatalog,
    config: &AppConfig,
    output: &Path,
    no_animation: bool,
) -> Result<Outcome, Error> {
    let units = scenario.units.system();
    let domain = scenario.build(catalog)?;
    domain.validate()?;

    snapshot::write_geometry(
        &domain,
        config.animation.frame_width,
        &output.join("geometry.png"),
    )?;

    let mut probes = scenario
        .probes
        .iter()
        .map(|probe| Probe::new(probe.component, probe.point, probe.interval))
        .collect::<Vec<_>>();

    let mut animation = match &scenario.animation {
        Some(animation) if !no_animation => {
            let path = output.join("animation.gif");
            let file = File::create(&path)
                .with_context(|| format!("Could not create file: {}", path.display()))?;
            let gif = GifOutput::new(
                BufWriter::new(file),
                Duration::from_millis(config.animation.frame_delay_ms),
                config.animation.colormap.gradient(),
                config.animation.max_frames,
            )?;
            Some(RecordFrames::new(
                gif,
                animation.component,
                frame_interval(animation, scenario, config.animation.max_frames),
                frame_size(&domain, config.animation.frame_width),
            ))
        }
        _ => None,
    };

    let backend = FdtdBackend::new(FdtdConfig {
        courant: config.solver.courant,
        absorber: config.solver.absorber,
        memory_limit: config.solver.memory_limit,
        ..Default::default()
    });

    let mut controller = RunController::<FdtdBackend>::new(domain, scenario.stop);
    if let Some(time_limit) = scenario.time_limit {
        controller = controller.with_time_limit(time_limit);
    }
    for probe in &mut probes {
        controller.add_step_function(probe);
    }
    if let Some(animation) = &mut animation {
        controller.add_step_function(animation);
    }

    let summary = controller.run(&backend)?;
    let time_s = units.to_seconds(summary.time);
    tracing::info!(
        steps = summary.steps,
        time = summary.time,
        time_s,
        stop_reason = ?summary.stop_reason,
        "run finished"
    );

    if let Some(animation) = animation {
        let gif = animation.into_inner();
        tracing::info!(
            frames = gif.frames_written(),
            dropped = gif.frames_dropped(),
            "wrote animation"
        );
    }

    let mut reports = Vec::with_capacity(probes.len());
    for (index, probe) in probes.into_iter().enumerate() {
        let series = probe.finish();
        write_json(&output.join(format!("probe_{index}_series.json")), &series)?;
        spectrum::save_time_series(
            &output.join(format!("probe_{index}_series.csv")),
            &series,
            &units,
        )?;

        let peak = match series.spectrum() {
            Ok(spectrum) => {
                write_json(&output.join(format!("probe_{index}_spectrum.json")), &spectrum)?;
                spectrum::save_spectrum(
                    &output.join(format!("probe_{index}_spectrum.csv")),
                    &spectrum,
                    &units,
                )?;
                spectrum.peak()
            }
            Err(error) => {
                tracing::warn!(index, %error, "no spectrum for probe");
                None
            }
        };

        let peak_frequency_hz = peak.map(|peak| units.to_hz(peak.frequency));
        if let Some(frequency_hz) = peak_frequency_hz {
            tracing::info!(index, frequency_hz, "spectral peak");
        }

        reports.push(ProbeReport {
            component: series.component,
            point: series.point,
            samples: series.len(),
            peak,
            peak_frequency_hz,
        });
    }

    Ok(Outcome::TimeDomain {
        summary,
        time_s,
        probes: reports,
    })
}

fn run_modes(
    scenario: &ModesScenario,
    catalog: &MaterialCatalog,
    output: &Path,
) -> Result<Outcome, Error> {
    let (analysis, solver) = scenario.build(catalog)?;
    let results = analysis.run(&solver)?;
    write_json(&output.join("modes.json"), &results)?;

    for result in &results {
        tracing::info!(
            band = result.band,
            k = result.k,
            effective_index = result.effective_index,
            "guided mode"
        );
        if let Some(profile) = &result.field_samples {
            spectrum::save_profile(
                &output.join(format!("mode_{}_profile.csv", result.band)),
                profile,
            )?;
        }
    }

    Ok(Outcome::Modes {
        effective_indices: results.iter().map(|result| result.effective_index).collect(),
    })
}

#[derive(Clone, Debug, Serialize)]
struct SweepEntry {
    value: f64,
    directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct SweepReport {
    scenario: String,
    parameter: String,
    entries: Vec<SweepEntry>,
}

fn run_variant(
    table: &toml::Table,
    parameter: &str,
    value: f64,
    config: &AppConfig,
    output: &Path,
    no_animation: bool,
) -> Result<Outcome, Error> {
    let mut table = table.clone();
    set_parameter(&mut table, parameter, value)?;
    let scenario: Scenario = toml::Value::Table(table.clone()).try_into()?;

    std::fs::create_dir_all(output)
        .with_context(|| format!("Could not create output directory: {}", output.display()))?;
    std::fs::write(output.join("scenario.toml"), toml::to_string_pretty(&table)?)?;

    let outcome = execute(&scenario, config, output, no_animation)?;
    write_json(&output.join("summary.json"), &outcome)?;
    Ok(outcome)
}

pub fn sweep(args: SweepArgs) -> Result<(), Error> {
    let (config, parent) = load_config(&args.common)?;

    let toml = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("Could not read scenario: {}", args.scenario.display()))?;
    let table: toml::Table = toml::from_str(&toml)
        .with_context(|| format!("Invalid scenario: {}", args.scenario.display()))?;
    let name = Scenario::from_toml(&toml)
        .with_context(|| format!("Invalid scenario: {}", args.scenario.display()))?
        .name;

    let output = create_run_dir(&parent, &format!("{name}_sweep"))?;
    tracing::info!(
        scenario = %name,
        parameter = %args.parameter,
        values = args.values.len(),
        output = %output.display(),
        "running sweep"
    );

    let variant = |value: f64| {
        let directory = output.join(format!("{}_{value}", args.parameter));
        let _span = tracing::info_span!("variant", value).entered();
        match run_variant(
            &table,
            &args.parameter,
            value,
            &config,
            &directory,
            args.common.no_animation,
        ) {
            Ok(outcome) => {
                SweepEntry {
                    value,
                    directory,
                    outcome: Some(outcome),
                    error: None,
                }
            }
            Err(error) => {
                tracing::error!(value, "variant failed: {error:#}");
                SweepEntry {
                    value,
                    directory,
                    outcome: None,
                    error: Some(format!("{error:#}")),
                }
            }
        }
    };

    #[cfg(feature = "multi-threading")]
    let entries = {
        use rayon::iter::{
            IntoParallelRefIterator,
            ParallelIterator,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads.unwrap_or_default())
            .build()?;
        pool.install(|| {
            args.values
                .par_iter()
                .map(|value| variant(*value))
                .collect::<Vec<_>>()
        })
    };

    #[cfg(not(feature = "multi-threading"))]
    let entries = {
        if args.threads.is_some_and(|threads| threads > 1) {
            tracing::warn!("built without multi-threading, running variants sequentially");
        }
        args.values
            .iter()
            .map(|value| variant(*value))
            .collect::<Vec<_>>()
    };

    let failed = entries.iter().filter(|entry| entry.error.is_some()).count();
    write_json(
        &output.join("sweep.json"),
        &SweepReport {
            scenario: name,
            parameter: args.parameter.clone(),
            entries,
        },
    )?;
    if failed > 0 {
        tracing::warn!(failed, "some variants failed");
    }

    println!("{}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use cem_guide::solver::runner::StopCondition;

    use crate::{
        run::frame_interval,
        scenario::{
            Scenario,
            ScenarioKind,
        },
    };

    fn time_domain(stop: &str) -> Scenario {
        Scenario::from_toml(&format!(
            r#"
            name = "frames"
            kind = "time_domain"
            resolution = 5.0
            background = "air"
            geometry = {{ kind = "empty", domain = [10.0, 10.0] }}
            sources = []
            stop = {stop}

            [animation]
            interval = 1.0
            "#
        ))
        .unwrap()
    }

    #[test]
    fn frame_interval_is_stretched_for_long_runs() {
        let scenario = time_domain(r#"{ kind = "fixed_duration", until = 1000.0 }"#);
        let ScenarioKind::TimeDomain(time_domain) = &scenario.kind
        else {
            panic!("not a time domain scenario");
        };
        assert!(matches!(time_domain.stop, StopCondition::FixedDuration { .. }));
        let animation = time_domain.animation.as_ref().unwrap();
        assert_eq!(frame_interval(animation, time_domain, 2000), 1.0);
        assert_eq!(frame_interval(animation, time_domain, 100), 10.0);
    }

    #[test]
    fn frame_interval_without_known_duration_is_kept() {
        let scenario = time_domain(r#"{ kind = "step_limit", limit = 100000 }"#);
        let ScenarioKind::TimeDomain(time_domain) = &scenario.kind
        else {
            panic!("not a time domain scenario");
        };
        let animation = time_domain.animation.as_ref().unwrap();
        assert_eq!(frame_interval(animation, time_domain, 10), 1.0);
    }
}
