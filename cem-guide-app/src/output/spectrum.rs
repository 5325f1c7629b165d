//! Probe time series, spectra and mode profiles as CSV.

use std::{
    fs::File,
    io::{
        BufWriter,
        Write,
    },
    path::Path,
};

use cem_guide::{
    analysis::spectrum::Spectrum,
    mode::ModeProfile,
    probe::TimeSeries,
    units::UnitSystem,
};
use color_eyre::eyre::{
    Context,
    Error,
};

fn create(path: &Path) -> Result<BufWriter<File>, Error> {
    let file = File::create(path)
        .with_context(|| format!("Could not create file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn write_time_series<W>(mut writer: W, series: &TimeSeries, units: &UnitSystem) -> Result<(), std::io::Error>
where
    W: Write,
{
    writeln!(writer, "time,time_s,value")?;
    for (i, value) in series.samples.iter().enumerate() {
        let time = i as f64 * series.interval;
        writeln!(writer, "{time},{},{value}", units.to_seconds(time))?;
    }
    writer.flush()
}

/// `spectrum` has native frequencies.
pub fn write_spectrum<W>(mut writer: W, spectrum: &Spectrum, units: &UnitSystem) -> Result<(), std::io::Error>
where
    W: Write,
{
    writeln!(writer, "frequency,frequency_hz,amplitude")?;
    for (frequency, amplitude) in spectrum.frequencies.iter().zip(&spectrum.amplitudes) {
        writeln!(writer, "{frequency},{},{amplitude}", units.to_hz(*frequency))?;
    }
    writer.flush()
}

pub fn write_profile<W>(mut writer: W, profile: &ModeProfile) -> Result<(), std::io::Error>
where
    W: Write,
{
    writeln!(writer, "position,value")?;
    for (position, value) in profile.positions.iter().zip(&profile.values) {
        writeln!(writer, "{position},{value}")?;
    }
    writer.flush()
}

pub fn save_time_series(path: &Path, series: &TimeSeries, units: &UnitSystem) -> Result<(), Error> {
    write_time_series(create(path)?, series, units)
        .with_context(|| format!("Could not write time series: {}", path.display()))
}

pub fn save_spectrum(path: &Path, spectrum: &Spectrum, units: &UnitSystem) -> Result<(), Error> {
    write_spectrum(create(path)?, spectrum, units)
        .with_context(|| format!("Could not write spectrum: {}", path.display()))
}

pub fn save_profile(path: &Path, profile: &ModeProfile) -> Result<(), Error> {
    write_profile(create(path)?, profile)
        .with_context(|| format!("Could not write mode profile: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use cem_guide::{
        analysis::spectrum::Spectrum,
        probe::TimeSeries,
        solver::FieldComponent,
        units::UnitSystem,
    };
    use nalgebra::Point3;

    use crate::output::spectrum::{
        write_spectrum,
        write_time_series,
    };

    #[test]
    fn spectrum_lists_native_and_hz_frequencies() {
        let spectrum = Spectrum {
            frequencies: vec![0.0, 0.5],
            amplitudes: vec![1.0, 2.0],
        };
        let mut csv = vec![];
        write_spectrum(&mut csv, &spectrum, &UnitSystem::new(10.0)).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "frequency,frequency_hz,amplitude\n0,0,1\n0.5,5,2\n"
        );
    }

    #[test]
    fn time_series_has_one_row_per_sample() {
        let series = TimeSeries {
            component: FieldComponent::Ez,
            point: Point3::origin(),
            interval: 0.5,
            samples: vec![1.0, -1.0, 0.25],
        };
        let mut csv = vec![];
        write_time_series(&mut csv, &series, &UnitSystem::new(2.0)).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "0.5,0.25,-1");
    }
}
