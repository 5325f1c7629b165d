//! Conversion between physical units and the solver's native units.
//!
//! The solvers work in length-normalized units where the speed of light is 1.
//! A frequency in native units is therefore an inverse length (`1 / λ`), and
//! a native time is a length (the distance light travels in that time). To
//! cross that boundary we only need to know how many native length units
//! light travels per second.

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitSystem {
    /// Wave speed in native length units per second.
    pub speed: f64,
}

impl UnitSystem {
    /// Native length unit is 1 m.
    pub const METER: Self = Self { speed: 3e8 };

    /// Native length unit is 1 cm. Used for the microwave scenarios.
    pub const CENTIMETER: Self = Self { speed: 3e10 };

    /// Native length unit is 1 µm. Used for the photonic scenarios.
    pub const MICROMETER: Self = Self { speed: 3e14 };

    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    /// Hz → native (1/length)
    pub fn to_native_frequency(&self, frequency_hz: f64) -> f64 {
        frequency_hz / self.speed
    }

    /// native (1/length) → Hz
    pub fn to_hz(&self, native_frequency: f64) -> f64 {
        native_frequency * self.speed
    }

    /// native time → seconds
    pub fn to_seconds(&self, native_time: f64) -> f64 {
        native_time / self.speed
    }

    pub fn wavelength_to_native_frequency(wavelength: f64) -> f64 {
        1.0 / wavelength
    }
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self::MICROMETER
    }
}

#[cfg(test)]
mod tests {
    use crate::units::UnitSystem;

    #[test]
    fn hz_round_trips_through_native_units() {
        for units in [
            UnitSystem::METER,
            UnitSystem::CENTIMETER,
            UnitSystem::MICROMETER,
        ] {
            for frequency in [1.0, 2.45e9, 193.4e12, 7.3e3] {
                let native = units.to_native_frequency(frequency);
                let back = units.to_hz(native);
                assert!(
                    ((back - frequency) / frequency).abs() < 1e-12,
                    "{frequency} -> {native} -> {back}"
                );
            }
        }
    }

    #[test]
    fn microwave_oven_frequency_in_centimeters() {
        let native = UnitSystem::CENTIMETER.to_native_frequency(2.45e9);
        assert!((native - 0.081_666_666_666).abs() < 1e-9);
    }
}
