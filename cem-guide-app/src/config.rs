use std::path::PathBuf;

use cem_guide::fdtd::AbsorberGrading;
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where run directories are created. Defaults to the platform's data
    /// directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub animation: AnimationConfig,

    #[serde(default)]
    pub solver: SolverConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            animation: Default::default(),
            solver: Default::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Width of the animation in pixels. The height follows from the domain's
    /// aspect ratio.
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    #[serde(default = "default_frame_delay")]
    pub frame_delay_ms: u64,

    #[serde(default)]
    pub colormap: Colormap,

    /// Upper bound on the number of frames per animation. The frame interval
    /// of long runs is stretched to stay below it.
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_width: default_frame_width(),
            frame_delay_ms: default_frame_delay(),
            colormap: Colormap::default(),
            max_frames: default_max_frames(),
        }
    }
}

fn default_frame_width() -> u32 {
    256
}

fn default_frame_delay() -> u64 {
    50
}

fn default_max_frames() -> usize {
    400
}

/// Diverging colormaps for signed field values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    #[default]
    RdBu,
    Spectral,
    PuOr,
}

impl Colormap {
    pub fn gradient(&self) -> colorgrad::BasisGradient {
        match self {
            Self::RdBu => colorgrad::preset::rd_bu(),
            Self::Spectral => colorgrad::preset::spectral(),
            Self::PuOr => colorgrad::preset::pu_or(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_courant")]
    pub courant: f64,

    #[serde(default)]
    pub absorber: AbsorberGrading,

    /// Refuse runs that need more memory than this many bytes.
    #[serde(default = "default_memory_limit")]
    pub memory_limit: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            courant: default_courant(),
            absorber: AbsorberGrading::default(),
            memory_limit: default_memory_limit(),
        }
    }
}

fn default_courant() -> f64 {
    0.5
}

fn default_memory_limit() -> Option<usize> {
    Some(1 << 30)
}
