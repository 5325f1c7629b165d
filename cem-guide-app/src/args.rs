use std::path::PathBuf;

#[derive(Clone, Debug, clap::Args)]
pub struct CommonArgs {
    /// Directory the output directories are created in. Overrides the config
    /// file.
    #[clap(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Don't read the config file, use the defaults.
    #[clap(long)]
    pub ignore_config: bool,

    /// Skip the field animation.
    #[clap(long)]
    pub no_animation: bool,
}

#[derive(Clone, Debug, clap::Args)]
pub struct RunArgs {
    pub scenario: PathBuf,

    #[clap(flatten)]
    pub common: CommonArgs,
}

#[derive(Clone, Debug, clap::Args)]
pub struct SweepArgs {
    pub scenario: PathBuf,

    /// Dotted path of the swept parameter, e.g. `geometry.radius`.
    #[clap(short, long)]
    pub parameter: String,

    #[clap(short, long, value_delimiter = ',', required = true)]
    pub values: Vec<f64>,

    /// Number of worker threads. Defaults to the number of cores.
    #[clap(short = 'j', long)]
    pub threads: Option<usize>,

    #[clap(flatten)]
    pub common: CommonArgs,
}
