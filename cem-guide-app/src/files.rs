use std::path::{
    Path,
    PathBuf,
};

use chrono::Local;
use color_eyre::eyre::{
    Context,
    Error,
    OptionExt,
};
use directories::ProjectDirs;
use serde::{
    Serialize,
    de::DeserializeOwned,
};

/// Platform directories of the app.
#[derive(Clone, Debug)]
pub struct AppFiles {
    project_dirs: ProjectDirs,
}

impl AppFiles {
    pub fn open() -> Result<Self, Error> {
        let project_dirs = ProjectDirs::from("", "", std::env!("CARGO_PKG_NAME"))
            .ok_or_eyre("Could not determine the home directory")?;
        std::fs::create_dir_all(project_dirs.config_local_dir())?;
        Ok(Self { project_dirs })
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.project_dirs.data_local_dir().join("runs")
    }

    /// Read config file, or create one if it doesn't exist yet.
    pub fn read_config_or_create<T>(&self) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let path = self.project_dirs.config_local_dir().join("config.toml");

        let config = if !path.exists() {
            tracing::info!(path = %path.display(), "Creating config file");
            let config = T::default();
            let toml = toml::to_string_pretty(&config)?;
            std::fs::write(&path, &toml)
                .with_context(|| format!("Could not write config file: {}", path.display()))?;
            config
        }
        else {
            tracing::info!(path = %path.display(), "Reading config file");
            let toml = std::fs::read(&path)
                .with_context(|| format!("Could not read config file: {}", path.display()))?;

            toml::from_slice(&toml)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        };

        Ok(config)
    }
}

/// Creates `<parent>/<name>_<timestamp>`.
pub fn create_run_dir(parent: &Path, name: &str) -> Result<PathBuf, Error> {
    let path = parent.join(format!(
        "{name}_{}",
        Local::now().format("%Y-%m-%d_%H:%M:%S")
    ));
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Could not create output directory: {}", path.display()))?;
    Ok(path)
}
