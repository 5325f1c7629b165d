//! Files written by a run.

pub mod gif;
pub mod snapshot;
pub mod spectrum;

use std::{
    fs::File,
    io::BufWriter,
    path::Path,
};

use color_eyre::eyre::{
    Context,
    Error,
};
use serde::Serialize;

pub fn write_json<T>(path: &Path, value: &T) -> Result<(), Error>
where
    T: Serialize,
{
    let file = File::create(path)
        .with_context(|| format!("Could not create file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    tracing::debug!(path = %path.display(), "wrote json");
    Ok(())
}
