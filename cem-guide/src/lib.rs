#![warn(clippy::todo)]

//! Configuration, run control and post-processing for guided-wave and cavity
//! field simulations.
//!
//! A [`SimulationDomain`][domain::SimulationDomain] is assembled from media in
//! a [`MaterialCatalog`][material::MaterialCatalog], shapes from the
//! [geometry builders][geometry::builder], sources and an absorbing boundary.
//! A [`RunController`][solver::runner::RunController] drives any
//! [`SolverBackend`][solver::SolverBackend] until the fields decayed or a
//! fixed time passed, feeding [probes][probe::Probe] and frame recorders on
//! the way. The recorded time series are turned into spectra by
//! [`analysis`], and guided modes are found through a
//! [`ModeSolver`][mode::ModeSolver].

pub mod analysis;
pub mod boundary;
pub mod domain;
pub mod excitation;
pub mod fdtd;
pub mod geometry;
pub mod material;
pub mod mode;
pub mod probe;
pub mod solver;
pub mod units;
pub mod util;

use crate::{
    analysis::{
        AnalysisError,
        modes::ModeError,
    },
    domain::DomainError,
    excitation::ExcitationError,
    fdtd::FdtdError,
    geometry::builder::GeometryError,
    material::CatalogError,
    mode::slab::SlabError,
    solver::runner::{
        ConfigError,
        RunError,
    },
};

/// Any error of this crate, with the reference backends plugged in.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Excitation(#[from] ExcitationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Fdtd(#[from] FdtdError),

    #[error(transparent)]
    Run(#[from] RunError<FdtdError>),

    #[error(transparent)]
    Modes(#[from] ModeError<SlabError>),
}
