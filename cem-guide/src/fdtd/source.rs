//! Mapping sources onto lattice cells.

use std::f64::consts::PI;

use nalgebra::{
    Point2,
    Vector2,
};

use crate::{
    boundary::Axis,
    domain::SimulationDomain,
    excitation::{
        ExcitationMode,
        Source,
    },
    fdtd::{
        FdtdError,
        strider::Strider,
    },
    solver::FieldComponent,
    util::nearest_cell,
};

/// Field a source drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceTarget {
    Ez,
    Hx,
    Hy,
}

#[derive(Clone, Debug)]
pub struct PlacedSource {
    pub source: Source,
    pub target: SourceTarget,
    /// Cell index and weight.
    pub cells: Vec<(usize, f64)>,
}

/// Lattice indices along one axis covered by `[center - extent/2, center +
/// extent/2]`. Falls back to the nearest cell for zero extent.
fn covered(center: f64, extent: f64, origin: f64, cell_size: f64, cells: usize) -> Vec<usize> {
    let half = 0.5 * extent + 1e-9 * cell_size;
    let covered = (0..cells)
        .filter(|i| {
            let position = origin + (*i as f64 + 0.5) * cell_size;
            (position - center).abs() <= half
        })
        .collect::<Vec<_>>();
    if covered.is_empty() {
        vec![nearest_cell(center, origin, cell_size, cells)]
    }
    else {
        covered
    }
}

pub fn place(
    index: usize,
    source: &Source,
    domain: &SimulationDomain,
    strider: &Strider,
    cell_size: &Vector2<f64>,
) -> Result<PlacedSource, FdtdError> {
    let origin = domain.origin();
    let size = strider.size();

    let xs = covered(source.center.x, source.size.x, origin.x, cell_size.x, size.x);
    let ys = covered(source.center.y, source.size.y, origin.y, cell_size.y, size.y);
    let points = ys
        .iter()
        .flat_map(|y| xs.iter().map(move |x| Point2::new(*x, *y)))
        .filter(|point| !strider.is_edge(point));

    let (target, cells) = match source.mode {
        ExcitationMode::Component(component) => {
            let target = match component {
                FieldComponent::Ez => SourceTarget::Ez,
                FieldComponent::Hx => SourceTarget::Hx,
                FieldComponent::Hy => SourceTarget::Hy,
                _ => return Err(FdtdError::UnsupportedComponent { component }),
            };
            let cells = points
                .map(|point| (strider.index_unchecked(&point), 1.0))
                .collect::<Vec<_>>();
            (target, cells)
        }
        ExcitationMode::GuidedMode { band, direction } => {
            let transverse = match direction {
                Axis::X => 1,
                Axis::Y => 0,
                Axis::Z => return Err(FdtdError::UnsupportedDirection { direction }),
            };

            // restrict the source line to the highest index medium it crosses,
            // which is the guide core
            let indexed = points
                .map(|point| {
                    let center = domain.cell_center(point.x, point.y);
                    (point, domain.medium_at(&center).refractive_index())
                })
                .collect::<Vec<_>>();
            let core_index = indexed
                .iter()
                .map(|(_, n)| *n)
                .fold(f64::NEG_INFINITY, f64::max);
            let core = indexed
                .into_iter()
                .filter(|(_, n)| *n >= core_index - 1e-9)
                .map(|(point, _)| point)
                .collect::<Vec<_>>();

            let mut positions = core
                .iter()
                .map(|point| point[transverse])
                .collect::<Vec<_>>();
            positions.sort_unstable();
            positions.dedup();
            let n = positions.len() as f64;

            let cells = core
                .iter()
                .filter_map(|point| {
                    let k = positions.binary_search(&point[transverse]).ok()? as f64;
                    let weight = (band as f64 * PI * (k + 0.5) / n).sin();
                    Some((strider.index_unchecked(point), weight))
                })
                .collect::<Vec<_>>();
            (SourceTarget::Ez, cells)
        }
    };

    if cells.is_empty() {
        return Err(FdtdError::EmptySource { index });
    }

    tracing::trace!(index, ?target, cells = cells.len(), "placed source");

    Ok(PlacedSource {
        source: source.clone(),
        target,
        cells,
    })
}
