use std::path::Path;

use cem_guide::domain::SimulationDomain;
use colorgrad::Gradient;
use image::{
    Rgba,
    RgbaImage,
    imageops::FilterType,
};

const CONDUCTOR: Rgba<u8> = Rgba([64, 64, 64, 255]);
const ABSORBER_TINT: f32 = 0.6;

/// Renders the media of the domain's `z = 0` plane, one pixel per lattice
/// cell, scaled up to `width` pixels.
///
/// Conductors are dark grey; dielectrics are shaded by refractive index.
/// Absorbing layers are dimmed.
pub fn render_geometry(domain: &SimulationDomain, width: u32) -> RgbaImage {
    let grid = domain.rasterize();
    let gradient = colorgrad::preset::blues();

    let (min_index, max_index) = grid
        .iter()
        .filter(|(_, _, medium)| !medium.material.is_lossy())
        .map(|(_, _, medium)| medium.refractive_index())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), index| {
            (min.min(index), max.max(index))
        });
    let span = if max_index > min_index {
        max_index - min_index
    }
    else {
        1.0
    };

    let origin = domain.origin();
    let height = grid.size.y as u32;
    let mut image = RgbaImage::new(grid.size.x as u32, height);
    for (x, y, medium) in grid.iter() {
        let mut color = if medium.material.is_lossy() {
            CONDUCTOR
        }
        else {
            let t = 0.15 + 0.85 * (medium.refractive_index() - min_index) / span;
            Rgba(gradient.at(t as f32).to_rgba8())
        };

        let center = domain.cell_center(x, y);
        let depth = domain.boundary.depth_at(&center, &origin, &domain.size);
        if depth.max() > 0.0 {
            for channel in &mut color.0[..3] {
                *channel = (f32::from(*channel) * ABSORBER_TINT) as u8;
            }
        }

        // row 0 of the image is the top of the domain
        image.put_pixel(x as u32, height - 1 - y as u32, color);
    }

    let width = width.max(1);
    let scaled_height = ((f64::from(width) * domain.size.y / domain.size.x).round() as u32).max(1);
    image::imageops::resize(&image, width, scaled_height, FilterType::Nearest)
}

pub fn write_geometry(domain: &SimulationDomain, width: u32, path: &Path) -> Result<(), image::ImageError> {
    render_geometry(domain, width).save(path)?;
    tracing::debug!(path = %path.display(), "wrote geometry snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use cem_guide::{
        boundary::AbsorbingBoundary,
        domain::SimulationDomain,
        geometry::builder::{
            GeometryBuilder,
            WaveguideBend,
        },
        material::MaterialCatalog,
    };
    use nalgebra::Vector2;

    use crate::output::snapshot::{
        CONDUCTOR,
        render_geometry,
    };

    #[test]
    fn metallic_bend_snapshot() {
        let catalog = MaterialCatalog::with_presets();
        let metal = catalog.get("metal").unwrap();
        let bend = WaveguideBend {
            width: 8.0,
            radius: 12.0,
            height: f64::INFINITY,
            guide: catalog.get("air").unwrap(),
            surround: metal.clone(),
            domain: Vector2::new(40.0, 40.0),
        };
        let domain = SimulationDomain::new(bend.extent(), 1.0, metal)
            .with_geometry(bend.build().unwrap())
            .with_boundary(AbsorbingBoundary::surrounding(2.0));

        let image = render_geometry(&domain, 40);
        assert_eq!(image.dimensions(), (40, 40));
        // lower left quadrant is solid metal, the input arm is open
        assert_eq!(*image.get_pixel(9, 30), CONDUCTOR);
        assert_ne!(*image.get_pixel(28, 35), CONDUCTOR);
    }
}
