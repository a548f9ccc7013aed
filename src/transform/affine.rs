//! Placing a source array onto a target canvas with pivot, position, rotation and scale.

use crate::{
    data::samples::Samples,
    foundation::{
        core::{Affine, Point, Region, Res, XY},
        error::{ImagecatError, ImagecatResult},
    },
    transform::resample::{EdgeMode, Interpolation, warp},
    units::Length,
};

/// Where and how a source lands on a target.
///
/// `pivot` is measured against the source and `position` against the target; both have their
/// Y axis pointing up from the bottom edge. `orientation` is in degrees, counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub pivot: XY<Length>,
    pub position: XY<Length>,
    pub orientation: f64,
    pub scale: XY<f64>,
}

impl Default for Placement {
    fn default() -> Self {
        let center = XY::new(Length::width(0.5), Length::height(0.5));
        Self {
            pivot: center,
            position: center,
            orientation: 0.0,
            scale: XY::new(1.0, 1.0),
        }
    }
}

impl Placement {
    /// Matrix taking source array coordinates (x = column, y = row) to target array
    /// coordinates. `source` and `target` are `(width, height)`.
    pub fn matrix(&self, source: Res, target: Res) -> Affine {
        let pivot = (
            self.pivot.x.resolve(source),
            self.pivot.y.resolve(source),
        );
        let position = (
            self.position.x.resolve(target),
            self.position.y.resolve(target),
        );

        let mut m = Affine::IDENTITY;
        m = Affine::translate((0.0, -(source.1 as f64))) * m;
        m = Affine::translate((-pivot.0, pivot.1)) * m;
        m = Affine::scale_non_uniform(self.scale.x, self.scale.y) * m;
        m = Affine::rotate(-self.orientation.to_radians()) * m;
        m = Affine::translate((0.0, target.1 as f64)) * m;
        m = Affine::translate((position.0, -position.1)) * m;
        m
    }
}

/// Smallest target rectangle covering the mapped corners of a `(width, height)` source,
/// clamped to the target.
pub fn covered_region(matrix: Affine, source: Res, target: Res) -> Region {
    let (w, h) = (source.0 as f64, source.1 as f64);
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(0.0, h),
        Point::new(w, h),
    ]
    .map(|p| matrix * p);

    if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Region::default();
    }

    let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
    let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in corners {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }

    let clamp = |v: f64, limit: usize| v.clamp(0.0, limit as f64) as usize;
    Region {
        row_start: clamp(y0.floor(), target.1),
        row_end: clamp(y1.ceil(), target.1),
        col_start: clamp(x0.floor(), target.0),
        col_end: clamp(x1.ceil(), target.0),
    }
}

/// A resampled source together with the target rectangle it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct Transformed {
    pub region: Region,
    pub data: Samples,
}

/// Resample `source` as it appears on a `target`-sized canvas under `placement`, restricted to
/// the minimal rectangle it touches. Samples outside the source read as zero.
#[tracing::instrument(skip(source, placement), fields(source = ?source.shape()))]
pub fn transform(
    source: &Samples,
    target: Res,
    placement: &Placement,
    interpolation: Interpolation,
) -> ImagecatResult<Transformed> {
    if !placement.orientation.is_finite()
        || !placement.scale.x.is_finite()
        || !placement.scale.y.is_finite()
    {
        return Err(ImagecatError::validation(format!(
            "placement must be finite, received orientation {} and scale {:?}",
            placement.orientation, placement.scale
        )));
    }

    let source_res = (source.cols(), source.rows());
    let matrix = placement.matrix(source_res, target);
    let region = covered_region(matrix, source_res, target);
    let matrix =
        Affine::translate((-(region.col_start as f64), -(region.row_start as f64))) * matrix;
    let data = warp(
        source,
        matrix,
        region.rows(),
        region.cols(),
        interpolation,
        EdgeMode::Zero,
    )?;
    tracing::debug!(?region, "transformed");
    Ok(Transformed { region, data })
}
