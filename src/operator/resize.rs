use std::collections::BTreeMap;

use crate::{
    data::{image::Image, samples::Samples},
    foundation::{
        core::{Affine, XY},
        error::{ImagecatError, ImagecatResult},
    },
    operator::{blur::blur, inputs::NamedInputs},
    transform::resample::{EdgeMode, Interpolation, warp},
    units::Length,
};

/// Parameters for [`resize`].
#[derive(Clone, Debug, PartialEq)]
pub struct ResizeParams {
    /// New `[width, height]`, resolved against each layer.
    pub res: XY<Length>,
    pub order: Interpolation,
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            res: XY::new(Length::width(1.0), Length::height(1.0)),
            order: Interpolation::Cubic,
        }
    }
}

impl ResizeParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            res: inputs.optional("res", d.res)?,
            order: inputs.optional("order", d.order)?,
        })
    }
}

/// Resample every layer of `image` to a new resolution.
#[tracing::instrument(skip(image))]
pub fn resize(image: &Image, params: &ResizeParams) -> ImagecatResult<Image> {
    let mut layers = BTreeMap::new();
    for (name, layer) in image.layers() {
        let width = params.res.x.resolve(layer.res());
        let height = params.res.y.resolve(layer.res());
        if width.is_nan() || height.is_nan() || width < 1.0 || height < 1.0 {
            return Err(ImagecatError::validation(format!(
                "resize of layer '{name}' to {width}x{height} needs a positive resolution"
            )));
        }
        let data = resample(layer.data(), width as usize, height as usize, params.order)?;
        layers.insert(name.clone(), layer.with_data(data)?);
    }
    Image::with_metadata(layers, image.metadata().clone())
}

/// Resize `src` to `width x height`, low-pass filtering first along any axis that shrinks.
pub fn resample(
    src: &Samples,
    width: usize,
    height: usize,
    order: Interpolation,
) -> ImagecatResult<Samples> {
    if src.cols() == width && src.rows() == height {
        return Ok(src.clone());
    }
    let sx = width as f64 / src.cols() as f64;
    let sy = height as f64 / src.rows() as f64;

    let sigma = |scale: f64| ((1.0 / scale - 1.0) / 2.0).max(0.0);
    let filtered = blur(src, sigma(sx), sigma(sy))?;

    let matrix = Affine::translate((-0.5, -0.5))
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate((0.5, 0.5));
    warp(&filtered, matrix, height, width, order, EdgeMode::Clamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Layer, Role};

    #[test]
    fn constant_layers_stay_constant() {
        let src = Samples::filled(4, 6, &[0.5, 0.25, 1.0]).unwrap();
        for order in [Interpolation::Nearest, Interpolation::Linear, Interpolation::Cubic] {
            let out = resample(&src, 15, 3, order).unwrap();
            assert_eq!(out.shape(), [3, 15, 3]);
            for (i, v) in out.as_slice().iter().enumerate() {
                assert!((v - src.as_slice()[i % 3]).abs() < 1e-5, "{order:?}");
            }
        }
    }

    #[test]
    fn nearest_doubling_repeats_pixels() {
        let src = Samples::new(1, 2, 1, vec![0.0, 1.0]).unwrap();
        let out = resample(&src, 4, 1, Interpolation::Nearest).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn relative_resolution_and_metadata() {
        let image = Image::single(
            "C",
            Layer::new(Samples::zeros(10, 20, 3).unwrap(), Role::Rgb).unwrap(),
        );
        let params = ResizeParams {
            res: XY::new(Length::width(0.5), Length::px(4.0)),
            order: Interpolation::Linear,
        };
        let out = resize(&image, &params).unwrap();
        assert_eq!(out.layer("C").unwrap().res(), (10, 4));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let image = Image::single(
            "A",
            Layer::new(Samples::zeros(2, 2, 1).unwrap(), Role::Alpha).unwrap(),
        );
        let params = ResizeParams {
            res: XY::new(Length::px(0.0), Length::px(2.0)),
            ..ResizeParams::default()
        };
        assert!(matches!(
            resize(&image, &params),
            Err(ImagecatError::Validation(_))
        ));
    }

    #[test]
    fn oversized_targets_are_validation_errors() {
        let image = Image::single(
            "A",
            Layer::new(Samples::zeros(2, 2, 1).unwrap(), Role::Alpha).unwrap(),
        );
        for res in [
            XY::new(Length::px(1e300), Length::px(2.0)),
            XY::new(Length::px(2.0), Length::px(f64::INFINITY)),
            XY::new(Length::width(1e12), Length::height(1e12)),
        ] {
            let params = ResizeParams {
                res,
                ..ResizeParams::default()
            };
            assert!(matches!(
                resize(&image, &params),
                Err(ImagecatError::Validation(_))
            ));
        }
    }
}
