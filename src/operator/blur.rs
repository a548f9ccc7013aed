use std::collections::BTreeMap;

use crate::{
    data::{image::Image, samples::Samples},
    foundation::{
        core::XY,
        error::{ImagecatError, ImagecatResult},
    },
    operator::inputs::NamedInputs,
    units::Length,
};

/// Kernel half-width in standard deviations.
const TRUNCATE: f64 = 4.0;

/// Largest kernel half-width accepted, in pixels.
const MAX_KERNEL_RADIUS: usize = 1 << 24;

/// Parameters for [`gaussian`].
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianParams {
    pub layers: String,
    /// Standard deviation along x and y, resolved against each layer.
    pub radius: XY<Length>,
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self {
            layers: "*".to_string(),
            radius: XY::new(Length::px(5.0), Length::px(5.0)),
        }
    }
}

impl GaussianParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            layers: inputs.optional("layers", d.layers)?,
            radius: inputs.optional("radius", d.radius)?,
        })
    }
}

/// Blur the matching layers of `image`. Only the blurred layers appear in the output.
#[tracing::instrument(skip(image))]
pub fn gaussian(image: &Image, params: &GaussianParams) -> ImagecatResult<Image> {
    let mut layers = BTreeMap::new();
    for name in image.match_layer_names(&params.layers) {
        let Some(layer) = image.layer(&name) else {
            continue;
        };
        let sigma_x = params.radius.x.resolve(layer.res());
        let sigma_y = params.radius.y.resolve(layer.res());
        let data = blur(layer.data(), sigma_x, sigma_y)?;
        layers.insert(name, layer.with_data(data)?);
    }
    Image::new(layers)
}

/// Separable Gaussian blur with standard deviations `sigma_x` (columns) and `sigma_y` (rows).
/// Samples beyond the edges repeat the edge sample.
///
/// Kernel taps that fall further outside the layer than its own extent only ever read the
/// edge sample, so their weight is folded into the outermost taps. The kernel is bounded by
/// the layer size while the result matches the untruncated sum.
pub fn blur(src: &Samples, sigma_x: f64, sigma_y: f64) -> ImagecatResult<Samples> {
    let kx = gaussian_kernel(sigma_x, src.cols())?;
    let ky = gaussian_kernel(sigma_y, src.rows())?;
    let tmp = horizontal_pass(src, &kx)?;
    vertical_pass(&tmp, &ky)
}

fn gaussian_kernel(sigma: f64, len: usize) -> ImagecatResult<Vec<f32>> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ImagecatError::validation(format!(
            "blur radius must be finite and non-negative, received {sigma}"
        )));
    }
    let extent = TRUNCATE * sigma + 0.5;
    if extent > MAX_KERNEL_RADIUS as f64 {
        return Err(ImagecatError::validation(format!(
            "blur radius {sigma} needs a kernel wider than {MAX_KERNEL_RADIUS} pixels"
        )));
    }
    let radius = extent as usize;
    let kept = radius.min(len.saturating_sub(1));
    if kept == 0 {
        return Ok(vec![1.0]);
    }

    let denom = 2.0 * sigma * sigma;
    let weight = |i: usize| {
        let x = i as f64;
        (-x * x / denom).exp()
    };
    let mut weights: Vec<f64> = (0..=2 * kept).map(|i| weight(i.abs_diff(kept))).collect();
    let tail: f64 = (kept + 1..=radius).map(weight).sum();
    weights[0] += tail;
    weights[2 * kept] += tail;

    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Err(ImagecatError::data("gaussian kernel sum is zero"));
    }
    Ok(weights.iter().map(|w| (w / sum) as f32).collect())
}

fn horizontal_pass(src: &Samples, k: &[f32]) -> ImagecatResult<Samples> {
    if k.len() == 1 {
        return Ok(src.clone());
    }
    let radius = (k.len() / 2) as isize;
    let (rows, cols, channels) = (src.rows(), src.cols(), src.channels());
    let last = cols as isize - 1;
    let mut acc = vec![0.0f32; channels];
    Ok(Samples::from_fn(rows, cols, channels, |y, x, ch| {
        if ch == 0 {
            acc.iter_mut().for_each(|v| *v = 0.0);
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius).clamp(0, last) as usize;
                for (a, &v) in acc.iter_mut().zip(src.pixel(y, sx)) {
                    *a += kw * v;
                }
            }
        }
        acc[ch]
    })?
    .with_sample_type(src.sample_type()))
}

fn vertical_pass(src: &Samples, k: &[f32]) -> ImagecatResult<Samples> {
    if k.len() == 1 {
        return Ok(src.clone());
    }
    let radius = (k.len() / 2) as isize;
    let (rows, cols, channels) = (src.rows(), src.cols(), src.channels());
    let last = rows as isize - 1;
    let mut acc = vec![0.0f32; channels];
    Ok(Samples::from_fn(rows, cols, channels, |y, x, ch| {
        if ch == 0 {
            acc.iter_mut().for_each(|v| *v = 0.0);
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius).clamp(0, last) as usize;
                for (a, &v) in acc.iter_mut().zip(src.pixel(sy, x)) {
                    *a += kw * v;
                }
            }
        }
        acc[ch]
    })?
    .with_sample_type(src.sample_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Layer, Role};

    #[test]
    fn zero_radius_is_identity() {
        let src = Samples::from_fn(3, 4, 2, |r, c, ch| (r * 8 + c * 2 + ch) as f32).unwrap();
        let out = blur(&src, 0.0, 0.0).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let src = Samples::filled(5, 6, &[0.25, 0.5, 0.75]).unwrap();
        let out = blur(&src, 2.0, 1.0).unwrap();
        for (a, b) in out.as_slice().iter().zip(src.as_slice()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn blur_spreads_energy_and_preserves_it() {
        let mut src = Samples::zeros(9, 9, 1).unwrap();
        src.make_mut()[4 * 9 + 4] = 1.0;
        let out = blur(&src, 1.0, 1.0).unwrap();
        let nonzero = out.as_slice().iter().filter(|&&v| v > 0.0).count();
        assert!(nonzero > 1);
        let sum: f32 = out.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn axes_blur_independently() {
        let mut src = Samples::zeros(7, 7, 1).unwrap();
        src.make_mut()[3 * 7 + 3] = 1.0;
        let out = blur(&src, 1.0, 0.0).unwrap();
        assert!(out.get(3, 2, 0) > 0.0);
        assert_eq!(out.get(2, 3, 0), 0.0);
    }

    #[test]
    fn negative_radius_is_rejected() {
        let src = Samples::zeros(2, 2, 1).unwrap();
        assert!(matches!(blur(&src, -1.0, 1.0), Err(ImagecatError::Validation(_))));
    }

    #[test]
    fn only_matching_layers_are_blurred() {
        let layer = |v: f32| Layer::new(Samples::filled(4, 4, &[v]).unwrap(), Role::Alpha).unwrap();
        let image = Image::new(BTreeMap::from([
            ("A".to_string(), layer(1.0)),
            ("M".to_string(), layer(0.0)),
        ]))
        .unwrap();
        let params = GaussianParams {
            layers: "A".to_string(),
            radius: XY::new(Length::width(0.25), Length::px(1.0)),
        };
        let out = gaussian(&image, &params).unwrap();
        assert_eq!(out.match_layer_names("*"), ["A"]);
        assert_eq!(out.layer("A").unwrap().role(), Role::Alpha);
    }

    #[test]
    fn huge_radius_is_a_validation_error() {
        let image = Image::new(BTreeMap::from([(
            "Y".to_string(),
            Layer::new(Samples::filled(4, 4, &[0.5]).unwrap(), Role::Luminance).unwrap(),
        )]))
        .unwrap();
        let params = GaussianParams {
            layers: "*".to_string(),
            radius: XY::new(Length::px(1e300), Length::px(1.0)),
        };
        assert!(matches!(
            gaussian(&image, &params),
            Err(ImagecatError::Validation(_))
        ));
    }

    #[test]
    fn kernel_wider_than_the_layer_folds_into_the_edges() {
        let kernel = gaussian_kernel(1000.0, 3).unwrap();
        assert_eq!(kernel.len(), 5);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(kernel[0] > kernel[2]);

        let src = Samples::from_fn(1, 3, 1, |_, c, _| c as f32).unwrap();
        let out = blur(&src, 1000.0, 1000.0).unwrap();
        assert!(out.as_slice().iter().all(|v| v.is_finite()));
        assert!((out.get(0, 1, 0) - 1.0).abs() < 1e-4);
    }
}
