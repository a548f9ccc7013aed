//! Inverse-warp resampling of sample arrays.

use crate::{
    data::samples::Samples,
    foundation::{
        core::{Affine, Point},
        error::ImagecatResult,
    },
};

/// Resampling filter, selected by spline order in pipeline documents (`0`, `1`, `3`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Interpolation {
    Nearest,
    Linear,
    #[default]
    Cubic,
}

impl TryFrom<u8> for Interpolation {
    type Error = String;

    fn try_from(order: u8) -> Result<Self, Self::Error> {
        match order {
            0 => Ok(Self::Nearest),
            1 => Ok(Self::Linear),
            3 => Ok(Self::Cubic),
            other => Err(format!(
                "unsupported interpolation order {other} (expected 0, 1 or 3)"
            )),
        }
    }
}

impl From<Interpolation> for u8 {
    fn from(v: Interpolation) -> Self {
        match v {
            Interpolation::Nearest => 0,
            Interpolation::Linear => 1,
            Interpolation::Cubic => 3,
        }
    }
}

/// How samples outside the source are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeMode {
    /// Outside samples are zero.
    Zero,
    /// Outside samples repeat the nearest edge sample.
    Clamp,
}

/// Resample `source` into a `rows x cols` array.
///
/// `matrix` maps source coordinates to output coordinates, with `x` along columns, `y` along
/// rows, and pixel centers on integer coordinates. Each output pixel is filled by mapping it
/// back through the inverse of `matrix` and interpolating the source there. A singular
/// `matrix` or an empty source yields zeros; an output too large to allocate is an error.
pub fn warp(
    source: &Samples,
    matrix: Affine,
    rows: usize,
    cols: usize,
    interpolation: Interpolation,
    edge: EdgeMode,
) -> ImagecatResult<Samples> {
    let channels = source.channels();
    let mut out = Samples::zeros(rows, cols, channels)?.with_sample_type(source.sample_type());
    let det = matrix.determinant();
    if !det.is_finite() || det.abs() < 1e-12 || source.rows() == 0 || source.cols() == 0 {
        return Ok(out);
    }

    let inverse = matrix.inverse();
    let sampler = Sampler {
        source,
        edge,
        interpolation,
    };
    let buf = out.make_mut();
    let mut px = vec![0.0f64; channels];
    for r in 0..rows {
        for c in 0..cols {
            let p = inverse * Point::new(c as f64, r as f64);
            sampler.sample(p.x, p.y, &mut px);
            let o = (r * cols + c) * channels;
            for (dst, &v) in buf[o..o + channels].iter_mut().zip(&px) {
                *dst = v as f32;
            }
        }
    }
    Ok(out)
}

struct Sampler<'a> {
    source: &'a Samples,
    edge: EdgeMode,
    interpolation: Interpolation,
}

impl Sampler<'_> {
    fn sample(&self, x: f64, y: f64, out: &mut [f64]) {
        out.iter_mut().for_each(|v| *v = 0.0);
        match self.interpolation {
            Interpolation::Nearest => self.accumulate(y.round() as isize, x.round() as isize, 1.0, out),
            Interpolation::Linear => {
                let (x0, fx) = split(x);
                let (y0, fy) = split(y);
                let wx = [1.0 - fx, fx];
                let wy = [1.0 - fy, fy];
                for (j, wy) in wy.iter().enumerate() {
                    for (i, wx) in wx.iter().enumerate() {
                        self.accumulate(y0 + j as isize, x0 + i as isize, wy * wx, out);
                    }
                }
            }
            Interpolation::Cubic => {
                let (x0, fx) = split(x);
                let (y0, fy) = split(y);
                let wx = cubic_weights(fx);
                let wy = cubic_weights(fy);
                for (j, wy) in wy.iter().enumerate() {
                    for (i, wx) in wx.iter().enumerate() {
                        self.accumulate(y0 + j as isize - 1, x0 + i as isize - 1, wy * wx, out);
                    }
                }
            }
        }
    }

    fn accumulate(&self, row: isize, col: isize, weight: f64, out: &mut [f64]) {
        if weight == 0.0 {
            return;
        }
        let (rows, cols) = (self.source.rows() as isize, self.source.cols() as isize);
        let (row, col) = match self.edge {
            EdgeMode::Zero => {
                if row < 0 || col < 0 || row >= rows || col >= cols {
                    return;
                }
                (row, col)
            }
            EdgeMode::Clamp => (row.clamp(0, rows - 1), col.clamp(0, cols - 1)),
        };
        let px = self.source.pixel(row as usize, col as usize);
        for (o, &v) in out.iter_mut().zip(px) {
            *o += weight * f64::from(v);
        }
    }
}

fn split(v: f64) -> (isize, f64) {
    let f = v.floor();
    (f as isize, v - f)
}

/// Keys cubic convolution weights (a = -0.5) for taps at offsets -1, 0, 1, 2.
fn cubic_weights(t: f64) -> [f64; 4] {
    const A: f64 = -0.5;
    fn near(d: f64) -> f64 {
        ((A + 2.0) * d - (A + 3.0)) * d * d + 1.0
    }
    fn far(d: f64) -> f64 {
        ((A * d - 5.0 * A) * d + 8.0 * A) * d - 4.0 * A
    }
    [far(1.0 + t), near(t), near(1.0 - t), far(2.0 - t)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(rows: usize, cols: usize) -> Samples {
        Samples::from_fn(rows, cols, 1, |r, c, _| (r * cols + c) as f32).unwrap()
    }

    #[test]
    fn identity_warp_is_exact_for_every_filter() {
        let src = ramp(5, 7);
        for interp in [Interpolation::Nearest, Interpolation::Linear, Interpolation::Cubic] {
            let out = warp(&src, Affine::IDENTITY, 5, 7, interp, EdgeMode::Zero).unwrap();
            assert_eq!(out, src, "{interp:?}");
        }
    }

    #[test]
    fn integer_translation_shifts_and_zero_fills() {
        let src = ramp(3, 3);
        let out = warp(
            &src,
            Affine::translate((1.0, 0.0)),
            3,
            3,
            Interpolation::Cubic,
            EdgeMode::Zero,
        )
        .unwrap();
        assert_eq!(out.get(0, 0, 0), 0.0);
        assert_eq!(out.get(0, 1, 0), src.get(0, 0, 0));
        assert_eq!(out.get(2, 2, 0), src.get(2, 1, 0));
    }

    #[test]
    fn linear_half_pixel_averages_neighbours() {
        let src = Samples::new(1, 2, 1, vec![0.0, 1.0]).unwrap();
        let out = warp(
            &src,
            Affine::translate((-0.5, 0.0)),
            1,
            1,
            Interpolation::Linear,
            EdgeMode::Clamp,
        )
        .unwrap();
        assert!((out.get(0, 0, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cubic_weights_partition_unity() {
        for t in [0.0, 0.1, 0.25, 0.5, 0.9] {
            let sum: f64 = cubic_weights(t).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
        assert_eq!(cubic_weights(0.0), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn degenerate_matrix_yields_zeros() {
        let src = ramp(2, 2);
        let out = warp(
            &src,
            Affine::scale(0.0),
            2,
            2,
            Interpolation::Linear,
            EdgeMode::Zero,
        )
        .unwrap();
        assert!(out.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn oversized_output_is_an_error() {
        let src = ramp(2, 2);
        assert!(warp(
            &src,
            Affine::IDENTITY,
            usize::MAX / 2,
            3,
            Interpolation::Nearest,
            EdgeMode::Zero,
        )
        .is_err());
    }

    #[test]
    fn order_parses_from_integers() {
        let i: Interpolation = serde_json::from_str("1").unwrap();
        assert_eq!(i, Interpolation::Linear);
        assert!(serde_json::from_str::<Interpolation>("2").is_err());
    }
}
