//! Colorspace conversion and scalar-to-color mapping.

use crate::{
    data::samples::Samples,
    foundation::error::{ImagecatError, ImagecatResult},
};

/// sRGB transfer function to linear light.
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Linear light to the sRGB transfer function.
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Ordered colors in linear space, all with the same number of channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Vec<f32>>,
}

/// ColorBrewer diverging blue to red, as sRGB bytes.
const BLUE_RED: [[u8; 3]; 11] = [
    [0x05, 0x30, 0x61],
    [0x21, 0x66, 0xac],
    [0x43, 0x93, 0xc3],
    [0x92, 0xc5, 0xde],
    [0xd1, 0xe5, 0xf0],
    [0xf7, 0xf7, 0xf7],
    [0xfd, 0xdb, 0xc7],
    [0xf4, 0xa5, 0x82],
    [0xd6, 0x60, 0x4d],
    [0xb2, 0x18, 0x2b],
    [0x67, 0x00, 0x1f],
];

impl Palette {
    pub fn new(colors: Vec<Vec<f32>>, reverse: bool) -> ImagecatResult<Self> {
        let Some(depth) = colors.first().map(Vec::len) else {
            return Err(ImagecatError::validation("palette must contain at least one color"));
        };
        if depth == 0 || colors.iter().any(|c| c.len() != depth) {
            return Err(ImagecatError::validation(
                "palette colors must share a non-zero channel count",
            ));
        }
        let mut colors = colors;
        if reverse {
            colors.reverse();
        }
        Ok(Self { colors })
    }

    /// Build from 8-bit sRGB triples, converting to linear.
    pub fn from_srgb8(colors: &[[u8; 3]], reverse: bool) -> ImagecatResult<Self> {
        let colors = colors
            .iter()
            .map(|c| c.iter().map(|&v| srgb_to_linear(f32::from(v) / 255.0)).collect())
            .collect();
        Self::new(colors, reverse)
    }

    /// Diverging blue-white-red palette.
    pub fn blue_red() -> Self {
        let colors = BLUE_RED
            .iter()
            .map(|c| c.iter().map(|&v| srgb_to_linear(f32::from(v) / 255.0)).collect())
            .collect();
        Self { colors }
    }

    pub fn colors(&self) -> &[Vec<f32>] {
        &self.colors
    }

    pub fn channels(&self) -> usize {
        self.colors[0].len()
    }

    /// Interpolated color at `t` in `[0, 1]`; values outside clamp to the end colors.
    pub fn sample(&self, t: f32, out: &mut [f32]) {
        let last = self.colors.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let x = t * last as f32;
        let i = (x.floor() as usize).min(last);
        let j = (i + 1).min(last);
        let f = x - i as f32;
        for ((o, a), b) in out.iter_mut().zip(&self.colors[i]).zip(&self.colors[j]) {
            *o = a + (b - a) * f;
        }
    }
}

/// Map single-channel `data` to palette colors, with `min` and `max` landing on the first and
/// last color. Missing bounds come from the data range.
pub fn linear_map(
    data: &Samples,
    palette: &Palette,
    min: Option<f32>,
    max: Option<f32>,
) -> ImagecatResult<Samples> {
    if data.channels() != 1 {
        return Err(ImagecatError::validation(format!(
            "linear map expects one channel, received {}",
            data.channels()
        )));
    }
    let values = data.as_slice();
    let min = min.unwrap_or_else(|| values.iter().copied().fold(f32::INFINITY, f32::min));
    let max = max.unwrap_or_else(|| values.iter().copied().fold(f32::NEG_INFINITY, f32::max));
    let span = max - min;
    Ok(data.map_pixels(palette.channels(), |src, dst| {
        let t = if span > 0.0 {
            (src[0] - min) / span
        } else if src[0] <= min {
            0.0
        } else {
            1.0
        };
        palette.sample(t, dst);
    }))
}

/// Map single-channel `data` to palette colors by index: values are floored and wrapped
/// modulo the palette size.
pub fn categorical_map(data: &Samples, palette: &Palette) -> ImagecatResult<Samples> {
    if data.channels() != 1 {
        return Err(ImagecatError::validation(format!(
            "categorical map expects one channel, received {}",
            data.channels()
        )));
    }
    let n = palette.colors.len() as i64;
    Ok(data.map_pixels(palette.channels(), |src, dst| {
        let index = (src[0].floor() as i64).rem_euclid(n) as usize;
        dst.copy_from_slice(&palette.colors[index]);
    }))
}
