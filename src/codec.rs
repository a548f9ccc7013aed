//! Reading and writing 8-bit raster files through the `image` crate.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

use crate::{
    color::{linear_to_srgb, srgb_to_linear},
    data::{
        image::Image,
        layer::Layer,
        role::Role,
        samples::{SampleType, Samples},
    },
    foundation::error::{ImagecatError, ImagecatResult},
};

/// Decode an encoded raster (PNG, JPEG, ...) into layers.
///
/// Grayscale files become a luminance layer `Y` (plus `A` when they carry alpha); color files
/// become a linear RGB layer `C` plus an alpha layer `A` when present.
pub fn decode_image(bytes: &[u8]) -> ImagecatResult<Image> {
    let decoded = image::load_from_memory(bytes).context("decode image from memory")?;
    from_dynamic(&decoded)
}

#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_image(path: impl AsRef<Path>) -> ImagecatResult<Image> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("read image file '{}'", path.display()))?;
    let image = decode_image(&bytes)?;
    tracing::debug!(?image, "loaded");
    Ok(image)
}

fn from_dynamic(decoded: &image::DynamicImage) -> ImagecatResult<Image> {
    let (width, height) = (decoded.width() as usize, decoded.height() as usize);
    let color = decoded.color();
    let has_alpha = color.has_alpha();
    let mut layers = BTreeMap::new();

    if color.has_color() {
        let rgba = decoded.to_rgba8();
        let pixels = rgba.as_raw();
        let rgb = Samples::from_fn(height, width, 3, |r, c, ch| {
            srgb_to_linear(unorm8(pixels[(r * width + c) * 4 + ch]))
        })?
        .with_sample_type(SampleType::F16);
        layers.insert("C".to_string(), Layer::new(rgb, Role::Rgb)?);
        if has_alpha {
            layers.insert("A".to_string(), alpha_layer(pixels, width, height, 4)?);
        }
    } else {
        let la = decoded.to_luma_alpha8();
        let pixels = la.as_raw();
        let y = Samples::from_fn(height, width, 1, |r, c, _| unorm8(pixels[(r * width + c) * 2]))?
            .with_sample_type(SampleType::F16);
        layers.insert("Y".to_string(), Layer::new(y, Role::Luminance)?);
        if has_alpha {
            layers.insert("A".to_string(), alpha_layer(pixels, width, height, 2)?);
        }
    }
    Image::new(layers)
}

fn alpha_layer(pixels: &[u8], width: usize, height: usize, stride: usize) -> ImagecatResult<Layer> {
    let a = Samples::from_fn(height, width, 1, |r, c, _| {
        unorm8(pixels[(r * width + c) * stride + stride - 1])
    })?
    .with_sample_type(SampleType::F16);
    Layer::new(a, Role::Alpha)
}

/// Encode the named layers of `image` as a single 8-bit raster.
///
/// Accepted selections are one color layer (partial color roles are padded with black), one
/// single-channel layer written as grayscale, or a color layer plus an alpha or matte layer
/// written as RGBA.
pub fn encode_layers(image: &Image, names: &[String]) -> ImagecatResult<image::DynamicImage> {
    let layers = names
        .iter()
        .map(|name| {
            image
                .layer(name)
                .map(|layer| (name.as_str(), layer))
                .ok_or_else(|| ImagecatError::lookup(format!("image has no layer '{name}'")))
        })
        .collect::<ImagecatResult<Vec<_>>>()?;

    match layers.as_slice() {
        [(_, layer)] if layer.role() == Role::Rgba => {
            let (w, h) = layer.res();
            let data = layer.data().as_slice();
            let mut rgba = Vec::with_capacity(data.len());
            for px in data.chunks_exact(4) {
                rgba.extend(px[..3].iter().map(|&v| to_unorm8(linear_to_srgb(v))));
                rgba.push(to_unorm8(px[3]));
            }
            let buf = image::RgbaImage::from_raw(w as u32, h as u32, rgba)
                .context("assemble rgba8 buffer")?;
            Ok(image::DynamicImage::ImageRgba8(buf))
        }
        [(_, layer)] if layer.role().is_color() => {
            let (w, h) = layer.res();
            let buf = image::RgbImage::from_raw(w as u32, h as u32, srgb8(layer))
                .context("assemble rgb8 buffer")?;
            Ok(image::DynamicImage::ImageRgb8(buf))
        }
        [(name, layer)] => {
            let (w, h) = layer.res();
            let buf = image::GrayImage::from_raw(w as u32, h as u32, gray8(name, layer)?)
                .context("assemble luma8 buffer")?;
            Ok(image::DynamicImage::ImageLuma8(buf))
        }
        [(_, a), (_, b)] => {
            let (color, alpha) = match (a.role().is_color(), b.role().is_color()) {
                (true, false) => (*a, *b),
                (false, true) => (*b, *a),
                _ => {
                    return Err(ImagecatError::validation(
                        "two-layer output needs one color layer and one alpha layer",
                    ));
                }
            };
            if !matches!(alpha.role(), Role::Alpha | Role::Matte) {
                return Err(ImagecatError::validation(format!(
                    "layer paired with color must be alpha or matte, received {:?}",
                    alpha.role()
                )));
            }
            let rgb = srgb8(color);
            let alpha = alpha.data().as_slice();
            let mut rgba = Vec::with_capacity(alpha.len() * 4);
            for (px, &a) in rgb.chunks_exact(3).zip(alpha) {
                rgba.extend_from_slice(px);
                rgba.push(to_unorm8(a));
            }
            let (w, h) = color.res();
            let buf = image::RgbaImage::from_raw(w as u32, h as u32, rgba)
                .context("assemble rgba8 buffer")?;
            Ok(image::DynamicImage::ImageRgba8(buf))
        }
        _ => Err(ImagecatError::validation(format!(
            "8-bit output needs one or two layers, received {}",
            layers.len()
        ))),
    }
}

/// Save the named layers of `image`, picking the format from the file extension.
#[tracing::instrument(skip(image, names), fields(path = %path.as_ref().display()))]
pub fn save_image(image: &Image, names: &[String], path: impl AsRef<Path>) -> ImagecatResult<()> {
    let path = path.as_ref();
    let encoded = encode_layers(image, names)?;
    encoded
        .save(path)
        .with_context(|| format!("write image file '{}'", path.display()))?;
    Ok(())
}

/// Linear color samples as interleaved sRGB bytes, padding partial roles with black.
fn srgb8(layer: &Layer) -> Vec<u8> {
    let slots: [Option<usize>; 3] = match layer.role() {
        Role::RedGreen => [Some(0), Some(1), None],
        Role::GreenBlue => [None, Some(0), Some(1)],
        Role::RedBlue => [Some(0), None, Some(1)],
        Role::Red => [Some(0), None, None],
        Role::Green => [None, Some(0), None],
        Role::Blue => [None, None, Some(0)],
        _ => [Some(0), Some(1), Some(2)],
    };
    let data = layer.data();
    let mut out = Vec::with_capacity(data.rows() * data.cols() * 3);
    for r in 0..data.rows() {
        for c in 0..data.cols() {
            let px = data.pixel(r, c);
            for slot in slots {
                out.push(slot.map_or(0, |i| to_unorm8(linear_to_srgb(px[i]))));
            }
        }
    }
    out
}

fn gray8(name: &str, layer: &Layer) -> ImagecatResult<Vec<u8>> {
    if layer.data().channels() != 1 {
        return Err(ImagecatError::validation(format!(
            "layer '{name}' with role {:?} and {} channels cannot be written as an 8-bit image",
            layer.role(),
            layer.data().channels()
        )));
    }
    Ok(layer.data().as_slice().iter().map(|&v| to_unorm8(v)).collect())
}

fn unorm8(v: u8) -> f32 {
    f32::from(v) / 255.0
}

fn to_unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
