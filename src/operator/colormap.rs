use std::collections::BTreeMap;

use crate::{
    color::{Palette, linear_map},
    data::{image::Image, layer::Layer, role::Role},
    foundation::error::ImagecatResult,
    operator::inputs::NamedInputs,
};

/// Parameters for [`colormap`].
#[derive(Clone, Debug, PartialEq)]
pub struct ColormapParams {
    pub layers: String,
    /// Linear RGB stops; the built-in blue-red palette when absent.
    pub palette: Option<Vec<[f32; 3]>>,
    pub reverse: bool,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl Default for ColormapParams {
    fn default() -> Self {
        Self {
            layers: "*".to_string(),
            palette: None,
            reverse: false,
            min: None,
            max: None,
        }
    }
}

impl ColormapParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            layers: inputs.optional("layers", d.layers)?,
            palette: inputs.optional("palette", d.palette)?,
            reverse: inputs.optional("reverse", d.reverse)?,
            min: inputs.optional("min", d.min)?,
            max: inputs.optional("max", d.max)?,
        })
    }

    fn palette(&self) -> ImagecatResult<Palette> {
        match &self.palette {
            Some(stops) => Palette::new(stops.iter().map(|c| c.to_vec()).collect(), self.reverse),
            None if self.reverse => {
                Palette::new(Palette::blue_red().colors().to_vec(), true)
            }
            None => Ok(Palette::blue_red()),
        }
    }
}

/// Map single-channel layers to RGB. Layers with any other channel count are skipped.
pub fn colormap(image: &Image, params: &ColormapParams) -> ImagecatResult<Image> {
    let palette = params.palette()?;
    let mut layers = BTreeMap::new();
    for name in image.match_layer_names(&params.layers) {
        let Some(layer) = image.layer(&name) else {
            continue;
        };
        if layer.data().channels() != 1 {
            continue;
        }
        let data = linear_map(layer.data(), &palette, params.min, params.max)?;
        layers.insert(name, Layer::new(data, Role::Rgb)?);
    }
    Image::new(layers)
}

/// Parameters for [`rgb2gray`].
#[derive(Clone, Debug, PartialEq)]
pub struct Rgb2GrayParams {
    pub layers: String,
    pub weights: [f32; 3],
}

impl Default for Rgb2GrayParams {
    fn default() -> Self {
        Self {
            layers: "*".to_string(),
            weights: [0.2125, 0.7154, 0.0721],
        }
    }
}

impl Rgb2GrayParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            layers: inputs.optional("layers", d.layers)?,
            weights: inputs.optional("weights", d.weights)?,
        })
    }
}

/// Weighted sum of three-channel layers into single-channel layers. Layers with any other
/// channel count are skipped.
pub fn rgb2gray(image: &Image, params: &Rgb2GrayParams) -> ImagecatResult<Image> {
    let [wr, wg, wb] = params.weights;
    let mut layers = BTreeMap::new();
    for name in image.match_layer_names(&params.layers) {
        let Some(layer) = image.layer(&name) else {
            continue;
        };
        if layer.data().channels() != 3 {
            continue;
        }
        let data = layer
            .data()
            .map_pixels(1, |px, out| out[0] = px[0] * wr + px[1] * wg + px[2] * wb);
        layers.insert(name, Layer::new(data, Role::None)?);
    }
    Image::new(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Samples;

    fn mixed() -> Image {
        Image::new(BTreeMap::from([
            (
                "C".to_string(),
                Layer::new(Samples::filled(2, 2, &[1.0, 1.0, 1.0]).unwrap(), Role::Rgb).unwrap(),
            ),
            (
                "Z".to_string(),
                Layer::new(
                    Samples::new(2, 2, 1, vec![0.0, 1.0, 2.0, 3.0]).unwrap(),
                    Role::Depth,
                )
                .unwrap(),
            ),
        ]))
        .unwrap()
    }

    #[test]
    fn colormap_converts_scalar_layers_only() {
        let out = colormap(&mixed(), &ColormapParams::default()).unwrap();
        assert_eq!(out.match_layer_names("*"), ["Z"]);
        let z = out.layer("Z").unwrap();
        assert_eq!(z.role(), Role::Rgb);
        let mut first = [0.0; 3];
        Palette::blue_red().sample(0.0, &mut first);
        assert_eq!(z.data().pixel(0, 0), &first);
    }

    #[test]
    fn custom_palette_and_range() {
        let params = ColormapParams {
            palette: Some(vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]),
            min: Some(0.0),
            max: Some(2.0),
            ..ColormapParams::default()
        };
        let out = colormap(&mixed(), &params).unwrap();
        let z = out.layer("Z").unwrap().data();
        assert_eq!(z.pixel(0, 1), &[0.5, 0.5, 0.5]);
        assert_eq!(z.pixel(1, 1), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn gray_uses_weights() {
        let params = Rgb2GrayParams {
            weights: [0.5, 0.25, 0.25],
            ..Rgb2GrayParams::default()
        };
        let out = rgb2gray(&mixed(), &params).unwrap();
        assert_eq!(out.match_layer_names("*"), ["C"]);
        let c = out.layer("C").unwrap();
        assert_eq!(c.shape(), [2, 2, 1]);
        assert_eq!(c.data().get(1, 1, 0), 1.0);
    }
}
