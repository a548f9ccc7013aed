//! Named image operators.
//!
//! Every operator reads its parameters and upstream images from a [`NamedInputs`] bag, turns
//! the parameters into a typed struct, and returns a new [`Image`]. Inputs are never modified.

pub mod blur;
pub mod colormap;
pub mod composite;
pub mod cryptomatte;
pub mod fill;
pub(crate) mod inputs;
pub mod io;
pub mod layers;
pub mod noise;
pub mod resize;
pub mod text;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{
    data::image::Image,
    foundation::error::{ImagecatError, ImagecatResult},
};

pub use inputs::{Input, NamedInputs};

/// Every operator a pipeline can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Colormap,
    Composite,
    CryptomatteDecode,
    Delete,
    Fill,
    Gaussian,
    Load,
    Merge,
    Offset,
    Remap,
    Rename,
    Resize,
    Rgb2Gray,
    Save,
    Text,
    Uniform,
}

impl Operator {
    pub const ALL: [Operator; 16] = [
        Self::Colormap,
        Self::Composite,
        Self::CryptomatteDecode,
        Self::Delete,
        Self::Fill,
        Self::Gaussian,
        Self::Load,
        Self::Merge,
        Self::Offset,
        Self::Remap,
        Self::Rename,
        Self::Resize,
        Self::Rgb2Gray,
        Self::Save,
        Self::Text,
        Self::Uniform,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Colormap => "colormap",
            Self::Composite => "composite",
            Self::CryptomatteDecode => "cryptomatte.decode",
            Self::Delete => "delete",
            Self::Fill => "fill",
            Self::Gaussian => "gaussian",
            Self::Load => "load",
            Self::Merge => "merge",
            Self::Offset => "offset",
            Self::Remap => "remap",
            Self::Rename => "rename",
            Self::Resize => "resize",
            Self::Rgb2Gray => "rgb2gray",
            Self::Save => "save",
            Self::Text => "text",
            Self::Uniform => "uniform",
        }
    }

    /// Run against `inputs`. Image inputs are named `image` for single-image operators,
    /// `background`/`foreground`/`mask` for composite, and anything for merge.
    pub fn run(self, inputs: &NamedInputs) -> ImagecatResult<Image> {
        match self {
            Self::Colormap => colormap::colormap(
                inputs.require_image("image")?,
                &colormap::ColormapParams::from_inputs(inputs)?,
            ),
            Self::Composite => composite::composite(
                inputs,
                &composite::CompositeParams::from_inputs(inputs)?,
            ),
            Self::CryptomatteDecode => cryptomatte::decode(
                inputs.require_image("image")?,
                &cryptomatte::DecodeParams::from_inputs(inputs)?,
            ),
            Self::Delete => layers::delete(
                inputs.require_image("image")?,
                &inputs.optional("layers", "*".to_string())?,
            ),
            Self::Fill => fill::fill(&fill::FillParams::from_inputs(inputs)?),
            Self::Gaussian => blur::gaussian(
                inputs.require_image("image")?,
                &blur::GaussianParams::from_inputs(inputs)?,
            ),
            Self::Load => io::load(&io::FileParams::from_inputs(inputs)?),
            Self::Merge => layers::merge(inputs.images().map(|(_, image)| image)),
            Self::Offset => layers::offset(
                inputs.require_image("image")?,
                &layers::OffsetParams::from_inputs(inputs)?,
            ),
            Self::Remap => layers::remap(
                inputs.require_image("image")?,
                &inputs.optional::<BTreeMap<String, layers::RemapLayer>>(
                    "mapping",
                    BTreeMap::new(),
                )?,
            ),
            Self::Rename => layers::rename(
                inputs.require_image("image")?,
                &inputs.optional::<BTreeMap<String, String>>("changes", BTreeMap::new())?,
            ),
            Self::Resize => resize::resize(
                inputs.require_image("image")?,
                &resize::ResizeParams::from_inputs(inputs)?,
            ),
            Self::Rgb2Gray => colormap::rgb2gray(
                inputs.require_image("image")?,
                &colormap::Rgb2GrayParams::from_inputs(inputs)?,
            ),
            Self::Save => io::save(
                inputs.require_image("image")?,
                &io::FileParams::from_inputs(inputs)?,
            ),
            Self::Text => text::text(&text::TextParams::from_inputs(inputs)?),
            Self::Uniform => noise::uniform(&noise::UniformParams::from_inputs(inputs)?),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = ImagecatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ImagecatError::lookup(format!("unknown operator '{s}'")))
    }
}

impl serde::Serialize for Operator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for Operator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
