//! Imagecat is a procedural, node-based compositing toolkit for multi-layer images.
//!
//! Operators consume and produce [`Image`]s: named collections of same-resolution [`Layer`]s,
//! each a dense `f32` sample array tagged with a semantic [`Role`]. Pipelines wire operators
//! together by name and evaluate them on demand:
//!
//! - geometric parameters are [`Length`]s, absolute or relative to the image resolution
//! - [`composite`](operator::composite) places one layer over another with an affine transform
//! - [`cryptomatte`](operator::cryptomatte) extracts ID mattes from Cryptomatte renders
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod codec;
pub(crate) mod color;
pub(crate) mod data;
pub(crate) mod observe;
/// Named image operators and their typed parameters.
pub mod operator;
pub(crate) mod pipeline;
pub(crate) mod transform;
pub(crate) mod units;

pub use crate::foundation::core::{Affine, Point, Region, Res, XY};
pub use crate::foundation::error::{ImagecatError, ImagecatResult};

pub use crate::codec::{decode_image, encode_layers, load_image, save_image};
pub use crate::color::{Palette, categorical_map, linear_map, linear_to_srgb, srgb_to_linear};
pub use crate::data::channels::{ChannelGroup, channels_to_layers};
pub use crate::data::image::Image;
pub use crate::data::layer::Layer;
pub use crate::data::metadata::{Metadata, MetadataValue};
pub use crate::data::role::Role;
pub use crate::data::samples::{SampleType, Samples};
pub use crate::data::select::match_layer_names;
pub use crate::observe::{NullObserver, Observer, RecordingObserver, TracingObserver};
pub use crate::pipeline::{Evaluator, Pipeline, Task};
pub use crate::transform::affine::{Placement, Transformed, covered_region, transform};
pub use crate::transform::composite::{mix, mix_into_region};
pub use crate::transform::resample::{EdgeMode, Interpolation, warp};
pub use crate::units::{IntoLength, Length, Unit, length};

pub use crate::operator::blur::GaussianParams;
pub use crate::operator::colormap::{ColormapParams, Rgb2GrayParams};
pub use crate::operator::composite::CompositeParams;
pub use crate::operator::cryptomatte::{DecodeParams, hash_id};
pub use crate::operator::fill::FillParams;
pub use crate::operator::io::FileParams;
pub use crate::operator::layers::{OffsetParams, RemapLayer, Selection};
pub use crate::operator::noise::UniformParams;
pub use crate::operator::resize::ResizeParams;
pub use crate::operator::text::TextParams;
pub use crate::operator::{Input, NamedInputs, Operator};
