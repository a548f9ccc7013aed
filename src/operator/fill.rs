use crate::{
    data::{image::Image, layer::Layer, role::Role, samples::Samples},
    foundation::error::{ImagecatError, ImagecatResult},
    operator::inputs::NamedInputs,
};

/// Parameters for [`fill`].
#[derive(Clone, Debug, PartialEq)]
pub struct FillParams {
    pub layer: String,
    /// `[width, height]` in pixels.
    pub res: [usize; 2],
    pub role: Role,
    pub values: Vec<f32>,
}

impl Default for FillParams {
    fn default() -> Self {
        Self {
            layer: "C".to_string(),
            res: [256, 256],
            role: Role::Rgb,
            values: vec![1.0, 1.0, 1.0],
        }
    }
}

impl FillParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            layer: inputs.optional("layer", d.layer)?,
            res: inputs.optional("res", d.res)?,
            role: inputs.optional("role", d.role)?,
            values: inputs.optional("values", d.values)?,
        })
    }
}

/// An image with one solid layer.
pub fn fill(params: &FillParams) -> ImagecatResult<Image> {
    if params.values.is_empty() {
        return Err(ImagecatError::validation("fill needs at least one value"));
    }
    let [width, height] = params.res;
    let data = Samples::filled(height, width, &params.values)?;
    Ok(Image::single(
        params.layer.clone(),
        Layer::new(data, params.role)?,
    ))
}
