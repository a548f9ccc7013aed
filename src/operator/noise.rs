use crate::{
    data::{image::Image, layer::Layer, role::Role, samples::Samples},
    foundation::{
        error::{ImagecatError, ImagecatResult},
        math::Rng64,
    },
    operator::inputs::NamedInputs,
};

/// Parameters for [`uniform`].
#[derive(Clone, Debug, PartialEq)]
pub struct UniformParams {
    pub layer: String,
    pub res: [usize; 2],
    pub role: Role,
    /// Channel count; defaults to the role's depth, or one.
    pub components: Option<usize>,
    pub low: f32,
    pub high: f32,
    pub seed: u64,
}

impl Default for UniformParams {
    fn default() -> Self {
        Self {
            layer: "A".to_string(),
            res: [256, 256],
            role: Role::None,
            components: None,
            low: 0.0,
            high: 1.0,
            seed: 1234,
        }
    }
}

impl UniformParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            layer: inputs.optional("layer", d.layer)?,
            res: inputs.optional("res", d.res)?,
            role: inputs.optional("role", d.role)?,
            components: inputs.optional("components", d.components)?,
            low: inputs.optional("low", d.low)?,
            high: inputs.optional("high", d.high)?,
            seed: inputs.optional("seed", d.seed)?,
        })
    }
}

/// An image with one layer of uniformly distributed values in `[low, high)`, reproducible
/// for a given seed.
pub fn uniform(params: &UniformParams) -> ImagecatResult<Image> {
    let channels = params
        .components
        .or_else(|| params.role.depth())
        .unwrap_or(1);
    if channels == 0 {
        return Err(ImagecatError::validation("uniform needs at least one component"));
    }
    let [width, height] = params.res;
    let mut rng = Rng64::new(params.seed);
    let span = f64::from(params.high) - f64::from(params.low);
    let data = Samples::from_fn(height, width, channels, |_, _, _| {
        (f64::from(params.low) + span * rng.next_f64_01()) as f32
    })?;
    Ok(Image::single(
        params.layer.clone(),
        Layer::new(data, params.role)?,
    ))
}
