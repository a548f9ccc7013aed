use crate::{
    data::{image::Image, layer::Layer, samples::Samples},
    foundation::{
        core::XY,
        error::{ImagecatError, ImagecatResult},
    },
    operator::inputs::NamedInputs,
    transform::{
        affine::{Placement, transform},
        composite::mix_into_region,
        resample::Interpolation,
    },
    units::Length,
};

/// Parameters for [`composite`].
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeParams {
    pub bglayer: String,
    pub fglayer: String,
    pub masklayer: String,
    /// Output layer name; the background layer name when absent.
    pub layer: Option<String>,
    pub order: Interpolation,
    pub orientation: f64,
    pub pivot: XY<Length>,
    pub position: XY<Length>,
    pub scale: XY<f64>,
}

impl Default for CompositeParams {
    fn default() -> Self {
        let placement = Placement::default();
        Self {
            bglayer: "C".to_string(),
            fglayer: "C".to_string(),
            masklayer: "A".to_string(),
            layer: None,
            order: Interpolation::Cubic,
            orientation: placement.orientation,
            pivot: placement.pivot,
            position: placement.position,
            scale: placement.scale,
        }
    }
}

impl CompositeParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            bglayer: inputs.optional("bglayer", d.bglayer)?,
            fglayer: inputs.optional("fglayer", d.fglayer)?,
            masklayer: inputs.optional("masklayer", d.masklayer)?,
            layer: inputs.optional("layer", d.layer)?,
            order: inputs.optional("order", d.order)?,
            orientation: inputs.optional("orientation", d.orientation)?,
            pivot: inputs.optional("pivot", d.pivot)?,
            position: inputs.optional("position", d.position)?,
            scale: inputs.optional("scale", d.scale)?,
        })
    }

    pub fn placement(&self) -> Placement {
        Placement {
            pivot: self.pivot,
            position: self.position,
            orientation: self.orientation,
            scale: self.scale,
        }
    }

    fn output_name(&self) -> &str {
        self.layer.as_deref().unwrap_or(&self.bglayer)
    }
}

/// Place `foreground` over `background` through `mask` (fully opaque when absent).
///
/// The result is an image with the single output layer; it keeps the background's role, and
/// only the region the transformed foreground covers differs from the background.
#[tracing::instrument(skip_all, fields(layer = params.output_name()))]
pub fn composite_layers(
    background: &Layer,
    foreground: &Layer,
    mask: Option<&Layer>,
    params: &CompositeParams,
) -> ImagecatResult<Image> {
    let channels = background.data().channels();
    if foreground.data().channels() != channels {
        return Err(ImagecatError::validation(format!(
            "foreground has {} channels but background has {channels}",
            foreground.data().channels()
        )));
    }
    let mask = match mask {
        Some(mask) => {
            if mask.data().channels() != 1 {
                return Err(ImagecatError::validation(format!(
                    "mask must have one channel, received {}",
                    mask.data().channels()
                )));
            }
            if mask.res() != foreground.res() {
                return Err(ImagecatError::validation(format!(
                    "mask resolution {:?} differs from foreground resolution {:?}",
                    mask.res(),
                    foreground.res()
                )));
            }
            mask.data().clone()
        }
        None => {
            let (w, h) = foreground.res();
            Samples::filled(h, w, &[1.0])?
        }
    };

    let target = background.res();
    let placement = params.placement();
    let fg = transform(foreground.data(), target, &placement, params.order)?;
    let alpha = transform(&mask, target, &placement, params.order)?;
    let data = mix_into_region(background.data().clone(), &fg.data, &alpha.data, fg.region)?;
    Ok(Image::single(
        params.output_name().to_string(),
        background.with_data(data)?,
    ))
}

/// [`composite_layers`] over the `background`, `foreground` and optional `mask` inputs.
pub fn composite(inputs: &NamedInputs, params: &CompositeParams) -> ImagecatResult<Image> {
    let background = inputs.require_layer("background", &params.bglayer)?;
    let foreground = inputs.require_layer("foreground", &params.fglayer)?;
    let mask = inputs.optional_layer("mask", &params.masklayer, Some(1))?;
    composite_layers(background, foreground, mask, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn solid(rows: usize, cols: usize, values: &[f32], role: Role) -> Layer {
        Layer::new(Samples::filled(rows, cols, values).unwrap(), role).unwrap()
    }

    #[test]
    fn opaque_square_lands_centered() {
        let bg = solid(100, 100, &[0.0, 0.0, 0.0], Role::Rgb);
        let fg = solid(10, 10, &[1.0, 1.0, 1.0], Role::Rgb);
        let out = composite_layers(&bg, &fg, None, &CompositeParams::default()).unwrap();
        let c = out.layer("C").unwrap().data();
        for r in 0..100 {
            for col in 0..100 {
                let inside = (45..55).contains(&r) && (45..55).contains(&col);
                let expected = if inside { 1.0 } else { 0.0 };
                assert_eq!(c.get(r, col, 0), expected, "({r}, {col})");
            }
        }
    }

    #[test]
    fn mask_blends_and_output_layer_is_renamed() {
        let bg = solid(20, 20, &[0.0], Role::Luminance);
        let fg = solid(20, 20, &[1.0], Role::Luminance);
        let mask = solid(20, 20, &[0.25], Role::Alpha);
        let params = CompositeParams {
            layer: Some("Y2".to_string()),
            order: Interpolation::Nearest,
            ..CompositeParams::default()
        };
        let out = composite_layers(&bg, &fg, Some(&mask), &params).unwrap();
        let y = out.layer("Y2").unwrap();
        assert_eq!(y.role(), Role::Luminance);
        assert_eq!(y.data().get(10, 10, 0), 0.25);
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        let bg = solid(4, 4, &[0.0; 3], Role::Rgb);
        let fg = solid(4, 4, &[0.0], Role::Alpha);
        assert!(matches!(
            composite_layers(&bg, &fg, None, &CompositeParams::default()),
            Err(ImagecatError::Validation(_))
        ));
    }

    #[test]
    fn missing_layers_are_lookup_errors() {
        let bg = Image::single("C", solid(4, 4, &[0.0; 3], Role::Rgb));
        let inputs = NamedInputs::new("comp")
            .with("background", bg.clone())
            .with("foreground", bg);
        let params = CompositeParams {
            fglayer: "missing".to_string(),
            ..CompositeParams::default()
        };
        assert!(matches!(
            composite(&inputs, &params),
            Err(ImagecatError::Lookup(_))
        ));
    }
}
