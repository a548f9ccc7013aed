use std::path::PathBuf;

use crate::{
    codec::{load_image, save_image},
    data::image::Image,
    foundation::error::{ImagecatError, ImagecatResult},
    operator::inputs::NamedInputs,
};

/// Parameters for [`load`] and [`save`].
#[derive(Clone, Debug, PartialEq)]
pub struct FileParams {
    pub path: PathBuf,
    pub layers: String,
}

impl FileParams {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layers: "*".to_string(),
        }
    }

    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        Ok(Self {
            path: inputs.require("path")?,
            layers: inputs.optional("layers", "*".to_string())?,
        })
    }
}

/// Read a file, keeping the layers that match `params.layers`.
pub fn load(params: &FileParams) -> ImagecatResult<Image> {
    let image = load_image(&params.path)?;
    let names = image.match_layer_names(&params.layers);
    let (mut layers, metadata) = image.into_parts();
    layers.retain(|name, _| names.contains(name));
    Image::with_metadata(layers, metadata)
}

/// Write the layers of `image` matching `params.layers`; returns `image` unchanged.
pub fn save(image: &Image, params: &FileParams) -> ImagecatResult<Image> {
    let names = image.match_layer_names(&params.layers);
    if names.is_empty() {
        return Err(ImagecatError::lookup(format!(
            "no layers match '{}' for '{}'",
            params.layers,
            params.path.display()
        )));
    }
    save_image(image, &names, &params.path)?;
    Ok(image.clone())
}
