use std::collections::BTreeMap;
use std::fmt;

use crate::{
    data::{layer::Layer, metadata::Metadata, select::match_layer_names},
    foundation::{
        core::Res,
        error::{ImagecatError, ImagecatResult},
    },
};

/// A collection of named, same-resolution [`Layer`]s plus free-form metadata.
///
/// Layers iterate in name order. Images are values: operators build new images, sharing the
/// sample buffers of any layers they pass through unchanged.
#[derive(Clone, Default, PartialEq)]
pub struct Image {
    layers: BTreeMap<String, Layer>,
    metadata: Metadata,
}

impl Image {
    pub fn new(layers: BTreeMap<String, Layer>) -> ImagecatResult<Self> {
        Self::with_metadata(layers, Metadata::new())
    }

    pub fn with_metadata(
        layers: BTreeMap<String, Layer>,
        metadata: Metadata,
    ) -> ImagecatResult<Self> {
        let mut expected: Option<(&str, [usize; 3])> = None;
        for (name, layer) in &layers {
            let shape = layer.shape();
            match expected {
                None => expected = Some((name.as_str(), shape)),
                Some((first, first_shape)) if first_shape[..2] != shape[..2] => {
                    return Err(ImagecatError::validation(format!(
                        "all layers must have the same resolution: '{first}' is {}x{}, '{name}' is {}x{}",
                        first_shape[1], first_shape[0], shape[1], shape[0]
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(Self { layers, metadata })
    }

    /// An image holding exactly one layer.
    pub fn single(name: impl Into<String>, layer: Layer) -> Self {
        Self {
            layers: BTreeMap::from([(name.into(), layer)]),
            metadata: Metadata::new(),
        }
    }

    pub fn layers(&self) -> &BTreeMap<String, Layer> {
        &self.layers
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Common `(width, height)` of the layers, or `None` for an empty image.
    pub fn res(&self) -> Option<Res> {
        self.layers.values().next().map(Layer::res)
    }

    /// Layer names matching the whitespace separated glob `patterns`.
    pub fn match_layer_names(&self, patterns: &str) -> Vec<String> {
        match_layer_names(self.layers.keys(), patterns)
    }

    /// A new image sharing whatever is not replaced.
    pub fn copy(
        &self,
        layers: Option<BTreeMap<String, Layer>>,
        metadata: Option<Metadata>,
    ) -> ImagecatResult<Self> {
        Self::with_metadata(
            layers.unwrap_or_else(|| self.layers.clone()),
            metadata.unwrap_or_else(|| self.metadata.clone()),
        )
    }

    /// This image plus (or with a replaced) `name` layer.
    pub fn with_layer(mut self, name: impl Into<String>, layer: Layer) -> ImagecatResult<Self> {
        let name = name.into();
        if let Some((other, existing)) = self
            .layers
            .iter()
            .find(|(n, l)| **n != name && l.res() != layer.res())
        {
            return Err(ImagecatError::validation(format!(
                "layer '{name}' is {}x{}, layer '{other}' is {}x{}",
                layer.res().0,
                layer.res().1,
                existing.res().0,
                existing.res().1
            )));
        }
        self.layers.insert(name, layer);
        Ok(self)
    }

    pub fn into_parts(self) -> (BTreeMap<String, Layer>, Metadata) {
        (self.layers, self.metadata)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Image(")?;
        for (i, (name, layer)) in self.layers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {layer:?}")?;
        }
        f.write_str(")")
    }
}
