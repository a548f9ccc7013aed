use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    data::{image::Image, layer::Layer},
    foundation::error::{ImagecatError, ImagecatResult},
};

/// One named operator input: an upstream image or a parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Image(Arc<Image>),
    Value(serde_json::Value),
}

impl From<Image> for Input {
    fn from(v: Image) -> Self {
        Self::Image(Arc::new(v))
    }
}

impl From<Arc<Image>> for Input {
    fn from(v: Arc<Image>) -> Self {
        Self::Image(v)
    }
}

impl From<serde_json::Value> for Input {
    fn from(v: serde_json::Value) -> Self {
        Self::Value(v)
    }
}

/// The bag of inputs an operator runs against, keyed by input name.
///
/// Parameters are coerced into their typed form through serde when read, so every operator
/// validates its parameters once, up front.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NamedInputs {
    task: String,
    inputs: BTreeMap<String, Input>,
}

impl NamedInputs {
    /// An empty bag for the task named `task`; the name only appears in error messages.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            inputs: BTreeMap::new(),
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn insert(&mut self, name: impl Into<String>, input: impl Into<Input>) {
        self.inputs.insert(name.into(), input.into());
    }

    pub fn with(mut self, name: impl Into<String>, input: impl Into<Input>) -> Self {
        self.insert(name, input);
        self
    }

    /// Add a parameter from any serializable value.
    pub fn with_value(
        self,
        name: impl Into<String>,
        value: impl serde::Serialize,
    ) -> ImagecatResult<Self> {
        let name = name.into();
        let value = serde_json::to_value(value).map_err(|e| {
            ImagecatError::validation(format!("input '{name}' cannot be serialized: {e}"))
        })?;
        Ok(self.with(name, value))
    }

    pub fn get(&self, name: &str) -> Option<&Input> {
        self.inputs.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    /// The parameter `name` coerced to `T`, or `default` when absent.
    pub fn optional<T: DeserializeOwned>(&self, name: &str, default: T) -> ImagecatResult<T> {
        match self.inputs.get(name) {
            None => Ok(default),
            Some(input) => self.coerce(name, input),
        }
    }

    /// The parameter `name` coerced to `T`; a lookup error when absent.
    pub fn require<T: DeserializeOwned>(&self, name: &str) -> ImagecatResult<T> {
        match self.inputs.get(name) {
            None => Err(self.missing(name)),
            Some(input) => self.coerce(name, input),
        }
    }

    pub fn optional_image(&self, name: &str) -> ImagecatResult<Option<&Image>> {
        match self.inputs.get(name) {
            None => Ok(None),
            Some(Input::Image(image)) => Ok(Some(image.as_ref())),
            Some(Input::Value(_)) => Err(ImagecatError::validation(format!(
                "task '{}' expected an image for input '{name}', received a parameter value",
                self.task
            ))),
        }
    }

    pub fn require_image(&self, name: &str) -> ImagecatResult<&Image> {
        self.optional_image(name)?.ok_or_else(|| self.missing(name))
    }

    /// Every image input, in input-name order.
    pub fn images(&self) -> impl Iterator<Item = (&str, &Image)> {
        self.inputs.iter().filter_map(|(name, input)| match input {
            Input::Image(image) => Some((name.as_str(), image.as_ref())),
            Input::Value(_) => None,
        })
    }

    /// Layer `layer` of image input `name`; lookup errors when either is missing.
    pub fn require_layer(&self, name: &str, layer: &str) -> ImagecatResult<&Layer> {
        let image = self.require_image(name)?;
        image.layer(layer).ok_or_else(|| {
            ImagecatError::lookup(format!(
                "task '{}' input '{name}' has no layer '{layer}'",
                self.task
            ))
        })
    }

    /// Layer `layer` of image input `name` when the input is present, optionally checked for a
    /// channel count.
    pub fn optional_layer(
        &self,
        name: &str,
        layer: &str,
        channels: Option<usize>,
    ) -> ImagecatResult<Option<&Layer>> {
        if self.optional_image(name)?.is_none() {
            return Ok(None);
        }
        let found = self.require_layer(name, layer)?;
        if let Some(expected) = channels
            && found.data().channels() != expected
        {
            return Err(ImagecatError::validation(format!(
                "task '{}' input '{name}' layer '{layer}' must have {expected} channel(s), received {}",
                self.task,
                found.data().channels()
            )));
        }
        Ok(Some(found))
    }

    fn coerce<T: DeserializeOwned>(&self, name: &str, input: &Input) -> ImagecatResult<T> {
        match input {
            Input::Value(v) => serde_json::from_value(v.clone()).map_err(|e| {
                ImagecatError::validation(format!(
                    "task '{}' input '{name}' is invalid: {e}",
                    self.task
                ))
            }),
            Input::Image(_) => Err(ImagecatError::validation(format!(
                "task '{}' expected a parameter for input '{name}', received an image",
                self.task
            ))),
        }
    }

    fn missing(&self, name: &str) -> ImagecatError {
        ImagecatError::lookup(format!(
            "task '{}' is missing required input '{name}'",
            self.task
        ))
    }
}
