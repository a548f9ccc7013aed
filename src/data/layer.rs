use std::fmt;

use crate::{
    data::{
        role::Role,
        samples::{SampleType, Samples},
    },
    foundation::{
        core::Res,
        error::{ImagecatError, ImagecatResult},
    },
};

/// One named channel group of an [`Image`](crate::Image): a sample array plus its [`Role`].
///
/// Layers are values. Operators derive new layers with [`Layer::copy`] instead of writing
/// into an existing one, so a layer received from upstream is never modified.
#[derive(Clone, PartialEq)]
pub struct Layer {
    data: Samples,
    role: Role,
}

impl Layer {
    pub fn new(data: Samples, role: Role) -> ImagecatResult<Self> {
        if let Some(depth) = role.depth()
            && data.channels() != depth
        {
            return Err(ImagecatError::validation(format!(
                "{role:?} layers need {depth} channels, received {}",
                data.channels()
            )));
        }
        Ok(Self { data, role })
    }

    pub fn data(&self) -> &Samples {
        &self.data
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Resolution as `(width, height)`, i.e. `(columns, rows)`.
    pub fn res(&self) -> Res {
        (self.data.cols(), self.data.rows())
    }

    /// `[rows, cols, channels]`.
    pub fn shape(&self) -> [usize; 3] {
        self.data.shape()
    }

    pub fn sample_type(&self) -> SampleType {
        self.data.sample_type()
    }

    /// A new layer sharing whatever is not replaced.
    pub fn copy(&self, data: Option<Samples>, role: Option<Role>) -> ImagecatResult<Self> {
        Self::new(
            data.unwrap_or_else(|| self.data.clone()),
            role.unwrap_or(self.role),
        )
    }

    /// A new layer with replaced samples, keeping this layer's role and sample type.
    pub fn with_data(&self, data: Samples) -> ImagecatResult<Self> {
        let data = data.with_sample_type(self.sample_type());
        self.copy(Some(data), None)
    }

    /// Per-channel names: the role's canonical names, or indices for [`Role::None`].
    pub fn channel_names(&self) -> Vec<String> {
        match self.role.channels() {
            Some(names) => names.iter().map(|s| (*s).to_string()).collect(),
            None if self.data.channels() == 1 => vec![String::new()],
            None => (0..self.data.channels()).map(|i| i.to_string()).collect(),
        }
    }

    /// Channel names as stored on disk: `layer.component`, or the bare layer name when the
    /// component name is empty.
    pub fn flat_channel_names(&self, layer_name: &str) -> Vec<String> {
        self.channel_names()
            .into_iter()
            .map(|component| {
                if component.is_empty() {
                    layer_name.to_string()
                } else {
                    format!("{layer_name}.{component}")
                }
            })
            .collect()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [rows, cols, channels] = self.shape();
        write!(
            f,
            "Layer({:?} {cols}x{rows}x{channels} {:?})",
            self.role,
            self.sample_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_depth_is_enforced() {
        for role in Role::ALL {
            let Some(depth) = role.depth() else {
                continue;
            };
            assert!(Layer::new(Samples::zeros(2, 3, depth).unwrap(), role).is_ok());
            let err = Layer::new(Samples::zeros(2, 3, depth + 1).unwrap(), role).unwrap_err();
            assert!(matches!(err, ImagecatError::Validation(_)));
        }
        assert!(Layer::new(Samples::zeros(2, 3, 7).unwrap(), Role::None).is_ok());
    }

    #[test]
    fn res_is_width_by_height() {
        let layer = Layer::new(Samples::zeros(2, 3, 3).unwrap(), Role::Rgb).unwrap();
        assert_eq!(layer.res(), (3, 2));
        assert_eq!(layer.shape(), [2, 3, 3]);
    }

    #[test]
    fn copy_shares_samples_unless_replaced() {
        let layer = Layer::new(Samples::zeros(2, 2, 1).unwrap(), Role::Alpha).unwrap();
        let same = layer.copy(None, Some(Role::Matte)).unwrap();
        assert!(same.data().shares_buffer(layer.data()));
        assert_eq!(same.role(), Role::Matte);

        let replaced = layer.copy(Some(Samples::filled(2, 2, &[1.0]).unwrap()), None).unwrap();
        assert!(!replaced.data().shares_buffer(layer.data()));
        assert_eq!(replaced.role(), Role::Alpha);

        assert!(layer.copy(Some(Samples::zeros(2, 2, 3).unwrap()), None).is_err());
    }

    #[test]
    fn with_data_keeps_sample_type() {
        let layer = Layer::new(
            Samples::zeros(1, 1, 1).unwrap().with_sample_type(SampleType::F16),
            Role::Luminance,
        )
        .unwrap();
        let next = layer.with_data(Samples::filled(1, 1, &[0.5]).unwrap()).unwrap();
        assert_eq!(next.sample_type(), SampleType::F16);
    }

    #[test]
    fn flat_names_follow_role() {
        let rgb = Layer::new(Samples::zeros(1, 1, 3).unwrap(), Role::Rgb).unwrap();
        assert_eq!(rgb.flat_channel_names("C"), ["C.r", "C.g", "C.b"]);
        let alpha = Layer::new(Samples::zeros(1, 1, 1).unwrap(), Role::Alpha).unwrap();
        assert_eq!(alpha.flat_channel_names("A"), ["A"]);
        let generic = Layer::new(Samples::zeros(1, 1, 2).unwrap(), Role::None).unwrap();
        assert_eq!(generic.flat_channel_names("N"), ["N.0", "N.1"]);
    }
}
