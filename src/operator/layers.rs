//! Operators that select, rename, merge, split and shift layers without changing their
//! sample values.

use std::collections::BTreeMap;

use crate::{
    data::{image::Image, layer::Layer, role::Role, samples::Samples},
    foundation::{
        core::XY,
        error::{ImagecatError, ImagecatResult},
    },
    operator::inputs::NamedInputs,
    units::Length,
};

/// Parameters for [`offset`].
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetParams {
    pub layers: String,
    /// Shift along x and y, with +Y pointing up.
    pub offset: XY<Length>,
}

impl Default for OffsetParams {
    fn default() -> Self {
        Self {
            layers: "*".to_string(),
            offset: XY::new(Length::width(0.5), Length::height(0.5)),
        }
    }
}

impl OffsetParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            layers: inputs.optional("layers", d.layers)?,
            offset: inputs.optional("offset", d.offset)?,
        })
    }
}

/// Roll the matching layers with wrap-around. Only the shifted layers appear in the output.
pub fn offset(image: &Image, params: &OffsetParams) -> ImagecatResult<Image> {
    let mut layers = BTreeMap::new();
    for name in image.match_layer_names(&params.layers) {
        let Some(layer) = image.layer(&name) else {
            continue;
        };
        let dx = params.offset.x.resolve(layer.res()).trunc() as isize;
        let dy = -(params.offset.y.resolve(layer.res()).trunc() as isize);
        layers.insert(name, layer.with_data(roll(layer.data(), dx, dy)?)?);
    }
    Image::new(layers)
}

/// Shift `src` right by `dx` columns and down by `dy` rows, wrapping at the edges.
pub fn roll(src: &Samples, dx: isize, dy: isize) -> ImagecatResult<Samples> {
    let (rows, cols) = (src.rows() as isize, src.cols() as isize);
    let rolled = Samples::from_fn(src.rows(), src.cols(), src.channels(), |r, c, ch| {
        let sr = (r as isize - dy).rem_euclid(rows) as usize;
        let sc = (c as isize - dx).rem_euclid(cols) as usize;
        src.get(sr, sc, ch)
    })?;
    Ok(rolled.with_sample_type(src.sample_type()))
}

/// Rename layers according to `changes` (old name to new name). Layers not named in
/// `changes` keep their names; metadata is dropped.
pub fn rename(image: &Image, changes: &BTreeMap<String, String>) -> ImagecatResult<Image> {
    let layers = image
        .layers()
        .iter()
        .map(|(name, layer)| {
            let name = changes.get(name).unwrap_or(name).clone();
            (name, layer.clone())
        })
        .collect();
    Image::new(layers)
}

/// Remove the layers matching `patterns`.
pub fn delete(image: &Image, patterns: &str) -> ImagecatResult<Image> {
    let remove = image.match_layer_names(patterns);
    let layers = image
        .layers()
        .iter()
        .filter(|(name, _)| !remove.contains(name))
        .map(|(name, layer)| (name.clone(), layer.clone()))
        .collect();
    Image::new(layers)
}

/// Union of the layers of `images`, taken in order; later layers replace earlier ones with
/// the same name.
pub fn merge<'a>(images: impl IntoIterator<Item = &'a Image>) -> ImagecatResult<Image> {
    let mut layers = BTreeMap::new();
    for image in images {
        for (name, layer) in image.layers() {
            layers.insert(name.clone(), layer.clone());
        }
    }
    Image::new(layers)
}

/// A reference to source channels for [`remap`]: a whole layer, or one channel of a layer
/// by index or name.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Layer(String),
    Index(String, usize),
    Channel(String, String),
}

/// How one output layer of [`remap`] is assembled.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct RemapLayer {
    pub selection: Vec<Selection>,
    #[serde(default)]
    pub role: Role,
}

/// Build new layers by stacking selected channels of `image`.
pub fn remap(image: &Image, mapping: &BTreeMap<String, RemapLayer>) -> ImagecatResult<Image> {
    let mut layers = BTreeMap::new();
    for (name, entry) in mapping {
        let mut sources: Vec<(&Samples, usize)> = Vec::new();
        for selection in &entry.selection {
            match selection {
                Selection::Layer(layer) => {
                    let data = lookup(image, layer)?.data();
                    sources.extend((0..data.channels()).map(|ch| (data, ch)));
                }
                Selection::Index(layer, index) => {
                    let data = lookup(image, layer)?.data();
                    if *index >= data.channels() {
                        return Err(ImagecatError::lookup(format!(
                            "layer '{layer}' has no channel {index}"
                        )));
                    }
                    sources.push((data, *index));
                }
                Selection::Channel(layer, channel) => {
                    let found = lookup(image, layer)?;
                    let index = found
                        .channel_names()
                        .iter()
                        .position(|c| c.eq_ignore_ascii_case(channel))
                        .ok_or_else(|| {
                            ImagecatError::lookup(format!(
                                "layer '{layer}' has no channel '{channel}'"
                            ))
                        })?;
                    sources.push((found.data(), index));
                }
            }
        }
        let Some((first, _)) = sources.first() else {
            return Err(ImagecatError::validation(format!(
                "remapped layer '{name}' selects no channels"
            )));
        };
        let data = Samples::from_fn(first.rows(), first.cols(), sources.len(), |r, c, ch| {
            let (src, index) = sources[ch];
            src.get(r, c, index)
        })?;
        layers.insert(name.clone(), Layer::new(data, entry.role)?);
    }
    Image::new(layers)
}

fn lookup<'a>(image: &'a Image, name: &str) -> ImagecatResult<&'a Layer> {
    image
        .layer(name)
        .ok_or_else(|| ImagecatError::lookup(format!("image has no layer '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> Image {
        Image::new(BTreeMap::from([
            (
                "C".to_string(),
                Layer::new(
                    Samples::from_fn(2, 3, 3, |r, c, ch| (r * 100 + c * 10 + ch) as f32).unwrap(),
                    Role::Rgb,
                )
                .unwrap(),
            ),
            (
                "A".to_string(),
                Layer::new(Samples::filled(2, 3, &[0.5]).unwrap(), Role::Alpha).unwrap(),
            ),
        ]))
        .unwrap()
    }

    #[test]
    fn roll_wraps_and_y_points_up() {
        let src = Samples::from_fn(3, 3, 1, |r, c, _| (r * 3 + c) as f32).unwrap();
        let out = roll(&src, 1, 0).unwrap();
        assert_eq!(out.get(0, 0, 0), 2.0);
        assert_eq!(out.get(0, 1, 0), 0.0);

        let image = Image::single("A", Layer::new(src.clone(), Role::Alpha).unwrap());
        let params = OffsetParams {
            layers: "*".to_string(),
            offset: XY::new(Length::px(0.0), Length::px(1.0)),
        };
        let out = offset(&image, &params).unwrap();
        // Moving up one row: the second source row lands on the first.
        assert_eq!(out.layer("A").unwrap().data().get(0, 0, 0), 3.0);
    }

    #[test]
    fn rename_and_delete_share_buffers() {
        let image = sample_image();
        let renamed = rename(
            &image,
            &BTreeMap::from([("C".to_string(), "color".to_string())]),
        )
        .unwrap();
        assert_eq!(renamed.match_layer_names("*"), ["A", "color"]);
        assert!(renamed.layer("color").unwrap().data().shares_buffer(image.layer("C").unwrap().data()));

        let kept = delete(&image, "C").unwrap();
        assert_eq!(kept.match_layer_names("*"), ["A"]);
    }

    #[test]
    fn later_images_win_on_merge() {
        let a = sample_image();
        let b = Image::single(
            "A",
            Layer::new(Samples::filled(2, 3, &[1.0]).unwrap(), Role::Matte).unwrap(),
        );
        let merged = merge([&a, &b]).unwrap();
        assert_eq!(merged.layer("A").unwrap().role(), Role::Matte);
        assert!(merged.layer("C").is_some());
    }

    #[test]
    fn merge_rejects_mixed_resolutions() {
        let a = sample_image();
        let b = Image::single(
            "B",
            Layer::new(Samples::zeros(5, 5, 1).unwrap(), Role::None).unwrap(),
        );
        assert!(merge([&a, &b]).is_err());
    }

    #[test]
    fn remap_stacks_channels() {
        let image = sample_image();
        let mapping: BTreeMap<String, RemapLayer> = serde_json::from_str(
            r#"{ "C": {"selection": [["C", "b"], ["C", 1], ["C", "r"], "A"], "role": "rgba"} }"#,
        )
        .unwrap();
        let out = remap(&image, &mapping).unwrap();
        let c = out.layer("C").unwrap();
        assert_eq!(c.role(), Role::Rgba);
        assert_eq!(c.data().pixel(1, 2), &[122.0, 121.0, 120.0, 0.5]);

        let bad: BTreeMap<String, RemapLayer> =
            serde_json::from_str(r#"{ "X": {"selection": [["C", "q"]]} }"#).unwrap();
        assert!(matches!(remap(&image, &bad), Err(ImagecatError::Lookup(_))));
    }
}
