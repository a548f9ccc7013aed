//! Extracting ID mattes from Cryptomatte-encoded images.
//!
//! A Cryptomatte stores, for every pixel, a ranked list of `(id, coverage)` pairs spread over
//! single-channel layers named `<name><rank>.<channel>`: each consecutive pair of channels
//! (`r`/`g`, then `b`/`a`) is one rank. Ids are 32-bit hashes of object names, stored as the
//! bit pattern of an `f32`.

use crate::{
    data::{image::Image, layer::Layer, role::Role, samples::Samples},
    foundation::{
        error::{ImagecatError, ImagecatResult},
        math::{Murmur3x86_32, Rng64},
    },
    operator::inputs::NamedInputs,
};

/// Parameters for [`decode`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodeParams {
    /// Paint matched ids with per-id colors instead of accumulating coverage.
    pub clown: bool,
    pub layer: String,
    pub mattes: Vec<String>,
    /// Which Cryptomatte to read when the image carries more than one.
    pub cryptomatte: Option<String>,
}

impl DecodeParams {
    pub fn new() -> Self {
        Self {
            layer: "M".to_string(),
            ..Self::default()
        }
    }

    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::new();
        Ok(Self {
            clown: inputs.optional("clown", d.clown)?,
            layer: inputs.optional("layer", d.layer)?,
            mattes: inputs.optional("mattes", d.mattes)?,
            cryptomatte: inputs.optional("cryptomatte", d.cryptomatte)?,
        })
    }
}

/// Cryptomatte id of `name`: MurmurHash3 (x86, 32-bit, seed 0) of its UTF-8 bytes, adjusted
/// so the bit pattern is never an `f32` denormal, infinity or NaN.
pub fn hash_id(name: &str) -> f32 {
    let mut bits = Murmur3x86_32::new(0).hash(name.as_bytes());
    let exponent = (bits >> 23) & 0xff;
    if exponent == 0 || exponent == 0xff {
        bits ^= 1 << 23;
    }
    f32::from_bits(bits)
}

/// Names of the Cryptomattes described in `image`'s metadata, filtered to `requested` when
/// given. Exactly one must remain.
pub fn select_cryptomatte(image: &Image, requested: Option<&str>) -> ImagecatResult<String> {
    let names: Vec<&str> = image
        .metadata()
        .iter()
        .filter(|(key, _)| is_name_key(key))
        .filter_map(|(_, value)| value.as_str())
        .filter(|name| requested.is_none_or(|r| r == *name))
        .collect();
    match names.as_slice() {
        [] => Err(ImagecatError::lookup(match requested {
            Some(r) => format!("no Cryptomatte named '{r}' was found"),
            None => "no Cryptomatte was found in the image metadata".to_string(),
        })),
        [name] => Ok((*name).to_string()),
        many => Err(ImagecatError::lookup(format!(
            "a specific Cryptomatte must be chosen from {many:?}"
        ))),
    }
}

/// `cryptomatte/<7 hex digits>/name`
fn is_name_key(key: &str) -> bool {
    key.strip_prefix("cryptomatte/")
        .and_then(|rest| rest.strip_suffix("/name"))
        .is_some_and(|id| id.len() == 7 && id.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Channel order within a rank layer, or `None` for names that are not a rank channel.
fn channel_index(channel: &str) -> Option<usize> {
    match channel.to_ascii_lowercase().as_str() {
        "r" | "red" => Some(0),
        "g" | "green" => Some(1),
        "b" | "blue" => Some(2),
        "a" | "alpha" => Some(3),
        _ => None,
    }
}

/// `(prefix, channel index)` for names of the form `<cryptomatte><2 digits>.<channel>`.
fn rank_key<'a>(cryptomatte: &str, layer: &'a str) -> Option<(&'a str, usize)> {
    let (prefix, channel) = layer.rsplit_once('.')?;
    if prefix.len() != cryptomatte.len() + 2
        || !prefix.is_char_boundary(cryptomatte.len())
        || !prefix[..cryptomatte.len()].eq_ignore_ascii_case(cryptomatte)
        || !prefix[cryptomatte.len()..].bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some((prefix, channel_index(channel)?))
}

/// `(id, coverage)` layer pairs of `cryptomatte`, best rank first.
pub fn rank_layers<'a>(
    image: &'a Image,
    cryptomatte: &str,
) -> ImagecatResult<Vec<(&'a Layer, &'a Layer)>> {
    let mut channels: Vec<((&str, usize), &Layer)> = image
        .layers()
        .iter()
        .filter_map(|(name, layer)| Some((rank_key(cryptomatte, name)?, layer)))
        .collect();
    channels.sort_by(|(a, _), (b, _)| a.cmp(b));
    if channels.is_empty() {
        return Err(ImagecatError::data(format!(
            "no layers were found for Cryptomatte '{cryptomatte}'"
        )));
    }
    if let Some(((rank, _), _)) = channels.iter().find(|(_, l)| l.data().channels() == 0) {
        return Err(ImagecatError::data(format!(
            "Cryptomatte rank '{rank}' has a layer with no channels"
        )));
    }
    Ok(channels
        .chunks_exact(2)
        .map(|pair| (pair[0].1, pair[1].1))
        .collect())
}

/// Extract the union of `params.mattes` from the Cryptomatte in `image`.
///
/// Regular mattes sum coverage over every rank and are never clamped. Clown mattes look at
/// the best rank only and paint each matte with a color seeded by its id.
#[tracing::instrument(skip(image))]
pub fn decode(image: &Image, params: &DecodeParams) -> ImagecatResult<Image> {
    let cryptomatte = select_cryptomatte(image, params.cryptomatte.as_deref())?;
    let ranks = rank_layers(image, &cryptomatte)?;
    let Some((top_ids, _)) = ranks.first() else {
        return Err(ImagecatError::data(format!(
            "Cryptomatte '{cryptomatte}' has no complete rank"
        )));
    };
    let (cols, rows) = top_ids.res();
    let ids: Vec<f32> = params.mattes.iter().map(|m| hash_id(m)).collect();
    tracing::debug!(cryptomatte, ranks = ranks.len(), "decoding");

    let layer = if params.clown {
        let colors: Vec<[f32; 3]> = ids.iter().map(|&id| clown_color(id)).collect();
        let top = top_ids.data();
        let mut data = vec![0.0f32; rows * cols * 3];
        for r in 0..rows {
            for c in 0..cols {
                let id = top.get(r, c, 0);
                if let Some(k) = ids.iter().position(|&m| m == id) {
                    let o = (r * cols + c) * 3;
                    data[o..o + 3].copy_from_slice(&colors[k]);
                }
            }
        }
        Layer::new(Samples::new(rows, cols, 3, data)?, Role::Rgb)?
    } else {
        let mut data = vec![0.0f32; rows * cols];
        for (rank_ids, rank_coverage) in &ranks {
            let (rank_ids, rank_coverage) = (rank_ids.data(), rank_coverage.data());
            for r in 0..rows {
                for c in 0..cols {
                    let id = rank_ids.get(r, c, 0);
                    let hits = ids.iter().filter(|&&m| m == id).count();
                    if hits > 0 {
                        data[r * cols + c] += hits as f32 * rank_coverage.get(r, c, 0);
                    }
                }
            }
        }
        let data = Samples::new(rows, cols, 1, data)?.with_sample_type(top_ids.sample_type());
        Layer::new(data, Role::Matte)?
    };
    Ok(Image::single(params.layer.clone(), layer))
}

fn clown_color(id: f32) -> [f32; 3] {
    let mut rng = Rng64::new(u64::from(id.to_bits()));
    [(); 3].map(|_| rng.next_f64_01() as f32)
}
