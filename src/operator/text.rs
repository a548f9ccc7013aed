use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::Context;

use crate::{
    data::{image::Image, layer::Layer, role::Role, samples::Samples},
    foundation::{
        core::XY,
        error::{ImagecatError, ImagecatResult},
    },
    operator::inputs::NamedInputs,
    units::Length,
};

/// Parameters for [`text`].
#[derive(Clone, Debug, PartialEq)]
pub struct TextParams {
    pub string: String,
    pub layer: String,
    pub res: [usize; 2],
    /// Anchor point, with +Y pointing up.
    pub position: XY<Length>,
    pub fontsize: Length,
    /// Two characters: horizontal `l`/`m`/`r`, then vertical `a`/`t`/`m`/`s`/`b`/`d`
    /// (ascender, top, middle, baseline, bottom, descender).
    pub anchor: String,
    /// Font family name or path to a font file; sans-serif when absent.
    pub fontname: Option<String>,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            string: "Text!".to_string(),
            layer: "A".to_string(),
            res: [256, 256],
            position: XY::new(Length::width(0.5), Length::height(0.5)),
            fontsize: Length::height(0.33),
            anchor: "mm".to_string(),
            fontname: None,
        }
    }
}

impl TextParams {
    pub fn from_inputs(inputs: &NamedInputs) -> ImagecatResult<Self> {
        let d = Self::default();
        Ok(Self {
            string: inputs.optional("string", d.string)?,
            layer: inputs.optional("layer", d.layer)?,
            res: inputs.optional("res", d.res)?,
            position: inputs.optional("position", d.position)?,
            fontsize: inputs.optional("fontsize", d.fontsize)?,
            anchor: inputs.optional("anchor", d.anchor)?,
            fontname: inputs.optional("fontname", d.fontname)?,
        })
    }
}

/// Render `params.string` into a single alpha layer.
#[tracing::instrument(skip_all, fields(string = %params.string))]
pub fn text(params: &TextParams) -> ImagecatResult<Image> {
    let [width, height] = params.res;
    if width == 0 || height == 0 {
        return Err(ImagecatError::validation("text resolution must be positive"));
    }
    let (Ok(pixmap_width), Ok(pixmap_height)) = (u32::try_from(width), u32::try_from(height))
    else {
        return Err(ImagecatError::validation(format!(
            "text resolution {width}x{height} is too large"
        )));
    };
    let (text_anchor, baseline) = parse_anchor(&params.anchor)?;
    let res = (width, height);
    let x = params.position.x.resolve(res);
    let y = height as f64 - params.position.y.resolve(res);
    let size = params.fontsize.resolve(res).trunc();
    if size.is_nan() || size <= 0.0 {
        return Err(ImagecatError::validation(format!(
            "font size must be positive, received {size}"
        )));
    }

    let (fontdb, family) = font_database(params.fontname.as_deref())?;
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><text x="{x}" y="{y}" font-size="{size}" font-family="{family}" text-anchor="{text_anchor}" dominant-baseline="{baseline}" fill="white">{}</text></svg>"#,
        escape(&params.string),
        family = escape(&family),
    );
    let opts = usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(&svg, &opts).context("parse text svg")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(pixmap_width, pixmap_height).ok_or_else(|| {
        ImagecatError::validation(format!("cannot allocate a {width}x{height} text pixmap"))
    })?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    let alpha: Vec<f32> = pixmap
        .data()
        .chunks_exact(4)
        .map(|px| f32::from(px[3]) / 255.0)
        .collect();
    let data = Samples::new(height, width, 1, alpha)?;
    Ok(Image::single(
        params.layer.clone(),
        Layer::new(data, Role::Alpha)?,
    ))
}

fn parse_anchor(anchor: &str) -> ImagecatResult<(&'static str, &'static str)> {
    let mut chars = anchor.chars();
    let (Some(h), Some(v), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(ImagecatError::validation(format!(
            "text anchor must be two characters, received '{anchor}'"
        )));
    };
    let horizontal = match h {
        'l' => "start",
        'm' => "middle",
        'r' => "end",
        other => {
            return Err(ImagecatError::validation(format!(
                "unknown horizontal text anchor '{other}'"
            )));
        }
    };
    let vertical = match v {
        'a' => "text-before-edge",
        't' => "hanging",
        'm' => "central",
        's' => "alphabetic",
        'b' => "ideographic",
        'd' => "text-after-edge",
        other => {
            return Err(ImagecatError::validation(format!(
                "unknown vertical text anchor '{other}'"
            )));
        }
    };
    Ok((horizontal, vertical))
}

fn system_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts");
            Arc::new(db)
        })
        .clone()
}

/// System fonts, plus `fontname` when it names a font file. Returns the family to request.
fn font_database(
    fontname: Option<&str>,
) -> ImagecatResult<(Arc<usvg::fontdb::Database>, String)> {
    let mut db = system_fonts();
    let Some(fontname) = fontname else {
        return Ok((db, "sans-serif".to_string()));
    };
    let path = Path::new(fontname);
    let is_font_file = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"));
    if !is_font_file {
        return Ok((db, fontname.to_string()));
    }

    let bytes = std::fs::read(path).with_context(|| format!("read font file '{fontname}'"))?;
    let db_mut = Arc::make_mut(&mut db);
    let before = db_mut.len();
    db_mut.load_font_data(bytes);
    let family = db_mut
        .faces()
        .skip(before)
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        .ok_or_else(|| ImagecatError::format(format!("'{fontname}' contains no usable font")))?;
    Ok((db, family))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
