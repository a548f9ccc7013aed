//! Lengths expressed in absolute pixels or relative to a reference resolution.
//!
//! Every geometric operator parameter (positions, pivots, radii, sizes, font sizes) is a
//! [`Length`], so pipelines can be written once and reused at any resolution:
//!
//! - `12` or `"12px"` is twelve pixels,
//! - `"0.5w"` is half the reference width, `"1h"` the full reference height,
//! - `"2min"` / `"2max"` scale the smaller / larger reference dimension.

use std::{fmt, str::FromStr};

use crate::foundation::core::Res;
use crate::foundation::error::{ImagecatError, ImagecatResult};

/// Unit of measure for a [`Length`]. Parsing is case-insensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Width,
    Height,
    Min,
    Max,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Width => "w",
            Self::Height => "h",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl FromStr for Unit {
    type Err = ImagecatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "px" | "pixel" | "pixels" => Ok(Self::Px),
            "w" | "width" => Ok(Self::Width),
            "h" | "height" => Ok(Self::Height),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(ImagecatError::format(format!(
                "unknown unit of measure: '{other}'"
            ))),
        }
    }
}

/// A number paired with a unit of measure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub const fn px(value: f64) -> Self {
        Self::new(value, Unit::Px)
    }

    pub const fn width(fraction: f64) -> Self {
        Self::new(fraction, Unit::Width)
    }

    pub const fn height(fraction: f64) -> Self {
        Self::new(fraction, Unit::Height)
    }

    /// Convert to pixels against a `(width, height)` reference.
    pub fn resolve(self, size: Res) -> f64 {
        let (w, h) = (size.0 as f64, size.1 as f64);
        match self.unit {
            Unit::Px => self.value,
            Unit::Width => self.value * w,
            Unit::Height => self.value * h,
            Unit::Min => self.value * w.min(h),
            Unit::Max => self.value * w.max(h),
        }
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::px(0.0)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.symbol())
    }
}

impl FromStr for Length {
    type Err = ImagecatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic() || c == '%')
            .filter(|&i| i > 0)
            .ok_or_else(|| {
                ImagecatError::format(format!("'{s}' is not a <number><unit> length"))
            })?;
        let (number, unit) = trimmed.split_at(split);
        if !unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
            return Err(ImagecatError::format(format!(
                "'{s}' is not a <number><unit> length"
            )));
        }
        let value = number.trim().parse::<f64>().map_err(|_| {
            ImagecatError::format(format!("'{number}' in length '{s}' is not a number"))
        })?;
        Ok(Self::new(value, unit.parse()?))
    }
}

/// Anything that can be read as a [`Length`]: plain numbers (pixels), `"<number><unit>"`
/// strings, and `(number, unit)` pairs.
pub trait IntoLength {
    fn into_length(self) -> ImagecatResult<Length>;
}

impl IntoLength for Length {
    fn into_length(self) -> ImagecatResult<Length> {
        Ok(self)
    }
}

impl IntoLength for f64 {
    fn into_length(self) -> ImagecatResult<Length> {
        Ok(Length::px(self))
    }
}

impl IntoLength for f32 {
    fn into_length(self) -> ImagecatResult<Length> {
        Ok(Length::px(f64::from(self)))
    }
}

impl IntoLength for i32 {
    fn into_length(self) -> ImagecatResult<Length> {
        Ok(Length::px(f64::from(self)))
    }
}

impl IntoLength for u32 {
    fn into_length(self) -> ImagecatResult<Length> {
        Ok(Length::px(f64::from(self)))
    }
}

impl IntoLength for &str {
    fn into_length(self) -> ImagecatResult<Length> {
        self.parse()
    }
}

impl IntoLength for &String {
    fn into_length(self) -> ImagecatResult<Length> {
        self.parse()
    }
}

impl IntoLength for String {
    fn into_length(self) -> ImagecatResult<Length> {
        self.parse()
    }
}

impl IntoLength for (f64, &str) {
    fn into_length(self) -> ImagecatResult<Length> {
        Ok(Length::new(self.0, self.1.parse()?))
    }
}

impl IntoLength for (f64, Unit) {
    fn into_length(self) -> ImagecatResult<Length> {
        Ok(Length::new(self.0, self.1))
    }
}

/// Convert `value` to pixels, using `size` as the `(width, height)` reference for relative
/// units.
pub fn length(value: impl IntoLength, size: Res) -> ImagecatResult<f64> {
    Ok(value.into_length()?.resolve(size))
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f64),
    Text(String),
    Pair(f64, String),
}

impl serde::Serialize for Length {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.unit {
            Unit::Px => serializer.serialize_f64(self.value),
            _ => serializer.collect_str(self),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Length {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = match LengthRepr::deserialize(deserializer)? {
            LengthRepr::Number(v) => v.into_length(),
            LengthRepr::Text(s) => s.into_length(),
            LengthRepr::Pair(v, unit) => (v, unit.as_str()).into_length(),
        };
        repr.map_err(serde::de::Error::custom)
    }
}
