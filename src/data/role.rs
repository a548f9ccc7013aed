/// Semantic description of how a layer's samples should be interpreted.
///
/// A role fixes the number of channels a layer must carry (see [`Role::depth`]) and the
/// canonical channel names used when flattening layers into file-format channels (see
/// [`Role::channels`]).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// General purpose data with no fixed channel count.
    #[default]
    None,
    Rgb,
    RedGreen,
    GreenBlue,
    RedBlue,
    Red,
    Green,
    Blue,
    /// Opacity.
    Alpha,
    /// Selection or coverage mask.
    Matte,
    /// Intensity.
    Luminance,
    /// Distance from the viewer.
    Depth,
    Rgba,
    /// Texture coordinates.
    Uv,
    /// Positions.
    Xyz,
    Velocity,
    Normal,
}

impl Role {
    pub const ALL: [Role; 17] = [
        Role::None,
        Role::Rgb,
        Role::RedGreen,
        Role::GreenBlue,
        Role::RedBlue,
        Role::Red,
        Role::Green,
        Role::Blue,
        Role::Alpha,
        Role::Matte,
        Role::Luminance,
        Role::Depth,
        Role::Rgba,
        Role::Uv,
        Role::Xyz,
        Role::Velocity,
        Role::Normal,
    ];

    /// Required channel count, or `None` when the role places no constraint.
    pub fn depth(self) -> Option<usize> {
        self.channels().map(<[&str]>::len)
    }

    /// Canonical channel names; single-channel roles use the empty name so that the layer
    /// name alone identifies the channel on disk.
    pub fn channels(self) -> Option<&'static [&'static str]> {
        match self {
            Self::None => None,
            Self::Rgb => Some(&["r", "g", "b"]),
            Self::Rgba => Some(&["r", "g", "b", "a"]),
            Self::RedGreen => Some(&["r", "g"]),
            Self::GreenBlue => Some(&["g", "b"]),
            Self::RedBlue => Some(&["r", "b"]),
            Self::Red
            | Self::Green
            | Self::Blue
            | Self::Alpha
            | Self::Matte
            | Self::Luminance
            | Self::Depth => Some(&[""]),
            Self::Uv => Some(&["u", "v"]),
            Self::Xyz | Self::Velocity | Self::Normal => Some(&["x", "y", "z"]),
        }
    }

    /// Whether samples hold display colors (and should be gamma-encoded for 8-bit output).
    pub fn is_color(self) -> bool {
        matches!(
            self,
            Self::Rgb
                | Self::Rgba
                | Self::RedGreen
                | Self::GreenBlue
                | Self::RedBlue
                | Self::Red
                | Self::Green
                | Self::Blue
        )
    }
}
