use crate::data::role::Role;

/// Flattened channels regrouped into one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelGroup {
    /// Layer name; empty for channels stored without a `layer.` prefix.
    pub layer: String,
    /// Full channel names, in canonical component order when the role is recognized.
    pub channels: Vec<String>,
    pub role: Role,
}

/// Component sets recognized when regrouping, in canonical order. Sets without a matching
/// role are reordered but stay [`Role::None`].
const KNOWN_LAYOUTS: [(&str, Role); 8] = [
    ("rgba", Role::Rgba),
    ("rgb", Role::Rgb),
    ("hsv", Role::None),
    ("hsb", Role::None),
    ("xy", Role::None),
    ("xyz", Role::Xyz),
    ("uv", Role::Uv),
    ("uvw", Role::None),
];

/// Group flattened `layer.component` channel names into layers and infer each layer's role.
///
/// Groups appear in order of first occurrence. Recognized component sets (see
/// `KNOWN_LAYOUTS`, compared case-insensitively) are reordered canonically and tagged with
/// their role; everything else keeps its order and gets [`Role::None`].
pub fn channels_to_layers<S: AsRef<str>>(channels: &[S]) -> Vec<ChannelGroup> {
    let mut groups: Vec<(String, Vec<(String, String)>)> = Vec::new();
    for channel in channels {
        let channel = channel.as_ref();
        let (layer, component) = channel.rsplit_once('.').unwrap_or(("", channel));
        let entry = (channel.to_string(), component.to_ascii_lowercase());
        match groups.iter_mut().find(|(name, _)| name == layer) {
            Some((_, members)) => members.push(entry),
            None => groups.push((layer.to_string(), vec![entry])),
        }
    }

    groups
        .into_iter()
        .map(|(layer, members)| categorize(layer, members))
        .collect()
}

fn categorize(layer: String, mut members: Vec<(String, String)>) -> ChannelGroup {
    let mut components = members.iter().map(|(_, c)| c.clone()).collect::<Vec<_>>();
    components.sort();

    for (layout, role) in KNOWN_LAYOUTS {
        let mut expected = layout.chars().map(String::from).collect::<Vec<_>>();
        expected.sort();
        if components == expected {
            members.sort_by_key(|(_, c)| layout.find(c.as_str()).unwrap_or(usize::MAX));
            return ChannelGroup {
                layer,
                channels: members.into_iter().map(|(full, _)| full).collect(),
                role,
            };
        }
    }

    ChannelGroup {
        layer,
        channels: members.into_iter().map(|(full, _)| full).collect(),
        role: Role::None,
    }
}
