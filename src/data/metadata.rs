use std::collections::BTreeMap;

/// Free-form image metadata, typically decoded container-format header fields.
pub type Metadata = BTreeMap<String, MetadataValue>;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_headers_round_trip_through_json() {
        let json = r#"{"compression": "zip", "lines": 12, "gamma": 2.2,
                       "cryptomatte/0a1b2c3/name": "CryptoObject",
                       "window": [0, 0, 63, 63], "extra": {"tiled": false}}"#;
        let meta: Metadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta["lines"], MetadataValue::Int(12));
        assert_eq!(meta["gamma"], MetadataValue::Float(2.2));
        assert_eq!(meta["cryptomatte/0a1b2c3/name"].as_str(), Some("CryptoObject"));
        assert!(matches!(meta["window"], MetadataValue::List(ref v) if v.len() == 4));
        assert!(matches!(meta["extra"], MetadataValue::Map(_)));

        let back: Metadata =
            serde_json::from_str(&serde_json::to_string(&meta).unwrap()).unwrap();
        assert_eq!(back, meta);
    }
}
