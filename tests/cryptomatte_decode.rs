use std::collections::BTreeMap;

use imagecat::{
    DecodeParams, Image, ImagecatError, Layer, Metadata, NamedInputs, Operator, Role, Samples,
    hash_id,
};

/// A 2x1 Cryptomatte "scene" with two ranks stored in one rank layer.
fn scene(rank0: [(&str, f32); 2], rank1: [(&str, f32); 2]) -> Image {
    let scalar = |values: [f32; 2]| {
        Layer::new(Samples::new(1, 2, 1, values.to_vec()).unwrap(), Role::None).unwrap()
    };
    let layers = BTreeMap::from([
        ("CryptoObject00.R".to_string(), scalar(rank0.map(|(n, _)| hash_id(n)))),
        ("CryptoObject00.G".to_string(), scalar(rank0.map(|(_, c)| c))),
        ("CryptoObject00.B".to_string(), scalar(rank1.map(|(n, _)| hash_id(n)))),
        ("CryptoObject00.A".to_string(), scalar(rank1.map(|(_, c)| c))),
        (
            "C".to_string(),
            Layer::new(Samples::zeros(1, 2, 3).unwrap(), Role::Rgb).unwrap(),
        ),
    ]);
    let mut metadata = Metadata::new();
    metadata.insert("cryptomatte/f834d0a/name".to_string(), "CryptoObject".into());
    metadata.insert(
        "cryptomatte/f834d0a/manifest".to_string(),
        r#"{"ball":"13851a76"}"#.into(),
    );
    Image::with_metadata(layers, metadata).unwrap()
}

fn decode(image: Image, params: serde_json::Value) -> Result<Image, ImagecatError> {
    let mut inputs = NamedInputs::new("matte").with("image", image);
    for (name, value) in params.as_object().unwrap() {
        inputs.insert(name.clone(), value.clone());
    }
    Operator::CryptomatteDecode.run(&inputs)
}

#[test]
fn ranks_sum_without_clamping() {
    let image = scene([("ball", 0.3), ("cube", 0.9)], [("ball", 0.4), ("ball", 0.1)]);
    let out = decode(image, serde_json::json!({"mattes": ["ball"]})).unwrap();
    let m = out.layer("M").unwrap();
    assert_eq!(m.role(), Role::Matte);
    assert!((m.data().get(0, 0, 0) - 0.7).abs() < 1e-6);
    assert!((m.data().get(0, 1, 0) - 0.1).abs() < 1e-6);
}

#[test]
fn no_mattes_gives_an_empty_matte() {
    let image = scene([("ball", 1.0), ("cube", 1.0)], [("cube", 0.0), ("ball", 0.0)]);
    let out = decode(image, serde_json::json!({"layer": "empty"})).unwrap();
    assert!(out.layer("empty").unwrap().data().as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn clown_mode_colors_are_deterministic_per_id() {
    let image = scene([("ball", 1.0), ("cube", 1.0)], [("cube", 0.0), ("ball", 0.0)]);
    let params = serde_json::json!({"clown": true, "mattes": ["ball", "cube"]});
    let a = decode(image.clone(), params.clone()).unwrap();
    let b = decode(image, params).unwrap();
    assert_eq!(a, b);

    let m = a.layer("M").unwrap();
    assert_eq!(m.role(), Role::Rgb);
    let (ball, cube) = (m.data().pixel(0, 0), m.data().pixel(0, 1));
    assert_ne!(ball, cube);
    assert!(ball.iter().chain(cube).all(|v| (0.0..1.0).contains(v)));
}

#[test]
fn missing_cryptomatte_is_a_lookup_error() {
    let image = scene([("ball", 1.0), ("cube", 1.0)], [("cube", 0.0), ("ball", 0.0)]);
    let err = decode(image, serde_json::json!({"cryptomatte": "CryptoMaterial"})).unwrap_err();
    assert!(matches!(err, ImagecatError::Lookup(_)));
    assert!(err.to_string().starts_with("lookup error:"));
}

#[test]
fn typed_defaults() {
    let params = DecodeParams::from_inputs(&NamedInputs::new("m")).unwrap();
    assert!(!params.clown);
    assert_eq!(params.layer, "M");
    assert!(params.mattes.is_empty());
    assert_eq!(params.cryptomatte, None);
}

#[test]
fn hash_ids_are_distinct_and_never_special_floats() {
    let names = ["ball", "cube", "floor", "light", "camera", "sky", "Ball"];
    let ids: Vec<u32> = names.iter().map(|n| hash_id(n).to_bits()).collect();
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
        let exponent = (a >> 23) & 0xff;
        assert!(exponent != 0 && exponent != 0xff);
    }
}
