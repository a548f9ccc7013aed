use imagecat::{
    CompositeParams, Image, ImagecatError, Interpolation, Layer, Length, NamedInputs, Operator,
    Placement, Role, Samples, XY, covered_region, transform,
};

fn solid(rows: usize, cols: usize, values: &[f32], role: Role) -> Layer {
    Layer::new(Samples::filled(rows, cols, values).unwrap(), role).unwrap()
}

fn composite(
    bg: Layer,
    fg: Layer,
    mask: Option<Layer>,
    params: serde_json::Value,
) -> Result<Image, ImagecatError> {
    let mut inputs = NamedInputs::new("comp")
        .with("background", Image::single("C", bg))
        .with("foreground", Image::single("C", fg));
    if let Some(mask) = mask {
        inputs.insert("mask", Image::single("A", mask));
    }
    for (name, value) in params.as_object().unwrap() {
        inputs.insert(name.clone(), value.clone());
    }
    Operator::Composite.run(&inputs)
}

#[test]
fn centered_foreground_covers_rows_and_cols_45_to_55() {
    let out = composite(
        solid(100, 100, &[0.0, 0.0, 0.0], Role::Rgb),
        solid(10, 10, &[1.0, 0.5, 0.25], Role::Rgb),
        None,
        serde_json::json!({}),
    )
    .unwrap();
    let c = out.layer("C").unwrap();
    assert_eq!(c.role(), Role::Rgb);
    for r in 0..100 {
        for col in 0..100 {
            let expected: &[f32] = if (45..55).contains(&r) && (45..55).contains(&col) {
                &[1.0, 0.5, 0.25]
            } else {
                &[0.0, 0.0, 0.0]
            };
            assert_eq!(c.data().pixel(r, col), expected, "({r}, {col})");
        }
    }
}

#[test]
fn off_canvas_foreground_leaves_background_untouched() {
    let bg = Layer::new(
        Samples::from_fn(32, 48, 3, |r, c, ch| (r * 1000 + c * 10 + ch) as f32 / 1e5).unwrap(),
        Role::Rgb,
    )
    .unwrap();
    let out = composite(
        bg.clone(),
        solid(8, 8, &[1.0, 1.0, 1.0], Role::Rgb),
        None,
        serde_json::json!({"position": ["2w", "-1h"], "orientation": 30}),
    )
    .unwrap();
    assert_eq!(out.layer("C").unwrap().data(), bg.data());
}

#[test]
fn position_is_measured_from_the_bottom_left() {
    let out = composite(
        solid(20, 20, &[0.0], Role::Luminance),
        solid(4, 4, &[1.0], Role::Luminance),
        None,
        serde_json::json!({"pivot": [0, 0], "position": [0, 0], "order": 0}),
    )
    .unwrap();
    let y = out.layer("C").unwrap().data();
    assert_eq!(y.get(19, 0, 0), 1.0);
    assert_eq!(y.get(16, 3, 0), 1.0);
    assert_eq!(y.get(15, 0, 0), 0.0);
    assert_eq!(y.get(0, 0, 0), 0.0);
}

#[test]
fn mask_controls_coverage() {
    let out = composite(
        solid(10, 10, &[0.0, 0.0, 0.0], Role::Rgb),
        solid(10, 10, &[1.0, 1.0, 1.0], Role::Rgb),
        Some(solid(10, 10, &[0.5], Role::Alpha)),
        serde_json::json!({"layer": "out"}),
    )
    .unwrap();
    assert_eq!(out.match_layer_names("*"), ["out"]);
    assert_eq!(out.layer("out").unwrap().data().pixel(5, 5), &[0.5, 0.5, 0.5]);
}

#[test]
fn mask_must_be_single_channel() {
    let err = composite(
        solid(10, 10, &[0.0; 3], Role::Rgb),
        solid(10, 10, &[1.0; 3], Role::Rgb),
        Some(solid(10, 10, &[0.5; 3], Role::Rgb)),
        serde_json::json!({}),
    )
    .unwrap_err();
    assert!(matches!(err, ImagecatError::Validation(_)));
}

#[test]
fn rotation_keeps_the_region_inside_the_target() {
    let placement = Placement {
        orientation: 45.0,
        scale: XY::new(3.0, 3.0),
        position: XY::new(Length::px(5.0), Length::height(0.5)),
        ..Placement::default()
    };
    let matrix = placement.matrix((10, 10), (40, 30));
    let region = covered_region(matrix, (10, 10), (40, 30));
    assert_eq!(region.col_start, 0);
    assert!(region.col_end <= 40 && region.row_end <= 30);

    let t = transform(
        &Samples::filled(10, 10, &[1.0]).unwrap(),
        (40, 30),
        &placement,
        Interpolation::Linear,
    )
    .unwrap();
    assert_eq!(t.region, region);
    assert_eq!(t.data.shape(), [region.rows(), region.cols(), 1]);
}

#[test]
fn typed_parameters_match_the_document_defaults() {
    let params = CompositeParams::from_inputs(&NamedInputs::new("c")).unwrap();
    assert_eq!(params, CompositeParams::default());
    assert_eq!(params.placement(), Placement::default());
}
