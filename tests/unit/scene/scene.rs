use super::*;

fn solid_scene(rotate: serde_json::Value) -> Scene {
    let json = serde_json::json!({
        "canvas": { "width": 8, "height": 8 },
        "mode": "rgba",
        "background": "#000000",
        "layers": [
            { "name": "backdrop", "source": { "solid": { "color": "#ffffff", "width": 8, "height": 8 } } },
            { "name": "rotor", "source": { "solid": { "color": [255, 0, 0], "width": 4, "height": 2 } }, "offset": [2, 3] }
        ],
        "rotate": rotate
    });
    serde_json::from_value(json).unwrap()
}

#[test]
fn rotate_args_default_to_declared_parameters() {
    let scene = solid_scene(serde_json::json!({}));
    assert_eq!(scene.rotate.options(), RotateOptions::default());
    assert!(scene.rotate.rotor.is_none());
    assert_eq!(scene.layers[1].offset, [2, 3]);
    assert_eq!(scene.layers[1].opacity, 1.0);
    scene.validate().unwrap();
}

#[test]
fn rotate_options_parse_inline() {
    let scene = solid_scene(serde_json::json!({ "steps": 4, "autocenter": false, "cx": 4, "cy": 4 }));
    let opts = scene.rotate.options();
    assert_eq!(opts.steps, 4);
    assert!(!opts.autocenter);
    assert_eq!((opts.cx, opts.cy), (4, 4));
}

#[test]
fn misspelt_keys_are_rejected() {
    let typo: Result<Scene, _> = serde_json::from_value(serde_json::json!({
        "canvas": { "width": 8, "height": 8 },
        "layers": [],
        "rotate": { "step": 4 }
    }));
    assert!(typo.is_err());

    let typo: Result<Scene, _> = serde_json::from_value(serde_json::json!({
        "canvas": { "width": 8, "height": 8 },
        "layers": [
            { "name": "a", "source": { "solid": { "color": "#ffffff", "width": 1, "height": 1 } }, "ofset": [1, 1] }
        ]
    }));
    assert!(typo.is_err());

    let typo: Result<Scene, _> = serde_json::from_value(serde_json::json!({
        "canvas": { "width": 8, "height": 8 },
        "layers": [
            { "name": "a", "source": { "solid": { "colour": "#ffffff", "width": 1, "height": 1 } } }
        ]
    }));
    assert!(typo.is_err());

    let typo: Result<Scene, _> = serde_json::from_value(serde_json::json!({
        "canvas": { "width": 8, "height": 8 },
        "layers": [],
        "backgroud": "#000000"
    }));
    assert!(typo.is_err());
}

#[test]
fn validate_rejects_structural_problems() {
    let mut scene = solid_scene(serde_json::json!({ "rotor": "rotor" }));
    assert!(matches!(scene.validate(), Err(RotoError::Validation(_))));

    scene.rotate.backdrop = Some("missing".to_owned());
    assert!(matches!(scene.validate(), Err(RotoError::Validation(_))));

    let mut scene = solid_scene(serde_json::json!({}));
    scene.layers[1].name = "backdrop".to_owned();
    assert!(matches!(scene.validate(), Err(RotoError::Validation(_))));

    let mut scene = solid_scene(serde_json::json!({}));
    scene.layers[0].source = LayerSource::Image {
        path: "../outside.png".to_owned(),
    };
    assert!(matches!(scene.validate(), Err(RotoError::Validation(_))));

    let mut scene = solid_scene(serde_json::json!({}));
    scene.canvas.width = 0;
    assert!(matches!(scene.validate(), Err(RotoError::Validation(_))));
}

#[test]
fn validate_rejects_blank_layer_names() {
    for name in ["", "   "] {
        let mut scene = solid_scene(serde_json::json!({}));
        scene.layers[0].name = name.to_owned();
        assert!(matches!(scene.validate(), Err(RotoError::Validation(_))));
    }
}

#[test]
fn validate_rejects_opacity_outside_unit_range() {
    for opacity in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
        let mut scene = solid_scene(serde_json::json!({}));
        scene.layers[1].opacity = opacity;
        assert!(matches!(scene.validate(), Err(RotoError::Validation(_))));
    }
    for opacity in [0.0, 0.5, 1.0] {
        let mut scene = solid_scene(serde_json::json!({}));
        scene.layers[1].opacity = opacity;
        scene.validate().unwrap();
    }
}

#[test]
fn validate_rejects_empty_solid_layers() {
    for (w, h) in [(0, 2), (4, 0)] {
        let mut scene = solid_scene(serde_json::json!({}));
        scene.layers[1].source = LayerSource::Solid {
            color: Color([255, 0, 0, 255]),
            width: w,
            height: h,
        };
        assert!(matches!(scene.validate(), Err(RotoError::Validation(_))));
    }
}

#[test]
fn validate_rejects_absolute_and_empty_image_paths() {
    for path in ["/etc/rotor.png", "\\\\server\\rotor.png", "", "  ", "a/../../b.png"] {
        let mut scene = solid_scene(serde_json::json!({}));
        scene.layers[1].source = LayerSource::Image {
            path: path.to_owned(),
        };
        assert!(
            matches!(scene.validate(), Err(RotoError::Validation(_))),
            "path {path:?}"
        );
    }

    let mut scene = solid_scene(serde_json::json!({}));
    scene.layers[1].source = LayerSource::Image {
        path: "art/rotor.png".to_owned(),
    };
    scene.validate().unwrap();
}

#[test]
fn render_by_name_produces_one_frame_per_step() {
    let scene = solid_scene(serde_json::json!({ "steps": 4 }));
    let out = scene.render(Path::new(".")).unwrap();

    assert_eq!(out.frames.len(), 4);
    assert_eq!(out.flat.width, 8);
    assert_eq!(out.host.image(out.image).unwrap().stack().last(), Some(&out.base));

    // Frame 0 is unrotated: the rotor covers (2,3) and the backdrop shows at (0,0).
    let frame0 = &out.frames[0].rgba8_premul;
    let at = |x: usize, y: usize| &frame0[(y * 8 + x) * 4..(y * 8 + x) * 4 + 4];
    assert_eq!(at(2, 3), &[255, 0, 0, 255]);
    assert_eq!(at(0, 0), &[255, 255, 255, 255]);
}

#[test]
fn render_with_explicit_layers_uses_named_handles() {
    let mut scene = solid_scene(serde_json::json!({ "steps": 3 }));
    scene.layers[0].name = "ground".to_owned();
    scene.layers[1].name = "spinner".to_owned();
    scene.rotate.rotor = Some("spinner".to_owned());
    scene.rotate.backdrop = Some("ground".to_owned());
    scene.validate().unwrap();

    let out = scene.render(Path::new(".")).unwrap();
    assert_eq!(out.frames.len(), 3);
    assert_eq!(
        out.host.layer_names(out.image).unwrap(),
        vec!["ground copy #1", "ground copy", "ground"]
    );
}

#[test]
fn render_by_name_fails_without_named_layers() {
    let mut scene = solid_scene(serde_json::json!({}));
    scene.layers[1].name = "spinner".to_owned();
    assert!(matches!(
        scene.render(Path::new(".")),
        Err(RotoError::InvalidReference(_))
    ));
}
