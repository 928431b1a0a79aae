use super::*;
use crate::host::raster::{RasterHost, RasterLayer};
use crate::foundation::core::Canvas;

fn host_with(names: &[&str]) -> (RasterHost, ImageId, Vec<LayerId>) {
    let mut host = RasterHost::new();
    let image = host.create_image(
        Canvas {
            width: 4,
            height: 4,
        },
        ImageType::Rgb,
    );
    let ids: Vec<LayerId> = names
        .iter()
        .rev()
        .map(|n| {
            host.add_layer(image, RasterLayer::solid(*n, 4, 4, [9, 9, 9, 255]), 0)
                .unwrap()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    (host, image, ids)
}

#[test]
fn image_type_globs_match_prefixes() {
    let types = ImageTypes::new("RGB*, GRAY*");
    assert!(types.accepts(ImageType::Rgb));
    assert!(types.accepts(ImageType::Rgba));
    assert!(types.accepts(ImageType::Graya));
    assert!(!types.accepts(ImageType::Indexed));

    let exact = ImageTypes::new("RGB");
    assert!(exact.accepts(ImageType::Rgb));
    assert!(!exact.accepts(ImageType::Rgba));
}

#[test]
fn builtin_definitions_declare_the_plugin_surface() {
    let reg = Registry::builtin();
    let explicit = reg.get("python_fu_animate_rotate").unwrap();
    let names: Vec<&str> = explicit.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        ["steps", "autocenter", "rotorlayer", "backdroplayer", "cx", "cy"]
    );
    assert_eq!(explicit.params[0].default, ParamValue::Int(36));
    assert_eq!(explicit.params[2].kind, ParamKind::Layer);
    assert_eq!(explicit.image_types.as_str(), "RGB*, GRAY*");
    assert_eq!(explicit.menu_path, "<Image>/Filters/Animation/Rotate...");

    let by_name = reg.get("python_fu_animate_rotate_by_name").unwrap();
    assert_eq!(by_name.entry, EntryShape::ByName);
    assert!(by_name.params.iter().all(|p| p.kind != ParamKind::Layer));
    assert_eq!(reg.iter().count(), 2);
}

#[test]
fn definitions_serialize_with_tagged_defaults() {
    let json = serde_json::to_value(animate_rotate_def()).unwrap();
    assert_eq!(json["params"][0]["default"], serde_json::json!({ "int": 36 }));
    assert_eq!(json["params"][0]["kind"], "int");
    assert_eq!(json["params"][2]["kind"], "layer");
    assert_eq!(json["entry"], "explicit_layers");
}

#[test]
fn register_rejects_duplicates() {
    let mut reg = Registry::builtin();
    assert!(matches!(
        reg.register(animate_rotate_def()),
        Err(RotoError::Validation(_))
    ));

    let mut def = animate_rotate_def();
    def.name = "custom".to_owned();
    def.params.push(def.params[0].clone());
    assert!(matches!(reg.register(def), Err(RotoError::Validation(_))));
}

#[test]
fn register_rejects_definitions_run_cannot_bind() {
    let mut reg = Registry::new();

    let mut missing = animate_rotate_by_name_def();
    missing.name = "custom".to_owned();
    missing.params.retain(|p| p.name != "cx");
    assert!(matches!(reg.register(missing), Err(RotoError::Validation(_))));

    let mut no_layers = animate_rotate_by_name_def();
    no_layers.name = "custom".to_owned();
    no_layers.entry = EntryShape::ExplicitLayers;
    assert!(matches!(reg.register(no_layers), Err(RotoError::Validation(_))));

    let mut wrong_kind = animate_rotate_def();
    wrong_kind.name = "custom".to_owned();
    let cx = wrong_kind.params.iter_mut().find(|p| p.name == "cx").unwrap();
    cx.kind = ParamKind::Bool;
    cx.default = ParamValue::Bool(false);
    assert!(matches!(reg.register(wrong_kind), Err(RotoError::Validation(_))));

    let mut disagreeing = animate_rotate_def();
    disagreeing.name = "custom".to_owned();
    disagreeing.params[0].kind = ParamKind::Bool;
    assert!(matches!(reg.register(disagreeing), Err(RotoError::Validation(_))));

    assert_eq!(reg.iter().count(), 0);

    let mut extra = animate_rotate_by_name_def();
    extra.name = "custom".to_owned();
    extra.params.push(ParamDef {
        kind: ParamKind::Int,
        name: "unused".to_owned(),
        description: "Ignored".to_owned(),
        default: ParamValue::Int(0),
    });
    reg.register(extra).unwrap();
    let (mut host, image, _) = host_with(&["rotor", "backdrop"]);
    let args = ProcedureArgs::from([("steps".to_owned(), ParamValue::Int(2))]);
    reg.run("custom", &mut host, image, &args).unwrap();
}

#[test]
fn run_binds_explicit_layers_and_defaults() {
    let (mut host, image, ids) = host_with(&["spin", "ground"]);
    let reg = Registry::builtin();
    let args = ProcedureArgs::from([
        ("steps".to_owned(), ParamValue::Int(3)),
        ("rotorlayer".to_owned(), ParamValue::Layer(Some(ids[0]))),
        ("backdroplayer".to_owned(), ParamValue::Layer(Some(ids[1]))),
    ]);
    let base = reg
        .run("python_fu_animate_rotate", &mut host, image, &args)
        .unwrap();
    let stack = host.image(image).unwrap().stack().to_vec();
    assert_eq!(stack.len(), 3);
    assert_eq!(stack[2], base);
}

#[test]
fn run_reports_binding_errors() {
    let (mut host, image, ids) = host_with(&["rotor", "backdrop"]);
    let reg = Registry::builtin();

    let unknown = ProcedureArgs::from([("speed".to_owned(), ParamValue::Int(1))]);
    assert!(matches!(
        reg.run("python_fu_animate_rotate_by_name", &mut host, image, &unknown),
        Err(RotoError::Validation(_))
    ));

    let wrong_kind = ProcedureArgs::from([("steps".to_owned(), ParamValue::Bool(true))]);
    assert!(matches!(
        reg.run("python_fu_animate_rotate_by_name", &mut host, image, &wrong_kind),
        Err(RotoError::Validation(_))
    ));

    let missing_layer = ProcedureArgs::from([(
        "rotorlayer".to_owned(),
        ParamValue::Layer(Some(ids[0])),
    )]);
    assert!(matches!(
        reg.run("python_fu_animate_rotate", &mut host, image, &missing_layer),
        Err(RotoError::InvalidReference(_))
    ));

    assert!(matches!(
        reg.run("python_fu_nope", &mut host, image, &ProcedureArgs::new()),
        Err(RotoError::Validation(_))
    ));
    assert!(host.journal().is_empty());
}

#[test]
fn run_by_name_uses_fixed_layer_names() {
    let (mut host, image, _) = host_with(&["rotor", "backdrop"]);
    let reg = Registry::builtin();
    let args = ProcedureArgs::from([("steps".to_owned(), ParamValue::Int(2))]);
    reg.run("python_fu_animate_rotate_by_name", &mut host, image, &args)
        .unwrap();
    assert_eq!(
        host.layer_names(image).unwrap(),
        vec!["backdrop copy", "backdrop"]
    );
}
