use super::*;

#[test]
fn merge_mode_codes_match_host_enumeration() {
    for mode in [
        MergeMode::ExpandAsNecessary,
        MergeMode::ClipToImage,
        MergeMode::ClipToBottomLayer,
    ] {
        assert_eq!(MergeMode::from_code(mode.code()).unwrap(), mode);
    }
    assert_eq!(MergeMode::ClipToImage.code(), 1);
    assert!(MergeMode::from_code(3).is_err());
}

#[test]
fn autocenter_discards_explicit_coordinates() {
    assert_eq!(RotateCenter::from_args(true, 10, -4), RotateCenter::Auto);
    assert_eq!(
        RotateCenter::from_args(false, 10, -4),
        RotateCenter::Point { x: 10, y: -4 }
    );
}

#[test]
fn pivot_uses_layer_centre_or_image_point() {
    let bounds = Rect::new(10.0, 20.0, 30.0, 60.0);
    assert_eq!(RotateCenter::Auto.pivot(bounds), Point::new(20.0, 40.0));
    assert_eq!(
        RotateCenter::Point { x: 0, y: 5 }.pivot(bounds),
        Point::new(0.0, 5.0)
    );
}

#[test]
fn image_type_spelling_and_alpha() {
    assert_eq!(ImageType::Rgba.as_str(), "RGBA");
    assert_eq!(ImageType::Indexed.to_string(), "INDEXED");
    assert!(ImageType::Graya.has_alpha());
    assert!(!ImageType::Rgb.has_alpha());
}

#[test]
fn handles_display_with_kind_prefix() {
    assert_eq!(LayerId(7).to_string(), "layer#7");
    assert_eq!(ImageId(1).to_string(), "image#1");
}
