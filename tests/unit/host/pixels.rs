use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_transparent_src_keeps_dst() {
    let dst = [10, 20, 30, 40];
    assert_eq!(over(dst, TRANSPARENT, 1.0), dst);
}

#[test]
fn bilinear_on_pixel_centre_is_exact() {
    let rgba = [10, 20, 30, 255, 200, 100, 50, 255];
    assert_eq!(sample_bilinear(&rgba, 2, 1, 1.0, 0.0), [200, 100, 50, 255]);
}

#[test]
fn bilinear_outside_is_transparent_and_edges_fade() {
    let rgba = [0, 0, 0, 255];
    assert_eq!(sample_bilinear(&rgba, 1, 1, 5.0, 5.0), TRANSPARENT);
    assert_eq!(sample_bilinear(&rgba, 1, 1, 0.5, 0.0)[3], 128);
}

#[test]
fn premultiply_then_unpremultiply_keeps_opaque_and_clears_invisible() {
    let mut px = [100, 150, 200, 255, 90, 90, 90, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, [100, 150, 200, 255, 0, 0, 0, 0]);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[100, 150, 200, 255]);
}

#[test]
fn premul_from_straight_scales_colour_by_alpha() {
    assert_eq!(premul_from_straight([255, 0, 128, 128]), [128, 0, 64, 128]);
}
