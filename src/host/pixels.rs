//! Premultiplied RGBA8 pixel helpers shared by the raster host.

pub(crate) type PremulRgba8 = [u8; 4];

pub(crate) const TRANSPARENT: PremulRgba8 = [0, 0, 0, 0];

/// Source-over of premultiplied `src` onto `dst`, with `src` scaled by `opacity`.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Bilinear sample at continuous pixel coordinates (pixel centres sit on integers).
///
/// Texels outside the buffer read as transparent, which antialiases rotated edges.
pub(crate) fn sample_bilinear(
    rgba: &[u8],
    width: u32,
    height: u32,
    x: f64,
    y: f64,
) -> PremulRgba8 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let texel = |tx: i64, ty: i64| -> [f64; 4] {
        if tx < 0 || ty < 0 || tx >= i64::from(width) || ty >= i64::from(height) {
            return [0.0; 4];
        }
        let i = ((ty as usize) * (width as usize) + tx as usize) * 4;
        [
            f64::from(rgba[i]),
            f64::from(rgba[i + 1]),
            f64::from(rgba[i + 2]),
            f64::from(rgba[i + 3]),
        ]
    };

    let p00 = texel(x0, y0);
    let p10 = texel(x0 + 1, y0);
    let p01 = texel(x0, y0 + 1);
    let p11 = texel(x0 + 1, y0 + 1);

    let mut out = TRANSPARENT;
    for c in 0..4 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255(u16::from(*c), a);
        }
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

pub(crate) fn premul_from_straight(rgba: [u8; 4]) -> PremulRgba8 {
    let mut px = rgba;
    premultiply_rgba8_in_place(&mut px);
    px
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/host/pixels.rs"]
mod tests;
