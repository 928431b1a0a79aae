use std::f64::consts::TAU;

use crate::foundation::core::{Affine, Rect};

/// Angular increment between consecutive frames of a `steps`-frame revolution.
///
/// Callers only ask for this when at least one rotated frame is produced, i.e. `steps >= 2`.
pub fn step_angle(steps: i32) -> f64 {
    TAU / f64::from(steps)
}

/// Rotation applied at 0-based loop index `index`: `(index + 1) * 2π / steps`.
pub fn rotation_angle(index: u32, steps: i32) -> f64 {
    f64::from(index + 1) * step_angle(steps)
}

const SNAP_EPS: f64 = 1e-6;

/// Integer pixel bounds covering `rect` after transforming it by `xf`.
///
/// Edges within `SNAP_EPS` of an integer snap to it so exact quarter turns keep exact sizes.
pub(crate) fn transformed_pixel_bounds(rect: Rect, xf: Affine) -> Rect {
    let bbox = xf.transform_rect_bbox(rect);
    Rect::new(
        (bbox.x0 + SNAP_EPS).floor(),
        (bbox.y0 + SNAP_EPS).floor(),
        (bbox.x1 - SNAP_EPS).ceil(),
        (bbox.y1 - SNAP_EPS).ceil(),
    )
}
