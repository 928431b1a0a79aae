use std::fmt;

use crate::foundation::error::{RotoError, RotoResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Opaque handle to an image document owned by the host.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ImageId(pub u32);

/// Opaque handle to a layer owned by the host.
///
/// Handles are identities, not ownership: a merge destroys the layers behind its operand handles.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LayerId(pub u32);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Canvas bounds as a rectangle anchored at the origin.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Image mode as the host names it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// RGB without alpha.
    #[default]
    Rgb,
    /// RGB with alpha.
    Rgba,
    /// Grayscale without alpha.
    Gray,
    /// Grayscale with alpha.
    Graya,
    /// Palette-indexed without alpha.
    Indexed,
    /// Palette-indexed with alpha.
    Indexeda,
}

impl ImageType {
    /// Host spelling used in procedure image-type lists (`"RGB*, GRAY*"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::Gray => "GRAY",
            Self::Graya => "GRAYA",
            Self::Indexed => "INDEXED",
            Self::Indexeda => "INDEXEDA",
        }
    }

    /// Whether layers of this type carry an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba | Self::Graya | Self::Indexeda)
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How merge-down sizes the merged layer.
///
/// Numeric codes match the host's merge-type enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Grow to the union of both operands.
    ExpandAsNecessary,
    /// Crop to the image canvas.
    ClipToImage,
    /// Keep the bounds of the lower operand.
    ClipToBottomLayer,
}

impl MergeMode {
    /// Host numeric code for this mode.
    pub fn code(self) -> i32 {
        match self {
            Self::ExpandAsNecessary => 0,
            Self::ClipToImage => 1,
            Self::ClipToBottomLayer => 2,
        }
    }

    /// Decode a host numeric merge code.
    pub fn from_code(code: i32) -> RotoResult<Self> {
        match code {
            0 => Ok(Self::ExpandAsNecessary),
            1 => Ok(Self::ClipToImage),
            2 => Ok(Self::ClipToBottomLayer),
            other => Err(RotoError::validation(format!(
                "unknown merge type code {other}"
            ))),
        }
    }
}

/// Pivot used by a rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RotateCenter {
    /// Rotate about the layer's own geometric centre.
    Auto,
    /// Rotate about an explicit point in image coordinates.
    Point {
        /// X in image pixels.
        x: i32,
        /// Y in image pixels.
        y: i32,
    },
}

impl RotateCenter {
    /// Build from the host's `(autocenter, cx, cy)` argument triple.
    ///
    /// The coordinates are discarded when `autocenter` is set.
    pub fn from_args(autocenter: bool, cx: i32, cy: i32) -> Self {
        if autocenter {
            Self::Auto
        } else {
            Self::Point { x: cx, y: cy }
        }
    }

    /// Lower back to the host's `(autocenter, cx, cy)` argument triple.
    pub fn to_args(self) -> (bool, i32, i32) {
        match self {
            Self::Auto => (true, 0, 0),
            Self::Point { x, y } => (false, x, y),
        }
    }

    /// Resolve the pivot for a layer occupying `bounds` in image coordinates.
    pub fn pivot(self, bounds: Rect) -> Point {
        match self {
            Self::Auto => bounds.center(),
            Self::Point { x, y } => Point::new(f64::from(x), f64::from(y)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
