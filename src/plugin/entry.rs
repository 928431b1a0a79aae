use crate::{
    compose::rotor::{RotationParams, compose},
    foundation::{
        core::{ImageId, LayerId, RotateCenter},
        error::{RotoError, RotoResult},
    },
    host::pdb::ProcedureDb,
    plugin::registry::ImageTypes,
};

/// Layer looked up as the rotor by [`animate_rotate_by_name`].
pub const ROTOR_LAYER_NAME: &str = "rotor";
/// Layer looked up as the backdrop by [`animate_rotate_by_name`].
pub const BACKDROP_LAYER_NAME: &str = "backdrop";
/// Image modes both entry points accept.
pub const ROTATE_IMAGE_TYPES: &str = "RGB*, GRAY*";

/// User-facing arguments shared by both entry points, with the declared defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RotateOptions {
    /// Animation steps per revolution.
    pub steps: i32,
    /// Rotate about the rotor's centre instead of `(cx, cy)`.
    pub autocenter: bool,
    /// X centre of rotation, image pixels.
    pub cx: i32,
    /// Y centre of rotation, image pixels.
    pub cy: i32,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            steps: 36,
            autocenter: true,
            cx: 0,
            cy: 0,
        }
    }
}

impl RotateOptions {
    /// Compositor parameters for these options.
    pub fn params(&self) -> RotationParams {
        RotationParams {
            steps: self.steps,
            center: RotateCenter::from_args(self.autocenter, self.cx, self.cy),
        }
    }
}

/// The two input layers of a compositing pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotateLayers {
    /// Layer that is rotated.
    pub rotor: LayerId,
    /// Layer that stays static beneath each rotated copy.
    pub backdrop: LayerId,
}

/// Entry point taking explicit rotor/backdrop layers.
pub fn animate_rotate<P: ProcedureDb + ?Sized>(
    pdb: &mut P,
    image: ImageId,
    layers: RotateLayers,
    opts: &RotateOptions,
) -> RotoResult<LayerId> {
    ensure_supported_mode(&*pdb, image)?;
    let base = compose(pdb, image, layers.rotor, layers.backdrop, &opts.params())?;
    tracing::info!(%image, %base, steps = opts.steps, "rotation animation composed");
    Ok(base)
}

/// Entry point resolving the layers named `"rotor"` and `"backdrop"`.
///
/// Fails without touching the image when either name is missing.
pub fn animate_rotate_by_name<P: ProcedureDb + ?Sized>(
    pdb: &mut P,
    image: ImageId,
    opts: &RotateOptions,
) -> RotoResult<LayerId> {
    let layers = resolve_named_layers(&*pdb, image)?;
    animate_rotate(pdb, image, layers, opts)
}

/// Look up the fixed-name input layers.
pub fn resolve_named_layers<P: ProcedureDb + ?Sized>(
    pdb: &P,
    image: ImageId,
) -> RotoResult<RotateLayers> {
    let find = |name: &str| -> RotoResult<LayerId> {
        pdb.image_get_layer_by_name(image, name)?.ok_or_else(|| {
            RotoError::invalid_reference(format!("{image} has no layer named '{name}'"))
        })
    };
    Ok(RotateLayers {
        rotor: find(ROTOR_LAYER_NAME)?,
        backdrop: find(BACKDROP_LAYER_NAME)?,
    })
}

fn ensure_supported_mode<P: ProcedureDb + ?Sized>(pdb: &P, image: ImageId) -> RotoResult<()> {
    let mode = pdb.image_base_type(image)?;
    if !ImageTypes::new(ROTATE_IMAGE_TYPES).accepts(mode) {
        return Err(RotoError::validation(format!(
            "{image} is {mode}; rotation needs one of {ROTATE_IMAGE_TYPES}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/plugin/entry.rs"]
mod tests;
