use crate::{
    compose::schedule::RotationSchedule,
    foundation::{
        core::{ImageId, LayerId, MergeMode, RotateCenter},
        error::{RotoError, RotoResult},
    },
    host::pdb::ProcedureDb,
};

/// Merge mode used for every merge the compositor performs.
pub const FRAME_MERGE_MODE: MergeMode = MergeMode::ClipToImage;

/// Parameters of one compositing pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RotationParams {
    /// Frames per revolution. Values below 2 produce no rotated frames.
    pub steps: i32,
    /// Rotation pivot.
    pub center: RotateCenter,
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            steps: 36,
            center: RotateCenter::Auto,
        }
    }
}

/// Build the frames of a rotation animation inside `image`.
///
/// For each of the `steps - 1` rotated frames, a copy of `backdrop` and then a copy of `rotor`
/// are inserted at the top of the stack, the rotor copy is rotated by `(x + 1) * 2π / steps`
/// and merged down onto the backdrop copy. Finally `rotor` itself is merged onto the layer
/// directly beneath it, producing the unrotated base frame, whose handle is returned.
///
/// Starting from `[rotor, backdrop]` (top first) the stack ends as
/// `[frame n-1, .., frame 1, frame 0]`. Every copy is consumed by exactly one merge.
///
/// Any host failure aborts immediately; frames completed before it stay in the image.
#[tracing::instrument(skip(pdb, params), fields(steps = params.steps))]
pub fn compose<P: ProcedureDb + ?Sized>(
    pdb: &mut P,
    image: ImageId,
    rotor: LayerId,
    backdrop: LayerId,
    params: &RotationParams,
) -> RotoResult<LayerId> {
    for (role, layer) in [("rotor", rotor), ("backdrop", backdrop)] {
        if !pdb.image_has_layer(image, layer)? {
            return Err(RotoError::invalid_reference(format!(
                "{role} {layer} is not part of {image}"
            )));
        }
    }

    let (autocenter, cx, cy) = params.center.to_args();
    for step in RotationSchedule::new(params.steps).iter() {
        let frame_backdrop = pdb.layer_copy(backdrop, false)?;
        pdb.image_insert_layer(image, frame_backdrop, None, 0)?;

        let frame_rotor = pdb.layer_copy(rotor, false)?;
        pdb.image_insert_layer(image, frame_rotor, None, 0)?;
        let frame_rotor = pdb.item_transform_rotate(frame_rotor, step.angle, autocenter, cx, cy)?;

        let frame = pdb.image_merge_down(image, frame_rotor, FRAME_MERGE_MODE)?;
        tracing::debug!(index = step.index, angle = step.angle, %frame, "rotated frame");
    }

    let base = pdb.image_merge_down(image, rotor, FRAME_MERGE_MODE)?;
    tracing::debug!(%base, "base frame");
    Ok(base)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/rotor.rs"]
mod tests;
