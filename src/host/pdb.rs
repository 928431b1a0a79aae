use crate::foundation::{
    core::{ImageId, ImageType, LayerId, MergeMode},
    error::RotoResult,
};

/// The host application's procedure database, reduced to the calls the compositor makes.
///
/// Every call is a blocking request that completes before the next one is issued. Handles are
/// host-owned; a failed call leaves the document in whatever state earlier calls produced.
pub trait ProcedureDb {
    /// Duplicate `layer`. The copy is not attached to any image and never inherits the
    /// source layer's link state. `add_alpha` asks the host to give the copy an alpha channel.
    fn layer_copy(&mut self, layer: LayerId, add_alpha: bool) -> RotoResult<LayerId>;

    /// Attach an unattached `layer` to `image` at stack `position` (0 is the top).
    ///
    /// `parent` names a layer group; `None` inserts at the image's top level.
    fn image_insert_layer(
        &mut self,
        image: ImageId,
        layer: LayerId,
        parent: Option<LayerId>,
        position: i32,
    ) -> RotoResult<()>;

    /// Rotate `layer` in place by `angle` radians, about its own centre when `autocenter` is
    /// set, else about `(cx, cy)` in image coordinates. Returns the transformed layer.
    fn item_transform_rotate(
        &mut self,
        layer: LayerId,
        angle: f64,
        autocenter: bool,
        cx: i32,
        cy: i32,
    ) -> RotoResult<LayerId>;

    /// Merge `layer` onto the layer directly beneath it. Both operands are destroyed; the
    /// returned layer takes the lower operand's stack position.
    fn image_merge_down(
        &mut self,
        image: ImageId,
        layer: LayerId,
        mode: MergeMode,
    ) -> RotoResult<LayerId>;

    /// Find a layer of `image` by exact name.
    fn image_get_layer_by_name(&self, image: ImageId, name: &str) -> RotoResult<Option<LayerId>>;

    /// The image's mode.
    fn image_base_type(&self, image: ImageId) -> RotoResult<ImageType>;

    /// Whether `layer` is currently part of `image`'s layer stack.
    fn image_has_layer(&self, image: ImageId, layer: LayerId) -> RotoResult<bool>;
}
