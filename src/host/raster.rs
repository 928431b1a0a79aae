use std::{collections::BTreeMap, path::Path};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::{
    foundation::{
        core::{Affine, Canvas, ImageId, ImageType, LayerId, MergeMode, Point, Rect, RotateCenter},
        error::{RotoError, RotoResult},
        math::transformed_pixel_bounds,
    },
    host::{
        pdb::ProcedureDb,
        pixels::{
            PremulRgba8, over, premul_from_straight, premultiply_rgba8_in_place,
            sample_bilinear, unpremultiply_rgba8_in_place,
        },
    },
};

/// A drawable layer: placement, flags and premultiplied pixels.
#[derive(Clone, Debug)]
pub struct RasterLayer {
    /// Layer name; unique within an image once attached.
    pub name: String,
    /// Top-left corner in image coordinates.
    pub offset: (i32, i32),
    width: u32,
    height: u32,
    // Always `width * height * 4` bytes.
    rgba8_premul: Vec<u8>,
    /// Layer opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Hidden layers are skipped when flattening.
    pub visible: bool,
    /// Link state; never carried over to copies.
    pub linked: bool,
    /// Position-locked layers reject transforms.
    pub lock_position: bool,
}

impl RasterLayer {
    /// A layer filled with one straight-alpha RGBA colour.
    pub fn solid(name: impl Into<String>, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = premul_from_straight(rgba);
        Self::from_premul(name.into(), width, height, px.repeat(pixel_count(width, height)))
    }

    /// Wrap straight-alpha RGBA8 pixels.
    pub fn from_rgba8(
        name: impl Into<String>,
        width: u32,
        height: u32,
        mut rgba8: Vec<u8>,
    ) -> RotoResult<Self> {
        if rgba8.len() != pixel_count(width, height) * 4 {
            return Err(RotoError::validation(format!(
                "layer pixel buffer has {} bytes, expected {}x{}x4",
                rgba8.len(),
                width,
                height
            )));
        }
        premultiply_rgba8_in_place(&mut rgba8);
        Ok(Self::from_premul(name.into(), width, height, rgba8))
    }

    /// Decode an image file into a layer.
    pub fn load(name: impl Into<String>, path: &Path) -> RotoResult<Self> {
        let rgba = image::open(path)
            .with_context(|| format!("decode layer image '{}'", path.display()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(name, width, height, rgba.into_raw())
    }

    fn from_premul(name: String, width: u32, height: u32, rgba8_premul: Vec<u8>) -> Self {
        Self {
            name,
            offset: (0, 0),
            width,
            height,
            rgba8_premul,
            opacity: 1.0,
            visible: true,
            linked: false,
            lock_position: false,
        }
    }

    /// Move the layer so its top-left corner sits at `(x, y)`.
    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = (x, y);
        self
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8, row-major, tightly packed.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Replace size and premultiplied pixels together.
    ///
    /// The buffer must hold exactly `width * height * 4` bytes; otherwise the layer is left
    /// untouched and a host error is returned.
    pub fn set_pixels(
        &mut self,
        width: u32,
        height: u32,
        rgba8_premul: Vec<u8>,
    ) -> RotoResult<()> {
        if rgba8_premul.len() != pixel_count(width, height) * 4 {
            return Err(RotoError::host(format!(
                "layer '{}' pixel buffer has {} bytes, expected {width}x{height}x4",
                self.name,
                rgba8_premul.len()
            )));
        }
        self.width = width;
        self.height = height;
        self.rgba8_premul = rgba8_premul;
        Ok(())
    }

    /// Layer extent in image coordinates.
    pub fn bounds(&self) -> Rect {
        let (x, y) = (f64::from(self.offset.0), f64::from(self.offset.1));
        Rect::new(x, y, x + f64::from(self.width), y + f64::from(self.height))
    }

    /// Premultiplied pixel at image coordinates, or `None` outside the layer.
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let lx = i64::from(x) - i64::from(self.offset.0);
        let ly = i64::from(y) - i64::from(self.offset.1);
        if lx < 0 || ly < 0 || lx >= i64::from(self.width) || ly >= i64::from(self.height) {
            return None;
        }
        let i = ((ly as usize) * (self.width as usize) + lx as usize) * 4;
        let px = &self.rgba8_premul[i..i + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An image document: canvas, mode and a layer stack (index 0 is the top).
#[derive(Clone, Debug)]
pub struct RasterImage {
    /// Canvas size.
    pub canvas: Canvas,
    /// Image mode.
    pub image_type: ImageType,
    stack: Vec<LayerId>,
}

impl RasterImage {
    /// Attached layers, top first.
    pub fn stack(&self) -> &[LayerId] {
        &self.stack
    }

    fn index_of(&self, layer: LayerId) -> Option<usize> {
        self.stack.iter().position(|&l| l == layer)
    }
}

/// One successful primitive call, as recorded by [`RasterHost`].
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    /// `layer-copy`.
    LayerCopy {
        /// Copied layer.
        source: LayerId,
        /// New unattached layer.
        copy: LayerId,
    },
    /// `image-insert-layer`.
    InsertLayer {
        /// Target image.
        image: ImageId,
        /// Inserted layer.
        layer: LayerId,
        /// Requested stack position.
        position: i32,
    },
    /// `item-transform-rotate`.
    Rotate {
        /// Rotated layer.
        layer: LayerId,
        /// Angle in radians.
        angle: f64,
        /// Pivot as requested (coordinates dropped when autocentred).
        center: RotateCenter,
    },
    /// `image-merge-down`.
    MergeDown {
        /// Target image.
        image: ImageId,
        /// Upper operand (destroyed).
        upper: LayerId,
        /// Lower operand (destroyed).
        lower: LayerId,
        /// Resulting layer.
        merged: LayerId,
        /// Sizing mode.
        mode: MergeMode,
    },
}

/// A canvas-sized flattened rendering of an image.
#[derive(Clone, Debug)]
pub struct FlatImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Vec<u8>,
}

impl FlatImage {
    /// Convert to an `image` buffer in the colour model of `image_type`.
    pub fn to_dynamic_image(&self, image_type: ImageType) -> RotoResult<image::DynamicImage> {
        let mut straight = self.rgba8_premul.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        let rgba = image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| RotoError::host("flattened buffer does not match its dimensions"))?;
        let rgba = image::DynamicImage::ImageRgba8(rgba);
        Ok(match image_type {
            ImageType::Rgb | ImageType::Indexed => image::DynamicImage::ImageRgb8(rgba.to_rgb8()),
            ImageType::Rgba | ImageType::Indexeda => rgba,
            ImageType::Gray => image::DynamicImage::ImageLuma8(rgba.to_luma8()),
            ImageType::Graya => image::DynamicImage::ImageLumaA8(rgba.to_luma_alpha8()),
        })
    }

    /// Encode as PNG at `path`.
    pub fn save_png(&self, path: &Path, image_type: ImageType) -> RotoResult<()> {
        self.to_dynamic_image(image_type)?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// In-memory image host implementing [`ProcedureDb`] on real pixels.
///
/// Every successful primitive call is appended to a journal so callers can inspect exactly
/// which requests were made, in order.
#[derive(Debug, Default)]
pub struct RasterHost {
    images: BTreeMap<ImageId, RasterImage>,
    layers: BTreeMap<LayerId, RasterLayer>,
    next_image: u32,
    next_layer: u32,
    journal: Vec<HostCall>,
}

impl RasterHost {
    /// Empty host with no images.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty image document.
    pub fn create_image(&mut self, canvas: Canvas, image_type: ImageType) -> ImageId {
        self.next_image += 1;
        let id = ImageId(self.next_image);
        self.images.insert(
            id,
            RasterImage {
                canvas,
                image_type,
                stack: Vec::new(),
            },
        );
        id
    }

    /// Register a layer without attaching it to any image.
    pub fn new_layer(&mut self, layer: RasterLayer) -> LayerId {
        self.next_layer += 1;
        let id = LayerId(self.next_layer);
        self.layers.insert(id, layer);
        id
    }

    /// Register `layer` and attach it to `image` at `position`. Not journaled.
    pub fn add_layer(
        &mut self,
        image: ImageId,
        layer: RasterLayer,
        position: i32,
    ) -> RotoResult<LayerId> {
        let id = self.new_layer(layer);
        self.attach(image, id, position)?;
        Ok(id)
    }

    /// Look up a live layer.
    pub fn layer(&self, id: LayerId) -> Option<&RasterLayer> {
        self.layers.get(&id)
    }

    /// Look up a live layer for editing.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut RasterLayer> {
        self.layers.get_mut(&id)
    }

    /// Look up an image.
    pub fn image(&self, id: ImageId) -> RotoResult<&RasterImage> {
        self.images
            .get(&id)
            .ok_or_else(|| RotoError::invalid_reference(format!("{id} does not exist")))
    }

    /// Layer names of `image`, top first.
    pub fn layer_names(&self, image: ImageId) -> RotoResult<Vec<String>> {
        self.image(image)?
            .stack
            .iter()
            .map(|&id| Ok(self.live_layer(id)?.name.clone()))
            .collect()
    }

    /// Number of live layers, attached or not.
    pub fn live_layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Recorded primitive calls, oldest first.
    pub fn journal(&self) -> &[HostCall] {
        &self.journal
    }

    /// Forget recorded calls.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Composite all visible layers, bottom to top, onto a canvas-sized buffer.
    ///
    /// `background` is a straight-alpha colour under everything; `None` starts transparent.
    pub fn flatten(&self, image: ImageId, background: Option<[u8; 4]>) -> RotoResult<FlatImage> {
        let img = self.image(image)?;
        let Canvas { width, height } = img.canvas;
        let bg = background.map(premul_from_straight).unwrap_or([0; 4]);
        let mut rgba8_premul = bg.repeat(pixel_count(width, height));

        for &id in img.stack.iter().rev() {
            let layer = self.live_layer(id)?;
            if layer.visible {
                composite_layer_into(&mut rgba8_premul, (0, 0, width), layer, layer.opacity);
            }
        }

        Ok(FlatImage {
            width,
            height,
            rgba8_premul,
        })
    }

    /// Render one attached layer alone onto a canvas-sized buffer, ignoring its visibility.
    pub fn flatten_layer(
        &self,
        image: ImageId,
        layer: LayerId,
        background: Option<[u8; 4]>,
    ) -> RotoResult<FlatImage> {
        let img = self.image(image)?;
        if !img.stack.contains(&layer) {
            return Err(RotoError::invalid_reference(format!(
                "{layer} is not part of {image}"
            )));
        }
        let Canvas { width, height } = img.canvas;
        let bg = background.map(premul_from_straight).unwrap_or([0; 4]);
        let mut rgba8_premul = bg.repeat(pixel_count(width, height));
        let l = self.live_layer(layer)?;
        composite_layer_into(&mut rgba8_premul, (0, 0, width), l, l.opacity);

        Ok(FlatImage {
            width,
            height,
            rgba8_premul,
        })
    }

    fn live_layer(&self, id: LayerId) -> RotoResult<&RasterLayer> {
        self.layers
            .get(&id)
            .ok_or_else(|| RotoError::invalid_reference(format!("{id} does not exist")))
    }

    fn image_mut(&mut self, id: ImageId) -> RotoResult<&mut RasterImage> {
        self.images
            .get_mut(&id)
            .ok_or_else(|| RotoError::invalid_reference(format!("{id} does not exist")))
    }

    fn owner_of(&self, layer: LayerId) -> Option<ImageId> {
        self.images
            .iter()
            .find(|(_, img)| img.stack.contains(&layer))
            .map(|(&id, _)| id)
    }

    fn attach(&mut self, image: ImageId, layer: LayerId, position: i32) -> RotoResult<()> {
        self.live_layer(layer)?;
        if let Some(owner) = self.owner_of(layer) {
            return Err(RotoError::host(format!(
                "{layer} is already attached to {owner}"
            )));
        }

        let taken: Vec<String> = self.layer_names(image)?;
        let img = self.image_mut(image)?;
        // Negative positions mean "above the active layer"; there is no active layer here.
        let index = usize::try_from(position)
            .unwrap_or(0)
            .min(img.stack.len());
        img.stack.insert(index, layer);

        if let Some(l) = self.layers.get_mut(&layer) {
            l.name = unique_name(&l.name, &taken);
        }
        Ok(())
    }
}

impl ProcedureDb for RasterHost {
    fn layer_copy(&mut self, layer: LayerId, _add_alpha: bool) -> RotoResult<LayerId> {
        // Layers always carry alpha here, so `add_alpha` has nothing to do.
        let mut copy = self.live_layer(layer)?.clone();
        copy.name = format!("{} copy", copy.name);
        copy.linked = false;
        let id = self.new_layer(copy);
        self.journal.push(HostCall::LayerCopy {
            source: layer,
            copy: id,
        });
        Ok(id)
    }

    fn image_insert_layer(
        &mut self,
        image: ImageId,
        layer: LayerId,
        parent: Option<LayerId>,
        position: i32,
    ) -> RotoResult<()> {
        if let Some(group) = parent {
            return Err(RotoError::host(format!(
                "cannot insert into {group}: layer groups are not supported"
            )));
        }
        self.attach(image, layer, position)?;
        self.journal.push(HostCall::InsertLayer {
            image,
            layer,
            position,
        });
        Ok(())
    }

    fn item_transform_rotate(
        &mut self,
        layer: LayerId,
        angle: f64,
        autocenter: bool,
        cx: i32,
        cy: i32,
    ) -> RotoResult<LayerId> {
        if !angle.is_finite() {
            return Err(RotoError::host(format!(
                "rotation angle must be finite, got {angle}"
            )));
        }
        let center = RotateCenter::from_args(autocenter, cx, cy);
        let src = self.live_layer(layer)?;
        if src.lock_position {
            return Err(RotoError::host(format!(
                "{layer} ('{}') has a locked position",
                src.name
            )));
        }

        if !src.is_empty() {
            let rotated = rotate_layer(src, angle, center);
            if let Some(l) = self.layers.get_mut(&layer) {
                *l = rotated;
            }
        }

        self.journal.push(HostCall::Rotate {
            layer,
            angle,
            center,
        });
        Ok(layer)
    }

    fn image_merge_down(
        &mut self,
        image: ImageId,
        layer: LayerId,
        mode: MergeMode,
    ) -> RotoResult<LayerId> {
        let img = self.image(image)?;
        let index = img.index_of(layer).ok_or_else(|| {
            RotoError::invalid_reference(format!("{layer} is not part of {image}"))
        })?;
        let lower = *img.stack.get(index + 1).ok_or_else(|| {
            RotoError::host(format!("{layer} is the bottom layer; nothing to merge onto"))
        })?;
        let canvas = img.canvas;

        let upper_layer = self.live_layer(layer)?;
        let lower_layer = self.live_layer(lower)?;

        let bounds = match mode {
            MergeMode::ExpandAsNecessary => upper_layer.bounds().union(lower_layer.bounds()),
            MergeMode::ClipToImage => canvas.rect(),
            MergeMode::ClipToBottomLayer => lower_layer.bounds(),
        };
        let (x, y, width, height) = pixel_box(bounds);

        let mut rgba8_premul = vec![0u8; pixel_count(width, height) * 4];
        let origin = (x, y, width);
        composite_layer_into(&mut rgba8_premul, origin, lower_layer, lower_layer.opacity);
        if upper_layer.visible {
            composite_layer_into(&mut rgba8_premul, origin, upper_layer, upper_layer.opacity);
        }

        let merged_layer = RasterLayer {
            name: lower_layer.name.clone(),
            offset: (x, y),
            width,
            height,
            rgba8_premul,
            opacity: 1.0,
            visible: lower_layer.visible,
            linked: false,
            lock_position: false,
        };

        self.layers.remove(&layer);
        self.layers.remove(&lower);
        let merged = self.new_layer(merged_layer);

        let img = self.image_mut(image)?;
        img.stack.remove(index);
        img.stack[index] = merged;

        self.journal.push(HostCall::MergeDown {
            image,
            upper: layer,
            lower,
            merged,
            mode,
        });
        Ok(merged)
    }

    fn image_get_layer_by_name(&self, image: ImageId, name: &str) -> RotoResult<Option<LayerId>> {
        let img = self.image(image)?;
        for &id in &img.stack {
            if self.live_layer(id)?.name == name {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    fn image_base_type(&self, image: ImageId) -> RotoResult<ImageType> {
        Ok(self.image(image)?.image_type)
    }

    fn image_has_layer(&self, image: ImageId, layer: LayerId) -> RotoResult<bool> {
        Ok(self.image(image)?.stack.contains(&layer))
    }
}

fn rotate_layer(src: &RasterLayer, angle: f64, center: RotateCenter) -> RasterLayer {
    let bounds = src.bounds();
    let xf = Affine::rotate_about(angle, center.pivot(bounds));
    let (x, y, width, height) = pixel_box(transformed_pixel_bounds(bounds, xf));
    let inv = xf.inverse();

    let mut rgba8_premul = vec![0u8; pixel_count(width, height) * 4];
    let row_bytes = (width as usize * 4).max(1);
    rgba8_premul
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(row, line)| {
            let py = f64::from(y) + row as f64 + 0.5;
            for (col, px) in line.chunks_exact_mut(4).enumerate() {
                let p = inv * Point::new(f64::from(x) + col as f64 + 0.5, py);
                let sampled = sample_bilinear(
                    &src.rgba8_premul,
                    src.width,
                    src.height,
                    p.x - bounds.x0 - 0.5,
                    p.y - bounds.y0 - 0.5,
                );
                px.copy_from_slice(&sampled);
            }
        });

    RasterLayer {
        offset: (x, y),
        width,
        height,
        rgba8_premul,
        ..src.clone()
    }
}

/// Source-over `layer` into `dst`, a buffer whose top-left pixel sits at `(x, y)` and whose rows
/// are `width` pixels long.
fn composite_layer_into(
    dst: &mut [u8],
    (x, y, width): (i32, i32, u32),
    layer: &RasterLayer,
    opacity: f32,
) {
    if width == 0 || layer.is_empty() {
        return;
    }
    let (lx0, ly0) = (i64::from(layer.offset.0), i64::from(layer.offset.1));
    let (lw, lh) = (i64::from(layer.width), i64::from(layer.height));

    dst.par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(row, line)| {
            let ly = i64::from(y) + row as i64 - ly0;
            if ly < 0 || ly >= lh {
                return;
            }
            for (col, d) in line.chunks_exact_mut(4).enumerate() {
                let lx = i64::from(x) + col as i64 - lx0;
                if lx < 0 || lx >= lw {
                    continue;
                }
                let i = ((ly * lw + lx) as usize) * 4;
                let s = &layer.rgba8_premul[i..i + 4];
                let out: PremulRgba8 =
                    over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
                d.copy_from_slice(&out);
            }
        });
}

fn pixel_box(rect: Rect) -> (i32, i32, u32, u32) {
    (
        rect.x0.round() as i32,
        rect.y0.round() as i32,
        rect.width().round().max(0.0) as u32,
        rect.height().round().max(0.0) as u32,
    )
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn unique_name(name: &str, taken: &[String]) -> String {
    if !taken.iter().any(|t| t == name) {
        return name.to_owned();
    }
    (1..)
        .map(|n| format!("{name} #{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_owned())
}

#[cfg(test)]
#[path = "../../tests/unit/host/raster.rs"]
mod tests;
