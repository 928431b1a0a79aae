//! JSON scene files: an image, its layers and the rotation to run on them.

pub(crate) mod color;

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::{Canvas, ImageId, ImageType, LayerId},
        error::{RotoError, RotoResult},
    },
    host::raster::{FlatImage, RasterHost, RasterLayer},
    plugin::entry::{RotateLayers, RotateOptions, animate_rotate, animate_rotate_by_name},
    scene::color::Color,
};

/// A layered image plus the rotation to apply to it.
///
/// Unknown keys are rejected throughout, so a misspelt field fails to parse instead of
/// silently taking its default.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    /// Canvas size.
    pub canvas: Canvas,
    /// Image mode; also the colour model of exported PNGs.
    #[serde(default)]
    pub mode: ImageType,
    /// Colour under all layers when exporting.
    #[serde(default)]
    pub background: Option<Color>,
    /// Layers, bottom first.
    pub layers: Vec<LayerSpec>,
    /// Rotation arguments.
    #[serde(default)]
    pub rotate: RotateArgs,
}

/// One layer of a [`Scene`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSpec {
    /// Layer name; unique within the scene.
    pub name: String,
    /// Pixel source.
    pub source: LayerSource,
    /// Top-left corner in image pixels.
    #[serde(default)]
    pub offset: [i32; 2],
    /// Opacity in `0.0..=1.0`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Hidden layers are left out of the flattened export.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_opacity() -> f32 {
    1.0
}

fn default_visible() -> bool {
    true
}

/// Where a layer's pixels come from.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum LayerSource {
    /// Image file, relative to the scene file.
    Image {
        /// Relative path.
        path: String,
    },
    /// Rectangle of one colour.
    Solid {
        /// Fill colour.
        color: Color,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

/// Rotation arguments of a scene. Omitted values take the procedure defaults.
///
/// Naming both `rotor` and `backdrop` selects the explicit-layer entry point; naming neither
/// uses the layers called `rotor` and `backdrop`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotateArgs {
    /// Animation steps per revolution.
    pub steps: i32,
    /// Rotate about the rotor's centre instead of `(cx, cy)`.
    pub autocenter: bool,
    /// X centre of rotation.
    pub cx: i32,
    /// Y centre of rotation.
    pub cy: i32,
    /// Name of the layer to rotate.
    pub rotor: Option<String>,
    /// Name of the static layer.
    pub backdrop: Option<String>,
}

impl Default for RotateArgs {
    fn default() -> Self {
        let RotateOptions {
            steps,
            autocenter,
            cx,
            cy,
        } = RotateOptions::default();
        Self {
            steps,
            autocenter,
            cx,
            cy,
            rotor: None,
            backdrop: None,
        }
    }
}

impl RotateArgs {
    /// Entry-point options carried by these arguments.
    pub fn options(&self) -> RotateOptions {
        RotateOptions {
            steps: self.steps,
            autocenter: self.autocenter,
            cx: self.cx,
            cy: self.cy,
        }
    }
}

/// Handles of a scene loaded into a [`RasterHost`].
#[derive(Clone, Debug)]
pub struct LoadedScene {
    /// The image document.
    pub image: ImageId,
    /// Layer handles by scene name.
    pub layers: BTreeMap<String, LayerId>,
}

/// Result of running a scene's rotation.
#[derive(Debug)]
pub struct RenderedScene {
    /// Host holding the edited image.
    pub host: RasterHost,
    /// The image document.
    pub image: ImageId,
    /// Unrotated base frame.
    pub base: LayerId,
    /// All visible layers composited.
    pub flat: FlatImage,
    /// One canvas-sized image per remaining layer, bottom first.
    pub frames: Vec<FlatImage>,
}

impl Scene {
    /// Read and validate a scene file.
    pub fn from_json_path(path: &Path) -> RotoResult<Self> {
        let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
        let scene: Self = serde_json::from_reader(BufReader::new(f))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check the scene for structural problems.
    pub fn validate(&self) -> RotoResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(RotoError::validation("canvas width/height must be > 0"));
        }

        let mut names = BTreeSet::new();
        for layer in &self.layers {
            if layer.name.trim().is_empty() {
                return Err(RotoError::validation("layer name must be non-empty"));
            }
            if !names.insert(layer.name.as_str()) {
                return Err(RotoError::validation(format!(
                    "layer name '{}' is used more than once",
                    layer.name
                )));
            }
            if !layer.opacity.is_finite() || !(0.0..=1.0).contains(&layer.opacity) {
                return Err(RotoError::validation(format!(
                    "layer '{}' opacity must be within 0..=1",
                    layer.name
                )));
            }
            match &layer.source {
                LayerSource::Image { path } => {
                    validate_rel_source(path, &format!("layer '{}' path", layer.name))?
                }
                LayerSource::Solid { width, height, .. } => {
                    if *width == 0 || *height == 0 {
                        return Err(RotoError::validation(format!(
                            "layer '{}' solid width/height must be > 0",
                            layer.name
                        )));
                    }
                }
            }
        }

        let rotate = &self.rotate;
        match (&rotate.rotor, &rotate.backdrop) {
            (Some(rotor), Some(backdrop)) => {
                for name in [rotor, backdrop] {
                    if !names.contains(name.as_str()) {
                        return Err(RotoError::validation(format!(
                            "rotate references missing layer '{name}'"
                        )));
                    }
                }
            }
            (None, None) => {}
            _ => {
                return Err(RotoError::validation(
                    "rotate.rotor and rotate.backdrop must be given together",
                ));
            }
        }
        Ok(())
    }

    /// Create the scene's image and layers in `host`. Image paths resolve against `assets_root`.
    pub fn load(&self, host: &mut RasterHost, assets_root: &Path) -> RotoResult<LoadedScene> {
        let image = host.create_image(self.canvas, self.mode);
        let mut layers = BTreeMap::new();
        for spec in &self.layers {
            let mut layer = match &spec.source {
                LayerSource::Image { path } => {
                    RasterLayer::load(spec.name.clone(), &assets_root.join(path))?
                }
                LayerSource::Solid {
                    color,
                    width,
                    height,
                } => RasterLayer::solid(spec.name.clone(), *width, *height, color.rgba()),
            }
            .with_offset(spec.offset[0], spec.offset[1]);
            layer.opacity = spec.opacity;
            layer.visible = spec.visible;

            let id = host.add_layer(image, layer, 0)?;
            layers.insert(spec.name.clone(), id);
        }
        Ok(LoadedScene { image, layers })
    }

    /// Run the scene's rotation on a loaded image, returning the base frame.
    pub fn apply(&self, host: &mut RasterHost, loaded: &LoadedScene) -> RotoResult<LayerId> {
        let opts = self.rotate.options();
        match (&self.rotate.rotor, &self.rotate.backdrop) {
            (Some(rotor), Some(backdrop)) => {
                let layers = RotateLayers {
                    rotor: loaded.layer(rotor)?,
                    backdrop: loaded.layer(backdrop)?,
                };
                animate_rotate(host, loaded.image, layers, &opts)
            }
            (None, None) => animate_rotate_by_name(host, loaded.image, &opts),
            _ => Err(RotoError::validation(
                "rotate.rotor and rotate.backdrop must be given together",
            )),
        }
    }

    /// Load, rotate and flatten in one go.
    pub fn render(&self, assets_root: &Path) -> RotoResult<RenderedScene> {
        let mut host = RasterHost::new();
        let loaded = self.load(&mut host, assets_root)?;
        let base = self.apply(&mut host, &loaded)?;

        let background = self.background.map(Color::rgba);
        let flat = host.flatten(loaded.image, background)?;
        let frames = host
            .image(loaded.image)?
            .stack()
            .iter()
            .rev()
            .map(|&layer| host.flatten_layer(loaded.image, layer, background))
            .collect::<RotoResult<Vec<_>>>()?;

        Ok(RenderedScene {
            host,
            image: loaded.image,
            base,
            flat,
            frames,
        })
    }
}

impl LoadedScene {
    /// Handle of the layer called `name`.
    pub fn layer(&self, name: &str) -> RotoResult<LayerId> {
        self.layers
            .get(name)
            .copied()
            .ok_or_else(|| RotoError::invalid_reference(format!("scene has no layer '{name}'")))
    }
}

fn validate_rel_source(source: &str, field: &str) -> RotoResult<()> {
    if source.trim().is_empty() {
        return Err(RotoError::validation(format!("{field} must be non-empty")));
    }
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(RotoError::validation(format!(
            "{field} must be a relative path"
        )));
    }
    if s.split('/').any(|part| part == "..") {
        return Err(RotoError::validation(format!(
            "{field} must not contain '..'"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/scene/scene.rs"]
mod tests;
