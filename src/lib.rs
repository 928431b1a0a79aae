//! rotoframe builds rotation animations out of layered images.
//!
//! A static *backdrop* layer is combined with copies of a *rotor* layer rotated by successive
//! increments of `2π / steps`; every rotated copy is merged down onto its own copy of the
//! backdrop, yielding one layer per animation frame.
//!
//! # Layout
//!
//! - [`ProcedureDb`] is the image editor's procedure database as the compositor sees it:
//!   copy, insert, rotate, merge-down and lookup on opaque [`ImageId`] / [`LayerId`] handles.
//! - [`compose`] is the frame compositor; [`animate_rotate`] and [`animate_rotate_by_name`]
//!   are the two plugin entry points over it, and [`Registry`] carries their registration
//!   records.
//! - [`RasterHost`] is an in-memory host with real pixels, used by the CLI and the tests.
//! - [`Scene`] is the JSON description the CLI renders.
//!
//! The host document is a shared mutable resource; all calls are sequential and a failure
//! leaves whatever the completed calls produced.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compose;
mod foundation;
mod host;
mod plugin;
mod scene;

pub use compose::rotor::{FRAME_MERGE_MODE, RotationParams, compose};
pub use compose::schedule::{RotationSchedule, RotationStep};
pub use foundation::core::{
    Affine, Canvas, ImageId, ImageType, LayerId, MergeMode, Point, Rect, RotateCenter, Vec2,
};
pub use foundation::error::{RotoError, RotoResult};
pub use foundation::math::{rotation_angle, step_angle};
pub use host::pdb::ProcedureDb;
pub use host::raster::{FlatImage, HostCall, RasterHost, RasterImage, RasterLayer};
pub use plugin::entry::{
    BACKDROP_LAYER_NAME, ROTATE_IMAGE_TYPES, ROTOR_LAYER_NAME, RotateLayers, RotateOptions,
    animate_rotate, animate_rotate_by_name, resolve_named_layers,
};
pub use plugin::registry::{
    EntryShape, ImageTypes, ParamDef, ParamKind, ParamValue, ProcedureArgs, ProcedureDef,
    Registry, animate_rotate_def, animate_rotate_by_name_def,
};
pub use scene::color::Color;
pub use scene::{LayerSource, LayerSpec, LoadedScene, RenderedScene, RotateArgs, Scene};
