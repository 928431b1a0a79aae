use std::collections::BTreeMap;

use crate::{
    foundation::{
        core::{ImageId, ImageType, LayerId},
        error::{RotoError, RotoResult},
    },
    host::pdb::ProcedureDb,
    plugin::entry::{
        ROTATE_IMAGE_TYPES, RotateLayers, RotateOptions, animate_rotate, animate_rotate_by_name,
    },
};

/// Declared type of a procedure parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// 32-bit integer.
    Int,
    /// Boolean flag.
    Bool,
    /// Reference to a layer of the target image.
    Layer,
}

/// A parameter value, tagged with its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    /// Integer value.
    Int(i32),
    /// Boolean value.
    Bool(bool),
    /// Layer reference; `None` when unset.
    Layer(Option<LayerId>),
}

impl ParamValue {
    /// Kind of this value.
    pub fn kind(self) -> ParamKind {
        match self {
            Self::Int(_) => ParamKind::Int,
            Self::Bool(_) => ParamKind::Bool,
            Self::Layer(_) => ParamKind::Layer,
        }
    }
}

/// One declared parameter. `kind` must match the kind of `default`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParamDef {
    /// Declared type.
    pub kind: ParamKind,
    /// Parameter name used for binding.
    pub name: String,
    /// Human-readable label.
    pub description: String,
    /// Value used when the caller omits the parameter.
    pub default: ParamValue,
}

impl ParamDef {
    fn new(name: &str, description: &str, default: ParamValue) -> Self {
        Self {
            kind: default.kind(),
            name: name.to_owned(),
            description: description.to_owned(),
            default,
        }
    }
}

/// A host image-type list such as `"RGB*, GRAY*"`; a trailing `*` matches any suffix.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageTypes(String);

impl ImageTypes {
    /// Wrap a comma-separated type list.
    pub fn new(list: impl Into<String>) -> Self {
        Self(list.into())
    }

    /// Whether `mode` matches any entry of the list.
    pub fn accepts(&self, mode: ImageType) -> bool {
        let mode = mode.as_str();
        self.0
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => mode.starts_with(prefix),
                None => mode == pattern,
            })
    }

    /// The list as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which adapter a procedure dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryShape {
    /// Layers passed as `rotorlayer` / `backdroplayer` parameters.
    ExplicitLayers,
    /// Layers found by their fixed names.
    ByName,
}

static OPTION_BINDINGS: [(&str, ParamKind); 4] = [
    ("steps", ParamKind::Int),
    ("autocenter", ParamKind::Bool),
    ("cx", ParamKind::Int),
    ("cy", ParamKind::Int),
];

static LAYER_BINDINGS: [(&str, ParamKind); 2] = [
    ("rotorlayer", ParamKind::Layer),
    ("backdroplayer", ParamKind::Layer),
];

impl EntryShape {
    /// Parameters [`Registry::run`] binds for this shape, with their kinds.
    pub fn bindings(self) -> impl Iterator<Item = (&'static str, ParamKind)> {
        let layers: &[(&str, ParamKind)] = match self {
            Self::ExplicitLayers => &LAYER_BINDINGS,
            Self::ByName => &[],
        };
        OPTION_BINDINGS.iter().chain(layers).copied()
    }
}

/// Registration record of a procedure, as the host's menu and dialogs see it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProcedureDef {
    /// Symbolic command identifier.
    pub name: String,
    /// One-line description.
    pub blurb: String,
    /// Longer help text.
    pub help: String,
    /// Author credit.
    pub author: String,
    /// Copyright holder.
    pub copyright: String,
    /// Copyright date.
    pub date: String,
    /// Menu location.
    pub menu_path: String,
    /// Image modes the procedure accepts.
    pub image_types: ImageTypes,
    /// Declared parameters, in dialog order.
    pub params: Vec<ParamDef>,
    /// Adapter the procedure runs.
    pub entry: EntryShape,
}

/// Named arguments for [`Registry::run`].
pub type ProcedureArgs = BTreeMap<String, ParamValue>;

fn option_params() -> [ParamDef; 2] {
    let defaults = RotateOptions::default();
    [
        ParamDef::new("steps", "Animation Steps", ParamValue::Int(defaults.steps)),
        ParamDef::new(
            "autocenter",
            "Rotate around the center of the rotor",
            ParamValue::Bool(defaults.autocenter),
        ),
    ]
}

fn center_params() -> [ParamDef; 2] {
    let defaults = RotateOptions::default();
    [
        ParamDef::new("cx", "X Center of rotation", ParamValue::Int(defaults.cx)),
        ParamDef::new("cy", "Y Center of rotation", ParamValue::Int(defaults.cy)),
    ]
}

/// Procedure taking explicit rotor and backdrop layers.
pub fn animate_rotate_def() -> ProcedureDef {
    let mut params = option_params().to_vec();
    params.push(ParamDef::new(
        "rotorlayer",
        "Which layer should be rotated",
        ParamValue::Layer(None),
    ));
    params.push(ParamDef::new(
        "backdroplayer",
        "Which layer should be static",
        ParamValue::Layer(None),
    ));
    params.extend(center_params());

    ProcedureDef {
        name: "python_fu_animate_rotate".to_owned(),
        blurb: "Animates an image by rotating a layer".to_owned(),
        help: "Rotates the rotor layer steps times around either its center or a given point \
               and merges each rotated copy onto a copy of the backdrop layer"
            .to_owned(),
        author: "Lenni vH".to_owned(),
        copyright: "Lenni vH".to_owned(),
        date: "2020".to_owned(),
        menu_path: "<Image>/Filters/Animation/Rotate...".to_owned(),
        image_types: ImageTypes::new(ROTATE_IMAGE_TYPES),
        params,
        entry: EntryShape::ExplicitLayers,
    }
}

/// Procedure using the layers named `rotor` and `backdrop`.
pub fn animate_rotate_by_name_def() -> ProcedureDef {
    let mut params = option_params().to_vec();
    params.extend(center_params());

    ProcedureDef {
        name: "python_fu_animate_rotate_by_name".to_owned(),
        blurb: "Animates an image by rotating the layer named \"rotor\"".to_owned(),
        help: "Like Rotate..., but always rotates the layer named \"rotor\" over the layer \
               named \"backdrop\""
            .to_owned(),
        author: "Lenni vH".to_owned(),
        copyright: "Lenni vH".to_owned(),
        date: "2020".to_owned(),
        menu_path: "<Image>/Filters/Animation/Rotate (named layers)...".to_owned(),
        image_types: ImageTypes::new(ROTATE_IMAGE_TYPES),
        params,
        entry: EntryShape::ByName,
    }
}

/// Procedures known to the plugin, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    procs: BTreeMap<String, ProcedureDef>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding both rotation procedures.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        for def in [animate_rotate_def(), animate_rotate_by_name_def()] {
            reg.procs.insert(def.name.clone(), def);
        }
        reg
    }

    /// Add a procedure. Names must be unique and non-empty, as must parameter names.
    ///
    /// Every parameter the procedure's entry shape binds must be declared with its kind, and
    /// each declared kind must agree with its default.
    pub fn register(&mut self, def: ProcedureDef) -> RotoResult<()> {
        if def.name.trim().is_empty() {
            return Err(RotoError::validation("procedure name must be non-empty"));
        }
        if self.procs.contains_key(&def.name) {
            return Err(RotoError::validation(format!(
                "procedure '{}' is already registered",
                def.name
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        for p in &def.params {
            if !seen.insert(p.name.as_str()) {
                return Err(RotoError::validation(format!(
                    "procedure '{}' declares parameter '{}' twice",
                    def.name, p.name
                )));
            }
            if p.kind != p.default.kind() {
                return Err(RotoError::validation(format!(
                    "parameter '{}' of '{}' is declared {:?} but defaults to {:?}",
                    p.name,
                    def.name,
                    p.kind,
                    p.default.kind()
                )));
            }
        }
        for (name, kind) in def.entry.bindings() {
            match def.params.iter().find(|p| p.name == name) {
                None => {
                    return Err(RotoError::validation(format!(
                        "procedure '{}' must declare parameter '{name}'",
                        def.name
                    )));
                }
                Some(p) if p.kind != kind => {
                    return Err(RotoError::validation(format!(
                        "parameter '{name}' of '{}' must be {kind:?}, not {:?}",
                        def.name, p.kind
                    )));
                }
                Some(_) => {}
            }
        }
        self.procs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Look up a procedure.
    pub fn get(&self, name: &str) -> Option<&ProcedureDef> {
        self.procs.get(name)
    }

    /// All procedures, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &ProcedureDef> {
        self.procs.values()
    }

    /// Bind `args` against procedure `name` and run it on `image`.
    ///
    /// Omitted parameters take their declared defaults. Unknown names and kind mismatches are
    /// validation errors; an unset layer parameter is an invalid reference.
    pub fn run<P: ProcedureDb + ?Sized>(
        &self,
        name: &str,
        pdb: &mut P,
        image: ImageId,
        args: &ProcedureArgs,
    ) -> RotoResult<LayerId> {
        let def = self
            .get(name)
            .ok_or_else(|| RotoError::validation(format!("unknown procedure '{name}'")))?;
        let bound = BoundArgs::bind(def, args)?;
        let opts = RotateOptions {
            steps: bound.int("steps")?,
            autocenter: bound.flag("autocenter")?,
            cx: bound.int("cx")?,
            cy: bound.int("cy")?,
        };

        tracing::debug!(procedure = %def.name, ?opts, "running procedure");
        match def.entry {
            EntryShape::ExplicitLayers => {
                let layers = RotateLayers {
                    rotor: bound.layer("rotorlayer")?,
                    backdrop: bound.layer("backdroplayer")?,
                };
                animate_rotate(pdb, image, layers, &opts)
            }
            EntryShape::ByName => animate_rotate_by_name(pdb, image, &opts),
        }
    }
}

struct BoundArgs<'a> {
    procedure: &'a str,
    values: BTreeMap<&'a str, ParamValue>,
}

impl<'a> BoundArgs<'a> {
    fn bind(def: &'a ProcedureDef, args: &ProcedureArgs) -> RotoResult<Self> {
        if let Some(unknown) = args
            .keys()
            .find(|k| !def.params.iter().any(|p| &p.name == *k))
        {
            return Err(RotoError::validation(format!(
                "procedure '{}' has no parameter '{unknown}'",
                def.name
            )));
        }

        let mut values = BTreeMap::new();
        for p in &def.params {
            let value = args.get(&p.name).copied().unwrap_or(p.default);
            if value.kind() != p.kind {
                return Err(RotoError::validation(format!(
                    "parameter '{}' of '{}' expects {:?}, got {:?}",
                    p.name,
                    def.name,
                    p.kind,
                    value.kind()
                )));
            }
            values.insert(p.name.as_str(), value);
        }
        Ok(Self {
            procedure: &def.name,
            values,
        })
    }

    fn get(&self, name: &str) -> RotoResult<ParamValue> {
        self.values.get(name).copied().ok_or_else(|| {
            RotoError::validation(format!(
                "procedure '{}' does not declare '{name}'",
                self.procedure
            ))
        })
    }

    fn int(&self, name: &str) -> RotoResult<i32> {
        match self.get(name)? {
            ParamValue::Int(v) => Ok(v),
            other => Err(self.mismatch(name, other)),
        }
    }

    fn flag(&self, name: &str) -> RotoResult<bool> {
        match self.get(name)? {
            ParamValue::Bool(v) => Ok(v),
            other => Err(self.mismatch(name, other)),
        }
    }

    fn layer(&self, name: &str) -> RotoResult<LayerId> {
        match self.get(name)? {
            ParamValue::Layer(Some(id)) => Ok(id),
            ParamValue::Layer(None) => Err(RotoError::invalid_reference(format!(
                "parameter '{name}' of '{}' names no layer",
                self.procedure
            ))),
            other => Err(self.mismatch(name, other)),
        }
    }

    fn mismatch(&self, name: &str, got: ParamValue) -> RotoError {
        RotoError::validation(format!(
            "parameter '{name}' of '{}' has unexpected kind {:?}",
            self.procedure,
            got.kind()
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugin/registry.rs"]
mod tests;
