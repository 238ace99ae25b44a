//! Shader program building.
//!
//! A program is a vertex + fragment pair of WGSL sources. Building happens in
//! two steps:
//! - `link_program` parses and validates each stage with `naga` and checks
//!   that the stages fit together (entry points, inter-stage locations)
//! - the back-end turns the resulting [`LinkedProgram`] into a GPU pipeline
//!
//! All diagnostics are therefore produced on the CPU, before any GPU object
//! exists.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::asset;
use crate::error::{Error, Result};

pub use builtin::{colormap_program, label_program, COLORMAP_FRAGMENT, LABEL_FRAGMENT, VIEWPORT_QUAD_VERTEX};

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// WGSL sources and entry points for one program.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: String,
    pub fragment: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

impl ProgramSource {
    /// Sources with the conventional `vs_main` / `fs_main` entry points.
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            label: "program".to_string(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
        }
    }

    /// Loads both stages from files.
    pub fn from_files(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Result<Self> {
        let label = vertex
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "program".to_string());
        Ok(Self::new(asset::load_text(vertex)?, asset::load_text(fragment)?).with_label(label))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_entries(mut self, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.vertex_entry = vertex.into();
        self.fragment_entry = fragment.into();
        self
    }
}

/// A program whose stages compiled and link against each other.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    source: ProgramSource,
    varyings: Vec<u32>,
}

impl LinkedProgram {
    pub fn source(&self) -> &ProgramSource {
        &self.source
    }

    pub fn label(&self) -> &str {
        &self.source.label
    }

    /// Inter-stage locations consumed by the fragment stage, ascending.
    pub fn varyings(&self) -> &[u32] {
        &self.varyings
    }
}

/// Compiles both stages and links them into one program.
///
/// Fails with [`Error::ShaderCompile`] (parse or validation failure; the log
/// is the compiler diagnostic) or [`Error::ShaderLink`] (missing entry point,
/// or a fragment input without a matching vertex output).
pub fn link_program(source: &ProgramSource) -> Result<LinkedProgram> {
    let vertex = compile(ShaderStage::Vertex, &source.vertex)?;
    let fragment = compile(ShaderStage::Fragment, &source.fragment)?;

    let vs = find_entry(&vertex, naga::ShaderStage::Vertex, &source.vertex_entry)
        .ok_or_else(|| missing_entry(ShaderStage::Vertex, &source.vertex_entry))?;
    let fs = find_entry(&fragment, naga::ShaderStage::Fragment, &source.fragment_entry)
        .ok_or_else(|| missing_entry(ShaderStage::Fragment, &source.fragment_entry))?;

    let mut outputs = BTreeMap::new();
    if let Some(result) = &vs.function.result {
        collect_locations(&vertex, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = BTreeMap::new();
    for arg in &fs.function.arguments {
        collect_locations(&fragment, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut problems = Vec::new();
    for (location, ty) in &inputs {
        match outputs.get(location) {
            None => problems.push(format!(
                "fragment input @location({location}) is not written by `{}`",
                source.vertex_entry
            )),
            Some(out_ty) if out_ty != ty => problems.push(format!(
                "@location({location}) type mismatch: vertex writes {out_ty:?}, fragment reads {ty:?}"
            )),
            Some(_) => {}
        }
    }
    if !problems.is_empty() {
        return Err(Error::ShaderLink(format!("{}: {}", source.label, problems.join("\n"))));
    }

    log::debug!("linked program `{}` ({} varyings)", source.label, inputs.len());
    Ok(LinkedProgram {
        source: source.clone(),
        varyings: inputs.into_keys().collect(),
    })
}

fn compile(stage: ShaderStage, wgsl: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(wgsl).map_err(|e| Error::ShaderCompile {
        stage,
        log: e.emit_to_string(wgsl),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator.validate(&module).map_err(|e| Error::ShaderCompile {
        stage,
        log: e.emit_to_string(wgsl),
    })?;

    Ok(module)
}

fn find_entry<'m>(
    module: &'m naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
}

fn missing_entry(stage: ShaderStage, name: &str) -> Error {
    Error::ShaderLink(format!("{stage} entry point `{name}` not found"))
}

/// Records every `@location` reachable from a binding, looking one level into
/// structs.
fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeMap<u32, naga::TypeInner>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.insert(*location, module.types[ty].inner.clone());
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    if let Some(naga::Binding::Location { location, .. }) = &m.binding {
                        out.insert(*location, module.types[m.ty].inner.clone());
                    }
                }
            }
        }
    }
}
