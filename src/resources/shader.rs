//! Shader programs from a vertex/fragment pair of WGSL files.
//!
//! Each stage is parsed and validated on its own with naga, then the two are
//! linked: every `@location` the fragment stage reads must be written by the
//! vertex stage with the same type, and a resource binding used by both stages
//! must agree on its address space. Validation only grants the capabilities
//! the session's device supports. GPU modules are only created once both
//! stages compiled and linked.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use naga::{
    AddressSpace, Binding, Handle, Module, ResourceBinding, Type, TypeInner,
    valid::{Capabilities, ModuleInfo, ValidationFlags, Validator},
};

use crate::{error::ShaderError, gpu::GpuSession, resources::AssetReader};

pub const DEFAULT_VERTEX_SOURCE: &str = include_str!("shaders/default.vert.wgsl");
pub const DEFAULT_FRAGMENT_SOURCE: &str = include_str!("shaders/default.frag.wgsl");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Where a named shader input lives.
///
/// Compilers may drop bindings the shader never uses, so asking for such a
/// name yields [`Location::Unbound`] instead of an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// Vertex attribute `@location(n)`.
    Attribute(u32),
    /// Uniform, storage buffer, texture or sampler `@group(g) @binding(b)`.
    Resource { group: u32, binding: u32 },
    Unbound,
}

impl Location {
    pub fn is_bound(&self) -> bool {
        !matches!(self, Location::Unbound)
    }
}

/// Name lookup of the active inputs of a linked program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    attributes: HashMap<String, u32>,
    resources: HashMap<String, (u32, u32)>,
}

impl ShaderReflection {
    pub fn location(&self, name: &str) -> Location {
        if let Some(&location) = self.attributes.get(name) {
            return Location::Attribute(location);
        }
        match self.resources.get(name) {
            Some(&(group, binding)) => Location::Resource { group, binding },
            None => Location::Unbound,
        }
    }

    /// Vertex attribute name to `@location`, as consumed by the layout binder.
    pub fn attribute_locations(&self) -> &HashMap<String, u32> {
        &self.attributes
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, u32, u32)> {
        self.resources
            .iter()
            .map(|(name, &(group, binding))| (name.as_str(), group, binding))
    }
}

/// A compiled and linked vertex/fragment pair.
#[derive(Debug)]
pub struct Program<M> {
    pub vertex: M,
    pub fragment: M,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub reflection: ShaderReflection,
}

impl<M> Program<M> {
    pub fn location(&self, name: &str) -> Location {
        self.reflection.location(name)
    }

    pub fn attribute_locations(&self) -> &HashMap<String, u32> {
        self.reflection.attribute_locations()
    }
}

/// A stage that parsed and validated on its own.
struct ValidatedStage {
    stage: ShaderStage,
    path: PathBuf,
    module: Module,
    info: ModuleInfo,
}

impl ValidatedStage {
    /// Pick the entry point of `self.stage`; its absence is a link problem.
    fn into_compiled(self) -> Result<CompiledStage, String> {
        let stage = self.stage.naga();
        match self.module.entry_points.iter().position(|entry| entry.stage == stage) {
            Some(entry_index) => Ok(CompiledStage {
                module: self.module,
                info: self.info,
                entry_index,
            }),
            None => Err(format!("{}: no @{} entry point", self.path.display(), self.stage)),
        }
    }
}

struct CompiledStage {
    module: Module,
    info: ModuleInfo,
    entry_index: usize,
}

impl CompiledStage {
    fn entry(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry_index]
    }
}

#[derive(Debug)]
struct InterfaceVar {
    location: u32,
    name: String,
    inner: TypeInner,
}

/// Read both stages from disk and build a program.
pub fn compile<S: GpuSession>(
    session: &S,
    reader: &mut AssetReader,
    vertex_path: &Path,
    fragment_path: &Path,
) -> Result<Program<S::ShaderModule>, ShaderError> {
    let vertex_source = reader.read_string(vertex_path)?;
    let fragment_source = reader.read_string(fragment_path)?;
    compile_sources(
        session,
        (vertex_path, &vertex_source),
        (fragment_path, &fragment_source),
    )
}

/// Build a program from in-memory sources. The paths only label diagnostics
/// and GPU objects.
pub fn compile_sources<S: GpuSession>(
    session: &S,
    (vertex_path, vertex_source): (&Path, &str),
    (fragment_path, fragment_source): (&Path, &str),
) -> Result<Program<S::ShaderModule>, ShaderError> {
    let capabilities = session.capabilities();
    let vertex = compile_stage(ShaderStage::Vertex, vertex_path, vertex_source, capabilities)?;
    let fragment = compile_stage(ShaderStage::Fragment, fragment_path, fragment_source, capabilities)?;
    let (vertex, fragment) = match (vertex.into_compiled(), fragment.into_compiled()) {
        (Ok(vertex), Ok(fragment)) => (vertex, fragment),
        (vertex, fragment) => {
            let missing: Vec<String> = [vertex.err(), fragment.err()].into_iter().flatten().collect();
            return Err(ShaderError::Link {
                log: missing.join("\n"),
            });
        }
    };
    let reflection = link(&vertex, &fragment)?;

    let vertex_module = session.create_shader_module(
        &vertex_path.display().to_string(),
        ShaderStage::Vertex,
        vertex_source,
    );
    let fragment_module = session.create_shader_module(
        &fragment_path.display().to_string(),
        ShaderStage::Fragment,
        fragment_source,
    );
    Ok(Program {
        vertex: vertex_module,
        fragment: fragment_module,
        vertex_entry: vertex.entry().name.clone(),
        fragment_entry: fragment.entry().name.clone(),
        reflection,
    })
}

fn compile_stage(
    stage: ShaderStage,
    path: &Path,
    source: &str,
    capabilities: Capabilities,
) -> Result<ValidatedStage, ShaderError> {
    let compile_error = |log: String| ShaderError::Compile {
        stage,
        path: PathBuf::from(path),
        log,
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| compile_error(e.emit_to_string(source)))?;
    let info = Validator::new(ValidationFlags::all(), capabilities)
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    Ok(ValidatedStage {
        stage,
        path: PathBuf::from(path),
        module,
        info,
    })
}

fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<ShaderReflection, ShaderError> {
    let mut problems = Vec::new();

    let mut outputs = Vec::new();
    if let Some(result) = &vertex.entry().function.result {
        collect_interface(&vertex.module, result.ty, result.binding.as_ref(), None, &mut outputs);
    }
    let mut inputs = Vec::new();
    for argument in &fragment.entry().function.arguments {
        collect_interface(
            &fragment.module,
            argument.ty,
            argument.binding.as_ref(),
            argument.name.as_deref(),
            &mut inputs,
        );
    }
    for input in &inputs {
        match outputs.iter().find(|output| output.location == input.location) {
            None => problems.push(format!(
                "fragment input `{}` at location {} is not written by the vertex stage",
                input.name, input.location
            )),
            Some(output) if output.inner != input.inner => problems.push(format!(
                "location {}: vertex stage writes `{}` as {:?}, fragment stage reads `{}` as {:?}",
                input.location, output.name, output.inner, input.name, input.inner
            )),
            Some(_) => {}
        }
    }

    let vertex_resources = active_resources(vertex);
    let fragment_resources = active_resources(fragment);
    for (name, binding, space) in &fragment_resources {
        let clash = vertex_resources
            .iter()
            .find(|(_, other, other_space)| other == binding && other_space != space);
        if let Some((other_name, _, other_space)) = clash {
            problems.push(format!(
                "@group({}) @binding({}) is `{other_name}` ({other_space:?}) in the vertex stage but `{name}` ({space:?}) in the fragment stage",
                binding.group, binding.binding
            ));
        }
    }

    if !problems.is_empty() {
        return Err(ShaderError::Link {
            log: problems.join("\n"),
        });
    }

    let mut attributes = Vec::new();
    for argument in &vertex.entry().function.arguments {
        collect_interface(
            &vertex.module,
            argument.ty,
            argument.binding.as_ref(),
            argument.name.as_deref(),
            &mut attributes,
        );
    }
    Ok(ShaderReflection {
        attributes: attributes
            .into_iter()
            .map(|attribute| (attribute.name, attribute.location))
            .collect(),
        resources: vertex_resources
            .into_iter()
            .chain(fragment_resources)
            .map(|(name, binding, _)| (name, (binding.group, binding.binding)))
            .collect(),
    })
}

/// Flatten `@location` bindings, descending into struct members.
fn collect_interface(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut Vec<InterfaceVar>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(InterfaceVar {
            location: *location,
            name: name.unwrap_or_default().to_string(),
            inner: module.types[ty].inner.clone(),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_interface(module, member.ty, member.binding.as_ref(), member.name.as_deref(), out);
                }
            }
        }
    }
}

/// Globals with a resource binding that the stage's entry point actually uses.
fn active_resources(stage: &CompiledStage) -> Vec<(String, ResourceBinding, AddressSpace)> {
    let entry_info = stage.info.get_entry_point(stage.entry_index);
    stage
        .module
        .global_variables
        .iter()
        .filter_map(|(handle, variable)| {
            let binding = variable.binding.clone()?;
            if entry_info[handle].is_empty() {
                return None;
            }
            Some((variable.name.clone().unwrap_or_default(), binding, variable.space))
        })
        .collect()
}
