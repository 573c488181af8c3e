//! Level files.
//!
//! A level is an XML document with a `<scene>` root holding nested `<node>` and
//! `<light>` elements:
//!
//! ```xml
//! <scene name="yard">
//!   <node id="crate" position="0 1 0" rotation="0 45 0" mesh="meshes/crate.obj"
//!         material="materials/crate"
//!         vertex_shader="shaders/lit.vert.wgsl" fragment_shader="shaders/lit.frag.wgsl">
//!     <node id="lid" position="0 0.5 0"/>
//!   </node>
//!   <light id="sun" kind="directional" position="0 10 0" color="1 1 1" intensity="2"/>
//! </scene>
//! ```
//!
//! Loading happens in two phases. The whole document is parsed first; any
//! markup or attribute error rejects it before a single asset is touched. Only
//! then are mesh, material and shader references resolved, and a reference
//! that fails to load downgrades its node to engine defaults with a warning.

use std::{borrow::Cow, path::Path};

use cgmath::Vector3;
use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, Event},
};

use crate::{
    context::Context,
    data_structures::{
        light::{LightKind, LightSource},
        scene_graph::{AssetRef, MeshNode, MeshSource, Node, NodeKind, SceneGraph, Transform},
    },
    error::{LevelError, LoadWarning},
    gpu::GpuSession,
};

const SCENE: &str = "scene";
const NODE: &str = "node";
const LIGHT: &str = "light";

/// A parsed but not yet resolved node.
#[derive(Clone, Debug, PartialEq)]
struct NodeDesc {
    id: String,
    transform: Transform,
    kind: KindDesc,
    children: Vec<NodeDesc>,
}

#[derive(Clone, Debug, PartialEq)]
enum KindDesc {
    Group,
    Mesh(MeshSource),
    Light(LightSource),
}

#[derive(Debug, Default)]
struct Document {
    name: Option<String>,
    nodes: Vec<NodeDesc>,
}

/// Parse and resolve the level at `path`.
pub fn load<S: GpuSession>(ctx: &mut Context<S>, path: &Path) -> Result<SceneGraph, LevelError> {
    let started = instant::Instant::now();
    let text = ctx.reader.read_string(path)?;
    let document = parse_document(path, &text)?;

    let mut warnings = Vec::new();
    let nodes = document
        .nodes
        .into_iter()
        .map(|desc| resolve_node(ctx, desc, &mut warnings))
        .collect();
    let graph = SceneGraph {
        name: document.name,
        nodes,
        warnings,
    };

    log::info!(
        "loaded level {} ({} nodes, {} warnings) in {:?}",
        path.display(),
        graph.node_count(),
        graph.warnings.len(),
        started.elapsed()
    );
    Ok(graph)
}

fn resolve_node<S: GpuSession>(ctx: &mut Context<S>, desc: NodeDesc, warnings: &mut Vec<LoadWarning>) -> Node {
    let kind = match desc.kind {
        KindDesc::Group => NodeKind::Group,
        KindDesc::Light(light) => NodeKind::Light(light),
        KindDesc::Mesh(source) => NodeKind::Mesh(Box::new(resolve_mesh_node(ctx, &desc.id, source, warnings))),
    };
    let children = desc
        .children
        .into_iter()
        .map(|child| resolve_node(ctx, child, warnings))
        .collect();
    Node {
        id: desc.id,
        transform: desc.transform,
        kind,
        children,
    }
}

fn resolve_mesh_node<S: GpuSession>(
    ctx: &mut Context<S>,
    id: &str,
    source: MeshSource,
    warnings: &mut Vec<LoadWarning>,
) -> MeshNode {
    let subject = |what: &str| format!("node \"{id}\" {what}");

    let mesh_path = ctx.resolve(&source.mesh);
    let mesh = match ctx.mesh(&mesh_path) {
        Ok(mesh) => AssetRef::Loaded(mesh),
        Err(e) => {
            log::warn!("{}: {e}", subject("mesh"));
            warnings.push(LoadWarning::new(subject("mesh"), e));
            AssetRef::Missing
        }
    };

    let material = match &source.material {
        Some(dir) => {
            let dir = ctx.resolve(dir);
            let material = ctx.resolve_material(&dir);
            for warning in material.warnings() {
                warnings.push(LoadWarning::new(subject(&warning.subject), warning.reason));
            }
            material
        }
        None => ctx.default_material(),
    };

    let authored_program = match &source.shaders {
        Some((vertex, fragment)) => {
            let (vertex, fragment) = (ctx.resolve(vertex), ctx.resolve(fragment));
            match ctx.program(&vertex, &fragment) {
                Ok(program) => Some(program),
                Err(e) => {
                    log::warn!("{}: {e}", subject("shader"));
                    warnings.push(LoadWarning::new(subject("shader"), e));
                    None
                }
            }
        }
        None => None,
    };
    let program = match authored_program {
        Some(program) => AssetRef::Loaded(program),
        None => match ctx.default_program() {
            Ok(program) => AssetRef::Loaded(program),
            Err(e) => {
                log::error!("default program failed to build: {e}");
                warnings.push(LoadWarning::new(subject("default shader"), e));
                AssetRef::Missing
            }
        },
    };

    MeshNode {
        source,
        mesh_path,
        mesh,
        material,
        program,
    }
}

fn line_at(text: &str, byte_pos: usize) -> usize {
    let end = byte_pos.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

struct Parser<'a> {
    path: &'a Path,
    text: &'a str,
}

impl Parser<'_> {
    fn error(&self, byte_pos: usize, reason: impl Into<String>) -> LevelError {
        LevelError::Parse {
            path: self.path.to_path_buf(),
            line: line_at(self.text, byte_pos),
            reason: reason.into(),
        }
    }
}

fn parse_document(path: &Path, text: &str) -> Result<Document, LevelError> {
    let parser = Parser { path, text };
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut document = Document::default();
    let mut root_open = false;
    let mut root_seen = false;
    let mut stack: Vec<NodeDesc> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        // point at the next `<` rather than the preceding whitespace
        let at = before + text.get(before..).and_then(|rest| rest.find('<')).unwrap_or(0);
        let event = reader.read_event().map_err(|e| parser.error(at, e.to_string()))?;
        let opens = matches!(event, Event::Start(_));

        match event {
            Event::Start(element) | Event::Empty(element) if !root_seen => {
                let name = element_name(&parser, at, &element)?;
                if name != SCENE {
                    return Err(parser.error(at, format!("expected <{SCENE}> root element, found <{name}>")));
                }
                for (key, value) in attributes(&parser, at, &element)? {
                    match key.as_str() {
                        "name" => document.name = Some(value),
                        other => log::debug!("ignoring attribute `{other}` on <{SCENE}>"),
                    }
                }
                root_seen = true;
                root_open = opens;
            }
            Event::Start(element) | Event::Empty(element) => {
                if !root_open {
                    return Err(parser.error(at, "content after the root element"));
                }
                let name = element_name(&parser, at, &element)?;
                let attrs = attributes(&parser, at, &element)?;
                let node = match name.as_str() {
                    NODE => parse_node(&parser, at, attrs)?,
                    LIGHT => parse_light(&parser, at, attrs)?,
                    other => {
                        return Err(parser.error(
                            at,
                            format!("unexpected element <{other}>, expected <{NODE}> or <{LIGHT}>"),
                        ));
                    }
                };
                if opens {
                    stack.push(node);
                } else {
                    attach(&mut stack, &mut document, node);
                }
            }
            Event::End(_) => match stack.pop() {
                Some(node) => attach(&mut stack, &mut document, node),
                None => root_open = false,
            },
            Event::Text(content) => {
                if !content.iter().all(u8::is_ascii_whitespace) {
                    return Err(parser.error(before, "unexpected text content"));
                }
            }
            Event::CData(_) => return Err(parser.error(at, "unexpected CDATA section")),
            Event::Eof => break,
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !root_seen {
        return Err(parser.error(text.len(), format!("missing <{SCENE}> root element")));
    }
    if root_open || !stack.is_empty() {
        let unclosed = stack.last().map(|n| format!("<{}> \"{}\"", element_of(&n.kind), n.id));
        return Err(parser.error(
            text.len(),
            format!(
                "unexpected end of document, {} is not closed",
                unclosed.unwrap_or_else(|| format!("<{SCENE}>"))
            ),
        ));
    }
    Ok(document)
}

fn attach(stack: &mut Vec<NodeDesc>, document: &mut Document, node: NodeDesc) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => document.nodes.push(node),
    }
}

fn element_of(kind: &KindDesc) -> &'static str {
    match kind {
        KindDesc::Light(_) => LIGHT,
        _ => NODE,
    }
}

fn element_name(parser: &Parser<'_>, at: usize, element: &BytesStart<'_>) -> Result<String, LevelError> {
    std::str::from_utf8(element.name().as_ref())
        .map(str::to_string)
        .map_err(|e| parser.error(at, format!("element name is not UTF-8: {e}")))
}

fn attributes(parser: &Parser<'_>, at: usize, element: &BytesStart<'_>) -> Result<Vec<(String, String)>, LevelError> {
    let mut out = Vec::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| parser.error(at, e.to_string()))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| parser.error(at, format!("attribute name is not UTF-8: {e}")))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|e| parser.error(at, format!("attribute `{key}`: {e}")))?;
        out.push((key, value.into_owned()));
    }
    Ok(out)
}

fn parse_vec3(value: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<&str> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 3 {
        return Err(format!("expected three numbers, found `{value}`"));
    }
    let mut out = [0.0f32; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = parse_f32(part)?;
    }
    Ok(out.into())
}

fn parse_f32(value: &str) -> Result<f32, String> {
    match value.trim().parse::<f32>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(format!("`{value}` is not a finite number")),
    }
}

/// Shared by `<node>` and `<light>`; returns the attributes it did not consume.
fn parse_common(
    parser: &Parser<'_>,
    at: usize,
    attrs: Vec<(String, String)>,
) -> Result<(String, Transform, Vec<(String, String)>), LevelError> {
    let mut id = String::new();
    let mut transform = Transform::default();
    let mut rest = Vec::new();
    for (key, value) in attrs {
        let field = match key.as_str() {
            "id" => {
                id = value;
                continue;
            }
            "position" => &mut transform.position,
            "rotation" => &mut transform.rotation,
            "scale" => &mut transform.scale,
            _ => {
                rest.push((key, value));
                continue;
            }
        };
        *field = parse_vec3(&value).map_err(|e| parser.error(at, format!("attribute `{key}`: {e}")))?;
    }
    Ok((id, transform, rest))
}

fn parse_node(parser: &Parser<'_>, at: usize, attrs: Vec<(String, String)>) -> Result<NodeDesc, LevelError> {
    let (id, transform, rest) = parse_common(parser, at, attrs)?;
    let mut mesh = None;
    let mut material = None;
    let mut vertex_shader = None;
    let mut fragment_shader = None;
    for (key, value) in rest {
        match key.as_str() {
            "mesh" => mesh = Some(value),
            "material" => material = Some(value),
            "vertex_shader" => vertex_shader = Some(value),
            "fragment_shader" => fragment_shader = Some(value),
            other => log::debug!("ignoring attribute `{other}` on <{NODE}> \"{id}\""),
        }
    }

    let shaders = match (vertex_shader, fragment_shader) {
        (Some(vertex), Some(fragment)) => Some((vertex, fragment)),
        (None, None) => None,
        _ => {
            return Err(parser.error(
                at,
                format!("<{NODE}> \"{id}\" must name both vertex_shader and fragment_shader or neither"),
            ));
        }
    };
    let kind = match mesh {
        Some(mesh) if mesh.trim().is_empty() => {
            return Err(parser.error(at, format!("<{NODE}> \"{id}\" has an empty mesh reference")));
        }
        Some(mesh) => KindDesc::Mesh(MeshSource {
            mesh,
            material,
            shaders,
        }),
        None if material.is_some() || shaders.is_some() => {
            return Err(parser.error(
                at,
                format!("<{NODE}> \"{id}\" names a material or shaders but no mesh"),
            ));
        }
        None => KindDesc::Group,
    };

    Ok(NodeDesc {
        id,
        transform,
        kind,
        children: Vec::new(),
    })
}

fn parse_light(parser: &Parser<'_>, at: usize, attrs: Vec<(String, String)>) -> Result<NodeDesc, LevelError> {
    let (id, transform, rest) = parse_common(parser, at, attrs)?;
    let mut light = LightSource::default();
    for (key, value) in rest {
        let attribute_error = |e: String| parser.error(at, format!("attribute `{key}`: {e}"));
        match key.as_str() {
            "kind" => light.kind = value.parse::<LightKind>().map_err(attribute_error)?,
            "color" => light.color = parse_vec3(&value).map_err(attribute_error)?,
            "intensity" => {
                light.intensity = parse_f32(&value).map_err(attribute_error)?;
                if light.intensity < 0.0 {
                    return Err(parser.error(at, format!("<{LIGHT}> \"{id}\" has a negative intensity")));
                }
            }
            other => log::debug!("ignoring attribute `{other}` on <{LIGHT}> \"{id}\""),
        }
    }
    Ok(NodeDesc {
        id,
        transform,
        kind: KindDesc::Light(light),
        children: Vec::new(),
    })
}

/// Write `graph` as a level file.
///
/// References are written exactly as authored. The document is serialized in
/// memory and written in one call.
pub fn save(path: &Path, graph: &SceneGraph) -> Result<(), LevelError> {
    let write_error = |reason: String| LevelError::Write {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = serialize(graph).map_err(write_error)?;
    std::fs::write(path, bytes).map_err(|e| write_error(e.to_string()))?;
    log::info!("saved level {} ({} nodes)", path.display(), graph.node_count());
    Ok(())
}

fn serialize(graph: &SceneGraph) -> Result<Vec<u8>, String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| e.to_string())?;

    let mut scene = BytesStart::new(SCENE);
    if let Some(name) = &graph.name {
        scene.push_attribute(("name", name.as_str()));
    }
    if graph.nodes.is_empty() {
        writer.write_event(Event::Empty(scene)).map_err(|e| e.to_string())?;
    } else {
        writer.write_event(Event::Start(scene)).map_err(|e| e.to_string())?;
        for node in &graph.nodes {
            write_node(&mut writer, node)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(SCENE)))
            .map_err(|e| e.to_string())?;
    }

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn format_vec3(v: &Vector3<f32>) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), String> {
    let name = match node.kind {
        NodeKind::Light(_) => LIGHT,
        _ => NODE,
    };
    let mut attrs: Vec<(&str, Cow<'_, str>)> = Vec::new();
    if !node.id.is_empty() {
        attrs.push(("id", Cow::Borrowed(node.id.as_str())));
    }
    let defaults = Transform::default();
    if node.transform.position != defaults.position {
        attrs.push(("position", format_vec3(&node.transform.position).into()));
    }
    if node.transform.rotation != defaults.rotation {
        attrs.push(("rotation", format_vec3(&node.transform.rotation).into()));
    }
    if node.transform.scale != defaults.scale {
        attrs.push(("scale", format_vec3(&node.transform.scale).into()));
    }

    match &node.kind {
        NodeKind::Group => {}
        NodeKind::Mesh(mesh) => {
            attrs.push(("mesh", Cow::Borrowed(mesh.source.mesh.as_str())));
            if let Some(material) = &mesh.source.material {
                attrs.push(("material", Cow::Borrowed(material.as_str())));
            }
            if let Some((vertex, fragment)) = &mesh.source.shaders {
                attrs.push(("vertex_shader", Cow::Borrowed(vertex.as_str())));
                attrs.push(("fragment_shader", Cow::Borrowed(fragment.as_str())));
            }
        }
        NodeKind::Light(light) => {
            let defaults = LightSource::default();
            if light.kind != defaults.kind {
                attrs.push(("kind", light.kind.as_str().into()));
            }
            if light.color != defaults.color {
                attrs.push(("color", format_vec3(&light.color).into()));
            }
            if light.intensity != defaults.intensity {
                attrs.push(("intensity", light.intensity.to_string().into()));
            }
        }
    }

    let mut start = BytesStart::new(name);
    for (key, value) in &attrs {
        start.push_attribute((*key, value.as_ref()));
    }
    if node.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(|e| e.to_string())?;
    } else {
        writer.write_event(Event::Start(start)).map_err(|e| e.to_string())?;
        for child in &node.children {
            write_node(writer, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}
