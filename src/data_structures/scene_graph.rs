//! Scene graph of a loaded level.
//!
//! A [`SceneGraph`] owns an ordered tree of [`Node`]s. What a node is (a group,
//! a mesh or a light) is a closed [`NodeKind`] matched on by consumers. Mesh
//! nodes hold ids into the [`RenderResourceCache`](crate::resources::cache::RenderResourceCache),
//! never the GPU objects themselves, plus the authored references they were
//! loaded from so the graph can be written back.

use std::path::PathBuf;

use cgmath::{Deg, Euler, Matrix4, Quaternion, SquareMatrix, Vector3};

use crate::{
    data_structures::light::{LightDescriptor, LightSource},
    error::LoadWarning,
    resources::{
        cache::{MeshId, ProgramId},
        material::Material,
    },
};

/// Local transform; rotation is XYZ Euler angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let rotation = Quaternion::from(Euler::new(
            Deg(self.rotation.x),
            Deg(self.rotation.y),
            Deg(self.rotation.z),
        ));
        Matrix4::from_translation(self.position)
            * Matrix4::from(rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// A reference that either resolved to a cached resource or explicitly did not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetRef<Id> {
    Loaded(Id),
    Missing,
}

impl<Id: Copy> AssetRef<Id> {
    pub fn loaded(&self) -> Option<Id> {
        match self {
            AssetRef::Loaded(id) => Some(*id),
            AssetRef::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, AssetRef::Missing)
    }
}

/// References of a mesh node exactly as authored, relative to the asset root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshSource {
    pub mesh: String,
    pub material: Option<String>,
    /// Vertex then fragment source.
    pub shaders: Option<(String, String)>,
}

#[derive(Clone, Debug)]
pub struct MeshNode {
    pub source: MeshSource,
    /// `source.mesh` resolved against the asset root.
    pub mesh_path: PathBuf,
    pub mesh: AssetRef<MeshId>,
    pub material: Material,
    pub program: AssetRef<ProgramId>,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Group,
    Mesh(Box<MeshNode>),
    Light(LightSource),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    pub fn group(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transform: Transform::default(),
            kind: NodeKind::Group,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// This node and all descendants.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    pub name: Option<String>,
    pub nodes: Vec<Node>,
    /// Degraded references recorded while loading.
    pub warnings: Vec<LoadWarning>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(Node::node_count).sum()
    }

    /// Depth-first, document order, each node with its world matrix.
    pub fn walk(&self) -> Vec<(&Node, Matrix4<f32>)> {
        fn visit<'a>(node: &'a Node, parent: Matrix4<f32>, out: &mut Vec<(&'a Node, Matrix4<f32>)>) {
            let world = parent * node.transform.to_matrix();
            out.push((node, world));
            for child in &node.children {
                visit(child, world, out);
            }
        }

        let mut out = Vec::with_capacity(self.node_count());
        for node in &self.nodes {
            visit(node, Matrix4::identity(), &mut out);
        }
        out
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.walk().into_iter().map(|(node, _)| node).find(|node| node.id == id)
    }

    /// Light nodes in document order with world-space positions.
    pub fn lights(&self) -> Vec<LightDescriptor> {
        self.walk()
            .into_iter()
            .filter_map(|(node, world)| match &node.kind {
                NodeKind::Light(light) => Some(LightDescriptor {
                    position: world.w.truncate(),
                    color: light.color,
                    intensity: light.intensity,
                    kind: light.kind,
                }),
                _ => None,
            })
            .collect()
    }
}
