//! Scene graph abstraction and the in-memory tree handed to the JS renderer.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

pub mod assembler;
pub mod material;
pub mod node;

pub use assembler::{AssemblyReport, GeometryAssembler, TrimStyle};
pub use material::{Color, Material, PointLight};
pub use node::{Component, NodeId, Primitive, Renderable, SceneNode, Transform};

use crate::geom::GeomMesh;

/// Name of the implicit root node every scene starts with.
pub const ROOT_NAME: &str = "root";

/// Operations the simulator needs from a renderer's entity hierarchy.
pub trait SceneGraph {
    /// The node every other node descends from.
    fn root(&self) -> NodeId;

    /// Create an empty node. `None` attaches it to the root.
    fn create_node(&mut self, name: &str, parent: Option<NodeId>) -> Result<NodeId, SceneError>;

    /// Remove a node together with all of its descendants.
    fn destroy_node(&mut self, node: NodeId) -> Result<(), SceneError>;

    fn attach_mesh(
        &mut self,
        node: NodeId,
        mesh: GeomMesh,
        material: Material,
    ) -> Result<(), SceneError>;

    fn attach_primitive(
        &mut self,
        node: NodeId,
        primitive: Primitive,
        material: Material,
    ) -> Result<(), SceneError>;

    fn attach_point_light(&mut self, node: NodeId, light: PointLight) -> Result<(), SceneError>;

    fn attach_directional_light(&mut self, node: NodeId) -> Result<(), SceneError>;

    fn attach_camera(&mut self, node: NodeId, clear_color: [f64; 3]) -> Result<(), SceneError>;

    fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError>;

    /// First node (in creation order) carrying `name`.
    fn find_by_name(&self, name: &str) -> Option<NodeId>;

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError>;

    /// Update the diffuse and emissive color of the node's renderable.
    fn set_material_colors(
        &mut self,
        node: NodeId,
        diffuse: [f64; 3],
        emissive: [f64; 3],
    ) -> Result<(), SceneError>;

    /// Update the color of every point light on the node and its direct children.
    fn set_light_color(&mut self, node: NodeId, color: [f64; 3]) -> Result<(), SceneError>;

    /// Drop everything except the root.
    fn clear(&mut self);
}

/// Tree of scene nodes kept in memory and serialized for the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct SceneTree {
    nodes: Vec<SceneNode>,
    #[serde(skip)]
    node_index: HashMap<NodeId, usize>,
    #[serde(skip)]
    name_index: HashMap<String, Vec<NodeId>>,
    #[serde(skip)]
    next_id: usize,
}

impl SceneTree {
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            name_index: HashMap::new(),
            next_id: 0,
        };
        tree.insert(ROOT_NAME, None);
        tree
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.node_index
            .get(&id)
            .and_then(|idx| self.nodes.get(*idx))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.node_index
            .get(&id)
            .copied()
            .and_then(move |idx| self.nodes.get_mut(idx))
    }

    #[must_use]
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn nodes_with_name(&self, name: &str) -> Option<&[NodeId]> {
        self.name_index.get(name).map(|ids| ids.as_slice())
    }

    /// The child of `parent` named `name`, if any.
    #[must_use]
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).is_some_and(|n| n.name == name))
    }

    /// Iterate over all meshes in the tree with the name of their node.
    pub fn meshes(&self) -> impl Iterator<Item = (&str, &GeomMesh, &Material)> {
        self.nodes.iter().filter_map(|node| match node.renderable.as_ref() {
            Some(Renderable::Mesh { mesh, material }) => Some((node.name.as_str(), mesh, material)),
            _ => None,
        })
    }

    /// Translation of `id` accumulated over its ancestors.
    ///
    /// Rotation and scale are ignored; nodes carrying them are leaves in this
    /// scene.
    #[must_use]
    pub fn world_translation(&self, id: NodeId) -> Option<[f64; 3]> {
        let mut current = self.node(id)?;
        let mut total = current.transform.translation;
        while let Some(parent) = current.parent {
            current = self.node(parent)?;
            for (axis, offset) in total.iter_mut().zip(current.transform.translation) {
                *axis += offset;
            }
        }
        Some(total)
    }

    fn insert(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;

        self.node_index.insert(id, self.nodes.len());
        self.name_index.entry(name.to_owned()).or_default().push(id);
        self.nodes.push(SceneNode::new(id, name, parent));

        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.push(id);
        }
        id
    }

    fn require(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.node_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut cursor = 0;
        while cursor < out.len() {
            if let Some(node) = self.node(out[cursor]) {
                out.extend(node.children.iter().copied());
            }
            cursor += 1;
        }
        out
    }

    fn rebuild_indices(&mut self) {
        self.node_index.clear();
        self.name_index.clear();
        for (idx, node) in self.nodes.iter().enumerate() {
            self.node_index.insert(node.id, idx);
            self.name_index
                .entry(node.name.clone())
                .or_default()
                .push(node.id);
        }
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for SceneTree {
    fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    fn create_node(&mut self, name: &str, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        let parent = parent.unwrap_or_else(|| self.root());
        if self.node(parent).is_none() {
            return Err(SceneError::UnknownNode(parent));
        }
        Ok(self.insert(name, Some(parent)))
    }

    fn destroy_node(&mut self, node: NodeId) -> Result<(), SceneError> {
        if node == self.root() {
            return Err(SceneError::RootNode);
        }
        let parent = self.require(node)?.parent;
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.retain(|child| *child != node);
        }

        let doomed = self.descendants(node);
        self.nodes.retain(|n| !doomed.contains(&n.id));
        self.rebuild_indices();
        Ok(())
    }

    fn attach_mesh(
        &mut self,
        node: NodeId,
        mesh: GeomMesh,
        material: Material,
    ) -> Result<(), SceneError> {
        self.require(node)?.renderable = Some(Renderable::Mesh { mesh, material });
        Ok(())
    }

    fn attach_primitive(
        &mut self,
        node: NodeId,
        primitive: Primitive,
        material: Material,
    ) -> Result<(), SceneError> {
        self.require(node)?.renderable = Some(Renderable::Primitive {
            primitive,
            material,
        });
        Ok(())
    }

    fn attach_point_light(&mut self, node: NodeId, light: PointLight) -> Result<(), SceneError> {
        self.require(node)?.components.push(Component::Point(light));
        Ok(())
    }

    fn attach_directional_light(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.require(node)?.components.push(Component::Directional);
        Ok(())
    }

    fn attach_camera(&mut self, node: NodeId, clear_color: [f64; 3]) -> Result<(), SceneError> {
        self.require(node)?
            .components
            .push(Component::Camera { clear_color });
        Ok(())
    }

    fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError> {
        if node == self.root() {
            return Err(SceneError::RootNode);
        }
        if self.node(parent).is_none() {
            return Err(SceneError::UnknownNode(parent));
        }
        if self.descendants(node).contains(&parent) {
            return Err(SceneError::Cycle { node, parent });
        }

        let previous = self.require(node)?.parent.replace(parent);
        if let Some(previous) = previous.and_then(|p| self.node_mut(p)) {
            previous.children.retain(|child| *child != node);
        }
        self.require(parent)?.children.push(node);
        Ok(())
    }

    fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes_with_name(name)
            .and_then(|ids| ids.first().copied())
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.require(node)?.transform = transform;
        Ok(())
    }

    fn set_material_colors(
        &mut self,
        node: NodeId,
        diffuse: [f64; 3],
        emissive: [f64; 3],
    ) -> Result<(), SceneError> {
        let renderable = self
            .require(node)?
            .renderable
            .as_mut()
            .ok_or(SceneError::MissingRenderable(node))?;
        let material = renderable.material_mut();
        material.diffuse = diffuse;
        material.emissive = emissive;
        Ok(())
    }

    fn set_light_color(&mut self, node: NodeId, color: [f64; 3]) -> Result<(), SceneError> {
        let mut targets = vec![node];
        targets.extend(self.require(node)?.children.iter().copied());

        let mut found = false;
        for target in targets {
            let Some(entry) = self.node_mut(target) else {
                continue;
            };
            for component in &mut entry.components {
                if let Component::Point(light) = component {
                    light.color = color;
                    found = true;
                }
            }
        }

        if found {
            Ok(())
        } else {
            Err(SceneError::MissingLight(node))
        }
    }

    fn clear(&mut self) {
        self.nodes.truncate(1);
        if let Some(root) = self.nodes.first_mut() {
            root.children.clear();
            root.renderable = None;
            root.components.clear();
        }
        self.rebuild_indices();
    }
}

/// Errors raised by scene graph operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    UnknownNode(NodeId),
    RootNode,
    Cycle { node: NodeId, parent: NodeId },
    MissingRenderable(NodeId),
    MissingLight(NodeId),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "node {} not found in scene", id.0),
            Self::RootNode => write!(f, "the root node cannot be moved or destroyed"),
            Self::Cycle { node, parent } => {
                write!(f, "node {} cannot become a child of its descendant {}", node.0, parent.0)
            }
            Self::MissingRenderable(id) => write!(f, "node {} has no renderable", id.0),
            Self::MissingLight(id) => write!(f, "node {} has no point light", id.0),
        }
    }
}

impl std::error::Error for SceneError {}
