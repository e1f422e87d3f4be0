//! Nodes of the preview scene and the components attached to them.

use serde::Serialize;

use super::material::{Material, PointLight};
use crate::geom::GeomMesh;

/// Identifier of a node in the scene.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd, Serialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

/// Local transform relative to the parent node.
///
/// Rotation is stored as Euler angles in degrees, matching the renderer's
/// entity API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub translation: [f64; 3],
    pub rotation_deg: [f64; 3],
    pub scale: [f64; 3],
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation_deg: [0.0; 3],
        scale: [1.0; 3],
    };

    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            translation: [x, y, z],
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub const fn with_rotation(mut self, x: f64, y: f64, z: f64) -> Self {
        self.rotation_deg = [x, y, z];
        self
    }

    #[must_use]
    pub const fn with_scale(mut self, x: f64, y: f64, z: f64) -> Self {
        self.scale = [x, y, z];
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Built-in shapes provided by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Plane,
    Sphere,
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Renderable {
    Mesh { mesh: GeomMesh, material: Material },
    Primitive { primitive: Primitive, material: Material },
}

impl Renderable {
    #[must_use]
    pub fn material(&self) -> &Material {
        match self {
            Self::Mesh { material, .. } | Self::Primitive { material, .. } => material,
        }
    }

    pub fn material_mut(&mut self) -> &mut Material {
        match self {
            Self::Mesh { material, .. } | Self::Primitive { material, .. } => material,
        }
    }
}

/// Light and camera components a node can carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Point(PointLight),
    Directional,
    Camera { clear_color: [f64; 3] },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: Transform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderable: Option<Renderable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
}

impl SceneNode {
    #[must_use]
    pub fn new(id: NodeId, name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            children: Vec::new(),
            transform: Transform::IDENTITY,
            renderable: None,
            components: Vec::new(),
        }
    }

    #[must_use]
    pub fn point_light(&self) -> Option<&PointLight> {
        self.components.iter().find_map(|c| match c {
            Component::Point(light) => Some(light),
            _ => None,
        })
    }
}
