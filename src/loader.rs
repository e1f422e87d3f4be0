//! Builds the scene and bulb registry of a sign from its descriptor.

use serde::Serialize;
use thiserror::Error;

use crate::debug_log;
use crate::geom::Point2;
use crate::illumination::{Bulb, IlluminationState};
use crate::parse::{BackgroundDescriptor, ParseError, RejectedEntry, SignDescriptor};
use crate::scene::{
    AssemblyReport, Color, GeometryAssembler, Material, NodeId, PointLight, Primitive, SceneError,
    SceneGraph, Transform,
};
use crate::warning::SimWarning;

/// Name of the node every sign is built under.
pub const SIGN_ROOT_NAME: &str = "gesism";
pub const BACKGROUND_NODE_NAME: &str = "sign_bg";

pub const CAMERA_POSITION: [f64; 3] = [0.0, 0.0, 7.0];
pub const CAMERA_CLEAR_COLOR: [f64; 3] = [0.1, 0.1, 0.1];
pub const SUN_ROTATION_DEG: [f64; 3] = [45.0, 0.0, 0.0];

/// Bulb sphere placement relative to its group.
pub const BULB_Z_OFFSET: f64 = 0.05;
/// Uniform sphere scale, a 5 cm bulb.
pub const BULB_SCALE: f64 = 0.05;
pub const BULB_LIGHT: PointLight = PointLight::new([1.0, 0.0, 0.0], 0.5, 0.5);

#[derive(Debug, Error)]
pub enum LoadError {
    /// The descriptor was rejected; nothing in the scene changed.
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(#[from] ParseError),
    #[error("scene graph error: {0}")]
    Scene(#[from] SceneError),
    #[error("load was superseded by a newer one")]
    Superseded,
}

/// Handle for one load, invalidated by any later `begin_load` or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LoadTicket {
    generation: u32,
}

impl LoadTicket {
    #[must_use]
    pub const fn from_generation(generation: u32) -> Self {
        Self { generation }
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Hands out tickets and decides which one is current.
#[derive(Debug, Clone, Default)]
pub struct LoadGeneration {
    current: u32,
}

impl LoadGeneration {
    /// Start a new load; every earlier ticket becomes stale.
    pub fn begin(&mut self) -> LoadTicket {
        self.invalidate();
        LoadTicket::from_generation(self.current)
    }

    pub fn invalidate(&mut self) {
        self.current = self.current.wrapping_add(1);
    }

    #[must_use]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.current
    }
}

/// Summary of a finished load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub background: bool,
    pub bulb_count: usize,
    #[serde(flatten)]
    pub assembly: AssemblyReport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied(LoadReport),
    /// The ticket was superseded; the scene was left alone.
    Stale,
}

impl LoadOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Create the camera, the directional light and the sign root.
///
/// Returns the sign root.
pub fn install_static_scene<S: SceneGraph + ?Sized>(scene: &mut S) -> Result<NodeId, SceneError> {
    let [x, y, z] = CAMERA_POSITION;
    let camera = scene.create_node("camera", None)?;
    scene.attach_camera(camera, CAMERA_CLEAR_COLOR)?;
    scene.set_transform(camera, Transform::from_translation(x, y, z))?;

    let [rx, ry, rz] = SUN_ROTATION_DEG;
    let light = scene.create_node("light", None)?;
    scene.attach_directional_light(light)?;
    scene.set_transform(light, Transform::IDENTITY.with_rotation(rx, ry, rz))?;

    scene.create_node(SIGN_ROOT_NAME, None)
}

/// Replace the sign root with an empty one. Camera and light stay.
pub fn reset_sign_root<S: SceneGraph + ?Sized>(
    scene: &mut S,
    sign_root: NodeId,
) -> Result<NodeId, SceneError> {
    match scene.destroy_node(sign_root) {
        Ok(()) | Err(SceneError::UnknownNode(_)) => {}
        Err(err) => return Err(err),
    }
    scene.create_node(SIGN_ROOT_NAME, None)
}

/// Populate an empty sign root and bulb registry from `descriptor`.
///
/// Bulb scene nodes are appended to `bulb_nodes` in registration order.
pub fn populate<S: SceneGraph + ?Sized>(
    scene: &mut S,
    sign_root: NodeId,
    illumination: &mut IlluminationState,
    descriptor: &SignDescriptor,
    assembler: &GeometryAssembler<'_>,
    bulb_nodes: &mut Vec<NodeId>,
) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::default();

    if let Some(background) = &descriptor.background {
        add_background(scene, sign_root, background)?;
        report.background = true;
    }

    for (index, group) in descriptor.groups.iter().enumerate() {
        let Some(group_node) =
            assembler.assemble_group(scene, sign_root, index, group, &mut report.assembly)?
        else {
            continue;
        };

        for entry in &group.rejected {
            if let RejectedEntry::Bulb { index: row, reason } = entry {
                report.assembly.warn(SimWarning::MalformedBulb {
                    group: index,
                    index: *row,
                    reason: reason.clone(),
                });
            }
        }

        for (row, bulb) in group.bulbs.iter().enumerate() {
            if !bulb.position.is_finite() {
                report.assembly.warn(SimWarning::MalformedBulb {
                    group: index,
                    index: row,
                    reason: format!("bulb {} has a non-finite position", bulb.id),
                });
                continue;
            }
            let node = add_bulb(scene, group_node, &bulb.id, bulb.position)?;
            let world = Point2::new(group.pos.x + bulb.position.x, group.pos.y + bulb.position.y);
            illumination.register_bulb(Bulb::new(bulb.id.clone(), world, bulb.channels));
            bulb_nodes.push(node);
            report.bulb_count += 1;
        }
    }

    debug_log!(
        "sign loaded: {} groups, {} bulbs, {} warnings",
        report.assembly.group_count,
        report.bulb_count,
        report.assembly.warnings.len()
    );
    Ok(report)
}

fn add_background<S: SceneGraph + ?Sized>(
    scene: &mut S,
    sign_root: NodeId,
    background: &BackgroundDescriptor,
) -> Result<NodeId, SceneError> {
    let [width, height] = background.size;
    let node = scene.create_node(BACKGROUND_NODE_NAME, Some(sign_root))?;
    scene.attach_primitive(node, Primitive::Plane, Material::textured(&background.texture))?;
    scene.set_transform(
        node,
        Transform::from_translation(0.0, height / 2.0, 0.0)
            .with_rotation(90.0, 0.0, 0.0)
            .with_scale(width, 1.0, height),
    )?;
    Ok(node)
}

fn add_bulb<S: SceneGraph + ?Sized>(
    scene: &mut S,
    group_node: NodeId,
    id: &str,
    position: Point2,
) -> Result<NodeId, SceneError> {
    let node = scene.create_node(&format!("bulb_{id}"), Some(group_node))?;
    scene.set_transform(
        node,
        Transform::from_translation(position.x, position.y, BULB_Z_OFFSET)
            .with_scale(BULB_SCALE, BULB_SCALE, BULB_SCALE),
    )?;
    let material = Material::diffuse(Color::rgb(0.4, 0.4, 0.4))
        .with_emissive(Color::from(BULB_LIGHT.color), BULB_LIGHT.intensity);
    scene.attach_primitive(node, Primitive::Sphere, material)?;

    let light = scene.create_node(&format!("bulb_{id}_light"), Some(node))?;
    scene.attach_point_light(light, BULB_LIGHT)?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_tickets_supersede_earlier_ones() {
        let mut generation = LoadGeneration::default();
        let first = generation.begin();
        assert!(generation.is_current(first));

        let second = generation.begin();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));

        generation.invalidate();
        assert!(!generation.is_current(second));
    }

    #[test]
    fn generation_wraps_without_panicking() {
        let mut generation = LoadGeneration {
            current: u32::MAX,
        };
        let ticket = generation.begin();
        assert_eq!(ticket.generation(), 0);
        assert!(generation.is_current(ticket));
    }
}
