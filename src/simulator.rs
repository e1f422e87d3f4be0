//! Owned simulator state shared by the wasm facade and the CLI.

use crate::config::SimulatorConfig;
use crate::illumination::{FrameBuffer, FrameError, IlluminationPhase, IlluminationState, TickReport};
use crate::loader::{
    self, LoadError, LoadGeneration, LoadOutcome, LoadReport, LoadTicket,
};
use crate::parse::{self, SignDescriptor};
use crate::scene::{GeometryAssembler, NodeId, SceneGraph, SceneTree};

/// Scene, bulb registry and load bookkeeping of one preview.
#[derive(Debug)]
pub struct SignSimulator {
    config: SimulatorConfig,
    scene: SceneTree,
    sign_root: NodeId,
    illumination: IlluminationState,
    bulb_nodes: Vec<NodeId>,
    generation: LoadGeneration,
    last_report: Option<LoadReport>,
}

impl SignSimulator {
    pub fn new(config: SimulatorConfig) -> Result<Self, LoadError> {
        let mut scene = SceneTree::new();
        let sign_root = loader::install_static_scene(&mut scene)?;
        Ok(Self {
            config,
            scene,
            sign_root,
            illumination: IlluminationState::new(),
            bulb_nodes: Vec::new(),
            generation: LoadGeneration::default(),
            last_report: None,
        })
    }

    /// Clear bulbs and geometry, return to the neutral frame and cancel any
    /// pending load.
    pub fn reset(&mut self) -> Result<(), LoadError> {
        self.generation.invalidate();
        self.clear_sign()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation.begin()
    }

    /// Whether `ticket` belongs to the latest load.
    #[must_use]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.is_current(ticket)
    }

    /// Apply `descriptor` if `ticket` is still the latest load.
    ///
    /// An invalid descriptor is rejected before anything is torn down.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        descriptor: &SignDescriptor,
    ) -> Result<LoadOutcome, LoadError> {
        if !self.generation.is_current(ticket) {
            log::debug!("dropping stale load {}", ticket.generation());
            return Ok(LoadOutcome::Stale);
        }
        descriptor.validate()?;

        self.clear_sign()?;
        let tolerance = self.config.tolerance();
        let triangulator = self.config.triangulator.build(tolerance);
        let assembler = GeometryAssembler::new(triangulator.as_ref())
            .with_style(self.config.trim.clone())
            .with_tolerance(tolerance);

        let report = loader::populate(
            &mut self.scene,
            self.sign_root,
            &mut self.illumination,
            descriptor,
            &assembler,
            &mut self.bulb_nodes,
        )?;
        self.last_report = Some(report.clone());
        Ok(LoadOutcome::Applied(report))
    }

    /// Parse JSON text, then complete the load.
    ///
    /// A stale ticket is dropped before its payload is looked at.
    pub fn complete_load_str(
        &mut self,
        ticket: LoadTicket,
        json: &str,
    ) -> Result<LoadOutcome, LoadError> {
        if !self.is_current(ticket) {
            log::debug!("dropping stale load {}", ticket.generation());
            return Ok(LoadOutcome::Stale);
        }
        let descriptor = parse::descriptor::parse_str(json)?;
        self.complete_load(ticket, &descriptor)
    }

    /// Start and finish a load in one step.
    pub fn load_sign(&mut self, descriptor: &SignDescriptor) -> Result<LoadReport, LoadError> {
        let ticket = self.begin_load();
        match self.complete_load(ticket, descriptor)? {
            LoadOutcome::Applied(report) => Ok(report),
            LoadOutcome::Stale => Err(LoadError::Superseded),
        }
    }

    pub fn load_sign_str(&mut self, json: &str) -> Result<LoadReport, LoadError> {
        let descriptor = parse::descriptor::parse_str(json)?;
        self.load_sign(&descriptor)
    }

    /// Replace the active frame with exactly 512 intensities.
    pub fn push_frame(&mut self, values: &[f64]) -> Result<(), FrameError> {
        self.illumination.push_frame(FrameBuffer::from_slice(values)?);
        Ok(())
    }

    /// Resolve all bulbs and push their colors into the scene.
    pub fn tick(&mut self) -> TickReport {
        let report = self.illumination.tick();
        for (tick, node) in report.bulbs.iter().zip(&self.bulb_nodes) {
            if !tick.resolved {
                continue;
            }
            let appearance = tick.appearance;
            let applied = self
                .scene
                .set_material_colors(*node, appearance.diffuse, appearance.light)
                .and_then(|()| self.scene.set_light_color(*node, appearance.light));
            if let Err(err) = applied {
                log::warn!("bulb {}: {err}", tick.id);
            }
        }
        report
    }

    #[must_use]
    pub fn scene(&self) -> &SceneTree {
        &self.scene
    }

    #[must_use]
    pub fn sign_root(&self) -> NodeId {
        self.sign_root
    }

    #[must_use]
    pub fn illumination(&self) -> &IlluminationState {
        &self.illumination
    }

    #[must_use]
    pub fn phase(&self) -> IlluminationPhase {
        self.illumination.phase()
    }

    /// Report of the last applied load.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&LoadReport> {
        self.last_report.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn clear_sign(&mut self) -> Result<(), LoadError> {
        self.illumination.reset();
        self.bulb_nodes.clear();
        self.last_report = None;
        self.sign_root = loader::reset_sign_root(&mut self.scene, self.sign_root)?;
        Ok(())
    }
}
