//! Channel addressed bulb colors driven by streamed frames.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

pub mod channel;
pub mod frame;

pub use channel::{BulbAppearance, ChannelAddress, IlluminationError, SURFACE_BIAS};
pub use frame::{CHANNEL_COUNT, FrameBuffer, FrameError, NEUTRAL_INTENSITY};

use crate::geom::Point2;
use crate::warning::SimWarning;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A registered bulb.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bulb {
    pub id: String,
    /// Position in sign coordinates.
    pub position: Point2,
    pub channels: ChannelAddress,
}

impl Bulb {
    #[must_use]
    pub fn new(id: impl Into<String>, position: Point2, channels: ChannelAddress) -> Self {
        Self {
            id: id.into(),
            position,
            channels,
        }
    }

    /// Resolve this bulb against `frame`.
    pub fn resolve(&self, frame: &FrameBuffer) -> Result<BulbAppearance, IlluminationError> {
        self.channels
            .lookup(frame)
            .map(BulbAppearance::from_intensities)
            .map_err(|channel| IlluminationError::OutOfRangeChannel {
                bulb: self.id.clone(),
                channel,
            })
    }
}

/// Lifecycle of the illumination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IlluminationPhase {
    /// No bulbs, neutral frame.
    #[default]
    Empty,
    /// Bulbs registered, no frame pushed since.
    Loaded,
    /// Frames are being pushed.
    Animated,
}

/// The displayed state of one bulb after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulbTick {
    pub id: String,
    #[serde(flatten)]
    pub appearance: BulbAppearance,
    /// False when the bulb kept its previous colors this tick.
    pub resolved: bool,
}

/// Outcome of one tick, in bulb registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub bulbs: Vec<BulbTick>,
    pub warnings: Vec<SimWarning>,
}

/// Bulb registry plus the frame currently driving it.
#[derive(Debug, Clone, Default)]
pub struct IlluminationState {
    bulbs: Vec<Bulb>,
    appearances: Vec<BulbAppearance>,
    frame: Arc<FrameBuffer>,
    warned: HashSet<usize>,
    phase: IlluminationPhase,
}

impl IlluminationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all bulbs and return to the neutral frame. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.bulbs.clear();
        self.appearances.clear();
        self.warned.clear();
        self.frame = Arc::new(FrameBuffer::neutral());
        self.phase = IlluminationPhase::Empty;
    }

    /// Append a bulb. Returns its registration index.
    pub fn register_bulb(&mut self, bulb: Bulb) -> usize {
        self.bulbs.push(bulb);
        self.appearances.push(BulbAppearance::INITIAL);
        if self.phase == IlluminationPhase::Empty {
            self.phase = IlluminationPhase::Loaded;
        }
        self.bulbs.len() - 1
    }

    /// Replace the active frame.
    ///
    /// Readers still holding the previous frame keep it. With no bulbs
    /// registered the frame is stored but the phase stays `Empty`.
    pub fn push_frame(&mut self, frame: FrameBuffer) {
        self.frame = Arc::new(frame);
        if self.phase != IlluminationPhase::Empty {
            self.phase = IlluminationPhase::Animated;
        }
    }

    #[must_use]
    pub fn current_frame(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frame)
    }

    #[must_use]
    pub fn phase(&self) -> IlluminationPhase {
        self.phase
    }

    #[must_use]
    pub fn bulbs(&self) -> &[Bulb] {
        &self.bulbs
    }

    #[must_use]
    pub fn bulb_count(&self) -> usize {
        self.bulbs.len()
    }

    #[must_use]
    pub fn appearance(&self, index: usize) -> Option<BulbAppearance> {
        self.appearances.get(index).copied()
    }

    /// Resolve every bulb against the current frame.
    ///
    /// Bulbs with an out-of-range channel keep their previous colors and add a
    /// warning to the report on every tick; the log only hears about each bulb
    /// once.
    pub fn tick(&mut self) -> TickReport {
        let frame = Arc::clone(&self.frame);
        let resolved = resolve_all(&self.bulbs, &frame);

        let mut report = TickReport {
            bulbs: Vec::with_capacity(self.bulbs.len()),
            warnings: Vec::new(),
        };

        for (index, result) in resolved.into_iter().enumerate() {
            let ok = match result {
                Ok(appearance) => {
                    self.appearances[index] = appearance;
                    true
                }
                Err(IlluminationError::OutOfRangeChannel { bulb, channel }) => {
                    if self.warned.insert(index) {
                        log::warn!("bulb {bulb} uses channel {channel}, outside 1..=512");
                    }
                    report
                        .warnings
                        .push(SimWarning::OutOfRangeChannel { bulb, channel });
                    false
                }
            };
            report.bulbs.push(BulbTick {
                id: self.bulbs[index].id.clone(),
                appearance: self.appearances[index],
                resolved: ok,
            });
        }

        report
    }
}

#[cfg(not(feature = "parallel"))]
fn resolve_all(bulbs: &[Bulb], frame: &FrameBuffer) -> Vec<Result<BulbAppearance, IlluminationError>> {
    bulbs.iter().map(|bulb| bulb.resolve(frame)).collect()
}

#[cfg(feature = "parallel")]
fn resolve_all(bulbs: &[Bulb], frame: &FrameBuffer) -> Vec<Result<BulbAppearance, IlluminationError>> {
    bulbs.par_iter().map(|bulb| bulb.resolve(frame)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(slots: &[(usize, f64)]) -> FrameBuffer {
        let mut values = vec![0.0; CHANNEL_COUNT];
        for (slot, value) in slots {
            values[*slot] = *value;
        }
        FrameBuffer::from_vec(values).unwrap()
    }

    fn assert_rgb(actual: [f64; 3], expected: [f64; 3]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn tick_maps_channels_to_colors() {
        let mut state = IlluminationState::new();
        state.register_bulb(Bulb::new("b", Point2::new(0.0, 0.0), ChannelAddress::new(10, 11, 12)));
        state.push_frame(frame_with(&[(9, 0.3), (10, 0.6), (11, 0.9)]));

        let report = state.tick();
        assert!(report.warnings.is_empty());
        let tick = &report.bulbs[0];
        assert!(tick.resolved);
        assert_rgb(tick.appearance.diffuse, [0.5, 0.8, 1.1]);
        assert_rgb(tick.appearance.light, [0.3, 0.6, 0.9]);
    }

    #[test]
    fn out_of_range_channel_keeps_previous_colors() {
        let mut state = IlluminationState::new();
        state.register_bulb(Bulb::new("bad", Point2::new(0.0, 0.0), ChannelAddress::new(0, 5, 5)));
        state.register_bulb(Bulb::new("ok", Point2::new(1.0, 0.0), ChannelAddress::new(5, 5, 5)));
        state.push_frame(frame_with(&[(4, 0.7)]));

        for _ in 0..2 {
            let report = state.tick();
            assert_eq!(
                report.warnings,
                vec![SimWarning::OutOfRangeChannel {
                    bulb: "bad".to_owned(),
                    channel: 0
                }]
            );
            assert!(!report.bulbs[0].resolved);
            assert_eq!(report.bulbs[0].appearance, BulbAppearance::INITIAL);
            assert!(report.bulbs[1].resolved);
            assert_rgb(report.bulbs[1].appearance.light, [0.7, 0.7, 0.7]);
        }
        assert_eq!(state.appearance(0), Some(BulbAppearance::INITIAL));
    }

    #[test]
    fn reset_restores_neutral_empty_state() {
        let mut state = IlluminationState::new();
        state.register_bulb(Bulb::new("b", Point2::new(0.0, 0.0), ChannelAddress::new(1, 2, 3)));
        state.push_frame(frame_with(&[(0, 1.0)]));

        state.reset();
        state.reset();
        assert_eq!(state.bulb_count(), 0);
        assert_eq!(state.phase(), IlluminationPhase::Empty);
        let frame = state.current_frame();
        assert_eq!(frame.as_slice().len(), 512);
        assert!(frame.as_slice().iter().all(|v| *v == 0.5));
        assert!(state.tick().bulbs.is_empty());
    }

    #[test]
    fn second_push_fully_supersedes_first() {
        let mut state = IlluminationState::new();
        state.register_bulb(Bulb::new("b", Point2::new(0.0, 0.0), ChannelAddress::new(1, 2, 3)));

        state.push_frame(frame_with(&[(0, 0.9), (1, 0.9), (2, 0.9)]));
        let held = state.current_frame();
        state.push_frame(frame_with(&[(0, 0.1)]));

        let report = state.tick();
        assert_rgb(report.bulbs[0].appearance.light, [0.1, 0.0, 0.0]);
        assert_eq!(held.channel(1), Some(0.9));
    }

    #[test]
    fn phases_follow_registration_and_frames() {
        let mut state = IlluminationState::new();
        assert_eq!(state.phase(), IlluminationPhase::Empty);

        state.push_frame(frame_with(&[(0, 0.4)]));
        assert_eq!(state.phase(), IlluminationPhase::Empty);
        assert_eq!(state.current_frame().channel(1), Some(0.4));

        state.register_bulb(Bulb::new("b", Point2::new(0.0, 0.0), ChannelAddress::new(1, 1, 1)));
        assert_eq!(state.phase(), IlluminationPhase::Loaded);

        state.push_frame(FrameBuffer::neutral());
        assert_eq!(state.phase(), IlluminationPhase::Animated);
        state.register_bulb(Bulb::new("c", Point2::new(0.0, 0.0), ChannelAddress::new(1, 1, 1)));
        assert_eq!(state.phase(), IlluminationPhase::Animated);
    }

    #[test]
    fn tick_leaves_frame_and_registry_untouched() {
        let mut state = IlluminationState::new();
        state.register_bulb(Bulb::new("b", Point2::new(0.0, 0.0), ChannelAddress::new(1, 2, 3)));
        let frame = frame_with(&[(0, 0.2)]);
        state.push_frame(frame.clone());

        let bulbs_before = state.bulbs().to_vec();
        state.tick();
        assert_eq!(state.bulbs(), bulbs_before.as_slice());
        assert_eq!(*state.current_frame(), frame);
    }
}
