use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Number of channels in one frame.
pub const CHANNEL_COUNT: usize = 512;

/// Intensity every channel holds before the first frame arrives.
pub const NEUTRAL_INTENSITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("frame must hold exactly {expected} channels, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("channel {channel} holds a non-finite intensity")]
    NonFinite { channel: usize },
}

/// One snapshot of all channel intensities.
///
/// Index 0 holds channel 1. Values outside [0, 1] are kept as given. A frame
/// is never modified after construction; the illumination state swaps whole
/// frames.
#[derive(Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrameBuffer {
    values: Box<[f64]>,
}

impl FrameBuffer {
    #[must_use]
    pub fn neutral() -> Self {
        Self::filled(NEUTRAL_INTENSITY)
    }

    #[must_use]
    pub fn filled(value: f64) -> Self {
        Self {
            values: vec![value; CHANNEL_COUNT].into_boxed_slice(),
        }
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, FrameError> {
        Self::from_vec(values.to_vec())
    }

    pub fn from_vec(values: Vec<f64>) -> Result<Self, FrameError> {
        if values.len() != CHANNEL_COUNT {
            return Err(FrameError::WrongLength {
                expected: CHANNEL_COUNT,
                actual: values.len(),
            });
        }
        if let Some(slot) = values.iter().position(|v| !v.is_finite()) {
            return Err(FrameError::NonFinite { channel: slot + 1 });
        }
        Ok(Self {
            values: values.into_boxed_slice(),
        })
    }

    /// Intensity of a 1-based channel, `None` outside 1..=512.
    #[must_use]
    pub fn channel(&self, channel: i64) -> Option<f64> {
        let slot = usize::try_from(channel).ok()?.checked_sub(1)?;
        self.values.get(slot).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::neutral()
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.values.iter().filter(|v| **v != NEUTRAL_INTENSITY).count();
        f.debug_struct("FrameBuffer")
            .field("channels", &self.values.len())
            .field("non_neutral", &lit)
            .finish()
    }
}
