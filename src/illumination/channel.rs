use serde::Serialize;
use thiserror::Error;

use super::frame::FrameBuffer;

/// Constant lift applied to the surface color so a dark bulb still reads as
/// white plastic.
pub const SURFACE_BIAS: f64 = 0.2;

/// 1-based red, green and blue channel numbers of a bulb.
///
/// Any integer is accepted here; channels outside 1..=512 fail at lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelAddress {
    pub red: i64,
    pub green: i64,
    pub blue: i64,
}

impl ChannelAddress {
    #[must_use]
    pub const fn new(red: i64, green: i64, blue: i64) -> Self {
        Self { red, green, blue }
    }

    /// Read the three intensities from `frame`.
    ///
    /// The first channel outside the frame is returned as the error.
    pub fn lookup(&self, frame: &FrameBuffer) -> Result<[f64; 3], i64> {
        let read = |channel: i64| frame.channel(channel).ok_or(channel);
        Ok([read(self.red)?, read(self.green)?, read(self.blue)?])
    }
}

/// Colors a bulb is currently displayed with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BulbAppearance {
    pub diffuse: [f64; 3],
    pub light: [f64; 3],
}

impl BulbAppearance {
    /// Appearance of a freshly registered bulb, before any frame resolved.
    pub const INITIAL: Self = Self {
        diffuse: [0.4, 0.4, 0.4],
        light: [1.0, 0.0, 0.0],
    };

    /// Surface gets the bias, the light carries the raw intensity. Neither is
    /// clamped.
    #[must_use]
    pub fn from_intensities([r, g, b]: [f64; 3]) -> Self {
        Self {
            diffuse: [SURFACE_BIAS + r, SURFACE_BIAS + g, SURFACE_BIAS + b],
            light: [r, g, b],
        }
    }
}

impl Default for BulbAppearance {
    fn default() -> Self {
        Self::INITIAL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IlluminationError {
    #[error("bulb {bulb} references channel {channel}, outside 1..=512")]
    OutOfRangeChannel { bulb: String, channel: i64 },
}
