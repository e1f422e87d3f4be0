//! Non-fatal conditions reported while loading or animating a sign.

use serde::Serialize;
use thiserror::Error;

/// A condition that left the scene incomplete without aborting the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SimWarning {
    /// An outline or hole has fewer than three distinct points.
    #[error("group {group}: {} has only {points} usable points", loop_label(.hole))]
    DegenerateLoop {
        group: usize,
        hole: Option<usize>,
        points: usize,
    },
    /// The cap of a group could not be triangulated; its trim is still built.
    #[error("group {group}: cap skipped, {reason}")]
    TriangulationFailure { group: usize, reason: String },
    /// A bulb references a channel outside 1..=512.
    #[error("bulb {bulb}: channel {channel} is outside 1..=512")]
    OutOfRangeChannel { bulb: String, channel: i64 },
    /// A bulb row could not be read or placed; the bulb is left out.
    #[error("group {group}: bulb row {index} skipped, {reason}")]
    MalformedBulb {
        group: usize,
        index: usize,
        reason: String,
    },
    /// A group, or its trim, carries values the scene cannot use.
    #[error("group {group}: {reason}")]
    MalformedGroup { group: usize, reason: String },
    /// A loop passed cleaning but could not be extruded.
    #[error("group {group}: {} not extruded, {reason}", loop_label(.hole))]
    ExtrusionFailed {
        group: usize,
        hole: Option<usize>,
        reason: String,
    },
}

fn loop_label(hole: &Option<usize>) -> String {
    match hole {
        Some(index) => format!("hole {index}"),
        None => "outline".to_owned(),
    }
}
