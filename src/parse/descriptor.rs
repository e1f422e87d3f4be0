//! Parser for the JSON sign descriptor served next to each sign.
//!
//! ```json
//! {
//!   "background": { "size": [4.0, 2.0], "texture": "sign_bg.png" },
//!   "groups": [
//!     {
//!       "pos": [0.5, 0.25],
//!       "alu": { "outline": [[0, 0], [1, 0], [1, 1]], "holes": [] },
//!       "bulbs": [["a1", 0.1, 0.2, 1, 2, 3]]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{Point2, Polygon};
use crate::illumination::ChannelAddress;

/// Texture used when a background omits one.
pub const DEFAULT_BACKGROUND_TEXTURE: &str = "sign_bg.png";

/// Result type for descriptor parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Reasons a descriptor is rejected as malformed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not valid JSON or misses a required field.
    #[error("descriptor JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The JS value handed over the wasm boundary has the wrong shape.
    #[error("descriptor value error: {0}")]
    Value(String),
    /// Fields are present but carry unusable values.
    #[error("invalid descriptor: {0}")]
    Invalid(String),
}

/// Complete description of one sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundDescriptor>,
    pub groups: Vec<GroupDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundDescriptor {
    /// Width and height in meters.
    pub size: [f64; 2],
    #[serde(default = "default_texture")]
    pub texture: String,
}

/// A rigid group of bulbs with its optional aluminium trim.
///
/// Only `pos` and `bulbs` must be present. Bulb rows and trim data that fail
/// to parse are kept out of the group and listed in `rejected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GroupRow")]
pub struct GroupDescriptor {
    pub pos: Point2,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alu: Option<Polygon>,
    pub bulbs: Vec<BulbDescriptor>,
    #[serde(skip)]
    pub rejected: Vec<RejectedEntry>,
}

impl GroupDescriptor {
    #[must_use]
    pub fn new(pos: Point2, alu: Option<Polygon>, bulbs: Vec<BulbDescriptor>) -> Self {
        Self {
            pos,
            alu,
            bulbs,
            rejected: Vec::new(),
        }
    }
}

/// Part of a group dropped while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectedEntry {
    /// Row `index` of the group's `bulbs` array.
    Bulb { index: usize, reason: String },
    Trim { reason: String },
}

#[derive(Deserialize)]
struct GroupRow {
    pos: Point2,
    #[serde(default)]
    alu: Option<serde_json::Value>,
    bulbs: Vec<serde_json::Value>,
}

impl From<GroupRow> for GroupDescriptor {
    fn from(row: GroupRow) -> Self {
        let mut rejected = Vec::new();

        let alu = match row.alu.map(serde_json::from_value::<Polygon>).transpose() {
            Ok(alu) => alu,
            Err(err) => {
                rejected.push(RejectedEntry::Trim {
                    reason: err.to_string(),
                });
                None
            }
        };

        let mut bulbs = Vec::with_capacity(row.bulbs.len());
        for (index, value) in row.bulbs.into_iter().enumerate() {
            match serde_json::from_value::<BulbDescriptor>(value) {
                Ok(bulb) => bulbs.push(bulb),
                Err(err) => rejected.push(RejectedEntry::Bulb {
                    index,
                    reason: err.to_string(),
                }),
            }
        }

        Self {
            pos: row.pos,
            alu,
            bulbs,
            rejected,
        }
    }
}

/// A bulb row `[id, x, y, red, green, blue]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BulbRow", into = "BulbRow")]
pub struct BulbDescriptor {
    pub id: String,
    /// Position relative to the group origin.
    pub position: Point2,
    pub channels: ChannelAddress,
}

#[derive(Serialize, Deserialize)]
struct BulbRow(BulbId, f64, f64, i64, i64, i64);

/// Bulb ids appear both as strings and as bare numbers.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BulbId {
    Text(String),
    Number(serde_json::Number),
}

impl From<BulbRow> for BulbDescriptor {
    fn from(BulbRow(id, x, y, red, green, blue): BulbRow) -> Self {
        let id = match id {
            BulbId::Text(text) => text,
            BulbId::Number(number) => number.to_string(),
        };
        Self {
            id,
            position: Point2::new(x, y),
            channels: ChannelAddress::new(red, green, blue),
        }
    }
}

impl From<BulbDescriptor> for BulbRow {
    fn from(bulb: BulbDescriptor) -> Self {
        Self(
            BulbId::Text(bulb.id),
            bulb.position.x,
            bulb.position.y,
            bulb.channels.red,
            bulb.channels.green,
            bulb.channels.blue,
        )
    }
}

fn default_texture() -> String {
    DEFAULT_BACKGROUND_TEXTURE.to_owned()
}

impl SignDescriptor {
    /// Total number of bulbs over all groups.
    #[must_use]
    pub fn bulb_count(&self) -> usize {
        self.groups.iter().map(|group| group.bulbs.len()).sum()
    }

    /// Reject a background the scene cannot place.
    ///
    /// Group and bulb values are checked while loading, so a bad group only
    /// costs that group.
    pub fn validate(&self) -> ParseResult<()> {
        if let Some(background) = &self.background {
            if !background.size.iter().all(|v| v.is_finite() && *v > 0.0) {
                return Err(ParseError::Invalid(format!(
                    "background size {:?} must be positive",
                    background.size
                )));
            }
        }
        Ok(())
    }
}

/// Parse and validate a descriptor from JSON text.
pub fn parse_str(input: &str) -> ParseResult<SignDescriptor> {
    let descriptor: SignDescriptor = serde_json::from_str(input)?;
    descriptor.validate()?;
    Ok(descriptor)
}

/// Parse and validate a descriptor from an already decoded JSON value.
pub fn from_json_value(value: serde_json::Value) -> ParseResult<SignDescriptor> {
    let descriptor: SignDescriptor = serde_json::from_value(value)?;
    descriptor.validate()?;
    Ok(descriptor)
}

/// Parse and validate a descriptor handed over from JavaScript.
pub fn from_js_value(value: wasm_bindgen::JsValue) -> ParseResult<SignDescriptor> {
    let descriptor: SignDescriptor = serde_wasm_bindgen::from_value(value)
        .map_err(|err| ParseError::Value(err.to_string()))?;
    descriptor.validate()?;
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "background": { "size": [4.0, 2.0] },
        "groups": [
            {
                "pos": [0.5, 0.25],
                "alu": {
                    "outline": [[0, 0], [2, 0], [2, 1], [0, 1], [0, 0]],
                    "holes": [[[0.5, 0.25], [1.0, 0.25], [1.0, 0.75]]]
                },
                "bulbs": [["a1", 0.1, 0.2, 1, 2, 3], [42, 0.3, 0.2, 4, 5, 6]]
            },
            { "pos": [3, 0], "bulbs": [] }
        ]
    }"#;

    #[test]
    fn parses_full_descriptor() {
        let descriptor = parse_str(SAMPLE).unwrap();
        let background = descriptor.background.as_ref().unwrap();
        assert_eq!(background.size, [4.0, 2.0]);
        assert_eq!(background.texture, DEFAULT_BACKGROUND_TEXTURE);

        assert_eq!(descriptor.groups.len(), 2);
        let group = &descriptor.groups[0];
        assert_eq!(group.pos, Point2::new(0.5, 0.25));
        let alu = group.alu.as_ref().unwrap();
        assert_eq!(alu.outline.len(), 5);
        assert_eq!(alu.holes.len(), 1);

        assert_eq!(group.bulbs[0].id, "a1");
        assert_eq!(group.bulbs[0].channels, ChannelAddress::new(1, 2, 3));
        assert_eq!(group.bulbs[1].id, "42");
        assert_eq!(group.bulbs[1].position, Point2::new(0.3, 0.2));
        assert!(descriptor.groups[1].alu.is_none());
        assert_eq!(descriptor.bulb_count(), 2);
    }

    #[test]
    fn holes_default_to_empty() {
        let descriptor = parse_str(
            r#"{"groups": [{"pos": [0, 0], "alu": {"outline": [[0,0],[1,0],[0,1]]}, "bulbs": []}]}"#,
        )
        .unwrap();
        assert!(descriptor.groups[0].alu.as_ref().unwrap().holes.is_empty());
        assert!(descriptor.background.is_none());
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        for input in [
            r#"{}"#,
            r#"{"groups": [{"bulbs": []}]}"#,
            r#"{"groups": [{"pos": [0, 0]}]}"#,
            r#"{"groups": [{"pos": [0, 0], "bulbs": {}}]}"#,
            "not json",
        ] {
            assert!(
                matches!(parse_str(input), Err(ParseError::Json(_))),
                "accepted {input}"
            );
        }
    }

    #[test]
    fn bad_rows_and_trim_are_rejected_per_group() {
        let descriptor = parse_str(
            r#"{"groups": [
                {"pos": [0, 0], "bulbs": [["ok", 0.1, 0.1, 1, 2, 3]]},
                {
                    "pos": [2, 0],
                    "alu": {"holes": []},
                    "bulbs": [["short", 0.1, 0.1, 4, 5], ["b", 0, 0, 6, 7, 8], ["c", 0, 0, "x", 1, 2]]
                }
            ]}"#,
        )
        .unwrap();

        assert!(descriptor.groups[0].rejected.is_empty());
        let group = &descriptor.groups[1];
        assert!(group.alu.is_none());
        assert_eq!(group.bulbs.len(), 1);
        assert_eq!(group.bulbs[0].id, "b");

        let indices: Vec<usize> = group
            .rejected
            .iter()
            .filter_map(|entry| match entry {
                RejectedEntry::Bulb { index, .. } => Some(*index),
                RejectedEntry::Trim { .. } => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(matches!(group.rejected[0], RejectedEntry::Trim { .. }));
        assert_eq!(descriptor.bulb_count(), 2);
    }

    #[test]
    fn out_of_range_channels_are_kept_for_the_mapper() {
        let descriptor =
            parse_str(r#"{"groups": [{"pos": [0, 0], "bulbs": [["b", 0, 0, 0, 5, 900]]}]}"#)
                .unwrap();
        assert_eq!(
            descriptor.groups[0].bulbs[0].channels,
            ChannelAddress::new(0, 5, 900)
        );
    }

    #[test]
    fn invalid_background_is_rejected() {
        let err = parse_str(r#"{"background": {"size": [0, 2]}, "groups": []}"#).unwrap_err();
        assert!(matches!(err, ParseError::Invalid(_)));
    }

    #[test]
    fn descriptor_serializes_bulbs_as_rows() {
        let descriptor = parse_str(SAMPLE).unwrap();
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["groups"][0]["bulbs"][1], serde_json::json!(["42", 0.3, 0.2, 4, 5, 6]));
        let back = from_json_value(json).unwrap();
        assert_eq!(back, descriptor);
    }
}
