//! Simulator settings.

use serde::{Deserialize, Serialize};

use crate::geom::{DelaunayTriangulator, EarClipTriangulator, PolygonTriangulator, Tolerance};
use crate::scene::TrimStyle;

/// Which cap triangulator to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriangulatorKind {
    #[default]
    EarClip,
    Delaunay,
}

impl TriangulatorKind {
    #[must_use]
    pub fn build(self, tolerance: Tolerance) -> Box<dyn PolygonTriangulator> {
        match self {
            Self::EarClip => Box::new(EarClipTriangulator::new(tolerance)),
            Self::Delaunay => Box::new(DelaunayTriangulator),
        }
    }
}

/// Settings for a [`crate::SignSimulator`]. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatorConfig {
    pub trim: TrimStyle,
    /// Distance under which two loop points count as the same point.
    pub tolerance: f64,
    pub triangulator: TriangulatorKind,
}

impl SimulatorConfig {
    #[must_use]
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.tolerance)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            trim: TrimStyle::default(),
            tolerance: Tolerance::DEFAULT.eps,
            triangulator: TriangulatorKind::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::TRIM_HEIGHT;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SimulatorConfig =
            serde_json::from_str(r#"{"triangulator": "delaunay", "trim": {"height": 0.3}}"#)
                .unwrap();
        assert_eq!(config.triangulator, TriangulatorKind::Delaunay);
        assert_eq!(config.trim.height, 0.3);
        assert_eq!(config.trim.trim_color, TrimStyle::default().trim_color);
        assert_eq!(config.tolerance, 1e-9);

        let empty: SimulatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SimulatorConfig::default());
        assert_eq!(empty.trim.height, TRIM_HEIGHT);
    }
}
