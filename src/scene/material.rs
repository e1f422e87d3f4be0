//! Colors, materials and lights handed to the renderer.

use serde::{Deserialize, Serialize};

/// RGBA color with channels nominally in [0, 1].
///
/// Channels are not clamped; a value above 1 is passed to the renderer as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[must_use]
    pub const fn to_rgb(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    #[must_use]
    pub const fn to_rgba(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[f64; 3]> for Color {
    fn from(rgb: [f64; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }
}

/// Surface material of a renderable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub diffuse: [f64; 3],
    pub emissive: [f64; 3],
    pub emissive_intensity: f64,
    pub opacity: f64,
    /// Name of a texture asset used as diffuse map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffuse_map: Option<String>,
}

impl Material {
    #[must_use]
    pub fn diffuse(color: Color) -> Self {
        Self {
            diffuse: color.to_rgb(),
            emissive: [0.0; 3],
            emissive_intensity: 0.0,
            opacity: color.a,
            diffuse_map: None,
        }
    }

    #[must_use]
    pub fn textured(texture: impl Into<String>) -> Self {
        Self {
            diffuse_map: Some(texture.into()),
            ..Self::diffuse(Color::WHITE)
        }
    }

    #[must_use]
    pub fn with_emissive(mut self, color: Color, intensity: f64) -> Self {
        self.emissive = color.to_rgb();
        self.emissive_intensity = intensity;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Color::rgb(0.7, 0.7, 0.7))
    }
}

/// Point light component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointLight {
    pub color: [f64; 3],
    pub intensity: f64,
    pub range: f64,
}

impl PointLight {
    #[must_use]
    pub const fn new(color: [f64; 3], intensity: f64, range: f64) -> Self {
        Self {
            color,
            intensity,
            range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diffuse_material_carries_alpha_as_opacity() {
        let material = Material::diffuse(Color::new(1.0, 1.0, 1.0, 0.0));
        assert_eq!(material.diffuse, [1.0, 1.0, 1.0]);
        assert_eq!(material.opacity, 0.0);
        assert!(material.diffuse_map.is_none());
    }

    #[test]
    fn textured_material_references_asset() {
        let material = Material::textured("sign_bg.png").with_emissive(Color::rgb(1.0, 0.0, 0.0), 0.5);
        assert_eq!(material.diffuse_map.as_deref(), Some("sign_bg.png"));
        assert_eq!(material.emissive, [1.0, 0.0, 0.0]);
        assert_eq!(material.emissive_intensity, 0.5);
    }
}
