/// Render configuration
use nalgebra::Vector3;

use crate::projection::Viewport;
use crate::tga::Color;

/// Framebuffer size, light and background for one render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u16,
    pub height: u16,
    /// Direction the light travels; faces whose normal points along it are lit
    pub light_direction: Vector3<f32>,
    pub background: Color,
}

impl RenderConfig {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            light_direction: Vector3::new(0.0, 0.0, -1.0),
            background: Color::BLACK,
        }
    }
}
