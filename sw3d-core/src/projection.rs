/// Viewport mapping from normalized device coordinates to framebuffer pixels
use nalgebra::Point3;

/// A projected vertex: integer pixel position plus the untouched NDC depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
    pub z: f32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Framebuffer extent used for projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Project an NDC point; `z` is passed through unscaled and only used for depth ordering
    pub fn project(&self, point: &Point3<f32>) -> ScreenPoint {
        ScreenPoint {
            x: ndc_to_pixel(point.x, self.width),
            y: ndc_to_pixel(point.y, self.height),
            z: point.z,
        }
    }
}

/// `floor((n + 1) * (dimension / 2 - 1) + 0.5)`, halving the dimension in integers
fn ndc_to_pixel(n: f32, dimension: u16) -> i32 {
    let half = (dimension / 2) as f32 - 1.0;
    ((n + 1.0) * half + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_extremes() {
        let viewport = Viewport::new(800, 600);
        assert_eq!(viewport.project(&Point3::new(-1.0, -1.0, 0.0)), ScreenPoint::new(0, 0, 0.0));
        assert_eq!(viewport.project(&Point3::new(1.0, 1.0, 0.0)), ScreenPoint::new(798, 598, 0.0));
        assert_eq!(viewport.project(&Point3::new(0.0, 0.0, 0.0)), ScreenPoint::new(399, 299, 0.0));
    }

    #[test]
    fn test_depth_is_passed_through() {
        let viewport = Viewport::new(64, 64);
        let projected = viewport.project(&Point3::new(0.25, -0.5, -0.75));
        assert_eq!(projected.z, -0.75);
        assert_eq!((projected.x, projected.y), (39, 16));
    }
}
