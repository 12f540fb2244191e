/// Depth-buffered triangle rasterizer with flat and textured shading
use log::debug;
use nalgebra::Vector3;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::geometry::{face_normal, Mesh};
use crate::projection::{ScreenPoint, Viewport};
use crate::tga::{Color, Image};

/// Twice-area threshold below which a screen triangle covers nothing
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Closest depth seen per pixel; smaller values are nearer
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    depths: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            depths: vec![f32::MAX; width * height],
        }
    }

    pub fn reset(&mut self) {
        self.depths.fill(f32::MAX);
    }

    pub fn get(&self, x: u16, y: u16) -> f32 {
        self.depths[y as usize * self.width + x as usize]
    }

    /// Store `z` if it is strictly nearer than the current value
    fn test_and_set(&mut self, x: usize, y: usize, z: f32) -> bool {
        debug_assert!(x < self.width && y < self.height);
        let depth = &mut self.depths[y * self.width + x];
        if z < *depth {
            *depth = z;
            true
        } else {
            false
        }
    }
}

/// How faces are colored
#[derive(Debug, Clone, Copy)]
pub enum Shading<'a> {
    /// White scaled by the face's light intensity
    Flat,
    /// Texture sampled at each vertex, blended across the face, scaled by intensity
    Textured(&'a Image),
}

/// Color source for a single triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleShade {
    Flat(Color),
    Blend { colors: [Color; 3], intensity: f32 },
}

impl TriangleShade {
    fn color(&self, weights: [f32; 3]) -> Color {
        match *self {
            TriangleShade::Flat(color) => color,
            TriangleShade::Blend { colors, intensity } => {
                let mix = |channel: fn(Color) -> u8| {
                    let value: f32 = colors
                        .iter()
                        .zip(weights)
                        .map(|(&c, w)| channel(c) as f32 * w)
                        .sum();
                    (value * intensity).round().clamp(0.0, 255.0) as u8
                };
                Color::rgb(mix(|c| c.r), mix(|c| c.g), mix(|c| c.b))
            }
        }
    }
}

/// Counters for one `render_mesh` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Faces that reached the fill stage
    pub drawn: usize,
    /// Faces skipped because they face away from the light or have no area
    pub culled: usize,
    /// Pixels that passed the depth test
    pub pixels: usize,
}

/// Owns the RGBA32 framebuffer and depth buffer for a frame.
///
/// Call [`Rasterizer::clear`] before each frame; draws accumulate otherwise.
pub struct Rasterizer {
    framebuffer: Image,
    depth: DepthBuffer,
}

impl Rasterizer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            framebuffer: Image::rgba(width, height),
            depth: DepthBuffer::new(width, height),
        }
    }

    pub fn clear(&mut self, background: Color) {
        self.framebuffer.fill(background);
        self.depth.reset();
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.framebuffer.width(), self.framebuffer.height())
    }

    pub fn framebuffer(&self) -> &Image {
        &self.framebuffer
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn into_framebuffer(self) -> Image {
        self.framebuffer
    }

    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        shading: &Shading<'_>,
        light_direction: &Vector3<f32>,
    ) -> Result<RenderStats> {
        if let Shading::Textured(texture) = shading {
            if !texture.is_bottom_left() {
                return Err(Error::Unsupported(
                    "textures must have a bottom-left origin".to_string(),
                ));
            }
        }

        let viewport = self.viewport();
        let mut stats = RenderStats::default();

        for face in &mesh.faces {
            let positions = mesh.face_positions(face);
            let intensity = face_normal(&positions).map_or(0.0, |normal| light_direction.dot(&normal));
            if intensity <= 0.0 {
                stats.culled += 1;
                continue;
            }

            let shade = match shading {
                Shading::Flat => TriangleShade::Flat(Color::WHITE.scale(intensity)),
                Shading::Textured(texture) => TriangleShade::Blend {
                    colors: mesh.face_tex_coords(face).map(|uv| sample(texture, &uv)),
                    intensity,
                },
            };

            let screen = positions.map(|p| viewport.project(&p));
            stats.pixels += self.draw_triangle(&screen, &shade);
            stats.drawn += 1;
        }

        debug!(
            "rendered {} faces ({} culled), {} pixels written",
            stats.drawn, stats.culled, stats.pixels
        );
        Ok(stats)
    }

    /// Fill a screen-space triangle and return the number of pixels written.
    ///
    /// The bounding box is clamped to the framebuffer. Zero-area triangles
    /// cover nothing.
    pub fn draw_triangle(&mut self, screen: &[ScreenPoint; 3], shade: &TriangleShade) -> usize {
        let corners = screen.map(|p| (p.x as f32, p.y as f32));
        if doubled_area(&corners).abs() < DEGENERATE_EPSILON {
            return 0;
        }

        let [p0, p1, p2] = screen;
        let min_x = p0.x.min(p1.x).min(p2.x).max(0);
        let min_y = p0.y.min(p1.y).min(p2.y).max(0);
        let max_x = p0.x.max(p1.x).max(p2.x).min(self.framebuffer.width() as i32 - 1);
        let max_y = p0.y.max(p1.y).max(p2.y).min(self.framebuffer.height() as i32 - 1);

        let mut written = 0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let Some(weights) = barycentric(&corners, (x as f32, y as f32)) else {
                    continue;
                };
                if !weights.iter().all(|w| (0.0..=1.0).contains(w)) {
                    continue;
                }

                let z = weights[0] * p0.z + weights[1] * p1.z + weights[2] * p2.z;
                if self.depth.test_and_set(x as usize, y as usize, z) {
                    self.framebuffer.set(x as u16, y as u16, shade.color(weights));
                    written += 1;
                }
            }
        }
        written
    }

    /// Overlay every face edge, ignoring depth
    pub fn draw_wireframe(&mut self, mesh: &Mesh, color: Color) {
        let viewport = self.viewport();
        for face in &mesh.faces {
            let screen = mesh.face_positions(face).map(|p| viewport.project(&p));
            for i in 0..3 {
                let (a, b) = (screen[i], screen[(i + 1) % 3]);
                draw_line(&mut self.framebuffer, (a.x, a.y), (b.x, b.y), color);
            }
        }
    }
}

/// Render `mesh` into a fresh framebuffer sized by `config`
pub fn render(mesh: &Mesh, config: &RenderConfig, shading: &Shading<'_>) -> Result<Image> {
    let mut rasterizer = Rasterizer::new(config.width, config.height);
    rasterizer.clear(config.background);
    rasterizer.render_mesh(mesh, shading, &config.light_direction)?;
    Ok(rasterizer.into_framebuffer())
}

fn sample(texture: &Image, uv: &Vector3<f32>) -> Color {
    let x = uv.x.clamp(0.0, 1.0) * texture.width().saturating_sub(1) as f32;
    let y = uv.y.clamp(0.0, 1.0) * texture.height().saturating_sub(1) as f32;
    texture.get(x as u16, y as u16).unwrap_or_default()
}

fn doubled_area(v: &[(f32, f32); 3]) -> f32 {
    (v[1].1 - v[2].1) * (v[0].0 - v[2].0) + (v[2].0 - v[1].0) * (v[0].1 - v[2].1)
}

/// Barycentric weights of `p` relative to the triangle `v`.
///
/// Each weight is computed from its own edge function, so for integer
/// inputs all three are exact ratios. Returns `None` for degenerate triangles.
pub fn barycentric(v: &[(f32, f32); 3], p: (f32, f32)) -> Option<[f32; 3]> {
    let denom = doubled_area(v);
    if denom.abs() < DEGENERATE_EPSILON {
        return None;
    }

    let w0 = ((v[1].1 - v[2].1) * (p.0 - v[2].0) + (v[2].0 - v[1].0) * (p.1 - v[2].1)) / denom;
    let w1 = ((v[2].1 - v[0].1) * (p.0 - v[2].0) + (v[0].0 - v[2].0) * (p.1 - v[2].1)) / denom;
    let w2 = ((v[0].1 - v[1].1) * (p.0 - v[1].0) + (v[1].0 - v[0].0) * (p.1 - v[1].1)) / denom;

    Some([w0, w1, w2])
}

/// Bresenham line with both endpoints drawn; pixels outside the image are skipped
pub fn draw_line(image: &mut Image, from: (i32, i32), to: (i32, i32), color: Color) {
    let (mut x0, mut y0) = from;
    let (mut x1, mut y1) = to;

    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let derr = (y1 - y0).abs() * 2;
    let step = if y1 > y0 { 1 } else { -1 };
    let mut err = 0;
    let mut y = y0;
    let (width, height) = (image.width() as i32, image.height() as i32);

    for x in x0..=x1 {
        let (px, py) = if steep { (y, x) } else { (x, y) };
        if (0..width).contains(&px) && (0..height).contains(&py) {
            image.set(px as u16, py as u16, color);
        }

        err += derr;
        if err > dx {
            y += step;
            err -= 2 * dx;
        }
    }
}
