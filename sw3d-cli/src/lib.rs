/// Command-line front end: load an OBJ mesh, render it, write a TGA image
use anyhow::{ensure, Context, Result};
use clap::Parser;
use crossterm::terminal;
use log::{info, warn};
use nalgebra::{Matrix4, Vector3};
use std::io::stdout;
use std::path::{Path, PathBuf};
use sw3d_core::{load_obj, Color, Compression, Image, Mesh, Rasterizer, RenderConfig, Shading};

pub mod preview;

pub use preview::AsciiPreview;

#[derive(Parser, Debug)]
#[command(name = "sw3d")]
#[command(about = "Render an OBJ mesh to a TGA image with a software rasterizer")]
#[command(version)]
pub struct Cli {
    /// Input mesh (OBJ, triangles only)
    pub mesh: PathBuf,

    /// Output TGA file
    #[arg(short, long, default_value = "output.tga")]
    pub output: PathBuf,

    /// Texture to sample (truecolor TGA); flat shading when omitted
    #[arg(short, long)]
    pub texture: Option<PathBuf>,

    #[arg(long, default_value_t = 800)]
    pub width: u16,

    #[arg(long, default_value_t = 800)]
    pub height: u16,

    /// Light direction as x,y,z
    #[arg(long, value_parser = parse_light, default_value = "0,0,-1", allow_hyphen_values = true)]
    pub light: Vector3<f32>,

    /// Rotation about the vertical axis, in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub yaw: f32,

    /// Rotation about the horizontal axis, in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pitch: f32,

    /// Write a run-length encoded image
    #[arg(long)]
    pub rle: bool,

    /// Draw face edges on top of the shaded image
    #[arg(long)]
    pub wireframe: bool,

    /// Print an ASCII preview of the result to the terminal
    #[arg(long)]
    pub preview: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn render_config(&self) -> Result<RenderConfig> {
        ensure!(self.width > 0 && self.height > 0, "image size must be non-zero");
        let light = self.light;
        ensure!(light.norm() > 0.0, "light direction must be non-zero");

        Ok(RenderConfig {
            width: self.width,
            height: self.height,
            light_direction: light.normalize(),
            background: Color::BLACK,
        })
    }

    /// Model rotation from `--yaw` and `--pitch`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_euler_angles(self.pitch.to_radians(), self.yaw.to_radians(), 0.0)
    }
}

/// Parse `x,y,z` into a direction vector
fn parse_light(value: &str) -> std::result::Result<Vector3<f32>, String> {
    let components = value
        .split(',')
        .map(|part| part.trim().parse::<f32>().map_err(|e| format!("{part:?}: {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match components[..] {
        [x, y, z] => Ok(Vector3::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got {} values", components.len())),
    }
}

/// Load a texture and flip it to a bottom-left origin if needed
pub fn load_texture(path: &Path) -> Result<Image> {
    let mut texture = Image::open(path)
        .with_context(|| format!("failed to load texture {}", path.display()))?;
    if !texture.is_bottom_left() {
        warn!("{} has a top-left origin, flipping", path.display());
        texture.flip_vertically();
    }
    Ok(texture)
}

pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.render_config()?;

    let mesh: Mesh = load_obj(&cli.mesh)
        .with_context(|| format!("failed to load mesh {}", cli.mesh.display()))?
        .transformed(&cli.model_matrix());
    info!(
        "loaded {} vertices, {} faces from {}",
        mesh.vertices.len(),
        mesh.faces.len(),
        cli.mesh.display()
    );

    let texture = cli.texture.as_deref().map(load_texture).transpose()?;
    let shading = match &texture {
        Some(texture) => Shading::Textured(texture),
        None => Shading::Flat,
    };

    let mut rasterizer = Rasterizer::new(config.width, config.height);
    rasterizer.clear(config.background);
    let stats = rasterizer
        .render_mesh(&mesh, &shading, &config.light_direction)
        .context("render failed")?;
    if cli.wireframe {
        rasterizer.draw_wireframe(&mesh, Color::rgb(255, 64, 64));
    }
    info!(
        "drew {} faces, culled {}, wrote {} pixels",
        stats.drawn, stats.culled, stats.pixels
    );

    let frame = rasterizer.into_framebuffer();
    let compression = if cli.rle {
        Compression::RunLength
    } else {
        Compression::None
    };
    frame
        .save(&cli.output, compression)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!("wrote {}", cli.output.display());

    if cli.preview {
        let (columns, rows) = terminal::size().unwrap_or((80, 24));
        let preview = AsciiPreview::from_image(&frame, columns as usize, rows.saturating_sub(1) as usize);
        preview.draw(&mut stdout())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_default_arguments() {
        let cli = parse(&["sw3d", "head.obj"]);
        assert_eq!(cli.output, PathBuf::from("output.tga"));
        assert!(cli.texture.is_none());
        let config = cli.render_config().unwrap();
        assert_eq!((config.width, config.height), (800, 800));
        assert_eq!(config.light_direction, Vector3::new(0.0, 0.0, -1.0));
        assert!((cli.model_matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_light_argument() {
        let cli = parse(&["sw3d", "head.obj", "--light", "0,-3,-4", "--rle"]);
        assert!(cli.rle);
        let config = cli.render_config().unwrap();
        assert!((config.light_direction - Vector3::new(0.0, -0.6, -0.8)).norm() < 1e-6);
    }

    #[test]
    fn test_light_with_leading_minus() {
        let cli = parse(&["sw3d", "head.obj", "--light", "-1,0,0"]);
        assert_eq!(cli.light, Vector3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_repeated_light_keeps_the_last() {
        let cli = parse(&["sw3d", "head.obj", "--light", "1,0,0", "--light", "0,1,0"]);
        assert_eq!(cli.light, Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_light_needs_three_components() {
        for bad in ["1,2", "1,2,3,4", "1,x,3", ""] {
            assert!(
                Cli::try_parse_from(["sw3d", "head.obj", "--light", bad]).is_err(),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_zero_light_is_rejected() {
        let cli = parse(&["sw3d", "head.obj", "--light", "0,0,0"]);
        assert!(cli.render_config().is_err());
    }

    #[test]
    fn test_missing_mesh_reports_path() {
        let cli = parse(&["sw3d", "/no/such/mesh.obj"]);
        let err = run(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/mesh.obj"));
    }
}
