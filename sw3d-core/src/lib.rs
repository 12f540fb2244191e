/// SW3D Core Library - mesh loading, TGA codec and software rasterization
///
/// Meshes are read from OBJ text, rendered with a depth-buffered triangle
/// rasterizer, and written out as Truevision TGA images.

pub mod config;
pub mod error;
pub mod geometry;
pub mod obj;
pub mod projection;
pub mod raster;
pub mod tga;

// Re-export commonly used types
pub use config::RenderConfig;
pub use error::{Error, Result};
pub use geometry::{Face, Mesh};
pub use obj::load_obj;
pub use projection::{ScreenPoint, Viewport};
pub use raster::{render, Rasterizer, RenderStats, Shading};
pub use tga::{Color, Compression, Image, PixelFormat};
