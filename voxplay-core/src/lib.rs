/// voxplay core library - STL meshes, Perlin terrain and fly camera math
///
/// Everything here is independent of the display: it produces the vertex
/// buffers and per-frame matrices a renderer consumes.

pub mod buffer;
pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod geometry;
pub mod stl;
pub mod terrain;
pub mod transform;

// Re-export commonly used types
pub use buffer::VertexBuffer;
pub use camera::{CameraSettings, FlyCamera, Movement};
pub use clock::{FrameClock, FrameTime};
pub use config::Config;
pub use error::{ConfigError, Error, StlError};
pub use geometry::{Bounds, Mesh, Triangle};
pub use terrain::{generate_map, HeightMap, Terrain, TerrainParams};
pub use transform::{ModelTransform, Uniforms};
