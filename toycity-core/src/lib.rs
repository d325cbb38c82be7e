/// Toycity Core Library - scene graph, mesh ingestion and transform math
///
/// Everything here is renderer-agnostic: the scene graph produces world
/// transforms and the OBJ loader produces flat vertex buffers, and a
/// [`render::Renderer`] implementation turns them into pixels.

pub mod bounds;
pub mod city;
pub mod entity;
pub mod geometry;
pub mod obj;
pub mod projection;
pub mod render;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use bounds::{normalize, Aabb, BoundsError, Normalization};
pub use city::City;
pub use entity::{Category, Color, Entity, Placement, Surface};
pub use geometry::{Mesh, Triangle};
pub use obj::{load_obj, LoadedMesh, ObjError, RenderBuffer};
pub use projection::Camera;
pub use render::{DrawCommand, Renderer};
pub use scene::{NodeId, NodePayload, SceneGraph};
pub use transform::{RotationState, Transform};
