//! Core components for the windowed OpenGL viewer: application setup,
//! shader management, and GPU mesh handling.

pub mod app;
pub mod mesh;
pub mod shader;

pub use app::*;
pub use mesh::*;
pub use shader::*;
