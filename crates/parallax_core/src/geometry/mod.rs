//! Proxy geometry

mod proxy;
mod vertex;

pub use proxy::{ProxySphere, SharedGeometry};
pub use vertex::{Geometry, Vertex};
