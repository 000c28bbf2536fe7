//! Math utilities for the proxy transforms

mod mat4;
mod quat;
mod vec;

pub use mat4::Mat4;
pub use quat::Quat;
pub use vec::Vec3;
