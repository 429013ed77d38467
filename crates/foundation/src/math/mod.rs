pub mod mat4;
pub mod projection;
pub mod quat;
pub mod vec;

pub use mat4::*;
pub use projection::*;
pub use quat::*;
pub use vec::*;
